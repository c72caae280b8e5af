// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表模块
//!
//! 路由表是 (方法, 路径, 处理器) 三元组的有序列表。注册不做去重，
//! 也不校验路径语法：路径被视为不透明的精确匹配字符串，
//! 不支持通配符或参数化片段。查找过程由调度器驱动，
//! 按注册顺序取第一条方法与路径都严格相等的条目。

use crate::{param::HttpRequestMethod, request::Request, response::Response};
use log::debug;
use std::sync::Arc;

/// 路由处理器：接收当前交换的请求与响应对象。
pub type Handler = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// 一条注册过的路由条目。
#[derive(Clone)]
pub struct Route {
    method: HttpRequestMethod,
    path: String,
    handler: Handler,
}

impl Route {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// 路由表本体。
pub struct Router {
    router_list: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            router_list: Vec::new(),
        }
    }

    /// 每次交换开始时由调度器调用的钩子。
    /// 当前为空操作，为路由表日后维护每请求状态预留扩展点。
    pub fn init(&self, _request: &Request, _response: &Response) {}

    /// 注册一条路由条目（追加到列表尾部，不去重，先注册者优先）。
    pub fn route<F>(&mut self, method: HttpRequestMethod, path: &str, handler: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        debug!("注册路由: {} {}", method, path);
        self.router_list.push(Route {
            method,
            path: path.to_string(),
            handler: Arc::new(handler),
        });
    }

    pub fn get<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(HttpRequestMethod::Get, path, handler);
    }

    pub fn post<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(HttpRequestMethod::Post, path, handler);
    }

    pub fn put<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(HttpRequestMethod::Put, path, handler);
    }

    pub fn delete<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(HttpRequestMethod::Delete, path, handler);
    }

    /// 以注册顺序访问全部路由条目。查找算法归调度器所有。
    pub fn routes(&self) -> &[Route] {
        &self.router_list
    }

    pub fn is_empty(&self) -> bool {
        self.router_list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.router_list.len()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 中间件链模块
//!
//! 中间件是形如 `(request, response, next)` 的函数，按注册顺序存放，
//! 通过显式调用 `next` 决定是否继续链条。游标由每次交换独立持有的
//! [`Next`] 值携带，服务器实例上不存放任何每交换可变状态，
//! 因此并发连接之间互不干扰。
//!
//! 链条在三种情况下停止：游标越过末尾、某个中间件没有调用 `next`、
//! 或响应已被终结（每次推进前检查，终结后的 `next` 是幂等空操作）。

use crate::{param::*, request::Request, response::Response, util};

use log::{debug, error, warn};

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// 中间件函数类型。
///
/// 中间件可以同步调用 `next` 继续链条，也可以终结响应后直接返回；
/// 两者都不做，本次交换将停在这里（由调用方自行承担悬挂风险）。
pub type Middleware = Arc<dyn Fn(&Request, &mut Response, Next<'_>) + Send + Sync>;

/// 中间件链的显式游标（Continuation）。
///
/// 每次交换构造一个新的 `Next`，推进即消费：调用 `run` 会取出当前
/// 游标处的中间件并把指向下一位置的新 `Next` 传给它。
pub struct Next<'a> {
    stack: &'a [Middleware],
    index: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stack: &'a [Middleware]) -> Self {
        Self { stack, index: 0 }
    }

    /// 推进链条：取出游标处的中间件并调用之。
    ///
    /// 响应已终结时直接返回（幂等空操作），防止某个中间件既终结了
    /// 响应又继续调用了 `next`；游标越界时同样直接返回。
    pub fn run(self, request: &Request, response: &mut Response) {
        if response.is_ended() {
            return;
        }
        if let Some(middleware) = self.stack.get(self.index) {
            let next = Next {
                stack: self.stack,
                index: self.index + 1,
            };
            middleware(request, response, next);
        }
    }
}

/// # 静态资源中间件
///
/// 为给定的静态根目录构造一个中间件：当请求路径的后缀命中
/// [`STATIC_MIME_TYPES`] 映射表时，把 URL 的目录与文件名拼接到
/// 静态根目录下读取文件，命中则以 `200` 和对应的内容类型终结响应；
/// 文件不存在则以字面量 `"Not Found 404"` 终结；后缀不在表内时
/// 调用 `next` 把请求交还给链条。
pub fn static_middleware(root: PathBuf) -> Middleware {
    Arc::new(move |request: &Request, response: &mut Response, next: Next<'_>| {
        let path = util::pathname(request.target());
        let mime = util::extname(path).and_then(|ext| STATIC_MIME_TYPES.get(ext));

        let mime = match mime {
            Some(&mime) => mime,
            None => {
                // 后缀未命中，交还给链条
                return next.run(request, response);
            }
        };

        let (dir, name) = util::split_dir_name(path);
        let file_path = root.join(dir.trim_start_matches('/')).join(name);
        debug!("静态资源映射物理路径：{}", file_path.display());

        match fs::read(&file_path) {
            Ok(contents) => {
                response.write_head(200, &[("Content-Type", mime)]);
                let _ = response.end(contents);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("静态资源不存在：{}，返回404", file_path.display());
                let _ = response.end(NOT_FOUND_404);
            }
            Err(e) => {
                error!("读取静态资源{}失败: {}", file_path.display(), e);
                let _ = response.end(NOT_FOUND_404);
            }
        }
    })
}

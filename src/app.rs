// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求调度引擎
//!
//! 该模块实现了框架的服务器本体 [`Sxpress`]：持有一张路由表与一条
//! 中间件链，对每个入站请求执行统一的调度流程：
//! 1. favicon 短路：`/favicon.ico` 请求立即以空响应体终结，不做任何分发。
//! 2. 初始化：为本次交换创建全新的响应对象，并向路由表传播 init 钩子。
//! 3. 中间件阶段：按注册顺序推进链条，响应被终结时提前中止。
//! 4. 路由阶段：按注册顺序取第一条方法与路径都严格相等的条目并调用其
//!    处理器；未命中且未标记延迟响应时写出字面量 404；路由表为空时写出
//!    默认问候语。
//!
//! 服务器实例是显式构造的普通值，不依赖任何进程级单例，可以在测试中
//! 并存任意多个实例。全部每交换可变状态都在交换本地的响应对象与链条
//! 游标上，因此并发连接不会相互污染。

use crate::{
    config::Config,
    middleware::{static_middleware, Middleware, Next},
    param::*,
    request::Request,
    response::Response,
    router::Router,
    util,
};

use log::{debug, error, info, warn};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

/// 服务器本体：一张路由表、一条中间件链与监听配置。
pub struct Sxpress {
    local: bool,
    static_root: Option<PathBuf>,
    router: Router,
    middleware_list: Vec<Middleware>,
}

impl Sxpress {
    pub fn new() -> Self {
        Self {
            local: true,
            static_root: None,
            router: Router::new(),
            middleware_list: Vec::new(),
        }
    }

    /// 从配置对象构造：接管监听地址选择，配置了静态根目录时
    /// 自动注册静态资源中间件。
    pub fn from_config(config: &Config) -> Self {
        let mut app = Self::new();
        app.local = config.local();
        if let Some(root) = config.static_root() {
            app.static_dir(root);
        }
        app
    }

    /// 注册一个中间件（追加到链条尾部，按注册顺序执行）。
    pub fn use_fn<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.middleware_list.push(Arc::new(middleware));
        self
    }

    /// 设置静态资源根目录并注册静态资源中间件。
    pub fn static_dir(&mut self, path: &str) -> &mut Self {
        let root = PathBuf::from(path);
        info!("静态资源根目录: {}", root.display());
        self.static_root = Some(root.clone());
        self.middleware_list.push(static_middleware(root));
        self
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.router.get(path, handler);
        self
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.router.post(path, handler);
        self
    }

    pub fn put<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.router.put(path, handler);
        self
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.router.delete(path, handler);
        self
    }

    /// # 调度引擎
    ///
    /// 驱动单次交换完整走过 favicon 短路、中间件阶段与路由阶段。
    /// 响应对象由调用方为本次交换全新创建，调度结束后由调用方负责
    /// 将已终结的响应写回连接。
    pub fn handle(&self, request: &Request, response: &mut Response, id: u128) {
        // 1. favicon 短路：立即空响应，不经过中间件与路由
        if request.target() == FAVICON_PATH {
            debug!("[ID{}]favicon请求，直接返回空响应", id);
            let _ = response.end("");
            return;
        }

        // 2. 初始化：向路由表传播 init 钩子
        self.router.init(request, response);

        // 3. 中间件阶段：游标为本次交换独立持有，终结即中止
        Next::new(&self.middleware_list).run(request, response);

        // 4. 中间件终结了响应时，路由分发不再发生
        if response.is_ended() {
            debug!("[ID{}]响应已在中间件阶段终结", id);
            return;
        }

        // 5. 路由阶段
        if !self.router.is_empty() {
            let pathname = util::pathname(request.target());

            // 按注册顺序查找第一条方法与路径都严格相等的条目
            for route in self.router.routes() {
                if route.method() == request.method() && route.path() == pathname {
                    debug!("[ID{}]路由命中: {} {}", id, route.method(), route.path());
                    return (route.handler())(request, response);
                }
            }

            if response.is_deferred() {
                // 延迟响应：未命中也不写出任何数据，由标记方自行终结
                debug!("[ID{}]路由未命中，交换已标记延迟响应", id);
            } else {
                warn!("[ID{}]路由未命中: {} {}", id, request.method(), pathname);
                let _ = response.end(NOT_FOUND_404);
            }
        } else {
            let _ = response.end(DEFAULT_GREETING);
        }
    }

    /// # 监听端口
    ///
    /// 绑定端口并进入接收循环。`ready` 回调在发出监听之后同步调用一次，
    /// 不等待任何"listening"事件。每个连接由独立的异步任务处理。
    pub async fn listen<F>(self, port: u16, ready: F)
    where
        F: FnOnce(),
    {
        let address = match self.local {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        info!("服务端将在{}:{}上监听Socket连接", address, port);
        let socket = SocketAddrV4::new(address, port);

        let listener = match TcpListener::bind(socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", port, e);
                panic!("无法绑定端口：{}，错误：{}", port, e);
            }
        };
        info!("端口{}绑定完成", port);

        ready();

        let app = Arc::new(self);
        let mut id: u128 = 0;

        // 接收循环：持续接收新连接并将其分发至异步任务处理
        loop {
            let (mut stream, addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!("接收连接失败: {}", e);
                    continue;
                }
            };
            debug!("新的连接：{}", addr);

            let app_clone = Arc::clone(&app);
            debug!("[ID{}]TCP连接已建立", id);

            tokio::spawn(async move {
                handle_connection(app_clone, &mut stream, id).await;
            });
            id += 1; // 增加请求唯一标识序列
        }
    }
}

impl Default for Sxpress {
    fn default() -> Self {
        Self::new()
    }
}

// --- Getter 访问器实现 ---

impl Sxpress {
    pub fn static_root(&self) -> Option<&PathBuf> {
        self.static_root.as_ref()
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware_list.len()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期：读取解析请求、驱动调度引擎、
/// 以及将已终结的响应写回连接。
async fn handle_connection(app: Arc<Sxpress>, stream: &mut TcpStream, id: u128) {
    let mut buffer = vec![0; 1024];

    // 等待流进入可读状态
    if let Err(e) = stream.readable().await {
        error!("[ID{}]等待TCPStream可读时遇到错误: {}", id, e);
        return;
    }

    // 尝试非阻塞读取 HTTP 报文
    match stream.try_read(&mut buffer) {
        Ok(0) => return, // 客户端主动关闭连接
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
        _ => {}
    }
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    // 1. 协议解析阶段：将字节流转换为结构化的 Request 对象
    let request = match Request::try_from(&buffer, id) {
        Ok(req) => req,
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {:?}", id, e);
            let response = "HTTP/1.1 400 Bad Request\r\nContent-Length: 11\r\n\r\nBad Request";
            let _ = stream.write_all(response.as_bytes()).await;
            return;
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    // 2. 调度阶段：中间件链与路由分发
    let mut response = Response::new();
    app.handle(&request, &mut response, id);
    debug!(
        "[ID{}]调度完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    // 3. 结构化日志记录：便于后期审计与性能监控
    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, ",
        id,
        request.version(),
        request.target(),
        request.method(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    // 4. 数据发送阶段：只有已终结的交换才写出报文。
    // 标记了延迟响应且始终未终结的交换不写出任何数据，连接随任务结束关闭。
    if response.is_ended() {
        let response_bytes = response.as_bytes();
        debug!("[ID{}]发送响应，长度: {}", id, response_bytes.len());
        let _ = stream.write_all(&response_bytes).await;
        let _ = stream.flush().await;
    } else {
        warn!("[ID{}]交换结束时响应未终结，不写出任何数据", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(line: &str) -> Request {
        let raw = format!("{} HTTP/1.1\r\nHost: localhost:3000\r\n\r\n", line);
        Request::try_from(&raw.as_bytes().to_vec(), 0).unwrap()
    }

    #[test]
    fn test_favicon_short_circuit() {
        let mut app = Sxpress::new();
        let reached = std::sync::Arc::new(std::sync::Mutex::new(false));
        let flag = std::sync::Arc::clone(&reached);
        app.use_fn(move |req, res, next| {
            *flag.lock().unwrap() = true;
            next.run(req, res);
        });
        app.get("/favicon.ico", |_req, res| {
            let _ = res.send("should never run");
        });

        let req = request("GET /favicon.ico");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert!(res.is_ended());
        assert!(res.content().is_empty());
        // 中间件与路由都不应被触发
        assert!(!*reached.lock().unwrap());
    }

    #[test]
    fn test_empty_router_greeting() {
        let app = Sxpress::new();
        let req = request("GET /anything");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert!(res.is_ended());
        assert_eq!(res.content().as_ref(), b"sxpress");
    }

    #[test]
    fn test_route_dispatch_exact_match() {
        let mut app = Sxpress::new();
        app.get("/hello", |_req, res| {
            let _ = res.send("hi");
        });

        let req = request("GET /hello");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert_eq!(res.content().as_ref(), b"hi");
    }

    #[test]
    fn test_not_found_literal() {
        let mut app = Sxpress::new();
        app.get("/exists", |_req, res| {
            let _ = res.send("yes");
        });

        let req = request("GET /missing");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert!(res.is_ended());
        assert_eq!(res.content().as_ref(), b"Not Found 404");
    }

    #[test]
    fn test_deferred_suppresses_not_found() {
        let mut app = Sxpress::new();
        app.use_fn(|req, res, next| {
            res.set_deferred(true);
            next.run(req, res);
        });
        app.get("/exists", |_req, res| {
            let _ = res.send("yes");
        });

        let req = request("GET /missing");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        // 延迟响应：未命中也不写出任何数据
        assert!(!res.is_ended());
        assert!(res.content().is_empty());
    }

    #[test]
    fn test_method_must_match_exactly() {
        let mut app = Sxpress::new();
        app.post("/submit", |_req, res| {
            let _ = res.send("posted");
        });

        let req = request("GET /submit");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert_eq!(res.content().as_ref(), b"Not Found 404");
    }

    #[test]
    fn test_query_string_stripped_for_matching() {
        let mut app = Sxpress::new();
        app.get("/page", |_req, res| {
            let _ = res.send("page");
        });

        let req = request("GET /page?id=123");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert_eq!(res.content().as_ref(), b"page");
    }

    #[test]
    fn test_no_trailing_slash_normalization() {
        let mut app = Sxpress::new();
        app.get("/dir", |_req, res| {
            let _ = res.send("dir");
        });

        let req = request("GET /dir/");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        // 精确匹配：尾部斜杠不同即视为不同路径
        assert_eq!(res.content().as_ref(), b"Not Found 404");
    }

    #[test]
    fn test_first_registered_route_wins() {
        let mut app = Sxpress::new();
        app.get("/dup", |_req, res| {
            let _ = res.send("first");
        });
        app.get("/dup", |_req, res| {
            let _ = res.send("second");
        });

        let req = request("GET /dup");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert_eq!(res.content().as_ref(), b"first");
    }

    #[test]
    fn test_middleware_finalization_skips_route() {
        let mut app = Sxpress::new();
        app.use_fn(|_req, res, _next| {
            let _ = res.send("intercepted");
        });
        app.get("/hello", |_req, res| {
            let _ = res.send("handler");
        });

        let req = request("GET /hello");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert_eq!(res.content().as_ref(), b"intercepted");
    }

    #[test]
    fn test_handler_runs_with_pending_defaults() {
        let mut app = Sxpress::new();
        app.get("/check", |_req, res| {
            assert_eq!(res.status_code(), 200);
            assert!(res.header("Content-Type").is_none());
            assert!(res.cookies().is_empty());
            let _ = res.send("ok");
        });

        let req = request("GET /check");
        let mut res = Response::new();
        app.handle(&req, &mut res, 0);

        assert!(res.is_ended());
    }

    #[test]
    fn test_multiple_instances_are_independent() {
        let mut first = Sxpress::new();
        first.get("/a", |_req, res| {
            let _ = res.send("from-first");
        });
        let second = Sxpress::new();

        let req = request("GET /a");

        let mut res = Response::new();
        first.handle(&req, &mut res, 0);
        assert_eq!(res.content().as_ref(), b"from-first");

        let mut res = Response::new();
        second.handle(&req, &mut res, 1);
        // 第二个实例没有路由，回落到默认问候语
        assert_eq!(res.content().as_ref(), b"sxpress");
    }

    #[test]
    fn test_from_config_registers_static_middleware() {
        let raw = r#"
            port = 3000
            worker_threads = 1
            local = true
            static_root = "static"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        let app = Sxpress::from_config(&config);

        assert_eq!(app.middleware_count(), 1);
        assert_eq!(app.static_root(), Some(&PathBuf::from("static")));
    }
}

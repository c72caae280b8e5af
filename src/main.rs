// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # sxpress 演示服务器
//!
//! 该二进制演示框架的完整装配流程：
//! - 基于 log4rs 的异步日志架构，通过外部 YAML 灵活配置级别与输出目的地
//! - 从 TOML 文件读取运行参数（端口、监听地址、静态根目录、线程数）
//! - 注册中间件与文本/JSON/Cookie 路由
//! - 根据配置文件动态分配工作线程数并进入监听循环

use sxpress::{Cookie, Config, Sxpress};

use log::info;
use log4rs;
use tokio::runtime::Builder;

/// # 程序入口点
///
/// 初始化系统环境、加载配置并启动主事件循环。
fn main() {
    // 1. 初始化日志系统
    log4rs::init_file("config/log4rs.yaml", Default::default()).unwrap();

    // 2. 环境配置加载：从 TOML 文件读取运行参数
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");
    let port = config.port();

    // 3. 异步运行时定制：根据配置文件动态分配工作线程数
    let worker_threads = config.worker_threads();
    let runtime = Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .unwrap();

    // 4. 装配服务器：配置了 static_root 时静态资源中间件已被自动注册
    let mut app = Sxpress::from_config(&config);

    // 全局中间件：为每个响应附加框架标识
    app.use_fn(|req, res, next| {
        res.set_header("X-Powered-By", "sxpress");
        next.run(req, res);
    });

    // 文本路由
    app.get("/", |_req, res| {
        let _ = res.send("hello sxpress");
    });

    // JSON 路由
    app.get("/user", |_req, res| {
        let _ = res.send(serde_json::json!({
            "name": "shaneyale",
            "admin": true,
        }));
    });

    // Cookie 路由
    app.post("/login", |_req, res| {
        res.add_cookie(
            Cookie::new("sid", "abc123")
                .with_attr("Path", Some("/"))
                .with_attr("HttpOnly", Some("true")),
        );
        let _ = res.send(serde_json::json!({ "ok": true }));
    });

    // 5. 进入监听循环
    runtime.block_on(async move {
        app.listen(port, || info!("服务端已启动，监听端口{}", port))
            .await;
    });
}

// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在请求处理生命周期中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了协议解析错误以及响应生命周期错误（重复终结）。
//! - **语义映射**：每个变体都对应了特定的业务逻辑，便于上层模块将其转化为对应的 HTTP 响应。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志。

use std::fmt;

/// 框架处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    /// 这通常发生在请求头或正文包含非法字符时。
    RequestIsNotUtf8,
    /// 客户端使用了框架暂不支持的 HTTP 方法（可注册路由的方法之外的方法）。
    UnSupportedRequestMethod,
    /// 客户端使用了框架不支持的 HTTP 协议版本（例如：HTTP/0.9 或过高的版本）。
    UnsupportedHttpVersion,
    /// 响应已经被终结后再次尝试写入。同一次交换只允许终结一次，
    /// 第二次调用是调用方的错误，框架选择立即报错而不是产生未定义的传输行为。
    ResponseEnded,
    /// JSON 响应体序列化失败。
    JsonSerialize,
}

use Exception::*;

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
///
/// 工业实践中，这些描述信息常用于系统日志（Logging）以及发送给开发者的调试响应体中。
impl fmt::Display for Exception {
    /// 根据错误类型写入人类可读的描述文本。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            ResponseEnded => write!(f, "Response has already been ended"),
            JsonSerialize => write!(f, "Failed to serialize JSON body"),
        }
    }
}

use crate::{cookie::Cookie, exception::Exception, param::*};

use bytes::Bytes;
use chrono::prelude::*;
use log::{debug, error};

/// 类型化的响应载荷。
///
/// `send` 按载荷类型决定序列化方式与 `Content-Type`：
/// 文本走 `text/plain`，JSON 值走 `application/json`，
/// 原始字节不附加任何内容类型。
#[derive(Debug, Clone)]
pub enum Body {
    Text(String),
    Json(serde_json::Value),
    Raw(Bytes),
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Raw(Bytes::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Raw(value)
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Raw(Bytes::new())
    }
}

/// 单次交换的响应对象，承载全部待定状态（Pending State）。
///
/// 状态码、标头与 Cookie 在中间件和路由处理器执行期间累积，
/// 在第一次终结（`send`/`end`）时一次性刷出。对象随交换创建、
/// 随交换销毁，不同连接之间不共享任何可变状态。
#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie>,
    content: Bytes,
    date: DateTime<Utc>,
    server_name: String,
    ended: bool,
    deferred: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            content: Bytes::new(),
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            ended: false,
            deferred: false,
        }
    }

    /// 设置待定状态码。原因短语从标准映射表中查出。
    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&information) => information.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                panic!();
            }
        };
        self
    }

    /// 设置一条待定标头。键按大小写敏感的严格相等去重，后写覆盖先写。
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        for (k, v) in self.headers.iter_mut() {
            if k == key {
                *v = value.to_string();
                return self;
            }
        }
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// 查询一条已设置的待定标头
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 一次性设置状态码与多条标头，对应监听器响应对象的 `writeHead` 语义。
    pub fn write_head(&mut self, code: u16, headers: &[(&str, &str)]) -> &mut Self {
        self.set_status(code);
        for (key, value) in headers {
            self.set_header(key, value);
        }
        self
    }

    /// 追加一条待下发的 Cookie
    pub fn add_cookie(&mut self, cookie: Cookie) -> &mut Self {
        self.cookies.push(cookie);
        self
    }

    /// 标记当前交换为延迟响应：路由未命中时调度器不再自动写出 404，
    /// 由设置该标记的中间件/处理器自行负责终结响应。
    pub fn set_deferred(&mut self, deferred: bool) -> &mut Self {
        self.deferred = deferred;
        self
    }

    /// # 响应终结器
    ///
    /// 按载荷类型刷出待定状态并终结本次交换：
    /// - 文本 → `Content-Type: text/plain`；
    /// - JSON 值 → `Content-Type: application/json`，`serde_json` 序列化；
    /// - 原始字节 → 不附加内容类型，按原样写出（可为空）。
    ///
    /// 终结之后的再次写入是调用方错误，返回 `Exception::ResponseEnded`，
    /// 第一次写入的内容保持不变。
    pub fn send<T: Into<Body>>(&mut self, data: T) -> Result<(), Exception> {
        if self.ended {
            return Err(Exception::ResponseEnded);
        }
        match data.into() {
            Body::Text(text) => {
                self.set_header("Content-Type", "text/plain");
                self.finish(Bytes::from(text))
            }
            Body::Json(value) => {
                let serialized = match serde_json::to_vec(&value) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!("JSON响应体序列化失败: {}", e);
                        return Err(Exception::JsonSerialize);
                    }
                };
                self.set_header("Content-Type", "application/json");
                self.finish(Bytes::from(serialized))
            }
            Body::Raw(bytes) => self.finish(bytes),
        }
    }

    /// 以原始字节终结响应，不附加 `Content-Type`。
    /// 调度器的字面量响应（favicon 空响应、默认问候、404 字面量）走这条路径。
    pub fn end<T: Into<Bytes>>(&mut self, data: T) -> Result<(), Exception> {
        if self.ended {
            return Err(Exception::ResponseEnded);
        }
        self.finish(data.into())
    }

    // 唯一的终结路径。ended 置位后待定状态视为只读
    fn finish(&mut self, content: Bytes) -> Result<(), Exception> {
        self.ended = true;
        self.date = Utc::now();
        self.content = content;
        debug!(
            "响应已终结，状态码: {}，响应体: {} bytes",
            self.status_code,
            self.content.len()
        );
        Ok(())
    }

    /// 将响应序列化为 HTTP/1.1 报文字节。
    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let status_code: &str = &self.status_code.to_string();
        let information: &str = &self.information;
        let content_length: &str = &self.content.len().to_string();
        let date: &str = &format_date(&self.date);
        let server: &str = &self.server_name;

        let mut header = [
            version,
            " ",
            status_code,
            " ",
            information,
            CRLF,
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            server,
            CRLF,
        ]
        .concat();
        for (key, value) in &self.headers {
            header.push_str(key);
            header.push_str(": ");
            header.push_str(value);
            header.push_str(CRLF);
        }
        // 没有累积 Cookie 时整体省略 Set-Cookie
        for cookie in &self.cookies {
            header.push_str("Set-Cookie: ");
            header.push_str(&cookie.render());
            header.push_str(CRLF);
        }
        header.push_str(CRLF);

        [header.as_bytes(), &self.content].concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

// --- Getter 访问器实现 ---

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

/// 一条待下发的 Cookie 描述。
///
/// `attrs` 中值为 `None` 的属性会被整体省略，值为 `Some` 的属性
/// 以 `名称=值` 的形式追加到 `Set-Cookie` 行中，属性按加入顺序渲染。
#[derive(Debug, Clone)]
pub struct Cookie {
    key: String,
    value: String,
    attrs: Vec<(String, Option<String>)>,
}

impl Cookie {
    // 构造
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            attrs: Vec::new(),
        }
    }

    // 链式追加属性
    pub fn with_attr(mut self, name: &str, value: Option<&str>) -> Self {
        self.attrs
            .push((name.to_string(), value.map(|v| v.to_string())));
        self
    }

    /// 渲染为一条完整的 `Set-Cookie` 头的值。
    pub fn render(&self) -> String {
        let mut line = format!("{}={}", self.key, self.value);
        for (name, value) in &self.attrs {
            if let Some(v) = value {
                line.push_str("; ");
                line.push_str(name);
                line.push('=');
                line.push_str(v);
            }
        }
        line
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let cookie = Cookie::new("b", "2");
        assert_eq!(cookie.render(), "b=2");
    }

    #[test]
    fn test_render_with_path() {
        let cookie = Cookie::new("a", "1").with_attr("Path", Some("/"));
        assert_eq!(cookie.render(), "a=1; Path=/");
    }

    #[test]
    fn test_render_multiple_attrs_in_order() {
        let cookie = Cookie::new("sid", "abc123")
            .with_attr("Path", Some("/"))
            .with_attr("Max-Age", Some("3600"))
            .with_attr("HttpOnly", Some("true"));
        assert_eq!(cookie.render(), "sid=abc123; Path=/; Max-Age=3600; HttpOnly=true");
    }

    #[test]
    fn test_none_attr_is_omitted() {
        let cookie = Cookie::new("a", "1")
            .with_attr("Domain", None)
            .with_attr("Path", Some("/app"));
        assert_eq!(cookie.render(), "a=1; Path=/app");
    }

    #[test]
    fn test_accessors() {
        let cookie = Cookie::new("token", "xyz");
        assert_eq!(cookie.key(), "token");
        assert_eq!(cookie.value(), "xyz");
    }
}

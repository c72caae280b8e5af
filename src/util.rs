use std::path::Path;

/// 从请求目标（可能携带查询字符串与片段）中提取路径部分。
///
/// 路由匹配只看路径部分，按字符串严格相等比较，不做尾部斜杠归一化。
pub fn pathname(target: &str) -> &str {
    let without_fragment = match target.find('#') {
        Some(pos) => &target[..pos],
        None => target,
    };
    match without_fragment.find('?') {
        Some(pos) => &without_fragment[..pos],
        None => without_fragment,
    }
}

/// 将 URL 路径拆分为（目录, 文件名）两部分，供静态资源中间件拼接物理路径。
///
/// 输入应当是已经去除查询字符串的路径，例如 `/assets/app.js`
/// 会被拆分为 `("/assets", "app.js")`。
pub fn split_dir_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// 获取路径的文件后缀名（不含点号）。没有后缀时返回 `None`。
pub fn extname(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|e| e.to_str())
}

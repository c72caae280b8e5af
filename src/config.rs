use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::error;
use std::fs::File;
use std::io::prelude::*;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default)]
    static_root: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 3000,
            worker_threads: 0,
            local: true,
            static_root: None,
        }
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => panic!("no such file {} exception:{}", filename, e),
        };
        let mut str_val = String::new();
        match file.read_to_string(&mut str_val) {
            Ok(s) => s,
            Err(e) => panic!("Error Reading file: {}", e),
        };

        let mut raw_config: Config = match toml::from_str(&str_val) {
            Ok(t) => t,
            Err(_) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置");
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        raw_config
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn static_root(&self) -> Option<&str> {
        self.static_root.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert_eq!(config.port(), 3000);
        assert!(config.local());
        assert!(config.static_root().is_none());
    }

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            port = 8080
            worker_threads = 2
            local = false
            static_root = "static"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.worker_threads(), 2);
        assert!(!config.local());
        assert_eq!(config.static_root(), Some("static"));
    }

    #[test]
    fn test_parse_toml_without_static_root() {
        let raw = r#"
            port = 3000
            worker_threads = 4
            local = true
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert!(config.static_root().is_none());
    }
}

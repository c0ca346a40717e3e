//! Layered configuration: defaults, then `cold-solutions.toml`, then `COLD_*`
//! environment variables (`__` separates sections, e.g. `COLD_SMTP__HOST`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const CONFIG_FILE: &str = "cold-solutions.toml";
pub const ENV_PREFIX: &str = "COLD_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub retell: RetellConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if Path::new(CONFIG_FILE).exists() {
            figment = figment.merge(Toml::file(CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub loglevel: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:cold_solutions.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    pub proxy: Option<Url>,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout_secs: 5,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotionConfig {
    pub api_key: String,
    pub leads_database_id: String,
    pub calls_database_id: String,
    pub base_url: String,
    pub version: String,
    pub requests_per_second: u32,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            leads_database_id: String::new(),
            calls_database_id: String::new(),
            base_url: "https://api.notion.com".to_string(),
            version: "2022-06-28".to_string(),
            requests_per_second: 3,
        }
    }
}

impl NotionConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
            && (!self.leads_database_id.is_empty() || !self.calls_database_id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetellConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Default for RetellConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.retellai.com".to_string(),
        }
    }
}

impl RetellConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpConfig {
    pub server_url: String,
    pub api_key: Option<String>,
    pub concurrency: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            api_key: None,
            concurrency: 4,
        }
    }
}

impl McpConfig {
    pub fn is_configured(&self) -> bool {
        !self.server_url.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            from_name: "Cold Solutions".to_string(),
        }
    }
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.from_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_integrations_unconfigured() {
        let cfg = Config::default();
        assert!(!cfg.notion.is_configured());
        assert!(!cfg.retell.is_configured());
        assert!(!cfg.mcp.is_configured());
        assert!(!cfg.smtp.is_configured());
        assert_eq!(cfg.server.listen_addr, "0.0.0.0:8000");
        assert_eq!(cfg.notion.requests_per_second, 3);
    }

    #[test]
    fn env_overrides_nested_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("COLD_SMTP__HOST", "smtp.example.com");
            jail.set_env("COLD_SMTP__FROM_ADDRESS", "team@example.com");
            jail.set_env("COLD_MCP__CONCURRENCY", "8");
            let cfg = Config::load()?;
            assert!(cfg.smtp.is_configured());
            assert_eq!(cfg.smtp.port, 587);
            assert_eq!(cfg.mcp.concurrency, 8);
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_layered_under_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [retell]
                api_key = "from-file"

                [server]
                loglevel = "debug"
                "#,
            )?;
            jail.set_env("COLD_RETELL__API_KEY", "from-env");
            let cfg = Config::load()?;
            assert_eq!(cfg.retell.api_key, "from-env");
            assert_eq!(cfg.server.loglevel, "debug");
            Ok(())
        });
    }
}

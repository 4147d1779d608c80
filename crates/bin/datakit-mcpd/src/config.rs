use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, builder::BoolishValueParser};
use datakit_core::SessionConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4030";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "datakit-mcpd", version, about = "DataKit migration MCP daemon.")]
struct CliArgs {
    /// Optional TOML file with a `[datakit]` table.
    #[arg(long, env = "DATAKIT_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "DATAKIT_URL")]
    datakit_url: Option<String>,

    #[arg(long, env = "DATAKIT_USER")]
    datakit_user: Option<String>,

    #[arg(long, env = "DATAKIT_PASSWORD", hide_env_values = true)]
    datakit_password: Option<String>,

    #[arg(
        long = "stdio",
        env = "DATAKIT_MCP_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(long, env = "DATAKIT_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(
        long,
        env = "DATAKIT_MCP_STATEFUL",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_stateful: bool,

    #[arg(long, env = "DATAKIT_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    datakit: DataKitSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DataKitSection {
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

/// Runtime configuration loaded from CLI arguments, environment variables
/// and the optional config file.
#[derive(Debug, Clone)]
pub struct McpdConfig {
    pub session: SessionConfig,
    pub enable_stdio: bool,
    pub mcp_http_addr: SocketAddr,
    pub mcp_stateful: bool,
    pub log_filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid {name} value: {value}")]
    InvalidSetting { name: &'static str, value: String },
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl McpdConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        let file = match args.config.as_deref() {
            Some(path) => read_file_config(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    fn resolve(args: CliArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let section = file.datakit;
        let url = pick(args.datakit_url, section.url)
            .ok_or(ConfigError::MissingSetting("DATAKIT_URL"))?;
        let user = pick(args.datakit_user, section.user)
            .ok_or(ConfigError::MissingSetting("DATAKIT_USER"))?;
        let password = pick(args.datakit_password, section.password)
            .ok_or(ConfigError::MissingSetting("DATAKIT_PASSWORD"))?;

        validate_server_url(&url)?;

        if args.log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "DATAKIT_LOG",
                value: args.log_filter,
            });
        }

        Ok(Self {
            session: SessionConfig::new(url, user, password),
            enable_stdio: args.enable_stdio,
            mcp_http_addr: args.mcp_http_addr,
            mcp_stateful: args.mcp_stateful,
            log_filter: args.log_filter,
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// CLI and env values win over the file. Blank values count as missing.
fn pick(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    let present = |value: &String| !value.trim().is_empty();
    preferred.filter(present).or_else(|| fallback.filter(present))
}

fn validate_server_url(url: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidSetting {
        name: "DATAKIT_URL",
        value: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            config: None,
            datakit_url: Some("https://datakit.local:9494".to_string()),
            datakit_user: Some("admin".to_string()),
            datakit_password: Some("secret".to_string()),
            enable_stdio: false,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            mcp_stateful: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    fn file(raw: &str) -> FileConfig {
        toml::from_str(raw).expect("config file should parse")
    }

    #[test]
    fn cli_values_build_the_session() {
        let config = McpdConfig::resolve(base_args(), FileConfig::default()).expect("config should resolve");

        assert_eq!(config.session.server_url, "https://datakit.local:9494");
        assert_eq!(config.session.username, "admin");
        assert!(!config.enable_stdio);
        assert!(config.mcp_stateful);
        assert_eq!(config.mcp_http_addr.to_string(), DEFAULT_MCP_HTTP_ADDR);
    }

    #[test]
    fn file_fills_settings_missing_from_cli() {
        let mut args = base_args();
        args.datakit_url = None;
        args.datakit_password = Some("   ".to_string());

        let config = McpdConfig::resolve(
            args,
            file(
                r#"
                [datakit]
                url = "http://10.1.1.1:9494"
                user = "ignored"
                password = "from-file"
                "#,
            ),
        )
        .expect("config should resolve");

        assert_eq!(config.session.server_url, "http://10.1.1.1:9494");
        assert_eq!(config.session.username, "admin");
        assert_eq!(config.session.password, "from-file");
    }

    #[test]
    fn missing_credentials_are_reported() {
        let mut args = base_args();
        args.datakit_user = Some(String::new());

        let err = McpdConfig::resolve(args, FileConfig::default()).expect_err("user is blank");
        assert!(matches!(err, ConfigError::MissingSetting("DATAKIT_USER")));
    }

    #[test]
    fn server_url_must_be_http() {
        for url in ["datakit.local:9494", "ftp://datakit.local", "not a url"] {
            let mut args = base_args();
            args.datakit_url = Some(url.to_string());
            let err = McpdConfig::resolve(args, FileConfig::default()).expect_err("url should be rejected");
            assert!(matches!(err, ConfigError::InvalidSetting { name: "DATAKIT_URL", .. }));
        }
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let parsed: Result<FileConfig, _> = toml::from_str("[datakit]\ntoken = \"x\"\n");
        assert!(parsed.is_err());
    }
}

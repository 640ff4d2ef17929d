//! Bridge configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `RUBYPARSE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "RUBYPARSE";
pub const CONFIG_PATH_ENV: &str = "RUBYPARSE_CONFIG_PATH";
pub const LOG_ENV: &str = "RUBYPARSE_LOG";

pub const DEFAULT_SCRIPT_NAME: &str = "prettier-ruby-parser";
pub const DEFAULT_CLASS_NAME: &str = "Parser";
pub const DEFAULT_METHOD_NAME: &str = "parse";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeConfig {
    /// Program name reported by the guest (`$0`)
    pub script_name: String,

    /// Constant path of the guest parser class, e.g. `Prettier::Parser`
    pub class_name: String,

    /// Method called on the parser class with the source text
    pub method_name: String,

    /// Extra directories prepended to the guest module search path
    #[serde(default)]
    pub load_paths: Vec<PathBuf>,

    /// Fallback tracing filter when `RUBYPARSE_LOG` is unset
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
            method_name: DEFAULT_METHOD_NAME.to_string(),
            load_paths: Vec::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration, reading the file named by `RUBYPARSE_CONFIG_PATH` if set
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load configuration from an explicit file (if any) plus the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::build(path, None)
    }

    fn build(path: Option<&Path>, env_override: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("script_name", DEFAULT_SCRIPT_NAME)?
            .set_default("class_name", DEFAULT_CLASS_NAME)?
            .set_default("method_name", DEFAULT_METHOD_NAME)?
            .set_default("load_paths", Vec::<String>::new())?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let env = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("load_paths")
            .source(env_override);

        let config: BridgeConfig = builder
            .add_source(env)
            .build()
            .context("Failed to load bridge configuration")?
            .try_deserialize()
            .context("Invalid bridge configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.script_name.is_empty() {
            return Err(anyhow!("script_name must not be empty"));
        }
        if self.method_name.is_empty() {
            return Err(anyhow!("method_name must not be empty"));
        }
        if self.class_name.is_empty() {
            return Err(anyhow!("class_name must not be empty"));
        }
        if self.class_segments().any(str::is_empty) {
            return Err(anyhow!("class_name '{}' has an empty segment", self.class_name));
        }
        Ok(())
    }

    /// Segments of the class constant path, outermost first
    pub fn class_segments(&self) -> impl Iterator<Item = &str> {
        self.class_name.split("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rubyparse-{}-{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::build(None, Some(Map::new())).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = temp_config(
            "file",
            r#"
            class_name = "Prettier::Parser"
            load_paths = ["/opt/parser/lib"]
            "#,
        );

        let config = BridgeConfig::build(Some(&path), Some(Map::new())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.class_name, "Prettier::Parser");
        assert_eq!(config.load_paths, vec![PathBuf::from("/opt/parser/lib")]);
        assert_eq!(config.method_name, DEFAULT_METHOD_NAME);
    }

    #[test]
    fn test_env_overrides_file() {
        let path = temp_config("env", "method_name = \"from_file\"\n");
        let mut env = Map::new();
        env.insert("RUBYPARSE_METHOD_NAME".to_string(), "from_env".to_string());
        env.insert("RUBYPARSE_LOAD_PATHS".to_string(), "/a,/b".to_string());

        let config = BridgeConfig::build(Some(&path), Some(env)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.method_name, "from_env");
        assert_eq!(
            config.load_paths,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("rubyparse-does-not-exist.toml");
        assert!(BridgeConfig::build(Some(&path), Some(Map::new())).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_class_paths() {
        let mut config = BridgeConfig::default();
        config.class_name = "Prettier::".to_string();
        assert!(config.validate().is_err());

        config.class_name = String::new();
        assert!(config.validate().is_err());

        config.class_name = "Prettier::Parser".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.class_segments().collect::<Vec<_>>(),
            vec!["Prettier", "Parser"]
        );
    }
}

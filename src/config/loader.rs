//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ControllerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file for embedded (library) use.
pub const CONFIG_ENV_VAR: &str = "TUNNEL_LIFECYCLE_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ControllerConfig, ConfigError> {
    let config: ControllerConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load the file named by [`CONFIG_ENV_VAR`], or defaults when it is unset.
pub fn load_from_env() -> Result<ControllerConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => load_config(Path::new(&path)),
        None => Ok(ControllerConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[worker]
program = "/usr/local/bin/cloudflared"
default_args = ["cloudflared", "tunnel", "run"]

[observability]
log_level = "debug"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.worker.program, "/usr/local/bin/cloudflared");
        assert_eq!(config.worker.default_args.len(), 3);
        assert_eq!(config.worker.poll_interval_ms, 100);
        assert_eq!(config.service.name, "tunnel-lifecycle");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn rejects_bad_toml_and_bad_values() {
        assert!(matches!(parse_config("[worker"), Err(ConfigError::Parse(_))));

        let err = parse_config("[worker]\npoll_interval_ms = 0\nprogram = \"\"").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_config(Path::new("/nonexistent/tunnel-lifecycle.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

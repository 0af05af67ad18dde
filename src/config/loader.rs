//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{RunSpec, StackConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// A `${VAR}` reference named an environment variable that is not set.
    MissingVariable(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::MissingVariable(name) => {
                write!(f, "Environment variable {} is not set", name)
            }
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

/// Load, interpolate, and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StackConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: StackConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    resolve_config(config, &|name| std::env::var(name).ok())
}

/// Resolve the built-in default stack against the process environment.
pub fn default_config() -> Result<StackConfig, ConfigError> {
    resolve_config(StackConfig::default(), &|name| std::env::var(name).ok())
}

/// Interpolate `${VAR}` references in commands and environment values, then
/// validate. Exposed with an injectable lookup so tests control the
/// environment.
pub fn resolve_config(
    mut config: StackConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<StackConfig, ConfigError> {
    for service in &mut config.services {
        if let RunSpec::Exec { command } = &mut service.run {
            for arg in command.iter_mut() {
                *arg = interpolate(arg, lookup)?;
            }
        }
        for value in service.env.values_mut() {
            *value = interpolate(value, lookup)?;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Expand `${VAR}` references in a single string. Text outside references is
/// copied verbatim; an unset variable is an error.
fn interpolate(
    input: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                let value = lookup(name)
                    .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))?;
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated reference; keep the literal text.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}

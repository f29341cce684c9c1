// src/config.rs

//! Configuration precedence chain: CLI flags > `smig.config.toml`
//! > `SMIG_*` environment variables > built-in defaults. The config file may
//! declare named `[environments.<name>]` tables; `--env <name>` selects one
//! instead of the file's top-level defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Per-connection fields shared by the top-level config and every named
/// environment. All optional: an unset field falls through to the next
/// layer in the precedence chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvConfig {
    pub url: Option<String>,
    pub namespace: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    default: EnvConfig,
    #[serde(default)]
    environments: BTreeMap<String, EnvConfig>,
}

/// The CLI-supplied overrides, one per connection flag. `env` picks
/// a named environment out of the config file; it is not itself a
/// connection field.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub namespace: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
    pub env: Option<String>,
}

/// The fully-resolved configuration, after the whole precedence chain has
/// been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub schema: String,
}

impl Config {
    /// A display-friendly rendering for `smig config`, masking the
    /// password unless `show_secrets` is set (`--show-secrets`).
    pub fn display(&self, show_secrets: bool) -> String {
        let password = if show_secrets { self.password.clone() } else { "*".repeat(self.password.len().max(4)) };
        format!(
            "url = {}\nnamespace = {}\ndatabase = {}\nusername = {}\npassword = {}\nschema = {}",
            self.url, self.namespace, self.database, self.username, password, self.schema
        )
    }
}

fn pick(cli: Option<String>, file: Option<String>, env_var: &str, default: &str) -> String {
    cli.or(file).or_else(|| std::env::var(env_var).ok()).unwrap_or_else(|| default.to_string())
}

/// Resolves the final [`Config`] from CLI overrides and an optional config
/// file path. A missing config file is not an error — it just means the
/// "config file" layer of the chain contributes nothing.
pub fn resolve(cli: CliOverrides, config_path: Option<&Path>) -> Result<Config> {
    let file = match config_path {
        Some(path) if path.exists() => Some(load_config_file(path)?),
        _ => None,
    };

    let env_cfg = match &cli.env {
        Some(name) => {
            let file = file.as_ref().ok_or_else(|| Error::UnknownEnvironment { name: name.clone(), available: Vec::new() })?;
            file.environments.get(name).cloned().ok_or_else(|| Error::UnknownEnvironment {
                name: name.clone(),
                available: file.environments.keys().cloned().collect(),
            })?
        }
        None => file.map(|f| f.default).unwrap_or_default(),
    };

    Ok(Config {
        url: pick(cli.url, env_cfg.url, "SMIG_URL", "ws://localhost:8000"),
        namespace: pick(cli.namespace, env_cfg.namespace, "SMIG_NAMESPACE", "smig"),
        database: pick(cli.database, env_cfg.database, "SMIG_DATABASE", "smig"),
        username: pick(cli.username, env_cfg.username, "SMIG_USERNAME", "root"),
        password: pick(cli.password, env_cfg.password, "SMIG_PASSWORD", "root"),
        schema: pick(cli.schema, env_cfg.schema, "SMIG_SCHEMA", "schema.toml"),
    })
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// The named `[environments.*]` declared in `config_path`, for `smig
/// config` to list alongside the resolved configuration. Empty when there
/// is no config file or it declares none.
pub fn list_environments(config_path: Option<&Path>) -> Result<Vec<String>> {
    match config_path {
        Some(path) if path.exists() => Ok(load_config_file(path)?.environments.into_keys().collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn cli_flags_outrank_everything_else() {
        let file = write_config("url = \"ws://file:8000\"\n");
        let cli = CliOverrides { url: Some("ws://cli:8000".to_string()), ..Default::default() };
        let config = resolve(cli, Some(file.path())).unwrap();
        assert_eq!(config.url, "ws://cli:8000");
    }

    #[test]
    fn config_file_outranks_env_vars() {
        std::env::set_var("SMIG_NAMESPACE", "from_env");
        let file = write_config("namespace = \"from_file\"\n");
        let config = resolve(CliOverrides::default(), Some(file.path())).unwrap();
        std::env::remove_var("SMIG_NAMESPACE");
        assert_eq!(config.namespace, "from_file");
    }

    #[test]
    fn falls_back_to_defaults_with_no_file_or_env() {
        let config = resolve(CliOverrides::default(), None).unwrap();
        assert_eq!(config.database, "smig");
    }

    #[test]
    fn named_environment_overrides_the_default_section() {
        let file = write_config(
            "url = \"ws://default:8000\"\n\n[environments.prod]\nurl = \"ws://prod:8000\"\n",
        );
        let cli = CliOverrides { env: Some("prod".to_string()), ..Default::default() };
        let config = resolve(cli, Some(file.path())).unwrap();
        assert_eq!(config.url, "ws://prod:8000");
    }

    #[test]
    fn unknown_environment_lists_available_names() {
        let file = write_config("[environments.staging]\nurl = \"ws://staging:8000\"\n");
        let cli = CliOverrides { env: Some("prod".to_string()), ..Default::default() };
        let err = resolve(cli, Some(file.path())).unwrap_err();
        match err {
            Error::UnknownEnvironment { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, vec!["staging".to_string()]);
            }
            other => panic!("expected UnknownEnvironment, got {other:?}"),
        }
    }

    #[test]
    fn password_is_masked_unless_show_secrets() {
        let config = Config {
            url: "ws://x".into(),
            namespace: "ns".into(),
            database: "db".into(),
            username: "root".into(),
            password: "hunter2".into(),
            schema: "schema.rs".into(),
        };
        assert!(!config.display(false).contains("hunter2"));
        assert!(config.display(true).contains("hunter2"));
    }
}

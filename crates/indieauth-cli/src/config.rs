//! Layered settings
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. `indieauth.toml` in the working directory, or the file given with
//!    `--config` (TOML, YAML or JSON, detected from the extension)
//! 3. `INDIEAUTH_*` environment variables (`INDIEAUTH_ISSUER`,
//!    `INDIEAUTH_ACCESS_TOKEN_EXPIRATION`, ...)
//!
//! Command-line flags override all of them and are applied by the commands.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Default settings file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "indieauth.toml";

/// Prefix of the environment variables read into [`Settings`]
pub const ENV_PREFIX: &str = "INDIEAUTH";

/// Settings shared by the commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Value of the `iss` claim and the issuer expected on verification
    pub issuer: Option<String>,
    /// Private JWKS file used for signing
    pub jwks: Option<PathBuf>,
    /// Issuer JWKS endpoint used for verification
    pub jwks_url: Option<String>,
    /// Access token lifetime
    pub access_token_expiration: String,
    /// Refresh token lifetime
    pub refresh_token_expiration: String,
    /// Maximum token age accepted by `verify`
    pub max_token_age: Option<String>,
    /// Log filter used when `RUST_LOG` is unset and no `-v` is given
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            issuer: None,
            jwks: None,
            jwks_url: None,
            access_token_expiration: "15 minutes".to_string(),
            refresh_token_expiration: "60 days".to_string(),
            max_token_age: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, the settings file and the environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ConfigFileNotFound`] for a missing explicit file,
    /// [`CliError::UnsupportedConfigFormat`] for an unknown extension and
    /// [`CliError::Config`] when a source cannot be parsed.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// [`Settings::load`] with a custom environment source
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`].
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> CliResult<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("access_token_expiration", defaults.access_token_expiration)?
            .set_default("refresh_token_expiration", defaults.refresh_token_expiration)?
            .set_default("log_level", defaults.log_level)?;

        builder = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::ConfigFileNotFound(path.to_path_buf()));
                }
                let name = path
                    .to_str()
                    .ok_or_else(|| CliError::UnsupportedConfigFormat(path.to_path_buf()))?;
                builder.add_source(File::new(name, file_format(path)?))
            }
            None => builder.add_source(
                File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
            ),
        };

        let settings: Self = builder.add_source(env).build()?.try_deserialize()?;
        debug!(
            config_file = ?path,
            issuer = ?settings.issuer,
            jwks = ?settings.jwks,
            jwks_url = ?settings.jwks_url,
            "settings loaded"
        );
        Ok(settings)
    }

    /// `flag`, else the `issuer` setting
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MissingSetting`] if neither is set.
    pub fn issuer_or(&self, flag: Option<String>) -> CliResult<String> {
        flag.or_else(|| self.issuer.clone())
            .ok_or(CliError::MissingSetting {
                name: "issuer",
                flag: "--issuer",
            })
    }

    /// `flag`, else the `jwks` setting
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MissingSetting`] if neither is set.
    pub fn jwks_or(&self, flag: Option<PathBuf>) -> CliResult<PathBuf> {
        flag.or_else(|| self.jwks.clone())
            .ok_or(CliError::MissingSetting {
                name: "jwks",
                flag: "--jwks",
            })
    }
}

fn file_format(path: &Path) -> CliResult<FileFormat> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => Ok(FileFormat::Toml),
        Some("yaml" | "yml") => Ok(FileFormat::Yaml),
        Some("json") => Ok(FileFormat::Json),
        _ => Err(CliError::UnsupportedConfigFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    fn settings_file(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_then_environment() {
        let file = settings_file(
            "toml",
            r#"
issuer = "https://issuer.example/"
jwks = "/etc/indieauth/jwks.json"
access_token_expiration = "1 hour"
"#,
        );

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("INDIEAUTH_ACCESS_TOKEN_EXPIRATION", "5 minutes")]),
        )
        .unwrap();

        assert_eq!(settings.issuer.as_deref(), Some("https://issuer.example/"));
        assert_eq!(settings.jwks, Some(PathBuf::from("/etc/indieauth/jwks.json")));
        assert_eq!(settings.access_token_expiration, "5 minutes");
        assert_eq!(settings.refresh_token_expiration, "60 days");
    }

    #[test]
    fn test_json_settings() {
        let file = settings_file("json", r#"{"jwks_url": "https://issuer.example/jwks"}"#);
        let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.jwks_url.as_deref(), Some("https://issuer.example/jwks"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Settings::load_with_env(Some(Path::new("/nonexistent/indieauth.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, CliError::ConfigFileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = settings_file("ini", "issuer = x");
        let err = Settings::load_with_env(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedConfigFormat(_)));
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            issuer: Some("https://issuer.example/".into()),
            ..Settings::default()
        };
        assert_eq!(
            settings.issuer_or(Some("https://flag.example/".into())).unwrap(),
            "https://flag.example/"
        );
        assert_eq!(settings.issuer_or(None).unwrap(), "https://issuer.example/");

        let err = Settings::default().jwks_or(None).unwrap_err();
        assert!(matches!(err, CliError::MissingSetting { name: "jwks", .. }));
    }
}

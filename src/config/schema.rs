//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the connector signs in to Dataverse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Interactive OAuth sign-in through the browser
    #[default]
    #[serde(rename = "oauth")]
    OAuth,
    /// App registration with a client secret
    ClientSecret,
}

impl AuthType {
    /// Name used for this auth type inside a connection string
    pub fn connection_string_name(&self) -> &'static str {
        match self {
            AuthType::OAuth => "OAuth",
            AuthType::ClientSecret => "ClientSecret",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.connection_string_name())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oauth" => Ok(AuthType::OAuth),
            "clientsecret" | "client_secret" => Ok(AuthType::ClientSecret),
            _ => Err(format!(
                "Invalid auth type '{s}'. Must be one of: oauth, client_secret"
            )),
        }
    }
}

/// When the interactive sign-in asks the user for credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginPrompt {
    /// Let the identity platform decide
    #[default]
    Auto,
    /// Always ask for credentials
    Always,
    /// Never show a prompt; fail if interaction would be required
    Never,
}

impl fmt::Display for LoginPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoginPrompt::Auto => "Auto",
            LoginPrompt::Always => "Always",
            LoginPrompt::Never => "Never",
        })
    }
}

impl FromStr for LoginPrompt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(LoginPrompt::Auto),
            "always" => Ok(LoginPrompt::Always),
            "never" => Ok(LoginPrompt::Never),
            _ => Err(format!(
                "Invalid login prompt '{s}'. Must be one of: auto, always, never"
            )),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Dataverse connection settings
    #[serde(default)]
    pub dataverse: DataverseConfig,

    /// Report output settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReportConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.dataverse.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Dataverse connection configuration
///
/// `url` and `client_id` are intentionally not validated: blank values are
/// passed to the connector, which reports whatever failure results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataverseConfig {
    /// Environment URL, e.g. `https://contoso.crm.dynamics.com`
    #[serde(default)]
    pub url: String,

    /// Application (client) ID of the app registration
    #[serde(default)]
    pub client_id: String,

    /// Sign-in method
    #[serde(default)]
    pub auth_type: AuthType,

    /// Azure AD tenant; interactive sign-in falls back to `organizations`
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Client secret (only for `client_secret` auth)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub client_secret: Option<SecretString>,

    /// Redirect URI registered for interactive sign-in
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Prompt behavior for interactive sign-in
    #[serde(default)]
    pub login_prompt: LoginPrompt,

    /// Web API version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds; unset means requests never time out
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Full connection string; takes precedence over the individual keys
    #[serde(default)]
    pub connection_string: Option<SecretString>,
}

impl DataverseConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.api_version.is_empty() {
            return Err("dataverse.api_version cannot be empty".to_string());
        }

        if self.timeout_seconds == Some(0) {
            return Err("dataverse.timeout_seconds must be > 0 when set".to_string());
        }

        // A connection string carries its own auth settings and is checked when parsed
        if self.connection_string.is_some() {
            return Ok(());
        }

        if self.auth_type == AuthType::ClientSecret {
            if self
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().is_empty())
                .unwrap_or(true)
            {
                return Err(
                    "dataverse.client_secret cannot be empty when auth_type is 'client_secret'"
                        .to_string(),
                );
            }

            if self.tenant_id.as_ref().map(|t| t.is_empty()).unwrap_or(true) {
                return Err(
                    "dataverse.tenant_id cannot be empty when auth_type is 'client_secret'"
                        .to_string(),
                );
            }
        }

        Ok(())
    }
}

impl Default for DataverseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: String::new(),
            auth_type: AuthType::default(),
            tenant_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            login_prompt: LoginPrompt::default(),
            api_version: default_api_version(),
            timeout_seconds: None,
            connection_string: None,
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the report is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// File name prefix; the timestamp and `.csv` are appended
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.file_prefix.is_empty() {
            return Err("export.file_prefix cannot be empty".to_string());
        }

        if self
            .file_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        {
            return Err(format!(
                "export.file_prefix '{}' contains characters not allowed in file names",
                self.file_prefix
            ));
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost".to_string()
}

fn default_api_version() -> String {
    "v9.2".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_prefix() -> String {
    "EmissionsReport".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret::secret_string;

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_url_and_client_id_are_accepted() {
        let config = ReportConfig::default();
        assert!(config.dataverse.url.is_empty());
        assert!(config.dataverse.client_id.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_secret_auth_requires_secret_and_tenant() {
        let mut config = DataverseConfig {
            auth_type: AuthType::ClientSecret,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("client_secret"));

        config.client_secret = Some(secret_string("s3cr3t".to_string()));
        let err = config.validate().unwrap_err();
        assert!(err.contains("tenant_id"));

        config.tenant_id = Some("contoso.onmicrosoft.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_string_skips_auth_checks() {
        let config = DataverseConfig {
            auth_type: AuthType::ClientSecret,
            connection_string: Some(secret_string(
                "AuthType=OAuth;Url=https://x.crm.dynamics.com;".to_string(),
            )),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DataverseConfig {
            timeout_seconds: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_rejects_path_in_prefix() {
        let mut config = ExportConfig::default();
        assert!(config.validate().is_ok());

        config.file_prefix = "../reports/Emissions".to_string();
        assert!(config.validate().is_err());

        config.file_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());

        config.local_rotation = "hourly".to_string();
        config.local_enabled = true;
        config.local_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_type_parsing() {
        assert_eq!("OAuth".parse::<AuthType>().unwrap(), AuthType::OAuth);
        assert_eq!(
            "ClientSecret".parse::<AuthType>().unwrap(),
            AuthType::ClientSecret
        );
        assert_eq!(
            "client_secret".parse::<AuthType>().unwrap(),
            AuthType::ClientSecret
        );
        assert!("certificate".parse::<AuthType>().is_err());
    }

    #[test]
    fn test_login_prompt_parsing() {
        assert_eq!("Auto".parse::<LoginPrompt>().unwrap(), LoginPrompt::Auto);
        assert_eq!("never".parse::<LoginPrompt>().unwrap(), LoginPrompt::Never);
        assert_eq!(LoginPrompt::Always.to_string(), "Always");
    }

    #[test]
    fn test_deserialize_minimal_toml() {
        let config: ReportConfig = toml::from_str(
            r#"
[dataverse]
url = "https://contoso.crm.dynamics.com"
client_id = "51f81489-12ee-4a9e-aaae-a2591f45987d"
"#,
        )
        .unwrap();

        assert_eq!(config.dataverse.auth_type, AuthType::OAuth);
        assert_eq!(config.dataverse.redirect_uri, "http://localhost");
        assert_eq!(config.dataverse.api_version, "v9.2");
        assert_eq!(config.export.file_prefix, "EmissionsReport");
        assert_eq!(config.application.log_level, "warn");
    }
}

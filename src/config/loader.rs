//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ReportConfig;
use super::secret::secret_string;
use crate::domain::errors::ReportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "EMISSIONS_REPORT";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ReportConfig
/// 4. Applies environment variable overrides (EMISSIONS_REPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced variable is
/// unset, TOML parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use emissions_report::config::loader::load_config;
///
/// let config = load_config("emissions-report.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ReportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ReportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ReportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ReportConfig = toml::from_str(&contents)
        .map_err(|e| ReportError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ReportError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    tracing::debug!(path = %path.display(), "Configuration loaded");

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ReportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{key}")).ok()
}

/// Applies environment variable overrides using the EMISSIONS_REPORT_* prefix
///
/// Variables follow the pattern `EMISSIONS_REPORT_<SECTION>_<KEY>`, for example
/// `EMISSIONS_REPORT_DATAVERSE_URL`.
fn apply_env_overrides(config: &mut ReportConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_override("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Dataverse overrides
    if let Some(val) = env_override("DATAVERSE_URL") {
        config.dataverse.url = val;
    }
    if let Some(val) = env_override("DATAVERSE_CLIENT_ID") {
        config.dataverse.client_id = val;
    }
    if let Some(val) = env_override("DATAVERSE_TENANT_ID") {
        config.dataverse.tenant_id = Some(val);
    }
    if let Some(val) = env_override("DATAVERSE_CLIENT_SECRET") {
        config.dataverse.client_secret = Some(secret_string(val));
    }
    if let Some(val) = env_override("DATAVERSE_AUTH_TYPE") {
        config.dataverse.auth_type = val.parse().map_err(ReportError::Configuration)?;
    }
    if let Some(val) = env_override("DATAVERSE_CONNECTION_STRING") {
        config.dataverse.connection_string = Some(secret_string(val));
    }

    // Export overrides
    if let Some(val) = env_override("EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }

    // Logging overrides
    if let Some(val) = env_override("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Some(val) = env_override("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("EMISSIONS_LOADER_TEST_VAR", "test_value");
        let input = "client_id = \"${EMISSIONS_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "client_id = \"test_value\"\n");
        std::env::remove_var("EMISSIONS_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("EMISSIONS_LOADER_MISSING_VAR");
        let input = "client_secret = \"${EMISSIONS_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("EMISSIONS_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("EMISSIONS_LOADER_COMMENTED_VAR");
        let input = "# client_secret = \"${EMISSIONS_LOADER_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${EMISSIONS_LOADER_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(ReportError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "info"

[dataverse]
url = "https://contoso.crm.dynamics.com"
client_id = "51f81489-12ee-4a9e-aaae-a2591f45987d"

[export]
output_dir = "reports"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.dataverse.url, "https://contoso.crm.dynamics.com");
        assert_eq!(config.export.output_dir, "reports");
    }
}

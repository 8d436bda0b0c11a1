//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the configuration file.

use crate::adapters::dataverse::ConnectionParams;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let params = match ConnectionParams::from_config(&config.dataverse) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Invalid Dataverse connection settings");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dataverse URL: {}", display_or_unset(&params.url));
        println!("  Auth Type: {}", params.auth_type);
        println!("  API Version: {}", params.api_version);
        println!("  Connection String: {params}");
        if params.url.trim().is_empty() || params.client_id.trim().is_empty() {
            println!("  ⚠️  Dataverse url or client_id is empty; connecting will fail");
        }
        println!("  Output Directory: {}", config.export.output_dir);
        println!("  File Prefix: {}", config.export.file_prefix);
        println!(
            "  Local Logging: {}",
            if config.logging.local_enabled {
                config.logging.local_path.as_str()
            } else {
                "disabled"
            }
        );
        println!();
        Ok(0)
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        value
    }
}

//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "emissions-report.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing emissions report configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your Dataverse url and client_id", self.output);
                println!("  2. For app-only sign-in, set auth_type = \"client_secret\" and");
                println!("     EMISSIONS_REPORT_DATAVERSE_CLIENT_SECRET in a .env file");
                println!("  3. Validate configuration: emissions-report validate-config");
                println!("  4. Run export: emissions-report export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Emissions Report Configuration File
# Exports msdyn_emission records from Dataverse to CSV

[application]
log_level = "warn"

[dataverse]
url = "https://contoso.crm.dynamics.com"
client_id = "51f81489-12ee-4a9e-aaae-a2591f45987d"
auth_type = "oauth"

[export]
output_dir = "."
file_prefix = "EmissionsReport"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Emissions Report Configuration File
# Exports msdyn_emission records from Dataverse to CSV
#
# Values may reference environment variables with ${VAR_NAME}. Any setting can
# also be overridden with EMISSIONS_REPORT_<SECTION>_<KEY>, for example
# EMISSIONS_REPORT_DATAVERSE_URL.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "warn"

# ============================================================================
# Dataverse Connection
# ============================================================================
[dataverse]
# Environment URL
url = "https://contoso.crm.dynamics.com"

# App registration (client) ID
client_id = "51f81489-12ee-4a9e-aaae-a2591f45987d"

# Sign-in method: "oauth" (interactive browser sign-in) or "client_secret"
auth_type = "oauth"

# Directory (tenant) ID; "organizations" is used when unset
# tenant_id = "contoso.onmicrosoft.com"

# Client secret for auth_type = "client_secret" (use environment variable)
# client_secret = "${DATAVERSE_CLIENT_SECRET}"

# Loopback redirect URI registered on the app
redirect_uri = "http://localhost"

# Sign-in prompt behaviour: "auto", "always" or "never"
login_prompt = "auto"

# Web API version
api_version = "v9.2"

# Request timeout in seconds (no timeout when unset)
# timeout_seconds = 120

# A full connection string replaces the individual keys above
# connection_string = "AuthType=OAuth;Url=https://contoso.crm.dynamics.com;ClientId=...;RedirectUri=http://localhost;LoginPrompt=Auto;"

# ============================================================================
# Export Configuration
# ============================================================================
[export]
# Directory the report is written to
output_dir = "."

# Report file name prefix; files are named <prefix>_<yyyyMMdd_HHmmss>.csv
file_prefix = "EmissionsReport"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON log files
local_enabled = false

# Log directory
local_path = "logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}

//! Dataverse connection parameters and connection strings
//!
//! Parameters come either from the individual `[dataverse]` keys or from a
//! connection string of the form
//! `AuthType=OAuth;Url=<url>;ClientId=<id>;RedirectUri=http://localhost;LoginPrompt=Auto;`.

use crate::config::{secret_string, AuthType, DataverseConfig, LoginPrompt, SecretString};
use crate::domain::{DataverseError, Result};
use secrecy::ExposeSecret;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Authority segment used when no tenant is configured
pub const DEFAULT_TENANT: &str = "organizations";

/// Everything needed to open a session against one Dataverse environment
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub auth_type: AuthType,
    pub url: String,
    pub client_id: String,
    pub client_secret: Option<SecretString>,
    pub tenant_id: Option<String>,
    pub redirect_uri: String,
    pub login_prompt: LoginPrompt,
    pub api_version: String,
    pub timeout: Option<Duration>,
}

impl ConnectionParams {
    /// Build parameters from configuration
    ///
    /// A configured `connection_string` wins over the individual keys; the API
    /// version and timeout always come from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error only when a configured connection string cannot be parsed.
    pub fn from_config(config: &DataverseConfig) -> Result<Self> {
        let mut params = match &config.connection_string {
            Some(connection_string) => {
                connection_string.expose_secret().as_ref().parse::<Self>()?
            }
            None => Self {
                auth_type: config.auth_type,
                url: config.url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                tenant_id: config.tenant_id.clone(),
                redirect_uri: config.redirect_uri.clone(),
                login_prompt: config.login_prompt,
                api_version: String::new(),
                timeout: None,
            },
        };

        params.api_version = config.api_version.clone();
        params.timeout = config.timeout_seconds.map(Duration::from_secs);
        Ok(params)
    }

    /// Parsed environment URL
    ///
    /// # Errors
    ///
    /// Returns [`DataverseError::InvalidConnectionString`] when the URL is blank,
    /// malformed, or not http(s).
    pub fn service_url(&self) -> Result<Url> {
        let url = Url::parse(self.url.trim()).map_err(|e| {
            DataverseError::InvalidConnectionString(format!(
                "Url '{}' is not a valid URL: {e}",
                self.url
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DataverseError::InvalidConnectionString(format!(
                "Url '{}' must start with http:// or https://",
                self.url
            ))
            .into());
        }

        Ok(url)
    }

    /// Root of the Web API, e.g. `https://contoso.crm.dynamics.com/api/data/v9.2`
    pub fn api_base(&self) -> Result<String> {
        let url = self.service_url()?;
        Ok(format!(
            "{}/api/data/{}",
            url.as_str().trim_end_matches('/'),
            self.api_version
        ))
    }

    /// OAuth scope granting access to the environment
    pub fn scope(&self) -> Result<String> {
        let url = self.service_url()?;
        Ok(format!("{}/.default", url.as_str().trim_end_matches('/')))
    }

    /// Tenant used in the authority URL
    pub fn tenant(&self) -> &str {
        self.tenant_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TENANT)
    }

    /// Render as a connection string; a client secret is always masked
    pub fn to_connection_string(&self) -> String {
        let mut out = format!(
            "AuthType={};Url={};ClientId={};",
            self.auth_type, self.url, self.client_id
        );

        match self.auth_type {
            AuthType::OAuth => {
                out.push_str(&format!(
                    "RedirectUri={};LoginPrompt={};",
                    self.redirect_uri, self.login_prompt
                ));
            }
            AuthType::ClientSecret => {
                if self.client_secret.is_some() {
                    out.push_str("ClientSecret=********;");
                }
            }
        }

        if let Some(tenant) = &self.tenant_id {
            out.push_str(&format!("TenantId={tenant};"));
        }

        out
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_connection_string())
    }
}

impl FromStr for ConnectionParams {
    type Err = crate::domain::ReportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut auth_type = None;
        let mut params = Self {
            auth_type: AuthType::default(),
            url: String::new(),
            client_id: String::new(),
            client_secret: None,
            tenant_id: None,
            redirect_uri: "http://localhost".to_string(),
            login_prompt: LoginPrompt::default(),
            api_version: "v9.2".to_string(),
            timeout: None,
        };

        for pair in split_pairs(s) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DataverseError::InvalidConnectionString(format!(
                    "Expected key=value, got '{pair}'"
                ))
            })?;
            let value = unquote(value.trim()).to_string();

            match key.trim().to_lowercase().as_str() {
                "authtype" | "authenticationtype" => {
                    auth_type = Some(
                        value
                            .parse::<AuthType>()
                            .map_err(DataverseError::InvalidConnectionString)?,
                    );
                }
                "url" | "serviceuri" | "service uri" | "server" => params.url = value,
                "clientid" | "appid" | "applicationid" => params.client_id = value,
                "clientsecret" | "secret" => params.client_secret = Some(secret_string(value)),
                "tenantid" | "tenant" => params.tenant_id = Some(value),
                "redirecturi" | "replyurl" => params.redirect_uri = value,
                "loginprompt" => {
                    params.login_prompt = value
                        .parse::<LoginPrompt>()
                        .map_err(DataverseError::InvalidConnectionString)?;
                }
                other => {
                    tracing::debug!(key = %other, "Ignoring unsupported connection string key");
                }
            }
        }

        params.auth_type = auth_type.ok_or_else(|| {
            DataverseError::InvalidConnectionString("AuthType is required".to_string())
        })?;

        Ok(params)
    }
}

/// Split on `;` outside single or double quotes, dropping empty segments
fn split_pairs(s: &str) -> Vec<&str> {
    let mut pairs = Vec::new();
    let mut quote = None;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (';', None) => {
                pairs.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(&s[start..]);

    pairs
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

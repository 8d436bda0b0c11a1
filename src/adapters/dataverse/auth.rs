//! Sign-in to the Microsoft identity platform
//!
//! Two token sources are provided:
//! - [`InteractiveLogin`] runs the OAuth authorization-code flow with PKCE. The
//!   user opens the printed sign-in URL and the identity platform redirects the
//!   browser back to a loopback listener on the configured redirect URI.
//! - [`ClientSecretLogin`] uses an app registration secret through
//!   `azure_identity`.

use super::connection::ConnectionParams;
use crate::config::{secret_string, AuthType, LoginPrompt, SecretString};
use crate::domain::{DataverseError, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Default Microsoft identity platform host
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

const MAX_REDIRECT_REQUEST_BYTES: usize = 16 * 1024;

/// Anything that can hand out a bearer token for a scope
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Acquire an access token for `scope`
    ///
    /// # Errors
    ///
    /// Returns [`DataverseError::AuthenticationFailed`] when no token can be obtained.
    async fn access_token(&self, scope: &str) -> Result<SecretString>;
}

/// Pick the token source matching the connection's auth type
pub fn token_source_for(params: &ConnectionParams) -> Result<Box<dyn AccessTokenSource>> {
    match params.auth_type {
        AuthType::OAuth => Ok(Box::new(InteractiveLogin::new(params))),
        AuthType::ClientSecret => Ok(Box::new(ClientSecretLogin::new(params)?)),
    }
}

/// PKCE verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub fn generate() -> Self {
        let verifier = random_token(32);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Interactive authorization-code sign-in with PKCE and a loopback redirect
pub struct InteractiveLogin {
    client_id: String,
    tenant: String,
    redirect_uri: String,
    login_prompt: LoginPrompt,
    authority_host: String,
    http: reqwest::Client,
}

impl InteractiveLogin {
    pub fn new(params: &ConnectionParams) -> Self {
        Self {
            client_id: params.client_id.clone(),
            tenant: params.tenant().to_string(),
            redirect_uri: params.redirect_uri.clone(),
            login_prompt: params.login_prompt,
            authority_host: AUTHORITY_HOST.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point the flow at a different identity platform host
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/oauth2/v2.0/{}", self.authority_host, self.tenant, name)
    }

    /// Build the browser sign-in URL
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        scope: &str,
        pkce: &PkceChallenge,
        state: &str,
    ) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint("authorize")).map_err(|e| {
            DataverseError::AuthenticationFailed(format!("Invalid authority URL: {e}"))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_mode", "query")
                .append_pair("scope", scope)
                .append_pair("state", state)
                .append_pair("code_challenge", &pkce.challenge)
                .append_pair("code_challenge_method", "S256");

            match self.login_prompt {
                LoginPrompt::Auto => {}
                LoginPrompt::Always => {
                    query.append_pair("prompt", "login");
                }
                LoginPrompt::Never => {
                    query.append_pair("prompt", "none");
                }
            }
        }

        Ok(url)
    }

    /// Bind the loopback listener named by the redirect URI
    ///
    /// Without an explicit port an ephemeral one is chosen and written back into
    /// the returned redirect URI.
    async fn bind_redirect_listener(&self) -> Result<(TcpListener, String)> {
        let mut redirect = Url::parse(&self.redirect_uri).map_err(|e| {
            DataverseError::AuthenticationFailed(format!(
                "RedirectUri '{}' is not a valid URL: {e}",
                self.redirect_uri
            ))
        })?;

        if !matches!(redirect.host_str(), Some("localhost" | "127.0.0.1")) {
            return Err(DataverseError::AuthenticationFailed(format!(
                "RedirectUri '{}' must point to localhost for interactive sign-in",
                self.redirect_uri
            ))
            .into());
        }

        let listener = TcpListener::bind(("127.0.0.1", redirect.port().unwrap_or(0)))
            .await
            .map_err(|e| {
                DataverseError::AuthenticationFailed(format!(
                    "Failed to listen for the sign-in redirect: {e}"
                ))
            })?;

        let port = listener
            .local_addr()
            .map_err(|e| DataverseError::AuthenticationFailed(e.to_string()))?
            .port();
        redirect.set_port(Some(port)).map_err(|_| {
            DataverseError::AuthenticationFailed("Cannot set redirect port".to_string())
        })?;

        Ok((listener, redirect.to_string()))
    }

    /// Accept browser requests until one carries the authorization code
    async fn wait_for_code(&self, listener: &TcpListener, expected_state: &str) -> Result<String> {
        loop {
            let (mut stream, peer) = listener.accept().await.map_err(|e| {
                DataverseError::AuthenticationFailed(format!("Sign-in redirect failed: {e}"))
            })?;
            tracing::debug!(peer = %peer, "Received sign-in redirect request");

            let mut buffer = Vec::with_capacity(1024);
            let mut chunk = [0u8; 1024];
            while buffer.len() < MAX_REDIRECT_REQUEST_BYTES {
                let read = stream.read(&mut chunk).await.map_err(|e| {
                    DataverseError::AuthenticationFailed(format!("Sign-in redirect failed: {e}"))
                })?;
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);
                if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let request = String::from_utf8_lossy(&buffer);
            let request_line = request.lines().next().unwrap_or_default();
            let outcome = parse_redirect_request(request_line, expected_state);

            let body = match &outcome {
                Ok(Some(_)) => "Sign-in complete. You can close this window.",
                Ok(None) => "Waiting for sign-in.",
                Err(_) => "Sign-in failed. Check the console for details.",
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                tracing::debug!(error = %e, "Failed to answer sign-in redirect");
            }

            if let Some(code) = outcome? {
                return Ok(code);
            }
        }
    }

    /// Redeem an authorization code at the token endpoint
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        verifier: &str,
        scope: &str,
    ) -> Result<SecretString> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("code_verifier", verifier),
                ("scope", scope),
            ])
            .send()
            .await
            .map_err(|e| {
                DataverseError::AuthenticationFailed(format!("Token request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(DataverseError::AuthenticationFailed(format!(
                "Token endpoint returned {status}: {detail}"
            ))
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            DataverseError::AuthenticationFailed(format!("Unreadable token response: {e}"))
        })?;

        tracing::info!(expires_in = ?token.expires_in, "Interactive sign-in succeeded");
        Ok(secret_string(token.access_token))
    }
}

#[async_trait]
impl AccessTokenSource for InteractiveLogin {
    async fn access_token(&self, scope: &str) -> Result<SecretString> {
        let (listener, redirect_uri) = self.bind_redirect_listener().await?;
        let pkce = PkceChallenge::generate();
        let state = random_token(16);
        let authorize_url = self.authorize_url(&redirect_uri, scope, &pkce, &state)?;

        println!("Sign in to Dataverse by opening this URL in your browser:");
        println!("  {authorize_url}");
        tracing::info!(redirect_uri = %redirect_uri, "Waiting for interactive sign-in");

        let code = self.wait_for_code(&listener, &state).await?;
        self.exchange_code(&code, &redirect_uri, &pkce.verifier, scope)
            .await
    }
}

/// Inspect the request line of a redirect hitting the loopback listener
///
/// Returns `Ok(Some(code))` on success, `Ok(None)` for unrelated requests such
/// as a favicon fetch, and an error when the identity platform reported one or
/// the state does not match.
pub fn parse_redirect_request(request_line: &str, expected_state: &str) -> Result<Option<String>> {
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let url = match Url::parse(&format!("http://localhost{target}")) {
        Ok(url) => url,
        Err(_) => return Ok(None),
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let message = match error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(DataverseError::AuthenticationFailed(message).into());
    }

    match code {
        Some(code) if state.as_deref() == Some(expected_state) => Ok(Some(code)),
        Some(_) => Err(DataverseError::AuthenticationFailed(
            "Sign-in redirect carried an unexpected state".to_string(),
        )
        .into()),
        None => Ok(None),
    }
}

/// App registration sign-in with a client secret
pub struct ClientSecretLogin {
    credential: Arc<ClientSecretCredential>,
}

impl ClientSecretLogin {
    /// # Errors
    ///
    /// Returns an error when the tenant or secret is missing, or the credential
    /// cannot be created.
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let tenant_id = params
            .tenant_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DataverseError::AuthenticationFailed(
                    "TenantId is required for ClientSecret authentication".to_string(),
                )
            })?;

        let client_secret = params.client_secret.as_ref().ok_or_else(|| {
            DataverseError::AuthenticationFailed(
                "ClientSecret is required for ClientSecret authentication".to_string(),
            )
        })?;

        let secret = azure_core::credentials::Secret::new(
            client_secret.expose_secret().as_ref().to_string(),
        );

        let credential =
            ClientSecretCredential::new(tenant_id, params.client_id.clone(), secret, None)
                .map_err(|e| {
                    DataverseError::AuthenticationFailed(format!(
                        "Failed to create Azure AD credential: {e}"
                    ))
                })?;

        Ok(Self { credential })
    }
}

#[async_trait]
impl AccessTokenSource for ClientSecretLogin {
    async fn access_token(&self, scope: &str) -> Result<SecretString> {
        let token = TokenCredential::get_token(&*self.credential, &[scope], None)
            .await
            .map_err(|e| {
                DataverseError::AuthenticationFailed(format!(
                    "Failed to acquire Azure AD token: {e}"
                ))
            })?;

        Ok(secret_string(token.token.secret().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataverseConfig;
    use crate::domain::ReportError;

    fn params() -> ConnectionParams {
        ConnectionParams::from_config(&DataverseConfig {
            url: "https://contoso.crm.dynamics.com".to_string(),
            client_id: "client-123".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_pkce_challenge_is_s256_of_verifier() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.verifier.len(), 43);
        assert_eq!(
            pkce.challenge,
            URL_SAFE_NO_PAD.encode(Sha256::digest(pkce.verifier.as_bytes()))
        );
        assert_ne!(pkce.verifier, PkceChallenge::generate().verifier);
    }

    #[test]
    fn test_authorize_url_parameters() {
        let login = InteractiveLogin::new(&params());
        let pkce = PkceChallenge::generate();
        let url = login
            .authorize_url(
                "http://localhost:5000/",
                "https://contoso.crm.dynamics.com/.default",
                &pkce,
                "xyz",
            )
            .unwrap();

        assert!(url
            .as_str()
            .starts_with("https://login.microsoftonline.com/organizations/oauth2/v2.0/authorize?"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&("state".to_string(), "xyz".to_string())));
        assert!(pairs.contains(&("code_challenge".to_string(), pkce.challenge.clone())));
        assert!(!pairs.iter().any(|(k, _)| k == "prompt"));
    }

    #[test]
    fn test_authorize_url_prompt_always() {
        let mut connection = params();
        connection.login_prompt = LoginPrompt::Always;
        let login = InteractiveLogin::new(&connection);
        let url = login
            .authorize_url("http://localhost/", "s", &PkceChallenge::generate(), "st")
            .unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "prompt" && v == "login"));
    }

    #[test]
    fn test_parse_redirect_with_code() {
        let code = parse_redirect_request("GET /?code=abc123&state=s1 HTTP/1.1", "s1").unwrap();
        assert_eq!(code.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_redirect_ignores_unrelated_requests() {
        let code = parse_redirect_request("GET /favicon.ico HTTP/1.1", "s1").unwrap();
        assert!(code.is_none());
    }

    #[test]
    fn test_parse_redirect_state_mismatch() {
        let result = parse_redirect_request("GET /?code=abc&state=other HTTP/1.1", "s1");
        assert!(matches!(
            result,
            Err(ReportError::Dataverse(DataverseError::AuthenticationFailed(_)))
        ));
    }

    #[test]
    fn test_parse_redirect_error_from_identity_platform() {
        let err = parse_redirect_request(
            "GET /?error=access_denied&error_description=User%20cancelled HTTP/1.1",
            "s1",
        )
        .unwrap_err();
        assert!(err.to_string().contains("access_denied: User cancelled"));
    }

    #[test]
    fn test_client_secret_login_requires_tenant() {
        let mut connection = params();
        connection.auth_type = AuthType::ClientSecret;
        connection.client_secret = Some(secret_string("s".to_string()));
        assert!(ClientSecretLogin::new(&connection).is_err());
    }

    #[tokio::test]
    async fn test_non_loopback_redirect_rejected() {
        let mut connection = params();
        connection.redirect_uri = "https://contoso.com/callback".to_string();
        let login = InteractiveLogin::new(&connection);
        assert!(login.bind_redirect_listener().await.is_err());
    }

    #[tokio::test]
    async fn test_loopback_listener_gets_ephemeral_port() {
        let login = InteractiveLogin::new(&params());
        let (listener, redirect_uri) = login.bind_redirect_listener().await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(redirect_uri, format!("http://localhost:{port}/"));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/organizations/oauth2/v2.0/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "authorization_code".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","access_token":"tok-1","expires_in":3599}"#)
            .create_async()
            .await;

        let login = InteractiveLogin::new(&params()).with_authority_host(server.url());
        let token = login
            .exchange_code("code", "http://localhost:5000/", "verifier", "scope")
            .await
            .unwrap();

        assert_eq!(token.expose_secret().as_ref(), "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_code_error_reports_description() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/organizations/oauth2/v2.0/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Code expired"}"#)
            .create_async()
            .await;

        let login = InteractiveLogin::new(&params()).with_authority_host(server.url());
        let err = login
            .exchange_code("code", "http://localhost:5000/", "verifier", "scope")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid_grant: Code expired"));
    }
}

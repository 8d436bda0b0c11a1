//! Dataverse Web API session
//!
//! A [`DataverseSession`] holds the access token and HTTP client for one
//! environment. Sessions are created by [`DataverseSession::connect`], which
//! signs in and then calls `WhoAmI`; only a successful `WhoAmI` marks the
//! session ready. A failed sign-in still yields a session so callers can
//! inspect [`RecordSource::last_error`] and decide how to report it.

use super::auth::{token_source_for, AccessTokenSource};
use super::connection::ConnectionParams;
use super::models::{EntitySetResponse, ODataErrorResponse, QueryExpression, WhoAmIResponse};
use crate::config::SecretString;
use crate::domain::{DataverseError, EntityCollection, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

/// Annotations requested on every read so lookups carry display names
const PREFER_ANNOTATIONS: &str = "odata.include-annotations=\"*\"";

/// Anything that can run a retrieve-all query
///
/// Implemented by [`DataverseSession`]; tests substitute in-memory sources.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Whether the source can serve queries
    fn is_ready(&self) -> bool;

    /// Why the source is not ready, when known
    fn last_error(&self) -> Option<&str> {
        None
    }

    /// Retrieve every record of the query's table with the requested columns
    ///
    /// No filter and no paging are applied. Records come back in the order the
    /// service returned them.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not ready, the request fails, or the
    /// response cannot be decoded.
    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<EntityCollection>;
}

/// Authenticated session against one Dataverse environment
pub struct DataverseSession {
    params: ConnectionParams,
    http: Client,
    api_base: String,
    access_token: Option<SecretString>,
    caller: Option<WhoAmIResponse>,
    last_error: Option<String>,
}

impl DataverseSession {
    /// Sign in with the token source matching the connection's auth type
    ///
    /// # Errors
    ///
    /// Returns an error only when the service URL is unusable or the HTTP client
    /// cannot be built. Sign-in and readiness failures produce a session whose
    /// [`is_ready`](RecordSource::is_ready) is false.
    pub async fn connect(params: ConnectionParams) -> Result<Self> {
        let mut session = Self::new(params)?;

        match token_source_for(&session.params) {
            Ok(source) => session.sign_in(source.as_ref()).await,
            Err(e) => session.record_failure(e.to_string()),
        }

        Ok(session)
    }

    /// Sign in with an explicit token source
    ///
    /// # Errors
    ///
    /// Same as [`DataverseSession::connect`].
    pub async fn connect_with(
        params: ConnectionParams,
        source: &dyn AccessTokenSource,
    ) -> Result<Self> {
        let mut session = Self::new(params)?;
        session.sign_in(source).await;
        Ok(session)
    }

    fn new(params: ConnectionParams) -> Result<Self> {
        let api_base = params.api_base()?;

        let mut builder = ClientBuilder::new();
        if let Some(timeout) = params.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            DataverseError::ConnectionFailed(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            params,
            http,
            api_base,
            access_token: None,
            caller: None,
            last_error: None,
        })
    }

    async fn sign_in(&mut self, source: &dyn AccessTokenSource) {
        match self.establish(source).await {
            Ok(caller) => {
                tracing::info!(
                    url = %self.params.url,
                    user_id = %caller.user_id,
                    organization_id = %caller.organization_id,
                    "Dataverse session ready"
                );
                self.caller = Some(caller);
                self.last_error = None;
            }
            Err(e) => self.record_failure(e.to_string()),
        }
    }

    async fn establish(&mut self, source: &dyn AccessTokenSource) -> Result<WhoAmIResponse> {
        let scope = self.params.scope()?;
        let token = source.access_token(&scope).await?;
        self.access_token = Some(token);
        self.who_am_i().await
    }

    fn record_failure(&mut self, message: String) {
        tracing::error!(url = %self.params.url, error = %message, "Dataverse session is not ready");
        self.caller = None;
        self.last_error = Some(message);
    }

    /// Identity reported by `WhoAmI` once the session is ready
    pub fn caller(&self) -> Option<&WhoAmIResponse> {
        self.caller.as_ref()
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Call the `WhoAmI` function with the current token
    ///
    /// # Errors
    ///
    /// Returns [`DataverseError::NotReady`] when no token has been acquired, or
    /// the request error otherwise.
    pub async fn who_am_i(&self) -> Result<WhoAmIResponse> {
        self.get_json("WhoAmI").await
    }

    fn request(&self, path: &str) -> Result<RequestBuilder> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            DataverseError::NotReady("No access token has been acquired".to_string())
        })?;

        Ok(self
            .http
            .get(format!("{}/{}", self.api_base, path))
            .bearer_auth(token.expose_secret().as_ref())
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .header("Prefer", PREFER_ANNOTATIONS))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path = %path, "Dataverse request");

        let response = self
            .request(path)?
            .send()
            .await
            .map_err(|e| DataverseError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DataverseError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ODataErrorResponse>(&body) {
                Ok(parsed) if !parsed.error.message.is_empty() => {
                    if parsed.error.code.is_empty() {
                        parsed.error.message
                    } else {
                        format!("{}: {}", parsed.error.code, parsed.error.message)
                    }
                }
                _ => body,
            };
            return Err(DataverseError::from_status(status.as_u16(), message).into());
        }

        serde_json::from_str(&body).map_err(|e| {
            DataverseError::InvalidResponse(format!("Unexpected body for {path}: {e}")).into()
        })
    }
}

#[async_trait]
impl RecordSource for DataverseSession {
    fn is_ready(&self) -> bool {
        self.caller.is_some()
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<EntityCollection> {
        if !self.is_ready() {
            return Err(DataverseError::NotReady(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "Session has not signed in".to_string()),
            )
            .into());
        }

        let response: EntitySetResponse = self.get_json(&query.request_path()).await?;

        let entities = response
            .value
            .iter()
            .map(|row| query.decode_row(row))
            .collect::<Result<Vec<_>>>()?;

        let mut collection = EntityCollection::new(&query.entity_name, entities);
        if let Some(next_link) = response.next_link {
            tracing::warn!(
                entity = %query.entity_name,
                returned = collection.len(),
                next_link = %next_link,
                "Service reported more records; only the first page is exported"
            );
            collection.more_records = true;
        }

        tracing::info!(
            entity = %query.entity_name,
            count = collection.len(),
            "Retrieved records"
        );

        Ok(collection)
    }
}

impl Drop for DataverseSession {
    fn drop(&mut self) {
        // SecretString zeroizes on drop
        if self.access_token.take().is_some() {
            tracing::debug!(url = %self.params.url, "Dataverse session released");
        }
    }
}

impl std::fmt::Debug for DataverseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataverseSession")
            .field("api_base", &self.api_base)
            .field("ready", &self.caller.is_some())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dataverse::models::{Column, ColumnKind, ColumnSet};
    use crate::config::{secret_string, DataverseConfig};
    use crate::domain::{AttributeValue, ReportError};
    use mockito::Matcher;

    struct FixedToken(Option<&'static str>);

    #[async_trait]
    impl AccessTokenSource for FixedToken {
        async fn access_token(&self, _scope: &str) -> Result<SecretString> {
            match self.0 {
                Some(token) => Ok(secret_string(token.to_string())),
                None => Err(DataverseError::AuthenticationFailed("user cancelled".to_string()).into()),
            }
        }
    }

    fn params(url: &str) -> ConnectionParams {
        ConnectionParams::from_config(&DataverseConfig {
            url: url.to_string(),
            client_id: "client".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn who_am_i_body() -> &'static str {
        r#"{"BusinessUnitId":"b","UserId":"u","OrganizationId":"o"}"#
    }

    fn query() -> QueryExpression {
        QueryExpression::new(
            "msdyn_emission",
            ColumnSet::new(vec![
                Column::new("msdyn_name", ColumnKind::Text),
                Column::new("msdyn_co2eunit", ColumnKind::Lookup),
            ]),
        )
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = DataverseSession::connect_with(params("not a url"), &FixedToken(Some("t"))).await;
        assert!(matches!(
            result,
            Err(ReportError::Dataverse(DataverseError::InvalidConnectionString(_)))
        ));
    }

    #[tokio::test]
    async fn test_failed_sign_in_gives_unready_session() {
        let session = DataverseSession::connect_with(
            params("https://contoso.crm.dynamics.com"),
            &FixedToken(None),
        )
        .await
        .unwrap();

        assert!(!session.is_ready());
        assert!(session.last_error().unwrap().contains("user cancelled"));

        let err = session.retrieve_multiple(&query()).await.unwrap_err();
        assert!(matches!(err, ReportError::Dataverse(DataverseError::NotReady(_))));
    }

    #[tokio::test]
    async fn test_who_am_i_failure_gives_unready_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/data/v9.2/WhoAmI")
            .with_status(401)
            .with_body(r#"{"error":{"code":"0x80072560","message":"The user is not a member of the organization."}}"#)
            .create_async()
            .await;

        let session = DataverseSession::connect_with(params(&server.url()), &FixedToken(Some("t")))
            .await
            .unwrap();

        assert!(!session.is_ready());
        assert!(session
            .last_error()
            .unwrap()
            .contains("not a member of the organization"));
    }

    #[tokio::test]
    async fn test_retrieve_multiple_decodes_rows() {
        let mut server = mockito::Server::new_async().await;
        let who = server
            .mock("GET", "/api/data/v9.2/WhoAmI")
            .match_header("authorization", "Bearer t")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(who_am_i_body())
            .create_async()
            .await;
        let rows = server
            .mock("GET", "/api/data/v9.2/msdyn_emissions")
            .match_query(Matcher::UrlEncoded(
                "$select".into(),
                "msdyn_name,_msdyn_co2eunit_value".into(),
            ))
            .match_header("prefer", PREFER_ANNOTATIONS)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"value":[
                    {"msdyn_name":"Flight A1","_msdyn_co2eunit_value":"u1",
                     "_msdyn_co2eunit_value@OData.Community.Display.V1.FormattedValue":"kg"},
                    {"msdyn_name":null,"_msdyn_co2eunit_value":null}
                ]}"#,
            )
            .create_async()
            .await;

        let session = DataverseSession::connect_with(params(&server.url()), &FixedToken(Some("t")))
            .await
            .unwrap();
        assert!(session.is_ready());
        assert_eq!(session.caller().unwrap().user_id, "u");

        let collection = session.retrieve_multiple(&query()).await.unwrap();
        assert_eq!(collection.len(), 2);
        assert!(!collection.more_records);
        assert_eq!(
            collection.entities[0].attribute("msdyn_name"),
            &AttributeValue::String("Flight A1".to_string())
        );
        assert!(collection.entities[1].is_empty());

        who.assert_async().await;
        rows.assert_async().await;
    }

    #[tokio::test]
    async fn test_next_link_is_flagged_not_followed() {
        let mut server = mockito::Server::new_async().await;
        let _who = server
            .mock("GET", "/api/data/v9.2/WhoAmI")
            .with_status(200)
            .with_body(who_am_i_body())
            .create_async()
            .await;
        let rows = server
            .mock("GET", "/api/data/v9.2/msdyn_emissions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value":[{"msdyn_name":"a"}],"@odata.nextLink":"https://next"}"#)
            .expect(1)
            .create_async()
            .await;

        let session = DataverseSession::connect_with(params(&server.url()), &FixedToken(Some("t")))
            .await
            .unwrap();
        let collection = session.retrieve_multiple(&query()).await.unwrap();

        assert_eq!(collection.len(), 1);
        assert!(collection.more_records);
        rows.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_status_is_mapped() {
        let mut server = mockito::Server::new_async().await;
        let _who = server
            .mock("GET", "/api/data/v9.2/WhoAmI")
            .with_status(200)
            .with_body(who_am_i_body())
            .create_async()
            .await;
        let _rows = server
            .mock("GET", "/api/data/v9.2/msdyn_emissions")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let session = DataverseSession::connect_with(params(&server.url()), &FixedToken(Some("t")))
            .await
            .unwrap();
        let err = session.retrieve_multiple(&query()).await.unwrap_err();

        assert!(matches!(
            err,
            ReportError::Dataverse(DataverseError::ServerError { status: 503, .. })
        ));
    }
}

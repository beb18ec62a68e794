//! LINE Notify client
//!
//! Wraps the OAuth2 authorization-code flow and the notify API:
//! auth link -> user authorizes -> [`NotifyClient::get_token`] -> status / send / revoke.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{NotifyError, Result};
use crate::http::{HttpClient, RawResponse, RequestOptions};
use crate::types::*;

/// LINE Notify API client
#[derive(Clone)]
pub struct NotifyClient {
    http: HttpClient,
    config: ClientConfig,
}

impl NotifyClient {
    /// Create a new client. The config is validated first.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(&config)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn bot_url(&self, path: &str) -> String {
        format!("{}{}", self.config.bot_origin.trim_end_matches('/'), path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_origin.trim_end_matches('/'), path)
    }

    /// OAuth2 authorization endpoint URI
    ///
    /// `state` should be a CSRF token derived from the user's session; it is passed
    /// through as is and must be verified when the browser comes back to `redirect_uri`.
    pub fn auth_link(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("scope", "notify")
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state)
            .finish();

        format!("{}?{}", self.bot_url("/oauth/authorize"), query)
    }

    /// Exchange an authorization code for an access token
    pub async fn get_token(&self, code: &str) -> Result<String> {
        let options = RequestOptions::new(self.bot_url("/oauth/token"))
            .form("grant_type", "authorization_code")
            .form("client_id", &self.config.client_id)
            .form("client_secret", &self.config.client_secret)
            .form("redirect_uri", &self.config.redirect_uri)
            .form("code", code);

        debug!("Exchanging authorization code");

        let response = self.http.post(options).await?;
        let token: TokenResponse = decode("oauth/token", response)?;

        match token.access_token {
            Some(access_token) if !access_token.is_empty() => {
                info!("Obtained access token");
                Ok(access_token)
            }
            _ => {
                error!("Token response did not include an access token");
                Err(NotifyError::MissingAccessToken)
            }
        }
    }

    /// Check the connection status of an access token
    ///
    /// A revoked token fails with [`NotifyError::Unauthorized`].
    pub async fn status(&self, access_token: &str) -> Result<StatusResponse> {
        let options = RequestOptions::new(self.api_url("/api/status")).bearer(access_token);

        let response = self.http.get(options).await?;
        let status: StatusResponse = decode("api/status", response)?;

        info!("Token status: {:?} {:?}", status.target_type, status.target);
        Ok(status)
    }

    /// Send a notification to the user or group bound to the access token
    ///
    /// `params` is form encoded as is: a [`NotifyMessage`], a map or a slice of pairs.
    pub async fn send<P: Serialize + ?Sized>(&self, access_token: &str, params: &P) -> Result<ApiResponse> {
        let options = RequestOptions::new(self.api_url("/api/notify"))
            .bearer(access_token)
            .form_params(params)?;

        let response = self.http.post(options).await?;
        let result: ApiResponse = decode("api/notify", response)?;

        info!("Notification sent: {}", result.message);
        Ok(result)
    }

    /// Shorthand for sending a plain text message
    pub async fn send_message(&self, access_token: &str, message: &str) -> Result<ApiResponse> {
        self.send(access_token, &NotifyMessage::new(message)).await
    }

    /// Revoke the access token
    ///
    /// [`NotifyError::Unauthorized`] here means the token was already revoked.
    pub async fn revoke(&self, access_token: &str) -> Result<ApiResponse> {
        let options = RequestOptions::new(self.api_url("/api/revoke"))
            .bearer(access_token)
            .empty_form();

        let response = self.http.post(options).await?;
        let result: ApiResponse = decode("api/revoke", response)?;

        info!("Access token revoked");
        Ok(result)
    }
}

/// Map non-2xx to typed errors and decode the body of 2xx responses
fn decode<T: DeserializeOwned>(endpoint: &str, response: RawResponse) -> Result<T> {
    let success = response.is_success();
    let RawResponse { status, body } = response;

    if status == 401 {
        let message = error_message(&body);
        warn!("{} returned 401: {}", endpoint, message);
        return Err(NotifyError::Unauthorized {
            endpoint: endpoint.to_string(),
            message,
        });
    }

    if !success {
        let message = error_message(&body);
        error!("{} failed: {} - {}", endpoint, status, message);
        return Err(NotifyError::Api { status, message });
    }

    serde_json::from_str(&body).map_err(|e| NotifyError::Parse {
        message: format!("{}: {}", endpoint, e),
        body,
    })
}

/// Upstream message from a JSON error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.message.or(e.error_description))
        .unwrap_or_else(|| body.trim().to_string())
}

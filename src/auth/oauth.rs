// OAuth 2.0 authorization-code client for the identity provider.
//
// The token exchange returns an explicit error kind instead of surfacing
// the HTTP client's fault types: a provider refusal (typically a reused
// authorization code) is its own variant, not an exception to catch.
use serde::Deserialize;
use url::Url;

use crate::config::{AppConfig, OAuthConfig};
use crate::error::ApiError;

const PROFILE_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.profile";

#[derive(Debug, thiserror::Error)]
pub enum TokenExchangeError {
    #[error("The authorization code was refused by the identity provider; codes cannot be reused.")]
    Refused { status: u16 },
    #[error("could not reach the identity provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("the identity provider returned an unexpected response shape")]
    BadResponse,
}

impl From<TokenExchangeError> for ApiError {
    fn from(err: TokenExchangeError) -> Self {
        match err {
            TokenExchangeError::Refused { .. } => ApiError::forbidden(err.to_string()),
            TokenExchangeError::Transport(e) => {
                tracing::error!(error = %e, "identity provider unreachable");
                ApiError::bad_gateway("The identity provider could not be reached.")
            }
            TokenExchangeError::BadResponse => {
                ApiError::bad_gateway("The identity provider returned an unexpected response.")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Profile fields of the authenticated end-user, from the provider's
/// userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct Profile {
    pub sub: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

pub struct OAuthClient {
    http: reqwest::Client,
    oauth: OAuthConfig,
}

impl OAuthClient {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.provider_timeout_secs))
            .build()?;
        Ok(Self { http, oauth: config.oauth.clone() })
    }

    /// Consent-screen URL the client is redirected to when it arrives
    /// without an authorization code. `state` is the anti-forgery value the
    /// collaborator layer round-trips.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.oauth.auth_url,
            &[
                ("client_id", self.oauth.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", PROFILE_SCOPE),
                ("access_type", "online"),
                ("state", state),
            ],
        )
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, TokenExchangeError> {
        let response = self
            .http
            .post(&self.oauth.token_url)
            .form(&[
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TokenExchangeError::Refused { status: response.status().as_u16() });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|_| TokenExchangeError::BadResponse)
    }

    /// Fetches the end-user's profile with a fresh access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Profile, TokenExchangeError> {
        let response = self
            .http
            .get(&self.oauth.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TokenExchangeError::Refused { status: response.status().as_u16() });
        }

        response
            .json::<Profile>()
            .await
            .map_err(|_| TokenExchangeError::BadResponse)
    }
}

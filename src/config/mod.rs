// Process-wide configuration. Read once from the environment at start-up,
// then held immutably inside `AppState` and injected into the components
// that need it; nothing reads ambient globals after boot.
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub oauth: OAuthConfig,
    pub pagination: PaginationConfig,
    /// Deadline for every identity-provider call (JWKS, token exchange,
    /// profile fetch); dropping a request cancels the in-flight call.
    pub provider_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub certs_url: String,
    pub userinfo_url: String,
}

/// Fixed page size per listing endpoint, configurable rather than a single
/// global constant.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub boats_page_size: usize,
    pub loads_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            port: 8080,
            oauth: OAuthConfig {
                client_id: String::new(),
                client_secret: String::new(),
                auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                certs_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
                userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            },
            pagination: PaginationConfig {
                boats_page_size: 3,
                loads_page_size: 3,
            },
            provider_timeout_secs: 10,
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("HARBOR_PORT").or_else(|_| env::var("PORT")) {
            self.port = v.parse().unwrap_or(self.port);
        }

        if let Ok(v) = env::var("HARBOR_OAUTH_CLIENT_ID") {
            self.oauth.client_id = v;
        }
        if let Ok(v) = env::var("HARBOR_OAUTH_CLIENT_SECRET") {
            self.oauth.client_secret = v;
        }
        if let Ok(v) = env::var("HARBOR_OAUTH_AUTH_URL") {
            self.oauth.auth_url = v;
        }
        if let Ok(v) = env::var("HARBOR_OAUTH_TOKEN_URL") {
            self.oauth.token_url = v;
        }
        if let Ok(v) = env::var("HARBOR_OAUTH_CERTS_URL") {
            self.oauth.certs_url = v;
        }
        if let Ok(v) = env::var("HARBOR_OAUTH_USERINFO_URL") {
            self.oauth.userinfo_url = v;
        }

        if let Ok(v) = env::var("HARBOR_BOATS_PAGE_SIZE") {
            self.pagination.boats_page_size = v.parse().unwrap_or(self.pagination.boats_page_size);
        }
        if let Ok(v) = env::var("HARBOR_LOADS_PAGE_SIZE") {
            self.pagination.loads_page_size = v.parse().unwrap_or(self.pagination.loads_page_size);
        }
        if let Ok(v) = env::var("HARBOR_PROVIDER_TIMEOUT_SECS") {
            self.provider_timeout_secs = v.parse().unwrap_or(self.provider_timeout_secs);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_google_endpoints() {
        let config = AppConfig::defaults();
        assert!(config.oauth.certs_url.contains("googleapis.com"));
        assert!(config.oauth.auth_url.contains("accounts.google.com"));
    }

    #[test]
    fn default_page_sizes() {
        let config = AppConfig::defaults();
        assert_eq!(config.pagination.boats_page_size, 3);
        assert_eq!(config.pagination.loads_page_size, 3);
    }
}

use std::sync::Arc;

use crate::auth::oauth::OAuthClient;
use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::datastore::Datastore;

/// Shared, read-only application state. Cloned per request by axum; all
/// mutation lives behind the datastore seam.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Datastore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub oauth: Arc<OAuthClient>,
    pub config: Arc<AppConfig>,
}

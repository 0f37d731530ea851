use database::mongodb::Client;

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Present only when the MongoDB store is selected.
    pub mongo_client: Option<Client>,
}

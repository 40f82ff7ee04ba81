use std::sync::Arc;

use crate::tle::TleFetcher;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<TleFetcher>,
}

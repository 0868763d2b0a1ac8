use std::sync::Arc;
use crate::rate_limit::RateLimitRegistry;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub podcasts_url: reqwest::Url, // "<upstream>/podcasts", query replaced per request
    pub registry: Arc<RateLimitRegistry>,
}

impl AppState {
    pub fn new(podcasts_url: reqwest::Url, registry: Arc<RateLimitRegistry>) -> Self {
        Self {
            client: reqwest::Client::new(),
            podcasts_url,
            registry,
        }
    }
}

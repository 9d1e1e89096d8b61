//! Shared application state for the Axum API server.

use std::sync::Arc;

use subtracker_engine::service::SubscriptionService;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub subscriptions: Arc<dyn SubscriptionService>,
}

impl AppState {
    pub fn new(subscriptions: Arc<dyn SubscriptionService>) -> Self {
        Self { subscriptions }
    }
}

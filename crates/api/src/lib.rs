//! HTTP/JSON API for managing subscription records.
//!
//! Endpoints:
//! - GET    /subscriptions        list, with optional filters
//! - GET    /subscriptions/price  total price for a filter
//! - GET    /subscriptions/{id}
//! - POST   /subscriptions
//! - PUT    /subscriptions/{id}
//! - DELETE /subscriptions/{id}
//! - GET    /health

pub mod dto;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

//! Subscription CRUD routes.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use subtracker_common::error::AppError;
use subtracker_common::types::Subscription;

use crate::dto::{
    CreateSubscriptionRequest, CreatedResponse, SubscriptionListResponse, SubscriptionQuery,
    TotalPriceResponse, UpdateSubscriptionRequest, parse_uuid,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route("/subscriptions/price", get(total_price))
        .route(
            "/subscriptions/{id}",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
}

fn subscription_id(path: Result<Path<String>, PathRejection>) -> Result<Uuid, AppError> {
    let Path(raw) = path?;
    parse_uuid("id", &raw)
}

/// GET /subscriptions: List subscriptions, optionally filtered.
async fn list_subscriptions(
    State(state): State<AppState>,
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> Result<Json<SubscriptionListResponse>, AppError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;

    let subscriptions = state.subscriptions.get_all_subscriptions(&filter).await?;
    Ok(Json(SubscriptionListResponse { subscriptions }))
}

/// GET /subscriptions/{id}: Fetch a single subscription.
async fn get_subscription(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Subscription>, AppError> {
    let id = subscription_id(path)?;
    let subscription = state.subscriptions.get_subscription(id).await?;
    Ok(Json(subscription))
}

/// GET /subscriptions/price: Total price of the subscriptions matching the query.
async fn total_price(
    State(state): State<AppState>,
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> Result<Json<TotalPriceResponse>, AppError> {
    let Query(query) = query?;
    let filter = query.into_price_filter()?;

    let total_price = state
        .subscriptions
        .get_subscriptions_total_sum_filter(&filter)
        .await?;
    Ok(Json(TotalPriceResponse { total_price }))
}

/// POST /subscriptions: Create a subscription.
async fn create_subscription(
    State(state): State<AppState>,
    body: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let Json(request) = body?;
    let data = request.into_data()?;

    let id = state.subscriptions.new_subscription(data).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /subscriptions/{id}: Replace the mutable fields of a subscription.
async fn update_subscription(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = subscription_id(path)?;
    let Json(request) = body?;
    let data = request.into_data()?;

    state.subscriptions.update_subscription(id, data).await?;
    Ok(StatusCode::OK)
}

/// DELETE /subscriptions/{id}: Cancel (hard-delete) a subscription.
async fn delete_subscription(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = subscription_id(path)?;
    state.subscriptions.cancel_subscription(id).await?;
    Ok(StatusCode::OK)
}

//! Subscription service: use-case orchestration over the repository.
//!
//! Assigns identifiers, turns repository "no rows" signals into
//! `AppError::NotFound`, and aggregates prices for the total endpoint.

use async_trait::async_trait;
use uuid::Uuid;

use subtracker_common::error::{AppError, RepositoryError};
use subtracker_common::types::{
    CreateSubscriptionData, Subscription, SubscriptionFilter, UpdateSubscriptionData,
};

use crate::repository::SubscriptionRepository;

/// Use cases exposed to the HTTP layer.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Create a subscription and return its freshly generated identifier.
    async fn new_subscription(&self, data: CreateSubscriptionData) -> Result<Uuid, AppError>;

    /// Hard-delete a subscription.
    async fn cancel_subscription(&self, id: Uuid) -> Result<(), AppError>;

    async fn update_subscription(
        &self,
        id: Uuid,
        data: UpdateSubscriptionData,
    ) -> Result<(), AppError>;

    async fn get_subscription(&self, id: Uuid) -> Result<Subscription, AppError>;

    async fn get_all_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, AppError>;

    /// Sum of `price` over every subscription matching `filter`.
    async fn get_subscriptions_total_sum_filter(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<i64, AppError>;
}

/// `SubscriptionService` implementation backed by any repository.
pub struct SubscriptionManager<R> {
    repo: R,
}

impl<R: SubscriptionRepository> SubscriptionManager<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

fn not_found_or_internal(id: Uuid) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::NotFound(format!("Subscription {} not found", id)),
        other => AppError::Repository(other),
    }
}

#[async_trait]
impl<R: SubscriptionRepository> SubscriptionService for SubscriptionManager<R> {
    async fn new_subscription(&self, data: CreateSubscriptionData) -> Result<Uuid, AppError> {
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            service_name: data.service_name,
            price: data.price,
            start_date: data.start_date,
            end_date: data.end_date,
        };

        let id = self
            .repo
            .create_subscription(&subscription)
            .await
            .map_err(AppError::Repository)?;

        tracing::info!(
            subscription_id = %id,
            user_id = %subscription.user_id,
            service_name = %subscription.service_name,
            "Subscription created"
        );

        Ok(id)
    }

    async fn cancel_subscription(&self, id: Uuid) -> Result<(), AppError> {
        self.repo
            .delete_subscription_by_id(id)
            .await
            .map_err(not_found_or_internal(id))?;

        tracing::info!(subscription_id = %id, "Subscription cancelled");
        Ok(())
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        data: UpdateSubscriptionData,
    ) -> Result<(), AppError> {
        self.repo
            .update_subscription(id, &data)
            .await
            .map_err(not_found_or_internal(id))?;

        tracing::info!(
            subscription_id = %id,
            price = data.price,
            "Subscription updated"
        );
        Ok(())
    }

    async fn get_subscription(&self, id: Uuid) -> Result<Subscription, AppError> {
        self.repo
            .get_subscription_by_id(id)
            .await
            .map_err(not_found_or_internal(id))?
            .ok_or_else(|| AppError::NotFound(format!("Subscription {} not found", id)))
    }

    async fn get_all_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, AppError> {
        self.repo
            .get_all_subscriptions_filter(filter)
            .await
            .map_err(AppError::Repository)
    }

    async fn get_subscriptions_total_sum_filter(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<i64, AppError> {
        let subscriptions = self.get_all_subscriptions(filter).await?;
        let total: i64 = subscriptions.iter().map(|s| i64::from(s.price)).sum();

        tracing::debug!(
            matched = subscriptions.len(),
            total,
            "Computed subscriptions total price"
        );

        Ok(total)
    }
}

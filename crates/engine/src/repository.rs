//! Subscription repository: parameterized SQL against `app.subscriptions`.
//!
//! Every operation is a single autocommit statement. Database failures are
//! wrapped with the operation name; the only error manufactured here is
//! `RepositoryError::NotFound` for keyed writes that touch no rows.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use subtracker_common::error::RepositoryError;
use subtracker_common::types::{Subscription, SubscriptionFilter, UpdateSubscriptionData};

const SELECT_SUBSCRIPTIONS: &str =
    "SELECT id, user_id, service_name, price, start_date, end_date FROM app.subscriptions";

/// Persistence operations the service layer depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn create_subscription(&self, subscription: &Subscription) -> Result<Uuid, RepositoryError>;

    /// Returns `Ok(None)` when no row has this identifier.
    async fn get_subscription_by_id(&self, id: Uuid) -> Result<Option<Subscription>, RepositoryError>;

    async fn delete_subscription_by_id(&self, id: Uuid) -> Result<(), RepositoryError>;

    async fn update_subscription(
        &self,
        id: Uuid,
        data: &UpdateSubscriptionData,
    ) -> Result<(), RepositoryError>;

    async fn get_all_subscriptions_filter(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, RepositoryError>;
}

/// PostgreSQL-backed repository.
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn create_subscription(&self, subscription: &Subscription) -> Result<Uuid, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO app.subscriptions (id, user_id, service_name, price, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::query("insert subscription"))?;

        Ok(subscription.id)
    }

    async fn get_subscription_by_id(&self, id: Uuid) -> Result<Option<Subscription>, RepositoryError> {
        let query = format!("{SELECT_SUBSCRIPTIONS} WHERE id = $1");
        sqlx::query_as::<_, Subscription>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::query("select subscription by id"))
    }

    async fn delete_subscription_by_id(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM app.subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::query("delete subscription"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        data: &UpdateSubscriptionData,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE app.subscriptions
            SET service_name = $1, price = $2, start_date = $3, end_date = $4
            WHERE id = $5
            "#,
        )
        .bind(&data.service_name)
        .bind(data.price)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::query("update subscription"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_all_subscriptions_filter(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, RepositoryError> {
        let mut builder = filter_query(filter);
        builder
            .build_query_as::<Subscription>()
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::query("select subscriptions with filter"))
    }
}

/// Build the filtered select. Active predicates are joined with `AND` and
/// every value is bound in the order the predicates are appended.
pub fn filter_query(filter: &SubscriptionFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_SUBSCRIPTIONS);
    let mut prefix = " WHERE ";

    if let Some(service_name) = &filter.service_name {
        builder.push(prefix).push("service_name = ").push_bind(service_name);
        prefix = " AND ";
    }
    if let Some(user_id) = filter.user_id {
        builder.push(prefix).push("user_id = ").push_bind(user_id);
        prefix = " AND ";
    }
    if let Some(start_date) = filter.start_date {
        builder.push(prefix).push("start_date >= ").push_bind(start_date);
        prefix = " AND ";
    }
    if let Some(end_date) = filter.end_date {
        builder.push(prefix).push("end_date <= ").push_bind(end_date);
    }

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let filter = SubscriptionFilter::default();
        let builder = filter_query(&filter);
        assert_eq!(builder.sql(), SELECT_SUBSCRIPTIONS);
    }

    #[test]
    fn test_single_predicate() {
        let filter = SubscriptionFilter {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let builder = filter_query(&filter);
        assert_eq!(
            builder.sql(),
            format!("{SELECT_SUBSCRIPTIONS} WHERE user_id = $1")
        );
    }

    #[test]
    fn test_all_predicates_are_conjoined_in_order() {
        let filter = SubscriptionFilter {
            user_id: Some(Uuid::new_v4()),
            service_name: Some("Yandex Plus".to_string()),
            start_date: Some("08-2025".parse().unwrap()),
            end_date: Some("09-2025".parse().unwrap()),
        };
        let builder = filter_query(&filter);
        assert_eq!(
            builder.sql(),
            format!(
                "{SELECT_SUBSCRIPTIONS} WHERE service_name = $1 AND user_id = $2 \
                 AND start_date >= $3 AND end_date <= $4"
            )
        );
    }

    #[test]
    fn test_values_are_never_interpolated() {
        let filter = SubscriptionFilter {
            service_name: Some("x'; DROP TABLE app.subscriptions; --".to_string()),
            end_date: Some("12-2025".parse().unwrap()),
            ..Default::default()
        };
        let builder = filter_query(&filter);
        assert!(!builder.sql().contains("DROP"));
        assert!(builder.sql().ends_with("service_name = $1 AND end_date <= $2"));
    }
}

//! Request/response bodies and the format validation applied to them.
//!
//! Everything arrives as strings so that malformed identifiers and dates
//! are reported as validation errors (400) before the service is called.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use subtracker_common::error::AppError;
use subtracker_common::types::{
    CreateSubscriptionData, MonthYear, Subscription, SubscriptionFilter, UpdateSubscriptionData,
};

/// Body of `POST /subscriptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub user_id: String,
    pub service_name: String,
    pub price: i64,
    /// `MM-YYYY`
    pub start_date: String,
    /// `MM-YYYY`, may be omitted or null for an open-ended subscription
    pub end_date: Option<String>,
}

/// Body of `PUT /subscriptions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub service_name: String,
    pub price: i64,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Query string accepted by the list and price endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub service_name: Option<String>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Serialize)]
pub struct TotalPriceResponse {
    pub total_price: i64,
}

impl CreateSubscriptionRequest {
    pub fn into_data(self) -> Result<CreateSubscriptionData, AppError> {
        let user_id = parse_uuid("user_id", &self.user_id)?;
        let service_name = validate_service_name(self.service_name)?;
        let price = validate_price(self.price)?;
        let (start_date, end_date) = parse_period(&self.start_date, self.end_date.as_deref())?;

        Ok(CreateSubscriptionData {
            user_id,
            service_name,
            price,
            start_date,
            end_date,
        })
    }
}

impl UpdateSubscriptionRequest {
    pub fn into_data(self) -> Result<UpdateSubscriptionData, AppError> {
        let service_name = validate_service_name(self.service_name)?;
        let price = validate_price(self.price)?;
        let (start_date, end_date) = parse_period(&self.start_date, self.end_date.as_deref())?;

        Ok(UpdateSubscriptionData {
            service_name,
            price,
            start_date,
            end_date,
        })
    }
}

impl SubscriptionQuery {
    /// Filter for the list endpoint: every parameter is optional.
    pub fn into_filter(self) -> Result<SubscriptionFilter, AppError> {
        let user_id = non_empty(self.user_id)
            .map(|raw| parse_uuid("user_id", &raw))
            .transpose()?;
        let start_date = non_empty(self.start_date)
            .map(|raw| parse_month("start_date", &raw))
            .transpose()?;
        let end_date = non_empty(self.end_date)
            .map(|raw| parse_month("end_date", &raw))
            .transpose()?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            check_order(start, end)?;
        }

        Ok(SubscriptionFilter {
            user_id,
            service_name: non_empty(self.service_name),
            start_date,
            end_date,
        })
    }

    /// Filter for the price endpoint: `user_id`, `start_date` and `end_date`
    /// are required, `service_name` is optional.
    pub fn into_price_filter(self) -> Result<SubscriptionFilter, AppError> {
        let user_id = parse_uuid("user_id", &required("user_id", self.user_id)?)?;
        let start_date = required("start_date", self.start_date)?;
        let end_date = required("end_date", self.end_date)?;
        let (start_date, end_date) = parse_period(&start_date, Some(end_date.as_str()))?;

        Ok(SubscriptionFilter {
            user_id: Some(user_id),
            service_name: non_empty(self.service_name),
            start_date: Some(start_date),
            end_date,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    non_empty(value).ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

pub fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("{field} must be a valid UUID, got '{raw}'")))
}

fn parse_month(field: &str, raw: &str) -> Result<MonthYear, AppError> {
    raw.parse()
        .map_err(|e| AppError::Validation(format!("{field}: {e}")))
}

/// Parse a start date and optional end date, rejecting inverted ranges.
fn parse_period(
    start: &str,
    end: Option<&str>,
) -> Result<(MonthYear, Option<MonthYear>), AppError> {
    let start = parse_month("start_date", start)?;
    let end = match end.filter(|e| !e.is_empty()) {
        Some(raw) => {
            let end = parse_month("end_date", raw)?;
            check_order(start, end)?;
            Some(end)
        }
        None => None,
    };
    Ok((start, end))
}

fn check_order(start: MonthYear, end: MonthYear) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::Validation(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    Ok(())
}

fn validate_price(price: i64) -> Result<i32, AppError> {
    if price < 0 {
        return Err(AppError::Validation(format!(
            "price must not be negative, got {price}"
        )));
    }
    i32::try_from(price)
        .map_err(|_| AppError::Validation(format!("price {price} is too large")))
}

fn validate_service_name(name: String) -> Result<String, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("service_name is required".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "a6fa4d7c-8f90-4f92-912e-92c644c57a1e";

    fn create_request(start: &str, end: Option<&str>, price: i64) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            user_id: USER.to_string(),
            service_name: "Yandex Plus".to_string(),
            price,
            start_date: start.to_string(),
            end_date: end.map(str::to_string),
        }
    }

    fn assert_validation<T: std::fmt::Debug>(result: Result<T, AppError>) {
        assert!(
            matches!(result, Err(AppError::Validation(_))),
            "expected validation error, got {result:?}"
        );
    }

    #[test]
    fn test_create_request_valid() {
        let data = create_request("08-2025", Some("09-2025"), 1000)
            .into_data()
            .unwrap();
        assert_eq!(data.user_id.to_string(), USER);
        assert_eq!(data.price, 1000);
        assert_eq!(data.start_date.to_string(), "08-2025");
        assert_eq!(data.end_date.map(|d| d.to_string()).as_deref(), Some("09-2025"));
    }

    #[test]
    fn test_create_request_without_end_date() {
        let data = create_request("08-2025", None, 0).into_data().unwrap();
        assert_eq!(data.end_date, None);

        let data = create_request("08-2025", Some(""), 0).into_data().unwrap();
        assert_eq!(data.end_date, None);
    }

    #[test]
    fn test_create_request_same_month_is_allowed() {
        assert!(create_request("08-2025", Some("08-2025"), 1).into_data().is_ok());
    }

    #[test]
    fn test_create_request_rejects_inverted_range() {
        assert_validation(create_request("09-2025", Some("08-2025"), 1000).into_data());
    }

    #[test]
    fn test_create_request_rejects_bad_fields() {
        assert_validation(create_request("2025-08", None, 1000).into_data());
        assert_validation(create_request("08-2025", Some("13-2025"), 1000).into_data());
        assert_validation(create_request("08-2025", None, -1).into_data());
        assert_validation(create_request("08-2025", None, i64::from(i32::MAX) + 1).into_data());

        let mut request = create_request("08-2025", None, 1000);
        request.user_id = "not-a-uuid".to_string();
        assert_validation(request.into_data());

        let mut request = create_request("08-2025", None, 1000);
        request.service_name = "   ".to_string();
        assert_validation(request.into_data());
    }

    #[test]
    fn test_update_request() {
        let request = UpdateSubscriptionRequest {
            service_name: "Netflix".to_string(),
            price: 799,
            start_date: "01-2025".to_string(),
            end_date: None,
        };
        let data = request.clone().into_data().unwrap();
        assert_eq!(data.service_name, "Netflix");
        assert_eq!(data.price, 799);

        let inverted = UpdateSubscriptionRequest {
            end_date: Some("12-2024".to_string()),
            ..request
        };
        assert_validation(inverted.into_data());
    }

    #[test]
    fn test_list_query_is_fully_optional() {
        let filter = SubscriptionQuery::default().into_filter().unwrap();
        assert!(filter.is_empty());

        let filter = SubscriptionQuery {
            service_name: Some(String::new()),
            user_id: Some(String::new()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_list_query_validates_present_fields() {
        assert_validation(
            SubscriptionQuery {
                user_id: Some("not-a-uuid".to_string()),
                ..Default::default()
            }
            .into_filter(),
        );
        assert_validation(
            SubscriptionQuery {
                start_date: Some("09-2025".to_string()),
                end_date: Some("08-2025".to_string()),
                ..Default::default()
            }
            .into_filter(),
        );
    }

    #[test]
    fn test_price_query_requires_user_and_period() {
        let query = SubscriptionQuery {
            service_name: Some("Yandex Plus".to_string()),
            user_id: Some(USER.to_string()),
            start_date: Some("08-2025".to_string()),
            end_date: Some("09-2025".to_string()),
        };
        let filter = query.clone().into_price_filter().unwrap();
        assert_eq!(filter.service_name.as_deref(), Some("Yandex Plus"));
        assert!(filter.user_id.is_some());
        assert!(filter.start_date.is_some() && filter.end_date.is_some());

        let without_service = SubscriptionQuery {
            service_name: None,
            ..query.clone()
        };
        assert!(without_service.into_price_filter().unwrap().service_name.is_none());

        for missing in ["user_id", "start_date", "end_date"] {
            let mut q = query.clone();
            match missing {
                "user_id" => q.user_id = None,
                "start_date" => q.start_date = None,
                _ => q.end_date = None,
            }
            assert_validation(q.into_price_filter());
        }
    }

    #[test]
    fn test_price_query_rejects_inverted_range() {
        let query = SubscriptionQuery {
            service_name: None,
            user_id: Some(USER.to_string()),
            start_date: Some("09-2025".to_string()),
            end_date: Some("08-2025".to_string()),
        };
        assert_validation(query.into_price_filter());
    }
}

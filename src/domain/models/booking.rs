use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::money::serialize_major;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Vehicle {
    #[sqlx(rename = "vehicle_make")]
    pub make: String,
    #[sqlx(rename = "vehicle_model")]
    pub model: String,
    #[sqlx(rename = "vehicle_year")]
    pub year: Option<i32>,
    #[sqlx(rename = "vehicle_color")]
    pub color: Option<String>,
    #[sqlx(rename = "vehicle_size")]
    pub size: String,
}

#[derive(Debug, Serialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[sqlx(flatten)]
    pub vehicle: Vehicle,
    pub service_type: String,
    pub add_ons: Json<Vec<String>>,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "totalAmount", serialize_with = "serialize_major")]
    pub total_cents: i64,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub vehicle: Vehicle,
    pub service_type: String,
    pub add_ons: Vec<String>,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub total_cents: i64,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            customer_name: params.customer_name,
            customer_email: params.customer_email,
            customer_phone: params.customer_phone,
            vehicle: params.vehicle,
            service_type: params.service_type,
            add_ons: Json(params.add_ons),
            preferred_date: params.preferred_date,
            preferred_time: params.preferred_time,
            address: params.address,
            notes: params.notes,
            total_cents: params.total_cents,
            status: BookingStatus::Pending,
            invoice_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Completed, BookingStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("archived".parse::<BookingStatus>().is_err());
    }
}

pub mod sqlite_booking_repo;
pub mod sqlite_webhook_event_repo;

pub mod postgres_booking_repo;
pub mod postgres_webhook_event_repo;

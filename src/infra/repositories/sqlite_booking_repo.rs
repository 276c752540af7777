use crate::domain::{models::booking::{Booking, BookingStatus}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, customer_name, customer_email, customer_phone, vehicle_make, vehicle_model, vehicle_year, vehicle_color, vehicle_size, service_type, add_ons, preferred_date, preferred_time, address, notes, total_cents, status, invoice_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.customer_name).bind(&booking.customer_email).bind(&booking.customer_phone)
            .bind(&booking.vehicle.make).bind(&booking.vehicle.model).bind(booking.vehicle.year).bind(&booking.vehicle.color).bind(&booking.vehicle.size)
            .bind(&booking.service_type).bind(&booking.add_ons).bind(booking.preferred_date).bind(&booking.preferred_time)
            .bind(&booking.address).bind(&booking.notes).bind(booking.total_cents).bind(booking.status.as_str())
            .bind(&booking.invoice_id).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(status.as_str()).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    async fn attach_invoice(&self, id: &str, invoice_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE bookings SET invoice_id = ?, updated_at = ? WHERE id = ?")
            .bind(invoice_id).bind(Utc::now()).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound(format!("Booking {} not found", id))); }
        Ok(())
    }
}

use crate::models::DbBooking;
use eyre::Result;
use mentorsync_core::models::booking::{Booking, BookingFilter, StatusChange};
use sqlx::PgConnection;
use uuid::Uuid;

const COLUMNS: &str = "id, time_slot_id, mentor_id, learner_id, status, booked_on, processed_on, \
     updated_at, rescheduled_from";

pub async fn get_booking_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {} FROM bookings WHERE id = $1",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(booking)
}

/// Every booking ever made on the given slots, oldest first.
pub async fn get_bookings_for_slots(conn: &mut PgConnection, slot_ids: &[Uuid]) -> Result<Vec<DbBooking>> {
    if slot_ids.is_empty() {
        return Ok(Vec::new());
    }

    let bookings = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {} FROM bookings WHERE time_slot_id = ANY($1) ORDER BY booked_on ASC",
        COLUMNS
    ))
    .bind(slot_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(bookings)
}

pub async fn list_bookings(conn: &mut PgConnection, filter: BookingFilter) -> Result<Vec<DbBooking>> {
    let (column, id) = match filter {
        BookingFilter::Learner(id) => ("learner_id", id),
        BookingFilter::Mentor(id) => ("mentor_id", id),
    };

    let bookings = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {} FROM bookings WHERE {} = $1 ORDER BY booked_on DESC",
        COLUMNS, column
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(bookings)
}

/// Inserts unless the slot already has an active booking. `None` means the
/// partial unique index on active bookings rejected the row.
pub async fn insert_booking(conn: &mut PgConnection, booking: &Booking) -> Result<Option<DbBooking>> {
    let inserted = sqlx::query_as::<_, DbBooking>(&format!(
        r#"
        INSERT INTO bookings ({columns})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (time_slot_id) WHERE status IN ('requested', 'approved')
        DO NOTHING
        RETURNING {columns}
        "#,
        columns = COLUMNS
    ))
    .bind(booking.id)
    .bind(booking.time_slot_id)
    .bind(booking.mentor_id)
    .bind(booking.learner_id)
    .bind(booking.status.as_str())
    .bind(booking.booked_on)
    .bind(booking.processed_on)
    .bind(booking.updated_at)
    .bind(booking.rescheduled_from)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(inserted)
}

/// Compare-and-set on status. `None` when the booking is missing or has moved
/// on from `change.from`.
pub async fn update_booking_status(
    conn: &mut PgConnection,
    change: &StatusChange,
) -> Result<Option<DbBooking>> {
    let updated = sqlx::query_as::<_, DbBooking>(&format!(
        r#"
        UPDATE bookings
        SET status = $3,
            updated_at = $4,
            processed_on = CASE WHEN $5 THEN $4 ELSE processed_on END
        WHERE id = $1 AND status = $2
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(change.booking_id)
    .bind(change.from.as_str())
    .bind(change.to.as_str())
    .bind(change.at)
    .bind(change.processed)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(updated)
}

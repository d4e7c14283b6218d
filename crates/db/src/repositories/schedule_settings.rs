use crate::models::DbScheduleSettings;
use chrono::NaiveDate;
use eyre::Result;
use mentorsync_core::models::schedule::ScheduleSettings;
use sqlx::PgConnection;
use uuid::Uuid;

const COLUMNS: &str = "id, mentor_id, week_start_date, week_end_date, start_hour, end_hour, \
     session_duration_minutes, buffer_minutes, is_locked, created_at, updated_at";

pub async fn get_settings_by_week(
    conn: &mut PgConnection,
    mentor_id: Uuid,
    week_start: NaiveDate,
) -> Result<Option<DbScheduleSettings>> {
    let settings = sqlx::query_as::<_, DbScheduleSettings>(&format!(
        "SELECT {} FROM schedule_settings WHERE mentor_id = $1 AND week_start_date = $2",
        COLUMNS
    ))
    .bind(mentor_id)
    .bind(week_start)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(settings)
}

/// Inserts or updates by (mentor, week start). An existing row keeps its id,
/// creation time and lock; the row stays locked until the transaction ends.
pub async fn upsert_settings(
    conn: &mut PgConnection,
    settings: &ScheduleSettings,
) -> Result<DbScheduleSettings> {
    let stored = sqlx::query_as::<_, DbScheduleSettings>(&format!(
        r#"
        INSERT INTO schedule_settings ({columns})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $10)
        ON CONFLICT (mentor_id, week_start_date)
        DO UPDATE SET
            start_hour = EXCLUDED.start_hour,
            end_hour = EXCLUDED.end_hour,
            session_duration_minutes = EXCLUDED.session_duration_minutes,
            buffer_minutes = EXCLUDED.buffer_minutes,
            updated_at = EXCLUDED.updated_at
        RETURNING {columns}
        "#,
        columns = COLUMNS
    ))
    .bind(settings.id)
    .bind(settings.mentor_id)
    .bind(settings.week_start_date)
    .bind(settings.week_end_date)
    .bind(settings.start_hour)
    .bind(settings.end_hour)
    .bind(settings.session_duration_minutes)
    .bind(settings.buffer_minutes)
    .bind(settings.created_at)
    .bind(settings.updated_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(stored)
}

/// Recomputes the lock from the live slots' active bookings.
pub async fn refresh_lock(conn: &mut PgConnection, settings_id: Uuid) -> Result<Option<DbScheduleSettings>> {
    let settings = sqlx::query_as::<_, DbScheduleSettings>(&format!(
        r#"
        UPDATE schedule_settings s
        SET is_locked = EXISTS (
            SELECT 1
            FROM time_slots t
            JOIN bookings b ON b.time_slot_id = t.id
            WHERE t.settings_id = s.id
              AND NOT t.retired
              AND b.status IN ('requested', 'approved')
        )
        WHERE s.id = $1
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(settings_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(settings)
}

pub async fn delete_settings(conn: &mut PgConnection, settings_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM schedule_settings WHERE id = $1")
        .bind(settings_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

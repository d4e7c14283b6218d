use crate::models::DbTimeSlot;
use eyre::Result;
use mentorsync_core::models::schedule::WeekWindow;
use mentorsync_core::models::time_slot::TimeSlot;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn get_time_slot_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbTimeSlot>> {
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        SELECT id, mentor_id, settings_id, slot_date, start_time, end_time, retired, created_at
        FROM time_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(time_slot)
}

/// Row-locks the slot so concurrent booking writers queue behind each other.
pub async fn lock_time_slot(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbTimeSlot>> {
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        SELECT id, mentor_id, settings_id, slot_date, start_time, end_time, retired, created_at
        FROM time_slots
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(time_slot)
}

/// Live slots of a mentor's window in `(date, start, id)` order. With
/// `for_update` the rows are locked in that order.
pub async fn get_week_slots(
    conn: &mut PgConnection,
    mentor_id: Uuid,
    week: WeekWindow,
    for_update: bool,
) -> Result<Vec<DbTimeSlot>> {
    let mut sql = String::from(
        r#"
        SELECT id, mentor_id, settings_id, slot_date, start_time, end_time, retired, created_at
        FROM time_slots
        WHERE mentor_id = $1
          AND slot_date BETWEEN $2 AND $3
          AND NOT retired
        ORDER BY slot_date ASC, start_time ASC, id ASC
        "#,
    );
    if for_update {
        sql.push_str(" FOR UPDATE");
    }

    let time_slots = sqlx::query_as::<_, DbTimeSlot>(&sql)
        .bind(mentor_id)
        .bind(week.start)
        .bind(week.end)
        .fetch_all(&mut *conn)
        .await?;

    Ok(time_slots)
}

pub async fn insert_time_slot(conn: &mut PgConnection, slot: &TimeSlot) -> Result<DbTimeSlot> {
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        INSERT INTO time_slots (id, mentor_id, settings_id, slot_date, start_time, end_time, retired, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, mentor_id, settings_id, slot_date, start_time, end_time, retired, created_at
        "#,
    )
    .bind(slot.id)
    .bind(slot.mentor_id)
    .bind(slot.settings_id)
    .bind(slot.date)
    .bind(slot.start_time)
    .bind(slot.end_time)
    .bind(slot.retired)
    .bind(slot.created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(time_slot)
}

pub async fn delete_time_slots(conn: &mut PgConnection, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        DELETE FROM time_slots
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Marks slots as retired. With `detach` the settings link is cleared as well.
pub async fn retire_time_slots(conn: &mut PgConnection, ids: &[Uuid], detach: bool) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        UPDATE time_slots
        SET retired = TRUE,
            settings_id = CASE WHEN $2 THEN NULL ELSE settings_id END
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .bind(detach)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

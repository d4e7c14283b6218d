use crate::models::DbMentor;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn get_mentor_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbMentor>> {
    let mentor = sqlx::query_as::<_, DbMentor>(
        r#"
        SELECT id, timezone, created_at
        FROM mentors
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(mentor)
}

pub async fn upsert_mentor(
    conn: &mut PgConnection,
    id: Uuid,
    timezone: &str,
    created_at: DateTime<Utc>,
) -> Result<DbMentor> {
    tracing::debug!("Upserting mentor: id={}, timezone={}", id, timezone);

    let mentor = sqlx::query_as::<_, DbMentor>(
        r#"
        INSERT INTO mentors (id, timezone, created_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (id)
        DO UPDATE SET timezone = $2
        RETURNING id, timezone, created_at
        "#,
    )
    .bind(id)
    .bind(timezone)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(mentor)
}

use eyre::{Result, WrapErr};
use sqlx::{Pool, Postgres};
use tracing::info;

/// Statements are idempotent and run in order; each is sent on its own.
const SCHEMA: &[(&str, &str)] = &[
    (
        "mentors",
        r#"
        CREATE TABLE IF NOT EXISTS mentors (
            id UUID PRIMARY KEY,
            timezone VARCHAR(64) NOT NULL DEFAULT 'Asia/Bangkok',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "schedule_settings",
        r#"
        CREATE TABLE IF NOT EXISTS schedule_settings (
            id UUID PRIMARY KEY,
            mentor_id UUID NOT NULL REFERENCES mentors(id) ON DELETE CASCADE,
            week_start_date DATE NOT NULL,
            week_end_date DATE NOT NULL,
            start_hour TIME NOT NULL,
            end_hour TIME NOT NULL,
            session_duration_minutes INTEGER NOT NULL,
            buffer_minutes INTEGER NOT NULL DEFAULT 0,
            is_locked BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT uq_schedule_settings_mentor_week UNIQUE (mentor_id, week_start_date),
            CONSTRAINT valid_week CHECK (week_end_date = week_start_date + 6),
            CONSTRAINT valid_work_hours CHECK (end_hour > start_hour),
            CONSTRAINT positive_session CHECK (session_duration_minutes > 0),
            CONSTRAINT non_negative_buffer CHECK (buffer_minutes >= 0)
        );
        "#,
    ),
    (
        "time_slots",
        r#"
        CREATE TABLE IF NOT EXISTS time_slots (
            id UUID PRIMARY KEY,
            mentor_id UUID NOT NULL REFERENCES mentors(id) ON DELETE CASCADE,
            settings_id UUID NULL REFERENCES schedule_settings(id) ON DELETE SET NULL,
            slot_date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            retired BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_time_range CHECK (end_time > start_time)
        );
        "#,
    ),
    (
        "bookings",
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY,
            time_slot_id UUID NOT NULL REFERENCES time_slots(id) ON DELETE CASCADE,
            mentor_id UUID NOT NULL REFERENCES mentors(id) ON DELETE CASCADE,
            learner_id UUID NOT NULL,
            status VARCHAR(16) NOT NULL,
            booked_on TIMESTAMP WITH TIME ZONE NOT NULL,
            processed_on TIMESTAMP WITH TIME ZONE NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL,
            rescheduled_from UUID NULL REFERENCES bookings(id),
            CONSTRAINT valid_status CHECK (
                status IN ('requested', 'approved', 'declined', 'cancelled', 'completed')
            )
        );
        "#,
    ),
    (
        "uq_bookings_active_slot",
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_bookings_active_slot
            ON bookings(time_slot_id)
            WHERE status IN ('requested', 'approved');
        "#,
    ),
    (
        "idx_time_slots_mentor_date",
        "CREATE INDEX IF NOT EXISTS idx_time_slots_mentor_date ON time_slots(mentor_id, slot_date);",
    ),
    (
        "idx_time_slots_settings_id",
        "CREATE INDEX IF NOT EXISTS idx_time_slots_settings_id ON time_slots(settings_id);",
    ),
    (
        "idx_bookings_time_slot_id",
        "CREATE INDEX IF NOT EXISTS idx_bookings_time_slot_id ON bookings(time_slot_id);",
    ),
    (
        "idx_bookings_learner_id",
        "CREATE INDEX IF NOT EXISTS idx_bookings_learner_id ON bookings(learner_id);",
    ),
    (
        "idx_bookings_mentor_id",
        "CREATE INDEX IF NOT EXISTS idx_bookings_mentor_id ON bookings(mentor_id);",
    ),
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for (name, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .wrap_err_with(|| format!("Failed to create {}", name))?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE auth_users (
                id          TEXT PRIMARY KEY,
                email       TEXT UNIQUE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE profiles (
                id                  TEXT PRIMARY KEY REFERENCES auth_users(id) ON DELETE CASCADE,
                user_type           TEXT NOT NULL CHECK (user_type IN ('participant', 'organization')),
                first_name          TEXT,
                last_name           TEXT,
                age                 INTEGER,
                bio                 TEXT,
                location            TEXT,
                organization_name   TEXT,
                website             TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE events (
                id                  TEXT PRIMARY KEY,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                start_date          TEXT NOT NULL,
                end_date            TEXT NOT NULL,
                location            TEXT NOT NULL,
                max_participants    INTEGER NOT NULL CHECK (max_participants > 0),
                category            TEXT NOT NULL,
                organization_id     TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                is_published        INTEGER NOT NULL DEFAULT 0,
                image_url           TEXT,
                gallery_urls        TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_events_organization
                ON events(organization_id, created_at);

            CREATE INDEX idx_events_published
                ON events(is_published, start_date);

            CREATE TABLE applications (
                id                  TEXT PRIMARY KEY,
                event_id            TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                participant_id      TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                motivation_letter   TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'pending'
                                    CHECK (status IN ('pending', 'accepted', 'rejected')),
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                UNIQUE(event_id, participant_id)
            );

            CREATE INDEX idx_applications_participant
                ON applications(participant_id, created_at);

            CREATE INDEX idx_applications_event
                ON applications(event_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

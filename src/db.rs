use crate::creature::{Collection, Creature};
use crate::render::format_measurement;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Audit trail entry (import runs, failed loads)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Creatures Table (snapshot of the remote catalog, one row per id)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS creatures (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            categories TEXT NOT NULL,
            primary_image TEXT,
            alternate_image TEXT,
            height INTEGER NOT NULL,
            weight INTEGER NOT NULL,
            fetched_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_creatures_name ON creatures(name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the snapshot database at `path`.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

/// Upsert creatures; re-importing refreshes rows instead of duplicating them.
pub fn insert_creatures(conn: &Connection, creatures: &[Creature]) -> Result<usize> {
    let fetched_at = Utc::now().to_rfc3339();
    let mut written = 0;

    for creature in creatures {
        let categories_json = serde_json::to_string(&creature.categories)?;

        conn.execute(
            "INSERT INTO creatures (
                id, name, categories, primary_image, alternate_image, height, weight, fetched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                categories = excluded.categories,
                primary_image = excluded.primary_image,
                alternate_image = excluded.alternate_image,
                height = excluded.height,
                weight = excluded.weight,
                fetched_at = excluded.fetched_at",
            params![
                creature.id,
                creature.name,
                categories_json,
                creature.primary_image,
                creature.alternate_image,
                creature.height,
                creature.weight,
                fetched_at,
            ],
        )?;
        written += 1;
    }

    debug!(written, "creatures written to snapshot");
    Ok(written)
}

pub fn get_all_creatures(conn: &Connection) -> Result<Collection> {
    let mut stmt = conn.prepare(
        "SELECT id, name, categories, primary_image, alternate_image, height, weight
         FROM creatures
         ORDER BY id ASC",
    )?;

    let creatures = stmt
        .query_map([], |row| {
            let categories_json: String = row.get(2)?;

            Ok(Creature {
                id: row.get(0)?,
                name: row.get(1)?,
                categories: serde_json::from_str(&categories_json).unwrap_or_default(),
                primary_image: row.get(3)?,
                alternate_image: row.get(4)?,
                height: row.get(5)?,
                weight: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Collection::from_batch(creatures))
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM creatures", [], |row| row.get(0))?;

    Ok(count)
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// CSV EXPORT
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: u32,
    name: String,
    categories: String,
    height_m: String,
    weight_kg: String,
    primary_image: String,
    alternate_image: String,
}

impl From<&Creature> for CsvRow {
    fn from(creature: &Creature) -> Self {
        Self {
            id: creature.id,
            name: creature.name.clone(),
            categories: creature.categories.join("|"),
            height_m: format_measurement(creature.height),
            weight_kg: format_measurement(creature.weight),
            primary_image: creature.primary_image.clone().unwrap_or_default(),
            alternate_image: creature.alternate_image.clone().unwrap_or_default(),
        }
    }
}

pub fn export_csv(csv_path: &Path, collection: &Collection) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(csv_path).context("Failed to create CSV file")?;

    for creature in collection {
        wtr.serialize(CsvRow::from(creature))
            .context("Failed to serialize creature")?;
    }
    wtr.flush()?;

    Ok(collection.len())
}

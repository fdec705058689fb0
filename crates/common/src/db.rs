//! SQLite database for wallets and countdowns

use crate::{Countdown, Error, Result, Wallet};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Database wrapper for state persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Wallets: public slug plus the hash of the owner secret
            CREATE TABLE IF NOT EXISTS wallets (
                id TEXT PRIMARY KEY,
                wallet_id TEXT NOT NULL UNIQUE,
                owner_secret_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Countdowns, optionally owned by a wallet
            CREATE TABLE IF NOT EXISTS countdowns (
                id TEXT PRIMARY KEY,
                wallet_id TEXT REFERENCES wallets(id) ON DELETE CASCADE,
                token TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL,
                target_time INTEGER NOT NULL,
                all_day INTEGER NOT NULL DEFAULT 0,
                repeat TEXT NOT NULL DEFAULT 'none',
                remind_at TEXT NOT NULL DEFAULT 'none',
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_countdowns_wallet ON countdowns(wallet_id, created_at);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ========================================================================
    // Wallets
    // ========================================================================

    /// Insert a wallet. A taken slug surfaces as [`Error::CollisionDetected`].
    pub fn insert_wallet(&self, wallet: &Wallet) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO wallets (id, wallet_id, owner_secret_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                wallet.id.to_string(),
                wallet.wallet_id,
                wallet.owner_secret_hash,
                wallet.created_at,
            ],
        )
        .map_err(|e| collision_or(e, "wallet slug", &wallet.wallet_id))?;

        debug!("Inserted wallet {}", wallet.wallet_id);
        Ok(())
    }

    /// Get a wallet by its public slug
    pub fn get_wallet(&self, wallet_id: &str) -> Result<Option<Wallet>> {
        let conn = self.conn.lock();
        let wallet = conn
            .query_row(
                "SELECT id, wallet_id, owner_secret_hash, created_at FROM wallets WHERE wallet_id = ?1",
                params![wallet_id],
                |row| {
                    Ok(Wallet {
                        id: uuid_column(row, 0)?,
                        wallet_id: row.get(1)?,
                        owner_secret_hash: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(wallet)
    }

    // ========================================================================
    // Countdowns
    // ========================================================================

    /// Insert a countdown. A taken token surfaces as [`Error::CollisionDetected`].
    pub fn insert_countdown(&self, countdown: &Countdown) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO countdowns (id, wallet_id, token, title, description, color, target_time, all_day, repeat, remind_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                countdown.id.to_string(),
                countdown.wallet_id.map(|id| id.to_string()),
                countdown.token,
                countdown.title,
                countdown.description,
                countdown.color,
                countdown.target_time.timestamp(),
                countdown.all_day,
                countdown.repeat.to_string(),
                countdown.remind_at.to_string(),
                countdown.created_at,
            ],
        )
        .map_err(|e| collision_or(e, "countdown token", &countdown.token))?;

        debug!("Inserted countdown {}", countdown.token);
        Ok(())
    }

    /// Get a countdown by its sharing token
    pub fn get_countdown(&self, token: &str) -> Result<Option<Countdown>> {
        let conn = self.conn.lock();
        let countdown = conn
            .query_row(
                &format!("SELECT {} FROM countdowns WHERE token = ?1", COUNTDOWN_COLUMNS),
                params![token],
                countdown_from_row,
            )
            .optional()?;
        Ok(countdown)
    }

    /// Countdowns of a wallet, newest first
    pub fn list_countdowns(&self, wallet: Uuid) -> Result<Vec<Countdown>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM countdowns WHERE wallet_id = ?1 ORDER BY created_at DESC, rowid DESC",
            COUNTDOWN_COLUMNS
        ))?;

        let rows = stmt.query_map(params![wallet.to_string()], countdown_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

const COUNTDOWN_COLUMNS: &str =
    "id, wallet_id, token, title, description, color, target_time, all_day, repeat, remind_at, created_at";

fn countdown_from_row(row: &Row<'_>) -> rusqlite::Result<Countdown> {
    let wallet_id: Option<String> = row.get(1)?;
    let target_secs: i64 = row.get(6)?;
    let repeat: String = row.get(8)?;
    let remind_at: String = row.get(9)?;

    Ok(Countdown {
        id: uuid_column(row, 0)?,
        wallet_id: wallet_id
            .map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(1, e)))
            .transpose()?,
        token: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        color: row.get(5)?,
        target_time: Utc
            .timestamp_opt(target_secs, 0)
            .single()
            .ok_or_else(|| conversion_error(6, format!("timestamp {} out of range", target_secs)))?,
        all_day: row.get(7)?,
        repeat: repeat.parse().map_err(|e: String| conversion_error(8, e))?,
        remind_at: remind_at.parse().map_err(|e: String| conversion_error(9, e))?,
        created_at: row.get(10)?,
    })
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

/// Unique-constraint violations become retryable collisions
fn collision_or(err: rusqlite::Error, kind: &str, value: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Error::CollisionDetected {
                kind: kind.to_string(),
                value: value.to_string(),
            }
        }
        _ => Error::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RemindAt, Repeat, DEFAULT_COLOR};

    fn wallet(slug: &str) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            wallet_id: slug.to_string(),
            owner_secret_hash: "ab".repeat(32),
            created_at: Utc::now().timestamp(),
        }
    }

    fn countdown(wallet: Option<Uuid>, token: &str, created_at: i64) -> Countdown {
        Countdown {
            id: Uuid::new_v4(),
            wallet_id: wallet,
            token: token.to_string(),
            title: "Launch".to_string(),
            description: "ship it".to_string(),
            color: DEFAULT_COLOR.to_string(),
            target_time: Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
            all_day: true,
            repeat: Repeat::Yearly,
            remind_at: RemindAt::OneDayBefore,
            created_at,
        }
    }

    #[test]
    fn test_wallet_crud() {
        let db = Database::open_memory().unwrap();
        let w = wallet("glacier-owl-echo");
        db.insert_wallet(&w).unwrap();

        assert_eq!(db.get_wallet("glacier-owl-echo").unwrap(), Some(w));
        assert_eq!(db.get_wallet("river-owl-echo").unwrap(), None);
    }

    #[test]
    fn test_duplicate_slug_is_collision() {
        let db = Database::open_memory().unwrap();
        db.insert_wallet(&wallet("glacier-owl-echo")).unwrap();
        let err = db.insert_wallet(&wallet("glacier-owl-echo")).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, Error::CollisionDetected { .. }));
    }

    #[test]
    fn test_countdown_roundtrip_and_collision() {
        let db = Database::open_memory().unwrap();
        let w = wallet("glacier-owl-echo");
        db.insert_wallet(&w).unwrap();

        let c = countdown(Some(w.id), "alpha-beta-gamma", 100);
        db.insert_countdown(&c).unwrap();
        assert_eq!(db.get_countdown("alpha-beta-gamma").unwrap(), Some(c));

        let dup = countdown(None, "alpha-beta-gamma", 101);
        assert!(matches!(
            db.insert_countdown(&dup),
            Err(Error::CollisionDetected { .. })
        ));
        assert_eq!(db.get_countdown("missing-token-here").unwrap(), None);
    }

    #[test]
    fn test_standalone_countdown() {
        let db = Database::open_memory().unwrap();
        let c = countdown(None, "lone-wolf-moon", 5);
        db.insert_countdown(&c).unwrap();
        assert_eq!(db.get_countdown("lone-wolf-moon").unwrap().unwrap().wallet_id, None);
    }

    #[test]
    fn test_list_newest_first() {
        let db = Database::open_memory().unwrap();
        let w = wallet("glacier-owl-echo");
        let other = wallet("river-stone-path");
        db.insert_wallet(&w).unwrap();
        db.insert_wallet(&other).unwrap();

        db.insert_countdown(&countdown(Some(w.id), "one-one-one", 10)).unwrap();
        db.insert_countdown(&countdown(Some(w.id), "two-two-two", 20)).unwrap();
        db.insert_countdown(&countdown(Some(w.id), "tie-tie-tie", 20)).unwrap();
        db.insert_countdown(&countdown(Some(other.id), "zoo-zoo-zoo", 30)).unwrap();

        let tokens: Vec<String> = db
            .list_countdowns(w.id)
            .unwrap()
            .into_iter()
            .map(|c| c.token)
            .collect();
        assert_eq!(tokens, vec!["tie-tie-tie", "two-two-two", "one-one-one"]);
    }

    #[test]
    fn test_unknown_wallet_reference_rejected() {
        let db = Database::open_memory().unwrap();
        let orphan = countdown(Some(Uuid::new_v4()), "orphan-token-here", 1);
        assert!(matches!(
            db.insert_countdown(&orphan),
            Err(Error::Database(_))
        ));
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store").join("state.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_wallet(&wallet("glacier-owl-echo")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert!(db.get_wallet("glacier-owl-echo").unwrap().is_some());
    }
}

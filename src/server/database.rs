use std::sync::Arc;

use sqlx::{query, query_as, FromRow};
use tracing::{error, info};

#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
#[cfg(feature = "sqlite")]
use std::str::FromStr;

#[cfg(feature = "postgres")]
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::errors::{LicenseError, LicenseResult};

/// A license record as stored in the `licenses` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub id: i64,
    pub license_key: String,
    /// Bound hardware identifier. `None` or empty means unbound.
    pub hwid: Option<String>,
    /// Expiration timestamp exactly as supplied at creation.
    pub expires_at: Option<String>,
    pub active: bool,
}

impl License {
    /// The bound hardware identifier, if the license is bound.
    pub fn bound_hwid(&self) -> Option<&str> {
        self.hwid.as_deref().filter(|h| !h.is_empty())
    }

    pub fn is_bound(&self) -> bool {
        self.bound_hwid().is_some()
    }
}

/// Raw row shape. Legacy rows may carry NULL in `active`.
#[derive(Debug, FromRow)]
struct LicenseRow {
    id: i64,
    license_key: String,
    hwid: Option<String>,
    expires_at: Option<String>,
    active: Option<bool>,
}

impl From<LicenseRow> for License {
    fn from(row: LicenseRow) -> Self {
        License {
            id: row.id,
            license_key: row.license_key,
            hwid: row.hwid,
            expires_at: row.expires_at,
            active: row.active.unwrap_or(false),
        }
    }
}

#[cfg(feature = "sqlite")]
const SQLITE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS licenses (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        license_key TEXT UNIQUE NOT NULL,
        hwid        TEXT,
        expires_at  TEXT,
        active      BOOLEAN DEFAULT 1
    )
"#;

#[cfg(feature = "postgres")]
const POSTGRES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS licenses (
        id          BIGSERIAL PRIMARY KEY,
        license_key TEXT UNIQUE NOT NULL,
        hwid        TEXT,
        expires_at  TEXT,
        active      BOOLEAN DEFAULT TRUE
    )
"#;

/// Map a driver error, turning unique-constraint violations into `DuplicateKey`.
fn map_insert_error(backend: &str, e: sqlx::Error) -> LicenseError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return LicenseError::DuplicateKey;
        }
    }
    error!("{backend} insert_license failed: {e}");
    LicenseError::from(e)
}

/// Unified store handle over SQLite and Postgres.
///
/// Available variants depend on enabled features:
/// - `sqlite` feature enables `Database::SQLite`
/// - `postgres` feature enables `Database::Postgres`
///
/// The hosting process opens it with [`Database::connect`], prepares the schema
/// with [`Database::migrate`] and shuts it down with [`Database::close`].
#[derive(Debug, Clone)]
pub enum Database {
    #[cfg(feature = "sqlite")]
    SQLite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

impl Database {
    /// Open a connection pool for the configured backend.
    pub async fn connect(config: &DatabaseConfig) -> LicenseResult<Arc<Self>> {
        match config.db_type.as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let options = SqliteConnectOptions::from_str(&config.url)
                    .map_err(|e| LicenseError::Config(format!("invalid SQLite URL: {e}")))?
                    .create_if_missing(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to SQLite: {e}");
                        LicenseError::Persistence(format!("failed to connect to SQLite: {e}"))
                    })?;

                Ok(Arc::new(Database::SQLite(pool)))
            }
            #[cfg(not(feature = "sqlite"))]
            "sqlite" => Err(LicenseError::Config(
                "SQLite support not compiled in. Enable the 'sqlite' feature.".to_string(),
            )),
            #[cfg(feature = "postgres")]
            "postgres" => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(&config.url)
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to PostgreSQL: {e}");
                        LicenseError::Persistence(format!(
                            "failed to connect to PostgreSQL: {e}"
                        ))
                    })?;

                Ok(Arc::new(Database::Postgres(pool)))
            }
            #[cfg(not(feature = "postgres"))]
            "postgres" => Err(LicenseError::Config(
                "PostgreSQL support not compiled in. Enable the 'postgres' feature.".to_string(),
            )),
            other => Err(LicenseError::Config(format!(
                "unsupported database type: {other}"
            ))),
        }
    }

    /// Create the `licenses` table if it does not exist yet.
    pub async fn migrate(&self) -> LicenseResult<()> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                query(SQLITE_SCHEMA).execute(pool).await.map_err(|e| {
                    error!("SQLite migration failed: {e}");
                    LicenseError::from(e)
                })?;
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                query(POSTGRES_SCHEMA).execute(pool).await.map_err(|e| {
                    error!("Postgres migration failed: {e}");
                    LicenseError::from(e)
                })?;
            }
        }

        info!("Database ready");
        Ok(())
    }

    /// Close every pooled connection. Pending queries finish first.
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => pool.close().await,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => pool.close().await,
        }
    }

    /// Backend name, as used in configuration.
    pub fn db_type(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Database::Postgres(_) => "postgres",
        }
    }

    /// Cheap connectivity probe.
    pub async fn ping(&self) -> bool {
        let result = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query("SELECT 1").execute(pool).await,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query("SELECT 1").execute(pool).await,
        };

        match result {
            Ok(_) => true,
            Err(e) => {
                error!("Database ping failed: {e}");
                false
            }
        }
    }

    /// Insert a new, unbound, active license.
    ///
    /// Never overwrites: an existing key yields `LicenseError::DuplicateKey`.
    pub async fn insert_license(&self, license_key: &str, expires_at: &str) -> LicenseResult<License> {
        let row = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, LicenseRow>(
                "INSERT INTO licenses (license_key, expires_at) VALUES (?, ?) \
                 RETURNING id, license_key, hwid, expires_at, active",
            )
            .bind(license_key)
            .bind(expires_at)
            .fetch_one(pool)
            .await
            .map_err(|e| map_insert_error("SQLite", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, LicenseRow>(
                "INSERT INTO licenses (license_key, expires_at) VALUES ($1, $2) \
                 RETURNING id, license_key, hwid, expires_at, active",
            )
            .bind(license_key)
            .bind(expires_at)
            .fetch_one(pool)
            .await
            .map_err(|e| map_insert_error("Postgres", e))?,
        };

        Ok(row.into())
    }

    /// Fetch a license by its key.
    ///
    /// Returns:
    /// - `Ok(Some(License))` if found
    /// - `Ok(None)` if not found
    /// - `Err(LicenseError::Persistence)` on DB failure
    pub async fn get_license_by_key(&self, license_key: &str) -> LicenseResult<Option<License>> {
        let row = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, LicenseRow>(
                "SELECT id, license_key, hwid, expires_at, active \
                 FROM licenses WHERE license_key = ?",
            )
            .bind(license_key)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("SQLite get_license_by_key failed: {e}");
                LicenseError::from(e)
            })?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, LicenseRow>(
                "SELECT id, license_key, hwid, expires_at, active \
                 FROM licenses WHERE license_key = $1",
            )
            .bind(license_key)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Postgres get_license_by_key failed: {e}");
                LicenseError::from(e)
            })?,
        };

        Ok(row.map(License::from))
    }

    /// Bind `hwid` to the license, but only while it is still unbound.
    ///
    /// The check and the write happen in one statement, so of several
    /// concurrent binders exactly one sees the row as unbound.
    ///
    /// Returns:
    /// - `Ok(true)` if this call wrote the binding
    /// - `Ok(false)` if the license is missing or already bound
    pub async fn bind_hwid(&self, license_key: &str, hwid: Option<&str>) -> LicenseResult<bool> {
        let rows_affected = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query(
                "UPDATE licenses SET hwid = ? \
                 WHERE license_key = ? AND (hwid IS NULL OR hwid = '')",
            )
            .bind(hwid)
            .bind(license_key)
            .execute(pool)
            .await
            .map_err(|e| {
                error!("SQLite bind_hwid failed: {e}");
                LicenseError::from(e)
            })?
            .rows_affected(),
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query(
                "UPDATE licenses SET hwid = $1 \
                 WHERE license_key = $2 AND (hwid IS NULL OR hwid = '')",
            )
            .bind(hwid)
            .bind(license_key)
            .execute(pool)
            .await
            .map_err(|e| {
                error!("Postgres bind_hwid failed: {e}");
                LicenseError::from(e)
            })?
            .rows_affected(),
        };

        Ok(rows_affected > 0)
    }
}

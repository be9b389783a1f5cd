//! Popsicle repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD and search APIs over the `popsicles` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Popsicle::validate()` before SQL mutations.
//! - Create assigns `max(id) + 1` inside one transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::popsicle::{Popsicle, PopsicleId};
use crate::model::validation::ValidationErrors;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

const POPSICLES_TABLE: &str = "popsicles";
const REQUIRED_COLUMNS: &[&str] = &["id", "name", "flavour", "price", "quantity"];

const POPSICLE_SELECT_SQL: &str = "SELECT
    id,
    name,
    flavour,
    price,
    quantity
FROM popsicles";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for popsicle persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationErrors),
    Db(DbError),
    NotFound(PopsicleId),
    /// Create was called with an identifier that is already taken.
    AlreadyExists(PopsicleId),
    InvalidData(String),
    /// Connection schema is behind the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// A previous writer panicked while holding the store lock.
    Poisoned(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "popsicle not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "Popsicle with ID {id} already exists."),
            Self::InvalidData(message) => write!(f, "invalid persisted popsicle data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::Poisoned(store) => write!(f, "{store} lock poisoned by an earlier panic"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for popsicle inventory rows.
pub trait PopsicleRepository {
    /// Case-insensitive substring match against name or flavour.
    fn search_popsicles(&self, term: &str) -> RepoResult<Vec<Popsicle>>;
    fn list_popsicles(&self) -> RepoResult<Vec<Popsicle>>;
    fn get_popsicle(&self, id: PopsicleId) -> RepoResult<Option<Popsicle>>;
    /// Inserts `popsicle` under a freshly assigned identifier.
    fn create_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle>;
    fn update_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle>;
    /// Returns `true` when a row was removed.
    fn delete_popsicle(&self, id: PopsicleId) -> RepoResult<bool>;
}

impl<R: PopsicleRepository + ?Sized> PopsicleRepository for Arc<R> {
    fn search_popsicles(&self, term: &str) -> RepoResult<Vec<Popsicle>> {
        (**self).search_popsicles(term)
    }

    fn list_popsicles(&self) -> RepoResult<Vec<Popsicle>> {
        (**self).list_popsicles()
    }

    fn get_popsicle(&self, id: PopsicleId) -> RepoResult<Option<Popsicle>> {
        (**self).get_popsicle(id)
    }

    fn create_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        (**self).create_popsicle(popsicle)
    }

    fn update_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        (**self).update_popsicle(popsicle)
    }

    fn delete_popsicle(&self, id: PopsicleId) -> RepoResult<bool> {
        (**self).delete_popsicle(id)
    }
}

/// Thread-safe repository handle injected into request handlers.
pub type SharedRepository = Arc<dyn PopsicleRepository + Send + Sync>;

/// SQLite-backed popsicle repository borrowing a migrated connection.
pub struct SqlitePopsicleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePopsicleRepository<'conn> {
    /// Wraps `conn` after checking it carries the expected schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema was
    ///   altered outside the migration runner.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn)?;
        Ok(Self { conn })
    }
}

impl PopsicleRepository for SqlitePopsicleRepository<'_> {
    fn search_popsicles(&self, term: &str) -> RepoResult<Vec<Popsicle>> {
        // SQLite `lower()` only folds ASCII; matching happens in Rust instead.
        let popsicles = self
            .list_popsicles()?
            .into_iter()
            .filter(|popsicle| popsicle.matches_term(term))
            .collect();
        Ok(popsicles)
    }

    fn list_popsicles(&self) -> RepoResult<Vec<Popsicle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POPSICLE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut popsicles = Vec::new();

        while let Some(row) = rows.next()? {
            popsicles.push(parse_popsicle_row(row)?);
        }

        Ok(popsicles)
    }

    fn get_popsicle(&self, id: PopsicleId) -> RepoResult<Option<Popsicle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POPSICLE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_popsicle_row(row)?));
        }

        Ok(None)
    }

    fn create_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        popsicle.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let taken: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM popsicles WHERE id = ?1;",
                [popsicle.id],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(RepoError::AlreadyExists(popsicle.id));
        }

        let next_id: PopsicleId =
            tx.query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM popsicles;", [], |row| {
                row.get(0)
            })?;
        let mut created = popsicle.clone();
        created.id = next_id;

        tx.execute(
            "INSERT INTO popsicles (
                id,
                name,
                flavour,
                price,
                quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                created.id,
                created.name.as_str(),
                created.flavour.as_str(),
                created.price,
                created.quantity,
            ],
        )?;
        tx.commit()?;

        Ok(created)
    }

    fn update_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        popsicle.validate()?;

        let changed = self.conn.execute(
            "UPDATE popsicles
             SET
                name = ?1,
                flavour = ?2,
                price = ?3,
                quantity = ?4
             WHERE id = ?5;",
            params![
                popsicle.name.as_str(),
                popsicle.flavour.as_str(),
                popsicle.price,
                popsicle.quantity,
                popsicle.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(popsicle.id));
        }

        self.get_popsicle(popsicle.id)?
            .ok_or(RepoError::NotFound(popsicle.id))
    }

    fn delete_popsicle(&self, id: PopsicleId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM popsicles WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

/// SQLite repository that owns its connection behind a mutex.
///
/// Each call borrows the connection and runs through a short-lived
/// [`SqlitePopsicleRepository`], so request handlers on different threads
/// can share one handle.
pub struct SharedSqliteRepository {
    conn: Mutex<Connection>,
}

impl SharedSqliteRepository {
    /// Takes ownership of a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_repo<T>(
        &self,
        op: impl FnOnce(&SqlitePopsicleRepository<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let conn = self.lock()?;
        let repo = SqlitePopsicleRepository { conn: &*conn };
        op(&repo)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::Poisoned("sqlite connection"))
    }
}

impl PopsicleRepository for SharedSqliteRepository {
    fn search_popsicles(&self, term: &str) -> RepoResult<Vec<Popsicle>> {
        self.with_repo(|repo| repo.search_popsicles(term))
    }

    fn list_popsicles(&self) -> RepoResult<Vec<Popsicle>> {
        self.with_repo(|repo| repo.list_popsicles())
    }

    fn get_popsicle(&self, id: PopsicleId) -> RepoResult<Option<Popsicle>> {
        self.with_repo(|repo| repo.get_popsicle(id))
    }

    fn create_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        self.with_repo(|repo| repo.create_popsicle(popsicle))
    }

    fn update_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        self.with_repo(|repo| repo.update_popsicle(popsicle))
    }

    fn delete_popsicle(&self, id: PopsicleId) -> RepoResult<bool> {
        self.with_repo(|repo| repo.delete_popsicle(id))
    }
}

fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [POPSICLES_TABLE],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable(POPSICLES_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([POPSICLES_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: POPSICLES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn parse_popsicle_row(row: &Row<'_>) -> RepoResult<Popsicle> {
    let popsicle = Popsicle {
        id: row.get("id")?,
        name: row.get("name")?,
        flavour: row.get("flavour")?,
        price: row.get("price")?,
        quantity: row.get("quantity")?,
    };
    popsicle.validate().map_err(|err| {
        RepoError::InvalidData(format!("row {} in popsicles: {err}", popsicle.id))
    })?;
    Ok(popsicle)
}

//! List store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistence-gateway API over canonical `lists` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - (`creator`, `name`) uniqueness is backed by a UNIQUE index; violations
//!   surface as `DuplicateName`, never as silent duplicates.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Deletion is hard delete; deleting a missing id reports zero rows.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::list::{AuthzDescriptor, ItemMap, ListDraft, ListId, ListRecord,
    ListValidationError};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    id,
    version,
    creator,
    name,
    authz,
    created_time,
    updated_time,
    items
FROM lists";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "version",
    "creator",
    "name",
    "authz",
    "created_time",
    "updated_time",
    "items",
];

pub type StoreResult<T> = Result<T, StoreError>;

/// Generic store error for list persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(ListValidationError),
    Db(DbError),
    NotFound(ListId),
    /// UNIQUE(creator, name) violated at commit time.
    DuplicateName {
        creator: String,
        name: String,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "list not found: {id}"),
            Self::DuplicateName { creator, name } => {
                write!(f, "list name `{name}` already exists for creator `{creator}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted list data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ListValidationError> for StoreError {
    fn from(value: ListValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence-gateway contract consumed by the reconciler and service.
pub trait ListStore {
    /// Gets one record by stable id.
    fn get_by_id(&self, id: ListId) -> StoreResult<Option<ListRecord>>;
    /// Gets one record by its (`creator`, `name`) identity.
    fn get_by_owner_name(&self, owner: &str, name: &str) -> StoreResult<Option<ListRecord>>;
    /// Gets every record of `owner` whose name appears in `names`.
    ///
    /// One batched lookup; callers must not loop `get_by_owner_name`.
    fn get_all_matching(&self, owner: &str, names: &[String]) -> StoreResult<Vec<ListRecord>>;
    /// Counts stored records for one owner.
    fn count_for_owner(&self, owner: &str) -> StoreResult<usize>;
    /// Inserts a draft, assigning its id; the id is usable within the same
    /// transaction.
    fn insert(&self, draft: &ListDraft) -> StoreResult<ListRecord>;
    /// Overwrites the stored access descriptor for one record.
    fn update_authz(&self, id: ListId, authz: &AuthzDescriptor) -> StoreResult<()>;
    /// Applies an allow-listed field patch and bumps `updated_time`.
    fn apply_patch(
        &self,
        id: ListId,
        name: Option<&str>,
        items: Option<&ItemMap>,
        now: DateTime<Utc>,
    ) -> StoreResult<ListRecord>;
    /// Fully overwrites one record's mutable content, preserving its id.
    fn replace(&self, record: &ListRecord) -> StoreResult<ListRecord>;
    /// Merges items into one record; key collisions overwrite stored items.
    fn merge_items(&self, id: ListId, items: &ItemMap, now: DateTime<Utc>)
        -> StoreResult<ListRecord>;
    /// Deletes one record. Returns the number of rows removed (0 or 1).
    fn delete_by_id(&self, id: ListId) -> StoreResult<usize>;
    /// Deletes every record of one owner. Returns the number of rows removed.
    fn delete_all_for_owner(&self, owner: &str) -> StoreResult<usize>;
}

/// SQLite-backed list store.
pub struct SqliteListStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ListStore for SqliteListStore<'_> {
    fn get_by_id(&self, id: ListId) -> StoreResult<Option<ListRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIST_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }
        Ok(None)
    }

    fn get_by_owner_name(&self, owner: &str, name: &str) -> StoreResult<Option<ListRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIST_SELECT_SQL} WHERE creator = ?1 AND name = ?2;"))?;
        let mut rows = stmt.query(params![owner, name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }
        Ok(None)
    }

    fn get_all_matching(&self, owner: &str, names: &[String]) -> StoreResult<Vec<ListRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (2..=names.len() + 1)
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("{LIST_SELECT_SQL} WHERE creator = ?1 AND name IN ({placeholders});");

        let mut bind_values = Vec::with_capacity(names.len() + 1);
        bind_values.push(owner.to_string());
        bind_values.extend(names.iter().cloned());

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_list_row(row)?);
        }
        Ok(records)
    }

    fn count_for_owner(&self, owner: &str) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lists WHERE creator = ?1;",
            [owner],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert(&self, draft: &ListDraft) -> StoreResult<ListRecord> {
        draft.validate()?;

        let id = Uuid::new_v4();
        let result = self.conn.execute(
            "INSERT INTO lists (
                id,
                version,
                creator,
                name,
                authz,
                created_time,
                updated_time,
                items
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                draft.version,
                draft.creator.as_str(),
                draft.name.as_str(),
                encode_authz(&draft.authz)?,
                draft.created_time.to_rfc3339(),
                draft.updated_time.to_rfc3339(),
                encode_items(&draft.items)?,
            ],
        );

        if let Err(err) = result {
            return Err(map_unique_violation(err, &draft.creator, &draft.name));
        }

        Ok(ListRecord {
            id,
            version: draft.version,
            creator: draft.creator.clone(),
            name: draft.name.clone(),
            authz: draft.authz.clone(),
            created_time: draft.created_time,
            updated_time: draft.updated_time,
            items: draft.items.clone(),
        })
    }

    fn update_authz(&self, id: ListId, authz: &AuthzDescriptor) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE lists SET authz = ?2 WHERE id = ?1;",
            params![id.to_string(), encode_authz(authz)?],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn apply_patch(
        &self,
        id: ListId,
        name: Option<&str>,
        items: Option<&ItemMap>,
        now: DateTime<Utc>,
    ) -> StoreResult<ListRecord> {
        let mut assignments = vec!["updated_time = ?2".to_string()];
        let mut bind_values: Vec<rusqlite::types::Value> = vec![
            rusqlite::types::Value::Text(id.to_string()),
            rusqlite::types::Value::Text(now.to_rfc3339()),
        ];

        if let Some(name) = name {
            bind_values.push(rusqlite::types::Value::Text(name.to_string()));
            assignments.push(format!("name = ?{}", bind_values.len()));
        }
        if let Some(items) = items {
            bind_values.push(rusqlite::types::Value::Text(encode_items(items)?));
            assignments.push(format!("items = ?{}", bind_values.len()));
        }

        let sql = format!(
            "UPDATE lists SET {} WHERE id = ?1;",
            assignments.join(", ")
        );

        let changed = match self.conn.execute(&sql, params_from_iter(bind_values)) {
            Ok(changed) => changed,
            Err(err) => {
                // A name patch can collide with another list of the same owner.
                let (creator, current_name) = self.identity_of(id)?;
                let attempted = name.unwrap_or(current_name.as_str()).to_string();
                return Err(map_unique_violation_named(err, creator, attempted));
            }
        };

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        self.read_back(id)
    }

    fn replace(&self, record: &ListRecord) -> StoreResult<ListRecord> {
        record.validate()?;

        let result = self.conn.execute(
            "UPDATE lists
             SET
                version = ?2,
                name = ?3,
                authz = ?4,
                updated_time = ?5,
                items = ?6
             WHERE id = ?1;",
            params![
                record.id.to_string(),
                record.version,
                record.name.as_str(),
                encode_authz(&record.authz)?,
                record.updated_time.to_rfc3339(),
                encode_items(&record.items)?,
            ],
        );

        let changed = match result {
            Ok(changed) => changed,
            Err(err) => return Err(map_unique_violation(err, &record.creator, &record.name)),
        };
        if changed == 0 {
            return Err(StoreError::NotFound(record.id));
        }

        self.read_back(record.id)
    }

    fn merge_items(
        &self,
        id: ListId,
        items: &ItemMap,
        now: DateTime<Utc>,
    ) -> StoreResult<ListRecord> {
        let existing = self.get_by_id(id)?.ok_or(StoreError::NotFound(id))?;

        let mut merged = existing.items;
        for (key, value) in items {
            merged.insert(key.clone(), value.clone());
        }

        self.apply_patch(id, None, Some(&merged), now)
    }

    fn delete_by_id(&self, id: ListId) -> StoreResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM lists WHERE id = ?1;", [id.to_string()])?;
        Ok(deleted)
    }

    fn delete_all_for_owner(&self, owner: &str) -> StoreResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM lists WHERE creator = ?1;", [owner])?;
        Ok(deleted)
    }
}

impl SqliteListStore<'_> {
    fn read_back(&self, id: ListId) -> StoreResult<ListRecord> {
        self.get_by_id(id)?.ok_or(StoreError::NotFound(id))
    }

    fn identity_of(&self, id: ListId) -> StoreResult<(String, String)> {
        let mut stmt = self
            .conn
            .prepare("SELECT creator, name FROM lists WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok((row.get(0)?, row.get(1)?));
        }
        Err(StoreError::NotFound(id))
    }
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 =
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'lists'
        );",
        [],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(StoreError::MissingRequiredTable("lists"));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('lists');")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(0)?);
    }

    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(StoreError::MissingRequiredColumn {
                table: "lists",
                column,
            });
        }
    }

    Ok(())
}

fn parse_list_row(row: &Row<'_>) -> StoreResult<ListRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in lists.id"))
    })?;

    let authz_text: String = row.get("authz")?;
    let authz: AuthzDescriptor = serde_json::from_str(&authz_text).map_err(|err| {
        StoreError::InvalidData(format!("invalid authz descriptor in lists.authz: {err}"))
    })?;

    let items_text: String = row.get("items")?;
    let items: ItemMap = serde_json::from_str(&items_text).map_err(|err| {
        StoreError::InvalidData(format!("invalid items payload in lists.items: {err}"))
    })?;

    let record = ListRecord {
        id,
        version: row.get("version")?,
        creator: row.get("creator")?,
        name: row.get("name")?,
        authz,
        created_time: parse_timestamp(row, "created_time")?,
        updated_time: parse_timestamp(row, "updated_time")?,
        items,
    };
    record.validate()?;
    Ok(record)
}

fn parse_timestamp(row: &Row<'_>, column: &str) -> StoreResult<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            StoreError::InvalidData(format!("invalid timestamp `{text}` in lists.{column}"))
        })
}

fn encode_authz(authz: &AuthzDescriptor) -> StoreResult<String> {
    serde_json::to_string(authz)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode authz descriptor: {err}")))
}

fn encode_items(items: &ItemMap) -> StoreResult<String> {
    serde_json::to_string(items)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode items payload: {err}")))
}

fn map_unique_violation(err: rusqlite::Error, creator: &str, name: &str) -> StoreError {
    map_unique_violation_named(err, creator.to_string(), name.to_string())
}

fn map_unique_violation_named(err: rusqlite::Error, creator: String, name: String) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::DuplicateName { creator, name };
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

//! SQL-shaped [`TokenStore`] over an external database collaborator.
//!
//! The crate does not ship a driver. The host supplies a [`DatabaseHandle`]—raw select, insert,
//! conditional update, bulk delete, and create-table over the binding table—and [`DbTokenStore`]
//! layers the rotation semantics on top: duplicate-key mapping, zero-rows detection, and lazy
//! schema creation with a single retry.

// self
use crate::{
	_prelude::*,
	store::{InsertOutcome, RenameOutcome, StoreError, StoreFuture, TokenStore},
	token::{SessionId, TokenBinding, TokenId},
};

/// Boxed future returned by [`DatabaseHandle`] operations.
pub type DbFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DatabaseError>> + 'a + Send>>;

/// Raw row shape of the binding table: `(id CHAR(32) PRIMARY KEY, expire INTEGER,
/// session_id CHAR(32))`, with `expire` in unix seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRow {
	/// Token id, the primary key.
	pub id: String,
	/// Expiry instant in unix seconds.
	pub expire: i64,
	/// Bound session identifier.
	pub session_id: String,
}
impl BindingRow {
	/// Flattens a typed binding into the raw row shape.
	pub fn from_binding(binding: &TokenBinding) -> Self {
		Self {
			id: binding.token.as_str().to_owned(),
			expire: binding.expires_at.unix_timestamp(),
			session_id: binding.session.as_str().to_owned(),
		}
	}
}

/// Database/DDL collaborator interface consumed by [`DbTokenStore`].
///
/// Implementations wrap whatever connection handle the host application already owns. Every
/// operation must be atomic at the row level: `insert_row` fails with
/// [`DatabaseError::DuplicateId`] instead of overwriting, and `update_row` reports the number of
/// rows its `WHERE id = old_id` condition matched.
pub trait DatabaseHandle
where
	Self: Send + Sync,
{
	/// Selects the row with the provided id iff `expire > now`; expired rows must not match.
	fn select_active<'a>(
		&'a self,
		table: &'a str,
		id: &'a str,
		now: i64,
	) -> DbFuture<'a, Option<BindingRow>>;

	/// Inserts a row, failing with [`DatabaseError::DuplicateId`] on a primary-key collision.
	fn insert_row<'a>(&'a self, table: &'a str, row: BindingRow) -> DbFuture<'a, ()>;

	/// Updates the row whose id is `old_id` to `row`, returning the number of rows affected.
	fn update_row<'a>(&'a self, table: &'a str, old_id: &'a str, row: BindingRow)
	-> DbFuture<'a, u64>;

	/// Deletes every row with `expire <= cutoff`, returning the count removed.
	fn delete_expired_rows<'a>(&'a self, table: &'a str, cutoff: i64) -> DbFuture<'a, u64>;

	/// Creates the binding table if it does not exist; must be idempotent.
	fn create_table<'a>(&'a self, table: &'a str) -> DbFuture<'a, ()>;
}

/// Error type produced by [`DatabaseHandle`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DatabaseError {
	/// The binding table does not exist yet.
	#[error("Table `{table}` does not exist.")]
	MissingTable {
		/// Name of the missing table.
		table: String,
	},
	/// A write collided with an existing primary key.
	#[error("Duplicate id `{id}`.")]
	DuplicateId {
		/// The colliding id.
		id: String,
	},
	/// Any other driver- or engine-level failure.
	#[error("Database failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Configuration for [`DbTokenStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbStoreConfig {
	/// Name of the binding table.
	pub table: String,
	/// Whether a missing table is created on first access instead of failing.
	pub auto_create_table: bool,
}
impl DbStoreConfig {
	/// Overrides the binding table name (defaults to `rotor_token`).
	pub fn with_table(mut self, table: impl Into<String>) -> Self {
		self.table = table.into();

		self
	}

	/// Overrides lazy table creation (defaults to on).
	pub fn with_auto_create_table(mut self, auto_create_table: bool) -> Self {
		self.auto_create_table = auto_create_table;

		self
	}
}
impl Default for DbStoreConfig {
	fn default() -> Self {
		Self { table: "rotor_token".into(), auto_create_table: true }
	}
}

/// [`TokenStore`] backed by the host's database through a [`DatabaseHandle`].
#[derive(Clone, Debug)]
pub struct DbTokenStore<D>
where
	D: ?Sized + DatabaseHandle,
{
	db: Arc<D>,
	config: DbStoreConfig,
}
impl<D> DbTokenStore<D>
where
	D: ?Sized + DatabaseHandle,
{
	/// Creates a store over the provided collaborator with default configuration.
	pub fn new(db: impl Into<Arc<D>>) -> Self {
		Self { db: db.into(), config: DbStoreConfig::default() }
	}

	/// Replaces the store configuration.
	pub fn with_config(mut self, config: DbStoreConfig) -> Self {
		self.config = config;

		self
	}

	/// Returns the configured binding table name.
	pub fn table(&self) -> &str {
		&self.config.table
	}

	/// Runs a database operation, repairing a missing table once when auto-creation is enabled.
	///
	/// The outer error is a fatal schema failure (the repair itself failed); the inner result is
	/// the operation's own outcome, so callers can still map [`DatabaseError::DuplicateId`] to a
	/// conflict outcome instead of an error.
	async fn with_repair<T, F, Fut>(&self, op: F) -> Result<Result<T, DatabaseError>, StoreError>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = Result<T, DatabaseError>>,
	{
		match op().await {
			Err(DatabaseError::MissingTable { .. }) if self.config.auto_create_table => {
				self.create_schema().await?;

				Ok(op().await)
			},
			other => Ok(other),
		}
	}

	async fn create_schema(&self) -> Result<(), StoreError> {
		self.db.create_table(&self.config.table).await.map_err(|e| StoreError::Schema {
			message: format!("failed to create table `{}`: {e}", self.config.table),
		})
	}
}
impl<D> TokenStore for DbTokenStore<D>
where
	D: ?Sized + DatabaseHandle,
{
	fn find_active<'a>(
		&'a self,
		token: &'a TokenId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<SessionId>> {
		Box::pin(async move {
			let row = self
				.with_repair(|| {
					self.db.select_active(&self.config.table, token.as_str(), now.unix_timestamp())
				})
				.await?
				.map_err(map_db_error)?;

			row.map(|row| {
				SessionId::new(&row.session_id).map_err(|e| StoreError::Backend {
					message: format!("row `{}` holds an invalid session id: {e}", row.id),
				})
			})
			.transpose()
		})
	}

	fn insert(&self, binding: TokenBinding) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			let row = BindingRow::from_binding(&binding);
			let attempt =
				self.with_repair(|| self.db.insert_row(&self.config.table, row.clone())).await?;

			match attempt {
				Ok(()) => Ok(InsertOutcome::Inserted),
				Err(DatabaseError::DuplicateId { .. }) => Ok(InsertOutcome::IdConflict),
				Err(e) => Err(map_db_error(e)),
			}
		})
	}

	fn rename<'a>(
		&'a self,
		old: &'a TokenId,
		replacement: TokenBinding,
	) -> StoreFuture<'a, RenameOutcome> {
		Box::pin(async move {
			let row = BindingRow::from_binding(&replacement);
			let attempt = self
				.with_repair(|| self.db.update_row(&self.config.table, old.as_str(), row.clone()))
				.await?;

			match attempt {
				Ok(0) => Ok(RenameOutcome::LostRace),
				Ok(_) => Ok(RenameOutcome::Renamed),
				Err(DatabaseError::DuplicateId { .. }) => Ok(RenameOutcome::IdConflict),
				Err(e) => Err(map_db_error(e)),
			}
		})
	}

	fn delete_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, u64> {
		Box::pin(async move {
			self.with_repair(|| {
				self.db.delete_expired_rows(&self.config.table, now.unix_timestamp())
			})
			.await?
			.map_err(map_db_error)
		})
	}

	fn ensure_schema(&self) -> StoreFuture<'_, ()> {
		Box::pin(self.create_schema())
	}
}

fn map_db_error(e: DatabaseError) -> StoreError {
	match e {
		DatabaseError::MissingTable { table } => StoreError::Schema {
			message: format!("table `{table}` is missing and was not repaired"),
		},
		DatabaseError::DuplicateId { id } =>
			StoreError::Backend { message: format!("unexpected duplicate id `{id}`") },
		DatabaseError::Backend { message } => StoreError::Backend { message },
	}
}

type TableRows = HashMap<String, (i64, String)>;

/// Reference [`DatabaseHandle`] that keeps tables in-process.
///
/// Starts with no tables at all, which makes it the natural fixture for exercising the
/// lazy-schema path; it also serves demos that do not want a real database.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
	tables: Mutex<HashMap<String, TableRows>>,
}
impl MemoryDatabase {
	/// Returns `true` once the named table has been created.
	pub fn has_table(&self, table: &str) -> bool {
		self.tables.lock().contains_key(table)
	}

	/// Returns the number of rows in the named table, or `None` if the table is absent.
	pub fn row_count(&self, table: &str) -> Option<usize> {
		self.tables.lock().get(table).map(TableRows::len)
	}

	fn with_table_rows<T>(
		&self,
		table: &str,
		f: impl FnOnce(&mut TableRows) -> Result<T, DatabaseError>,
	) -> Result<T, DatabaseError> {
		let mut guard = self.tables.lock();
		let rows = guard
			.get_mut(table)
			.ok_or_else(|| DatabaseError::MissingTable { table: table.to_owned() })?;

		f(rows)
	}
}
impl DatabaseHandle for MemoryDatabase {
	fn select_active<'a>(
		&'a self,
		table: &'a str,
		id: &'a str,
		now: i64,
	) -> DbFuture<'a, Option<BindingRow>> {
		Box::pin(async move {
			self.with_table_rows(table, |rows| {
				Ok(rows.get(id).filter(|(expire, _)| *expire > now).map(|(expire, session_id)| {
					BindingRow { id: id.to_owned(), expire: *expire, session_id: session_id.clone() }
				}))
			})
		})
	}

	fn insert_row<'a>(&'a self, table: &'a str, row: BindingRow) -> DbFuture<'a, ()> {
		Box::pin(async move {
			self.with_table_rows(table, |rows| {
				if rows.contains_key(&row.id) {
					return Err(DatabaseError::DuplicateId { id: row.id.clone() });
				}

				rows.insert(row.id, (row.expire, row.session_id));

				Ok(())
			})
		})
	}

	fn update_row<'a>(
		&'a self,
		table: &'a str,
		old_id: &'a str,
		row: BindingRow,
	) -> DbFuture<'a, u64> {
		Box::pin(async move {
			self.with_table_rows(table, |rows| {
				if row.id != old_id && rows.contains_key(&row.id) {
					return Err(DatabaseError::DuplicateId { id: row.id.clone() });
				}
				if rows.remove(old_id).is_none() {
					return Ok(0);
				}

				rows.insert(row.id, (row.expire, row.session_id));

				Ok(1)
			})
		})
	}

	fn delete_expired_rows<'a>(&'a self, table: &'a str, cutoff: i64) -> DbFuture<'a, u64> {
		Box::pin(async move {
			self.with_table_rows(table, |rows| {
				let before = rows.len();

				rows.retain(|_, (expire, _)| *expire > cutoff);

				Ok((before - rows.len()) as u64)
			})
		})
	}

	fn create_table<'a>(&'a self, table: &'a str) -> DbFuture<'a, ()> {
		Box::pin(async move {
			self.tables.lock().entry(table.to_owned()).or_default();

			Ok(())
		})
	}
}

//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `Parcel` values to rows of the `parcel` table and back.
//! - Enforce the registered-only guard atomically per statement.
//!
//! # Invariants
//! - Each operation is a single statement; nothing spans operations.
//! - Guarded updates/deletes that match no row succeed silently.
//! - Read paths reject unknown status text instead of masking it.
//! - Failures are returned as-is, never retried.

use crate::db::DbError;
use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use log::{debug, error};
use rusqlite::types::FromSql;
use rusqlite::{named_params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by parcel store operations.
#[derive(Debug)]
pub enum RepoError {
    /// No row has the requested tracking number.
    NotFound(ParcelNumber),
    /// The storage backend failed; carries the driver cause.
    Persistence(DbError),
    /// A stored row cannot be mapped back into a `Parcel`.
    InvalidData(String),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::Persistence(err) => write!(f, "parcel persistence failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// Gateway between application logic and durable parcel records.
pub trait ParcelStore {
    /// Inserts a new row and returns its storage-assigned number.
    /// `parcel.number` is ignored.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;

    /// Loads one parcel, or `RepoError::NotFound`.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;

    /// Lists a client's parcels in ascending number order. Empty when none.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;

    /// Overwrites status unconditionally. Unknown numbers are a no-op.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;

    /// Sets status to `to` only while it is still `from`.
    /// Returns whether the row changed.
    fn advance_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool>;

    /// Changes the address only while the parcel is registered.
    /// Otherwise, or for unknown numbers, a no-op.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;

    /// Removes the parcel only while it is registered.
    /// Otherwise, or for unknown numbers, a no-op.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
}

impl<S: ParcelStore + ?Sized> ParcelStore for &S {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        (**self).add(parcel)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        (**self).get(number)
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        (**self).get_by_client(client)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        (**self).set_status(number, status)
    }

    fn advance_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool> {
        (**self).advance_status(number, from, to)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        (**self).set_address(number, address)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        (**self).delete(number)
    }
}

/// SQLite-backed parcel store over an injected connection.
///
/// Holds no state besides the borrowed handle. Concurrent callers each
/// use their own connection to the same database file; coordination is
/// left to SQLite statement atomicity.
pub struct SqliteParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ParcelStore for SqliteParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        self.conn
            .execute(
                "INSERT INTO parcel (client, status, address, created_at)
                 VALUES (:client, :status, :address, :created_at);",
                named_params! {
                    ":client": parcel.client,
                    ":status": parcel.status.as_str(),
                    ":address": parcel.address.as_str(),
                    ":created_at": parcel.created_at.as_str(),
                },
            )
            .map_err(|err| log_failure("parcel_add", err))?;

        let number = self.conn.last_insert_rowid();
        debug!(
            "event=parcel_add module=repo status=ok number={number} client={}",
            parcel.client
        );
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{PARCEL_SELECT_SQL} WHERE number = :number;"))
            .map_err(|err| log_failure("parcel_get", err))?;

        let mut rows = stmt
            .query(named_params! { ":number": number })
            .map_err(|err| log_failure("parcel_get", err))?;
        match rows.next().map_err(|err| log_failure("parcel_get", err))? {
            Some(row) => parse_parcel_row(row),
            None => {
                debug!("event=parcel_get module=repo status=not_found number={number}");
                Err(RepoError::NotFound(number))
            }
        }
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "{PARCEL_SELECT_SQL} WHERE client = :client ORDER BY number ASC;"
            ))
            .map_err(|err| log_failure("parcel_get_by_client", err))?;

        // `rows` borrows the statement; both are released on every return path.
        let mut rows = stmt
            .query(named_params! { ":client": client })
            .map_err(|err| log_failure("parcel_get_by_client", err))?;
        let mut parcels = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|err| log_failure("parcel_get_by_client", err))?
        {
            parcels.push(parse_parcel_row(row)?);
        }

        debug!(
            "event=parcel_get_by_client module=repo status=ok client={client} count={}",
            parcels.len()
        );
        Ok(parcels)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE parcel SET status = :status WHERE number = :number;",
                named_params! { ":status": status.as_str(), ":number": number },
            )
            .map_err(|err| log_failure("parcel_set_status", err))?;

        log_outcome("parcel_set_status", number, changed);
        Ok(())
    }

    fn advance_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE parcel SET status = :to
                 WHERE number = :number AND status = :from;",
                named_params! {
                    ":to": to.as_str(),
                    ":number": number,
                    ":from": from.as_str(),
                },
            )
            .map_err(|err| log_failure("parcel_advance_status", err))?;

        log_outcome("parcel_advance_status", number, changed);
        Ok(changed > 0)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE parcel SET address = :address
                 WHERE number = :number AND status = :status;",
                named_params! {
                    ":address": address,
                    ":number": number,
                    ":status": ParcelStatus::EDITABLE.as_str(),
                },
            )
            .map_err(|err| log_failure("parcel_set_address", err))?;

        log_outcome("parcel_set_address", number, changed);
        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM parcel WHERE number = :number AND status = :status;",
                named_params! {
                    ":number": number,
                    ":status": ParcelStatus::EDITABLE.as_str(),
                },
            )
            .map_err(|err| log_failure("parcel_delete", err))?;

        log_outcome("parcel_delete", number, changed);
        Ok(())
    }
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let number: ParcelNumber = column(row, "number")?;
    let status_text: String = column(row, "status")?;
    let status = status_text.parse::<ParcelStatus>().map_err(|_| {
        error!(
            "event=parcel_decode module=repo status=error number={number} error_code=invalid_status"
        );
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in parcel.status for number {number}"
        ))
    })?;

    Ok(Parcel {
        number,
        client: column(row, "client")?,
        status,
        address: column(row, "address")?,
        created_at: column(row, "created_at")?,
    })
}

/// Reads one column, reporting a stored value of the wrong type as
/// `InvalidData` rather than a storage failure.
fn column<T: FromSql>(row: &Row<'_>, name: &str) -> RepoResult<T> {
    row.get(name).map_err(|err| match err {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => {
            error!(
                "event=parcel_decode module=repo status=error column={name} error_code=invalid_type"
            );
            RepoError::InvalidData(format!("invalid value in parcel.{name}: {err}"))
        }
        other => log_failure("parcel_decode", other),
    })
}

fn log_failure(event: &str, err: rusqlite::Error) -> RepoError {
    error!("event={event} module=repo status=error error={err}");
    err.into()
}

fn log_outcome(event: &str, number: ParcelNumber, changed: usize) {
    if changed == 0 {
        debug!("event={event} module=repo status=noop number={number}");
    } else {
        debug!("event={event} module=repo status=ok number={number}");
    }
}

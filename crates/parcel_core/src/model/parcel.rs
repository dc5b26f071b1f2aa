//! Parcel record and lifecycle status.
//!
//! # Responsibility
//! - Define the single persisted entity of the tracker.
//! - Map `ParcelStatus` to and from its stored text.
//!
//! # Invariants
//! - `number` is unique and never changes once assigned by storage.
//! - `client` and `created_at` are fixed at creation.
//! - `address` may change only while `status == Registered`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::{OffsetDateTime, UtcOffset};

/// Tracking number assigned by storage on insert.
pub type ParcelNumber = i64;

/// Owning client identifier. Not checked against any client registry.
pub type ClientId = i64;

/// Lifecycle state of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted but not handed over; the only editable state.
    Registered,
    /// Handed over to the carrier.
    Sent,
    /// Received by the addressee.
    Delivered,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 3] = [Self::Registered, Self::Sent, Self::Delivered];

    /// The only status under which address changes and deletion apply.
    pub const EDITABLE: ParcelStatus = Self::Registered;

    /// Stored text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Returns the following lifecycle step, or `None` once delivered.
    ///
    /// Ordering is a service-level convention; the store accepts any
    /// status overwrite.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status text that is not one of the known lifecycle values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl Display for UnknownStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown parcel status `{}`; expected registered|sent|delivered",
            self.0
        )
    }
}

impl Error for UnknownStatus {}

impl FromStr for ParcelStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registered" => Ok(Self::Registered),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A tracked shipment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// `0` until storage assigns a number.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Free-form delivery address.
    pub address: String,
    /// RFC 3339 timestamp, UTC with second precision.
    pub created_at: String,
}

impl Parcel {
    /// Builds an unsaved parcel in the `Registered` state.
    pub fn new(
        client: ClientId,
        address: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: created_at.into(),
        }
    }
}

impl Display for Parcel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parcel #{} to `{}` for client {} registered at {}, status {}",
            self.number, self.address, self.client, self.created_at, self.status
        )
    }
}

/// Formats a timestamp the way `created_at` is stored.
///
/// The layout is fixed-width, so lexical order equals chronological order.
pub fn format_created_at(at: OffsetDateTime) -> String {
    let utc = at.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    )
}

/// Current time in `created_at` form.
pub fn now_created_at() -> String {
    format_created_at(OffsetDateTime::now_utc())
}

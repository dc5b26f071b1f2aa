//! Persistence gateway for parcel records.
//!
//! # Responsibility
//! - Define the parcel store contract used by services.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - The registered-only rule for address changes and deletion lives in
//!   the statement predicate, never in a separate read-then-write step.
//! - `get` reports a missing row as `NotFound`, distinct from storage
//!   failures.

pub mod parcel_repo;

//! Parcel lifecycle service.
//!
//! # Responsibility
//! - Register parcels with a fresh creation timestamp.
//! - Advance parcels through `registered -> sent -> delivered`.
//!
//! # Invariants
//! - Address changes and deletion go through the store's guarded
//!   statements; this layer adds no check-then-act step of its own.
//! - Service layer remains storage-agnostic.

use crate::model::parcel::{now_created_at, ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelStore, RepoResult};
use log::info;

/// Use-case service wrapper around a parcel store.
pub struct ParcelService<S: ParcelStore> {
    store: S,
}

impl<S: ParcelStore> ParcelService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let mut parcel = Parcel::new(client, address, now_created_at());
        parcel.number = self.store.add(&parcel)?;
        info!(
            "event=parcel_register module=service status=ok number={} client={client}",
            parcel.number
        );
        Ok(parcel)
    }

    pub fn parcel(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.store.get(number)
    }

    pub fn client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.store.get_by_client(client)
    }

    /// Moves a parcel one step along its lifecycle.
    ///
    /// # Contract
    /// - Returns `Some(new_status)` after writing it.
    /// - Returns `None` without writing when the parcel is already delivered,
    ///   or when its status changed after it was read.
    /// - Returns `RepoError::NotFound` for unknown numbers.
    pub fn next_status(&self, number: ParcelNumber) -> RepoResult<Option<ParcelStatus>> {
        let parcel = self.store.get(number)?;
        let Some(next) = parcel.status.next() else {
            info!(
                "event=parcel_next_status module=service status=noop number={number} reason=delivered"
            );
            return Ok(None);
        };

        if !self.store.advance_status(number, parcel.status, next)? {
            info!(
                "event=parcel_next_status module=service status=noop number={number} reason=status_changed"
            );
            return Ok(None);
        }
        info!(
            "event=parcel_next_status module=service status=ok number={number} from={} to={next}",
            parcel.status
        );
        Ok(Some(next))
    }

    /// Changes the address of a still-registered parcel; otherwise a no-op.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.store.set_address(number, address)
    }

    /// Deletes a still-registered parcel; otherwise a no-op.
    pub fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.store.delete(number)
    }
}

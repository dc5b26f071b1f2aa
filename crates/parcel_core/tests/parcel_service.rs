use parcel_core::db::open_db_in_memory;
use parcel_core::{
    ClientId, Parcel, ParcelNumber, ParcelService, ParcelStatus, ParcelStore, RepoError,
    RepoResult, SqliteParcelStore,
};

/// Store whose reads are immediately followed by another writer marking
/// the parcel delivered.
struct DeliveredAfterRead<'conn> {
    inner: SqliteParcelStore<'conn>,
}

impl ParcelStore for DeliveredAfterRead<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        self.inner.add(parcel)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let parcel = self.inner.get(number)?;
        self.inner.set_status(number, ParcelStatus::Delivered)?;
        Ok(parcel)
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.inner.get_by_client(client)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        self.inner.set_status(number, status)
    }

    fn advance_status(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<bool> {
        self.inner.advance_status(number, from, to)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.inner.set_address(number, address)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.inner.delete(number)
    }
}

#[test]
fn register_stores_a_registered_parcel_with_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::new(&conn));

    let parcel = service.register(5, "Main st. 1").unwrap();

    assert!(parcel.number > 0);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(parcel.created_at.len(), "2024-01-01T00:00:00Z".len());
    assert!(parcel.created_at.ends_with('Z'));
    assert_eq!(service.parcel(parcel.number).unwrap(), parcel);
}

#[test]
fn next_status_walks_lifecycle_then_stops() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::new(&conn));
    let number = service.register(5, "Main st. 1").unwrap().number;

    assert_eq!(
        service.next_status(number).unwrap(),
        Some(ParcelStatus::Sent)
    );
    assert_eq!(
        service.next_status(number).unwrap(),
        Some(ParcelStatus::Delivered)
    );
    assert_eq!(service.next_status(number).unwrap(), None);
    assert_eq!(
        service.parcel(number).unwrap().status,
        ParcelStatus::Delivered
    );
}

#[test]
fn next_status_of_unknown_parcel_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::new(&conn));

    let err = service.next_status(31337).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(31337)));
}

#[test]
fn change_address_and_delete_respect_registered_gate() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::new(&conn);
    let service = ParcelService::new(&store);

    let sent = service.register(9, "first").unwrap();
    service.next_status(sent.number).unwrap();
    service.change_address(sent.number, "changed").unwrap();
    service.delete(sent.number).unwrap();
    assert_eq!(store.get(sent.number).unwrap().address, "first");

    let draft = service.register(9, "draft").unwrap();
    service.change_address(draft.number, "changed").unwrap();
    assert_eq!(service.parcel(draft.number).unwrap().address, "changed");
    service.delete(draft.number).unwrap();

    let remaining = service.client_parcels(9).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].number, sent.number);
}

#[test]
fn next_status_does_not_overwrite_a_status_changed_after_read() {
    let conn = open_db_in_memory().unwrap();
    let plain = SqliteParcelStore::new(&conn);
    let number = plain
        .add(&Parcel::new(4, "Main st. 1", "2024-01-01T00:00:00Z"))
        .unwrap();

    let service = ParcelService::new(DeliveredAfterRead {
        inner: SqliteParcelStore::new(&conn),
    });

    assert_eq!(service.next_status(number).unwrap(), None);
    assert_eq!(plain.get(number).unwrap().status, ParcelStatus::Delivered);
}

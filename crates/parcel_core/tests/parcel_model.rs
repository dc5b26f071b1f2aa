use parcel_core::{Parcel, ParcelStatus};
use serde_json::json;

#[test]
fn new_parcel_starts_registered_and_unnumbered() {
    let parcel = Parcel::new(1000, "test", "2024-01-01T00:00:00Z");

    assert_eq!(parcel.number, 0);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(parcel.status, ParcelStatus::EDITABLE);
}

#[test]
fn parcel_serializes_status_as_stored_text() {
    let mut parcel = Parcel::new(7, "Lenina 1", "2024-01-01T00:00:00Z");
    parcel.number = 12;
    parcel.status = ParcelStatus::Sent;

    let value = serde_json::to_value(&parcel).unwrap();
    assert_eq!(
        value,
        json!({
            "number": 12,
            "client": 7,
            "status": "sent",
            "address": "Lenina 1",
            "created_at": "2024-01-01T00:00:00Z"
        })
    );

    let decoded: Parcel = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, parcel);
}

#[test]
fn unknown_status_fails_deserialization() {
    let result = serde_json::from_value::<ParcelStatus>(json!("lost"));
    assert!(result.is_err());
}

#[test]
fn display_mentions_number_and_status() {
    let mut parcel = Parcel::new(3, "Tverskaya 5", "2024-03-01T08:30:00Z");
    parcel.number = 77;

    let line = parcel.to_string();
    assert!(line.contains("#77"));
    assert!(line.contains("registered"));
    assert!(line.contains("Tverskaya 5"));
}

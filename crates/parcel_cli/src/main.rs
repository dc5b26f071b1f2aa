//! Parcel tracker walk-through.
//!
//! # Responsibility
//! - Wire configuration, logging and storage for `parcel_core`.
//! - Drive one parcel through its lifecycle against the configured database.

use log::info;
use parcel_core::db::open_db_with_options;
use parcel_core::{init_logging, ClientId, ParcelService, SqliteParcelStore, TrackerConfig};
use std::error::Error;
use std::process::ExitCode;

const DEMO_CLIENT: ClientId = 1;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("parcel_cli: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = TrackerConfig::from_env()?;
    if let Some(logging) = config.logging() {
        init_logging(&logging)?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        parcel_core::core_version()
    );

    let conn = open_db_with_options(&config.db_path, &config.db_options)?;
    let service = ParcelService::new(SqliteParcelStore::new(&conn));

    let parcel = service.register(DEMO_CLIENT, "Pskov, Sadovaya st. 3")?;
    println!("registered: {parcel}");

    service.change_address(parcel.number, "Saratov, Lenina st. 12")?;
    println!("address changed: {}", service.parcel(parcel.number)?);

    if let Some(status) = service.next_status(parcel.number)? {
        println!("parcel #{} is now {status}", parcel.number);
    }

    print_client_parcels(&service)?;

    // Sent parcels are immutable, so this leaves the row in place.
    service.delete(parcel.number)?;
    println!("after delete attempt: {}", service.parcel(parcel.number)?);

    let draft = service.register(DEMO_CLIENT, "Tver, Mira st. 1")?;
    println!("registered: {draft}");
    service.delete(draft.number)?;
    match service.parcel(draft.number) {
        Err(err) if err.is_not_found() => println!("parcel #{} deleted", draft.number),
        Err(err) => return Err(err.into()),
        Ok(still_there) => println!("unexpectedly kept: {still_there}"),
    }

    print_client_parcels(&service)?;
    Ok(())
}

fn print_client_parcels(
    service: &ParcelService<SqliteParcelStore<'_>>,
) -> Result<(), Box<dyn Error>> {
    let parcels = service.client_parcels(DEMO_CLIENT)?;
    println!("client {DEMO_CLIENT} has {} parcel(s):", parcels.len());
    for parcel in parcels {
        println!("  {parcel}");
    }
    Ok(())
}

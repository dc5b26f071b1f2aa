//! Core use-case services.
//!
//! # Responsibility
//! - Turn store primitives into parcel lifecycle use cases.
//! - Keep CLI wiring decoupled from storage details.

pub mod parcel_service;

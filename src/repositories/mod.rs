// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO event emission
// - NO cross-repository calls

pub mod pocketbase_record_store;
pub mod record_store;

pub use pocketbase_record_store::{PocketBaseAuth, PocketBaseRecordStore};
pub use record_store::RecordStore;

#[cfg(test)]
pub use record_store::MockRecordStore;

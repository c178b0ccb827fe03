//! Service layer: versioned document storage for JSON-LD contexts and CBOR-LD
//! registry entries.
//! - `document` holds the kinds, the store contract, the optimistic upsert and
//!   the kind guard.
//! - `storage` provides the JSON-file and Postgres stores.
//! - `loader`, `metering` and `migrate` are the collaborators built on top.

pub mod document;
pub mod errors;
pub mod loader;
pub mod metering;
pub mod migrate;
pub mod storage;
#[cfg(test)]
pub mod test_support;

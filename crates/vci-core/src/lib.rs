//! # vci-core — Foundational Types for the Credential Issuance Stack
//!
//! Defines the type-system primitives shared by every other crate in the
//! workspace: identifier newtypes, the UTC-only `Timestamp`, and the shared
//! validation error. Every other crate depends on `vci-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `OfferId` and
//!    `PreAuthorizedCode` are distinct UUID-backed newtypes — you cannot pass
//!    a pre-authorized code where an offer id is expected, even though both
//!    are UUIDs on the wire.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision, so stored and rendered instants always
//!    agree byte-for-byte.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vci-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::ValidationError;
pub use identity::{OfferId, PreAuthorizedCode};
pub use temporal::Timestamp;

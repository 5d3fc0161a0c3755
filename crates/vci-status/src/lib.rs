//! # vci-status — Status Registry Boundary
//!
//! The capability boundary between the offer lifecycle engine and the
//! externally-published credential status registry (a bitstring or token
//! status list that verifiers query to learn whether an issued credential is
//! valid, suspended, or revoked).
//!
//! ## Architecture
//!
//! The engine depends only on the [`StatusRegistry`] trait. Two backends are
//! provided:
//!
//! - [`InMemoryStatusRegistry`] — reference backend for tests and local
//!   development, with outage injection to exercise failure paths.
//! - [`HttpStatusRegistry`] — adapter for a remote status-list service,
//!   wrapping a `reqwest::Client` with per-request timeout and bearer
//!   authentication.
//!
//! ## Error Handling
//!
//! Transport failures, HTTP 5xx responses, and timeouts all surface as
//! [`RegistryError::Unavailable`]. Retries are NOT built into the backends —
//! the caller owns retry policy.

pub mod http;
pub mod memory;
pub mod registry;

pub use http::{HttpStatusRegistry, HttpStatusRegistryConfig};
pub use memory::InMemoryStatusRegistry;
pub use registry::{RegistryError, StatusListReference, StatusRegistry, StatusValue};

//! # vci-facade — Caller-Facing Operations
//!
//! The only surface exposed to callers (the web layer is an external
//! collaborator and lives outside this workspace). Translates the external
//! operations — create, read, read-deeplink, read-status, write-status —
//! into lifecycle engine calls and maps every internal failure kind to a
//! stable external result code. Stateless beyond its collaborators.

pub mod error;
pub mod facade;

pub use error::ApiError;
pub use facade::{
    CreateOfferRequest, CreateOfferResponse, OfferFacade, OfferView, StatusView, TargetStatus,
    UpdateStatusResponse,
};

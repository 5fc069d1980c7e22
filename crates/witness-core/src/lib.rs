//! Core types and workflow logic for the Witness incident documentation
//! platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::IncidentStore`]; the API and CLI
//! crates depend on that abstraction.

pub mod capture;
pub mod dossier;
pub mod duplicate;
pub mod error;
pub mod evidence;
pub mod field;
pub mod guest;
pub mod incident;
pub mod legal;
pub mod linking;
pub mod record;
pub mod review;
pub mod scrolly;
pub mod store;
pub mod tags;
pub mod timeline;

pub use error::{Error, Result};

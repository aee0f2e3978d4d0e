//! # sitecfg-shared
//!
//! Shared result types and error handling for the sitecfg workspace.
//!
//! - `ErrorEnvelope`: the structured error every crate maps into at its
//!   public boundary.
//! - `Result` / `ResultExt`: workspace result alias and lifting helpers.
//! - `Validated<T>`: proof wrapper for values that passed validation.
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod invariants;
pub mod result;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use invariants::Validated;
pub use result::{Result, ResultExt};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

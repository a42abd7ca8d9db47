//! Tollgate Core - shared vocabulary for the action safety gate.
//!
//! Types here are used by the gate itself, by configuration bridges and by
//! presentation surfaces that render pending actions.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod types;

pub use types::{Severity, Timestamp};

//! Tollgate Test - shared test utilities.
//!
//! Candidate builders, mock executors and a gate harness for use as a
//! dev-dependency.
//!
//! ```rust,ignore
//! use tollgate_test::{shell_command, test_gate};
//!
//! #[tokio::test]
//! async fn confirms_and_dispatches() {
//!     let (gate, executor) = test_gate();
//!     let (id, waiter) = gate.submit_and_wait(shell_command("ls"));
//!     gate.confirm(&id, None).unwrap();
//!     assert!(waiter.await.unwrap());
//!     assert_eq!(executor.dispatched_ids(), vec![id]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;

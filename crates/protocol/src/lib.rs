//! Wire types shared by the launch resolver and its collaborators.
//!
//! This crate contains the serde-serializable shapes exchanged with the
//! remote config endpoint, the attribution SDK and enrichment endpoint, the
//! push/deep-link payloads, and the persisted cookie snapshot.
//!
//! Types here are pure data: no I/O, no policy. Interpretation (what counts
//! as a config failure, when a snapshot record is malformed) lives in
//! `launchgate` and `launchgate-runtime`.

pub mod attribution;
pub mod config;
pub mod cookie;
pub mod push;

pub use attribution::*;
pub use config::*;
pub use cookie::*;
pub use push::*;

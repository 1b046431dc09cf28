//! Session re-exports.
//!
//! `sqlrecord::Session` runs the create hook chain over one connection. The
//! implementation lives in the separate `sqlrecord-session` crate; this
//! module exposes it without forcing users to depend on sub-crates directly.
//!
//! The step runner and execution engine are re-exported as well, for callers
//! that drive a [`Scope`] themselves (for example inside their own
//! transaction handling).

pub use sqlrecord_session::{
    ChainContext, CreateOptions, CreateResult, CreateState, CreateStep, Scope, Session,
    SessionConfig, execute_insert, reload_defaults, run_chain,
};

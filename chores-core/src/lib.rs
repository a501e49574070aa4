//! Core types for the chores ecosystem.
//!
//! This crate provides everything the `chores` CLI (or any other front end) needs:
//! - `model` types for members, chores, recurrence rules and completions
//! - `expand` for turning chores into dated calendar occurrences
//! - `gateway` for the remote data service the store talks to
//! - `store` for the optimistic, push-merged client cache

pub mod config;
pub mod error;
pub mod expand;
pub mod gateway;
pub mod history;
pub mod model;
pub mod palette;
pub mod recurrence;
pub mod store;
pub mod view;

pub use error::{ChoresError, ChoresResult};
pub use expand::{ChoreCalendarEvent, expand_chores};
pub use model::*;
pub use store::{MutationOutcome, StoreSnapshot, SyncStore};

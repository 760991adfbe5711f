//! Match engine for the classic game Battleship, built around persisted
//! entities rather than an in-memory board.
//!
//! The crate is organized leaves first:
//!
//! [`grid`] and [`ships`] are the fixed geometry and ship catalog.
//!
//! [`model`] holds the persisted entities (players, games, layouts, moves,
//! invites) and their pure helpers.
//!
//! [`store`] is the repository contract the engine runs against, with an
//! in-memory implementation for tests and local play.
//!
//! [`engine`] orchestrates matches: placement, attack resolution, the
//! scripted opponent, turn and timeout handling, scoring, and the read
//! models a presentation layer serializes. Transport, sessions and rendering
//! are out of scope; callers identify themselves with an explicit
//! [`PlayerId`](model::PlayerId) on every operation.

pub mod engine;
pub mod error;
pub mod grid;
pub mod model;
pub mod ships;
pub mod store;

pub use crate::{
    engine::Engine,
    error::{Error, Result},
};

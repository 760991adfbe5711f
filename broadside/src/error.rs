//! Errors surfaced by the engine.
//!
//! Gameplay decisions that merely decline to change state (out-of-turn
//! attacks, duplicate shots, invalid placements) are reported through the
//! normal result types of the operations that produce them. Only lookup
//! failures and storage failures are `Err` values.

use thiserror::Error;

use crate::store::StoreError;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested game, invite or player does not exist, or the requesting
    /// player is not a participant of the game it names.
    #[error("not found")]
    NotFound,

    /// No valid placement exists for a ship, even after scanning every anchor.
    /// Only reachable when a board is too full to hold the remaining fleet.
    #[error("no valid placement available for ship")]
    NoSpace,

    /// The storage backend failed. Propagated unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

//! The match repository contract.
//!
//! The engine never assumes lazy or cached query semantics: every read is an
//! explicit call returning owned snapshots, and every write is an explicit
//! call. A SQL-backed implementation would map each method onto one query;
//! [`MemoryStore`] is the in-process implementation used by tests and the
//! CLI front-end.

use thiserror::Error;

use crate::model::{Game, GameId, Invite, InviteId, Layout, LayoutId, Move, Player, PlayerId};

pub use self::memory::MemoryStore;

mod memory;

/// Error produced by a [`GameStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(&'static str),

    /// The storage backend is unavailable. Treated as fatal by the engine
    /// and propagated unmodified.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage for the entities of [`crate::model`].
///
/// Lookup methods return `Ok(None)` for missing rows; only backend failures
/// are `Err`. Insert methods assign a fresh id, ignoring the id on the value
/// passed in, and return the stored entity.
///
/// Implementations must enforce two uniqueness constraints from the data
/// model: layout origins per (player, game, x, y) and moves per
/// (game, player, x, y).
pub trait GameStore {
    // Players.
    fn insert_player(&self, player: Player) -> Result<Player, StoreError>;
    fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError>;
    fn update_player(&self, player: &Player) -> Result<(), StoreError>;

    // Games.
    fn insert_game(&self, game: Game) -> Result<Game, StoreError>;
    fn game(&self, id: GameId) -> Result<Option<Game>, StoreError>;
    fn update_game(&self, game: &Game) -> Result<(), StoreError>;
    /// Remove the game and its layouts and moves.
    fn delete_game(&self, id: GameId) -> Result<(), StoreError>;
    /// All games the player participates in, oldest first.
    fn games_for_player(&self, player: PlayerId) -> Result<Vec<Game>, StoreError>;

    // Layouts.
    fn insert_layout(&self, layout: Layout) -> Result<Layout, StoreError>;
    fn update_layout(&self, layout: &Layout) -> Result<(), StoreError>;
    /// The player's layouts in the game, in placement order.
    fn layouts_for_player(&self, game: GameId, player: PlayerId) -> Result<Vec<Layout>, StoreError>;

    // Moves.
    fn insert_move(&self, mv: Move) -> Result<Move, StoreError>;
    /// The player's moves in the game, in firing order.
    fn moves_for_player(&self, game: GameId, player: PlayerId) -> Result<Vec<Move>, StoreError>;
    /// The player's move at the given cell, if any.
    fn move_at(
        &self,
        game: GameId,
        player: PlayerId,
        x: i32,
        y: i32,
    ) -> Result<Option<Move>, StoreError>;
    /// All moves referencing the layout, in firing order.
    fn moves_for_layout(&self, layout: LayoutId) -> Result<Vec<Move>, StoreError>;

    // Invites.
    fn insert_invite(&self, invite: Invite) -> Result<Invite, StoreError>;
    fn invite(&self, id: InviteId) -> Result<Option<Invite>, StoreError>;
    fn delete_invite(&self, id: InviteId) -> Result<(), StoreError>;
    /// All invites the player is on either side of, oldest first.
    fn invites_for_player(&self, player: PlayerId) -> Result<Vec<Invite>, StoreError>;
}

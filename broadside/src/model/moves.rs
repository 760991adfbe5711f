//! The `Move` entity: one fired shot.

use serde::{Deserialize, Serialize};

use crate::model::{GameId, LayoutId, MoveId, PlayerId};

/// One fired shot. Moves are append-only: the engine never updates or
/// deletes one. `layout` names the layout the shot hit, or `None` on a miss.
/// A cell may be shot at most once by a given player in a given game.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    pub game: GameId,
    pub player: PlayerId,
    pub x: i32,
    pub y: i32,
    pub layout: Option<LayoutId>,
}

impl Move {
    /// Create a move. The id is assigned by the store on insert.
    pub fn new(game: GameId, player: PlayerId, x: i32, y: i32, layout: Option<LayoutId>) -> Self {
        Self {
            id: MoveId(0),
            game,
            player,
            x,
            y,
            layout,
        }
    }
}

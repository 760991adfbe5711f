//! The persisted entities of a match and their intrinsic logic.
//!
//! Everything in this module is plain data plus pure helpers; all storage
//! access goes through [`crate::store::GameStore`], and all orchestration
//! lives in [`crate::engine`].

use serde::{Deserialize, Serialize};

pub use self::{
    game::{Game, GameOptions},
    invite::Invite,
    layout::Layout,
    moves::Move,
    player::{Player, DEFAULT_RATING},
};

mod game;
mod invite;
mod layout;
mod moves;
mod player;

/// Id of a [`Player`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

/// Id of a [`Game`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GameId(pub i64);

/// Id of a [`Layout`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct LayoutId(pub i64);

/// Id of a [`Move`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct MoveId(pub i64);

/// Id of an [`Invite`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct InviteId(pub i64);

/// Id of a ship kind in the catalog (see [`crate::ships`]).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ShipId(pub i64);

//! The `Invite` entity: a pending challenge from one player to another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{GameOptions, InviteId, PlayerId};

/// A pending challenge. Accepting one creates a [`crate::model::Game`] with
/// the same settings and `turn` starting with the inviter; the invite itself
/// is then removed. Unique per (player_1, player_2) pair; self-invites are
/// rejected at creation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    pub id: InviteId,
    pub player_1: PlayerId,
    pub player_2: PlayerId,
    pub rated: bool,
    pub five_shot: bool,
    pub time_limit: i64,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Create an invite. The id is assigned by the store on insert.
    pub fn new(player_1: PlayerId, player_2: PlayerId, options: GameOptions, now: DateTime<Utc>) -> Self {
        Self {
            id: InviteId(0),
            player_1,
            player_2,
            rated: options.rated,
            five_shot: options.five_shot,
            time_limit: options.time_limit,
            created_at: now,
        }
    }

    /// The game settings carried by this invite.
    pub fn options(&self) -> GameOptions {
        GameOptions {
            rated: self.rated,
            five_shot: self.five_shot,
            time_limit: self.time_limit,
        }
    }
}

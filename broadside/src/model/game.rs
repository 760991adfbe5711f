//! The `Game` entity and its pure state-machine logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{GameId, PlayerId};

/// Settings chosen when a match is created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameOptions {
    /// Whether the outcome adjusts ratings and win/loss counters.
    pub rated: bool,
    /// Five shots per turn instead of one.
    pub five_shot: bool,
    /// Per-turn allowance in seconds, measured from the game's last update.
    pub time_limit: i64,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            rated: false,
            five_shot: false,
            time_limit: 86_400,
        }
    }
}

/// One match between two players.
///
/// `turn` tracks whose move it is while the game is in progress; `winner`
/// is set exactly once and never changes afterwards. The `updated_at`
/// timestamp doubles as the turn clock: time remaining is always derived
/// from it, never stored.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub player_1: PlayerId,
    pub player_2: PlayerId,
    pub turn: PlayerId,
    pub winner: Option<PlayerId>,
    pub rated: bool,
    pub five_shot: bool,
    pub time_limit: i64,
    pub player_1_layed_out: bool,
    pub player_2_layed_out: bool,
    pub del_player_1: bool,
    pub del_player_2: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// Create a game between two players. `turn` starts with `player_1`.
    /// The id is assigned by the store on insert.
    pub fn new(player_1: PlayerId, player_2: PlayerId, options: GameOptions, now: DateTime<Utc>) -> Self {
        Self {
            id: GameId(0),
            player_1,
            player_2,
            turn: player_1,
            winner: None,
            rated: options.rated,
            five_shot: options.five_shot,
            time_limit: options.time_limit,
            player_1_layed_out: false,
            player_2_layed_out: false,
            del_player_1: false,
            del_player_2: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given player is one of the two participants.
    pub fn is_participant(&self, player: PlayerId) -> bool {
        player == self.player_1 || player == self.player_2
    }

    /// The other participant. For a non-participant this returns `player_2`,
    /// mirroring the lenient lookup the rest of the engine guards against by
    /// scoping game lookups to participants first.
    pub fn opponent(&self, player: PlayerId) -> PlayerId {
        if player == self.player_1 {
            self.player_2
        } else {
            self.player_1
        }
    }

    /// The participant who does not currently hold the turn.
    pub fn next_player_turn(&self) -> PlayerId {
        self.opponent(self.turn)
    }

    /// True iff the game is undecided and it is `player`'s move.
    pub fn can_attack(&self, player: PlayerId) -> bool {
        self.winner.is_none() && self.turn == player
    }

    /// Seconds left on the current turn; negative once the turn-holder has
    /// stalled past the limit.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.updated_at.timestamp() + self.time_limit - now.timestamp()
    }

    /// True iff `player` may force-advance the turn: the game is undecided,
    /// it is the opponent's move, and the opponent has run out the clock.
    pub fn can_skip(&self, player: PlayerId, now: DateTime<Utc>) -> bool {
        self.winner.is_none() && self.turn != player && self.time_remaining(now) <= 0
    }

    /// Shots allowed per turn.
    pub fn shots_per_turn(&self) -> usize {
        if self.five_shot {
            5
        } else {
            1
        }
    }

    /// Whether the given participant has finished placing ships.
    pub fn layed_out(&self, player: PlayerId) -> bool {
        if player == self.player_1 {
            self.player_1_layed_out
        } else {
            self.player_2_layed_out
        }
    }

    /// Record that the given participant has finished placing ships.
    pub fn set_layed_out(&mut self, player: PlayerId) {
        if player == self.player_1 {
            self.player_1_layed_out = true;
        } else {
            self.player_2_layed_out = true;
        }
    }

    /// Whether the given participant has flagged the finished game for
    /// deletion.
    pub fn deleted_by(&self, player: PlayerId) -> bool {
        if player == self.player_1 {
            self.del_player_1
        } else {
            self.del_player_2
        }
    }

    /// Flag the finished game as deleted by the given participant.
    pub fn set_deleted_by(&mut self, player: PlayerId) {
        if player == self.player_1 {
            self.del_player_1 = true;
        } else {
            self.del_player_2 = true;
        }
    }

    /// Reset the turn clock.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

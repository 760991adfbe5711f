//! Player accounts, human or scripted.

use serde::{Deserialize, Serialize};

use crate::model::PlayerId;

/// Rating every new account starts from.
pub const DEFAULT_RATING: i32 = 1200;

/// An account. Bots are ordinary players with the `bot` flag set and a
/// `strength` in `[0, 5]` controlling how aggressively they chase a
/// partially-hit ship.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    /// Rough activity counter, bumped once per attack invocation.
    pub activity: u32,
    pub bot: bool,
    pub strength: u8,
}

impl Player {
    /// Create a human account. The id is assigned by the store on insert.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId(0),
            name: name.into(),
            rating: DEFAULT_RATING,
            wins: 0,
            losses: 0,
            activity: 0,
            bot: false,
            strength: 0,
        }
    }

    /// Create a scripted account with the given difficulty.
    pub fn bot(name: impl Into<String>, strength: u8) -> Self {
        Self {
            bot: true,
            strength,
            ..Self::new(name)
        }
    }

    /// Bump the activity counter.
    pub fn new_activity(&mut self) {
        self.activity += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = Player::new("alice");
        assert_eq!(p.rating, 1200);
        assert_eq!((p.wins, p.losses, p.activity), (0, 0, 0));
        assert!(!p.bot);
    }

    #[test]
    fn bot_carries_strength() {
        let b = Player::bot("hal", 3);
        assert!(b.bot);
        assert_eq!(b.strength, 3);
    }
}

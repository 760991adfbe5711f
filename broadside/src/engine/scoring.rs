//! Rating and win/loss adjustment for decided games.

use log::info;

use crate::engine::Engine;
use crate::error::Result;
use crate::model::Game;
use crate::store::GameStore;

/// Total rating points at stake in one match.
const STAKE: i64 = 32;

/// Each player's rating delta for a match between the given ratings.
///
/// The delta is proportional to a player's own share of the combined
/// rating, so when the weaker player wins they take the larger (loser's)
/// delta. Returns `(0, 0)` when both ratings are zero.
pub fn variance(rating_1: i32, rating_2: i32) -> (i32, i32) {
    let total = i64::from(rating_1) + i64::from(rating_2);
    if total == 0 {
        return (0, 0);
    }
    let d1 = STAKE * i64::from(rating_1) / total;
    let d2 = STAKE * i64::from(rating_2) / total;
    (d1 as i32, d2 as i32)
}

impl<S: GameStore> Engine<S> {
    /// Apply win/loss counters and rating movement for a decided game.
    ///
    /// The winner gains the loser's computed delta and the loser loses that
    /// same delta; cancelled games use a fixed delta of 1 for both sides.
    /// Callers guard against double application: this runs once, when the
    /// game first acquires a winner (or unconditionally on cancellation).
    pub(crate) fn finalize_scores(&self, game: &Game, cancelled: bool) -> Result<()> {
        let winner = match game.winner {
            Some(winner) => winner,
            None => return Ok(()),
        };
        let mut p1 = self.load_player(game.player_1)?;
        let mut p2 = self.load_player(game.player_2)?;
        let (d1, d2) = if cancelled {
            (1, 1)
        } else {
            variance(p1.rating, p2.rating)
        };
        {
            let (win, lose, delta) = if winner == game.player_1 {
                (&mut p1, &mut p2, d2)
            } else {
                (&mut p2, &mut p1, d1)
            };
            win.wins += 1;
            win.rating += delta;
            lose.losses += 1;
            lose.rating -= delta;
            info!(
                "game {:?}: {:?} takes {} rating points from {:?}",
                game.id, win.id, delta, lose.id
            );
        }
        self.store.update_player(&p1)?;
        self.store.update_player(&p2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::engine::make_winner;
    use crate::model::{GameOptions, Player, DEFAULT_RATING};
    use crate::store::{GameStore, MemoryStore};

    #[test]
    fn equal_ratings_split_the_stake() {
        assert_eq!(variance(1200, 1200), (16, 16));
    }

    #[test]
    fn deltas_follow_rating_shares() {
        // 32 * 1500 / 2400 = 20, 32 * 900 / 2400 = 12.
        assert_eq!(variance(1500, 900), (20, 12));
        // Truncating division.
        assert_eq!(variance(1201, 1200), (16, 15));
        assert_eq!(variance(0, 0), (0, 0));
    }

    fn decided_game(engine: &Engine<MemoryStore>, rated: bool) -> Game {
        let p1 = engine.store().insert_player(Player::new("one")).unwrap();
        let p2 = engine.store().insert_player(Player::new("two")).unwrap();
        let options = GameOptions {
            rated,
            ..GameOptions::default()
        };
        let mut game = engine
            .store()
            .insert_game(Game::new(p1.id, p2.id, options, Utc::now()))
            .unwrap();
        make_winner(&mut game, p1.id);
        engine.store().update_game(&game).unwrap();
        game
    }

    #[test]
    fn winner_takes_losers_delta() {
        let engine = Engine::new(MemoryStore::new());
        let game = decided_game(&engine, true);
        let mut p2 = engine.store().player(game.player_2).unwrap().unwrap();
        p2.rating = 900;
        engine.store().update_player(&p2).unwrap();
        engine.finalize_scores(&game, false).unwrap();
        let p1 = engine.store().player(game.player_1).unwrap().unwrap();
        let p2 = engine.store().player(game.player_2).unwrap().unwrap();
        // variance(1200, 900) = (18, 13); player_1 won, so both move by 13.
        assert_eq!(p1.rating, 1213);
        assert_eq!(p2.rating, 887);
        assert_eq!((p1.wins, p1.losses), (1, 0));
        assert_eq!((p2.wins, p2.losses), (0, 1));
    }

    #[test]
    fn cancelled_games_move_one_point() {
        let engine = Engine::new(MemoryStore::new());
        let game = decided_game(&engine, true);
        engine.finalize_scores(&game, true).unwrap();
        let p1 = engine.store().player(game.player_1).unwrap().unwrap();
        let p2 = engine.store().player(game.player_2).unwrap().unwrap();
        assert_eq!(p1.rating, 1201);
        assert_eq!(p2.rating, 1199);
    }

    #[test]
    fn undecided_games_are_untouched() {
        let engine = Engine::new(MemoryStore::new());
        let p1 = engine.store().insert_player(Player::new("one")).unwrap();
        let p2 = engine.store().insert_player(Player::new("two")).unwrap();
        let game = engine
            .store()
            .insert_game(Game::new(p1.id, p2.id, GameOptions::default(), Utc::now()))
            .unwrap();
        engine.finalize_scores(&game, false).unwrap();
        let p1 = engine.store().player(p1.id).unwrap().unwrap();
        assert_eq!((p1.rating, p1.wins, p1.losses), (DEFAULT_RATING, 0, 0));
    }
}

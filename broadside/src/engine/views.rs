//! Read models for the presentation layer.
//!
//! Two mirrored projections of one game: the player's own board (their
//! layouts plus the shots fired at them) and the opponent's board (only the
//! layouts the player has already sunk, plus the player's own shots). Moves
//! come newest first. Both are plain serializable values; time remaining is
//! always derived at query time, never stored.

use chrono::Utc;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::Result;
use crate::model::{Game, GameId, Layout, Move, PlayerId};
use crate::store::GameStore;

/// The requesting player's side of a game.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerGameView {
    pub game: Game,
    /// The player's own fleet.
    pub layouts: Vec<Layout>,
    /// Shots the opponent has fired at the player, newest first.
    pub moves: Vec<Move>,
    /// Seconds left on the current turn.
    pub time_remaining: i64,
}

/// The opponent's side of a game, as the requesting player may see it.
#[derive(Debug, Clone, Serialize)]
pub struct OpponentGameView {
    pub game: Game,
    /// Only the opponent's layouts the player has already sunk.
    pub layouts: Vec<Layout>,
    /// Shots the player has fired at the opponent, newest first.
    pub moves: Vec<Move>,
    pub time_remaining: i64,
}

impl<S: GameStore> Engine<S> {
    /// The player's own board in the given game.
    pub fn player_game(&self, player: PlayerId, id: GameId) -> Result<PlayerGameView> {
        let game = self.find_game(player, id)?;
        let layouts = self.store.layouts_for_player(id, player)?;
        let moves = newest_first(self.store.moves_for_player(id, game.opponent(player))?);
        let time_remaining = game.time_remaining(Utc::now());
        Ok(PlayerGameView {
            game,
            layouts,
            moves,
            time_remaining,
        })
    }

    /// The opponent's board in the given game, sunk ships only.
    pub fn opponent_game(&self, player: PlayerId, id: GameId) -> Result<OpponentGameView> {
        let game = self.find_game(player, id)?;
        let layouts = self
            .store
            .layouts_for_player(id, game.opponent(player))?
            .into_iter()
            .filter(|l| l.sunk)
            .collect();
        let moves = newest_first(self.store.moves_for_player(id, player)?);
        let time_remaining = game.time_remaining(Utc::now());
        Ok(OpponentGameView {
            game,
            layouts,
            moves,
            time_remaining,
        })
    }
}

fn newest_first(mut moves: Vec<Move>) -> Vec<Move> {
    moves.sort_by_key(|m| std::cmp::Reverse(m.id));
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{GameOptions, Player, ShipId};
    use crate::store::MemoryStore;

    fn engine_with_game() -> (Engine<MemoryStore>, Game, PlayerId, PlayerId) {
        let store = MemoryStore::new();
        let p1 = store.insert_player(Player::new("one")).unwrap().id;
        let p2 = store.insert_player(Player::new("two")).unwrap().id;
        let engine = Engine::new(store);
        let game = engine
            .store()
            .insert_game(Game::new(p1, p2, GameOptions::default(), Utc::now()))
            .unwrap();
        (engine, game, p1, p2)
    }

    #[test]
    fn player_view_pairs_own_fleet_with_incoming_fire() {
        let (engine, game, p1, p2) = engine_with_game();
        engine
            .store()
            .insert_layout(Layout::new(game.id, p1, ShipId(5), 0, 0, false))
            .unwrap();
        engine
            .store()
            .insert_move(Move::new(game.id, p2, 4, 4, None))
            .unwrap();
        engine
            .store()
            .insert_move(Move::new(game.id, p2, 5, 5, None))
            .unwrap();
        let view = engine.player_game(p1, game.id).unwrap();
        assert_eq!(view.layouts.len(), 1);
        assert_eq!(view.moves.len(), 2);
        // Newest first.
        assert_eq!((view.moves[0].x, view.moves[0].y), (5, 5));
    }

    #[test]
    fn opponent_view_reveals_only_sunk_ships() {
        let (engine, game, p1, p2) = engine_with_game();
        let mut sunk = engine
            .store()
            .insert_layout(Layout::new(game.id, p2, ShipId(5), 0, 0, false))
            .unwrap();
        sunk.sunk = true;
        engine.store().update_layout(&sunk).unwrap();
        engine
            .store()
            .insert_layout(Layout::new(game.id, p2, ShipId(1), 0, 5, false))
            .unwrap();
        let view = engine.opponent_game(p1, game.id).unwrap();
        assert_eq!(view.layouts.len(), 1);
        assert!(view.layouts[0].sunk);
    }

    #[test]
    fn views_are_participant_scoped() {
        let (engine, game, _, _) = engine_with_game();
        let outsider = engine
            .store()
            .insert_player(Player::new("other"))
            .unwrap()
            .id;
        assert!(matches!(
            engine.player_game(outsider, game.id),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            engine.opponent_game(outsider, game.id),
            Err(Error::NotFound)
        ));
    }
}

//! Attack resolution: shot recording, sink detection, win detection and
//! turn advancement.

use std::sync::PoisonError;

use chrono::Utc;
use log::{debug, warn};
use rand::Rng;

use crate::engine::{make_winner, Engine};
use crate::error::Result;
use crate::grid;
use crate::model::{Game, GameId, Layout, LayoutId, Move, PlayerId};
use crate::store::GameStore;

/// Result of an attack submission.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttackStatus {
    /// The shots were processed and the turn advanced.
    Accepted,
    /// It is not the submitter's move, or the game is already decided.
    /// Nothing changed.
    OutOfTurn,
}

/// Result of recording a single shot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShotOutcome {
    /// The cell was already shot by this player. Recording is idempotent,
    /// so nothing changed.
    Repeat,
    /// The shot hit open water.
    Miss,
    /// The shot hit the given layout without sinking it.
    Hit(LayoutId),
    /// The shot hit the given layout and sank it.
    Sunk(LayoutId),
    /// The shot resolved to a layout that is already fully hit. Rejected;
    /// no move was recorded.
    ShipAlreadySunk,
}

/// Find the layout in the snapshot whose occupied cells include `(x, y)`.
pub(crate) fn find_hit(layouts: &[Layout], x: i32, y: i32) -> Option<&Layout> {
    layouts.iter().find(|layout| layout.covers(x, y))
}

impl<S: GameStore> Engine<S> {
    /// Submit a volley of shots for `player`.
    ///
    /// Shots beyond the game's per-turn allowance are truncated; shots at
    /// out-of-grid or already-shot cells are dropped without error. After
    /// the volley the turn advances, and a bot opponent immediately fires
    /// its counter-volley before this returns.
    pub fn attack(
        &self,
        player: PlayerId,
        game_id: GameId,
        shots: &[(i32, i32)],
        rng: &mut impl Rng,
    ) -> Result<AttackStatus> {
        let lock = self.lock_game(game_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut game = self.find_game(player, game_id)?;
        if !game.can_attack(player) {
            return Ok(AttackStatus::OutOfTurn);
        }
        let mut shooter = self.load_player(player)?;
        shooter.new_activity();
        self.store.update_player(&shooter)?;

        for &(x, y) in shots.iter().take(game.shots_per_turn()) {
            if !(grid::in_grid(x) && grid::in_grid(y)) {
                warn!("game {:?}: dropping out-of-grid shot ({}, {})", game_id, x, y);
                continue;
            }
            self.record_shot(&game, player, x, y)?;
        }
        self.next_turn(&mut game)?;

        if game.winner.is_none() {
            let opponent = self.load_player(game.opponent(player))?;
            if opponent.bot {
                self.bot_attack(&mut game, opponent, rng)?;
            }
        }
        Ok(AttackStatus::Accepted)
    }

    /// Record one shot by `shooter`, resolving it against the opponent's
    /// layout snapshot. Idempotent per cell.
    pub(crate) fn record_shot(
        &self,
        game: &Game,
        shooter: PlayerId,
        x: i32,
        y: i32,
    ) -> Result<ShotOutcome> {
        if self.store.move_at(game.id, shooter, x, y)?.is_some() {
            return Ok(ShotOutcome::Repeat);
        }
        let layouts = self
            .store
            .layouts_for_player(game.id, game.opponent(shooter))?;
        let layout = match find_hit(&layouts, x, y) {
            None => {
                self.store
                    .insert_move(Move::new(game.id, shooter, x, y, None))?;
                debug!("game {:?}: {:?} missed at ({}, {})", game.id, shooter, x, y);
                return Ok(ShotOutcome::Miss);
            }
            Some(layout) => layout,
        };
        // A sunk ship cannot register more qualifying hits.
        let hits = self.store.moves_for_layout(layout.id)?.len() as i32;
        if layout.sunk || hits >= layout.size() {
            warn!(
                "game {:?}: rejecting shot at ({}, {}), layout {:?} already sunk",
                game.id, x, y, layout.id
            );
            return Ok(ShotOutcome::ShipAlreadySunk);
        }
        self.store
            .insert_move(Move::new(game.id, shooter, x, y, Some(layout.id)))?;
        debug!(
            "game {:?}: {:?} hit layout {:?} at ({}, {})",
            game.id, shooter, layout.id, x, y
        );
        if self.maybe_sink(layout)? {
            Ok(ShotOutcome::Sunk(layout.id))
        } else {
            Ok(ShotOutcome::Hit(layout.id))
        }
    }

    /// Flip the layout's `sunk` flag once the moves referencing it reach the
    /// ship's size. One-way. Returns whether the layout is now sunk.
    pub(crate) fn maybe_sink(&self, layout: &Layout) -> Result<bool> {
        if layout.sunk {
            return Ok(true);
        }
        let hits = self.store.moves_for_layout(layout.id)?.len() as i32;
        if hits >= layout.size() {
            let mut sunk = layout.clone();
            sunk.sunk = true;
            self.store.update_layout(&sunk)?;
            debug!("game {:?}: layout {:?} sunk", layout.game, layout.id);
            return Ok(true);
        }
        Ok(false)
    }

    /// True iff the player has no unsunk layout in the game.
    pub(crate) fn all_sunk(&self, game: GameId, player: PlayerId) -> Result<bool> {
        Ok(self
            .store
            .layouts_for_player(game, player)?
            .iter()
            .all(|layout| layout.sunk))
    }

    /// Set the winner for whichever side has wiped out its opponent.
    fn declare_winner(&self, game: &mut Game) -> Result<()> {
        for &(player, opponent) in &[
            (game.player_1, game.player_2),
            (game.player_2, game.player_1),
        ] {
            if self.all_sunk(game.id, opponent)? {
                make_winner(game, player);
            }
        }
        Ok(())
    }

    /// Advance the turn: flip the turn-holder, re-check every unsunk layout,
    /// re-run win detection, finalize scoring if a rated game was just
    /// decided, and reset the turn clock.
    pub(crate) fn next_turn(&self, game: &mut Game) -> Result<()> {
        game.turn = game.next_player_turn();
        for &player in &[game.player_1, game.player_2] {
            for layout in self.store.layouts_for_player(game.id, player)? {
                if !layout.sunk {
                    self.maybe_sink(&layout)?;
                }
            }
        }
        let already_decided = game.winner.is_some();
        self.declare_winner(game)?;
        game.touch(Utc::now());
        self.store.update_game(game)?;
        if game.rated && !already_decided && game.winner.is_some() {
            self.finalize_scores(game, false)?;
        }
        Ok(())
    }
}

//! Orchestration of matches over a [`GameStore`].
//!
//! The engine is request/response and synchronous: each operation validates,
//! reads a snapshot, writes, and returns. Attack processing for a given game
//! is serialized with a per-game mutex because turn validation and move
//! recording are not atomic as a unit; see [`Engine::lock_game`]. There are
//! no background timers — timeouts are evaluated lazily against the stored
//! `updated_at` whenever a player acts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use log::{debug, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::model::{Game, GameId, GameOptions, Invite, InviteId, Player, PlayerId};
use crate::store::{GameStore, StoreError};

pub use self::{
    attack::{AttackStatus, ShotOutcome},
    placement::ShipPlacement,
    views::{OpponentGameView, PlayerGameView},
};

mod attack;
mod bot;
mod placement;
pub mod scoring;
mod views;

/// Reason an invite could not be created. A rejected invite is a normal
/// decision outcome, not an error.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum CannotInviteReason {
    /// A player cannot invite themselves.
    #[error("cannot invite self")]
    SelfInvite,
    /// An invite between these two players already exists.
    #[error("invite already exists")]
    AlreadyInvited,
}

/// Result of asking for a new match.
#[derive(Debug)]
pub enum InviteOutcome {
    /// The opponent is a bot: the game was created directly, with the bot's
    /// fleet already placed.
    Game(Game),
    /// The opponent is human: an invite is pending their acceptance.
    Pending(Invite),
    /// The invite was declined by the engine.
    Rejected(CannotInviteReason),
}

/// The match engine. Owns a store and serializes per-game mutation.
pub struct Engine<S> {
    store: S,
    locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
}

impl<S: GameStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Direct access to the underlying store, for account management and
    /// presentation-layer queries outside the engine's scope.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The serialization lock for one game. At most one attack-processing
    /// sequence may run per game at a time; a race here could let both
    /// players move in the same turn or double-process a sink.
    fn lock_game(&self, id: GameId) -> Arc<Mutex<()>> {
        // Poison only means an earlier request panicked; the stored state
        // remains authoritative, so keep going.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    fn unlock_game(&self, id: GameId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(&id);
    }

    /// Find a game by id, scoped to its participants: non-participants get
    /// `NotFound`, the same as a missing game.
    pub fn find_game(&self, player: PlayerId, id: GameId) -> Result<Game> {
        match self.store.game(id)? {
            Some(game) if game.is_participant(player) => Ok(game),
            _ => Err(Error::NotFound),
        }
    }

    pub(crate) fn load_player(&self, id: PlayerId) -> Result<Player> {
        self.store.player(id)?.ok_or(Error::NotFound)
    }

    /// Ask for a match against `opponent`. Bot opponents skip the invite
    /// flow entirely: the game is created with the inviter to move and the
    /// bot's fleet already laid out.
    pub fn create_invite(
        &self,
        player: PlayerId,
        opponent: PlayerId,
        options: GameOptions,
        rng: &mut impl Rng,
    ) -> Result<InviteOutcome> {
        if player == opponent {
            return Ok(InviteOutcome::Rejected(CannotInviteReason::SelfInvite));
        }
        let target = self.load_player(opponent)?;
        self.load_player(player)?;
        if target.bot {
            return Ok(InviteOutcome::Game(self.create_bot_game(
                player, opponent, options, rng,
            )?));
        }
        match self.store.insert_invite(Invite::new(player, opponent, options, Utc::now())) {
            Ok(invite) => {
                info!("invite {:?}: {:?} challenged {:?}", invite.id, player, opponent);
                Ok(InviteOutcome::Pending(invite))
            }
            Err(StoreError::Conflict(_)) => {
                Ok(InviteOutcome::Rejected(CannotInviteReason::AlreadyInvited))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Accept an invite addressed to `player`, creating the game with the
    /// inviter to move first. The invite is removed.
    pub fn accept_invite(&self, player: PlayerId, id: InviteId) -> Result<Game> {
        let invite = match self.store.invite(id)? {
            Some(invite) if invite.player_2 == player => invite,
            _ => return Err(Error::NotFound),
        };
        let game = self.store.insert_game(Game::new(
            invite.player_1,
            invite.player_2,
            invite.options(),
            Utc::now(),
        ))?;
        let mut acceptor = self.load_player(player)?;
        acceptor.new_activity();
        self.store.update_player(&acceptor)?;
        self.store.delete_invite(invite.id)?;
        info!("invite {:?} accepted, game {:?} created", invite.id, game.id);
        Ok(game)
    }

    /// Decline an invite addressed to `player`. The invite is removed.
    pub fn decline_invite(&self, player: PlayerId, id: InviteId) -> Result<()> {
        match self.store.invite(id)? {
            Some(invite) if invite.player_2 == player => {
                self.store.delete_invite(invite.id)?;
                Ok(())
            }
            _ => Err(Error::NotFound),
        }
    }

    /// Withdraw an invite created by `player`. The invite is removed.
    pub fn cancel_invite(&self, player: PlayerId, id: InviteId) -> Result<()> {
        match self.store.invite(id)? {
            Some(invite) if invite.player_1 == player => {
                self.store.delete_invite(invite.id)?;
                Ok(())
            }
            _ => Err(Error::NotFound),
        }
    }

    /// Create a game against a bot. The inviter moves first and the bot's
    /// fleet is placed immediately.
    pub fn create_bot_game(
        &self,
        player: PlayerId,
        bot: PlayerId,
        options: GameOptions,
        rng: &mut impl Rng,
    ) -> Result<Game> {
        self.load_player(player)?;
        let opponent = self.load_player(bot)?;
        let mut game = self
            .store
            .insert_game(Game::new(player, bot, options, Utc::now()))?;
        if opponent.bot {
            self.bot_layout(&mut game, bot, rng)?;
        }
        info!("game {:?} created: {:?} vs {:?}", game.id, player, bot);
        Ok(game)
    }

    /// Whether it is `player`'s move in the given game.
    pub fn my_turn(&self, player: PlayerId, id: GameId) -> Result<bool> {
        Ok(self.find_game(player, id)?.turn == player)
    }

    /// Force-advance a stalled opponent's turn. A no-op unless the game is
    /// undecided, it is the opponent's move, and their clock has run out.
    pub fn skip(&self, player: PlayerId, id: GameId) -> Result<Game> {
        let lock = self.lock_game(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut game = self.find_game(player, id)?;
        if game.can_skip(player, Utc::now()) {
            info!("game {:?}: {:?} skips the stalled turn", id, player);
            self.next_turn(&mut game)?;
        }
        Ok(game)
    }

    /// Resolve a stalled or abandoned match outside the normal attack flow.
    ///
    /// While the clock still runs the acting player is forfeiting. Once it
    /// has expired, setup completeness decides first (a player who never
    /// laid out loses to one who did); with both fleets placed, the
    /// turn-holder cancelling is giving up, and cancelling on the opponent's
    /// turn resolves their inactivity against them. Scoring is always
    /// finalized in cancelled mode (fixed ±1).
    pub fn cancel(&self, player: PlayerId, id: GameId) -> Result<Game> {
        let lock = self.lock_game(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut game = self.find_game(player, id)?;
        if game.winner.is_some() {
            return Ok(game);
        }
        let now = Utc::now();
        let opponent = game.opponent(player);
        if game.time_remaining(now) < 0 {
            if game.layed_out(player) && !game.layed_out(opponent) {
                make_winner(&mut game, player);
            } else if !game.layed_out(player) {
                make_winner(&mut game, opponent);
            }
            if game.winner.is_none() && game.turn == player {
                // Giving up.
                make_winner(&mut game, opponent);
            }
            if game.winner.is_none() && game.turn != player {
                // Opponent won't play.
                make_winner(&mut game, player);
            }
        } else {
            make_winner(&mut game, opponent);
        }
        game.touch(now);
        self.store.update_game(&game)?;
        self.finalize_scores(&game, true)?;
        info!("game {:?} cancelled by {:?}, winner {:?}", id, player, game.winner);
        Ok(game)
    }

    /// Flag a decided game as deleted by `player`. Bot games are removed
    /// immediately; human games persist until both sides have flagged them.
    /// A no-op while the game is still undecided.
    pub fn destroy_game(&self, player: PlayerId, id: GameId) -> Result<()> {
        let lock = self.lock_game(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut game = self.find_game(player, id)?;
        if game.winner.is_none() {
            return Ok(());
        }
        let p1 = self.load_player(game.player_1)?;
        let p2 = self.load_player(game.player_2)?;
        if p1.bot || p2.bot {
            self.store.delete_game(id)?;
            self.unlock_game(id);
            return Ok(());
        }
        game.set_deleted_by(player);
        self.store.update_game(&game)?;
        if game.del_player_1 && game.del_player_2 {
            self.store.delete_game(id)?;
            self.unlock_game(id);
        }
        Ok(())
    }

    /// The game the player should look at next: one where it is their move,
    /// or failing that one where the opponent has run out the clock. Only
    /// fully-laid-out, undecided games the player has not deleted count.
    pub fn next_game(&self, player: PlayerId) -> Result<Option<Game>> {
        let now = Utc::now();
        let mut games: Vec<Game> = self
            .store
            .games_for_player(player)?
            .into_iter()
            .filter(|g| {
                !g.deleted_by(player)
                    && g.winner.is_none()
                    && g.player_1_layed_out
                    && g.player_2_layed_out
            })
            .collect();
        games.sort_by_key(|g| std::cmp::Reverse(g.updated_at));
        if let Some(game) = games.iter().find(|g| g.turn == player) {
            return Ok(Some(game.clone()));
        }
        Ok(games
            .into_iter()
            .find(|g| g.turn != player && g.time_remaining(now) <= 0))
    }
}

/// Set the winner. A decided game must never flip to a different winner, so
/// a conflicting call is dropped rather than applied.
pub(crate) fn make_winner(game: &mut Game, player: PlayerId) {
    match game.winner {
        None => {
            debug!("game {:?}: winner is {:?}", game.id, player);
            game.winner = Some(player);
        }
        Some(current) if current == player => {}
        Some(current) => {
            warn!(
                "game {:?}: refusing to change winner from {:?} to {:?}",
                game.id, current, player
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameOptions;

    #[test]
    fn winner_never_flips() {
        let mut game = Game::new(PlayerId(1), PlayerId(2), GameOptions::default(), Utc::now());
        make_winner(&mut game, PlayerId(1));
        assert_eq!(game.winner, Some(PlayerId(1)));
        make_winner(&mut game, PlayerId(2));
        assert_eq!(game.winner, Some(PlayerId(1)));
        make_winner(&mut game, PlayerId(1));
        assert_eq!(game.winner, Some(PlayerId(1)));
    }
}

//! In-memory [`GameStore`] implementation.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::model::{
    Game, GameId, Invite, InviteId, Layout, LayoutId, Move, MoveId, Player, PlayerId,
};
use crate::store::{GameStore, StoreError};

/// In-memory store backed by id-ordered maps. Interior-mutable so it can be
/// shared behind `&self` the same way a connection pool would be.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    players: BTreeMap<i64, Player>,
    games: BTreeMap<i64, Game>,
    layouts: BTreeMap<i64, Layout>,
    moves: BTreeMap<i64, Move>,
    invites: BTreeMap<i64, Invite>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl GameStore for MemoryStore {
    fn insert_player(&self, mut player: Player) -> Result<Player, StoreError> {
        let mut inner = self.lock()?;
        if inner.players.values().any(|p| p.name == player.name) {
            return Err(StoreError::Conflict("players.name"));
        }
        player.id = PlayerId(inner.next_id());
        inner.players.insert(player.id.0, player.clone());
        Ok(player)
    }

    fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        Ok(self.lock()?.players.get(&id.0).cloned())
    }

    fn update_player(&self, player: &Player) -> Result<(), StoreError> {
        self.lock()?.players.insert(player.id.0, player.clone());
        Ok(())
    }

    fn insert_game(&self, mut game: Game) -> Result<Game, StoreError> {
        let mut inner = self.lock()?;
        game.id = GameId(inner.next_id());
        inner.games.insert(game.id.0, game.clone());
        Ok(game)
    }

    fn game(&self, id: GameId) -> Result<Option<Game>, StoreError> {
        Ok(self.lock()?.games.get(&id.0).cloned())
    }

    fn update_game(&self, game: &Game) -> Result<(), StoreError> {
        self.lock()?.games.insert(game.id.0, game.clone());
        Ok(())
    }

    fn delete_game(&self, id: GameId) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.games.remove(&id.0);
        inner.layouts.retain(|_, l| l.game != id);
        inner.moves.retain(|_, m| m.game != id);
        Ok(())
    }

    fn games_for_player(&self, player: PlayerId) -> Result<Vec<Game>, StoreError> {
        Ok(self
            .lock()?
            .games
            .values()
            .filter(|g| g.is_participant(player))
            .cloned()
            .collect())
    }

    fn insert_layout(&self, mut layout: Layout) -> Result<Layout, StoreError> {
        let mut inner = self.lock()?;
        let duplicate = inner.layouts.values().any(|l| {
            l.game == layout.game
                && l.player == layout.player
                && l.x == layout.x
                && l.y == layout.y
        });
        if duplicate {
            return Err(StoreError::Conflict("layouts(player, game, x, y)"));
        }
        layout.id = LayoutId(inner.next_id());
        inner.layouts.insert(layout.id.0, layout.clone());
        Ok(layout)
    }

    fn update_layout(&self, layout: &Layout) -> Result<(), StoreError> {
        self.lock()?.layouts.insert(layout.id.0, layout.clone());
        Ok(())
    }

    fn layouts_for_player(&self, game: GameId, player: PlayerId) -> Result<Vec<Layout>, StoreError> {
        Ok(self
            .lock()?
            .layouts
            .values()
            .filter(|l| l.game == game && l.player == player)
            .cloned()
            .collect())
    }

    fn insert_move(&self, mut mv: Move) -> Result<Move, StoreError> {
        let mut inner = self.lock()?;
        let duplicate = inner
            .moves
            .values()
            .any(|m| m.game == mv.game && m.player == mv.player && m.x == mv.x && m.y == mv.y);
        if duplicate {
            return Err(StoreError::Conflict("moves(game, player, x, y)"));
        }
        mv.id = MoveId(inner.next_id());
        inner.moves.insert(mv.id.0, mv.clone());
        Ok(mv)
    }

    fn moves_for_player(&self, game: GameId, player: PlayerId) -> Result<Vec<Move>, StoreError> {
        Ok(self
            .lock()?
            .moves
            .values()
            .filter(|m| m.game == game && m.player == player)
            .cloned()
            .collect())
    }

    fn move_at(
        &self,
        game: GameId,
        player: PlayerId,
        x: i32,
        y: i32,
    ) -> Result<Option<Move>, StoreError> {
        Ok(self
            .lock()?
            .moves
            .values()
            .find(|m| m.game == game && m.player == player && m.x == x && m.y == y)
            .cloned())
    }

    fn moves_for_layout(&self, layout: LayoutId) -> Result<Vec<Move>, StoreError> {
        Ok(self
            .lock()?
            .moves
            .values()
            .filter(|m| m.layout == Some(layout))
            .cloned()
            .collect())
    }

    fn insert_invite(&self, mut invite: Invite) -> Result<Invite, StoreError> {
        let mut inner = self.lock()?;
        let duplicate = inner
            .invites
            .values()
            .any(|i| i.player_1 == invite.player_1 && i.player_2 == invite.player_2);
        if duplicate {
            return Err(StoreError::Conflict("invites(player_1, player_2)"));
        }
        invite.id = InviteId(inner.next_id());
        inner.invites.insert(invite.id.0, invite.clone());
        Ok(invite)
    }

    fn invite(&self, id: InviteId) -> Result<Option<Invite>, StoreError> {
        Ok(self.lock()?.invites.get(&id.0).cloned())
    }

    fn delete_invite(&self, id: InviteId) -> Result<(), StoreError> {
        self.lock()?.invites.remove(&id.0);
        Ok(())
    }

    fn invites_for_player(&self, player: PlayerId) -> Result<Vec<Invite>, StoreError> {
        Ok(self
            .lock()?
            .invites
            .values()
            .filter(|i| i.player_1 == player || i.player_2 == player)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{GameOptions, ShipId};

    #[test]
    fn insert_assigns_ids() {
        let store = MemoryStore::new();
        let a = store.insert_player(Player::new("a")).unwrap();
        let b = store.insert_player(Player::new("b")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.player(a.id).unwrap().unwrap().name, "a");
    }

    #[test]
    fn player_names_are_unique() {
        let store = MemoryStore::new();
        store.insert_player(Player::new("a")).unwrap();
        assert!(matches!(
            store.insert_player(Player::new("a")),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn layout_origin_is_unique_per_player_and_game() {
        let store = MemoryStore::new();
        let game = GameId(1);
        store
            .insert_layout(Layout::new(game, PlayerId(1), ShipId(1), 0, 0, true))
            .unwrap();
        // Same origin, same player: rejected.
        assert!(matches!(
            store.insert_layout(Layout::new(game, PlayerId(1), ShipId(2), 0, 0, false)),
            Err(StoreError::Conflict(_))
        ));
        // Same origin, other player: fine.
        store
            .insert_layout(Layout::new(game, PlayerId(2), ShipId(1), 0, 0, true))
            .unwrap();
    }

    #[test]
    fn move_cell_is_unique_per_player_and_game() {
        let store = MemoryStore::new();
        let game = GameId(1);
        store
            .insert_move(Move::new(game, PlayerId(1), 4, 4, None))
            .unwrap();
        assert!(matches!(
            store.insert_move(Move::new(game, PlayerId(1), 4, 4, None)),
            Err(StoreError::Conflict(_))
        ));
        store
            .insert_move(Move::new(game, PlayerId(2), 4, 4, None))
            .unwrap();
    }

    #[test]
    fn delete_game_cascades() {
        let store = MemoryStore::new();
        let game = store
            .insert_game(Game::new(
                PlayerId(1),
                PlayerId(2),
                GameOptions::default(),
                Utc::now(),
            ))
            .unwrap();
        store
            .insert_layout(Layout::new(game.id, PlayerId(1), ShipId(1), 0, 0, true))
            .unwrap();
        store
            .insert_move(Move::new(game.id, PlayerId(2), 0, 0, None))
            .unwrap();
        store.delete_game(game.id).unwrap();
        assert!(store.game(game.id).unwrap().is_none());
        assert!(store
            .layouts_for_player(game.id, PlayerId(1))
            .unwrap()
            .is_empty());
        assert!(store
            .moves_for_player(game.id, PlayerId(2))
            .unwrap()
            .is_empty());
    }
}

//! Ship placement: randomized for bots, submitted for humans.

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::grid;
use crate::model::{Game, GameId, Layout, PlayerId};
use crate::ships::{self, Ship};
use crate::store::GameStore;

/// Random anchor attempts before falling back to a deterministic scan of
/// every valid anchor. Keeps placement terminating even on a near-full grid.
const MAX_RANDOM_ATTEMPTS: u32 = 1000;

/// One ship placement as submitted by a player.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShipPlacement {
    /// Catalog name of the ship. Unknown names are silently skipped.
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub vertical: bool,
}

impl<S: GameStore> Engine<S> {
    /// Persist a player's submitted fleet and mark them layed out.
    ///
    /// Placements naming unknown ships or anchored outside the grid are
    /// dropped. Beyond that and the store's origin-cell uniqueness
    /// constraint no overlap validation is performed; covered-cell overlap
    /// between two different ships is accepted as submitted.
    pub fn submit_layout(
        &self,
        player: PlayerId,
        game_id: GameId,
        placements: &[ShipPlacement],
    ) -> Result<Game> {
        let lock = self.lock_game(game_id);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut game = self.find_game(player, game_id)?;
        for placement in placements {
            let ship = match ships::by_name(&placement.name) {
                Some(ship) => ship,
                None => {
                    debug!("game {:?}: skipping unknown ship {:?}", game_id, placement.name);
                    continue;
                }
            };
            if !(grid::in_grid(placement.x) && grid::in_grid(placement.y)) {
                warn!(
                    "game {:?}: dropping out-of-grid anchor ({}, {}) for {}",
                    game_id, placement.x, placement.y, ship.name
                );
                continue;
            }
            self.store.insert_layout(Layout::new(
                game.id,
                player,
                ship.id,
                placement.x,
                placement.y,
                placement.vertical,
            ))?;
        }
        game.set_layed_out(player);
        self.store.update_game(&game)?;
        Ok(game)
    }

    /// Place the whole catalog fleet for a bot, random axis per ship, and
    /// mark the bot layed out.
    pub(crate) fn bot_layout(
        &self,
        game: &mut Game,
        bot: PlayerId,
        rng: &mut impl Rng,
    ) -> Result<()> {
        for ship in ships::fleet() {
            let vertical = rng.gen::<bool>();
            self.place_ship(game, bot, ship, vertical, rng)?;
        }
        game.set_layed_out(bot);
        self.store.update_game(game)?;
        Ok(())
    }

    /// Place one ship at a random collision-free anchor along the requested
    /// axis.
    pub(crate) fn place_ship(
        &self,
        game: &Game,
        player: PlayerId,
        ship: &Ship,
        vertical: bool,
        rng: &mut impl Rng,
    ) -> Result<Layout> {
        let existing = self.store.layouts_for_player(game.id, player)?;
        let (x, y) =
            random_anchor(&existing, ship.size, vertical, rng).ok_or(Error::NoSpace)?;
        let layout = self
            .store
            .insert_layout(Layout::new(game.id, player, ship.id, x, y, vertical))?;
        debug!(
            "game {:?}: placed {} for {:?} at ({}, {}) {}",
            game.id,
            ship.name,
            player,
            x,
            y,
            if vertical { "vertical" } else { "horizontal" }
        );
        Ok(layout)
    }
}

/// Whether a ship of `size` anchored at `(x, y)` along the given axis stays
/// in the grid and avoids every cell of `existing`.
fn anchor_fits(existing: &[Layout], x: i32, y: i32, size: i32, vertical: bool) -> bool {
    let (end_x, end_y) = if vertical { (x, y + size - 1) } else { (x + size - 1, y) };
    if !(grid::in_grid(x) && grid::in_grid(y) && grid::in_grid(end_x) && grid::in_grid(end_y)) {
        return false;
    }
    let cells: Vec<(i32, i32)> = if vertical {
        (y..y + size).map(|row| (x, row)).collect()
    } else {
        (x..x + size).map(|col| (col, y)).collect()
    };
    cells
        .iter()
        .all(|&(col, row)| !existing.iter().any(|l| l.covers(col, row)))
}

/// Pick a uniformly random collision-free anchor, re-rolling on collision up
/// to [`MAX_RANDOM_ATTEMPTS`] times, then scanning every anchor in order.
/// Returns `None` only when no valid anchor exists at all.
fn random_anchor(
    existing: &[Layout],
    size: i32,
    vertical: bool,
    rng: &mut impl Rng,
) -> Option<(i32, i32)> {
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let (x, y) = if vertical {
            (rng.gen_range(0, grid::SIZE), rng.gen_range(0, grid::SIZE - size + 1))
        } else {
            (rng.gen_range(0, grid::SIZE - size + 1), rng.gen_range(0, grid::SIZE))
        };
        if anchor_fits(existing, x, y, size, vertical) {
            return Some((x, y));
        }
    }
    for y in 0..grid::SIZE {
        for x in 0..grid::SIZE {
            if anchor_fits(existing, x, y, size, vertical) {
                return Some((x, y));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::model::{GameOptions, Player, ShipId};
    use crate::store::MemoryStore;

    fn fixed_layout(x: i32, y: i32, vertical: bool) -> Layout {
        // Carrier, size 5.
        Layout::new(GameId(1), PlayerId(1), ShipId(1), x, y, vertical)
    }

    #[test]
    fn anchors_keep_ships_in_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        for &vertical in &[true, false] {
            for _ in 0..200 {
                let (x, y) = random_anchor(&[], 5, vertical, &mut rng).unwrap();
                assert!(anchor_fits(&[], x, y, 5, vertical), "anchor ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn anchors_avoid_existing_cells() {
        let mut rng = StdRng::seed_from_u64(11);
        // A vertical carrier down column 4.
        let existing = vec![fixed_layout(4, 2, true)];
        for _ in 0..200 {
            let (x, y) = random_anchor(&existing, 3, false, &mut rng).unwrap();
            for col in x..x + 3 {
                assert!(!existing[0].covers(col, y));
            }
        }
    }

    #[test]
    fn falls_back_to_scan_when_random_cannot_win() {
        // Fill all rows except row 9 with horizontal carriers in both column
        // halves, leaving only horizontal anchors on row 9.
        let mut existing = Vec::new();
        for row in 0..9 {
            existing.push(fixed_layout(0, row, false));
            existing.push(fixed_layout(5, row, false));
        }
        let mut rng = StdRng::seed_from_u64(13);
        let (x, y) = random_anchor(&existing, 5, false, &mut rng).unwrap();
        assert_eq!(y, 9);
        assert!(anchor_fits(&existing, x, y, 5, false));
        // And with the last row blocked too, no anchor exists.
        existing.push(fixed_layout(0, 9, false));
        existing.push(fixed_layout(5, 9, false));
        assert!(random_anchor(&existing, 5, false, &mut rng).is_none());
    }

    #[test]
    fn out_of_grid_anchors_are_dropped() {
        let store = MemoryStore::new();
        let p1 = store.insert_player(Player::new("one")).unwrap().id;
        let p2 = store.insert_player(Player::new("two")).unwrap().id;
        let engine = Engine::new(store);
        let game = engine
            .store()
            .insert_game(Game::new(p1, p2, GameOptions::default(), Utc::now()))
            .unwrap();
        // A whole fleet anchored off the board persists nothing; such a
        // fleet could never be hit, so the game would be unwinnable.
        let placements: Vec<ShipPlacement> = ships::fleet()
            .iter()
            .map(|ship| ShipPlacement {
                name: ship.name.to_string(),
                x: 50,
                y: 50,
                vertical: false,
            })
            .collect();
        let game = engine.submit_layout(p1, game.id, &placements).unwrap();
        assert!(engine
            .store()
            .layouts_for_player(game.id, p1)
            .unwrap()
            .is_empty());
        // A mixed submission keeps only the in-grid anchors.
        let placements = vec![
            ShipPlacement {
                name: "Carrier".to_string(),
                x: 0,
                y: 0,
                vertical: false,
            },
            ShipPlacement {
                name: "Battleship".to_string(),
                x: -1,
                y: 3,
                vertical: true,
            },
            ShipPlacement {
                name: "Destroyer".to_string(),
                x: 4,
                y: 10,
                vertical: true,
            },
        ];
        engine.submit_layout(p1, game.id, &placements).unwrap();
        let layouts = engine.store().layouts_for_player(game.id, p1).unwrap();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].ship, ShipId(1));
    }

    #[test]
    fn bot_layout_places_whole_fleet_without_overlap() {
        let store = MemoryStore::new();
        let human = store.insert_player(Player::new("human")).unwrap();
        let bot = store.insert_player(Player::bot("bot", 2)).unwrap();
        let engine = Engine::new(store);
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let game = engine
                .create_bot_game(human.id, bot.id, GameOptions::default(), &mut rng)
                .unwrap();
            let layouts = engine.store().layouts_for_player(game.id, bot.id).unwrap();
            assert_eq!(layouts.len(), 5);
            let mut cells = std::collections::HashSet::new();
            for layout in &layouts {
                for (x, y) in layout.cells() {
                    assert!(grid::in_grid(x) && grid::in_grid(y));
                    assert!(cells.insert((x, y)), "overlap at ({}, {})", x, y);
                }
            }
            assert_eq!(cells.len(), 17);
        }
    }
}

//! Scripted-opponent targeting.
//!
//! The bot plays a hunt/target strategy: once it has an unanswered hit on an
//! unsunk ship it keeps working that ship (neighbors of a lone hit, or the
//! two ends of a discovered run), and otherwise hunts, biased toward the
//! rows and columns it has fired into least. All candidate selection is pure
//! over a snapshot of the bot's own moves so it can be tested without a
//! store.

use log::debug;
use rand::Rng;

use crate::engine::attack::find_hit;
use crate::engine::Engine;
use crate::error::Result;
use crate::grid;
use crate::model::{Game, Layout, Move, Player, PlayerId};
use crate::store::GameStore;

impl<S: GameStore> Engine<S> {
    /// Fire the bot's whole turn and advance the turn machine.
    ///
    /// In five-shot games `strength` shots use the sinking-ship priority
    /// path and the remainder hunt unconditionally; otherwise the single
    /// shot is priority-first.
    pub(crate) fn bot_attack(
        &self,
        game: &mut Game,
        mut bot: Player,
        rng: &mut impl Rng,
    ) -> Result<()> {
        bot.new_activity();
        self.store.update_player(&bot)?;
        if game.five_shot {
            let priority = bot.strength.min(5);
            for _ in 0..priority {
                self.bot_priority_shot(game, &bot, rng)?;
            }
            for _ in 0..5 - priority {
                self.bot_hunting_shot(game, &bot, rng)?;
            }
        } else {
            self.bot_priority_shot(game, &bot, rng)?;
        }
        if game.winner.is_none() {
            self.next_turn(game)?;
        }
        Ok(())
    }

    /// One shot, working a partially-hit ship when there is one.
    fn bot_priority_shot(&self, game: &Game, bot: &Player, rng: &mut impl Rng) -> Result<()> {
        if !self.bot_sinking_shot(game, bot.id, rng)? {
            self.bot_hunting_shot(game, bot, rng)?;
        }
        Ok(())
    }

    /// Continue attacking the first unsunk enemy ship with at least one
    /// recorded hit. Returns false when there is no such ship or no cell
    /// left to try around it, so the caller falls through to hunting.
    fn bot_sinking_shot(&self, game: &Game, bot: PlayerId, rng: &mut impl Rng) -> Result<bool> {
        let (target, hits) = match self.find_sinking_target(game, bot)? {
            Some(found) => found,
            None => return Ok(false),
        };
        let shots = self.store.moves_for_player(game.id, bot)?;
        let candidates = if hits.len() == 1 {
            neighbor_candidates(&shots, hits[0].x, hits[0].y)
        } else {
            extension_candidates(&shots, &hits)
        };
        let (x, y) = match choose(&candidates, rng) {
            Some(cell) => cell,
            None => return Ok(false),
        };
        debug!(
            "game {:?}: bot working layout {:?}, firing at ({}, {})",
            game.id, target.id, x, y
        );
        self.record_shot(game, bot, x, y)?;
        Ok(true)
    }

    /// The first unsunk enemy layout with at least one hit, with its hits in
    /// firing order.
    fn find_sinking_target(
        &self,
        game: &Game,
        bot: PlayerId,
    ) -> Result<Option<(Layout, Vec<Move>)>> {
        for layout in self.store.layouts_for_player(game.id, game.opponent(bot))? {
            if layout.sunk {
                continue;
            }
            let hits = self.store.moves_for_layout(layout.id)?;
            if !hits.is_empty() {
                return Ok(Some((layout, hits)));
            }
        }
        Ok(None)
    }

    /// One hunting shot with no known target.
    ///
    /// Starts from a least-shot row/column pick, then up to twice re-rolls a
    /// would-be miss (checked against the enemy board, a peek the strategy
    /// allows itself) through the spacing heuristic and back, at odds set by
    /// the bot's strength. A pick colliding with an earlier shot falls back
    /// to a uniformly random unshot cell.
    fn bot_hunting_shot(&self, game: &Game, bot: &Player, rng: &mut impl Rng) -> Result<()> {
        let shots = self.store.moves_for_player(game.id, bot.id)?;
        let enemy = self
            .store
            .layouts_for_player(game.id, game.opponent(bot.id))?;
        let (mut x, mut y) = match line_pick(&shots, rng) {
            Some(cell) => cell,
            // Board exhausted.
            None => return Ok(()),
        };
        if find_hit(&enemy, x, y).is_none() && spacing_roll(bot.strength, rng) {
            if let Some(cell) = spacing_pick(&shots, rng).or_else(|| random_unshot(&shots, rng)) {
                x = cell.0;
                y = cell.1;
            }
            if find_hit(&enemy, x, y).is_none() && spacing_roll(bot.strength, rng) {
                if let Some(cell) = line_pick(&shots, rng) {
                    x = cell.0;
                    y = cell.1;
                }
            }
        }
        if shot_at(&shots, x, y) {
            match random_unshot(&shots, rng) {
                Some(cell) => {
                    x = cell.0;
                    y = cell.1;
                }
                None => return Ok(()),
            }
        }
        self.record_shot(game, bot.id, x, y)?;
        Ok(())
    }
}

fn shot_at(shots: &[Move], x: i32, y: i32) -> bool {
    shots.iter().any(|m| m.x == x && m.y == y)
}

fn choose<T: Copy>(candidates: &[T], rng: &mut impl Rng) -> Option<T> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0, candidates.len())])
    }
}

/// The in-grid, unshot cells grid-adjacent to a lone hit.
fn neighbor_candidates(shots: &[Move], x: i32, y: i32) -> Vec<(i32, i32)> {
    let mut candidates = Vec::new();
    for &(dx, dy) in &[(-1, 0), (1, 0), (0, -1), (0, 1)] {
        let (nx, ny) = (x + dx, y + dy);
        if grid::in_grid(nx) && grid::in_grid(ny) && !shot_at(shots, nx, ny) {
            candidates.push((nx, ny));
        }
    }
    candidates
}

/// The unshot cells extending a multi-hit run one cell past its ends. The
/// axis is inferred from the first two hits; `hits` must be on one line.
fn extension_candidates(shots: &[Move], hits: &[Move]) -> Vec<(i32, i32)> {
    let mut candidates = Vec::new();
    if hits[0].x == hits[1].x {
        let x = hits[0].x;
        let min = hits.iter().map(|m| m.y).min().unwrap_or(0);
        let max = hits.iter().map(|m| m.y).max().unwrap_or(0);
        for y in grid::clamp_range(min - 1, max + 1) {
            if !shot_at(shots, x, y) {
                candidates.push((x, y));
            }
        }
    } else {
        let y = hits[0].y;
        let min = hits.iter().map(|m| m.x).min().unwrap_or(0);
        let max = hits.iter().map(|m| m.x).max().unwrap_or(0);
        for x in grid::clamp_range(min - 1, max + 1) {
            if !shot_at(shots, x, y) {
                candidates.push((x, y));
            }
        }
    }
    candidates
}

/// Shots already fired per column and per row.
fn line_counts(shots: &[Move]) -> ([u32; grid::SIZE as usize], [u32; grid::SIZE as usize]) {
    let mut cols = [0u32; grid::SIZE as usize];
    let mut rows = [0u32; grid::SIZE as usize];
    for m in shots {
        cols[m.x as usize] += 1;
        rows[m.y as usize] += 1;
    }
    (cols, rows)
}

/// Pick a random least-shot column and least-shot row and combine them. A
/// combination already shot falls back to a uniform unshot cell. `None` only
/// on a fully shot board.
fn line_pick(shots: &[Move], rng: &mut impl Rng) -> Option<(i32, i32)> {
    let (cols, rows) = line_counts(shots);
    let col_min = *cols.iter().min()?;
    let row_min = *rows.iter().min()?;
    let min_cols: Vec<i32> = (0..grid::SIZE).filter(|&i| cols[i as usize] == col_min).collect();
    let min_rows: Vec<i32> = (0..grid::SIZE).filter(|&i| rows[i as usize] == row_min).collect();
    let x = choose(&min_cols, rng)?;
    let y = choose(&min_rows, rng)?;
    if shot_at(shots, x, y) {
        random_unshot(shots, rng)
    } else {
        Some((x, y))
    }
}

/// How many of the up-to-8 neighbors of an unshot cell are also unshot.
fn spacing_score(shots: &[Move], x: i32, y: i32) -> u32 {
    let mut count = 0;
    for nx in grid::clamp_range(x - 1, x + 1) {
        for ny in grid::clamp_range(y - 1, y + 1) {
            if (nx, ny) != (x, y) && !shot_at(shots, nx, ny) {
                count += 1;
            }
        }
    }
    count
}

/// Pick uniformly among the unshot cells with the most unshot neighbors,
/// to spread hunting shots for maximum information. `None` when no unshot
/// cell has an unshot neighbor.
fn spacing_pick(shots: &[Move], rng: &mut impl Rng) -> Option<(i32, i32)> {
    let mut best: Vec<(i32, i32)> = Vec::new();
    let mut high = 0;
    for x in 0..grid::SIZE {
        for y in 0..grid::SIZE {
            if shot_at(shots, x, y) {
                continue;
            }
            let score = spacing_score(shots, x, y);
            if score == 0 {
                continue;
            }
            if score > high {
                high = score;
                best.clear();
            }
            if score == high {
                best.push((x, y));
            }
        }
    }
    choose(&best, rng)
}

/// A uniformly random unshot cell, or `None` on a fully shot board.
fn random_unshot(shots: &[Move], rng: &mut impl Rng) -> Option<(i32, i32)> {
    let mut open = Vec::new();
    for x in 0..grid::SIZE {
        for y in 0..grid::SIZE {
            if !shot_at(shots, x, y) {
                open.push((x, y));
            }
        }
    }
    choose(&open, rng)
}

/// Whether a missed hunting pick should be re-rolled through the next
/// heuristic. Odds scale with bot strength; the weakest and strongest tiers
/// never re-roll.
fn spacing_roll(strength: u8, rng: &mut impl Rng) -> bool {
    let odds = match strength {
        1 => 96,
        2 => 97,
        3 => 98,
        4 => 99,
        _ => return false,
    };
    rng.gen_range(1, 101) < odds
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::model::{GameId, GameOptions, LayoutId, PlayerId, ShipId};
    use crate::ships;
    use crate::store::{GameStore, MemoryStore};

    fn mv(x: i32, y: i32) -> Move {
        Move::new(GameId(1), PlayerId(1), x, y, None)
    }

    fn hit(x: i32, y: i32) -> Move {
        Move::new(GameId(1), PlayerId(1), x, y, Some(LayoutId(9)))
    }

    #[test]
    fn lone_hit_targets_unshot_neighbors_only() {
        // Ship runs (3,5)-(3,7) vertical; the horizontal neighbors of the
        // hit are already misses, so only the on-line cells remain.
        let shots = vec![hit(3, 5), mv(2, 5), mv(4, 5)];
        let mut candidates = neighbor_candidates(&shots, 3, 5);
        candidates.sort();
        assert_eq!(candidates, vec![(3, 4), (3, 6)]);
    }

    #[test]
    fn run_extends_one_past_each_end() {
        let shots = vec![hit(3, 5), hit(3, 6)];
        let hits = vec![hit(3, 5), hit(3, 6)];
        let mut candidates = extension_candidates(&shots, &hits);
        candidates.sort();
        assert_eq!(candidates, vec![(3, 4), (3, 7)]);

        let shots = vec![hit(0, 2), hit(1, 2), mv(2, 2)];
        let hits = vec![hit(0, 2), hit(1, 2)];
        // Left end is off-grid and the right end is shot.
        assert!(extension_candidates(&shots, &hits).is_empty());
    }

    #[test]
    fn line_pick_avoids_saturated_lines() {
        // Column 0 and row 0 fully shot; every minimum line has count 1 at
        // most, so the pick never lands on either.
        let mut shots = Vec::new();
        for i in 0..grid::SIZE {
            shots.push(mv(0, i));
            if i != 0 {
                shots.push(mv(i, 0));
            }
        }
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let (x, y) = line_pick(&shots, &mut rng).unwrap();
            assert_ne!(x, 0);
            assert_ne!(y, 0);
        }
    }

    #[test]
    fn spacing_prefers_open_space() {
        // Everything shot except a 3x3 block in the corner; its center has
        // the most unshot neighbors.
        let mut shots = Vec::new();
        for x in 0..grid::SIZE {
            for y in 0..grid::SIZE {
                if x < 3 && y < 3 {
                    continue;
                }
                shots.push(mv(x, y));
            }
        }
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(spacing_pick(&shots, &mut rng), Some((1, 1)));
        }
    }

    #[test]
    fn random_unshot_exhausts() {
        let mut shots = Vec::new();
        for x in 0..grid::SIZE {
            for y in 0..grid::SIZE {
                if (x, y) != (7, 2) {
                    shots.push(mv(x, y));
                }
            }
        }
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(random_unshot(&shots, &mut rng), Some((7, 2)));
        shots.push(mv(7, 2));
        assert_eq!(random_unshot(&shots, &mut rng), None);
        assert_eq!(line_pick(&shots, &mut rng), None);
    }

    #[test]
    fn spacing_roll_strength_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(!spacing_roll(0, &mut rng));
            assert!(!spacing_roll(5, &mut rng));
        }
    }

    #[test]
    fn bot_works_a_partially_hit_ship() {
        // Moves are append-only, so each seed gets a fresh store.
        for seed in 0..20u64 {
            let store = MemoryStore::new();
            let human = store.insert_player(crate::model::Player::new("human")).unwrap();
            let bot = store.insert_player(crate::model::Player::bot("bot", 3)).unwrap();
            let engine = Engine::new(store);
            let game = engine
                .store()
                .insert_game(Game::new(
                    human.id,
                    bot.id,
                    GameOptions::default(),
                    Utc::now(),
                ))
                .unwrap();
            // The human's destroyer at (3,5)-(3,7) vertical, hit once at
            // (3,5), with the off-line neighbors already shot.
            let layout = engine
                .store()
                .insert_layout(Layout::new(game.id, human.id, ShipId(3), 3, 5, true))
                .unwrap();
            engine
                .store()
                .insert_move(Move::new(game.id, bot.id, 3, 5, Some(layout.id)))
                .unwrap();
            engine
                .store()
                .insert_move(Move::new(game.id, bot.id, 2, 5, None))
                .unwrap();
            engine
                .store()
                .insert_move(Move::new(game.id, bot.id, 4, 5, None))
                .unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let fired = engine.bot_sinking_shot(&game, bot.id, &mut rng).unwrap();
            assert!(fired);
            let last = engine
                .store()
                .moves_for_player(game.id, bot.id)
                .unwrap()
                .into_iter()
                .last()
                .unwrap();
            assert!(
                (last.x, last.y) == (3, 4) || (last.x, last.y) == (3, 6),
                "fired at ({}, {})",
                last.x,
                last.y
            );
        }
    }

    #[test]
    fn bot_turn_fires_and_yields_turn() {
        let store = MemoryStore::new();
        let human = store.insert_player(crate::model::Player::new("human")).unwrap();
        let bot_player = store.insert_player(crate::model::Player::bot("bot", 2)).unwrap();
        let engine = Engine::new(store);
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = engine
            .create_bot_game(human.id, bot_player.id, GameOptions::default(), &mut rng)
            .unwrap();
        // Give the human a fleet so sinks resolve against real layouts.
        for (row, ship) in ships::fleet().iter().enumerate() {
            engine
                .store()
                .insert_layout(Layout::new(game.id, human.id, ship.id, 0, row as i32, false))
                .unwrap();
        }
        game.set_layed_out(human.id);
        game.turn = bot_player.id;
        engine.store().update_game(&game).unwrap();
        let bot = engine.store().player(bot_player.id).unwrap().unwrap();
        engine.bot_attack(&mut game, bot, &mut rng).unwrap();
        assert_eq!(
            engine
                .store()
                .moves_for_player(game.id, bot_player.id)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(game.turn, human.id);
        let refreshed = engine.store().player(bot_player.id).unwrap().unwrap();
        assert_eq!(refreshed.activity, bot_player.activity + 1);
    }
}

//! The `Layout` entity: one ship's placement for one player in one game.

use serde::{Deserialize, Serialize};

use crate::model::{GameId, LayoutId, PlayerId, ShipId};
use crate::ships;

/// A single ship placement. `(x, y)` is the top-left/origin cell; the ship
/// occupies `size` contiguous cells from there along the chosen axis, fully
/// inside the grid. `sunk` flips to true exactly once, when the number of
/// moves referencing the layout reaches the ship's size.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: LayoutId,
    pub game: GameId,
    pub player: PlayerId,
    pub ship: ShipId,
    pub x: i32,
    pub y: i32,
    pub vertical: bool,
    pub sunk: bool,
}

impl Layout {
    /// Create a layout. The id is assigned by the store on insert.
    pub fn new(game: GameId, player: PlayerId, ship: ShipId, x: i32, y: i32, vertical: bool) -> Self {
        Self {
            id: LayoutId(0),
            game,
            player,
            ship,
            x,
            y,
            vertical,
            sunk: false,
        }
    }

    /// Length of the placed ship. A layout referencing an unknown catalog id
    /// occupies no cells.
    pub fn size(&self) -> i32 {
        ships::get(self.ship).map_or(0, |ship| ship.size)
    }

    /// Whether this layout occupies the cell `(col, row)`.
    pub fn covers(&self, col: i32, row: i32) -> bool {
        if self.vertical {
            col == self.x && row >= self.y && row < self.y + self.size()
        } else {
            row == self.y && col >= self.x && col < self.x + self.size()
        }
    }

    /// The cells this layout occupies, origin first.
    pub fn cells(&self) -> Vec<(i32, i32)> {
        let size = self.size();
        if self.vertical {
            (self.y..self.y + size).map(|row| (self.x, row)).collect()
        } else {
            (self.x..self.x + size).map(|col| (col, self.y)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(ship: ShipId, x: i32, y: i32, vertical: bool) -> Layout {
        Layout::new(GameId(1), PlayerId(1), ship, x, y, vertical)
    }

    #[test]
    fn vertical_coverage() {
        // Destroyer, size 3, at (3,5)..(3,7).
        let l = layout(ShipId(3), 3, 5, true);
        assert!(l.covers(3, 5));
        assert!(l.covers(3, 6));
        assert!(l.covers(3, 7));
        assert!(!l.covers(3, 4));
        assert!(!l.covers(3, 8));
        assert!(!l.covers(2, 5));
        assert_eq!(l.cells(), vec![(3, 5), (3, 6), (3, 7)]);
    }

    #[test]
    fn horizontal_coverage() {
        // Patrol Boat, size 2, at (7,0)..(8,0).
        let l = layout(ShipId(5), 7, 0, false);
        assert!(l.covers(7, 0));
        assert!(l.covers(8, 0));
        assert!(!l.covers(9, 0));
        assert!(!l.covers(6, 0));
        assert!(!l.covers(7, 1));
        assert_eq!(l.cells(), vec![(7, 0), (8, 0)]);
    }

    #[test]
    fn unknown_ship_covers_nothing() {
        let l = layout(ShipId(42), 0, 0, true);
        assert_eq!(l.size(), 0);
        assert!(!l.covers(0, 0));
        assert!(l.cells().is_empty());
    }
}

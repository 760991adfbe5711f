//! The static catalog of ship kinds.
//!
//! The catalog is seeded once and never changes; its order is significant
//! because it determines the bot's placement order.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::model::ShipId;

/// One ship kind from the catalog.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct Ship {
    pub id: ShipId,
    pub name: &'static str,
    /// Number of contiguous cells the ship occupies, in `[2, 5]`.
    pub size: i32,
}

static FLEET: Lazy<Vec<Ship>> = Lazy::new(|| {
    vec![
        Ship { id: ShipId(1), name: "Carrier", size: 5 },
        Ship { id: ShipId(2), name: "Battleship", size: 4 },
        Ship { id: ShipId(3), name: "Destroyer", size: 3 },
        Ship { id: ShipId(4), name: "Submarine", size: 3 },
        Ship { id: ShipId(5), name: "Patrol Boat", size: 2 },
    ]
});

/// The five canonical ships, in catalog order.
pub fn fleet() -> &'static [Ship] {
    &FLEET
}

/// Look up a ship kind by id.
pub fn get(id: ShipId) -> Option<&'static Ship> {
    FLEET.iter().find(|ship| ship.id == id)
}

/// Look up a ship kind by its catalog name.
pub fn by_name(name: &str) -> Option<&'static Ship> {
    FLEET.iter().find(|ship| ship.name == name)
}

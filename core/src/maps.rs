//! Named maps and their waypoint lists.

use serde::{Deserialize, Serialize};

/// Identifies one of the built-in maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapId {
    /// The first campaign map.
    #[default]
    Core,
    /// The second campaign map.
    Splice,
    /// The third campaign map.
    Lattice,
}

/// Map activated on fresh installs.
pub const DEFAULT_MAP: MapId = MapId::Core;

impl MapId {
    /// Every map in display order.
    pub const ALL: [MapId; 3] = [MapId::Core, MapId::Splice, MapId::Lattice];

    /// Stable lowercase identifier used in persisted data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Splice => "splice",
            Self::Lattice => "lattice",
        }
    }

    /// Static definition of the map.
    #[must_use]
    pub const fn definition(self) -> &'static MapDefinition {
        match self {
            Self::Core => &CORE,
            Self::Splice => &SPLICE,
            Self::Lattice => &LATTICE,
        }
    }
}

/// Static description of a map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapDefinition {
    /// Identifier of the map.
    pub id: MapId,
    /// Display name.
    pub name: &'static str,
    /// Waypoints in fractional grid units; tile centres sit on `n + 0.5`.
    pub waypoints: &'static [(f32, f32)],
}

const CORE: MapDefinition = MapDefinition {
    id: MapId::Core,
    name: "Core Run",
    waypoints: &[
        (0.5, 3.5),
        (4.5, 3.5),
        (4.5, 1.5),
        (9.5, 1.5),
        (9.5, 6.5),
        (11.5, 6.5),
    ],
};

const SPLICE: MapDefinition = MapDefinition {
    id: MapId::Splice,
    name: "Splice Grid",
    waypoints: &[
        (0.5, 6.5),
        (3.5, 6.5),
        (3.5, 2.5),
        (7.5, 2.5),
        (7.5, 5.5),
        (11.5, 5.5),
    ],
};

const LATTICE: MapDefinition = MapDefinition {
    id: MapId::Lattice,
    name: "Lattice Relay",
    waypoints: &[
        (0.5, 1.5),
        (2.5, 1.5),
        (2.5, 5.5),
        (5.5, 5.5),
        (5.5, 2.5),
        (8.5, 2.5),
        (8.5, 6.5),
        (11.5, 6.5),
    ],
};

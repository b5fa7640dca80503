//! Map path resolution used by the world crate.

use std::collections::BTreeSet;

use training_defence_core::{GridCoord, MapId, WorldPoint, CELL_SIZE};

/// Walkable polyline of a map and the tiles it blocks for construction.
///
/// Waypoints are scaled from fractional grid units into world units. Tiles are
/// collected by stepping each axis independently, one tile at a time, from one
/// waypoint's tile toward the next until both coordinates match.
#[derive(Clone, Debug, PartialEq)]
pub struct MapPath {
    map: MapId,
    waypoints: Vec<WorldPoint>,
    tiles: BTreeSet<GridCoord>,
}

impl MapPath {
    /// Resolves the path of a built-in map.
    #[must_use]
    pub fn resolve(map: MapId) -> Self {
        let waypoints: Vec<WorldPoint> = map
            .definition()
            .waypoints
            .iter()
            .map(|&(x, y)| WorldPoint::new(x * CELL_SIZE, y * CELL_SIZE))
            .collect();
        let tiles = rasterize(&waypoints);
        Self {
            map,
            waypoints,
            tiles,
        }
    }

    /// Map the path belongs to.
    #[must_use]
    pub const fn map(&self) -> MapId {
        self.map
    }

    /// Waypoints in world units, entry first.
    #[must_use]
    pub fn waypoints(&self) -> &[WorldPoint] {
        &self.waypoints
    }

    /// Entry point where enemies appear.
    #[must_use]
    pub fn start(&self) -> WorldPoint {
        self.waypoints.first().copied().unwrap_or_default()
    }

    /// Tiles traversed by the path, ordered by column and then by row.
    pub fn tiles(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.tiles.iter().copied()
    }

    /// Reports whether the tile is part of the path.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        self.tiles.contains(&cell)
    }
}

fn tile_of(point: WorldPoint) -> (i64, i64) {
    (
        (point.x / CELL_SIZE - 0.5).round() as i64,
        (point.y / CELL_SIZE - 0.5).round() as i64,
    )
}

fn rasterize(waypoints: &[WorldPoint]) -> BTreeSet<GridCoord> {
    let mut tiles = BTreeSet::new();
    let mut insert = |column: i64, row: i64| {
        if let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) {
            let _ = tiles.insert(GridCoord::new(column, row));
        }
    };

    for segment in waypoints.windows(2) {
        let (mut x, mut y) = tile_of(segment[0]);
        let (target_x, target_y) = tile_of(segment[1]);
        let step_x = (target_x - x).signum();
        let step_y = (target_y - y).signum();
        insert(x, y);
        while x != target_x || y != target_y {
            if x != target_x {
                x += step_x;
            }
            if y != target_y {
                y += step_y;
            }
            insert(x, y);
        }
    }

    tiles
}

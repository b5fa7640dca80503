//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use training_defence_core::{
    BranchId, GridCoord, TowerId, TowerKind, TowerRecord, TowerSnapshot, TowerStats,
};

/// State of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Tile occupied by the tower.
    pub(crate) cell: GridCoord,
    /// Current level, 1 through 3.
    pub(crate) level: u8,
    /// Branch fixed at the first upgrade.
    pub(crate) branch: Option<BranchId>,
    /// Seconds until the tower may fire again.
    pub(crate) cooldown: f32,
}

impl TowerState {
    pub(crate) fn stats(&self) -> TowerStats {
        TowerStats::resolve(self.kind, self.level, self.branch)
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            position: self.cell.center(),
            level: self.level,
            branch: self.branch,
            cooldown: self.cooldown,
            stats: self.stats(),
        }
    }

    pub(crate) fn record(&self) -> TowerRecord {
        TowerRecord {
            kind: self.kind,
            grid_x: self.cell.column(),
            grid_y: self.cell.row(),
            level: self.level,
            cooldown: self.cooldown,
            path: self.branch,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a new level-1 tower and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, cell: GridCoord) -> TowerId {
        self.insert_record(kind, cell, 1, None, 0.0)
    }

    /// Stores a tower with explicit progression state.
    pub(crate) fn insert_record(
        &mut self,
        kind: TowerKind,
        cell: GridCoord,
        level: u8,
        branch: Option<BranchId>,
        cooldown: f32,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                cell,
                level,
                branch,
                cooldown,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    /// Finds the tower occupying the provided tile.
    pub(crate) fn find_at(&self, cell: GridCoord) -> Option<&TowerState> {
        self.entries.values().find(|tower| tower.cell == cell)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = TowerRegistry::new();
        assert!(registry.entries.is_empty());
        assert_eq!(registry.next_tower_id.get(), 0);
    }

    #[test]
    fn identifiers_are_never_reused_after_removal() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(TowerKind::Pulse, GridCoord::new(1, 1));
        assert!(registry.remove(first).is_some());
        let second = registry.insert(TowerKind::Arc, GridCoord::new(1, 1));
        assert_ne!(first, second);
        assert_eq!(registry.entries.len(), 1);
    }

    #[test]
    fn lookup_by_cell_finds_the_occupant() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Snare, GridCoord::new(6, 4));
        assert_eq!(registry.find_at(GridCoord::new(6, 4)).map(|t| t.id), Some(id));
        assert!(registry.find_at(GridCoord::new(4, 6)).is_none());
    }

    #[test]
    fn record_mirrors_tower_state() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert_record(
            TowerKind::Pulse,
            GridCoord::new(2, 5),
            2,
            Some(BranchId::Inferno),
            0.25,
        );
        let record = registry.get(id).map(TowerState::record);
        assert_eq!(
            record,
            Some(TowerRecord {
                kind: TowerKind::Pulse,
                grid_x: 2,
                grid_y: 5,
                level: 2,
                cooldown: 0.25,
                path: Some(BranchId::Inferno),
            })
        );
    }
}

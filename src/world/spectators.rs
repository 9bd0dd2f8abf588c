use crate::entities::creature::{CreatureId, CreatureRegistry};
use crate::world::map::SectorCoord;
use crate::world::position::Position;
use crate::world::viewport::{observer_floors, Viewport, ViewportSize};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Answers "who can perceive this tile" from a per-sector creature index.
///
/// Results are cached per position; the cache is only valid while no
/// creature enters or leaves a tile, so every such change must call
/// `clear_cache` first.
pub struct SpectatorIndex {
    viewport: ViewportSize,
    sectors: HashMap<SectorCoord, Vec<CreatureId>>,
    len: usize,
    cache: LruCache<Position, Vec<CreatureId>>,
}

impl SpectatorIndex {
    pub fn new(viewport: ViewportSize, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            viewport,
            sectors: HashMap::new(),
            len: 0,
            cache: LruCache::new(capacity),
        }
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cached_positions(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn insert(&mut self, id: CreatureId, position: Position) {
        self.sectors
            .entry(SectorCoord::of(position))
            .or_default()
            .push(id);
        self.len = self.len.saturating_add(1);
        self.cache.clear();
    }

    pub fn remove(&mut self, id: CreatureId, position: Position) {
        let sector = SectorCoord::of(position);
        if let Some(ids) = self.sectors.get_mut(&sector) {
            if let Some(index) = ids.iter().position(|entry| *entry == id) {
                ids.swap_remove(index);
                self.len = self.len.saturating_sub(1);
            }
            if ids.is_empty() {
                self.sectors.remove(&sector);
            }
        }
        self.cache.clear();
    }

    /// Moves `id` between sectors when the step crosses a sector border.
    /// Returns whether the sector changed.
    pub fn relocate(&mut self, id: CreatureId, from: Position, to: Position) -> bool {
        if SectorCoord::of(from) == SectorCoord::of(to) {
            self.cache.clear();
            return false;
        }
        self.remove(id, from);
        self.insert(id, to);
        true
    }

    /// Every creature that perceives `position`, ordered by id.
    pub fn observers_at(
        &mut self,
        position: Position,
        creatures: &CreatureRegistry,
    ) -> Vec<CreatureId> {
        if let Some(cached) = self.cache.get(&position) {
            return cached.clone();
        }
        let observers = self.collect(position, creatures);
        self.cache.put(position, observers.clone());
        observers
    }

    /// Union of the observers of both ends of a move, origin observers first,
    /// each group ordered by id.
    pub fn observers_of_move(
        &mut self,
        from: Position,
        to: Position,
        creatures: &CreatureRegistry,
    ) -> Vec<CreatureId> {
        let mut observers = self.observers_at(from, creatures);
        for id in self.observers_at(to, creatures) {
            if !observers.contains(&id) {
                observers.push(id);
            }
        }
        observers
    }

    fn collect(&self, position: Position, creatures: &CreatureRegistry) -> Vec<CreatureId> {
        let viewport = Viewport::from_center(position, self.viewport);
        let min = SectorCoord::of(viewport.min);
        let max = SectorCoord::of(viewport.max);

        let mut observers = Vec::new();
        for z in observer_floors(position.z) {
            for sector_x in min.x..=max.x {
                for sector_y in min.y..=max.y {
                    let sector = SectorCoord {
                        x: sector_x,
                        y: sector_y,
                        z,
                    };
                    let Some(ids) = self.sectors.get(&sector) else {
                        continue;
                    };
                    for id in ids {
                        let perceives = creatures
                            .get(*id)
                            .and_then(|creature| creature.position)
                            .map_or(false, |at| viewport.perceived_from(at));
                        if perceives {
                            observers.push(*id);
                        }
                    }
                }
            }
        }
        observers.sort();
        observers.dedup();
        observers
    }
}

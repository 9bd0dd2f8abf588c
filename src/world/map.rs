use crate::world::position::Position;
use crate::world::tile::Tile;
use crate::world::zones::ZoneConfig;
use std::collections::HashMap;

const SECTOR_TILE_SIZE: u16 = 32;

/// A 32x32 block of tiles on one floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorCoord {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl SectorCoord {
    pub fn of(position: Position) -> Self {
        Self {
            x: position.x / SECTOR_TILE_SIZE,
            y: position.y / SECTOR_TILE_SIZE,
            z: position.z,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Map {
    pub name: String,
    pub tiles: HashMap<Position, Tile>,
}

impl Map {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tiles: HashMap::new(),
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn has_tile(&self, position: Position) -> bool {
        self.tiles.contains_key(&position)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(&position)
    }

    /// Creates the tile on first reference.
    pub fn tile_or_insert(&mut self, position: Position) -> &mut Tile {
        self.tiles
            .entry(position)
            .or_insert_with(|| Tile::new(position))
    }

    pub fn insert_tile(&mut self, tile: Tile) -> Option<Tile> {
        self.tiles.insert(tile.position, tile)
    }

    pub fn sector_for_position(&self, position: Position) -> SectorCoord {
        SectorCoord::of(position)
    }

    /// Stamps configured zones onto existing tiles. Returns how many tiles
    /// received at least one zone.
    pub fn apply_zones(&mut self, config: &ZoneConfig) -> usize {
        let mut stamped = 0;
        for tile in self.tiles.values_mut() {
            let mut touched = false;
            for kind in config.kinds_at(tile.position) {
                tile.zone.set(kind);
                touched = true;
            }
            if touched {
                stamped += 1;
            }
        }
        stamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile_flags::ZoneKind;
    use crate::world::zones::ZoneArea;

    #[test]
    fn sectors_are_32_tiles_wide() {
        let map = Map::default();
        let sector = map.sector_for_position(Position::new(95, 32, 7));
        assert_eq!(sector, SectorCoord { x: 2, y: 1, z: 7 });
        assert_eq!(
            SectorCoord::of(Position::new(96, 31, 8)),
            SectorCoord { x: 3, y: 0, z: 8 }
        );
    }

    #[test]
    fn tiles_are_created_on_first_reference() {
        let mut map = Map::new("test");
        let position = Position::new(10, 10, 7);
        assert!(map.tile(position).is_none());
        map.tile_or_insert(position);
        assert!(map.has_tile(position));
        assert_eq!(map.tile_count(), 1);
    }

    #[test]
    fn zones_stamp_existing_tiles_only() {
        let mut map = Map::new("test");
        map.tile_or_insert(Position::new(10, 10, 7));
        map.tile_or_insert(Position::new(30, 30, 7));
        let config = ZoneConfig {
            zones: vec![ZoneArea::new(
                "temple",
                ZoneKind::ProtectionZone,
                Position::new(5, 5, 7),
                Position::new(15, 15, 7),
            )],
        };
        assert_eq!(map.apply_zones(&config), 1);
        let inside = map.tile(Position::new(10, 10, 7)).expect("tile");
        assert!(inside.has_zone(ZoneKind::ProtectionZone));
        let outside = map.tile(Position::new(30, 30, 7)).expect("tile");
        assert!(!outside.has_zone(ZoneKind::ProtectionZone));
        assert!(map.tile(Position::new(12, 12, 7)).is_none());
    }
}

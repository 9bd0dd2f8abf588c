use crate::world::position::{Position, SURFACE_FLOOR};
use std::ops::RangeInclusive;

/// Deepest floor of the map.
pub const MAX_FLOOR: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u16,
    pub height: u16,
}

impl Default for ViewportSize {
    fn default() -> Self {
        // Classic clients show an 18x14 tile viewport.
        Self { width: 18, height: 14 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub center: Position,
    pub min: Position,
    pub max: Position,
    pub size: ViewportSize,
}

impl Viewport {
    pub fn from_center(center: Position, size: ViewportSize) -> Self {
        let half_left = size.width / 2;
        let half_right = size.width.saturating_sub(half_left + 1);
        let half_up = size.height / 2;
        let half_down = size.height.saturating_sub(half_up + 1);

        let min = Position {
            x: center.x.saturating_sub(half_left),
            y: center.y.saturating_sub(half_up),
            z: center.z,
        };
        let max = Position {
            x: center.x.saturating_add(half_right),
            y: center.y.saturating_add(half_down),
            z: center.z,
        };

        Self {
            center,
            min,
            max,
            size,
        }
    }

    /// Same-floor containment.
    pub fn contains(&self, position: Position) -> bool {
        position.z == self.center.z && self.contains_column(position)
    }

    pub fn contains_column(&self, position: Position) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
    }

    /// Whether a creature standing at `observer` perceives the center tile.
    pub fn perceived_from(&self, observer: Position) -> bool {
        observer_floors(self.center.z).contains(&observer.z) && self.contains_column(observer)
    }
}

/// Floors from which a tile on floor `z` can be perceived. The surface is
/// visible from every surface floor; underground only two floors each way.
pub fn observer_floors(z: u8) -> RangeInclusive<u8> {
    if z > SURFACE_FLOOR {
        z.saturating_sub(2)..=z.saturating_add(2).min(MAX_FLOOR)
    } else if z == SURFACE_FLOOR {
        0..=SURFACE_FLOOR + 2
    } else if z == SURFACE_FLOOR - 1 {
        0..=SURFACE_FLOOR + 1
    } else {
        0..=SURFACE_FLOOR
    }
}

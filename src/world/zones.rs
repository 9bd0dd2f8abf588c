use crate::world::position::Position;
use crate::world::tile_flags::ZoneKind;
use serde::Deserialize;
use std::path::Path;

/// A rectangular box of tiles sharing one zone property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneArea {
    #[serde(default)]
    pub name: String,
    pub kind: ZoneKind,
    pub x1: u16,
    pub y1: u16,
    pub z1: u8,
    pub x2: u16,
    pub y2: u16,
    pub z2: u8,
}

impl ZoneArea {
    pub fn new(
        name: impl Into<String>,
        kind: ZoneKind,
        from: Position,
        to: Position,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            x1: from.x.min(to.x),
            y1: from.y.min(to.y),
            z1: from.z.min(to.z),
            x2: from.x.max(to.x),
            y2: from.y.max(to.y),
            z2: from.z.max(to.z),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        let (x1, x2) = (self.x1.min(self.x2), self.x1.max(self.x2));
        let (y1, y2) = (self.y1.min(self.y2), self.y1.max(self.y2));
        let (z1, z2) = (self.z1.min(self.z2), self.z1.max(self.z2));

        (x1..=x2).contains(&position.x)
            && (y1..=y2).contains(&position.y)
            && (z1..=z2).contains(&position.z)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub zones: Vec<ZoneArea>,
}

impl ZoneConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read zone config {}: {}", path.display(), err))?;
        Self::parse(&content).map_err(|err| format!("zone config {}: {}", path.display(), err))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|err| format!("invalid yaml: {}", err))
    }

    /// Zone kinds covering `position`, in config order.
    pub fn kinds_at(&self, position: Position) -> impl Iterator<Item = ZoneKind> + '_ {
        self.zones
            .iter()
            .filter(move |zone| zone.contains(position))
            .map(|zone| zone.kind)
    }
}

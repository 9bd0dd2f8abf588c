use crate::combat::damage::DamageType;
use crate::entities::item::ItemTypeId;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Behaviour an item type adds on top of its plain capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRole {
    Teleport,
    MagicField,
    TrashHolder,
    Mailbox,
    Bed,
    Splash,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FloorChange {
    pub down: bool,
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl FloorChange {
    pub fn any(&self) -> bool {
        self.down || self.north || self.south || self.east || self.west
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemType {
    pub id: ItemTypeId,
    pub name: String,
    pub ground: bool,
    pub always_on_top: bool,
    /// Rank among always-on-top items; lower ranks sit closer to the ground.
    pub top_order: u8,
    pub hangable: bool,
    pub horizontal: bool,
    pub vertical: bool,
    pub block_solid: bool,
    pub block_projectile: bool,
    pub block_path: bool,
    pub moveable: bool,
    pub pickupable: bool,
    pub allow_pickupable: bool,
    pub stackable: bool,
    pub has_height: bool,
    pub look_through: bool,
    pub mailable: bool,
    pub floor_change: FloorChange,
    pub role: Option<ItemRole>,
    pub field_damage: Option<DamageType>,
    pub replaceable: bool,
}

impl ItemType {
    pub fn is_role(&self, role: ItemRole) -> bool {
        self.role == Some(role)
    }

    pub fn is_magic_field(&self) -> bool {
        self.is_role(ItemRole::MagicField)
    }

    pub fn is_splash(&self) -> bool {
        self.is_role(ItemRole::Splash)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ItemTypeIndex {
    types: HashMap<ItemTypeId, ItemType>,
    unknown: ItemType,
}

impl ItemTypeIndex {
    pub fn get(&self, id: ItemTypeId) -> Option<&ItemType> {
        self.types.get(&id)
    }

    /// Like `get`, but unknown ids resolve to a type with every flag unset.
    pub fn lookup(&self, id: ItemTypeId) -> &ItemType {
        self.types.get(&id).unwrap_or(&self.unknown)
    }

    pub fn insert(&mut self, item: ItemType) -> Result<(), String> {
        if self.types.contains_key(&item.id) {
            return Err(format!("item type {:?} already exists", item.id));
        }
        self.types.insert(item.id, item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read item catalog {}: {}", path.display(), err))?;
        Self::parse(&content)
            .map_err(|err| format!("item catalog {}: {}", path.display(), err))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let entries: Vec<ItemType> =
            serde_yaml::from_str(content).map_err(|err| format!("invalid yaml: {}", err))?;
        let mut index = ItemTypeIndex::default();
        for entry in entries {
            if entry.is_magic_field() && entry.field_damage.is_none() {
                return Err(format!("magic field {:?} has no field_damage", entry.id));
            }
            index.insert(entry)?;
        }
        Ok(index)
    }
}

use crate::world::position::Position;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

static NEXT_ITEM_ID: AtomicU32 = AtomicU32::new(1);

impl ItemId {
    pub fn next() -> Self {
        let id = NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed);
        ItemId(id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(pub u16);

/// A single item instance. Its capabilities live on the shared `ItemType`
/// looked up through `type_id`; the instance only carries what varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub type_id: ItemTypeId,
    /// Stack size for stackables, fluid/charge subtype otherwise.
    pub count: u16,
    pub unique_id: Option<u16>,
    pub teleport_destination: Option<Position>,
}

/// Copy of the parts of an item that outlive it in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemView {
    pub id: ItemId,
    pub type_id: ItemTypeId,
    pub count: u16,
}

impl Item {
    pub fn new(type_id: ItemTypeId, count: u16) -> Self {
        Self {
            id: ItemId::next(),
            type_id,
            count,
            unique_id: None,
            teleport_destination: None,
        }
    }

    pub fn with_unique_id(mut self, unique_id: u16) -> Self {
        self.unique_id = Some(unique_id);
        self
    }

    pub fn with_teleport_destination(mut self, destination: Position) -> Self {
        self.teleport_destination = Some(destination);
        self
    }

    pub fn has_unique_id(&self) -> bool {
        self.unique_id.map_or(false, |value| value != 0)
    }

    /// Takes `count` units off this stack into a fresh item with its own id.
    pub fn split(&mut self, count: u16) -> Item {
        let count = count.min(self.count);
        self.count -= count;
        Item {
            id: ItemId::next(),
            type_id: self.type_id,
            count,
            unique_id: None,
            teleport_destination: self.teleport_destination,
        }
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id,
            type_id: self.type_id,
            count: self.count,
        }
    }
}

use crate::entities::creature::CreatureId;
use crate::entities::item::{Item, ItemId};

/// Something that can be put on a tile. Items travel by value; creatures live
/// in the registry and only their id moves between tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thing {
    Item(Item),
    Creature(CreatureId),
}

/// Identity of a thing on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThingKey {
    Item(ItemId),
    Creature(CreatureId),
}

/// Borrowed view of a thing, used by queries that must not take ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingRef<'a> {
    Item(&'a Item),
    Creature(CreatureId),
}

impl Thing {
    pub fn key(&self) -> ThingKey {
        match self {
            Thing::Item(item) => ThingKey::Item(item.id),
            Thing::Creature(id) => ThingKey::Creature(*id),
        }
    }

    pub fn as_ref(&self) -> ThingRef<'_> {
        match self {
            Thing::Item(item) => ThingRef::Item(item),
            Thing::Creature(id) => ThingRef::Creature(*id),
        }
    }
}

impl ThingRef<'_> {
    pub fn key(&self) -> ThingKey {
        match self {
            ThingRef::Item(item) => ThingKey::Item(item.id),
            ThingRef::Creature(id) => ThingKey::Creature(*id),
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match self {
            ThingRef::Item(item) => Some(item),
            ThingRef::Creature(_) => None,
        }
    }
}

impl From<Item> for Thing {
    fn from(item: Item) -> Self {
        Thing::Item(item)
    }
}

impl From<CreatureId> for Thing {
    fn from(id: CreatureId) -> Self {
        Thing::Creature(id)
    }
}

use crate::entities::creature::{Creature, CreatureId, CreatureRegistry};
use crate::entities::item::{Item, ItemId, ItemTypeId, ItemView};
use crate::entities::thing::{Thing, ThingKey, ThingRef};
use crate::world::item_types::{ItemRole, ItemType, ItemTypeIndex};
use crate::world::position::Position;
use crate::world::tile_flags::{TileFlags, ZoneFlags, ZoneKind};
use std::collections::VecDeque;

/// Combined limit on top and down items held by one tile.
pub const MAX_TILE_ITEMS: usize = 0xFFFF;

/// The layer an item type is stored in. Top items carry their rank so a
/// swap in place cannot break the rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layer {
    Ground,
    Top(u8),
    Down,
}

impl Layer {
    pub(crate) fn of(item_type: &ItemType) -> Self {
        if item_type.ground {
            Layer::Ground
        } else if item_type.always_on_top {
            Layer::Top(item_type.top_order)
        } else {
            Layer::Down
        }
    }
}

/// One map coordinate and everything standing on it.
///
/// Things are numbered by a single flat index in layer order: ground, top
/// items (ascending rank), creatures (newest first), down items (newest
/// first). The layers are private so that every mutation goes through a
/// primitive that keeps `flags` in step with the items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    pub zone: ZoneFlags,
    ground: Option<Item>,
    top_items: Vec<Item>,
    creatures: VecDeque<CreatureId>,
    down_items: VecDeque<Item>,
    flags: TileFlags,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            zone: ZoneFlags::NONE,
            ground: None,
            top_items: Vec::new(),
            creatures: VecDeque::new(),
            down_items: VecDeque::new(),
            flags: TileFlags::NONE,
        }
    }

    pub fn with_zone(mut self, kind: ZoneKind) -> Self {
        self.zone.set(kind);
        self
    }

    pub fn ground(&self) -> Option<&Item> {
        self.ground.as_ref()
    }

    pub fn top_items(&self) -> &[Item] {
        &self.top_items
    }

    pub fn creatures(&self) -> impl Iterator<Item = CreatureId> + '_ {
        self.creatures.iter().copied()
    }

    pub fn down_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.down_items.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.ground
            .iter()
            .chain(self.top_items.iter())
            .chain(self.down_items.iter())
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items().find(|item| item.id == id)
    }

    pub fn flags(&self) -> TileFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: TileFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn has_zone(&self, kind: ZoneKind) -> bool {
        self.zone.has(kind)
    }

    pub fn floor_change(&self) -> bool {
        self.has_flag(TileFlags::FLOOR_CHANGE)
    }

    /// Tiles that send whatever enters them somewhere else.
    pub fn position_change(&self) -> bool {
        self.has_flag(TileFlags::TELEPORT)
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    pub fn top_item_count(&self) -> usize {
        self.top_items.len()
    }

    pub fn down_item_count(&self) -> usize {
        self.down_items.len()
    }

    pub fn item_count(&self) -> usize {
        self.top_items.len() + self.down_items.len()
    }

    pub fn thing_count(&self) -> usize {
        self.ground_offset() + self.item_count() + self.creatures.len()
    }

    pub fn contains_creature(&self, id: CreatureId) -> bool {
        self.creatures.contains(&id)
    }

    pub fn has_visible_creature(&self, creatures: &CreatureRegistry) -> bool {
        self.creatures.iter().any(|id| creatures.is_visible(*id))
    }

    fn ground_offset(&self) -> usize {
        usize::from(self.ground.is_some())
    }

    pub fn index_of(&self, key: ThingKey) -> Option<usize> {
        let mut base = self.ground_offset();
        match key {
            ThingKey::Item(id) => {
                if self.ground.as_ref().map_or(false, |ground| ground.id == id) {
                    return Some(0);
                }
                if let Some(slot) = self.top_items.iter().position(|item| item.id == id) {
                    return Some(base + slot);
                }
                base += self.top_items.len() + self.creatures.len();
                self.down_items
                    .iter()
                    .position(|item| item.id == id)
                    .map(|slot| base + slot)
            }
            ThingKey::Creature(id) => {
                base += self.top_items.len();
                self.creatures
                    .iter()
                    .position(|creature| *creature == id)
                    .map(|slot| base + slot)
            }
        }
    }

    pub fn thing_at(&self, index: usize) -> Option<ThingRef<'_>> {
        let mut index = index;
        if let Some(ground) = &self.ground {
            if index == 0 {
                return Some(ThingRef::Item(ground));
            }
            index -= 1;
        }
        if let Some(item) = self.top_items.get(index) {
            return Some(ThingRef::Item(item));
        }
        index -= self.top_items.len();
        if let Some(id) = self.creatures.get(index) {
            return Some(ThingRef::Creature(*id));
        }
        index -= self.creatures.len();
        self.down_items.get(index).map(ThingRef::Item)
    }

    /// Flat index as `viewer` perceives it: creatures the viewer cannot see
    /// take no slot, except `key` itself.
    pub fn client_index_of(
        &self,
        viewer: &Creature,
        key: ThingKey,
        creatures: &CreatureRegistry,
    ) -> Option<usize> {
        let seen = |id: CreatureId| {
            ThingKey::Creature(id) == key
                || creatures
                    .get(id)
                    .map_or(true, |creature| viewer.can_see(creature))
        };

        let mut base = self.ground_offset();
        match key {
            ThingKey::Item(id) => {
                if self.ground.as_ref().map_or(false, |ground| ground.id == id) {
                    return Some(0);
                }
                if let Some(slot) = self.top_items.iter().position(|item| item.id == id) {
                    return Some(base + slot);
                }
                base += self.top_items.len();
                base += self.creatures.iter().filter(|id| seen(**id)).count();
                self.down_items
                    .iter()
                    .position(|item| item.id == id)
                    .map(|slot| base + slot)
            }
            ThingKey::Creature(target) => {
                base += self.top_items.len();
                for id in &self.creatures {
                    if *id == target {
                        return Some(base);
                    }
                    if seen(*id) {
                        base += 1;
                    }
                }
                None
            }
        }
    }

    /// True once exactly `n` items with height have been stacked.
    pub fn has_height(&self, n: usize, types: &ItemTypeIndex) -> bool {
        let mut height = 0;
        if let Some(ground) = &self.ground {
            if types.lookup(ground.type_id).has_height {
                height += 1;
            }
            if height == n {
                return true;
            }
        }
        for item in self.down_items.iter().chain(self.top_items.iter()) {
            if types.lookup(item.type_id).has_height {
                height += 1;
            }
            if height == n {
                return true;
            }
        }
        false
    }

    pub fn top_creature(&self) -> Option<CreatureId> {
        self.creatures.front().copied()
    }

    pub fn top_down_item(&self) -> Option<&Item> {
        self.down_items.front()
    }

    pub fn top_top_item(&self) -> Option<&Item> {
        self.top_items.last()
    }

    pub fn item_by_top_order(&self, rank: u8, types: &ItemTypeIndex) -> Option<&Item> {
        self.top_items
            .iter()
            .rev()
            .find(|item| types.lookup(item.type_id).top_order == rank)
    }

    pub fn top_visible_creature(
        &self,
        viewer: &Creature,
        creatures: &CreatureRegistry,
    ) -> Option<CreatureId> {
        self.creatures.iter().copied().find(|id| {
            creatures
                .get(*id)
                .map_or(false, |creature| viewer.can_see(creature))
        })
    }

    /// What `viewer` sees when looking at the tile.
    pub fn top_visible_thing(
        &self,
        viewer: &Creature,
        creatures: &CreatureRegistry,
        types: &ItemTypeIndex,
    ) -> Option<ThingRef<'_>> {
        if let Some(id) = self.top_visible_creature(viewer, creatures) {
            return Some(ThingRef::Creature(id));
        }
        let opaque = |item: &&Item| !types.lookup(item.type_id).look_through;
        if let Some(item) = self.down_items.iter().find(opaque) {
            return Some(ThingRef::Item(item));
        }
        if let Some(item) = self.top_items.iter().rev().find(opaque) {
            return Some(ThingRef::Item(item));
        }
        self.ground.as_ref().map(ThingRef::Item)
    }

    /// Units of `type_id` on the tile, optionally restricted to one subtype.
    pub fn item_type_count(
        &self,
        type_id: ItemTypeId,
        subtype: Option<u16>,
        types: &ItemTypeIndex,
    ) -> usize {
        self.items()
            .filter(|item| item.type_id == type_id)
            .filter(|item| subtype.map_or(true, |value| value == item.count))
            .map(|item| {
                if types.lookup(item.type_id).stackable {
                    usize::from(item.count)
                } else {
                    1
                }
            })
            .sum()
    }

    fn find_role(
        &self,
        role: ItemRole,
        flag: TileFlags,
        include_ground: bool,
        types: &ItemTypeIndex,
    ) -> Option<&Item> {
        if !self.has_flag(flag) {
            return None;
        }
        let has_role = |item: &&Item| types.lookup(item.type_id).is_role(role);
        if include_ground {
            if let Some(ground) = self.ground.as_ref().filter(has_role) {
                return Some(ground);
            }
        }
        self.top_items
            .iter()
            .rev()
            .chain(self.down_items.iter().rev())
            .find(has_role)
    }

    pub fn teleport_item(&self, types: &ItemTypeIndex) -> Option<&Item> {
        self.find_role(ItemRole::Teleport, TileFlags::TELEPORT, false, types)
    }

    pub fn field_item(&self, types: &ItemTypeIndex) -> Option<&Item> {
        self.find_role(ItemRole::MagicField, TileFlags::MAGIC_FIELD, true, types)
    }

    pub fn trash_holder(&self, types: &ItemTypeIndex) -> Option<&Item> {
        self.find_role(ItemRole::TrashHolder, TileFlags::TRASH_HOLDER, true, types)
    }

    pub fn mailbox(&self, types: &ItemTypeIndex) -> Option<&Item> {
        self.find_role(ItemRole::Mailbox, TileFlags::MAILBOX, true, types)
    }

    pub fn bed_item(&self, types: &ItemTypeIndex) -> Option<&Item> {
        self.find_role(ItemRole::Bed, TileFlags::BED, true, types)
    }

    pub fn splash_item(&self, types: &ItemTypeIndex) -> Option<&Item> {
        self.top_items
            .iter()
            .find(|item| types.lookup(item.type_id).is_splash())
    }

    /// From-scratch flag summary; `flags()` must always equal this.
    pub fn recompute_flags(&self, types: &ItemTypeIndex) -> TileFlags {
        TileFlags::compute(self.items().map(|item| types.lookup(item.type_id)))
    }

    fn apply_flags(&mut self, contribution: TileFlags) {
        self.flags.insert(contribution);
    }

    fn retract_flags(&mut self, contribution: TileFlags, types: &ItemTypeIndex) {
        let stale: Vec<TileFlags> = contribution
            .bits()
            .filter(|bit| {
                !self
                    .items()
                    .any(|item| TileFlags::of_item(types.lookup(item.type_id)).contains(*bit))
            })
            .collect();
        for bit in stale {
            self.flags.remove(bit);
        }
    }

    pub(crate) fn set_ground(&mut self, item: Item, types: &ItemTypeIndex) -> Option<Item> {
        let contribution = TileFlags::of_item(types.lookup(item.type_id));
        let old = self.ground.replace(item);
        if let Some(old) = &old {
            self.retract_flags(TileFlags::of_item(types.lookup(old.type_id)), types);
        }
        self.apply_flags(contribution);
        old
    }

    /// Inserts an always-on-top item before the first item of equal or
    /// higher rank. Returns the flat index, or the item back when full.
    pub(crate) fn insert_top(&mut self, item: Item, types: &ItemTypeIndex) -> Result<usize, Item> {
        if self.item_count() >= MAX_TILE_ITEMS {
            return Err(item);
        }
        let item_type = types.lookup(item.type_id);
        let rank = item_type.top_order;
        let contribution = TileFlags::of_item(item_type);
        let slot = self
            .top_items
            .iter()
            .position(|existing| rank <= types.lookup(existing.type_id).top_order)
            .unwrap_or(self.top_items.len());
        self.top_items.insert(slot, item);
        self.apply_flags(contribution);
        Ok(self.ground_offset() + slot)
    }

    pub(crate) fn insert_down(&mut self, item: Item, types: &ItemTypeIndex) -> Result<usize, Item> {
        if self.item_count() >= MAX_TILE_ITEMS {
            return Err(item);
        }
        let contribution = TileFlags::of_item(types.lookup(item.type_id));
        self.down_items.push_front(item);
        self.apply_flags(contribution);
        Ok(self.ground_offset() + self.top_items.len() + self.creatures.len())
    }

    pub(crate) fn insert_creature(&mut self, id: CreatureId) -> usize {
        self.creatures.push_front(id);
        self.ground_offset() + self.top_items.len()
    }

    pub(crate) fn take_item(&mut self, id: ItemId, types: &ItemTypeIndex) -> Option<(usize, Item)> {
        let index = self.index_of(ThingKey::Item(id))?;
        let item = if self.ground.as_ref().map_or(false, |ground| ground.id == id) {
            self.ground.take()
        } else if let Some(slot) = self.top_items.iter().position(|item| item.id == id) {
            Some(self.top_items.remove(slot))
        } else {
            self.down_items
                .iter()
                .position(|item| item.id == id)
                .and_then(|slot| self.down_items.remove(slot))
        }?;
        self.retract_flags(TileFlags::of_item(types.lookup(item.type_id)), types);
        Some((index, item))
    }

    pub(crate) fn take_creature(&mut self, id: CreatureId) -> Option<usize> {
        let index = self.index_of(ThingKey::Creature(id))?;
        let slot = self.creatures.iter().position(|creature| *creature == id)?;
        self.creatures.remove(slot);
        Some(index)
    }

    pub(crate) fn split_item(&mut self, id: ItemId, count: u16) -> Option<(usize, ItemView, Item)> {
        let index = self.index_of(ThingKey::Item(id))?;
        let item = self.item_mut(id)?;
        let before = item.view();
        Some((index, before, item.split(count)))
    }

    /// Changes an item's type and count in place. The new type must belong
    /// to the same layer as the old one.
    pub(crate) fn retype_item(
        &mut self,
        id: ItemId,
        type_id: ItemTypeId,
        count: u16,
        types: &ItemTypeIndex,
    ) -> Result<(usize, ItemView, ItemView), String> {
        let index = self
            .index_of(ThingKey::Item(id))
            .ok_or_else(|| format!("item {} is not on tile {}", id.0, self.position))?;
        let old_type = self
            .item(id)
            .map(|item| item.type_id)
            .ok_or_else(|| format!("item {} is not on tile {}", id.0, self.position))?;
        let (from, to) = (Layer::of(types.lookup(old_type)), Layer::of(types.lookup(type_id)));
        if from != to {
            return Err(format!(
                "item {} cannot become type {}: {:?} item into {:?} slot",
                id.0, type_id.0, to, from
            ));
        }
        let Some(item) = self.item_mut(id) else {
            return Err(format!("item {} is not on tile {}", id.0, self.position));
        };
        let before = item.view();
        item.type_id = type_id;
        item.count = count;
        let after = item.view();
        self.retract_flags(TileFlags::of_item(types.lookup(before.type_id)), types);
        self.apply_flags(TileFlags::of_item(types.lookup(type_id)));
        Ok((index, before, after))
    }

    /// Swaps the item at a flat index. Creature slots, out-of-range indices
    /// and items of another layer hand `item` back untouched.
    pub(crate) fn replace_at(
        &mut self,
        index: usize,
        item: Item,
        types: &ItemTypeIndex,
    ) -> Result<Item, Item> {
        let item_type = types.lookup(item.type_id);
        let contribution = TileFlags::of_item(item_type);
        let Some(slot) = self.slot_mut(index, types) else {
            return Err(item);
        };
        if slot.0 != Layer::of(item_type) {
            return Err(item);
        }
        let old = std::mem::replace(slot.1, item);
        self.retract_flags(TileFlags::of_item(types.lookup(old.type_id)), types);
        self.apply_flags(contribution);
        Ok(old)
    }

    pub(crate) fn layer_at(&self, index: usize, types: &ItemTypeIndex) -> Option<Layer> {
        match self.thing_at(index)? {
            ThingRef::Item(item) => Some(Layer::of(types.lookup(item.type_id))),
            ThingRef::Creature(_) => None,
        }
    }

    fn slot_mut(&mut self, index: usize, types: &ItemTypeIndex) -> Option<(Layer, &mut Item)> {
        let mut index = index;
        if self.ground.is_some() {
            if index == 0 {
                return self.ground.as_mut().map(|ground| (Layer::Ground, ground));
            }
            index -= 1;
        }
        if index < self.top_items.len() {
            return self
                .top_items
                .get_mut(index)
                .map(|top| (Layer::Top(types.lookup(top.type_id).top_order), top));
        }
        index -= self.top_items.len();
        if index < self.creatures.len() {
            return None;
        }
        index -= self.creatures.len();
        self.down_items.get_mut(index).map(|down| (Layer::Down, down))
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.ground
            .iter_mut()
            .chain(self.top_items.iter_mut())
            .chain(self.down_items.iter_mut())
            .find(|item| item.id == id)
    }

    /// Map-load insertion: no notifications, no role handling. Top items go
    /// before the first strictly higher rank so equal ranks keep load order.
    pub fn internal_add(&mut self, thing: Thing, types: &ItemTypeIndex) -> Result<(), Thing> {
        let item = match thing {
            Thing::Creature(id) => {
                self.creatures.push_front(id);
                return Ok(());
            }
            Thing::Item(item) => item,
        };
        let item_type = types.lookup(item.type_id);
        let contribution = TileFlags::of_item(item_type);
        if item_type.ground {
            if self.ground.is_some() {
                return Err(Thing::Item(item));
            }
            self.ground = Some(item);
        } else if self.item_count() >= MAX_TILE_ITEMS {
            return Err(Thing::Item(item));
        } else if item_type.always_on_top {
            let rank = item_type.top_order;
            let slot = self
                .top_items
                .iter()
                .position(|existing| rank < types.lookup(existing.type_id).top_order)
                .unwrap_or(self.top_items.len());
            self.top_items.insert(slot, item);
        } else {
            self.down_items.push_front(item);
        }
        self.apply_flags(contribution);
        Ok(())
    }
}

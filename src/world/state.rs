use crate::entities::creature::{Creature, CreatureId, CreatureRegistry};
use crate::entities::item::{Item, ItemId, ItemTypeId, ItemView};
use crate::entities::thing::{Thing, ThingKey, ThingRef};
use crate::telemetry::logging::{log_error, log_move};
use crate::world::item_types::ItemTypeIndex;
use crate::world::map::Map;
use crate::world::notify::{ClientEvent, Outbox, PendingNotification, TileEvent, WorldEvent};
use crate::world::placement::{query_max_count, Destination, Placement, ReturnValue};
use crate::world::position::{Direction, Position};
use crate::world::spectators::SpectatorIndex;
use crate::world::tile::{Tile, MAX_TILE_ITEMS};
use crate::world::tile_flags::TileFlags;
use crate::world::viewport::ViewportSize;

/// Teleport chains longer than this stop where they are.
pub const MAX_HANDOFF_DEPTH: u8 = 8;
/// Removals leaving more things than this make clients redraw the tile.
pub const TILE_REFRESH_THRESHOLD: usize = 8;
/// Largest stack a move may merge into.
pub const MAX_STACK_COUNT: u16 = 100;

/// What happened to a thing after it landed on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    Kept,
    /// A teleport forwarded it; the position is where it finally stayed.
    Relocated(Position),
    /// A trash holder or mailbox took it.
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added { stack_pos: usize, handoff: Handoff },
    /// Nothing changed on the map; an item was put up for disposal.
    Discarded,
}

impl AddOutcome {
    pub fn survived(self) -> bool {
        matches!(
            self,
            AddOutcome::Added {
                handoff: Handoff::Kept | Handoff::Relocated(_),
                ..
            }
        )
    }
}

/// A mailable item dropped on a mailbox, waiting for the post office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMail {
    pub mailbox: Position,
    pub item: Item,
}

/// The world: tiles, the creatures standing on them, and the queues the
/// game loop drains after every change.
///
/// Every mutation of a tile goes through here so that observers hear of it
/// exactly once and items that leave the world end up in `take_disposed`.
pub struct WorldState {
    map: Map,
    item_types: ItemTypeIndex,
    creatures: CreatureRegistry,
    spectators: SpectatorIndex,
    outbox: Outbox,
    pending_disposal: Vec<Item>,
    pending_mail: Vec<DeliveredMail>,
}

fn deliver(
    creatures: &CreatureRegistry,
    outbox: &mut Outbox,
    observers: &[CreatureId],
    client: impl Fn(&Creature) -> Option<ClientEvent>,
    event: TileEvent,
) {
    for id in observers {
        let Some(viewer) = creatures.get(*id) else {
            continue;
        };
        if !viewer.is_connected_player() {
            continue;
        }
        if let Some(message) = client(viewer) {
            outbox.queue_client(*id, message);
        }
    }
    for id in observers {
        outbox.queue_tile(*id, event);
    }
}

fn captured_index(captured: &[(CreatureId, usize)], observer: CreatureId) -> Option<usize> {
    captured
        .iter()
        .find(|(id, _)| *id == observer)
        .map(|(_, stack_pos)| *stack_pos)
}

impl WorldState {
    pub fn new(
        map: Map,
        item_types: ItemTypeIndex,
        viewport: ViewportSize,
        spectator_cache: usize,
    ) -> Self {
        Self {
            map,
            item_types,
            creatures: CreatureRegistry::default(),
            spectators: SpectatorIndex::new(viewport, spectator_cache),
            outbox: Outbox::default(),
            pending_disposal: Vec::new(),
            pending_mail: Vec::new(),
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Raw map access for loaders. Changes made here bypass notifications.
    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn item_types(&self) -> &ItemTypeIndex {
        &self.item_types
    }

    pub fn creatures(&self) -> &CreatureRegistry {
        &self.creatures
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(id)
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(id)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.map.tile(position)
    }

    pub fn placement(&self) -> Placement<'_> {
        Placement::new(&self.map, &self.creatures, &self.item_types)
    }

    pub fn observers_at(&mut self, position: Position) -> Vec<CreatureId> {
        self.spectators.observers_at(position, &self.creatures)
    }

    pub fn query_add(&self, position: Position, thing: ThingRef<'_>, flags: u32) -> ReturnValue {
        match self.map.tile(position) {
            Some(tile) => self.placement().query_add(tile, thing, flags),
            None => ReturnValue::NotPossible,
        }
    }

    pub fn query_remove(
        &self,
        position: Position,
        key: ThingKey,
        count: u16,
        flags: u32,
    ) -> ReturnValue {
        match self.map.tile(position) {
            Some(tile) => self.placement().query_remove(tile, key, count, flags),
            None => ReturnValue::NotPossible,
        }
    }

    pub fn query_destination(&self, position: Position, flags: u32) -> Option<Destination> {
        let tile = self.map.tile(position)?;
        Some(self.placement().resolve_destination(tile, flags))
    }

    pub fn take_client_events(&mut self, player: CreatureId) -> Vec<ClientEvent> {
        self.outbox.take_client_events(player)
    }

    pub fn take_tile_events(&mut self, observer: CreatureId) -> Vec<TileEvent> {
        self.outbox.take_tile_events(observer)
    }

    pub fn take_notifications(&mut self) -> Vec<PendingNotification> {
        self.outbox.take_all()
    }

    pub fn take_world_events(&mut self) -> Vec<WorldEvent> {
        self.outbox.take_world_events()
    }

    /// Items that left the world since the last call.
    pub fn take_disposed(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.pending_disposal)
    }

    pub fn take_mail(&mut self) -> Vec<DeliveredMail> {
        std::mem::take(&mut self.pending_mail)
    }

    fn dispose(&mut self, item: Item) {
        self.pending_disposal.push(item);
    }

    /// Map-load insertion without notifications or role hand-offs.
    pub fn load_item(&mut self, position: Position, item: Item) -> bool {
        let tile = self.map.tile_or_insert(position);
        match tile.internal_add(Thing::Item(item), &self.item_types) {
            Ok(()) => true,
            Err(Thing::Item(item)) => {
                log_error(&format!(
                    "load_item: item {} of type {} rejected at {}",
                    item.id.0, item.type_id.0, position
                ));
                self.dispose(item);
                false
            }
            Err(Thing::Creature(_)) => false,
        }
    }

    // Viewers who cannot see the creature `key` get no entry.
    fn client_indices(
        &self,
        position: Position,
        key: ThingKey,
        observers: &[CreatureId],
    ) -> Vec<(CreatureId, usize)> {
        let Some(tile) = self.map.tile(position) else {
            return Vec::new();
        };
        observers
            .iter()
            .filter_map(|id| {
                let viewer = self
                    .creatures
                    .get(*id)
                    .filter(|viewer| viewer.is_connected_player())?;
                if let ThingKey::Creature(target) = key {
                    let target = self.creatures.get(target)?;
                    if !viewer.can_see(target) {
                        return None;
                    }
                }
                tile.client_index_of(viewer, key, &self.creatures)
                    .map(|stack_pos| (*id, stack_pos))
            })
            .collect()
    }

    /// Puts `thing` on the tile at `position`, tells the observers, then
    /// lets the tile's roles act on it.
    pub fn add_thing(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        thing: Thing,
    ) -> AddOutcome {
        self.add_thing_at_depth(mover, position, thing, 0)
    }

    fn add_thing_at_depth(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        thing: Thing,
        depth: u8,
    ) -> AddOutcome {
        let placed = match thing {
            Thing::Creature(id) => self
                .insert_creature(position, id)
                .map(|stack_pos| (ThingKey::Creature(id), stack_pos)),
            Thing::Item(item) => {
                let id = item.id;
                self.insert_item(mover, position, item)
                    .map(|stack_pos| (ThingKey::Item(id), stack_pos))
            }
        };
        let Some((key, stack_pos)) = placed else {
            return AddOutcome::Discarded;
        };
        let handoff = self.post_add_notification(mover, position, key, depth);
        AddOutcome::Added { stack_pos, handoff }
    }

    fn insert_creature(&mut self, position: Position, id: CreatureId) -> Option<usize> {
        match self.creatures.get(id) {
            None => {
                log_error(&format!("add_thing: unknown creature {}", id.0));
                return None;
            }
            Some(creature) if creature.position.is_some() => {
                log_error(&format!(
                    "add_thing: creature {} already stands on a tile",
                    id.0
                ));
                return None;
            }
            Some(_) => {}
        }
        if !self.map.has_tile(position) {
            log_error(&format!("add_thing: no tile at {}", position));
            return None;
        }

        self.spectators.clear_cache();
        let index = self.map.tile_mut(position)?.insert_creature(id);
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.position = Some(position);
        }
        self.spectators.insert(id, position);

        let observers = self.observers_at(position);
        let captured = self.client_indices(position, ThingKey::Creature(id), &observers);
        let creatures = &self.creatures;
        deliver(
            creatures,
            &mut self.outbox,
            &observers,
            |viewer| {
                captured_index(&captured, viewer.id).map(|stack_pos| ClientEvent::AddCreature {
                    position,
                    stack_pos,
                    creature: id,
                })
            },
            TileEvent::CreatureAdded {
                position,
                creature: id,
            },
        );
        Some(index)
    }

    fn insert_item(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        item: Item,
    ) -> Option<usize> {
        let Some(tile) = self.map.tile(position) else {
            log_error(&format!(
                "add_thing: no tile at {}, item {} discarded",
                position, item.id.0
            ));
            self.dispose(item);
            return None;
        };
        let item_type = self.item_types.lookup(item.type_id);
        let is_ground = item_type.ground;
        let on_top = item_type.always_on_top;
        let splash = item_type.is_splash();
        let field = item_type.is_magic_field();

        if is_ground {
            return self.install_ground(mover, position, item);
        }

        if on_top && splash {
            let old = tile.splash_item(&self.item_types).map(|old| old.id);
            if let Some(old) = old {
                self.discard_item(mover, position, old);
            }
        } else if !on_top && field {
            let existing = tile
                .down_items()
                .map(|present| (present.id, self.item_types.lookup(present.type_id)))
                .find(|(_, present_type)| present_type.is_magic_field())
                .map(|(id, present_type)| (id, present_type.replaceable));
            match existing {
                Some((old, true)) => self.discard_item(mover, position, old),
                Some((_, false)) => {
                    self.dispose(item);
                    return None;
                }
                None => {}
            }
        }

        let id = item.id;
        let types = &self.item_types;
        let Some(tile) = self.map.tile_mut(position) else {
            self.dispose(item);
            return None;
        };
        if tile.item_count() >= MAX_TILE_ITEMS {
            log_error(&format!(
                "add_thing: tile {} is full, item {} discarded",
                position, item.id.0
            ));
            self.dispose(item);
            return None;
        }
        let inserted = if on_top {
            tile.insert_top(item, types)
        } else {
            tile.insert_down(item, types)
        };
        match inserted {
            Ok(index) => {
                self.notify_item_added(position, id);
                Some(index)
            }
            Err(item) => {
                log_error(&format!(
                    "add_thing: tile {} refused item {}",
                    position, item.id.0
                ));
                self.dispose(item);
                None
            }
        }
    }

    fn install_ground(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        item: Item,
    ) -> Option<usize> {
        let id = item.id;
        let types = &self.item_types;
        let Some(tile) = self.map.tile_mut(position) else {
            self.dispose(item);
            return None;
        };
        match tile.set_ground(item, types) {
            None => self.notify_item_added(position, id),
            Some(old) => {
                self.notify_item_updated(position, id, old.view());
                self.post_remove_notification(mover, position, ThingKey::Item(old.id));
                self.dispose(old);
            }
        }
        Some(0)
    }

    fn notify_item_added(&mut self, position: Position, id: ItemId) {
        let observers = self.observers_at(position);
        let Some(tile) = self.map.tile(position) else {
            return;
        };
        let Some(view) = tile.item(id).map(Item::view) else {
            return;
        };
        let key = ThingKey::Item(id);
        let creatures = &self.creatures;
        deliver(
            creatures,
            &mut self.outbox,
            &observers,
            |viewer| {
                tile.client_index_of(viewer, key, creatures)
                    .map(|stack_pos| ClientEvent::AddTileItem {
                        position,
                        stack_pos,
                        item: view,
                    })
            },
            TileEvent::ItemAdded {
                position,
                item: view,
            },
        );
    }

    fn notify_item_updated(&mut self, position: Position, id: ItemId, old: ItemView) {
        let observers = self.observers_at(position);
        let Some(tile) = self.map.tile(position) else {
            return;
        };
        let Some(new) = tile.item(id).map(Item::view) else {
            return;
        };
        let key = ThingKey::Item(id);
        let creatures = &self.creatures;
        deliver(
            creatures,
            &mut self.outbox,
            &observers,
            |viewer| {
                tile.client_index_of(viewer, key, creatures)
                    .map(|stack_pos| ClientEvent::UpdateTileItem {
                        position,
                        stack_pos,
                        old,
                        new,
                    })
            },
            TileEvent::ItemUpdated { position, old, new },
        );
    }

    fn post_add_notification(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        key: ThingKey,
        depth: u8,
    ) -> Handoff {
        self.outbox.queue_world(WorldEvent::ThingAdded {
            position,
            thing: key,
            mover,
        });
        let Some(flags) = self.map.tile(position).map(Tile::flags) else {
            return Handoff::Kept;
        };
        if flags.contains(TileFlags::TELEPORT) {
            self.hand_to_teleport(mover, position, key, depth)
        } else if flags.contains(TileFlags::TRASH_HOLDER) {
            self.hand_to_trash(mover, position, key)
        } else if flags.contains(TileFlags::MAILBOX) {
            self.hand_to_mailbox(mover, position, key)
        } else {
            Handoff::Kept
        }
    }

    fn hand_to_teleport(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        key: ThingKey,
        depth: u8,
    ) -> Handoff {
        let Some(teleport) = self
            .map
            .tile(position)
            .and_then(|tile| tile.teleport_item(&self.item_types))
        else {
            return Handoff::Kept;
        };
        if key == ThingKey::Item(teleport.id) {
            return Handoff::Kept;
        }
        let Some(destination) = teleport.teleport_destination else {
            return Handoff::Kept;
        };
        if depth >= MAX_HANDOFF_DEPTH {
            log_error(&format!(
                "teleport chain stopped at {} after {} hops",
                position, depth
            ));
            return Handoff::Kept;
        }
        if !self.map.has_tile(destination) {
            log_error(&format!(
                "teleport at {} leads to missing tile {}",
                position, destination
            ));
            return Handoff::Kept;
        }

        match key {
            ThingKey::Creature(id) => {
                if !self.move_creature_at_depth(mover, id, destination, true, depth + 1) {
                    return Handoff::Kept;
                }
                let landed = self
                    .creatures
                    .get(id)
                    .and_then(|creature| creature.position)
                    .unwrap_or(destination);
                Handoff::Relocated(landed)
            }
            ThingKey::Item(id) => {
                let Some(item) = self.detach_item(mover, position, id) else {
                    return Handoff::Kept;
                };
                log_move(&format!(
                    "item {} teleported {} -> {}",
                    id.0, position, destination
                ));
                match self.add_thing_at_depth(mover, destination, Thing::Item(item), depth + 1) {
                    AddOutcome::Added {
                        handoff: Handoff::Kept,
                        ..
                    } => Handoff::Relocated(destination),
                    AddOutcome::Added { handoff, .. } => handoff,
                    AddOutcome::Discarded => Handoff::Consumed,
                }
            }
        }
    }

    fn hand_to_trash(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        key: ThingKey,
    ) -> Handoff {
        let ThingKey::Item(id) = key else {
            return Handoff::Kept;
        };
        let types = &self.item_types;
        let Some(tile) = self.map.tile(position) else {
            return Handoff::Kept;
        };
        let is_holder = tile
            .trash_holder(types)
            .map_or(true, |holder| holder.id == id);
        let moveable = tile
            .item(id)
            .map_or(false, |item| types.lookup(item.type_id).moveable);
        if is_holder || !moveable {
            return Handoff::Kept;
        }
        self.discard_item(mover, position, id);
        Handoff::Consumed
    }

    fn hand_to_mailbox(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        key: ThingKey,
    ) -> Handoff {
        let ThingKey::Item(id) = key else {
            return Handoff::Kept;
        };
        let types = &self.item_types;
        let Some(tile) = self.map.tile(position) else {
            return Handoff::Kept;
        };
        let mailable = tile
            .item(id)
            .map_or(false, |item| types.lookup(item.type_id).mailable);
        if !mailable || tile.mailbox(types).is_none() {
            return Handoff::Kept;
        }
        let Some(item) = self.detach_item(mover, position, id) else {
            return Handoff::Kept;
        };
        log_move(&format!("item {} mailed at {}", id.0, position));
        self.pending_mail.push(DeliveredMail {
            mailbox: position,
            item,
        });
        Handoff::Consumed
    }

    fn discard_item(&mut self, mover: Option<CreatureId>, position: Position, id: ItemId) {
        if let Some(item) = self.detach_item(mover, position, id) {
            self.dispose(item);
        }
    }

    fn detach_item(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        id: ItemId,
    ) -> Option<Item> {
        let observers = self.observers_at(position);
        let key = ThingKey::Item(id);
        let captured = self.client_indices(position, key, &observers);
        let types = &self.item_types;
        let Some((index, item)) = self
            .map
            .tile_mut(position)
            .and_then(|tile| tile.take_item(id, types))
        else {
            log_error(&format!(
                "remove_item: item {} is not on tile {}",
                id.0, position
            ));
            return None;
        };

        let view = item.view();
        for (observer, stack_pos) in captured {
            self.outbox.queue_client(
                observer,
                ClientEvent::RemoveTileItem {
                    position,
                    stack_pos,
                    item: view,
                },
            );
        }
        for observer in &observers {
            self.outbox.queue_tile(
                *observer,
                TileEvent::ItemRemoved {
                    position,
                    stack_pos: index,
                    item: view,
                },
            );
        }
        self.post_remove_notification(mover, position, key);
        Some(item)
    }

    fn post_remove_notification(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        key: ThingKey,
    ) {
        let crowded = self
            .map
            .tile(position)
            .map_or(false, |tile| tile.thing_count() > TILE_REFRESH_THRESHOLD);
        if crowded {
            let observers = self.observers_at(position);
            deliver(
                &self.creatures,
                &mut self.outbox,
                &observers,
                |_| Some(ClientEvent::UpdateTile { position }),
                TileEvent::TileUpdated { position },
            );
        }
        self.outbox.queue_world(WorldEvent::ThingRemoved {
            position,
            thing: key,
            mover,
        });
    }

    /// Removes `count` units of an item. A stackable item holding more
    /// than `count` stays on the tile and the split-off part is returned.
    pub fn remove_item(
        &mut self,
        mover: Option<CreatureId>,
        position: Position,
        id: ItemId,
        count: u16,
    ) -> Option<Item> {
        let Some(item) = self.map.tile(position).and_then(|tile| tile.item(id)) else {
            log_error(&format!(
                "remove_item: item {} is not on tile {}",
                id.0, position
            ));
            return None;
        };
        if count == 0 {
            log_error(&format!("remove_item: zero count for item {}", id.0));
            return None;
        }
        let partial = self.item_types.lookup(item.type_id).stackable && count < item.count;
        if !partial {
            return self.detach_item(mover, position, id);
        }

        let (_, before, taken) = self.map.tile_mut(position)?.split_item(id, count)?;
        self.notify_item_updated(position, id, before);
        Some(taken)
    }

    pub fn update_item(
        &mut self,
        position: Position,
        id: ItemId,
        type_id: ItemTypeId,
        count: u16,
    ) -> bool {
        let types = &self.item_types;
        let Some(tile) = self.map.tile_mut(position) else {
            log_error(&format!("update_item: no tile at {}", position));
            return false;
        };
        let before = match tile.retype_item(id, type_id, count, types) {
            Ok((_, before, _)) => before,
            Err(err) => {
                log_error(&format!("update_item: {}", err));
                return false;
            }
        };
        self.notify_item_updated(position, id, before);
        true
    }

    pub fn replace_thing(
        &mut self,
        position: Position,
        index: usize,
        item: Item,
    ) -> Result<Item, Item> {
        let id = item.id;
        let types = &self.item_types;
        let Some(tile) = self.map.tile_mut(position) else {
            log_error(&format!("replace_thing: no tile at {}", position));
            return Err(item);
        };
        match tile.replace_at(index, item, types) {
            Ok(old) => {
                self.notify_item_updated(position, id, old.view());
                Ok(old)
            }
            Err(item) => {
                match tile.layer_at(index, types) {
                    Some(layer) => log_error(&format!(
                        "replace_thing: item {} of type {} does not fit the {:?} slot {} on {}",
                        item.id.0, item.type_id.0, layer, index, position
                    )),
                    None => log_error(&format!(
                        "replace_thing: index {} on {} holds no item",
                        index, position
                    )),
                }
                Err(item)
            }
        }
    }

    /// Relocates a creature. Unless `teleport` is set it turns to face the
    /// way it went.
    pub fn move_creature(
        &mut self,
        mover: Option<CreatureId>,
        id: CreatureId,
        to: Position,
        teleport: bool,
    ) -> bool {
        self.move_creature_at_depth(mover, id, to, teleport, 0)
    }

    fn move_creature_at_depth(
        &mut self,
        mover: Option<CreatureId>,
        id: CreatureId,
        to: Position,
        teleport: bool,
        depth: u8,
    ) -> bool {
        let Some(from) = self.creatures.get(id).and_then(|creature| creature.position) else {
            log_error(&format!("move_creature: creature {} is not on the map", id.0));
            return false;
        };
        if !self.map.has_tile(to) {
            log_error(&format!(
                "move_creature: no tile at {} for creature {}",
                to, id.0
            ));
            return false;
        }
        let key = ThingKey::Creature(id);

        let observers = self
            .spectators
            .observers_of_move(from, to, &self.creatures);
        let from_observers = self.observers_at(from);
        let to_observers = self.observers_at(to);
        let old_indices = self.client_indices(from, key, &observers);
        let Some(old_index) = self.map.tile(from).and_then(|tile| tile.index_of(key)) else {
            log_error(&format!(
                "move_creature: creature {} missing from tile {}",
                id.0, from
            ));
            return false;
        };

        self.spectators.clear_cache();
        if self
            .map
            .tile_mut(from)
            .and_then(|tile| tile.take_creature(id))
            .is_none()
        {
            return false;
        }
        self.spectators.relocate(id, from, to);
        if let Some(tile) = self.map.tile_mut(to) {
            tile.insert_creature(id);
        }
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.position = Some(to);
            if !teleport {
                if let Some(direction) = Direction::facing(from, to) {
                    creature.direction = direction;
                }
            }
        }

        let new_indices = self.client_indices(to, key, &observers);
        for observer in &observers {
            let itself = *observer == id;
            let old = captured_index(&old_indices, *observer)
                .filter(|_| itself || from_observers.contains(observer));
            let new = captured_index(&new_indices, *observer)
                .filter(|_| itself || to_observers.contains(observer));
            let message = match (old, new) {
                (Some(old_stack_pos), Some(new_stack_pos)) => ClientEvent::CreatureMove {
                    creature: id,
                    from,
                    old_stack_pos,
                    to,
                    new_stack_pos,
                    teleport,
                },
                (Some(stack_pos), None) => ClientEvent::RemoveCreature {
                    position: from,
                    stack_pos,
                    creature: id,
                },
                (None, Some(stack_pos)) => ClientEvent::AddCreature {
                    position: to,
                    stack_pos,
                    creature: id,
                },
                (None, None) => continue,
            };
            self.outbox.queue_client(*observer, message);
        }
        for observer in &observers {
            self.outbox.queue_tile(
                *observer,
                TileEvent::CreatureMoved {
                    creature: id,
                    from,
                    old_stack_pos: old_index,
                    to,
                },
            );
        }

        log_move(&format!(
            "creature {} moved {} -> {}{}",
            id.0,
            from,
            to,
            if teleport { " (teleport)" } else { "" }
        ));
        self.post_remove_notification(mover, from, key);
        self.post_add_notification(mover, to, key, depth);
        self.outbox.queue_world(WorldEvent::CreatureMoved {
            creature: id,
            from,
            to,
            teleport,
        });
        true
    }

    /// Registers a creature and puts it on the map if the tile admits it.
    pub fn place_creature(
        &mut self,
        creature: Creature,
        position: Position,
        flags: u32,
    ) -> Result<(), ReturnValue> {
        let id = creature.id;
        let mut creature = creature;
        creature.position = None;
        if let Err(err) = self.creatures.insert(creature) {
            log_error(&format!("place_creature: {}", err));
            return Err(ReturnValue::NotPossible);
        }
        let result = self.query_add(position, ThingRef::Creature(id), flags);
        if !result.is_ok() {
            self.creatures.remove(id);
            return Err(result);
        }
        match self.add_thing(None, position, Thing::Creature(id)) {
            AddOutcome::Added { .. } => {
                log_move(&format!("creature {} placed at {}", id.0, position));
                Ok(())
            }
            AddOutcome::Discarded => {
                self.creatures.remove(id);
                Err(ReturnValue::NotPossible)
            }
        }
    }

    pub fn remove_creature(&mut self, id: CreatureId) -> Option<Creature> {
        let Some(position) = self.creatures.get(id).and_then(|creature| creature.position) else {
            return self.creatures.remove(id);
        };
        let key = ThingKey::Creature(id);
        let observers = self.observers_at(position);
        let captured = self.client_indices(position, key, &observers);

        self.spectators.clear_cache();
        if self
            .map
            .tile_mut(position)
            .and_then(|tile| tile.take_creature(id))
            .is_none()
        {
            log_error(&format!(
                "remove_creature: creature {} missing from tile {}",
                id.0, position
            ));
        }
        self.spectators.remove(id, position);

        for (observer, stack_pos) in captured {
            self.outbox.queue_client(
                observer,
                ClientEvent::RemoveCreature {
                    position,
                    stack_pos,
                    creature: id,
                },
            );
        }
        for observer in &observers {
            self.outbox.queue_tile(
                *observer,
                TileEvent::CreatureRemoved {
                    position,
                    creature: id,
                },
            );
        }
        self.post_remove_notification(None, position, key);
        log_move(&format!("creature {} left {}", id.0, position));

        let mut creature = self.creatures.remove(id)?;
        creature.position = None;
        Some(creature)
    }

    /// One walking step, following any floor change on the way.
    pub fn move_creature_step(&mut self, id: CreatureId, direction: Direction) -> ReturnValue {
        let Some(from) = self.creatures.get(id).and_then(|creature| creature.position) else {
            return ReturnValue::NotPossible;
        };
        let Some(tile) = from.step(direction).and_then(|to| self.map.tile(to)) else {
            return ReturnValue::NotPossible;
        };
        let placement = self.placement();
        let destination = placement.resolve_destination(tile, 0);
        let Some(target) = self.map.tile(destination.position) else {
            return ReturnValue::NotPossible;
        };
        let result = placement.query_add(target, ThingRef::Creature(id), destination.flags);
        if !result.is_ok() {
            return result;
        }
        if self.move_creature(Some(id), id, destination.position, false) {
            ReturnValue::NoError
        } else {
            ReturnValue::NotPossible
        }
    }

    /// Moves `count` units of an item between tiles. A stackable landing on
    /// a matching stack merges into it while the result stays within
    /// `MAX_STACK_COUNT`.
    pub fn move_item(
        &mut self,
        mover: Option<CreatureId>,
        from: Position,
        id: ItemId,
        count: u16,
        to: Position,
    ) -> ReturnValue {
        let placement = self.placement();
        let (Some(source), Some(target)) = (self.map.tile(from), self.map.tile(to)) else {
            return ReturnValue::NotPossible;
        };
        let result = placement.query_remove(source, ThingKey::Item(id), count, 0);
        if !result.is_ok() {
            return result;
        }
        let destination = placement.resolve_destination(target, 0);
        let (Some(landing), Some(moving)) = (self.map.tile(destination.position), source.item(id))
        else {
            return ReturnValue::NotPossible;
        };
        let result = placement.query_add(landing, ThingRef::Item(moving), destination.flags);
        if !result.is_ok() {
            return result;
        }

        let type_id = moving.type_id;
        let stackable = self.item_types.lookup(type_id).stackable;
        let moved = if stackable {
            query_max_count(count).min(moving.count)
        } else {
            moving.count
        };
        let merge_into = destination
            .blocking_item
            .filter(|blocking| stackable && *blocking != id)
            .and_then(|blocking| landing.item(blocking))
            .filter(|held| {
                held.type_id == type_id && held.count.saturating_add(moved) <= MAX_STACK_COUNT
            })
            .map(|held| (held.id, held.count));

        let Some(taken) = self.remove_item(mover, from, id, count) else {
            return ReturnValue::NotPossible;
        };
        if let Some((held_id, held_count)) = merge_into {
            let merged = held_count.saturating_add(taken.count);
            if self.update_item(destination.position, held_id, type_id, merged) {
                self.dispose(taken);
                return ReturnValue::NoError;
            }
        }
        match self.add_thing(mover, destination.position, Thing::Item(taken)) {
            AddOutcome::Added { .. } => ReturnValue::NoError,
            AddOutcome::Discarded => ReturnValue::NotPossible,
        }
    }
}

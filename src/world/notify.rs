use crate::entities::creature::CreatureId;
use crate::entities::item::ItemView;
use crate::entities::thing::ThingKey;
use crate::world::position::Position;

/// Messages for connected players. Stack positions are the ones the
/// receiving player perceives, so they can differ between receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    AddTileItem {
        position: Position,
        stack_pos: usize,
        item: ItemView,
    },
    UpdateTileItem {
        position: Position,
        stack_pos: usize,
        old: ItemView,
        new: ItemView,
    },
    RemoveTileItem {
        position: Position,
        stack_pos: usize,
        item: ItemView,
    },
    UpdateTile {
        position: Position,
    },
    AddCreature {
        position: Position,
        stack_pos: usize,
        creature: CreatureId,
    },
    RemoveCreature {
        position: Position,
        stack_pos: usize,
        creature: CreatureId,
    },
    CreatureMove {
        creature: CreatureId,
        from: Position,
        old_stack_pos: usize,
        to: Position,
        new_stack_pos: usize,
        teleport: bool,
    },
}

/// Logic-level callbacks, delivered to every observer after the client
/// messages of the same change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEvent {
    ItemAdded {
        position: Position,
        item: ItemView,
    },
    ItemUpdated {
        position: Position,
        old: ItemView,
        new: ItemView,
    },
    ItemRemoved {
        position: Position,
        stack_pos: usize,
        item: ItemView,
    },
    TileUpdated {
        position: Position,
    },
    CreatureAdded {
        position: Position,
        creature: CreatureId,
    },
    CreatureRemoved {
        position: Position,
        creature: CreatureId,
    },
    CreatureMoved {
        creature: CreatureId,
        from: Position,
        old_stack_pos: usize,
        to: Position,
    },
}

/// Lifecycle hooks fired once per change, after the observers heard of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    ThingAdded {
        position: Position,
        thing: ThingKey,
        mover: Option<CreatureId>,
    },
    ThingRemoved {
        position: Position,
        thing: ThingKey,
        mover: Option<CreatureId>,
    },
    CreatureMoved {
        creature: CreatureId,
        from: Position,
        to: Position,
        teleport: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Client(ClientEvent),
    Tile(TileEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNotification {
    pub observer: CreatureId,
    pub notification: Notification,
}

/// Delivery queue drained by the game loop. Entries keep the order they
/// were queued in, across observers and event kinds.
#[derive(Debug, Default, Clone)]
pub struct Outbox {
    pending: Vec<PendingNotification>,
    world_events: Vec<WorldEvent>,
}

impl Outbox {
    pub(crate) fn queue_client(&mut self, observer: CreatureId, event: ClientEvent) {
        self.pending.push(PendingNotification {
            observer,
            notification: Notification::Client(event),
        });
    }

    pub(crate) fn queue_tile(&mut self, observer: CreatureId, event: TileEvent) {
        self.pending.push(PendingNotification {
            observer,
            notification: Notification::Tile(event),
        });
    }

    pub(crate) fn queue_world(&mut self, event: WorldEvent) {
        self.world_events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.world_events.is_empty()
    }

    pub fn take_client_events(&mut self, player: CreatureId) -> Vec<ClientEvent> {
        self.take_matching(player, |notification| match notification {
            Notification::Client(event) => Some(event),
            Notification::Tile(_) => None,
        })
    }

    pub fn take_tile_events(&mut self, observer: CreatureId) -> Vec<TileEvent> {
        self.take_matching(observer, |notification| match notification {
            Notification::Tile(event) => Some(event),
            Notification::Client(_) => None,
        })
    }

    fn take_matching<T>(
        &mut self,
        observer: CreatureId,
        select: impl Fn(Notification) -> Option<T>,
    ) -> Vec<T> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let mut pending = std::mem::take(&mut self.pending);
        let mut remaining = Vec::new();
        let mut ready = Vec::new();
        for entry in pending.drain(..) {
            match select(entry.notification) {
                Some(event) if entry.observer == observer => ready.push(event),
                _ => remaining.push(entry),
            }
        }
        self.pending = remaining;
        ready
    }

    /// Everything queued for observers, in delivery order.
    pub fn take_all(&mut self) -> Vec<PendingNotification> {
        std::mem::take(&mut self.pending)
    }

    pub fn take_world_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.world_events)
    }
}

use crate::entities::creature::{ActorData, Creature, CreatureRegistry};
use crate::entities::item::{Item, ItemId};
use crate::entities::thing::{ThingKey, ThingRef};
use crate::world::item_types::{ItemRole, ItemTypeIndex};
use crate::world::map::Map;
use crate::world::position::{Position, PositionDelta};
use crate::world::tile::{Tile, MAX_TILE_ITEMS};
use crate::world::tile_flags::{TileFlags, ZoneKind};

/// Skip every admission rule.
pub const FLAG_NO_LIMIT: u32 = 1 << 0;
/// The query comes from path planning.
pub const FLAG_PATHFINDING: u32 = 1 << 1;
pub const FLAG_IGNORE_BLOCK_ITEM: u32 = 1 << 2;
pub const FLAG_IGNORE_BLOCK_CREATURE: u32 = 1 << 3;
pub const FLAG_IGNORE_FIELD_DAMAGE: u32 = 1 << 4;
pub const FLAG_IGNORE_NOT_MOVEABLE: u32 = 1 << 5;

fn has_bit(flags: u32, bit: u32) -> bool {
    flags & bit != 0
}

/// Outcome of an admission or removal query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnValue {
    NoError,
    NotPossible,
    NotEnoughRoom,
    NotMoveable,
    NeedsExchange,
    ZoneLocked,
    ZoneLockedEntering,
    ZoneLockedLeaving,
    CapacityExceeded,
}

impl ReturnValue {
    pub fn is_ok(self) -> bool {
        self == ReturnValue::NoError
    }
}

impl std::fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ReturnValue::NoError => "No error.",
            ReturnValue::NotPossible => "Sorry, not possible.",
            ReturnValue::NotEnoughRoom => "There is not enough room.",
            ReturnValue::NotMoveable => "You cannot move this object.",
            ReturnValue::NeedsExchange => "Remove the object already hanging there first.",
            ReturnValue::ZoneLocked => {
                "You can not enter a protection zone after attacking another player."
            }
            ReturnValue::ZoneLockedEntering => {
                "You can not enter a pvp zone after attacking another player."
            }
            ReturnValue::ZoneLockedLeaving => {
                "You can not leave a pvp zone after attacking another player."
            }
            ReturnValue::CapacityExceeded => "There is no room left on this tile.",
        };
        f.write_str(text)
    }
}

impl std::error::Error for ReturnValue {}

/// Where an add should really go once floor changes are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub position: Position,
    /// Topmost down item of the destination, if any.
    pub blocking_item: Option<ItemId>,
    pub flags: u32,
}

pub fn query_max_count(count: u16) -> u16 {
    count.max(1)
}

/// Read-only view of the world used to answer placement queries.
/// Nothing here mutates; commits live on `WorldState`.
#[derive(Clone, Copy)]
pub struct Placement<'a> {
    pub map: &'a Map,
    pub creatures: &'a CreatureRegistry,
    pub types: &'a ItemTypeIndex,
}

impl<'a> Placement<'a> {
    pub fn new(map: &'a Map, creatures: &'a CreatureRegistry, types: &'a ItemTypeIndex) -> Self {
        Self {
            map,
            creatures,
            types,
        }
    }

    pub fn query_add(&self, tile: &Tile, thing: ThingRef<'_>, flags: u32) -> ReturnValue {
        match thing {
            ThingRef::Creature(id) => match self.creatures.get(id) {
                Some(creature) => self.query_add_creature(tile, creature, flags),
                None => ReturnValue::NotPossible,
            },
            ThingRef::Item(item) => self.query_add_item(tile, item, flags),
        }
    }

    fn occupied(&self, tile: &Tile) -> bool {
        tile.has_visible_creature(self.creatures)
    }

    fn query_add_creature(&self, tile: &Tile, creature: &Creature, flags: u32) -> ReturnValue {
        if has_bit(flags, FLAG_NO_LIMIT) {
            return ReturnValue::NoError;
        }
        if has_bit(flags, FLAG_PATHFINDING) && (tile.floor_change() || tile.position_change()) {
            return ReturnValue::NotPossible;
        }
        if tile.ground().is_none() {
            return ReturnValue::NotPossible;
        }

        if let Some(actor) = creature.actor_data() {
            return self.query_add_actor(tile, actor, flags);
        }

        let blocked_by_creature =
            !has_bit(flags, FLAG_IGNORE_BLOCK_CREATURE) && self.occupied(tile);
        if blocked_by_creature {
            return ReturnValue::NotEnoughRoom;
        }

        if let Some(player) = creature.player_data() {
            if creature.position.is_none() && tile.has_zone(ZoneKind::NoLogout) {
                return ReturnValue::NotPossible;
            }
            if player.zone_locked {
                let origin_pvp = creature
                    .position
                    .and_then(|position| self.map.tile(position))
                    .map_or(false, |origin| origin.has_zone(ZoneKind::PvpZone));
                let destination_pvp = tile.has_zone(ZoneKind::PvpZone);
                if !origin_pvp && destination_pvp {
                    return ReturnValue::ZoneLockedEntering;
                }
                if origin_pvp && !destination_pvp {
                    return ReturnValue::ZoneLockedLeaving;
                }
                if tile.has_zone(ZoneKind::NoPvpZone) || tile.has_zone(ZoneKind::ProtectionZone) {
                    return ReturnValue::ZoneLocked;
                }
            }
        }

        if tile.item_count() == 0 {
            return ReturnValue::NoError;
        }
        if !has_bit(flags, FLAG_IGNORE_BLOCK_ITEM) {
            if tile.has_flag(TileFlags::BLOCK_SOLID) {
                return ReturnValue::NotEnoughRoom;
            }
            return ReturnValue::NoError;
        }
        let fixed_solid = tile.items().any(|item| {
            let item_type = self.types.lookup(item.type_id);
            item_type.block_solid && (!item_type.moveable || item.has_unique_id())
        });
        if fixed_solid {
            return ReturnValue::NotPossible;
        }
        ReturnValue::NoError
    }

    fn query_add_actor(&self, tile: &Tile, actor: &ActorData, flags: u32) -> ReturnValue {
        if tile.has_zone(ZoneKind::ProtectionZone) {
            return ReturnValue::NotPossible;
        }
        if tile.floor_change() || tile.position_change() {
            return ReturnValue::NotPossible;
        }

        if actor.can_push_creatures && !actor.is_summon {
            let unpushable = tile
                .creatures()
                .filter(|id| self.creatures.is_visible(*id))
                .any(|id| {
                    self.creatures.get(id).map_or(true, |occupant| {
                        let pushable_actor = occupant
                            .actor_data()
                            .map_or(false, |data| !data.is_player_summon);
                        !(pushable_actor && occupant.pushable)
                    })
                });
            if unpushable {
                return ReturnValue::NotPossible;
            }
        } else if self.occupied(tile) {
            return ReturnValue::NotEnoughRoom;
        }

        if tile.has_flag(TileFlags::BLOCK_SOLID_NOT_MOVEABLE) {
            return ReturnValue::NotPossible;
        }
        let pathfinding = has_bit(flags, FLAG_PATHFINDING);
        if pathfinding
            && tile.has_flag(TileFlags::BLOCK_PATH_NOT_FIELD)
            && tile.has_flag(TileFlags::BLOCK_PATH_NOT_MOVEABLE)
        {
            return ReturnValue::NotPossible;
        }
        let blocked = tile.has_flag(TileFlags::BLOCK_SOLID)
            || (pathfinding && tile.has_flag(TileFlags::BLOCK_PATH_NOT_FIELD));
        if blocked && !(actor.can_push_items || has_bit(flags, FLAG_IGNORE_BLOCK_ITEM)) {
            return ReturnValue::NotPossible;
        }

        if let Some(field) = tile.field_item(self.types) {
            let field_type = self.types.lookup(field.type_id);
            if !field_type.block_solid {
                if let Some(damage) = field_type.field_damage {
                    if !actor.is_immune(damage) {
                        let tolerated = has_bit(flags, FLAG_IGNORE_FIELD_DAMAGE)
                            && (actor.can_push_items || actor.has_condition_from(damage));
                        if !tolerated {
                            return ReturnValue::NotPossible;
                        }
                    }
                }
            }
        }

        ReturnValue::NoError
    }

    fn query_add_item(&self, tile: &Tile, item: &Item, flags: u32) -> ReturnValue {
        if tile.item_count() >= MAX_TILE_ITEMS {
            return ReturnValue::CapacityExceeded;
        }
        if has_bit(flags, FLAG_NO_LIMIT) {
            return ReturnValue::NoError;
        }

        let item_type = self.types.lookup(item.type_id);
        let hangable = item_type.hangable;
        if tile.ground().is_none() && !hangable {
            return ReturnValue::NotPossible;
        }
        if item_type.block_solid
            && !has_bit(flags, FLAG_IGNORE_BLOCK_CREATURE)
            && self.occupied(tile)
        {
            return ReturnValue::NotEnoughRoom;
        }
        if tile.item_count() == 0 {
            return ReturnValue::NoError;
        }

        let mut has_hangable = false;
        let mut has_support = false;
        for present in tile.items() {
            let present_type = self.types.lookup(present.type_id);
            let support = present_type.horizontal || present_type.vertical;
            has_hangable |= present_type.hangable;
            has_support |= support;

            if hangable && support {
                continue;
            }
            if !present_type.block_solid {
                continue;
            }
            if !item_type.pickupable {
                return ReturnValue::NotEnoughRoom;
            }
            if present_type.allow_pickupable {
                continue;
            }
            if !present_type.has_height
                || present_type.pickupable
                || present_type.is_role(ItemRole::Bed)
            {
                return ReturnValue::NotEnoughRoom;
            }
        }

        if hangable && has_hangable && has_support {
            return ReturnValue::NeedsExchange;
        }
        ReturnValue::NoError
    }

    pub fn query_remove(&self, tile: &Tile, key: ThingKey, count: u16, flags: u32) -> ReturnValue {
        let item = match key {
            ThingKey::Creature(_) => return ReturnValue::NotPossible,
            ThingKey::Item(id) => match tile.item(id) {
                Some(item) => item,
                None => return ReturnValue::NotPossible,
            },
        };
        let item_type = self.types.lookup(item.type_id);
        if count == 0 || (item_type.stackable && count > item.count) {
            return ReturnValue::NotPossible;
        }
        if !item_type.moveable && !has_bit(flags, FLAG_IGNORE_NOT_MOVEABLE) {
            return ReturnValue::NotMoveable;
        }
        ReturnValue::NoError
    }

    /// Follows a floor change on `tile`. Landing on another tile adds
    /// `FLAG_NO_LIMIT` since transition targets are never blocked.
    pub fn resolve_destination(&self, tile: &Tile, flags: u32) -> Destination {
        let target = if tile.has_flag(TileFlags::FLOOR_CHANGE_DOWN) {
            tile.position.below().and_then(|below| {
                let lower = self.map.tile(below)?;
                let delta = nudge(lower, 1);
                below.offset(delta).and_then(|position| self.map.tile(position))
            })
        } else if tile.floor_change() {
            tile.position.above().and_then(|above| {
                let delta = nudge(tile, -1);
                above.offset(delta).and_then(|position| self.map.tile(position))
            })
        } else {
            None
        };

        let (destination, flags) = match target {
            Some(found) => (found, flags | FLAG_NO_LIMIT),
            None => (tile, flags),
        };
        Destination {
            position: destination.position,
            blocking_item: destination.top_down_item().map(|item| item.id),
            flags,
        }
    }
}

// Going down (`sign = 1`) moves against each marker; going up follows it.
fn nudge(tile: &Tile, sign: i16) -> PositionDelta {
    let mut dx = 0i16;
    let mut dy = 0i16;
    if tile.has_flag(TileFlags::FLOOR_CHANGE_NORTH) {
        dy += sign;
    }
    if tile.has_flag(TileFlags::FLOOR_CHANGE_SOUTH) {
        dy -= sign;
    }
    if tile.has_flag(TileFlags::FLOOR_CHANGE_EAST) {
        dx -= sign;
    }
    if tile.has_flag(TileFlags::FLOOR_CHANGE_WEST) {
        dx += sign;
    }
    PositionDelta { dx, dy, dz: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::conditions::ConditionKind;
    use crate::combat::damage::{DamageType, Immunities};
    use crate::entities::creature::CreatureId;
    use crate::entities::thing::Thing;
    use crate::world::fixtures::{self, catalog, item};

    const HERE: Position = Position::new(100, 100, 7);

    struct Fixture {
        map: Map,
        creatures: CreatureRegistry,
        types: ItemTypeIndex,
    }

    impl Fixture {
        fn new() -> Self {
            let types = catalog();
            let mut map = Map::new("test");
            let tile = map.tile_or_insert(HERE);
            tile.set_ground(item(fixtures::GRASS), &types);
            Self {
                map,
                creatures: CreatureRegistry::default(),
                types,
            }
        }

        fn placement(&self) -> Placement<'_> {
            Placement::new(&self.map, &self.creatures, &self.types)
        }

        fn tile(&self) -> &Tile {
            self.map.tile(HERE).expect("tile")
        }

        fn tile_mut(&mut self) -> &mut Tile {
            self.map.tile_mut(HERE).expect("tile")
        }

        fn put(&mut self, type_id: crate::entities::item::ItemTypeId) -> ItemId {
            let new_item = item(type_id);
            let id = new_item.id;
            let types = self.types.clone();
            self.tile_mut()
                .internal_add(Thing::Item(new_item), &types)
                .expect("add");
            id
        }

        fn spawn(&mut self, creature: Creature, at: Option<Position>) -> CreatureId {
            let id = creature.id;
            let mut creature = creature;
            creature.position = at;
            self.creatures.insert(creature).expect("spawn");
            if let Some(position) = at {
                self.map.tile_or_insert(position).insert_creature(id);
            }
            id
        }

        fn can_add_creature(&self, id: CreatureId, flags: u32) -> ReturnValue {
            self.placement()
                .query_add(self.tile(), ThingRef::Creature(id), flags)
        }

        fn can_add_item(&self, candidate: &Item, flags: u32) -> ReturnValue {
            self.placement()
                .query_add(self.tile(), ThingRef::Item(candidate), flags)
        }
    }

    fn brute() -> ActorData {
        ActorData {
            can_push_creatures: true,
            can_push_items: true,
            ..ActorData::default()
        }
    }

    #[test]
    fn creature_needs_ground() {
        let mut fixture = Fixture::new();
        let id = fixture.spawn(Creature::player(CreatureId(1), "Hero"), None);
        let bare = Tile::new(Position::new(1, 1, 7));
        let result = fixture
            .placement()
            .query_add(&bare, ThingRef::Creature(id), 0);
        assert_eq!(result, ReturnValue::NotPossible);
        assert_eq!(
            fixture
                .placement()
                .query_add(&bare, ThingRef::Creature(id), FLAG_NO_LIMIT),
            ReturnValue::NoError
        );
    }

    #[test]
    fn pathfinding_avoids_floor_changes_and_teleports() {
        let mut fixture = Fixture::new();
        let id = fixture.spawn(Creature::npc(CreatureId(1), "Guide"), None);
        fixture.put(fixtures::PORTAL);
        assert_eq!(
            fixture.can_add_creature(id, FLAG_PATHFINDING),
            ReturnValue::NotPossible
        );
        assert_eq!(fixture.can_add_creature(id, 0), ReturnValue::NoError);
    }

    #[test]
    fn hidden_occupant_does_not_block_but_still_counts() {
        let mut fixture = Fixture::new();
        let mut ghost = Creature::player(CreatureId(1), "Ghost");
        ghost.hidden = true;
        fixture.spawn(ghost, Some(HERE));
        let hero = fixture.spawn(Creature::player(CreatureId(2), "Hero"), Some(Position::new(101, 100, 7)));
        let rat = fixture.spawn(
            Creature::actor(CreatureId(3), "Rat", ActorData::default()),
            Some(Position::new(102, 100, 7)),
        );
        assert_eq!(fixture.can_add_creature(hero, 0), ReturnValue::NoError);
        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NoError);
        assert_eq!(fixture.tile().creature_count(), 1);

        fixture.spawn(Creature::npc(CreatureId(4), "Sam"), Some(HERE));
        assert_eq!(fixture.can_add_creature(hero, 0), ReturnValue::NotEnoughRoom);
        assert_eq!(
            fixture.can_add_creature(hero, FLAG_IGNORE_BLOCK_CREATURE),
            ReturnValue::NoError
        );
        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NotEnoughRoom);
    }

    #[test]
    fn pushing_actor_needs_pushable_occupants() {
        let mut fixture = Fixture::new();
        let troll = fixture.spawn(
            Creature::actor(CreatureId(1), "Troll", brute()),
            Some(Position::new(101, 100, 7)),
        );
        fixture.spawn(
            Creature::actor(CreatureId(2), "Rat", ActorData::default()),
            Some(HERE),
        );
        assert_eq!(fixture.can_add_creature(troll, 0), ReturnValue::NoError);

        let pet = ActorData {
            is_player_summon: true,
            ..ActorData::default()
        };
        fixture.spawn(Creature::actor(CreatureId(3), "Pet", pet), Some(HERE));
        assert_eq!(fixture.can_add_creature(troll, 0), ReturnValue::NotPossible);
    }

    #[test]
    fn actor_rules_for_zones_and_items() {
        let mut fixture = Fixture::new();
        let rat = fixture.spawn(
            Creature::actor(CreatureId(1), "Rat", ActorData::default()),
            None,
        );
        let troll = fixture.spawn(Creature::actor(CreatureId(2), "Troll", brute()), None);

        fixture.tile_mut().zone.set(ZoneKind::ProtectionZone);
        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NotPossible);
        fixture.tile_mut().zone = Default::default();

        fixture.put(fixtures::CRATE);
        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NotPossible);
        assert_eq!(
            fixture.can_add_creature(rat, FLAG_IGNORE_BLOCK_ITEM),
            ReturnValue::NoError
        );
        assert_eq!(fixture.can_add_creature(troll, 0), ReturnValue::NoError);

        fixture.put(fixtures::WALL);
        assert_eq!(fixture.can_add_creature(troll, 0), ReturnValue::NotPossible);
    }

    #[test]
    fn fixed_path_blocker_stops_pathfinding_actors() {
        let mut fixture = Fixture::new();
        let rat = fixture.spawn(
            Creature::actor(CreatureId(1), "Rat", ActorData::default()),
            None,
        );
        let troll = fixture.spawn(Creature::actor(CreatureId(2), "Troll", brute()), None);
        fixture.put(fixtures::THORNS);
        assert!(fixture.tile().has_flag(TileFlags::BLOCK_PATH_NOT_FIELD));
        assert!(fixture.tile().has_flag(TileFlags::BLOCK_PATH_NOT_MOVEABLE));
        assert!(!fixture.tile().has_flag(TileFlags::BLOCK_SOLID));

        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NoError);
        assert_eq!(fixture.can_add_creature(troll, 0), ReturnValue::NoError);
        assert_eq!(
            fixture.can_add_creature(rat, FLAG_PATHFINDING),
            ReturnValue::NotPossible
        );
        assert_eq!(
            fixture.can_add_creature(troll, FLAG_PATHFINDING),
            ReturnValue::NotPossible
        );
        assert_eq!(
            fixture.can_add_creature(troll, FLAG_PATHFINDING | FLAG_IGNORE_BLOCK_ITEM),
            ReturnValue::NotPossible
        );
    }

    #[test]
    fn moveable_path_blocker_only_stops_pathfinding() {
        let mut fixture = Fixture::new();
        let rat = fixture.spawn(
            Creature::actor(CreatureId(1), "Rat", ActorData::default()),
            None,
        );
        let pusher = fixture.spawn(
            Creature::actor(
                CreatureId(2),
                "Orc",
                ActorData {
                    can_push_items: true,
                    ..ActorData::default()
                },
            ),
            None,
        );
        fixture.put(fixtures::CART);
        assert!(fixture.tile().has_flag(TileFlags::BLOCK_PATH_NOT_FIELD));
        assert!(!fixture.tile().has_flag(TileFlags::BLOCK_PATH_NOT_MOVEABLE));
        assert!(!fixture.tile().has_flag(TileFlags::BLOCK_SOLID));

        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NoError);
        assert_eq!(
            fixture.can_add_creature(rat, FLAG_PATHFINDING),
            ReturnValue::NotPossible
        );
        assert_eq!(
            fixture.can_add_creature(rat, FLAG_PATHFINDING | FLAG_IGNORE_BLOCK_ITEM),
            ReturnValue::NoError
        );
        assert_eq!(
            fixture.can_add_creature(pusher, FLAG_PATHFINDING),
            ReturnValue::NoError
        );
    }

    #[test]
    fn actor_and_magic_fields() {
        let mut fixture = Fixture::new();
        fixture.put(fixtures::FIRE_FIELD);
        let rat = fixture.spawn(
            Creature::actor(CreatureId(1), "Rat", ActorData::default()),
            None,
        );
        let imp = fixture.spawn(
            Creature::actor(
                CreatureId(2),
                "Imp",
                ActorData {
                    immunities: Immunities::NONE.with(DamageType::Fire),
                    ..ActorData::default()
                },
            ),
            None,
        );
        let mut burning = ActorData::default();
        burning.conditions.insert(ConditionKind::Fire);
        let burning = fixture.spawn(Creature::actor(CreatureId(3), "Torch", burning), None);

        assert_eq!(fixture.can_add_creature(rat, 0), ReturnValue::NotPossible);
        assert_eq!(
            fixture.can_add_creature(rat, FLAG_IGNORE_FIELD_DAMAGE),
            ReturnValue::NotPossible
        );
        assert_eq!(fixture.can_add_creature(imp, 0), ReturnValue::NoError);
        assert_eq!(fixture.can_add_creature(burning, 0), ReturnValue::NotPossible);
        assert_eq!(
            fixture.can_add_creature(burning, FLAG_IGNORE_FIELD_DAMAGE),
            ReturnValue::NoError
        );
    }

    #[test]
    fn zone_locked_player_transitions() {
        let mut fixture = Fixture::new();
        let arena = Position::new(101, 100, 7);
        fixture.map.tile_or_insert(arena).zone.set(ZoneKind::PvpZone);
        let mut hunter = Creature::player(CreatureId(1), "Hunter");
        if let crate::entities::creature::CreatureKind::Player(data) = &mut hunter.kind {
            data.zone_locked = true;
        }
        let hunter = fixture.spawn(hunter, Some(arena));

        assert_eq!(fixture.can_add_creature(hunter, 0), ReturnValue::ZoneLockedLeaving);

        fixture.tile_mut().zone.set(ZoneKind::PvpZone);
        assert_eq!(fixture.can_add_creature(hunter, 0), ReturnValue::NoError);

        let outside = Position::new(102, 100, 7);
        fixture.map.tile_or_insert(outside);
        fixture.map.tile_mut(arena).expect("arena").take_creature(hunter);
        fixture.map.tile_mut(outside).expect("outside").insert_creature(hunter);
        fixture.creatures.get_mut(hunter).expect("hunter").position = Some(outside);
        assert_eq!(fixture.can_add_creature(hunter, 0), ReturnValue::ZoneLockedEntering);

        fixture.tile_mut().zone = Default::default();
        fixture.tile_mut().zone.set(ZoneKind::ProtectionZone);
        assert_eq!(fixture.can_add_creature(hunter, 0), ReturnValue::ZoneLocked);
    }

    #[test]
    fn no_logout_tile_refuses_login() {
        let mut fixture = Fixture::new();
        fixture.tile_mut().zone.set(ZoneKind::NoLogout);
        let fresh = fixture.spawn(Creature::player(CreatureId(1), "Fresh"), None);
        let walker = fixture.spawn(
            Creature::player(CreatureId(2), "Walker"),
            Some(Position::new(101, 100, 7)),
        );
        assert_eq!(fixture.can_add_creature(fresh, 0), ReturnValue::NotPossible);
        assert_eq!(fixture.can_add_creature(walker, 0), ReturnValue::NoError);
    }

    #[test]
    fn player_item_checks() {
        let mut fixture = Fixture::new();
        let hero = fixture.spawn(Creature::player(CreatureId(1), "Hero"), None);
        fixture.put(fixtures::CRATE);
        assert_eq!(fixture.can_add_creature(hero, 0), ReturnValue::NotEnoughRoom);
        assert_eq!(
            fixture.can_add_creature(hero, FLAG_IGNORE_BLOCK_ITEM),
            ReturnValue::NoError
        );
        fixture.put(fixtures::WALL);
        assert_eq!(
            fixture.can_add_creature(hero, FLAG_IGNORE_BLOCK_ITEM),
            ReturnValue::NotPossible
        );
    }

    #[test]
    fn item_needs_ground_unless_hangable() {
        let fixture = Fixture::new();
        let bare = Tile::new(Position::new(1, 1, 7));
        let placement = fixture.placement();
        let chair = item(fixtures::CHAIR);
        let picture = item(fixtures::PICTURE);
        assert_eq!(
            placement.query_add(&bare, ThingRef::Item(&chair), 0),
            ReturnValue::NotPossible
        );
        assert_eq!(
            placement.query_add(&bare, ThingRef::Item(&picture), 0),
            ReturnValue::NoError
        );
    }

    #[test]
    fn solid_item_blocked_by_visible_creature() {
        let mut fixture = Fixture::new();
        fixture.spawn(Creature::npc(CreatureId(1), "Sam"), Some(HERE));
        let crate_box = item(fixtures::CRATE);
        let coin = item(fixtures::COIN);
        assert_eq!(fixture.can_add_item(&crate_box, 0), ReturnValue::NotEnoughRoom);
        assert_eq!(
            fixture.can_add_item(&crate_box, FLAG_IGNORE_BLOCK_CREATURE),
            ReturnValue::NoError
        );
        assert_eq!(fixture.can_add_item(&coin, 0), ReturnValue::NoError);
    }

    #[test]
    fn pickupables_and_solid_items() {
        let mut fixture = Fixture::new();
        fixture.put(fixtures::TABLE);
        let coin = item(fixtures::COIN);
        let chair = item(fixtures::CHAIR);
        assert_eq!(fixture.can_add_item(&coin, 0), ReturnValue::NoError);
        assert_eq!(fixture.can_add_item(&chair, 0), ReturnValue::NotEnoughRoom);

        let mut fixture = Fixture::new();
        fixture.put(fixtures::STATUE);
        assert_eq!(fixture.can_add_item(&coin, 0), ReturnValue::NotEnoughRoom);

        let mut fixture = Fixture::new();
        fixture.put(fixtures::BED);
        assert_eq!(fixture.can_add_item(&coin, 0), ReturnValue::NotEnoughRoom);

        let mut fixture = Fixture::new();
        fixture.put(fixtures::CRATE);
        assert_eq!(fixture.can_add_item(&coin, 0), ReturnValue::NoError);
    }

    #[test]
    fn second_hangable_needs_exchange() {
        let mut fixture = Fixture::new();
        fixture.put(fixtures::HOOK_WALL);
        let first = item(fixtures::PICTURE);
        assert_eq!(fixture.can_add_item(&first, 0), ReturnValue::NoError);
        fixture.put(fixtures::PICTURE);
        let second = item(fixtures::PICTURE);
        assert_eq!(fixture.can_add_item(&second, 0), ReturnValue::NeedsExchange);
        let chair = item(fixtures::CHAIR);
        assert_eq!(fixture.can_add_item(&chair, 0), ReturnValue::NotEnoughRoom);
    }

    #[test]
    fn capacity_check_precedes_no_limit() {
        let mut fixture = Fixture::new();
        let types = fixture.types.clone();
        for _ in 0..MAX_TILE_ITEMS - 1 {
            fixture
                .tile_mut()
                .insert_down(item(fixtures::COIN), &types)
                .expect("room");
        }
        let coin = item(fixtures::COIN);
        assert_eq!(fixture.can_add_item(&coin, 0), ReturnValue::NoError);
        fixture
            .tile_mut()
            .insert_down(item(fixtures::COIN), &types)
            .expect("room");
        assert_eq!(
            fixture.can_add_item(&coin, FLAG_NO_LIMIT),
            ReturnValue::CapacityExceeded
        );
    }

    #[test]
    fn removal_rules() {
        let mut fixture = Fixture::new();
        let stack = Item::new(fixtures::COIN, 10);
        let stack_id = stack.id;
        let types = fixture.types.clone();
        fixture.tile_mut().insert_down(stack, &types).expect("room");
        let wall = fixture.put(fixtures::WALL);
        let placement = fixture.placement();
        let tile = fixture.tile();

        let key = ThingKey::Item(stack_id);
        assert_eq!(placement.query_remove(tile, key, 10, 0), ReturnValue::NoError);
        assert_eq!(placement.query_remove(tile, key, 11, 0), ReturnValue::NotPossible);
        assert_eq!(placement.query_remove(tile, key, 0, 0), ReturnValue::NotPossible);
        assert_eq!(
            placement.query_remove(tile, ThingKey::Item(wall), 1, 0),
            ReturnValue::NotMoveable
        );
        assert_eq!(
            placement.query_remove(tile, ThingKey::Item(wall), 1, FLAG_IGNORE_NOT_MOVEABLE),
            ReturnValue::NoError
        );
        assert_eq!(
            placement.query_remove(tile, ThingKey::Item(ItemId(u32::MAX)), 1, 0),
            ReturnValue::NotPossible
        );
        assert_eq!(
            placement.query_remove(tile, ThingKey::Creature(CreatureId(1)), 1, 0),
            ReturnValue::NotPossible
        );
        assert_eq!(query_max_count(0), 1);
        assert_eq!(query_max_count(25), 25);
    }

    #[test]
    fn hole_redirects_against_lower_ramp() {
        let mut fixture = Fixture::new();
        let types = fixture.types.clone();
        let hole = Position::new(50, 50, 7);
        fixture
            .map
            .tile_or_insert(hole)
            .set_ground(item(fixtures::HOLE), &types);
        fixture
            .map
            .tile_or_insert(Position::new(50, 50, 8))
            .set_ground(item(fixtures::RAMP_NORTH), &types);
        let landing = Position::new(50, 51, 8);
        let lander = Item::new(fixtures::CHAIR, 1);
        let lander_id = lander.id;
        fixture
            .map
            .tile_or_insert(landing)
            .insert_down(lander, &types)
            .expect("room");

        let placement = fixture.placement();
        let tile = fixture.map.tile(hole).expect("hole");
        let destination = placement.resolve_destination(tile, 0);
        assert_eq!(destination.position, landing);
        assert_eq!(destination.blocking_item, Some(lander_id));
        assert!(has_bit(destination.flags, FLAG_NO_LIMIT));
    }

    #[test]
    fn ramp_leads_up_in_its_direction() {
        let mut fixture = Fixture::new();
        let types = fixture.types.clone();
        let ramp = Position::new(60, 60, 8);
        fixture
            .map
            .tile_or_insert(ramp)
            .set_ground(item(fixtures::RAMP_NORTH), &types);
        let placement = fixture.placement();
        let tile = fixture.map.tile(ramp).expect("ramp");
        let destination = placement.resolve_destination(tile, FLAG_PATHFINDING);
        assert_eq!(destination.position, ramp);
        assert_eq!(destination.flags, FLAG_PATHFINDING);

        fixture.map.tile_or_insert(Position::new(60, 59, 7));
        let placement = fixture.placement();
        let tile = fixture.map.tile(ramp).expect("ramp");
        let destination = placement.resolve_destination(tile, 0);
        assert_eq!(destination.position, Position::new(60, 59, 7));
        assert_eq!(destination.blocking_item, None);
        assert_eq!(destination.flags, FLAG_NO_LIMIT);
    }

    #[test]
    fn every_ramp_direction_shifts_both_ways() {
        let mut fixture = Fixture::new();
        let types = fixture.types.clone();
        // ramp, landing shift when falling onto it, exit shift when climbing it
        let cases = [
            (fixtures::RAMP_NORTH, (0, 1), (0, -1)),
            (fixtures::RAMP_SOUTH, (0, -1), (0, 1)),
            (fixtures::RAMP_EAST, (-1, 0), (1, 0)),
            (fixtures::RAMP_WEST, (1, 0), (-1, 0)),
        ];
        for (case, (ramp_type, down, up)) in cases.into_iter().enumerate() {
            let x = 70 + 10 * case as u16;
            let shifted = |(dx, dy): (i32, i32), z: u8| {
                Position::new((i32::from(x) + dx) as u16, (50 + dy) as u16, z)
            };
            let hole = Position::new(x, 50, 7);
            let ramp = Position::new(x, 50, 8);
            fixture
                .map
                .tile_or_insert(hole)
                .set_ground(item(fixtures::HOLE), &types);
            fixture
                .map
                .tile_or_insert(ramp)
                .set_ground(item(ramp_type), &types);
            fixture.map.tile_or_insert(shifted(down, 8));
            fixture.map.tile_or_insert(shifted(up, 7));

            let placement = fixture.placement();
            let fallen = placement.resolve_destination(fixture.map.tile(hole).expect("hole"), 0);
            assert_eq!(fallen.position, shifted(down, 8), "falling onto {:?}", ramp_type);
            let climbed = placement.resolve_destination(fixture.map.tile(ramp).expect("ramp"), 0);
            assert_eq!(climbed.position, shifted(up, 7), "climbing {:?}", ramp_type);
            assert_eq!(climbed.flags, FLAG_NO_LIMIT);
        }
    }

    #[test]
    fn plain_tile_resolves_to_itself() {
        let fixture = Fixture::new();
        let destination = fixture.placement().resolve_destination(fixture.tile(), 0);
        assert_eq!(destination.position, HERE);
        assert_eq!(destination.flags, 0);
    }

    #[test]
    fn outcomes_render_messages() {
        assert!(ReturnValue::NoError.is_ok());
        assert!(!ReturnValue::NeedsExchange.is_ok());
        assert_eq!(ReturnValue::NotEnoughRoom.to_string(), "There is not enough room.");
    }
}

//! Shared item catalog for the world tests.

use crate::entities::item::{Item, ItemTypeId};
use crate::world::item_types::ItemTypeIndex;

pub const GRASS: ItemTypeId = ItemTypeId(100);
pub const MARBLE: ItemTypeId = ItemTypeId(101);
pub const HOLE: ItemTypeId = ItemTypeId(102);
pub const RAMP_NORTH: ItemTypeId = ItemTypeId(103);
pub const RAMP_SOUTH: ItemTypeId = ItemTypeId(104);
pub const RAMP_EAST: ItemTypeId = ItemTypeId(105);
pub const RAMP_WEST: ItemTypeId = ItemTypeId(106);
pub const BORDER: ItemTypeId = ItemTypeId(200);
pub const ARCHWAY: ItemTypeId = ItemTypeId(201);
pub const BLOOD: ItemTypeId = ItemTypeId(202);
pub const PORTAL: ItemTypeId = ItemTypeId(203);
pub const COIN: ItemTypeId = ItemTypeId(300);
pub const CHAIR: ItemTypeId = ItemTypeId(301);
pub const WALL: ItemTypeId = ItemTypeId(302);
pub const CRATE: ItemTypeId = ItemTypeId(303);
pub const TABLE: ItemTypeId = ItemTypeId(304);
pub const PARCEL: ItemTypeId = ItemTypeId(305);
pub const MAILBOX: ItemTypeId = ItemTypeId(306);
pub const DUSTBIN: ItemTypeId = ItemTypeId(307);
pub const FIRE_FIELD: ItemTypeId = ItemTypeId(308);
pub const ENERGY_FIELD: ItemTypeId = ItemTypeId(309);
pub const PICTURE: ItemTypeId = ItemTypeId(310);
pub const HOOK_WALL: ItemTypeId = ItemTypeId(311);
pub const BED: ItemTypeId = ItemTypeId(312);
pub const STATUE: ItemTypeId = ItemTypeId(313);
pub const THORNS: ItemTypeId = ItemTypeId(314);
pub const CART: ItemTypeId = ItemTypeId(315);

const CATALOG: &str = r#"
- { id: 100, name: grass, ground: true }
- { id: 101, name: marble floor, ground: true, has_height: true }
- { id: 102, name: hole, ground: true, floor_change: { down: true } }
- { id: 103, name: ramp, ground: true, floor_change: { north: true } }
- { id: 104, name: ramp, ground: true, floor_change: { south: true } }
- { id: 105, name: ramp, ground: true, floor_change: { east: true } }
- { id: 106, name: ramp, ground: true, floor_change: { west: true } }
- { id: 200, name: grass border, always_on_top: true, top_order: 1, look_through: true }
- { id: 201, name: archway, always_on_top: true, top_order: 3 }
- { id: 202, name: blood, always_on_top: true, top_order: 1, role: splash, look_through: true }
- { id: 203, name: magic portal, always_on_top: true, top_order: 1, role: teleport }
- { id: 300, name: gold coin, moveable: true, pickupable: true, stackable: true }
- { id: 301, name: chair, moveable: true }
- { id: 302, name: stone wall, block_solid: true, block_path: true, block_projectile: true }
- { id: 303, name: crate, block_solid: true, block_path: true, moveable: true, has_height: true }
- { id: 304, name: table, block_solid: true, block_path: true, moveable: true, has_height: true, allow_pickupable: true }
- { id: 305, name: parcel, moveable: true, pickupable: true, mailable: true }
- { id: 306, name: mailbox, block_solid: true, block_path: true, allow_pickupable: true, role: mailbox }
- { id: 307, name: dustbin, role: trash_holder }
- { id: 308, name: fire field, role: magic_field, field_damage: fire, replaceable: true }
- { id: 309, name: energy field, role: magic_field, field_damage: energy }
- { id: 310, name: picture, hangable: true, moveable: true, pickupable: true }
- { id: 311, name: wall with hook, block_solid: true, block_path: true, horizontal: true }
- { id: 312, name: bed, block_solid: true, block_path: true, role: bed, has_height: true }
- { id: 313, name: statue, block_solid: true, block_path: true, moveable: true }
- { id: 314, name: thorn bush, block_path: true }
- { id: 315, name: cart, block_path: true, moveable: true }
"#;

pub fn catalog() -> ItemTypeIndex {
    ItemTypeIndex::parse(CATALOG).expect("fixture catalog")
}

pub fn item(type_id: ItemTypeId) -> Item {
    Item::new(type_id, 1)
}

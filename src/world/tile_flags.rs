use crate::world::item_types::{ItemRole, ItemType};
use serde::Deserialize;

/// Summary of the properties of every item on a tile.
///
/// Each bit is the OR of `TileFlags::of_item` over the tile's items, so the
/// whole value can always be rebuilt with `TileFlags::compute`. The tile keeps
/// it up to date incrementally; the two must never disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileFlags(u32);

impl TileFlags {
    pub const NONE: Self = Self(0);
    pub const FLOOR_CHANGE: Self = Self(1 << 0);
    pub const FLOOR_CHANGE_DOWN: Self = Self(1 << 1);
    pub const FLOOR_CHANGE_NORTH: Self = Self(1 << 2);
    pub const FLOOR_CHANGE_SOUTH: Self = Self(1 << 3);
    pub const FLOOR_CHANGE_EAST: Self = Self(1 << 4);
    pub const FLOOR_CHANGE_WEST: Self = Self(1 << 5);
    pub const BLOCK_SOLID: Self = Self(1 << 6);
    pub const BLOCK_SOLID_NOT_MOVEABLE: Self = Self(1 << 7);
    pub const BLOCK_PATH: Self = Self(1 << 8);
    pub const BLOCK_PATH_NOT_MOVEABLE: Self = Self(1 << 9);
    pub const BLOCK_PATH_NOT_FIELD: Self = Self(1 << 10);
    pub const BLOCK_PROJECTILE: Self = Self(1 << 11);
    pub const HORIZONTAL: Self = Self(1 << 12);
    pub const VERTICAL: Self = Self(1 << 13);
    pub const TELEPORT: Self = Self(1 << 14);
    pub const MAGIC_FIELD: Self = Self(1 << 15);
    pub const MAILBOX: Self = Self(1 << 16);
    pub const TRASH_HOLDER: Self = Self(1 << 17);
    pub const BED: Self = Self(1 << 18);

    const ALL_BITS: u32 = (1 << 19) - 1;

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the individual bits set in `self`.
    pub fn bits(self) -> impl Iterator<Item = TileFlags> {
        (0..32)
            .map(|shift| 1u32 << shift)
            .filter(move |bit| self.0 & bit != 0 && bit & Self::ALL_BITS != 0)
            .map(TileFlags)
    }

    /// The flags a single item contributes to its tile.
    pub fn of_item(item_type: &ItemType) -> Self {
        let mut flags = Self::NONE;
        let change = &item_type.floor_change;
        for (present, bit) in [
            (change.down, Self::FLOOR_CHANGE_DOWN),
            (change.north, Self::FLOOR_CHANGE_NORTH),
            (change.south, Self::FLOOR_CHANGE_SOUTH),
            (change.east, Self::FLOOR_CHANGE_EAST),
            (change.west, Self::FLOOR_CHANGE_WEST),
        ] {
            if present {
                flags.insert(Self::FLOOR_CHANGE);
                flags.insert(bit);
            }
        }

        if item_type.block_solid {
            flags.insert(Self::BLOCK_SOLID);
            if !item_type.moveable {
                flags.insert(Self::BLOCK_SOLID_NOT_MOVEABLE);
            }
        }
        if item_type.block_path {
            flags.insert(Self::BLOCK_PATH);
            if !item_type.moveable {
                flags.insert(Self::BLOCK_PATH_NOT_MOVEABLE);
            }
            if !item_type.is_magic_field() {
                flags.insert(Self::BLOCK_PATH_NOT_FIELD);
            }
        }
        if item_type.block_projectile {
            flags.insert(Self::BLOCK_PROJECTILE);
        }
        if item_type.horizontal {
            flags.insert(Self::HORIZONTAL);
        }
        if item_type.vertical {
            flags.insert(Self::VERTICAL);
        }
        match item_type.role {
            Some(ItemRole::Teleport) => flags.insert(Self::TELEPORT),
            Some(ItemRole::MagicField) => flags.insert(Self::MAGIC_FIELD),
            Some(ItemRole::Mailbox) => flags.insert(Self::MAILBOX),
            Some(ItemRole::TrashHolder) => flags.insert(Self::TRASH_HOLDER),
            Some(ItemRole::Bed) => flags.insert(Self::BED),
            Some(ItemRole::Splash) | None => {}
        }
        flags
    }

    /// From-scratch summary over a set of item types.
    pub fn compute<'a>(item_types: impl IntoIterator<Item = &'a ItemType>) -> Self {
        item_types
            .into_iter()
            .fold(Self::NONE, |mut flags, item_type| {
                flags.insert(Self::of_item(item_type));
                flags
            })
    }
}

impl std::ops::BitOr for TileFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Static properties a tile gets from the map, independent of its items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ZoneFlags(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    ProtectionZone,
    NoPvpZone,
    PvpZone,
    NoLogout,
    Refresh,
    House,
}

impl ZoneFlags {
    pub const NONE: Self = Self(0);

    fn bit(kind: ZoneKind) -> u8 {
        match kind {
            ZoneKind::ProtectionZone => 1,
            ZoneKind::NoPvpZone => 2,
            ZoneKind::PvpZone => 4,
            ZoneKind::NoLogout => 8,
            ZoneKind::Refresh => 16,
            ZoneKind::House => 32,
        }
    }

    pub fn with(mut self, kind: ZoneKind) -> Self {
        self.set(kind);
        self
    }

    pub fn set(&mut self, kind: ZoneKind) {
        self.0 |= Self::bit(kind);
    }

    pub fn has(self, kind: ZoneKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }
}

pub mod item_types;
pub mod map;
pub mod notify;
pub mod placement;
pub mod position;
pub mod spectators;
pub mod state;
pub mod tile;
pub mod tile_flags;
pub mod viewport;
pub mod zones;

#[cfg(test)]
pub(crate) mod fixtures;

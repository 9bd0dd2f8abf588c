pub mod combat;
mod config;
pub mod entities;
pub mod telemetry;
pub mod world;

pub use config::AppConfig;
pub use world::placement::{Placement, ReturnValue};
pub use world::state::{AddOutcome, Handoff, WorldState};
pub use world::tile::Tile;

pub fn run(args: &[String]) -> Result<(), String> {
    let config = config::AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;

    let item_types = world::item_types::ItemTypeIndex::load(&config.catalog_path)?;
    let zones = match config.zones_path.as_deref() {
        Some(path) => world::zones::ZoneConfig::load(path)?,
        None => world::zones::ZoneConfig::default(),
    };
    let type_count = item_types.len();
    let mut state = WorldState::new(
        world::map::Map::new("world"),
        item_types,
        config.viewport,
        config.spectator_cache,
    );
    let zoned_tiles = state.map_mut().apply_zones(&zones);

    telemetry::logging::log_game(&format!(
        "catalog loaded: types={}, zones={}, zoned_tiles={}, viewport={}x{}, spectator_cache={}",
        type_count,
        zones.zones.len(),
        zoned_tiles,
        config.viewport.width,
        config.viewport.height,
        config.spectator_cache
    ));
    println!("tibia-tiles: catalog");
    println!("- root: {}", config.root.display());
    println!("- catalog: {}", config.catalog_path.display());
    println!("- item types: {}", type_count);
    match config.zones_path.as_ref() {
        Some(path) => println!("- zones: {} from {}", zones.zones.len(), path.display()),
        None => println!("- zones: none"),
    }
    println!(
        "- viewport: {}x{}, spectator cache {}",
        config.viewport.width, config.viewport.height, config.spectator_cache
    );
    println!("- tiles: {}", state.map().tile_count());
    Ok(())
}

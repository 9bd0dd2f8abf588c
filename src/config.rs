use crate::world::spectators::DEFAULT_CACHE_CAPACITY;
use crate::world::viewport::ViewportSize;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub catalog_path: PathBuf,
    /// `<root>/zones.yaml`, when present.
    pub zones_path: Option<PathBuf>,
    pub viewport: ViewportSize,
    pub spectator_cache: usize,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: tibia-tiles <asset-root> [catalog-file]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let catalog_path = if args.len() > 2 {
            PathBuf::from(&args[2])
        } else {
            root.join("items.yaml")
        };
        let zones_path = Some(root.join("zones.yaml")).filter(|path| path.is_file());

        let defaults = ViewportSize::default();
        let viewport = ViewportSize {
            width: env_number("TIBIA_VIEW_WIDTH")?.unwrap_or(defaults.width),
            height: env_number("TIBIA_VIEW_HEIGHT")?.unwrap_or(defaults.height),
        };
        if viewport.width == 0 || viewport.height == 0 {
            return Err(format!(
                "viewport {}x{} must not be empty",
                viewport.width, viewport.height
            ));
        }
        let spectator_cache =
            env_number("TIBIA_SPECTATOR_CACHE")?.unwrap_or(DEFAULT_CACHE_CAPACITY);

        Ok(Self {
            root,
            catalog_path,
            zones_path,
            viewport,
            spectator_cache,
        })
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String> {
    let Some(value) = std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }) else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| format!("invalid {} '{}'", name, value))
}

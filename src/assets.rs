//! Sprite manifest
//!
//! The host loads the images; this module only knows their names, where they
//! live and how large they are drawn. A start-up check turns any missing
//! image into a fatal error before the simulation is created.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::sim::TowerKind;

/// Drawn size of tower bases, turrets and projectiles
pub const SPRITE_SIZE: f32 = 48.0;
pub const CASTLE_SIZE: f32 = 64.0;
pub const CONTROL_ICON_SIZE: f32 = 24.0;

/// One image the host must load before the game starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssetEntry {
    pub name: &'static str,
    pub path: &'static str,
    /// Display width and height in canvas pixels
    pub size: f32,
}

const fn entry(name: &'static str, path: &'static str, size: f32) -> AssetEntry {
    AssetEntry { name, path, size }
}

/// Every image the stock game ships with
pub const MANIFEST: &[AssetEntry] = &[
    entry("tower_base", "src/tower_base.png", SPRITE_SIZE),
    entry("archer_turret", "src/archer_turret.png", SPRITE_SIZE),
    entry("archer_projectile", "src/archer_projectile.png", SPRITE_SIZE),
    entry("cannon_turret", "src/cannon_turret.png", SPRITE_SIZE),
    entry("cannon_projectile", "src/cannon_projectile.png", SPRITE_SIZE),
    entry("ice_turret", "src/ice_turret.png", SPRITE_SIZE),
    entry("ice_projectile", "src/ice_projectile.png", SPRITE_SIZE),
    entry("castle", "src/castle.png", CASTLE_SIZE),
    entry("control_archer", "src/control_archer.png", CONTROL_ICON_SIZE),
    entry("control_cannon", "src/control_cannon.png", CONTROL_ICON_SIZE),
    entry("control_ice", "src/control_ice.png", CONTROL_ICON_SIZE),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("failed to load images: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// The verified set of loaded images
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    loaded: BTreeSet<String>,
}

impl AssetCatalog {
    /// Verify that every manifest entry is among `loaded`
    pub fn from_loaded<I, S>(loaded: I) -> Result<Self, AssetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let loaded: BTreeSet<String> = loaded.into_iter().map(Into::into).collect();
        let missing: Vec<String> = MANIFEST
            .iter()
            .filter(|e| !loaded.contains(e.name))
            .map(|e| e.name.to_string())
            .collect();

        if !missing.is_empty() {
            log::warn!("Missing assets: {missing:?}");
            return Err(AssetError::Missing(missing));
        }
        log::info!("{} assets ready", loaded.len());
        Ok(Self { loaded })
    }

    /// Catalog holding the whole manifest, for hosts that bundle every image
    pub fn complete() -> Self {
        Self {
            loaded: MANIFEST.iter().map(|e| e.name.to_string()).collect(),
        }
    }

    /// Whether an image exists for `key`; renderers fall back to shapes otherwise
    pub fn has_sprite(&self, key: &str) -> bool {
        self.loaded.contains(key)
    }

    pub fn display_size(&self, name: &str) -> Option<f32> {
        MANIFEST.iter().find(|e| e.name == name).map(|e| e.size)
    }

    /// Key of the build-button icon for a tower kind
    pub fn control_icon(kind: TowerKind) -> String {
        format!("control_{}", kind.name())
    }
}

//! Procedural map generation
//!
//! A level map is an orthogonal road through a coarse grid, routed between
//! random checkpoints that stay below the HUD strip, plus scattered props.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::geometry::dist_to_polyline_sq;
use crate::consts::*;
use crate::tuning::MapTuning;

/// HSL color as used by the canvas renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub fn css(&self) -> String {
        format!("hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Background and road colors derived from one hue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapColors {
    pub background: Hsl,
    pub road: Hsl,
}

impl MapColors {
    pub fn from_hue(hue: u16) -> Self {
        Self {
            background: Hsl { hue, saturation: 40, lightness: 40 },
            road: Hsl { hue, saturation: 20, lightness: 70 },
        }
    }
}

impl Default for MapColors {
    fn default() -> Self {
        Self::from_hue(120)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorationKind {
    Tree,
    Rock,
}

/// A purely decorative prop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub pos: Vec2,
    pub kind: DecorationKind,
}

/// Grid cell the road must pass through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub col: u32,
    pub row: u32,
}

/// Rows the road may use: `first..first + count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub first: u32,
    pub count: u32,
}

/// One generated level map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMap {
    pub width: f32,
    pub height: f32,
    /// Road waypoints, starting at the left edge and ending at the castle
    pub path: Vec<Vec2>,
    pub colors: MapColors,
    pub decorations: Vec<Decoration>,
}

impl GameMap {
    /// The castle sits on the last waypoint
    pub fn castle(&self) -> Option<Vec2> {
        self.path.last().copied()
    }

    pub fn cell_size(&self) -> Vec2 {
        cell_size(self.width, self.height)
    }
}

fn cell_size(width: f32, height: f32) -> Vec2 {
    Vec2::new(width / MAP_COLUMNS as f32, height / MAP_ROWS as f32)
}

/// Rows fully below the HUD strip
///
/// When the canvas is too short to leave any row free, the road falls back to
/// row 0 and may run under the HUD.
pub fn usable_rows(height: f32) -> RowRange {
    let cell_h = height / MAP_ROWS as f32;
    let first = (UI_EXCLUSION_HEIGHT / cell_h).ceil();
    if !first.is_finite() || first >= MAP_ROWS as f32 {
        log::error!(
            "Canvas height {} leaves no road rows below the {}px HUD, falling back to row 0",
            height,
            UI_EXCLUSION_HEIGHT
        );
        return RowRange { first: 0, count: 1 };
    }
    let first = first.max(0.0) as u32;
    RowRange {
        first,
        count: MAP_ROWS - first,
    }
}

fn random_row<R: Rng + ?Sized>(rng: &mut R, rows: RowRange) -> u32 {
    rows.first + rng.random_range(0..rows.count)
}

/// Checkpoints at column 0, every second column, and the last column
pub fn generate_checkpoints<R: Rng + ?Sized>(rng: &mut R, rows: RowRange) -> Vec<Checkpoint> {
    let mut checkpoints = vec![Checkpoint {
        col: 0,
        row: random_row(rng, rows),
    }];
    for col in (2..MAP_COLUMNS - 1).step_by(2) {
        checkpoints.push(Checkpoint {
            col,
            row: random_row(rng, rows),
        });
    }
    checkpoints.push(Checkpoint {
        col: MAP_COLUMNS - 1,
        row: random_row(rng, rows),
    });
    checkpoints
}

/// Manhattan routing: horizontal to the next column, then vertical to its row
pub fn route_path(checkpoints: &[Checkpoint], cell: Vec2) -> Vec<Vec2> {
    let Some(start) = checkpoints.first() else {
        return Vec::new();
    };
    let center_y = |row: u32| row as f32 * cell.y + cell.y / 2.0;

    let mut current_y = center_y(start.row);
    let mut path = vec![Vec2::new(0.0, current_y)];
    for cp in &checkpoints[1..] {
        let target_x = cp.col as f32 * cell.x + cell.x / 2.0;
        let target_y = center_y(cp.row);
        path.push(Vec2::new(target_x, current_y));
        path.push(Vec2::new(target_x, target_y));
        current_y = target_y;
    }
    path
}

/// Scatter props away from the road
///
/// Candidates are drawn a bounded number of times, so a crowded map simply
/// ends up with fewer props.
pub fn scatter_decorations<R: Rng + ?Sized>(
    rng: &mut R,
    path: &[Vec2],
    width: f32,
    height: f32,
    tree_weight: f64,
) -> Vec<Decoration> {
    let clearance_sq = DECORATION_CLEARANCE * DECORATION_CLEARANCE;
    let max_attempts = DECORATION_COUNT * 10;
    let mut decorations = Vec::with_capacity(DECORATION_COUNT);

    for _ in 0..max_attempts {
        if decorations.len() >= DECORATION_COUNT {
            break;
        }
        let pos = Vec2::new(rng.random::<f32>() * width, rng.random::<f32>() * height);
        let near_waypoint = path.iter().any(|wp| wp.distance_squared(pos) < clearance_sq);
        if near_waypoint || dist_to_polyline_sq(pos, path) < clearance_sq {
            continue;
        }
        let kind = if rng.random_bool(tree_weight) {
            DecorationKind::Tree
        } else {
            DecorationKind::Rock
        };
        decorations.push(Decoration { pos, kind });
    }
    decorations
}

/// Build a fresh level map
pub fn generate_map<R: Rng + ?Sized>(rng: &mut R, tuning: &MapTuning) -> GameMap {
    let colors = tuning
        .hue_palette
        .choose(rng)
        .map(|&hue| MapColors::from_hue(hue))
        .unwrap_or_default();
    let hue = colors.background.hue;

    let rows = usable_rows(tuning.height);
    let checkpoints = generate_checkpoints(rng, rows);
    let path = route_path(&checkpoints, cell_size(tuning.width, tuning.height));
    let decorations =
        scatter_decorations(rng, &path, tuning.width, tuning.height, tuning.tree_weight);

    log::debug!(
        "Generated map: hue {}, {} waypoints, {} decorations",
        hue,
        path.len(),
        decorations.len()
    );

    GameMap {
        width: tuning.width,
        height: tuning.height,
        path,
        colors,
        decorations,
    }
}

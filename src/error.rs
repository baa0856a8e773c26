//! Rejection reasons for player commands
//!
//! Every failure here is a policy rejection: the simulation state is left
//! untouched and the host decides whether to show a message.

use thiserror::Error;

use crate::sim::TowerKind;

/// Why a player command was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: u32, available: u32 },
    #[error("tower limit reached ({limit})")]
    TowerLimitReached { limit: usize },
    #[error("too close to the castle")]
    TooCloseToCastle,
    #[error("too close to another tower")]
    TooCloseToTower,
    #[error("cannot build on the road")]
    OnRoad,
    #[error("{kind:?} unlocks at wave {unlock_wave}")]
    Locked { kind: TowerKind, unlock_wave: u32 },
    #[error("no tower selected")]
    NoTowerSelected,
    #[error("tower {0} does not exist")]
    UnknownTower(u32),
    #[error("game is paused or over")]
    Halted,
    #[error("level is still in progress")]
    LevelInProgress,
}

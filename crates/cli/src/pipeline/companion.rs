//! Companion ("doge") proximity check.
//!
//! The companion sits at a fixed cell inside the maze; the session ends when
//! the avatar walks within its meet radius.

use contracts::{CompanionConfig, MazeLayout, Position};

/// Default companion cell, matching the reference placement
const DEFAULT_POSITION: [f64; 2] = [1.5, 2.5];

/// Companion with a latching meet check
#[derive(Debug, Clone)]
pub struct Companion {
    position: Position,
    radius_squared: f64,
    is_met: bool,
}

impl Companion {
    /// Place a companion explicitly
    pub fn new(position: Position, radius: f64) -> Self {
        Self {
            position,
            radius_squared: radius * radius,
            is_met: false,
        }
    }

    /// Place a companion from configuration, clamped into the maze
    pub fn from_config(config: &CompanionConfig, maze: &MazeLayout) -> Self {
        let [x, y] = config.position.unwrap_or(DEFAULT_POSITION);
        let position = Position::new(
            x.clamp(0.0, maze.width() as f64),
            y.clamp(0.0, maze.height() as f64),
        );
        Self::new(position, config.radius)
    }

    /// Check whether the avatar is inside the meet circle; latches once met
    pub fn check(&mut self, x: f64, y: f64) -> bool {
        let met = self.position.distance_squared(&Position::new(x, y)) < self.radius_squared;
        self.is_met |= met;
        met
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_met(&self) -> bool {
        self.is_met
    }
}

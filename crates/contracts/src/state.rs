//! Avatar state and maze data structures.
//!
//! Produced by the remote API, consumed read-only by observers (renderer,
//! companion check, log sinks). The client treats both as opaque snapshots.

use serde::{Deserialize, Serialize};

/// 2D position inside the maze, in maze units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another position
    pub fn distance_squared(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Server-authoritative avatar snapshot
///
/// Immutable once fetched; a new snapshot replaces the old one wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvatarState {
    /// Position in maze units
    pub position: Position,

    /// Heading in degrees, `[0, 360)` by server convention
    pub direction: f64,
}

impl AvatarState {
    pub fn new(x: f64, y: f64, direction: f64) -> Self {
        Self {
            position: Position::new(x, y),
            direction,
        }
    }
}

/// One wall of the maze: a segment between two grid points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub from: [f64; 2],
    pub to: [f64; 2],
}

/// Maze layout as delivered by the `getMaze` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeLayout {
    /// Grid size `[width, height]` in maze units
    pub size: [u32; 2],

    /// Wall segments, including the outer boundary
    pub walls: Vec<WallSegment>,
}

impl MazeLayout {
    pub fn width(&self) -> u32 {
        self.size[0]
    }

    pub fn height(&self) -> u32 {
        self.size[1]
    }
}

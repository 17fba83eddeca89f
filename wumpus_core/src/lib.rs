use std::fmt;

use serde::{Deserialize, Serialize};

pub mod agent;
pub mod map;
pub mod world;

pub use agent::{
    Action, ActionOutcome, Agent, GameState, Inventory, MoveEvent, MoveOutcome, Refusal,
    ShotEvent, ShotOutcome,
};
pub use world::{Content, World, WorldConfig, WorldError};

/// Represents a cell coordinate. Row 0 is the top edge of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four orthogonal directions the agent can face or move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns the `(row, col)` offset of a single step in this direction.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// A local sensory cue available to the agent at its current cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Percept {
    /// The cell itself holds the gold.
    Glitter,
    /// A neighbouring cell holds a pit.
    Breeze,
    /// A neighbouring cell holds the wumpus.
    Stench,
}

impl fmt::Display for Percept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Percept::Glitter => "Glitter",
            Percept::Breeze => "Breeze",
            Percept::Stench => "Stench",
        };
        f.write_str(name)
    }
}

/// The set of percepts sensed at one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Percepts {
    pub glitter: bool,
    pub breeze: bool,
    pub stench: bool,
}

impl Percepts {
    pub fn contains(&self, percept: Percept) -> bool {
        match percept {
            Percept::Glitter => self.glitter,
            Percept::Breeze => self.breeze,
            Percept::Stench => self.stench,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.glitter || self.breeze || self.stench)
    }

    /// Iterates the sensed percepts in a fixed order: glitter, breeze, stench.
    pub fn iter(&self) -> impl Iterator<Item = Percept> + use<> {
        let sensed = *self;
        [Percept::Glitter, Percept::Breeze, Percept::Stench]
            .into_iter()
            .filter(move |p| sensed.contains(*p))
    }
}

impl fmt::Display for Percepts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, percept) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("  ")?;
            }
            write!(f, "{percept}")?;
        }
        Ok(())
    }
}

//! Snake simulation engine
//!
//! - `field`: bordered grid, obstacles and timed bonus items
//! - `snake`: body chain and the movement/growth/shrink rules
//! - `engine`: per-tick orchestration, scoring and speed
//! - `config`: tuning constants and the game configuration
//!
//! Rendering, input and argument parsing live in the binary.

pub mod config;
pub mod engine;
pub mod field;
pub mod snake;

pub use config::GameConfig;
pub use engine::{Engine, Outcome, TickInput, TickReport};
pub use field::{Cell, Field, ItemKind, TemporaryItem};
pub use snake::Snake;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Grid coordinate. `y` is the row and `x` the column, origin at the top-left
/// border corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub y: u16,
    pub x: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PosDelta {
    pub y: i16,
    pub x: i16,
}

impl From<Direction> for PosDelta {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::North => PosDelta { y: -1, x: 0 },
            Direction::South => PosDelta { y: 1, x: 0 },
            Direction::East => PosDelta { y: 0, x: 1 },
            Direction::West => PosDelta { y: 0, x: -1 },
        }
    }
}

impl Pos {
    pub const fn new(y: u16, x: u16) -> Self {
        Pos { y, x }
    }

    /// Unbounded offset. Snakes only ever step from interior cells, so the
    /// result always lands on the grid (at worst on the border).
    pub fn offset(self, delta: PosDelta) -> Pos {
        Pos {
            y: self.y.wrapping_add_signed(delta.y),
            x: self.x.wrapping_add_signed(delta.x),
        }
    }

    pub fn step(self, dir: Direction) -> Pos {
        self.offset(dir.into())
    }
}

//! The playing field: a bordered grid of cells plus the timed bonus items
//! currently lying on it.
//!
//! The grid is the single source of truth for occupancy. Snakes keep their
//! own segment lists but always mirror them into the grid.

use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::{PlayerId, Pos};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    SnakeBody,
    Head(PlayerId),
    Food,
    Border,
    Obstacle,
    Shortener,
    Decelerator,
    ExtraPoints,
}

impl Cell {
    /// Entering a fatal cell ends the snake.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Cell::Border | Cell::SnakeBody | Cell::Head(_) | Cell::Obstacle
        )
    }
}

/// Bonus items that disappear on their own after a while
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Shortener,
    Decelerator,
    ExtraPoints,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [
        ItemKind::Shortener,
        ItemKind::Decelerator,
        ItemKind::ExtraPoints,
    ];
}

impl From<ItemKind> for Cell {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Shortener => Cell::Shortener,
            ItemKind::Decelerator => Cell::Decelerator,
            ItemKind::ExtraPoints => Cell::ExtraPoints,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemporaryItem {
    pub pos: Pos,
    pub kind: ItemKind,
    pub expiry: Instant,
}

#[derive(Clone, Debug)]
pub struct Field {
    height: u16,
    width: u16,
    /// Row-major, `height * width`
    cells: Vec<Cell>,
    items: Vec<TemporaryItem>,
}

impl Field {
    /// Builds a field with a border ring and scattered obstacles.
    ///
    /// Asks for `floor((height-2)*(width-2)*permille/1000)` obstacles and
    /// silently settles for fewer if the interior fills up first.
    pub fn new(height: u16, width: u16, obstacle_permille: u16, rng: &mut impl Rng) -> Self {
        let mut field = Field {
            height,
            width,
            cells: vec![Cell::Empty; height as usize * width as usize],
            items: Vec::new(),
        };

        for x in 0..width {
            field.set(Pos::new(0, x), Cell::Border);
            field.set(Pos::new(height - 1, x), Cell::Border);
        }
        for y in 0..height {
            field.set(Pos::new(y, 0), Cell::Border);
            field.set(Pos::new(y, width - 1), Cell::Border);
        }

        let requested = field.obstacle_quota(obstacle_permille);
        let spots = field
            .interior()
            .filter(|&pos| field.cell(pos) == Cell::Empty)
            .choose_multiple(rng, requested);
        let placed = spots.len();
        for pos in spots {
            field.set(pos, Cell::Obstacle);
        }
        if placed < requested {
            warn!("Only {} of {} obstacles fit in the field", placed, requested);
        }
        debug!("Field {}x{} created with {} obstacles", height, width, placed);

        field
    }

    fn obstacle_quota(&self, permille: u16) -> usize {
        let rows = self.height.saturating_sub(2) as usize;
        let columns = self.width.saturating_sub(2) as usize;
        rows * columns * permille as usize / 1000
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    fn index(&self, pos: Pos) -> usize {
        debug_assert!(
            pos.y < self.height && pos.x < self.width,
            "{:?} outside a {}x{} field",
            pos,
            self.height,
            self.width
        );
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// Cell kind at `pos`. The position must lie on the field.
    pub fn cell(&self, pos: Pos) -> Cell {
        self.cells[self.index(pos)]
    }

    pub(crate) fn set(&mut self, pos: Pos, cell: Cell) {
        let index = self.index(pos);
        self.cells[index] = cell;
    }

    /// Every non-border coordinate, row by row
    pub fn interior(&self) -> impl Iterator<Item = Pos> + '_ {
        let (height, width) = (self.height, self.width);
        (1..height.saturating_sub(1))
            .flat_map(move |y| (1..width.saturating_sub(1)).map(move |x| Pos::new(y, x)))
    }

    /// Interior coordinates at least two cells away from every border edge
    pub fn spawn_zone(&self) -> impl Iterator<Item = Pos> + '_ {
        let (height, width) = (self.height, self.width);
        (2..height.saturating_sub(2))
            .flat_map(move |y| (2..width.saturating_sub(2)).map(move |x| Pos::new(y, x)))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn items(&self) -> &[TemporaryItem] {
        &self.items
    }

    fn random_empty(&self, rng: &mut impl Rng) -> Option<Pos> {
        self.interior()
            .filter(|&pos| self.cell(pos) == Cell::Empty)
            .choose(rng)
    }

    /// Puts `kind` on a uniformly chosen empty interior cell.
    ///
    /// Returns false, leaving the field untouched, when the interior is full.
    pub fn place_random(&mut self, kind: Cell, rng: &mut impl Rng) -> bool {
        match self.random_empty(rng) {
            Some(pos) => {
                self.set(pos, kind);
                true
            }
            None => false,
        }
    }

    /// Places a bonus item that expires `duration` after `now`.
    pub fn add_temporary_item(
        &mut self,
        kind: ItemKind,
        duration: Duration,
        now: Instant,
        rng: &mut impl Rng,
    ) -> bool {
        let Some(pos) = self.random_empty(rng) else {
            return false;
        };
        self.set(pos, kind.into());
        self.items.push(TemporaryItem {
            pos,
            kind,
            expiry: now + duration,
        });
        true
    }

    /// Forgets the item lying at `pos` once a snake has eaten it, so a later
    /// item on the same cell is not cleared by the old record.
    pub fn take_item(&mut self, pos: Pos) -> Option<TemporaryItem> {
        let index = self.items.iter().position(|item| item.pos == pos)?;
        Some(self.items.swap_remove(index))
    }

    /// Drops every item whose expiry is at or before `now` and returns how
    /// many went.
    ///
    /// A cell is only cleared if it still holds the item; eaten items or ones
    /// a snake is lying on are left as they are.
    pub fn expire_items(&mut self, now: Instant) -> usize {
        let width = self.width as usize;
        let cells = &mut self.cells;
        let before = self.items.len();

        self.items.retain(|item| {
            if item.expiry > now {
                return true;
            }
            let index = item.pos.y as usize * width + item.pos.x as usize;
            if cells[index] == Cell::from(item.kind) {
                cells[index] = Cell::Empty;
            }
            false
        });

        before - self.items.len()
    }

    /// Pushes every expiry back by `delta`, used to hand back time spent
    /// paused.
    pub fn prolong(&mut self, delta: Duration) {
        for item in &mut self.items {
            item.expiry += delta;
        }
    }

    /// Puts an item at a chosen spot.
    #[cfg(test)]
    pub(crate) fn lay_item(&mut self, pos: Pos, kind: ItemKind, expiry: Instant) {
        self.set(pos, kind.into());
        self.items.push(TemporaryItem { pos, kind, expiry });
    }
}

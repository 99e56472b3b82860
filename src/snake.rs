use std::collections::VecDeque;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use crate::field::{Cell, Field};
use crate::{Direction, PlayerId, Pos};

/// A player's snake. The head is kept apart from the rest of the body, so a
/// snake can never be empty.
#[derive(Clone, Debug)]
pub struct Snake {
    player: PlayerId,
    head: Pos,
    /// Tail first, neck last
    body: VecDeque<Pos>,
    direction: Direction,
}

impl Snake {
    /// Drops a one-segment snake somewhere in the field's spawn zone, facing a
    /// random direction, and marks its head on the field.
    pub fn new(field: &mut Field, player: PlayerId, rng: &mut impl Rng) -> Self {
        let head = Self::spawn_point(field, rng);
        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        field.set(head, Cell::Head(player));

        Snake {
            player,
            head,
            body: VecDeque::new(),
            direction,
        }
    }

    /// Empty spawn-zone cells are preferred. On a crowded field any
    /// spawn-zone cell not held by another snake will do.
    fn spawn_point(field: &Field, rng: &mut impl Rng) -> Pos {
        let free: Vec<Pos> = field
            .spawn_zone()
            .filter(|&pos| !matches!(field.cell(pos), Cell::SnakeBody | Cell::Head(_)))
            .collect();

        free.iter()
            .copied()
            .filter(|&pos| field.cell(pos) == Cell::Empty)
            .choose(rng)
            .or_else(|| free.choose(rng).copied())
            .unwrap_or(Pos::new(field.height() / 2, field.width() / 2))
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn head(&self) -> Pos {
        self.head
    }

    pub fn tail(&self) -> Pos {
        self.body.front().copied().unwrap_or(self.head)
    }

    pub fn len(&self) -> usize {
        self.body.len() + 1
    }

    /// Segments from tail to head
    pub fn segments(&self) -> impl Iterator<Item = Pos> + '_ {
        self.body.iter().copied().chain(std::iter::once(self.head))
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Reversing straight into the neck is allowed and kills on the next step.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Moves one cell forward and returns what was in the entered cell.
    ///
    /// Fatal cells leave both the snake and the field untouched.
    pub fn advance(&mut self, field: &mut Field) -> Cell {
        let next = self.head.step(self.direction);
        let entered = field.cell(next);

        match entered {
            Cell::Food => self.push_head(field, next),
            Cell::Empty | Cell::Shortener | Cell::Decelerator | Cell::ExtraPoints => {
                if entered == Cell::Shortener {
                    self.shed_half(field);
                }
                self.push_head(field, next);
                self.pop_tail(field);
            }
            Cell::Border | Cell::SnakeBody | Cell::Head(_) | Cell::Obstacle => {}
        }

        entered
    }

    fn push_head(&mut self, field: &mut Field, pos: Pos) {
        field.set(self.head, Cell::SnakeBody);
        field.set(pos, Cell::Head(self.player));
        self.body.push_back(self.head);
        self.head = pos;
    }

    fn pop_tail(&mut self, field: &mut Field) {
        if let Some(tail) = self.body.pop_front() {
            field.set(tail, Cell::Empty);
        }
    }

    /// Drops half of the segments behind the head, rounded down, from the
    /// tail end. The head is not counted.
    fn shed_half(&mut self, field: &mut Field) {
        for _ in 0..self.body.len() / 2 {
            self.pop_tail(field);
        }
    }

    /// Lays out a snake along `segments` (tail first) and marks it on the field.
    #[cfg(test)]
    pub(crate) fn laid_out(
        field: &mut Field,
        player: PlayerId,
        segments: &[Pos],
        direction: Direction,
    ) -> Self {
        let (&head, rest) = segments.split_last().expect("at least one segment");
        for &pos in rest {
            field.set(pos, Cell::SnakeBody);
        }
        field.set(head, Cell::Head(player));

        Snake {
            player,
            head,
            body: rest.iter().copied().collect(),
            direction,
        }
    }
}

//! Per-tick orchestration
//!
//! One call to [`Engine::tick`] expires stale items, advances the snakes that
//! are due to move, and turns whatever they ran into into score, speed and
//! new items. The engine never reads the clock: `now` comes from the caller.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{self, GameConfig};
use crate::field::{Cell, Field, ItemKind};
use crate::snake::Snake;
use crate::{Direction, PlayerId};

/// What happened since the previous tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickInput {
    /// No key before the delay ran out: every live snake moves.
    Timeout,
    /// A direction key for one player: only that snake moves.
    Steer {
        player: PlayerId,
        direction: Direction,
    },
}

/// How the game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub died_first: PlayerId,
    /// The cell the first casualty ran into
    pub cause: Cell,
    /// Two-player only: the opponent, if it survived the final tick
    pub survivor: Option<PlayerId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The cell each snake that moved this tick ran into, in turn order
    pub consumed: Vec<(PlayerId, Cell)>,
    /// Set on the tick the game ends
    pub outcome: Option<Outcome>,
}

#[derive(Debug)]
struct Player {
    snake: Snake,
    score: u32,
    alive: bool,
}

/// Score awarded for entering `cell`
pub fn points(cell: Cell) -> u32 {
    match cell {
        Cell::Food => config::POINTS_FOOD,
        Cell::Shortener => config::POINTS_SHORTENER,
        Cell::Decelerator => config::POINTS_DECELERATOR,
        Cell::ExtraPoints => config::POINTS_EXTRA_POINTS,
        _ => 0,
    }
}

#[derive(Debug)]
pub struct Engine<R = StdRng> {
    config: GameConfig,
    field: Field,
    /// Turn order
    players: Vec<Player>,
    delay: Duration,
    outcome: Option<Outcome>,
    rng: R,
}

impl Engine<StdRng> {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> Engine<R> {
    /// Builds the field, spawns one snake per player and lays the first food.
    pub fn with_rng(config: GameConfig, mut rng: R) -> Self {
        let mut field = Field::new(
            config.height,
            config.width,
            config.obstacle_permille,
            &mut rng,
        );
        let players: Vec<Player> = config
            .players()
            .iter()
            .map(|&id| Player {
                snake: Snake::new(&mut field, id, &mut rng),
                score: 0,
                alive: true,
            })
            .collect();
        if !field.place_random(Cell::Food, &mut rng) {
            warn!("No room for the first food");
        }

        info!(
            "New {}-player game on a {}x{} field",
            config.players().len(),
            config.height,
            config.width
        );

        Engine {
            config,
            field,
            players,
            delay: config.starting_delay,
            outcome: None,
            rng,
        }
    }

    /// Runs one simulation step. Once the game is over this does nothing and
    /// returns an empty report.
    pub fn tick(&mut self, input: TickInput, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        if self.outcome.is_some() {
            return report;
        }

        let expired = self.field.expire_items(now);
        if expired > 0 {
            debug!("{} temporary items expired", expired);
        }

        let mut first_death = None;
        for index in 0..self.players.len() {
            let player = &mut self.players[index];
            if !player.alive {
                continue;
            }
            let id = player.snake.player();
            match input {
                TickInput::Timeout => {}
                TickInput::Steer { player: p, direction } if p == id => {
                    player.snake.set_direction(direction);
                }
                TickInput::Steer { .. } => continue,
            }

            let cell = player.snake.advance(&mut self.field);
            report.consumed.push((id, cell));

            if cell.is_fatal() {
                player.alive = false;
                info!("Player {} crashed into {:?}", id.number(), cell);
                if first_death.is_none() {
                    first_death = Some((id, cell));
                }
            } else {
                self.apply_effects(index, cell, now);
            }
        }

        if let Some((died_first, cause)) = first_death {
            let survivor = self
                .players
                .iter()
                .find(|p| p.alive)
                .map(|p| p.snake.player());
            let outcome = Outcome {
                died_first,
                cause,
                survivor,
            };
            info!("Game over: {:?}", outcome);
            self.outcome = Some(outcome);
            report.outcome = Some(outcome);
        }

        report
    }

    fn apply_effects(&mut self, index: usize, cell: Cell, now: Instant) {
        self.players[index].score += points(cell);

        match cell {
            Cell::Food => {
                self.delay = self
                    .delay
                    .saturating_sub(self.config.step_delay)
                    .max(self.config.minimum_delay);
                if !self.field.place_random(Cell::Food, &mut self.rng) {
                    warn!("No empty cell left for food");
                }
                self.roll_bonus_items(now);
            }
            Cell::Decelerator => self.delay = self.config.starting_delay,
            _ => {}
        }

        if matches!(cell, Cell::Shortener | Cell::Decelerator | Cell::ExtraPoints) {
            let head = self.players[index].snake.head();
            if self.field.take_item(head).is_none() {
                debug!("No timed item recorded at {:?}", head);
            }
        }
    }

    /// Independent 1-in-N rolls for each kind of bonus item
    fn roll_bonus_items(&mut self, now: Instant) {
        for kind in ItemKind::ALL {
            if !self.rng.gen_ratio(1, config::spawn_odds(kind)) {
                continue;
            }
            let duration = self.config.item_duration(kind);
            if self
                .field
                .add_temporary_item(kind, duration, now, &mut self.rng)
            {
                debug!("{:?} spawned for {:?}", kind, duration);
            }
        }
    }
}

impl<R> Engine<R> {
    /// Hands back time spent paused so no item expires during a pause.
    pub fn pause_elapsed(&mut self, paused_for: Duration) {
        debug!("Prolonging items by {:?}", paused_for);
        self.field.prolong(paused_for);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Players in turn order
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.snake.player())
    }

    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.snake.player() == id)
    }

    pub fn snake(&self, id: PlayerId) -> Option<&Snake> {
        self.player(id).map(|p| &p.snake)
    }

    pub fn score(&self, id: PlayerId) -> u32 {
        self.player(id).map_or(0, |p| p.score)
    }

    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.alive)
    }

    /// Time to wait for input before the next timeout tick
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

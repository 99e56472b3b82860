use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use cursnake::config::{MAXIMUM_SIDE, MINIMUM_SIDE};
use cursnake::{Cell, Direction, Engine, GameConfig, Outcome, PlayerId, TickInput};
use log::{info, warn};
use ratatui::{
    layout::Size,
    prelude::*,
    style::{Style, Stylize},
    widgets::*,
};

const KEYS_WIDTH: u16 = 28;

const BORDER_SYMBOL: &str = "*";
const BODY_SYMBOL: &str = "#";
const FOOD_SYMBOL: &str = "f";
const OBSTACLE_SYMBOL: &str = "X";
const SHORTENER_SYMBOL: &str = "s";
const DECELERATOR_SYMBOL: &str = "d";
const EXTRA_POINTS_SYMBOL: &str = "$";

#[derive(Debug)]
enum GameState {
    ReadyToStart,
    Playing(Engine),
    Paused { engine: Engine, since: Instant },
    GameOver(Engine),
    Exit,
}

pub struct App {
    state: GameState,
    config: GameConfig,
    use_terminal_dimensions: bool,
    arena_size: Option<Size>,
}

impl App {
    pub fn new(config: GameConfig, use_terminal_dimensions: bool) -> Self {
        App {
            state: GameState::ReadyToStart,
            config,
            use_terminal_dimensions,
            arena_size: None,
        }
    }

    pub fn should_exit(&self) -> bool {
        matches!(self.state, GameState::Exit)
    }

    /// How long to wait for a key before the next timeout tick. `None` blocks
    /// until a key arrives.
    pub fn wait_time(&self) -> Option<Duration> {
        match &self.state {
            GameState::Playing(engine) => Some(engine.delay()),
            _ => None,
        }
    }

    /// Whether the field can be drawn in full. Unknown before the first frame.
    fn fits(&self) -> bool {
        let Some(size) = self.arena_size else {
            return true;
        };
        let (height, width) = if self.use_terminal_dimensions {
            (MINIMUM_SIDE, MINIMUM_SIDE)
        } else {
            (self.config.height, self.config.width)
        };
        size.height >= height && size.width >= width
    }

    fn new_game(&self) -> Engine {
        let mut config = self.config;
        if self.use_terminal_dimensions {
            match self.arena_size {
                Some(size) => {
                    config.height = size.height.clamp(MINIMUM_SIDE, MAXIMUM_SIDE);
                    config.width = size.width.clamp(MINIMUM_SIDE, MAXIMUM_SIDE);
                }
                None => warn!("Arena size unknown, using {}x{}", config.height, config.width),
            }
        }
        Engine::new(config)
    }

    /// Maps a key to a steering input. Arrows belong to player two in a
    /// two-player game and to player one otherwise.
    fn steering(&self, code: KeyCode) -> Option<TickInput> {
        let arrows = if self.config.two_players {
            PlayerId::Two
        } else {
            PlayerId::One
        };
        let (player, direction) = match code {
            KeyCode::Char('w') | KeyCode::Char('k') => (PlayerId::One, Direction::North),
            KeyCode::Char('a') | KeyCode::Char('h') => (PlayerId::One, Direction::West),
            KeyCode::Char('s') | KeyCode::Char('j') => (PlayerId::One, Direction::South),
            KeyCode::Char('d') | KeyCode::Char('l') => (PlayerId::One, Direction::East),
            KeyCode::Up => (arrows, Direction::North),
            KeyCode::Left => (arrows, Direction::West),
            KeyCode::Down => (arrows, Direction::South),
            KeyCode::Right => (arrows, Direction::East),
            _ => return None,
        };
        Some(TickInput::Steer { player, direction })
    }

    fn step(mut engine: Engine, input: TickInput, now: Instant) -> GameState {
        let report = engine.tick(input, now);
        match report.outcome {
            Some(outcome) => {
                for id in engine.players() {
                    info!("Player {} final score: {}", id.number(), engine.score(id));
                }
                info!("{}", describe(&outcome));
                GameState::GameOver(engine)
            }
            None => GameState::Playing(engine),
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent, now: Instant) {
        let state = std::mem::replace(&mut self.state, GameState::Exit);

        self.state = match state {
            GameState::ReadyToStart => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => GameState::Exit,
                KeyCode::Char(' ') if self.fits() => GameState::Playing(self.new_game()),
                KeyCode::Char(' ') => {
                    warn!(
                        "Terminal too small for a {}x{} field",
                        self.config.height, self.config.width
                    );
                    GameState::ReadyToStart
                }
                _ => GameState::ReadyToStart,
            },
            GameState::Playing(engine) => match key.code {
                KeyCode::Char('q') => GameState::GameOver(engine),
                KeyCode::Esc => GameState::Exit,
                KeyCode::Char('p') => GameState::Paused { engine, since: now },
                code => match self.steering(code) {
                    Some(input) => Self::step(engine, input, now),
                    None => GameState::Playing(engine),
                },
            },
            GameState::Paused { mut engine, since } => match key.code {
                KeyCode::Char('q') => GameState::GameOver(engine),
                KeyCode::Esc => GameState::Exit,
                KeyCode::Char('p') | KeyCode::Char(' ') => {
                    engine.pause_elapsed(now.saturating_duration_since(since));
                    GameState::Playing(engine)
                }
                _ => GameState::Paused { engine, since },
            },
            GameState::GameOver(engine) => match key.code {
                KeyCode::Esc => GameState::Exit,
                KeyCode::Char(' ') | KeyCode::Char('q') => GameState::ReadyToStart,
                _ => GameState::GameOver(engine),
            },
            GameState::Exit => GameState::Exit,
        };
    }

    /// No key arrived within the delay
    pub fn update(&mut self, now: Instant) {
        let state = std::mem::replace(&mut self.state, GameState::Exit);

        self.state = match state {
            GameState::Playing(engine) => Self::step(engine, TickInput::Timeout, now),
            other => other,
        };
    }

    fn score_text(&self) -> String {
        match &self.state {
            GameState::Playing(engine)
            | GameState::Paused { engine, .. }
            | GameState::GameOver(engine) => {
                let scores: Vec<String> = engine
                    .players()
                    .map(|id| {
                        if self.config.two_players {
                            format!("Player {}: {}", id.number(), engine.score(id))
                        } else {
                            format!("Score: {}", engine.score(id))
                        }
                    })
                    .collect();
                format!("S N A K E    {}", scores.join("    "))
            }
            _ => "S N A K E".to_string(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let layout = Layout::default()
            .direction(layout::Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title + score
                Constraint::Min(0),    // Game area + keys
            ])
            .split(size);
        let body = Layout::default()
            .direction(layout::Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(KEYS_WIDTH)])
            .split(layout[1]);

        frame.render_widget(
            Paragraph::new(self.score_text())
                .alignment(Alignment::Left)
                .yellow()
                .block(Block::default().borders(Borders::ALL)),
            layout[0],
        );
        frame.render_widget(keys_legend(self.config.two_players), body[1]);

        match &self.state {
            GameState::ReadyToStart => {
                let block = Block::default();
                let inner_area = block.inner(body[0]);
                self.arena_size = Some(Size {
                    width: inner_area.width,
                    height: inner_area.height,
                });
                let prompt = if self.fits() {
                    Text::from("Press SPACE to start")
                } else {
                    Text::from(vec![
                        Line::from("Terminal too small").bold(),
                        Line::from(format!(
                            "The {}x{} field needs a bigger window",
                            self.config.height, self.config.width
                        )),
                        Line::from("Resize the terminal or press Esc"),
                    ])
                };
                frame.render_widget(
                    Paragraph::new(prompt)
                        .alignment(Alignment::Center)
                        .block(block),
                    body[0],
                );
            }
            GameState::Playing(engine) => {
                frame.render_widget(Board(engine), body[0]);
            }
            GameState::Paused { engine, .. } => {
                frame.render_widget(Board(engine), body[0]);
                frame.render_widget(
                    Paragraph::new("PAUSED")
                        .alignment(Alignment::Center)
                        .reversed(),
                    Rect { height: 1, ..body[0] },
                );
            }
            GameState::GameOver(engine) => {
                frame.render_widget(Board(engine), body[0]);
                let verdict = engine.outcome().map(|o| describe(&o)).unwrap_or_default();
                frame.render_widget(
                    Paragraph::new(format!(
                        "GAME OVER\n{}\nPress SPACE to play again",
                        verdict
                    ))
                    .alignment(Alignment::Center)
                    .bold(),
                    body[0],
                );
            }
            GameState::Exit => {}
        }
    }
}

fn describe(outcome: &Outcome) -> String {
    let what = match outcome.cause {
        Cell::Border => "the wall",
        Cell::Obstacle => "an obstacle",
        Cell::SnakeBody => "a snake",
        Cell::Head(_) => "a snake's head",
        _ => "something",
    };
    match outcome.survivor {
        Some(survivor) => format!(
            "Player {} crashed into {}. Player {} wins!",
            outcome.died_first.number(),
            what,
            survivor.number()
        ),
        None => format!(
            "Player {} crashed into {}",
            outcome.died_first.number(),
            what
        ),
    }
}

fn keys_legend(two_players: bool) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from("Keys").bold().centered(),
        Line::from(""),
        Line::from("Up:    w, k"),
        Line::from("Down:  s, j"),
        Line::from("Left:  a, h"),
        Line::from("Right: d, l"),
    ];
    if two_players {
        lines.push(Line::from(""));
        lines.push(Line::from("Player 2: arrow keys"));
    } else {
        lines.push(Line::from("or the arrow keys"));
    }
    lines.extend([
        Line::from(""),
        Line::from("Pause: p"),
        Line::from("Resume: p, Space"),
        Line::from("Quit:  q"),
        Line::from("Exit:  Esc"),
    ]);
    Paragraph::new(lines).block(Block::default().borders(Borders::ALL))
}

/// Draws the field, clipped to the area it is given
struct Board<'a>(&'a Engine);

impl Widget for Board<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let engine = self.0;
        for (y, row) in engine.field().rows().enumerate() {
            let Ok(y) = u16::try_from(y) else { break };
            if y >= area.height {
                break;
            }
            for (x, &cell) in row.iter().enumerate() {
                let Ok(x) = u16::try_from(x) else { break };
                if x >= area.width {
                    break;
                }
                let target = &mut buf[(area.x + x, area.y + y)];
                match cell {
                    Cell::Empty => {}
                    Cell::Border => {
                        target.set_symbol(BORDER_SYMBOL).set_fg(Color::Magenta);
                    }
                    Cell::SnakeBody => {
                        target.set_symbol(BODY_SYMBOL).set_bg(Color::Red);
                    }
                    Cell::Head(id) => {
                        let direction = engine
                            .snake(id)
                            .map_or(Direction::North, |snake| snake.direction());
                        let background = match id {
                            PlayerId::One => Color::Green,
                            PlayerId::Two => Color::Yellow,
                        };
                        target
                            .set_symbol(head_symbol(direction))
                            .set_style(Style::default().fg(Color::Blue).bg(background));
                    }
                    Cell::Food => {
                        target.set_symbol(FOOD_SYMBOL).set_fg(Color::Cyan);
                    }
                    Cell::Obstacle => {
                        target.set_symbol(OBSTACLE_SYMBOL).set_fg(Color::Gray);
                    }
                    Cell::Shortener => {
                        target.set_symbol(SHORTENER_SYMBOL).set_fg(Color::LightRed);
                    }
                    Cell::Decelerator => {
                        target.set_symbol(DECELERATOR_SYMBOL).set_fg(Color::LightBlue);
                    }
                    Cell::ExtraPoints => {
                        target.set_symbol(EXTRA_POINTS_SYMBOL).set_fg(Color::LightYellow);
                    }
                }
            }
        }
    }
}

fn head_symbol(direction: Direction) -> &'static str {
    match direction {
        Direction::North => "^",
        Direction::East => ">",
        Direction::South => "v",
        Direction::West => "<",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(two_players: bool) -> App {
        let config = GameConfig {
            two_players,
            obstacle_permille: 0,
            ..GameConfig::with_size(12, 20)
        };
        App::new(config, false)
    }

    #[test]
    fn test_single_player_steering() {
        let app = app(false);
        assert_eq!(
            app.steering(KeyCode::Char('w')),
            Some(TickInput::Steer {
                player: PlayerId::One,
                direction: Direction::North
            })
        );
        assert_eq!(
            app.steering(KeyCode::Left),
            Some(TickInput::Steer {
                player: PlayerId::One,
                direction: Direction::West
            })
        );
        assert_eq!(app.steering(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_two_player_steering() {
        let app = app(true);
        assert_eq!(
            app.steering(KeyCode::Char('l')),
            Some(TickInput::Steer {
                player: PlayerId::One,
                direction: Direction::East
            })
        );
        assert_eq!(
            app.steering(KeyCode::Down),
            Some(TickInput::Steer {
                player: PlayerId::Two,
                direction: Direction::South
            })
        );
    }

    #[test]
    fn test_state_transitions() {
        let mut app = app(false);
        let now = Instant::now();
        assert!(app.wait_time().is_none());

        app.handle_input(press(KeyCode::Char(' ')), now);
        assert!(matches!(app.state, GameState::Playing(_)));
        assert_eq!(app.wait_time(), Some(Duration::from_millis(300)));

        app.handle_input(press(KeyCode::Char('p')), now);
        assert!(matches!(app.state, GameState::Paused { .. }));
        assert!(app.wait_time().is_none());

        app.handle_input(press(KeyCode::Char('p')), now + Duration::from_secs(2));
        assert!(matches!(app.state, GameState::Playing(_)));

        app.handle_input(press(KeyCode::Char('q')), now);
        assert!(matches!(app.state, GameState::GameOver(_)));

        app.handle_input(press(KeyCode::Char(' ')), now);
        assert!(matches!(app.state, GameState::ReadyToStart));

        app.handle_input(press(KeyCode::Esc), now);
        assert!(app.should_exit());
    }

    #[test]
    fn test_space_resumes_from_pause() {
        let mut app = app(false);
        let now = Instant::now();
        app.handle_input(press(KeyCode::Char(' ')), now);
        app.handle_input(press(KeyCode::Char('p')), now);

        app.handle_input(press(KeyCode::Char('x')), now);
        assert!(matches!(app.state, GameState::Paused { .. }));

        app.handle_input(press(KeyCode::Char(' ')), now);
        assert!(matches!(app.state, GameState::Playing(_)));
    }

    #[test]
    fn test_refuses_to_start_in_small_terminal() {
        // The field is 12x20
        let mut app = app(false);
        let now = Instant::now();
        app.arena_size = Some(Size {
            width: 19,
            height: 30,
        });
        assert!(!app.fits());

        app.handle_input(press(KeyCode::Char(' ')), now);
        assert!(matches!(app.state, GameState::ReadyToStart));

        app.arena_size = Some(Size {
            width: 20,
            height: 12,
        });
        assert!(app.fits());
        app.handle_input(press(KeyCode::Char(' ')), now);
        assert!(matches!(app.state, GameState::Playing(_)));
    }

    #[test]
    fn test_terminal_sized_field_needs_minimum_side() {
        let mut app = App::new(GameConfig::default(), true);
        app.arena_size = Some(Size {
            width: 40,
            height: MINIMUM_SIDE - 1,
        });
        assert!(!app.fits());

        app.arena_size = Some(Size {
            width: MINIMUM_SIDE,
            height: MINIMUM_SIDE,
        });
        assert!(app.fits());
    }

    #[test]
    fn test_unmapped_key_does_not_tick() {
        let mut app = app(false);
        let now = Instant::now();
        app.handle_input(press(KeyCode::Char(' ')), now);
        let head = match &app.state {
            GameState::Playing(engine) => engine.snake(PlayerId::One).unwrap().head(),
            _ => unreachable!(),
        };

        app.handle_input(press(KeyCode::Char('z')), now);

        match &app.state {
            GameState::Playing(engine) => {
                assert_eq!(engine.snake(PlayerId::One).unwrap().head(), head)
            }
            _ => panic!("expected to still be playing"),
        }
    }

    #[test]
    fn test_describe_outcome() {
        let solo = Outcome {
            died_first: PlayerId::One,
            cause: Cell::Border,
            survivor: None,
        };
        assert_eq!(describe(&solo), "Player 1 crashed into the wall");

        let duel = Outcome {
            died_first: PlayerId::Two,
            cause: Cell::Head(PlayerId::One),
            survivor: Some(PlayerId::One),
        };
        assert_eq!(
            describe(&duel),
            "Player 2 crashed into a snake's head. Player 1 wins!"
        );
    }

    #[test]
    fn test_head_symbols() {
        assert_eq!(head_symbol(Direction::North), "^");
        assert_eq!(head_symbol(Direction::East), ">");
        assert_eq!(head_symbol(Direction::South), "v");
        assert_eq!(head_symbol(Direction::West), "<");
    }
}

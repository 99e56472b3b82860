mod app;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use cursnake::config::{
    DEFAULT_DURATION_DECELERATOR, DEFAULT_DURATION_EXTRA_POINTS, DEFAULT_DURATION_SHORTENER,
    DEFAULT_HEIGHT, DEFAULT_MINIMUM_DELAY, DEFAULT_PERMILLE_OBSTACLES, DEFAULT_STARTING_DELAY,
    DEFAULT_STEP_DELAY, DEFAULT_WIDTH, MAXIMUM_SIDE, MINIMUM_SIDE,
};
use cursnake::GameConfig;
use log::info;
use ratatui::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use app::App;

/// Snake for the terminal
#[derive(Parser, Debug)]
#[command(name = "cursnake", version, about)]
struct Cli {
    /// Enable two players mode
    #[arg(short = '2', long)]
    two_players: bool,

    /// Size the map after the terminal
    #[arg(short = 't', long, conflicts_with_all = ["height", "width"])]
    use_terminal_dimensions: bool,

    /// Height of the map
    #[arg(
        short = 'H',
        long,
        value_name = "ROWS",
        default_value_t = DEFAULT_HEIGHT,
        value_parser = clap::value_parser!(u16).range(MINIMUM_SIDE as i64..=MAXIMUM_SIDE as i64)
    )]
    height: u16,

    /// Width of the map
    #[arg(
        short = 'W',
        long,
        value_name = "COLUMNS",
        default_value_t = DEFAULT_WIDTH,
        value_parser = clap::value_parser!(u16).range(MINIMUM_SIDE as i64..=MAXIMUM_SIDE as i64)
    )]
    width: u16,

    /// Permille of obstacles in the map
    #[arg(
        short = 'o',
        long = "obstacles",
        value_name = "PERMILLE",
        default_value_t = DEFAULT_PERMILLE_OBSTACLES,
        value_parser = clap::value_parser!(u16).range(0..=1000)
    )]
    obstacle_permille: u16,

    /// Starting delay in milliseconds
    #[arg(
        short = 's',
        long,
        value_name = "MS",
        default_value_t = DEFAULT_STARTING_DELAY,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    starting_delay: u64,

    /// Minimum delay in milliseconds
    #[arg(
        short = 'm',
        long,
        value_name = "MS",
        default_value_t = DEFAULT_MINIMUM_DELAY,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    minimum_delay: u64,

    /// Reduction of the delay in milliseconds when eating food
    #[arg(
        short = 'S',
        long,
        value_name = "MS",
        default_value_t = DEFAULT_STEP_DELAY
    )]
    step_delay: u64,

    /// Lifetime of shorteners in seconds
    #[arg(
        short = 'D',
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_DURATION_SHORTENER
    )]
    duration_shortener: u64,

    /// Lifetime of decelerators in seconds
    #[arg(
        short = 'd',
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_DURATION_DECELERATOR
    )]
    duration_decelerator: u64,

    /// Lifetime of extra points in seconds
    #[arg(
        short = 'e',
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_DURATION_EXTRA_POINTS
    )]
    duration_extra_points: u64,

    /// Where to write the log
    #[arg(long, value_name = "PATH", default_value = "cursnake.log")]
    log_file: PathBuf,
}

impl Cli {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            height: self.height,
            width: self.width,
            obstacle_permille: self.obstacle_permille,
            starting_delay: Duration::from_millis(self.starting_delay),
            minimum_delay: Duration::from_millis(self.minimum_delay),
            step_delay: Duration::from_millis(self.step_delay),
            duration_shortener: Duration::from_secs(self.duration_shortener),
            duration_decelerator: Duration::from_secs(self.duration_decelerator),
            duration_extra_points: Duration::from_secs(self.duration_extra_points),
            two_players: self.two_players,
        }
    }

    fn validate(&self) -> Result<(), clap::Error> {
        if self.minimum_delay > self.starting_delay {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--minimum-delay cannot be larger than --starting-delay",
            ));
        }
        Ok(())
    }
}

fn main() -> Result<(), io::Error> {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }

    // Set up logging before touching the terminal
    WriteLogger::init(
        LevelFilter::Info,
        Config::default(),
        File::create(&cli.log_file)?,
    )
    .map_err(io::Error::other)?;

    info!("Starting cursnake with {:?}", cli);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let mut app = App::new(cli.game_config(), cli.use_terminal_dimensions);
    let result = run(&mut terminal, &mut app);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Exiting");
    result
}

/// Waits for a key at most the current delay; a key steers and ticks
/// straight away, silence ticks every snake.
fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    while !app.should_exit() {
        terminal.draw(|f| app.render(f))?;

        let ready = match app.wait_time() {
            Some(delay) => event::poll(delay)?,
            None => true,
        };

        if ready {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_input(key, Instant::now());
                }
            }
        } else {
            app.update(Instant::now());
        }
    }
    Ok(())
}

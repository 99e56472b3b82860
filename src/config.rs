//! Tuning constants and the configuration the engine is built from.
//!
//! Constants prefixed with `DEFAULT_` can be overridden from the command line.

use std::time::Duration;

use crate::field::ItemKind;
use crate::PlayerId;

/// Field dimensions, border included
pub const DEFAULT_HEIGHT: u16 = 26;
pub const DEFAULT_WIDTH: u16 = 66;
/// Smallest side that still leaves a spawn zone for two snakes
pub const MINIMUM_SIDE: u16 = 6;
/// Far beyond any terminal; keeps the grid allocation bounded
pub const MAXIMUM_SIDE: u16 = 1000;

pub const DEFAULT_PERMILLE_OBSTACLES: u16 = 10;

/// Milliseconds
pub const DEFAULT_STARTING_DELAY: u64 = 300;
pub const DEFAULT_MINIMUM_DELAY: u64 = 120;
pub const DEFAULT_STEP_DELAY: u64 = 10;

/// Seconds
pub const DEFAULT_DURATION_SHORTENER: u64 = 5;
pub const DEFAULT_DURATION_DECELERATOR: u64 = 7;
pub const DEFAULT_DURATION_EXTRA_POINTS: u64 = 6;

pub const POINTS_FOOD: u32 = 10;
pub const POINTS_SHORTENER: u32 = 15;
pub const POINTS_DECELERATOR: u32 = 5;
pub const POINTS_EXTRA_POINTS: u32 = 30;

/// 1/N chance of the item appearing each time food is eaten
pub const PROBABILITY_SHORTENER: u32 = 15;
pub const PROBABILITY_DECELERATOR: u32 = 10;
pub const PROBABILITY_EXTRA_POINTS: u32 = 12;

/// Everything needed to build an [`Engine`](crate::Engine).
///
/// Values are trusted: the command line layer rejects sizes outside
/// [`MINIMUM_SIDE`]..=[`MAXIMUM_SIDE`], permille above 1000 and a minimum
/// delay above the starting one before a config ever reaches the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub height: u16,
    pub width: u16,
    pub obstacle_permille: u16,
    pub starting_delay: Duration,
    pub minimum_delay: Duration,
    pub step_delay: Duration,
    pub duration_shortener: Duration,
    pub duration_decelerator: Duration,
    pub duration_extra_points: Duration,
    pub two_players: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
            obstacle_permille: DEFAULT_PERMILLE_OBSTACLES,
            starting_delay: Duration::from_millis(DEFAULT_STARTING_DELAY),
            minimum_delay: Duration::from_millis(DEFAULT_MINIMUM_DELAY),
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY),
            duration_shortener: Duration::from_secs(DEFAULT_DURATION_SHORTENER),
            duration_decelerator: Duration::from_secs(DEFAULT_DURATION_DECELERATOR),
            duration_extra_points: Duration::from_secs(DEFAULT_DURATION_EXTRA_POINTS),
            two_players: false,
        }
    }
}

impl GameConfig {
    /// Default tuning on a field of the given size
    pub fn with_size(height: u16, width: u16) -> Self {
        Self {
            height,
            width,
            ..Default::default()
        }
    }

    pub fn players(&self) -> &'static [PlayerId] {
        if self.two_players {
            &[PlayerId::One, PlayerId::Two]
        } else {
            &[PlayerId::One]
        }
    }

    pub fn item_duration(&self, kind: ItemKind) -> Duration {
        match kind {
            ItemKind::Shortener => self.duration_shortener,
            ItemKind::Decelerator => self.duration_decelerator,
            ItemKind::ExtraPoints => self.duration_extra_points,
        }
    }
}

/// Denominator of the 1-in-N spawn roll for `kind`
pub fn spawn_odds(kind: ItemKind) -> u32 {
    match kind {
        ItemKind::Shortener => PROBABILITY_SHORTENER,
        ItemKind::Decelerator => PROBABILITY_DECELERATOR,
        ItemKind::ExtraPoints => PROBABILITY_EXTRA_POINTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.height, 26);
        assert_eq!(config.width, 66);
        assert_eq!(config.starting_delay, Duration::from_millis(300));
        assert_eq!(config.minimum_delay, Duration::from_millis(120));
        assert!(!config.two_players);
    }

    #[test]
    fn test_with_size_keeps_tuning() {
        let config = GameConfig::with_size(10, 12);
        assert_eq!((config.height, config.width), (10, 12));
        assert_eq!(config.step_delay, Duration::from_millis(DEFAULT_STEP_DELAY));
    }

    #[test]
    fn test_players() {
        let mut config = GameConfig::default();
        assert_eq!(config.players(), &[PlayerId::One]);

        config.two_players = true;
        assert_eq!(config.players(), &[PlayerId::One, PlayerId::Two]);
    }

    #[test]
    fn test_item_durations() {
        let config = GameConfig::default();
        assert_eq!(config.item_duration(ItemKind::Shortener), Duration::from_secs(5));
        assert_eq!(config.item_duration(ItemKind::Decelerator), Duration::from_secs(7));
        assert_eq!(config.item_duration(ItemKind::ExtraPoints), Duration::from_secs(6));
    }

    #[test]
    fn test_spawn_odds_are_nonzero() {
        for kind in ItemKind::ALL {
            assert!(spawn_odds(kind) > 0);
        }
    }
}

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

use super::palette::DEFAULT_COLOR;
use crate::config::GameConfig;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;

/// Malformed client input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter a name")]
    EmptyName,

    #[error("Name must be at least 2 characters")]
    NameTooShort,

    #[error("Name must be at most 50 characters")]
    NameTooLong,

    #[error("Color must be a hex value like #E74C3C, got '{0}'")]
    InvalidColor(String),

    #[error("Avatar seed must not be empty")]
    EmptyAvatarSeed,

    #[error("A match needs between {min} and {max} players, got {count}")]
    PlayerCount { count: usize, min: usize, max: usize },

    #[error("Player {0} was selected more than once")]
    DuplicatePlayer(Uuid),

    #[error("Target must be between {min} and {max} VP, got {target}")]
    TargetOutOfRange { target: i32, min: i32, max: i32 },
}

/// Trim a player name and check its length
pub fn validate_player_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        return Err(ValidationError::EmptyName);
    }
    if length < MIN_NAME_LENGTH {
        return Err(ValidationError::NameTooShort);
    }
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }

    Ok(trimmed.to_string())
}

/// Accept `#RRGGBB` (any case), normalised to upper case.
/// A missing colour falls back to the first palette colour.
pub fn validate_color(color: Option<&str>) -> Result<String, ValidationError> {
    let Some(color) = color else {
        return Ok(DEFAULT_COLOR.to_string());
    };

    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::InvalidColor(color.to_string()));
    }

    Ok(color.to_ascii_uppercase())
}

/// Seed derived from a name: lower case, whitespace runs become '-'
pub fn default_avatar_seed(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Use the given seed, or derive one from the name
pub fn validate_avatar_seed(seed: Option<&str>, name: &str) -> Result<String, ValidationError> {
    match seed.map(str::trim) {
        Some("") => Err(ValidationError::EmptyAvatarSeed),
        Some(seed) => Ok(seed.to_string()),
        None => Ok(default_avatar_seed(name)),
    }
}

/// Player count within bounds and no one seated twice
pub fn validate_roster(player_ids: &[Uuid], game: &GameConfig) -> Result<(), ValidationError> {
    let count = player_ids.len();
    if count < game.min_players || count > game.max_players {
        return Err(ValidationError::PlayerCount {
            count,
            min: game.min_players,
            max: game.max_players,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    for id in player_ids {
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicatePlayer(*id));
        }
    }

    Ok(())
}

pub fn validate_target_vp(target: i32, game: &GameConfig) -> Result<i32, ValidationError> {
    if target < game.min_target_vp || target > game.max_target_vp {
        return Err(ValidationError::TargetOutOfRange {
            target,
            min: game.min_target_vp,
            max: game.max_target_vp,
        });
    }
    Ok(target)
}

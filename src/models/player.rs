use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::AvatarConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    /// Hex colour, e.g. "#E74C3C"
    pub preferred_color: String,
    /// Seed for the external identicon service
    pub avatar_seed: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new roster entry
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub name: String,
    pub preferred_color: String,
    pub avatar_seed: String,
}

/// Validated partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct PlayerChanges {
    pub name: Option<String>,
    pub preferred_color: Option<String>,
    /// `Some(None)` removes the seed, and with it the avatar
    pub avatar_seed: Option<Option<String>>,
}

impl Player {
    /// Avatar image URL, if the player has a seed
    pub fn avatar_url(&self, avatar: &AvatarConfig) -> Option<String> {
        let seed = self.avatar_seed.as_deref()?;
        let query = serde_urlencoded::to_string([("seed", seed)]).ok()?;
        // Form encoding differs from URI component encoding in these
        let query = query
            .replace('+', "%20")
            .replace('*', "%2A")
            .replace("%21", "!")
            .replace("%27", "'")
            .replace("%28", "(")
            .replace("%29", ")")
            .replace("%7E", "~");
        Some(format!(
            "{}/{}/svg?{}",
            avatar.base_url.trim_end_matches('/'),
            avatar.style,
            query
        ))
    }
}

impl PlayerChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.preferred_color.is_none() && self.avatar_seed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_with_seed(seed: Option<&str>) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: "Anna Berg".to_string(),
            preferred_color: "#E74C3C".to_string(),
            avatar_seed: seed.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_avatar_url_encodes_seed() {
        let player = player_with_seed(Some("anna & co"));
        let url = player.avatar_url(&AvatarConfig::default()).unwrap();
        assert_eq!(
            url,
            "https://api.dicebear.com/7.x/adventurer/svg?seed=anna%20%26%20co"
        );

        let player = player_with_seed(Some("o'neil (2)! ~*"));
        let url = player.avatar_url(&AvatarConfig::default()).unwrap();
        assert!(url.ends_with("?seed=o'neil%20(2)!%20~%2A"));
    }

    #[test]
    fn test_avatar_url_absent_without_seed() {
        let player = player_with_seed(None);
        assert!(player.avatar_url(&AvatarConfig::default()).is_none());
    }

    #[test]
    fn test_avatar_url_tolerates_trailing_slash() {
        let player = player_with_seed(Some("anna"));
        let avatar = AvatarConfig {
            base_url: "https://avatars.example/".to_string(),
            style: "bottts".to_string(),
        };
        assert_eq!(
            player.avatar_url(&avatar).unwrap(),
            "https://avatars.example/bottts/svg?seed=anna"
        );
    }

    #[test]
    fn test_empty_changes() {
        assert!(PlayerChanges::default().is_empty());
        let changes = PlayerChanges {
            name: Some("Anna".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}

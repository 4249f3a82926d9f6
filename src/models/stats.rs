use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One leaderboard row, as exposed by the `player_stats` view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PlayerStats {
    pub id: Uuid,
    pub name: String,
    pub preferred_color: String,
    pub avatar_seed: Option<String>,
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    /// Percentage of ended matches won, one decimal
    pub win_rate: f64,
    /// Average final total VP, one decimal
    pub avg_score: f64,
    pub longest_road_count: i64,
    pub largest_army_count: i64,
}

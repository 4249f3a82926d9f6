use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::game::RuleError;
use crate::models::{Match, MatchParticipant, NewMatch, NewPlayer, Player, PlayerChanges, PlayerStats};

#[cfg(test)]
pub mod memory;
pub mod queries;

pub use queries::PgStore;

pub async fn create_pool(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A database constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    /// The edit was refused by the game rules against the locked rows
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rule applied to a running match's participants (in turn order) while
/// they are locked. The `usize` is the index of the addressed participant.
/// Returns the rows to write, in write order.
pub type ScoreboardEdit<'a> = &'a (dyn Fn(&Match, &mut [MatchParticipant], usize)
    -> Result<Vec<MatchParticipant>, RuleError>
    + Send
    + Sync);

/// Which matches to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuery {
    /// Running matches, newest first
    Active,
    /// Ended matches, most recently ended first
    Finished { limit: i64 },
}

/// Persistence for the roster, matches and participants
#[async_trait]
pub trait ScoreboardStore: Send + Sync {
    /// All players ordered by name
    async fn list_players(&self) -> StoreResult<Vec<Player>>;
    async fn get_player(&self, id: Uuid) -> StoreResult<Option<Player>>;
    async fn get_players(&self, ids: &[Uuid]) -> StoreResult<Vec<Player>>;
    async fn create_player(&self, player: &NewPlayer) -> StoreResult<Player>;
    async fn update_player(&self, id: Uuid, changes: &PlayerChanges) -> StoreResult<Option<Player>>;
    /// Returns false if no such player existed; players with recorded
    /// matches are a conflict
    async fn delete_player(&self, id: Uuid) -> StoreResult<bool>;

    /// Insert a match and its participants atomically
    async fn create_match(&self, new_match: &NewMatch) -> StoreResult<Match>;
    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>>;
    async fn list_matches(&self, query: MatchQuery) -> StoreResult<Vec<Match>>;
    /// Mark an active match as ended. Returns `None` if the match does not
    /// exist or has already ended.
    async fn finish_match(
        &self,
        id: Uuid,
        winner_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<Option<Match>>;

    /// Participants of the given matches, in turn order
    async fn list_participants(&self, match_ids: &[Uuid]) -> StoreResult<Vec<MatchParticipant>>;

    /// Read-modify-write of one participant's match. The match must still be
    /// active when the rows are locked, so concurrent edits serialize and
    /// nothing is written after the match has ended. Returns the match id.
    async fn edit_scoreboard(
        &self,
        participant_id: Uuid,
        edit: ScoreboardEdit<'_>,
    ) -> StoreResult<Uuid>;

    async fn leaderboard(&self) -> StoreResult<Vec<PlayerStats>>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{MatchQuery, ScoreboardEdit, ScoreboardStore, StoreError, StoreResult};
use crate::game::RuleError;
use crate::models::{Match, MatchParticipant, NewMatch, NewPlayer, Player, PlayerChanges, PlayerStats};

// SQLSTATE codes surfaced as conflicts rather than internal errors
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate constraint violations into conflicts with a readable message
fn map_db_error(e: sqlx::Error, context: &str) -> StoreError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code().map(|code| code.into_owned()));

    match code.as_deref() {
        Some(FOREIGN_KEY_VIOLATION) | Some(UNIQUE_VIOLATION) | Some(CHECK_VIOLATION) => {
            tracing::warn!("Constraint violation while {}: {}", context, e);
            StoreError::Conflict(format!("Could not complete {}: {}", context, constraint_message(&e)))
        }
        _ => StoreError::Database(e),
    }
}

fn constraint_message(e: &sqlx::Error) -> String {
    e.as_database_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| e.to_string())
}

// Player queries
pub async fn list_players(pool: &PgPool) -> sqlx::Result<Vec<Player>> {
    sqlx::query_as::<_, Player>("SELECT * FROM players ORDER BY name, created_at")
        .fetch_all(pool)
        .await
}

pub async fn get_player(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Player>> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_players(pool: &PgPool, ids: &[Uuid]) -> sqlx::Result<Vec<Player>> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = ANY($1) ORDER BY name")
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await
}

pub async fn create_player(pool: &PgPool, player: &NewPlayer) -> sqlx::Result<Player> {
    sqlx::query_as::<_, Player>(
        r#"
        INSERT INTO players (name, preferred_color, avatar_seed)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&player.name)
    .bind(&player.preferred_color)
    .bind(&player.avatar_seed)
    .fetch_one(pool)
    .await
}

/// Apply only the provided fields; unchanged columns keep their value.
/// The avatar seed can also be cleared.
pub async fn update_player(
    pool: &PgPool,
    id: Uuid,
    changes: &PlayerChanges,
) -> sqlx::Result<Option<Player>> {
    sqlx::query_as::<_, Player>(
        r#"
        UPDATE players
        SET name = COALESCE($2, name),
            preferred_color = COALESCE($3, preferred_color),
            avatar_seed = CASE WHEN $5 THEN $4 ELSE avatar_seed END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.preferred_color.as_deref())
    .bind(changes.avatar_seed.clone().flatten())
    .bind(changes.avatar_seed.is_some())
    .fetch_optional(pool)
    .await
}

pub async fn delete_player(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM players WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// Match queries

/// Insert the match and one participant per player, in turn order.
/// Either everything is written or nothing is.
pub async fn create_match(pool: &PgPool, new_match: &NewMatch) -> sqlx::Result<Match> {
    let mut tx = pool.begin().await?;

    let game_match = sqlx::query_as::<_, Match>(
        r#"
        INSERT INTO matches (expansion, target_vp, is_active)
        VALUES ($1, $2, TRUE)
        RETURNING *
        "#,
    )
    .bind(new_match.expansion)
    .bind(new_match.target_vp)
    .fetch_one(&mut *tx)
    .await?;

    for (index, player_id) in new_match.player_ids.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO match_participants (match_id, player_id, turn_order)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(game_match.id)
        .bind(player_id)
        .bind(index as i32 + 1)
        .execute(&mut *tx)
        .await?;
    }

    // Dropping the transaction on any error above rolls the match back
    tx.commit().await?;

    tracing::info!(
        "Created match {} ({:?}, {} VP) with {} players",
        game_match.id,
        game_match.expansion,
        game_match.target_vp,
        new_match.player_ids.len()
    );

    Ok(game_match)
}

pub async fn get_match(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Match>> {
    sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_active_matches(pool: &PgPool) -> sqlx::Result<Vec<Match>> {
    sqlx::query_as::<_, Match>(
        "SELECT * FROM matches WHERE is_active ORDER BY started_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn list_finished_matches(pool: &PgPool, limit: i64) -> sqlx::Result<Vec<Match>> {
    sqlx::query_as::<_, Match>(
        r#"
        SELECT * FROM matches
        WHERE NOT is_active
        ORDER BY ended_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Conditional on the match still being active, so a match ends exactly once
pub async fn finish_match(
    pool: &PgPool,
    id: Uuid,
    winner_id: Uuid,
    ended_at: DateTime<Utc>,
) -> sqlx::Result<Option<Match>> {
    sqlx::query_as::<_, Match>(
        r#"
        UPDATE matches
        SET is_active = FALSE,
            ended_at = $2,
            winner_id = $3
        WHERE id = $1 AND is_active
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(ended_at)
    .bind(winner_id)
    .fetch_optional(pool)
    .await
}

// Participant queries
pub async fn list_participants(
    pool: &PgPool,
    match_ids: &[Uuid],
) -> sqlx::Result<Vec<MatchParticipant>> {
    sqlx::query_as::<_, MatchParticipant>(
        r#"
        SELECT * FROM match_participants
        WHERE match_id = ANY($1)
        ORDER BY match_id, turn_order
        "#,
    )
    .bind(match_ids.to_vec())
    .fetch_all(pool)
    .await
}

/// Lock the participant's match, then its participants, apply `edit` and
/// write the returned rows in order. Holding the match row serializes
/// scoreboard edits with each other and with `finish_match`.
pub async fn edit_scoreboard(
    pool: &PgPool,
    participant_id: Uuid,
    edit: ScoreboardEdit<'_>,
) -> StoreResult<Uuid> {
    let mut tx = pool.begin().await?;

    let match_id: Uuid =
        sqlx::query_scalar("SELECT match_id FROM match_participants WHERE id = $1")
            .bind(participant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RuleError::UnknownParticipant(participant_id))?;

    let game_match =
        sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1 FOR UPDATE")
            .bind(match_id)
            .fetch_one(&mut *tx)
            .await?;
    // Re-checked under the lock; an end that committed first is visible here
    if !game_match.is_active {
        return Err(RuleError::MatchEnded(match_id).into());
    }

    let mut participants = sqlx::query_as::<_, MatchParticipant>(
        r#"
        SELECT * FROM match_participants
        WHERE match_id = $1
        ORDER BY turn_order
        FOR UPDATE
        "#,
    )
    .bind(match_id)
    .fetch_all(&mut *tx)
    .await?;

    let target = participants
        .iter()
        .position(|p| p.id == participant_id)
        .ok_or(RuleError::UnknownParticipant(participant_id))?;
    let changed = edit(&game_match, &mut participants, target)?;

    for participant in &changed {
        write_participant(&mut *tx, participant).await?;
    }

    tx.commit().await?;
    Ok(match_id)
}

/// Write every mutable column of one participant row
async fn write_participant(conn: &mut PgConnection, participant: &MatchParticipant) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE match_participants
        SET score = $2,
            has_longest_road = $3,
            has_largest_army = $4,
            has_defender = $5,
            trade_level = $6,
            politics_level = $7,
            science_level = $8,
            has_trade_metropolis = $9,
            has_politics_metropolis = $10,
            has_science_metropolis = $11
        WHERE id = $1
        "#,
    )
    .bind(participant.id)
    .bind(participant.score)
    .bind(participant.has_longest_road)
    .bind(participant.has_largest_army)
    .bind(participant.has_defender)
    .bind(participant.trade_level)
    .bind(participant.politics_level)
    .bind(participant.science_level)
    .bind(participant.has_trade_metropolis)
    .bind(participant.has_politics_metropolis)
    .bind(participant.has_science_metropolis)
    .execute(conn)
    .await?;
    Ok(())
}

// Stats queries
pub async fn get_leaderboard(pool: &PgPool) -> sqlx::Result<Vec<PlayerStats>> {
    sqlx::query_as::<_, PlayerStats>(
        r#"
        SELECT * FROM player_stats
        ORDER BY win_rate DESC, games_played DESC, name
        "#,
    )
    .fetch_all(pool)
    .await
}

#[async_trait]
impl ScoreboardStore for PgStore {
    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        Ok(list_players(&self.pool).await?)
    }

    async fn get_player(&self, id: Uuid) -> StoreResult<Option<Player>> {
        Ok(get_player(&self.pool, id).await?)
    }

    async fn get_players(&self, ids: &[Uuid]) -> StoreResult<Vec<Player>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(get_players(&self.pool, ids).await?)
    }

    async fn create_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        create_player(&self.pool, player)
            .await
            .map_err(|e| map_db_error(e, "creating the player"))
    }

    async fn update_player(&self, id: Uuid, changes: &PlayerChanges) -> StoreResult<Option<Player>> {
        update_player(&self.pool, id, changes)
            .await
            .map_err(|e| map_db_error(e, "updating the player"))
    }

    async fn delete_player(&self, id: Uuid) -> StoreResult<bool> {
        delete_player(&self.pool, id).await.map_err(|e| match map_db_error(e, "deleting the player") {
            StoreError::Conflict(_) => {
                StoreError::Conflict("Players with recorded matches cannot be deleted".to_string())
            }
            other => other,
        })
    }

    async fn create_match(&self, new_match: &NewMatch) -> StoreResult<Match> {
        create_match(&self.pool, new_match)
            .await
            .map_err(|e| map_db_error(e, "creating the match"))
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        Ok(get_match(&self.pool, id).await?)
    }

    async fn list_matches(&self, query: MatchQuery) -> StoreResult<Vec<Match>> {
        let matches = match query {
            MatchQuery::Active => list_active_matches(&self.pool).await?,
            MatchQuery::Finished { limit } => list_finished_matches(&self.pool, limit).await?,
        };
        Ok(matches)
    }

    async fn finish_match(
        &self,
        id: Uuid,
        winner_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<Option<Match>> {
        finish_match(&self.pool, id, winner_id, ended_at)
            .await
            .map_err(|e| map_db_error(e, "ending the match"))
    }

    async fn list_participants(&self, match_ids: &[Uuid]) -> StoreResult<Vec<MatchParticipant>> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(list_participants(&self.pool, match_ids).await?)
    }

    async fn edit_scoreboard(
        &self,
        participant_id: Uuid,
        edit: ScoreboardEdit<'_>,
    ) -> StoreResult<Uuid> {
        edit_scoreboard(&self.pool, participant_id, edit)
            .await
            .map_err(|e| match e {
                StoreError::Database(e) => map_db_error(e, "saving the scoreboard"),
                other => other,
            })
    }

    async fn leaderboard(&self) -> StoreResult<Vec<PlayerStats>> {
        Ok(get_leaderboard(&self.pool).await?)
    }
}

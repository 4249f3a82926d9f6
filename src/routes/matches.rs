use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::MatchQuery,
    error::ApiError,
    game::{scorer, validator, RuleError},
    models::{Expansion, Match, MatchDetails, MatchParticipant, NewMatch, Player},
    websocket::messages::ServerMessage,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub expansion: Expansion,
    /// Defaults to the expansion's usual target
    pub target_vp: Option<i32>,
    /// Seating order; the first player takes the first turn
    pub player_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndMatchRequest {
    #[serde(default)]
    pub winner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Load one match with its participants and their players
pub async fn load_match_details(state: &AppState, match_id: Uuid) -> Result<MatchDetails, ApiError> {
    let game_match = state
        .store
        .get_match(match_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Match", match_id))?;

    let mut details = assemble_all(state, vec![game_match]).await?;
    details
        .pop()
        .ok_or_else(|| ApiError::Internal(format!("match {} vanished while loading", match_id)))
}

/// Assemble several matches with two batched lookups
async fn assemble_all(state: &AppState, matches: Vec<Match>) -> Result<Vec<MatchDetails>, ApiError> {
    let match_ids: Vec<Uuid> = matches.iter().map(|m| m.id).collect();
    let participants = state.store.list_participants(&match_ids).await?;

    let mut player_ids: Vec<Uuid> = participants.iter().map(|p| p.player_id).collect();
    player_ids.sort();
    player_ids.dedup();
    let players: HashMap<Uuid, Player> = state
        .store
        .get_players(&player_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut by_match: HashMap<Uuid, Vec<MatchParticipant>> = HashMap::new();
    for participant in participants {
        by_match
            .entry(participant.match_id)
            .or_default()
            .push(participant);
    }

    Ok(matches
        .into_iter()
        .map(|game_match| {
            let seated = by_match.remove(&game_match.id).unwrap_or_default();
            MatchDetails::assemble(game_match, seated, &players)
        })
        .collect())
}

/// Push the latest snapshot to everyone watching the match
pub fn publish_snapshot(state: &AppState, details: &MatchDetails) {
    state
        .hub
        .publish(details.id(), ServerMessage::snapshot(details.clone()));
}

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchDetails>), ApiError> {
    let game = &state.config.game;
    validator::validate_roster(&request.player_ids, game)?;
    let target_vp = validator::validate_target_vp(
        request
            .target_vp
            .unwrap_or_else(|| request.expansion.default_target_vp()),
        game,
    )?;

    let known = state.store.get_players(&request.player_ids).await?;
    if let Some(missing) = request
        .player_ids
        .iter()
        .find(|id| !known.iter().any(|p| p.id == **id))
    {
        return Err(ApiError::not_found("Player", missing));
    }

    let game_match = state
        .store
        .create_match(&NewMatch {
            expansion: request.expansion,
            target_vp,
            player_ids: request.player_ids,
        })
        .await?;

    let details = load_match_details(&state, game_match.id).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn list_active_matches(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MatchDetails>>, ApiError> {
    let matches = state.store.list_matches(MatchQuery::Active).await?;
    Ok(Json(assemble_all(&state, matches).await?))
}

/// Ended matches, most recent first. The limit is clamped to the configured maximum.
pub async fn list_match_history(
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MatchDetails>>, ApiError> {
    let game = &state.config.game;
    let limit = query
        .limit
        .unwrap_or(game.history_limit)
        .clamp(1, game.max_history_limit);

    let matches = state
        .store
        .list_matches(MatchQuery::Finished { limit })
        .await?;
    Ok(Json(assemble_all(&state, matches).await?))
}

pub async fn get_match(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MatchDetails>, ApiError> {
    Ok(Json(load_match_details(&state, id).await?))
}

pub async fn end_match(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<EndMatchRequest>,
) -> Result<Json<MatchDetails>, ApiError> {
    let details = load_match_details(&state, id).await?;
    let participants: Vec<MatchParticipant> = details
        .participants
        .iter()
        .map(|p| p.participant.clone())
        .collect();
    let winner_id = scorer::resolve_winner(&details.game_match, &participants, request.winner_id)?;

    // Another request may have ended the match since it was loaded
    state
        .store
        .finish_match(id, winner_id, Utc::now())
        .await?
        .ok_or(RuleError::MatchEnded(id))?;

    tracing::info!("Match {} ended, winner {}", id, winner_id);

    let details = load_match_details(&state, id).await?;
    publish_snapshot(&state, &details);
    Ok(Json(details))
}

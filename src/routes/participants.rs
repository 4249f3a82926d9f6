use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::matches::{load_match_details, publish_snapshot};
use crate::{
    db::ScoreboardEdit,
    error::ApiError,
    game::{awards, Award, CityImprovement, RuleError},
    models::{Match, MatchDetails, MatchParticipant},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetScoreRequest {
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct AdjustScoreRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
pub struct ToggleAwardRequest {
    pub award: Award,
}

#[derive(Debug, Deserialize)]
pub struct SetImprovementRequest {
    pub improvement: CityImprovement,
    pub level: i32,
}

/// Rows an edit touched, in the order they must be written
type ChangedRows = Result<Vec<MatchParticipant>, RuleError>;

/// Run `edit` against the participant's scoreboard, then broadcast and
/// return the new snapshot
async fn apply_edit(
    state: &AppState,
    participant_id: Uuid,
    edit: ScoreboardEdit<'_>,
) -> Result<Json<MatchDetails>, ApiError> {
    let match_id = state.store.edit_scoreboard(participant_id, edit).await?;

    let details = load_match_details(state, match_id).await?;
    publish_snapshot(state, &details);
    Ok(Json(details))
}

pub async fn set_score(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetScoreRequest>,
) -> Result<Json<MatchDetails>, ApiError> {
    let edit = |_: &Match, participants: &mut [MatchParticipant], target: usize| -> ChangedRows {
        let score = awards::set_score(&mut participants[target], request.score);
        tracing::debug!("Participant {} score set to {}", id, score);
        Ok(vec![participants[target].clone()])
    };
    apply_edit(&state, id, &edit).await
}

pub async fn adjust_score(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustScoreRequest>,
) -> Result<Json<MatchDetails>, ApiError> {
    let edit = |_: &Match, participants: &mut [MatchParticipant], target: usize| -> ChangedRows {
        let score = awards::adjust_score(&mut participants[target], request.delta);
        tracing::debug!("Participant {} score adjusted by {} to {}", id, request.delta, score);
        Ok(vec![participants[target].clone()])
    };
    apply_edit(&state, id, &edit).await
}

/// Give the award to the participant, taking it from its previous holder,
/// or take it away if the participant already holds it
pub async fn toggle_award(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleAwardRequest>,
) -> Result<Json<MatchDetails>, ApiError> {
    let edit = |game_match: &Match, participants: &mut [MatchParticipant], _: usize| -> ChangedRows {
        let changed =
            awards::toggle_award(participants, id, request.award, game_match.expansion)?;
        tracing::debug!(
            "{} toggled for participant {} ({} rows changed)",
            request.award.label(),
            id,
            changed.len()
        );
        Ok(changed)
    };
    apply_edit(&state, id, &edit).await
}

pub async fn set_improvement(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetImprovementRequest>,
) -> Result<Json<MatchDetails>, ApiError> {
    let edit = |game_match: &Match, participants: &mut [MatchParticipant], target: usize| -> ChangedRows {
        let participant = &mut participants[target];
        let previous = request.improvement.level(participant);
        let level = awards::set_improvement_level(
            participant,
            request.improvement,
            request.level,
            game_match.expansion,
        )?;
        tracing::debug!(
            "Participant {} {:?} improvement {} -> {}",
            id,
            request.improvement,
            previous,
            level
        );
        Ok(vec![participant.clone()])
    };
    apply_edit(&state, id, &edit).await
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
    config::AvatarConfig,
    error::ApiError,
    game::validator,
    models::{NewPlayer, Player, PlayerChanges},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    #[serde(flatten)]
    pub player: Player,
    pub avatar_url: Option<String>,
}

impl PlayerResponse {
    pub fn new(player: Player, avatar: &AvatarConfig) -> Self {
        Self {
            avatar_url: player.avatar_url(avatar),
            player,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub name: String,
    pub preferred_color: Option<String>,
    pub avatar_seed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlayerRequest {
    pub name: Option<String>,
    pub preferred_color: Option<String>,
    /// Absent keeps the seed, `null` clears it
    #[serde(default, deserialize_with = "explicit_null")]
    pub avatar_seed: Option<Option<String>>,
}

/// Tell a present `null` apart from a missing field
fn explicit_null<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
}

pub async fn list_players(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlayerResponse>>, ApiError> {
    let players = state.store.list_players().await?;
    Ok(Json(
        players
            .into_iter()
            .map(|p| PlayerResponse::new(p, &state.config.avatar))
            .collect(),
    ))
}

pub async fn get_player(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = state
        .store
        .get_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Player", id))?;
    Ok(Json(PlayerResponse::new(player, &state.config.avatar)))
}

pub async fn create_player(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerResponse>), ApiError> {
    let name = validator::validate_player_name(&request.name)?;
    let new_player = NewPlayer {
        preferred_color: validator::validate_color(request.preferred_color.as_deref())?,
        avatar_seed: validator::validate_avatar_seed(request.avatar_seed.as_deref(), &name)?,
        name,
    };

    let player = state.store.create_player(&new_player).await?;
    tracing::info!("Added player {} ({})", player.name, player.id);

    Ok((
        StatusCode::CREATED,
        Json(PlayerResponse::new(player, &state.config.avatar)),
    ))
}

/// Partial update: omitted fields keep their stored value.
/// An explicit `null` avatar seed removes the avatar.
pub async fn update_player(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdatePlayerRequest>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let changes = PlayerChanges {
        name: request
            .name
            .as_deref()
            .map(validator::validate_player_name)
            .transpose()?,
        preferred_color: request
            .preferred_color
            .as_deref()
            .map(|color| validator::validate_color(Some(color)))
            .transpose()?,
        avatar_seed: match request.avatar_seed {
            Some(Some(seed)) => Some(Some(validator::validate_avatar_seed(Some(&seed), "")?)),
            Some(None) => Some(None),
            None => None,
        },
    };

    let updated = if changes.is_empty() {
        state.store.get_player(id).await?
    } else {
        state.store.update_player(id, &changes).await?
    };
    let player = updated.ok_or_else(|| ApiError::not_found("Player", id))?;

    Ok(Json(PlayerResponse::new(player, &state.config.avatar)))
}

pub async fn delete_player(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_player(id).await? {
        return Err(ApiError::not_found("Player", id));
    }

    tracing::info!("Removed player {}", id);
    Ok(StatusCode::NO_CONTENT)
}

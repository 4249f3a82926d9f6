use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::ApiError, models::PlayerStats, AppState};

/// Every player, best win rate first
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlayerStats>>, ApiError> {
    Ok(Json(state.store.leaderboard().await?))
}

pub async fn get_player_stats(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlayerStats>, ApiError> {
    state
        .store
        .leaderboard()
        .await?
        .into_iter()
        .find(|row| row.id == id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Player", id))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    use crate::db::memory::test_state;
    use crate::routes::test_support::{create_player, send, start_match};

    #[tokio::test]
    async fn test_leaderboard_reflects_ended_matches() {
        let state = test_state();
        let snapshot = start_match(&state, "base", &["Anna", "Ben", "Cleo"]).await;
        let newcomer = create_player(&state, "Dora").await;

        let ben = snapshot["participants"][1].clone();
        send(
            &state,
            Method::PUT,
            &format!("/api/participants/{}/score", ben["id"].as_str().unwrap()),
            Some(json!({ "score": 8 })),
        )
        .await;
        send(
            &state,
            Method::POST,
            &format!("/api/participants/{}/awards", ben["id"].as_str().unwrap()),
            Some(json!({ "award": "largest_army" })),
        )
        .await;

        // Running matches do not count yet
        let (_, board) = send(&state, Method::GET, "/api/leaderboard", None).await;
        assert!(board.as_array().unwrap().iter().all(|row| row["games_played"] == 0));

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("/api/matches/{}/end", snapshot["id"].as_str().unwrap()),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, board) = send(&state, Method::GET, "/api/leaderboard", None).await;
        assert_eq!(status, StatusCode::OK);
        let board = board.as_array().unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board[0]["id"], ben["player_id"]);
        assert_eq!(board[0]["wins"], 1);
        assert_eq!(board[0]["win_rate"], 100.0);
        assert_eq!(board[0]["avg_score"], 10.0);
        assert_eq!(board[0]["largest_army_count"], 1);
        assert_eq!(board[3]["id"], json!(newcomer));

        let (status, stats) = send(
            &state,
            Method::GET,
            &format!("/api/players/{}/stats", snapshot["participants"][0]["player_id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["games_played"], 1);
        assert_eq!(stats["losses"], 1);
        assert_eq!(stats["win_rate"], 0.0);
    }

    #[tokio::test]
    async fn test_stats_for_unknown_player() {
        let state = test_state();
        let (status, _) = send(
            &state,
            Method::GET,
            &format!("/api/players/{}/stats", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

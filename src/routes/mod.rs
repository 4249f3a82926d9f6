pub mod health;
pub mod matches;
pub mod options;
pub mod participants;
pub mod players;
pub mod stats;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/options", get(options::get_options))
        .route(
            "/players",
            get(players::list_players).post(players::create_player),
        )
        .route(
            "/players/{id}",
            get(players::get_player)
                .patch(players::update_player)
                .delete(players::delete_player),
        )
        .route("/players/{id}/stats", get(stats::get_player_stats))
        .route("/matches", post(matches::create_match))
        .route("/matches/active", get(matches::list_active_matches))
        .route("/matches/history", get(matches::list_match_history))
        .route("/matches/{id}", get(matches::get_match))
        .route("/matches/{id}/end", post(matches::end_match))
        .route("/participants/{id}/score", put(participants::set_score))
        .route(
            "/participants/{id}/score/adjust",
            post(participants::adjust_score),
        )
        .route("/participants/{id}/awards", post(participants::toggle_award))
        .route(
            "/participants/{id}/improvements",
            put(participants::set_improvement),
        )
        .route("/leaderboard", get(stats::get_leaderboard))
}


#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::test_support::send;
    use crate::db::memory::test_state;

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "catan-companion-backend");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let state = test_state();
        let (status, _) = send(&state, Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

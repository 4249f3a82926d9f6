use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    game::{awards::MAX_IMPROVEMENT_LEVEL, palette::PLAYER_COLORS, Award, AWARD_POINTS},
    models::Expansion,
    AppState,
};

/// Static choices the client needs to build its forms
pub async fn get_options(State(state): State<Arc<AppState>>) -> Json<Value> {
    let game = &state.config.game;

    let expansions: Vec<Value> = Expansion::ALL
        .iter()
        .map(|expansion| {
            let awards: Vec<Value> = Award::available_in(*expansion)
                .into_iter()
                .map(|award| json!({ "id": award, "label": award.label() }))
                .collect();

            json!({
                "id": expansion,
                "label": expansion.label(),
                "default_target_vp": expansion.default_target_vp(),
                "awards": awards,
                "has_city_improvements": expansion.is_cities_knights(),
            })
        })
        .collect();

    Json(json!({
        "expansions": expansions,
        "colors": PLAYER_COLORS,
        "players": { "min": game.min_players, "max": game.max_players },
        "target_vp": { "min": game.min_target_vp, "max": game.max_target_vp },
        "award_points": AWARD_POINTS,
        "max_improvement_level": MAX_IMPROVEMENT_LEVEL,
    }))
}

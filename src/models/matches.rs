use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Player;
use crate::game::scorer;

/// Ruleset variant selected per match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "expansion_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Expansion {
    Base,
    Seafarers,
    CitiesKnights,
    SeafarersCitiesKnights,
}

impl Expansion {
    pub const ALL: [Expansion; 4] = [
        Expansion::Base,
        Expansion::Seafarers,
        Expansion::CitiesKnights,
        Expansion::SeafarersCitiesKnights,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Expansion::Base => "Base Game",
            Expansion::Seafarers => "Seafarers",
            Expansion::CitiesKnights => "Cities & Knights",
            Expansion::SeafarersCitiesKnights => "Seafarers + C&K",
        }
    }

    /// Victory points usually played to with this ruleset
    pub fn default_target_vp(self) -> i32 {
        match self {
            Expansion::Base => 10,
            Expansion::Seafarers => 12,
            Expansion::CitiesKnights => 13,
            Expansion::SeafarersCitiesKnights => 14,
        }
    }

    /// Cities & Knights replaces largest army with defender and adds
    /// city improvements and metropolises
    pub fn is_cities_knights(self) -> bool {
        matches!(
            self,
            Expansion::CitiesKnights | Expansion::SeafarersCitiesKnights
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub expansion: Expansion,
    pub target_vp: i32,
    pub winner_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MatchParticipant {
    pub id: Uuid,
    pub match_id: Uuid,
    pub player_id: Uuid,
    /// Base victory points, excluding awards
    pub score: i32,
    pub turn_order: i32,
    pub has_longest_road: bool,
    pub has_largest_army: bool,
    pub has_defender: bool,
    pub trade_level: i32,
    pub politics_level: i32,
    pub science_level: i32,
    pub has_trade_metropolis: bool,
    pub has_politics_metropolis: bool,
    pub has_science_metropolis: bool,
}

impl MatchParticipant {
    /// Fresh participant as inserted at match creation
    pub fn new(match_id: Uuid, player_id: Uuid, turn_order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            player_id,
            score: 0,
            turn_order,
            has_longest_road: false,
            has_largest_army: false,
            has_defender: false,
            trade_level: 0,
            politics_level: 0,
            science_level: 0,
            has_trade_metropolis: false,
            has_politics_metropolis: false,
            has_science_metropolis: false,
        }
    }
}

/// Validated input for a new match; player order is turn order
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub expansion: Expansion,
    pub target_vp: i32,
    pub player_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDetails {
    #[serde(flatten)]
    pub participant: MatchParticipant,
    pub player: Option<Player>,
    pub total_score: i32,
    /// 1-based position on the scoreboard
    pub rank: usize,
}

/// Everything a scoreboard needs to render one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    #[serde(flatten)]
    pub game_match: Match,
    /// Participants in turn order
    pub participants: Vec<ParticipantDetails>,
    pub leader_id: Option<Uuid>,
    /// Player who has reached the target while the match is still running
    pub potential_winner_id: Option<Uuid>,
}

impl MatchDetails {
    pub fn assemble(
        game_match: Match,
        mut participants: Vec<MatchParticipant>,
        players: &HashMap<Uuid, Player>,
    ) -> Self {
        participants.sort_by_key(|p| p.turn_order);

        let ranking = scorer::rank_participants(&participants, game_match.expansion);
        let leader_id = ranking.first().map(|standing| standing.player_id);
        let potential_winner_id = scorer::potential_winner(&game_match, &participants);

        let participants = participants
            .into_iter()
            .map(|participant| {
                let rank = ranking
                    .iter()
                    .position(|standing| standing.participant_id == participant.id)
                    .map_or(ranking.len(), |idx| idx + 1);
                ParticipantDetails {
                    total_score: scorer::total_score(&participant, game_match.expansion),
                    player: players.get(&participant.player_id).cloned(),
                    rank,
                    participant,
                }
            })
            .collect();

        Self {
            game_match,
            participants,
            leader_id,
            potential_winner_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.game_match.id
    }
}

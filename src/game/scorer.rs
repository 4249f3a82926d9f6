use uuid::Uuid;

use super::{Award, RuleError};
use crate::models::{Expansion, Match, MatchParticipant};

/// Victory points granted by every award a participant holds
pub const AWARD_POINTS: i32 = 2;

/// A participant's place on the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub participant_id: Uuid,
    pub player_id: Uuid,
    pub total_score: i32,
}

/// Number of awards held that count in this expansion.
///
/// Largest army only counts outside Cities & Knights; defender and the
/// metropolises only count inside it.
pub fn awards_held(participant: &MatchParticipant, expansion: Expansion) -> i32 {
    Award::ALL
        .iter()
        .filter(|award| award.is_available_in(expansion) && award.is_held_by(participant))
        .count() as i32
}

/// Base score plus the value of every award held
pub fn total_score(participant: &MatchParticipant, expansion: Expansion) -> i32 {
    participant.score + AWARD_POINTS * awards_held(participant, expansion)
}

pub fn has_reached_target(total_score: i32, target_vp: i32) -> bool {
    total_score >= target_vp
}

/// Participants ordered by total score (highest first); ties keep turn order
pub fn rank_participants(participants: &[MatchParticipant], expansion: Expansion) -> Vec<Standing> {
    let mut ordered: Vec<&MatchParticipant> = participants.iter().collect();
    ordered.sort_by_key(|p| p.turn_order);

    let mut standings: Vec<Standing> = ordered
        .into_iter()
        .map(|p| Standing {
            participant_id: p.id,
            player_id: p.player_id,
            total_score: total_score(p, expansion),
        })
        .collect();

    // Stable sort, so equal totals stay in turn order
    standings.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    standings
}

/// The best-placed player who has reached the target, while the match runs
pub fn potential_winner(game_match: &Match, participants: &[MatchParticipant]) -> Option<Uuid> {
    if !game_match.is_active {
        return None;
    }

    rank_participants(participants, game_match.expansion)
        .into_iter()
        .find(|standing| has_reached_target(standing.total_score, game_match.target_vp))
        .map(|standing| standing.player_id)
}

/// Winner recorded when a match ends: the requested player, who must be
/// seated in the match, or else the potential winner
pub fn resolve_winner(
    game_match: &Match,
    participants: &[MatchParticipant],
    requested: Option<Uuid>,
) -> Result<Uuid, RuleError> {
    if !game_match.is_active {
        return Err(RuleError::MatchEnded(game_match.id));
    }

    match requested {
        Some(player_id) if participants.iter().any(|p| p.player_id == player_id) => Ok(player_id),
        Some(player_id) => Err(RuleError::WinnerNotParticipant(player_id)),
        None => potential_winner(game_match, participants)
            .ok_or(RuleError::NoWinner(game_match.target_vp)),
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RuleError;
use crate::models::{Expansion, MatchParticipant};

/// Highest level of a Cities & Knights city improvement
pub const MAX_IMPROVEMENT_LEVEL: i32 = 5;

/// Exclusive cards: at most one participant per match holds each of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Award {
    LongestRoad,
    LargestArmy,
    Defender,
    TradeMetropolis,
    PoliticsMetropolis,
    ScienceMetropolis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityImprovement {
    Trade,
    Politics,
    Science,
}

impl Award {
    pub const ALL: [Award; 6] = [
        Award::LongestRoad,
        Award::LargestArmy,
        Award::Defender,
        Award::TradeMetropolis,
        Award::PoliticsMetropolis,
        Award::ScienceMetropolis,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Award::LongestRoad => "Longest Road",
            Award::LargestArmy => "Largest Army",
            Award::Defender => "Defender of Catan",
            Award::TradeMetropolis => "Trade Metropolis",
            Award::PoliticsMetropolis => "Politics Metropolis",
            Award::ScienceMetropolis => "Science Metropolis",
        }
    }

    pub fn is_available_in(self, expansion: Expansion) -> bool {
        match self {
            Award::LongestRoad => true,
            Award::LargestArmy => !expansion.is_cities_knights(),
            Award::Defender
            | Award::TradeMetropolis
            | Award::PoliticsMetropolis
            | Award::ScienceMetropolis => expansion.is_cities_knights(),
        }
    }

    pub fn is_held_by(self, participant: &MatchParticipant) -> bool {
        match self {
            Award::LongestRoad => participant.has_longest_road,
            Award::LargestArmy => participant.has_largest_army,
            Award::Defender => participant.has_defender,
            Award::TradeMetropolis => participant.has_trade_metropolis,
            Award::PoliticsMetropolis => participant.has_politics_metropolis,
            Award::ScienceMetropolis => participant.has_science_metropolis,
        }
    }

    fn flag_mut(self, participant: &mut MatchParticipant) -> &mut bool {
        match self {
            Award::LongestRoad => &mut participant.has_longest_road,
            Award::LargestArmy => &mut participant.has_largest_army,
            Award::Defender => &mut participant.has_defender,
            Award::TradeMetropolis => &mut participant.has_trade_metropolis,
            Award::PoliticsMetropolis => &mut participant.has_politics_metropolis,
            Award::ScienceMetropolis => &mut participant.has_science_metropolis,
        }
    }

    /// Awards shown on the scoreboard for this expansion
    pub fn available_in(expansion: Expansion) -> Vec<Award> {
        Award::ALL
            .into_iter()
            .filter(|award| award.is_available_in(expansion))
            .collect()
    }
}

impl CityImprovement {
    pub fn level(self, participant: &MatchParticipant) -> i32 {
        match self {
            CityImprovement::Trade => participant.trade_level,
            CityImprovement::Politics => participant.politics_level,
            CityImprovement::Science => participant.science_level,
        }
    }

    fn level_mut(self, participant: &mut MatchParticipant) -> &mut i32 {
        match self {
            CityImprovement::Trade => &mut participant.trade_level,
            CityImprovement::Politics => &mut participant.politics_level,
            CityImprovement::Science => &mut participant.science_level,
        }
    }
}

/// Toggle an exclusive award on one participant of a match.
///
/// If the participant already holds the award it is removed. Otherwise it is
/// taken from whichever participant held it and given to this one. Returns
/// the modified rows in the order they must be written: the previous holder
/// (if any) before the new one, so a unique "one holder" constraint never
/// sees two holders at once.
pub fn toggle_award(
    participants: &mut [MatchParticipant],
    participant_id: Uuid,
    award: Award,
    expansion: Expansion,
) -> Result<Vec<MatchParticipant>, RuleError> {
    if !award.is_available_in(expansion) {
        return Err(RuleError::AwardNotAvailable { award, expansion });
    }

    let target = participants
        .iter()
        .position(|p| p.id == participant_id)
        .ok_or(RuleError::UnknownParticipant(participant_id))?;

    if award.is_held_by(&participants[target]) {
        *award.flag_mut(&mut participants[target]) = false;
        return Ok(vec![participants[target].clone()]);
    }

    let mut changed = Vec::with_capacity(2);
    for holder in participants
        .iter_mut()
        .filter(|p| p.id != participant_id && award.is_held_by(p))
    {
        *award.flag_mut(holder) = false;
        changed.push(holder.clone());
    }

    *award.flag_mut(&mut participants[target]) = true;
    changed.push(participants[target].clone());

    Ok(changed)
}

/// Set a city improvement level, clamped to `0..=MAX_IMPROVEMENT_LEVEL`.
/// Returns the level actually stored.
pub fn set_improvement_level(
    participant: &mut MatchParticipant,
    improvement: CityImprovement,
    level: i32,
    expansion: Expansion,
) -> Result<i32, RuleError> {
    if !expansion.is_cities_knights() {
        return Err(RuleError::ImprovementsNotAvailable(expansion));
    }

    let clamped = level.clamp(0, MAX_IMPROVEMENT_LEVEL);
    *improvement.level_mut(participant) = clamped;
    Ok(clamped)
}

/// Set the base score; negative values are stored as zero
pub fn set_score(participant: &mut MatchParticipant, score: i32) -> i32 {
    participant.score = score.max(0);
    participant.score
}

/// Move the base score by `delta`, never below zero
pub fn adjust_score(participant: &mut MatchParticipant, delta: i32) -> i32 {
    set_score(participant, participant.score.saturating_add(delta))
}

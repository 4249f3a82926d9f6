// Scoreboard rules: pure functions over rows loaded from the store

pub mod awards;
pub mod leaderboard;
pub mod palette;
pub mod scorer;
pub mod validator;

use thiserror::Error;
use uuid::Uuid;

pub use awards::{Award, CityImprovement};
pub use scorer::AWARD_POINTS;
pub use validator::ValidationError;

use crate::models::Expansion;

/// A request that is well-formed but not allowed by the game state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("match {0} has already ended")]
    MatchEnded(Uuid),

    #[error("participant {0} is not part of this match")]
    UnknownParticipant(Uuid),

    #[error("{} is not played in {}", .award.label(), .expansion.label())]
    AwardNotAvailable { award: Award, expansion: Expansion },

    #[error("city improvements are only tracked in Cities & Knights, not in {}", .0.label())]
    ImprovementsNotAvailable(Expansion),

    #[error("player {0} did not take part in this match")]
    WinnerNotParticipant(Uuid),

    #[error("nobody has reached {0} VP yet; name a winner explicitly")]
    NoWinner(i32),
}

pub mod matches;
pub mod player;
pub mod stats;

pub use matches::{
    // Database rows
    Expansion, Match, MatchParticipant,
    // Inputs
    NewMatch,
    // Assembled snapshots
    MatchDetails,
};
pub use player::{NewPlayer, Player, PlayerChanges};
pub use stats::PlayerStats;

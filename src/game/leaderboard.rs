use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use super::scorer;
use crate::models::{Match, MatchParticipant, Player, PlayerStats};

/// Win percentage, one decimal; zero games is a zero rate
pub fn win_rate(wins: i64, games_played: i64) -> f64 {
    if games_played == 0 {
        return 0.0;
    }
    round_one_decimal(wins as f64 * 100.0 / games_played as f64)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Best win rate first, then most games, then name
pub fn sort_leaderboard(stats: &mut [PlayerStats]) {
    stats.sort_by(|a, b| {
        b.win_rate
            .partial_cmp(&a.win_rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.games_played.cmp(&a.games_played))
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[derive(Default)]
struct Tally {
    games_played: i64,
    wins: i64,
    total_points: i64,
    longest_road_count: i64,
    largest_army_count: i64,
}

/// Per-player statistics over ended matches. Active matches are ignored;
/// players without ended matches get a zero row.
pub fn compute_leaderboard(
    players: &[Player],
    matches: &[Match],
    participants: &[MatchParticipant],
) -> Vec<PlayerStats> {
    let ended: HashMap<Uuid, &Match> = matches
        .iter()
        .filter(|m| !m.is_active)
        .map(|m| (m.id, m))
        .collect();

    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();
    for participant in participants {
        let Some(game_match) = ended.get(&participant.match_id) else {
            continue;
        };

        let tally = tallies.entry(participant.player_id).or_default();
        tally.games_played += 1;
        if game_match.winner_id == Some(participant.player_id) {
            tally.wins += 1;
        }
        tally.total_points += scorer::total_score(participant, game_match.expansion) as i64;
        if participant.has_longest_road {
            tally.longest_road_count += 1;
        }
        if participant.has_largest_army {
            tally.largest_army_count += 1;
        }
    }

    let mut stats: Vec<PlayerStats> = players
        .iter()
        .map(|player| {
            let tally = tallies.remove(&player.id).unwrap_or_default();
            let avg_score = if tally.games_played == 0 {
                0.0
            } else {
                round_one_decimal(tally.total_points as f64 / tally.games_played as f64)
            };

            PlayerStats {
                id: player.id,
                name: player.name.clone(),
                preferred_color: player.preferred_color.clone(),
                avatar_seed: player.avatar_seed.clone(),
                games_played: tally.games_played,
                wins: tally.wins,
                losses: tally.games_played - tally.wins,
                win_rate: win_rate(tally.wins, tally.games_played),
                avg_score,
                longest_road_count: tally.longest_road_count,
                largest_army_count: tally.largest_army_count,
            }
        })
        .collect();

    sort_leaderboard(&mut stats);
    stats
}

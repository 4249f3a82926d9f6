use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{MatchQuery, ScoreboardEdit, ScoreboardStore, StoreError, StoreResult};
use crate::config::Config;
use crate::game::{leaderboard, Award, RuleError};
use crate::models::{Match, MatchParticipant, NewMatch, NewPlayer, Player, PlayerChanges, PlayerStats};
use crate::websocket::MatchHub;
use crate::AppState;

/// In-memory store for handler tests. Enforces the same constraints as the
/// database schema so conflict paths can be exercised without PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    players: Vec<Player>,
    matches: Vec<Match>,
    participants: Vec<MatchParticipant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panicking test must not poison the others
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Application state backed by a fresh in-memory store
pub fn test_state() -> Arc<AppState> {
    let config = Config::with_database_url("postgres://unused");
    let hub = MatchHub::new(config.realtime.channel_capacity);
    Arc::new(AppState {
        config,
        store: Arc::new(MemoryStore::new()),
        hub,
    })
}

#[async_trait]
impl ScoreboardStore for MemoryStore {
    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        let mut players = self.tables().players.clone();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(players)
    }

    async fn get_player(&self, id: Uuid) -> StoreResult<Option<Player>> {
        Ok(self.tables().players.iter().find(|p| p.id == id).cloned())
    }

    async fn get_players(&self, ids: &[Uuid]) -> StoreResult<Vec<Player>> {
        Ok(self
            .tables()
            .players
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        let now = Utc::now();
        let player = Player {
            id: Uuid::new_v4(),
            name: player.name.clone(),
            preferred_color: player.preferred_color.clone(),
            avatar_seed: Some(player.avatar_seed.clone()),
            created_at: now,
            updated_at: now,
        };
        self.tables().players.push(player.clone());
        Ok(player)
    }

    async fn update_player(&self, id: Uuid, changes: &PlayerChanges) -> StoreResult<Option<Player>> {
        let mut tables = self.tables();
        let Some(player) = tables.players.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            player.name = name.clone();
        }
        if let Some(color) = &changes.preferred_color {
            player.preferred_color = color.clone();
        }
        if let Some(seed) = &changes.avatar_seed {
            player.avatar_seed = seed.clone();
        }
        player.updated_at = Utc::now();

        Ok(Some(player.clone()))
    }

    async fn delete_player(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables();
        if tables.participants.iter().any(|p| p.player_id == id) {
            return Err(StoreError::Conflict(
                "Players with recorded matches cannot be deleted".to_string(),
            ));
        }

        let before = tables.players.len();
        tables.players.retain(|p| p.id != id);
        Ok(tables.players.len() < before)
    }

    async fn create_match(&self, new_match: &NewMatch) -> StoreResult<Match> {
        let mut tables = self.tables();
        if let Some(missing) = new_match
            .player_ids
            .iter()
            .find(|id| !tables.players.iter().any(|p| p.id == **id))
        {
            return Err(StoreError::Conflict(format!("Player {} does not exist", missing)));
        }

        let now = Utc::now();
        let game_match = Match {
            id: Uuid::new_v4(),
            started_at: now,
            ended_at: None,
            expansion: new_match.expansion,
            target_vp: new_match.target_vp,
            winner_id: None,
            is_active: true,
            created_at: now,
        };

        for (index, player_id) in new_match.player_ids.iter().enumerate() {
            tables.participants.push(MatchParticipant::new(
                game_match.id,
                *player_id,
                index as i32 + 1,
            ));
        }
        tables.matches.push(game_match.clone());

        Ok(game_match)
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        Ok(self.tables().matches.iter().find(|m| m.id == id).cloned())
    }

    async fn list_matches(&self, query: MatchQuery) -> StoreResult<Vec<Match>> {
        let tables = self.tables();
        let matches = match query {
            MatchQuery::Active => {
                let mut active: Vec<Match> =
                    tables.matches.iter().filter(|m| m.is_active).cloned().collect();
                active.sort_by(|a, b| b.started_at.cmp(&a.started_at));
                active
            }
            MatchQuery::Finished { limit } => {
                let mut finished: Vec<Match> =
                    tables.matches.iter().filter(|m| !m.is_active).cloned().collect();
                finished.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
                finished.truncate(limit.max(0) as usize);
                finished
            }
        };
        Ok(matches)
    }

    async fn finish_match(
        &self,
        id: Uuid,
        winner_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<Option<Match>> {
        let mut tables = self.tables();
        let Some(game_match) = tables.matches.iter_mut().find(|m| m.id == id && m.is_active) else {
            return Ok(None);
        };

        game_match.is_active = false;
        game_match.ended_at = Some(ended_at);
        game_match.winner_id = Some(winner_id);
        Ok(Some(game_match.clone()))
    }

    async fn list_participants(&self, match_ids: &[Uuid]) -> StoreResult<Vec<MatchParticipant>> {
        let mut participants: Vec<MatchParticipant> = self
            .tables()
            .participants
            .iter()
            .filter(|p| match_ids.contains(&p.match_id))
            .cloned()
            .collect();
        participants.sort_by_key(|p| (p.match_id, p.turn_order));
        Ok(participants)
    }

    async fn edit_scoreboard(
        &self,
        participant_id: Uuid,
        edit: ScoreboardEdit<'_>,
    ) -> StoreResult<Uuid> {
        // The guard is held for the whole edit, like the row locks in PostgreSQL
        let mut tables = self.tables();
        let match_id = tables
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .map(|p| p.match_id)
            .ok_or(RuleError::UnknownParticipant(participant_id))?;
        let game_match = tables
            .matches
            .iter()
            .find(|m| m.id == match_id)
            .cloned()
            .ok_or(RuleError::UnknownParticipant(participant_id))?;
        if !game_match.is_active {
            return Err(RuleError::MatchEnded(match_id).into());
        }

        let mut participants: Vec<MatchParticipant> = tables
            .participants
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.turn_order);
        let target = participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or(RuleError::UnknownParticipant(participant_id))?;
        let changed = edit(&game_match, &mut participants, target)?;

        // Work on a copy so a rejected write leaves nothing behind
        let mut staged = tables.participants.clone();
        for row in &changed {
            let Some(slot) = staged.iter_mut().find(|p| p.id == row.id) else {
                continue;
            };
            *slot = row.clone();

            for award in Award::ALL {
                let holders = staged
                    .iter()
                    .filter(|p| p.match_id == match_id && award.is_held_by(p))
                    .count();
                if holders > 1 {
                    return Err(StoreError::Conflict(format!(
                        "{} already has a holder in this match",
                        award.label()
                    )));
                }
            }
        }

        tables.participants = staged;
        Ok(match_id)
    }

    async fn leaderboard(&self) -> StoreResult<Vec<PlayerStats>> {
        let tables = self.tables();
        Ok(leaderboard::compute_leaderboard(
            &tables.players,
            &tables.matches,
            &tables.participants,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Expansion;

    async fn seeded(store: &MemoryStore, names: &[&str]) -> Vec<Player> {
        let mut players = Vec::new();
        for name in names {
            let player = store
                .create_player(&NewPlayer {
                    name: name.to_string(),
                    preferred_color: "#E74C3C".to_string(),
                    avatar_seed: name.to_lowercase(),
                })
                .await
                .unwrap();
            players.push(player);
        }
        players
    }

    async fn base_match(store: &MemoryStore) -> (Vec<Player>, Match) {
        let players = seeded(store, &["Anna", "Ben", "Cleo"]).await;
        let game_match = store
            .create_match(&NewMatch {
                expansion: Expansion::Base,
                target_vp: 10,
                player_ids: players.iter().map(|p| p.id).collect(),
            })
            .await
            .unwrap();
        (players, game_match)
    }

    #[tokio::test]
    async fn test_second_award_holder_rejected() {
        let store = MemoryStore::new();
        let (_, game_match) = base_match(&store).await;
        let rows = store.list_participants(&[game_match.id]).await.unwrap();

        store
            .edit_scoreboard(rows[0].id, &|_: &Match, participants: &mut [MatchParticipant], target: usize| {
                participants[target].has_longest_road = true;
                Ok(vec![participants[target].clone()])
            })
            .await
            .unwrap();

        // Set before clear violates the single-holder rule
        let err = store
            .edit_scoreboard(rows[1].id, &|_: &Match, participants: &mut [MatchParticipant], target: usize| {
                participants[target].has_longest_road = true;
                Ok(vec![participants[target].clone()])
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Clear before set is accepted
        store
            .edit_scoreboard(rows[1].id, &|_: &Match, participants: &mut [MatchParticipant], target: usize| {
                participants[0].has_longest_road = false;
                participants[target].has_longest_road = true;
                Ok(vec![participants[0].clone(), participants[target].clone()])
            })
            .await
            .unwrap();
        let rows = store.list_participants(&[game_match.id]).await.unwrap();
        assert!(!rows[0].has_longest_road);
        assert!(rows[1].has_longest_road);
    }

    #[tokio::test]
    async fn test_edit_after_finish_is_rejected() {
        let store = MemoryStore::new();
        let (players, game_match) = base_match(&store).await;
        let rows = store.list_participants(&[game_match.id]).await.unwrap();

        // The end lands between the client's last read and its edit
        store
            .finish_match(game_match.id, players[0].id, Utc::now())
            .await
            .unwrap();

        let err = store
            .edit_scoreboard(rows[0].id, &|_: &Match, participants: &mut [MatchParticipant], target: usize| {
                participants[target].score = 7;
                Ok(vec![participants[target].clone()])
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rule(RuleError::MatchEnded(id)) if id == game_match.id));

        let after = store.list_participants(&[game_match.id]).await.unwrap();
        assert_eq!(after[0].score, 0);
    }

    #[tokio::test]
    async fn test_edit_of_unknown_participant() {
        let store = MemoryStore::new();
        base_match(&store).await;
        let err = store
            .edit_scoreboard(Uuid::new_v4(), &|_: &Match, _: &mut [MatchParticipant], _: usize| {
                Ok(Vec::new())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rule(RuleError::UnknownParticipant(_))));
    }

    #[tokio::test]
    async fn test_player_with_history_cannot_be_deleted() {
        let store = MemoryStore::new();
        let players = seeded(&store, &["Anna", "Ben", "Cleo", "Dan"]).await;
        store
            .create_match(&NewMatch {
                expansion: Expansion::Seafarers,
                target_vp: 12,
                player_ids: players[..3].iter().map(|p| p.id).collect(),
            })
            .await
            .unwrap();

        assert!(matches!(
            store.delete_player(players[0].id).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.delete_player(players[3].id).await.unwrap());
        assert!(!store.delete_player(players[3].id).await.unwrap());
    }

    #[tokio::test]
    async fn test_match_finishes_once() {
        let store = MemoryStore::new();
        let players = seeded(&store, &["Anna", "Ben", "Cleo"]).await;
        let game_match = store
            .create_match(&NewMatch {
                expansion: Expansion::Base,
                target_vp: 10,
                player_ids: players.iter().map(|p| p.id).collect(),
            })
            .await
            .unwrap();

        let ended = store
            .finish_match(game_match.id, players[1].id, Utc::now())
            .await
            .unwrap();
        assert!(ended.is_some());
        let again = store
            .finish_match(game_match.id, players[0].id, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());
    }
}

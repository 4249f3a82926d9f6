use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::messages::ServerMessage;

/// One broadcast channel per watched match. Every scoreboard mutation
/// publishes a full snapshot to that match's subscribers.
pub struct MatchHub {
    channels: DashMap<Uuid, broadcast::Sender<ServerMessage>>,
    capacity: usize,
}

impl MatchHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Receiver for a match's updates, creating the channel on first use
    pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<ServerMessage> {
        self.channels
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send to current subscribers. Returns how many received it; a match
    /// nobody watches is not an error.
    pub fn publish(&self, match_id: Uuid, message: ServerMessage) -> usize {
        let Some(sender) = self.channels.get(&match_id) else {
            return 0;
        };

        match sender.send(message) {
            Ok(count) => {
                tracing::debug!("Published update for match {} to {} subscribers", match_id, count);
                count
            }
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self, match_id: Uuid) -> usize {
        self.channels
            .get(&match_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Drop the match's channel if its last subscriber has gone
    pub fn release(&self, match_id: Uuid) {
        let removed = self
            .channels
            .remove_if(&match_id, |_, sender| sender.receiver_count() == 0);
        if removed.is_some() {
            tracing::debug!("Closed update channel for match {}", match_id);
        }
    }

    /// Remove every channel without subscribers. Returns the number removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.channels.len();
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
        before.saturating_sub(self.channels.len())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

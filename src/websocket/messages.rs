use serde::{Deserialize, Serialize};

use crate::models::MatchDetails;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh snapshot, e.g. after the tab regains focus
    Refresh,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Complete current state of the watched match
    MatchSnapshot { snapshot: Box<MatchDetails> },
    Error { message: String },
}

impl ServerMessage {
    pub fn snapshot(details: MatchDetails) -> Self {
        ServerMessage::MatchSnapshot {
            snapshot: Box::new(details),
        }
    }
}

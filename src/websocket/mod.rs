pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::handle_match_socket;
pub use hub::MatchHub;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlayerColor {
    pub name: &'static str,
    pub hex: &'static str,
    /// Readable text colour on top of `hex`
    pub text_color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<&'static str>,
}

const fn classic(name: &'static str, hex: &'static str, text_color: &'static str) -> PlayerColor {
    PlayerColor {
        name,
        hex,
        text_color,
        resource: None,
    }
}

const fn resource(name: &'static str, hex: &'static str, resource: &'static str) -> PlayerColor {
    PlayerColor {
        name,
        hex,
        text_color: "white",
        resource: Some(resource),
    }
}

/// Classic piece colours first, then resource-themed alternatives
pub const PLAYER_COLORS: [PlayerColor; 11] = [
    classic("Red", "#E74C3C", "white"),
    classic("Blue", "#3498DB", "white"),
    classic("Orange", "#F39C12", "white"),
    classic("White", "#F5F5F5", "#333333"),
    classic("Green", "#27AE60", "white"),
    classic("Brown", "#8B4513", "white"),
    resource("Wheat", "#E8B84A", "wheat"),
    resource("Brick", "#C75B39", "brick"),
    resource("Sheep", "#8FB339", "sheep"),
    resource("Ore", "#6B7280", "ore"),
    resource("Wood", "#2D5016", "wood"),
];

pub const DEFAULT_COLOR: &str = PLAYER_COLORS[0].hex;

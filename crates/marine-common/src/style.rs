//! Color definitions for map markers and overlays.

use serde::{Deserialize, Serialize};

/// Color representation supporting the formats used in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },

    /// Hex string ("#RRGGBB" or "#RRGGBBAA") or a named color ("yellow")
    Text(String),
}

impl Color {
    pub fn named(name: &str) -> Self {
        Color::Text(name.to_string())
    }

    pub fn transparent() -> Self {
        Color::Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert to an RGBA tuple. Unknown names resolve to opaque black.
    pub fn to_rgba(&self) -> (u8, u8, u8, u8) {
        match self {
            Color::Rgba { r, g, b, a } => (*r, *g, *b, *a),
            Color::Text(s) if s.starts_with('#') => parse_hex_color(s),
            Color::Text(name) => named_color(name),
        }
    }

    /// Same color with its alpha replaced.
    pub fn with_alpha(&self, alpha: u8) -> Color {
        let (r, g, b, _) = self.to_rgba();
        Color::Rgba { r, g, b, a: alpha }
    }

    /// CSS `#rrggbb` form (alpha dropped).
    pub fn to_css_hex(&self) -> String {
        let (r, g, b, _) = self.to_rgba();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn parse_hex_color(s: &str) -> (u8, u8, u8, u8) {
    let s = s.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>, default: u8| {
        s.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(default)
    };

    match s.len() {
        6 => (channel(0..2, 0), channel(2..4, 0), channel(4..6, 0), 255),
        8 => (
            channel(0..2, 0),
            channel(2..4, 0),
            channel(4..6, 0),
            channel(6..8, 255),
        ),
        _ => (0, 0, 0, 255),
    }
}

fn named_color(name: &str) -> (u8, u8, u8, u8) {
    match name.to_lowercase().as_str() {
        "transparent" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "green" => (0, 128, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        _ => (0, 0, 0, 255),
    }
}

//! Options shared by all layout engines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Flow direction of the rank axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Top to bottom
    #[default]
    TB,
    /// Bottom to top
    BT,
    /// Left to right
    LR,
    /// Right to left
    RL,
}

impl Direction {
    /// Ranks advance along x instead of y.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LR | Direction::RL)
    }

    /// Ranks advance toward smaller coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::BT | Direction::RL)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TB => "TB",
            Direction::BT => "BT",
            Direction::LR => "LR",
            Direction::RL => "RL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction '{0}', expected TB, BT, LR or RL")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TB" => Ok(Direction::TB),
            "BT" => Ok(Direction::BT),
            "LR" => Ok(Direction::LR),
            "RL" => Ok(Direction::RL),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub direction: Direction,
    /// Gap between neighbouring nodes within a rank.
    pub node_spacing_x: f64,
    /// Gap between consecutive ranks.
    pub node_spacing_y: f64,
    /// Distance from the canvas origin to the drawing.
    pub padding: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::TB,
            node_spacing_x: 80.0,
            node_spacing_y: 100.0,
            padding: 50.0,
        }
    }
}

impl LayoutOptions {
    /// Copy with every distance forced finite and non-negative.
    pub(crate) fn sanitized(&self) -> Self {
        Self {
            direction: self.direction,
            node_spacing_x: non_negative(self.node_spacing_x),
            node_spacing_y: non_negative(self.node_spacing_y),
            padding: non_negative(self.padding),
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

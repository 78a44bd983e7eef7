use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One of the eight lineup positions contested in a dual match.
///
/// Wire codes 1-4 are singles flights, 5-8 are doubles flights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flight {
    #[serde(rename = "1S")]
    Singles1,
    #[serde(rename = "2S")]
    Singles2,
    #[serde(rename = "3S")]
    Singles3,
    #[serde(rename = "4S")]
    Singles4,
    #[serde(rename = "1D")]
    Doubles1,
    #[serde(rename = "2D")]
    Doubles2,
    #[serde(rename = "3D")]
    Doubles3,
    #[serde(rename = "4D")]
    Doubles4,
}

/// Competitive-significance weight for each flight, 1 Singles down to 4 Doubles.
static FLIGHT_WEIGHTS: Lazy<[f64; 8]> =
    Lazy::new(|| [1.0, 0.75, 0.25, 0.10, 1.0, 0.50, 0.25, 0.10]);

impl Flight {
    pub const COUNT: usize = 8;

    /// Decode an integer flight code. Unknown codes return `None` and the
    /// caller drops the record from both weighted totals and tallies.
    pub fn from_code(code: u8) -> Option<Flight> {
        match code {
            1 => Some(Flight::Singles1),
            2 => Some(Flight::Singles2),
            3 => Some(Flight::Singles3),
            4 => Some(Flight::Singles4),
            5 => Some(Flight::Doubles1),
            6 => Some(Flight::Doubles2),
            7 => Some(Flight::Doubles3),
            8 => Some(Flight::Doubles4),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        self.index() as u8 + 1
    }

    /// Zero-based index into per-flight breakdown arrays.
    pub fn index(&self) -> usize {
        match self {
            Flight::Singles1 => 0,
            Flight::Singles2 => 1,
            Flight::Singles3 => 2,
            Flight::Singles4 => 3,
            Flight::Doubles1 => 4,
            Flight::Doubles2 => 5,
            Flight::Doubles3 => 6,
            Flight::Doubles4 => 7,
        }
    }

    pub fn weight(&self) -> f64 {
        FLIGHT_WEIGHTS[self.index()]
    }

    /// Canonical label, e.g. "2 Singles".
    pub fn label(&self) -> &'static str {
        match self {
            Flight::Singles1 => "1 Singles",
            Flight::Singles2 => "2 Singles",
            Flight::Singles3 => "3 Singles",
            Flight::Singles4 => "4 Singles",
            Flight::Doubles1 => "1 Doubles",
            Flight::Doubles2 => "2 Doubles",
            Flight::Doubles3 => "3 Doubles",
            Flight::Doubles4 => "4 Doubles",
        }
    }
}

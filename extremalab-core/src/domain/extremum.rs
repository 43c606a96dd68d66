//! Ternary extremum label: minimum (buy), none, maximum (sell).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-bar extremum label.
///
/// Serialized as the integer encoding used by labelled datasets and external
/// classifiers: `-1` minimum, `0` none, `1` maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Extremum {
    /// Local minimum, a buy signal.
    Minimum,
    #[default]
    None,
    /// Local maximum, a sell signal.
    Maximum,
}

impl Extremum {
    pub const BUY: Extremum = Extremum::Minimum;
    pub const SELL: Extremum = Extremum::Maximum;

    pub fn as_i8(self) -> i8 {
        match self {
            Extremum::Minimum => -1,
            Extremum::None => 0,
            Extremum::Maximum => 1,
        }
    }

    /// The label of the opposite sign; `None` is its own opposite.
    pub fn opposite(self) -> Extremum {
        match self {
            Extremum::Minimum => Extremum::Maximum,
            Extremum::None => Extremum::None,
            Extremum::Maximum => Extremum::Minimum,
        }
    }

    pub fn is_signal(self) -> bool {
        self != Extremum::None
    }

    /// Decode a classifier output value. Anything that is not exactly
    /// -1, 0 or 1 after rounding is rejected.
    pub fn from_f64(value: f64) -> Option<Extremum> {
        if !value.is_finite() {
            return None;
        }
        let rounded = value.round();
        if (value - rounded).abs() > 1e-9 {
            return None;
        }
        match rounded as i64 {
            -1 => Some(Extremum::Minimum),
            0 => Some(Extremum::None),
            1 => Some(Extremum::Maximum),
            _ => None,
        }
    }
}

impl From<Extremum> for i8 {
    fn from(e: Extremum) -> i8 {
        e.as_i8()
    }
}

impl TryFrom<i8> for Extremum {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Extremum::Minimum),
            0 => Ok(Extremum::None),
            1 => Ok(Extremum::Maximum),
            other => Err(format!("extremum label must be -1, 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for Extremum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_encoding() {
        assert_eq!(Extremum::Minimum.as_i8(), -1);
        assert_eq!(Extremum::None.as_i8(), 0);
        assert_eq!(Extremum::Maximum.as_i8(), 1);
        assert_eq!(Extremum::try_from(1i8), Ok(Extremum::Maximum));
        assert!(Extremum::try_from(2i8).is_err());
    }

    #[test]
    fn opposite_flips_sign() {
        assert_eq!(Extremum::BUY.opposite(), Extremum::SELL);
        assert_eq!(Extremum::SELL.opposite(), Extremum::BUY);
        assert_eq!(Extremum::None.opposite(), Extremum::None);
    }

    #[test]
    fn from_f64_accepts_integral_labels_only() {
        assert_eq!(Extremum::from_f64(-1.0), Some(Extremum::Minimum));
        assert_eq!(Extremum::from_f64(0.0), Some(Extremum::None));
        assert_eq!(Extremum::from_f64(0.5), None);
        assert_eq!(Extremum::from_f64(f64::NAN), None);
        assert_eq!(Extremum::from_f64(3.0), None);
    }

    #[test]
    fn serializes_as_integer() {
        let json = serde_json::to_string(&vec![Extremum::Minimum, Extremum::Maximum]).unwrap();
        assert_eq!(json, "[-1,1]");
        let back: Vec<Extremum> = serde_json::from_str("[0,-1]").unwrap();
        assert_eq!(back, vec![Extremum::None, Extremum::Minimum]);
        assert!(serde_json::from_str::<Extremum>("5").is_err());
    }
}

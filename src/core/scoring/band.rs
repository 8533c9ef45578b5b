use std::fmt;

use serde::Serialize;

/// Values the scorer is asked to choose from, as they appear in the prompt.
pub const ALLOWED_BANDS: &str =
    "0, 0.5, 1, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5, 5.5, 6, 6.5, 7, 7.5, 8.0, 8.5, 9, 9.5";

const MAX_BAND: f64 = 9.5;

/// An IELTS band token, kept exactly as the model produced it (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BandScore(String);

impl BandScore {
    /// Accept `raw` if it trims to a half-band step between 0 and 9.5.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim();
        // Plain decimals only; `f64` parsing also takes signs and exponents.
        if !token.bytes().all(|b| b.is_ascii_digit() || b == b'.')
            || !token.starts_with(|c: char| c.is_ascii_digit())
            || token.ends_with('.')
        {
            return None;
        }
        let value: f64 = token.parse().ok()?;
        let doubled = value * 2.0;
        let on_step = (doubled - doubled.round()).abs() < f64::EPSILON;
        ((0.0..=MAX_BAND).contains(&value) && on_step).then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> f64 {
        self.0.parse().unwrap_or_default()
    }
}

impl fmt::Display for BandScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

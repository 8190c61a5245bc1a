//! Propeller identifiers of the form `<diameter>x<pitch><suffix>`.
//!
//! Dimensions are in inches. Catalog names drop the decimal point in two
//! common cases, undone here:
//! - a diameter above 30 is tenths (`105x45` is 10.5 in)
//! - a pitch above 20 on a diameter of at most 20 is tenths (`10x45MR` is 4.5 in)

use crate::error::PropError;
use std::fmt;
use std::str::FromStr;

const INCH_M: f64 = 0.0254;

#[derive(Clone, Debug, PartialEq)]
pub struct PropId {
    raw: String,
    pub diameter_in: f64,
    pub pitch_in: f64,
    /// Trailing series code such as `E`, `MR`, `SF`
    pub suffix: String,
}

impl PropId {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn diameter_m(&self) -> f64 {
        self.diameter_in * INCH_M
    }

    /// `J = V / (n · D)` with `n` in rev/s; zero when not spinning.
    pub fn advance_ratio(&self, airspeed_ms: f64, rpm: f64) -> f64 {
        let rev_per_s = rpm / 60.0;
        if rev_per_s <= 0.0 {
            return 0.0;
        }
        airspeed_ms / (rev_per_s * self.diameter_m())
    }

    /// True when both dimensions fall inside the closed ranges.
    pub fn within(&self, diameter_in: (f64, f64), pitch_in: (f64, f64)) -> bool {
        (diameter_in.0..=diameter_in.1).contains(&self.diameter_in) && (pitch_in.0..=pitch_in.1).contains(&self.pitch_in)
    }
}

/// Leading decimal number and the rest of the string.
fn split_number(s: &str) -> Option<(f64, &str)> {
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map_or(s.len(), |(i, _)| i);
    let digits = &s[..end];
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|n| (n, &s[end..]))
}

impl FromStr for PropId {
    type Err = PropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let bad = PropError::InvalidInput {
            what: "propeller id must look like <diameter>x<pitch><suffix>",
        };

        let (mut diameter_in, rest) = split_number(raw).ok_or(bad.clone())?;
        let rest = rest.strip_prefix(['x', 'X']).ok_or(bad.clone())?;
        let (mut pitch_in, suffix) = split_number(rest).ok_or(bad.clone())?;

        if diameter_in > 30.0 {
            diameter_in /= 10.0;
        }
        if pitch_in > 20.0 && diameter_in <= 20.0 {
            pitch_in /= 10.0;
        }
        if diameter_in <= 0.0 || pitch_in <= 0.0 {
            return Err(bad);
        }

        Ok(Self {
            raw: raw.to_string(),
            diameter_in,
            pitch_in,
            suffix: suffix.to_string(),
        })
    }
}

impl fmt::Display for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> PropId {
        s.parse().unwrap()
    }

    #[test]
    fn plain_ids() {
        let id = parse("7x7E");
        assert_eq!((id.diameter_in, id.pitch_in), (7.0, 7.0));
        assert_eq!(id.suffix, "E");
        assert_eq!(id.to_string(), "7x7E");

        let id = parse("10x4.5");
        assert_eq!((id.diameter_in, id.pitch_in), (10.0, 4.5));
        assert_eq!(id.suffix, "");
    }

    #[test]
    fn encoded_decimals() {
        let id = parse("10x45MR");
        assert_eq!((id.diameter_in, id.pitch_in), (10.0, 4.5));
        assert_eq!(id.suffix, "MR");

        let id = parse("105x45");
        assert_eq!((id.diameter_in, id.pitch_in), (10.5, 4.5));
    }

    #[test]
    fn large_props_keep_pitch() {
        let id = parse("22x24");
        assert_eq!((id.diameter_in, id.pitch_in), (22.0, 24.0));
    }

    #[test]
    fn rejects_malformed() {
        assert!("x7".parse::<PropId>().is_err());
        assert!("7-7E".parse::<PropId>().is_err());
        assert!("7x".parse::<PropId>().is_err());
        assert!("".parse::<PropId>().is_err());
    }

    #[test]
    fn advance_ratio() {
        let id = parse("10x5");
        let j = id.advance_ratio(10.0, 6000.0);
        assert!((j - 10.0 / (100.0 * 0.254)).abs() < 1e-12);
        assert_eq!(id.advance_ratio(10.0, 0.0), 0.0);
    }

    #[test]
    fn dimension_filter() {
        let id = parse("9x6");
        assert!(id.within((8.0, 10.0), (4.0, 6.0)));
        assert!(!id.within((8.0, 10.0), (3.0, 5.0)));
    }
}

//! Cell chemistries and their open-circuit voltage curves.

use crate::error::{BatteryError, BatteryResult};
use pt_core::{ensure_in_range, interp_table};
use std::fmt;
use std::str::FromStr;

/// NMC-type OCV anchors `(SOC %, V)`, ascending in SOC.
const NMC_OCV: [(f64, f64); 21] = [
    (0.0, 3.00),
    (5.0, 3.30),
    (10.0, 3.45),
    (15.0, 3.52),
    (20.0, 3.60),
    (25.0, 3.65),
    (30.0, 3.70),
    (35.0, 3.72),
    (40.0, 3.75),
    (45.0, 3.78),
    (50.0, 3.80),
    (55.0, 3.82),
    (60.0, 3.85),
    (65.0, 3.88),
    (70.0, 3.92),
    (75.0, 3.95),
    (80.0, 4.00),
    (85.0, 4.05),
    (90.0, 4.10),
    (95.0, 4.15),
    (100.0, 4.20),
];

/// LFP OCV anchors. Flat plateau between 20 % and 90 %.
const LFP_OCV: [(f64, f64); 11] = [
    (0.0, 2.50),
    (10.0, 3.10),
    (20.0, 3.18),
    (30.0, 3.22),
    (40.0, 3.25),
    (50.0, 3.26),
    (60.0, 3.28),
    (70.0, 3.30),
    (80.0, 3.32),
    (90.0, 3.35),
    (100.0, 3.60),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Chemistry {
    Nmc,
    Nca,
    Lfp,
    Lco,
    LiPo,
}

impl Chemistry {
    pub const ALL: [Chemistry; 5] = [Self::Nmc, Self::Nca, Self::Lfp, Self::Lco, Self::LiPo];

    /// OCV anchor table, ascending in SOC.
    pub fn ocv_table(self) -> &'static [(f64, f64)] {
        match self {
            Self::Lfp => &LFP_OCV,
            Self::Nmc | Self::Nca | Self::Lco | Self::LiPo => &NMC_OCV,
        }
    }

    /// Open-circuit voltage [V] at a state of charge in percent.
    ///
    /// # Errors
    /// `InvalidInput` when `soc_percent` is outside `[0, 100]`.
    pub fn ocv(self, soc_percent: f64) -> BatteryResult<f64> {
        ensure_in_range(soc_percent, 0.0, 100.0, "state of charge [%]")?;
        Ok(interp_table(self.ocv_table(), soc_percent))
    }

    /// Datasheet voltage window `(min, nominal, max)` [V].
    pub fn voltage_window(self) -> (f64, f64, f64) {
        match self {
            Self::Nmc | Self::Nca => (2.5, 3.6, 4.2),
            Self::Lfp => (2.5, 3.2, 3.6),
            Self::Lco | Self::LiPo => (3.0, 3.7, 4.2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nmc => "NMC",
            Self::Nca => "NCA",
            Self::Lfp => "LFP",
            Self::Lco => "LCO",
            Self::LiPo => "LiPo",
        }
    }
}

impl fmt::Display for Chemistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chemistry {
    type Err = BatteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(BatteryError::InvalidInput {
                what: "unknown cell chemistry",
            })
    }
}

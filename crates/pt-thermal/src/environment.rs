//! Typical thermal resistances to ambient for small packs and motors.

/// Cooling environment around a lumped body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThermalEnvironment {
    /// Bare cell in still air
    BareStillAir,
    /// Shrink-wrapped pack, poor convection
    ShrinkWrapped,
    /// Light airflow (prop wash)
    LightAirflow,
    /// Forced-air cooling
    ActiveCooling,
    /// Liquid cooling plate
    LiquidCooling,
}

impl ThermalEnvironment {
    pub const ALL: [ThermalEnvironment; 5] = [
        Self::BareStillAir,
        Self::ShrinkWrapped,
        Self::LightAirflow,
        Self::ActiveCooling,
        Self::LiquidCooling,
    ];

    /// Thermal resistance to ambient [°C/W].
    pub fn r_thermal_c_per_w(self) -> f64 {
        match self {
            Self::BareStillAir => 20.0,
            Self::ShrinkWrapped => 28.0,
            Self::LightAirflow => 12.0,
            Self::ActiveCooling => 5.0,
            Self::LiquidCooling => 2.0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::BareStillAir => "bare cell, still air",
            Self::ShrinkWrapped => "shrink-wrapped pack",
            Self::LightAirflow => "light airflow",
            Self::ActiveCooling => "active air cooling",
            Self::LiquidCooling => "liquid cooling",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn better_cooling_means_lower_resistance() {
        let r: Vec<f64> = [
            ThermalEnvironment::ShrinkWrapped,
            ThermalEnvironment::BareStillAir,
            ThermalEnvironment::LightAirflow,
            ThermalEnvironment::ActiveCooling,
            ThermalEnvironment::LiquidCooling,
        ]
        .iter()
        .map(|e| e.r_thermal_c_per_w())
        .collect();
        assert!(r.windows(2).all(|w| w[0] > w[1]));
    }
}

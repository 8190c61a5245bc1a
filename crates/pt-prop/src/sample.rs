/// One static or wind-tunnel measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropSample {
    /// Freestream airspeed [m/s]
    pub airspeed_ms: f64,
    /// Shaft speed [RPM]
    pub rpm: f64,
    /// Thrust [N]
    pub thrust_n: f64,
    /// Shaft power [W]
    pub power_w: f64,
}

impl PropSample {
    pub fn new(airspeed_ms: f64, rpm: f64, thrust_n: f64, power_w: f64) -> Self {
        Self {
            airspeed_ms,
            rpm,
            thrust_n,
            power_w,
        }
    }
}

/// Samples on the tensor grid `airspeeds × rpms` from a `(thrust, power)` model.
pub fn grid_samples<F>(airspeeds: &[f64], rpms: &[f64], mut model: F) -> Vec<PropSample>
where
    F: FnMut(f64, f64) -> (f64, f64),
{
    let mut samples = Vec::with_capacity(airspeeds.len() * rpms.len());
    for &rpm in rpms {
        for &v in airspeeds {
            let (thrust_n, power_w) = model(v, rpm);
            samples.push(PropSample::new(v, rpm, thrust_n, power_w));
        }
    }
    samples
}

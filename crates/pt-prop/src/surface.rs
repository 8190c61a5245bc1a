//! Thrust and power surfaces over (airspeed, RPM).

use pt_core::{BrentConfig, Force, Power, brent, ensure_finite, newtons, watts};
use tracing::{debug, trace};

use crate::error::{PropError, PropResult};
use crate::geometry::{ConvexHull, GEOM_EPS, Point, Triangulation};
use crate::id::PropId;
use crate::sample::PropSample;

/// Airspeeds below this are treated as static thrust.
const STATIC_AIRSPEED_MS: f64 = 1e-9;

/// Powers at or below this give zero efficiency.
const MIN_POWER_W: f64 = 1e-6;

/// Surface configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceConfig {
    /// Root finder used by [`PropPerformanceSurface::power_for_thrust`]
    pub root: BrentConfig,
}

/// Bounding box of the sampled data.
///
/// Every point in the convex hull lies inside the box; the reverse does not
/// hold, so `contains` on the surface is the authoritative check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub min_airspeed_ms: f64,
    pub max_airspeed_ms: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
}

impl Domain {
    pub fn contains(&self, airspeed_ms: f64, rpm: f64) -> bool {
        (self.min_airspeed_ms..=self.max_airspeed_ms).contains(&airspeed_ms)
            && (self.min_rpm..=self.max_rpm).contains(&rpm)
    }
}

/// Interpolated thrust and power at one query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropPoint {
    pub thrust_n: f64,
    pub power_w: f64,
}

impl PropPoint {
    pub fn thrust(&self) -> Force {
        newtons(self.thrust_n)
    }

    pub fn power(&self) -> Power {
        watts(self.power_w)
    }
}

/// Result of the inverse thrust lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrustSolution {
    pub rpm: f64,
    pub power_w: f64,
    /// Interpolated thrust at `rpm`
    pub thrust_n: f64,
}

/// Piecewise-linear thrust and power over a Delaunay triangulation of
/// scattered samples.
///
/// Immutable after construction and `Sync`, so one surface can serve
/// concurrent solves.
#[derive(Clone, Debug)]
pub struct PropPerformanceSurface {
    id: Option<PropId>,
    samples: Vec<PropSample>,
    triangulation: Triangulation,
    hull: ConvexHull,
    domain: Domain,
    config: SurfaceConfig,
}

impl PropPerformanceSurface {
    /// Build a surface from samples with the default configuration.
    ///
    /// # Errors
    /// - `EmptySamples` with no samples
    /// - `InvalidInput` for non-finite values
    /// - `Degenerate` for duplicate points or samples that enclose no area
    pub fn new(samples: Vec<PropSample>) -> PropResult<Self> {
        Self::with_config(samples, SurfaceConfig::default())
    }

    pub fn with_config(samples: Vec<PropSample>, config: SurfaceConfig) -> PropResult<Self> {
        if samples.is_empty() {
            return Err(PropError::EmptySamples);
        }
        for s in &samples {
            if ![s.airspeed_ms, s.rpm, s.thrust_n, s.power_w]
                .iter()
                .all(|x| x.is_finite())
            {
                return Err(PropError::InvalidInput {
                    what: "propeller sample values must be finite",
                });
            }
        }

        let domain = samples.iter().fold(
            Domain {
                min_airspeed_ms: f64::INFINITY,
                max_airspeed_ms: f64::NEG_INFINITY,
                min_rpm: f64::INFINITY,
                max_rpm: f64::NEG_INFINITY,
            },
            |d, s| Domain {
                min_airspeed_ms: d.min_airspeed_ms.min(s.airspeed_ms),
                max_airspeed_ms: d.max_airspeed_ms.max(s.airspeed_ms),
                min_rpm: d.min_rpm.min(s.rpm),
                max_rpm: d.max_rpm.max(s.rpm),
            },
        );
        if domain.max_airspeed_ms <= domain.min_airspeed_ms || domain.max_rpm <= domain.min_rpm {
            return Err(PropError::Degenerate {
                what: "samples must span both airspeed and rpm",
            });
        }

        let points: Vec<Point> = samples
            .iter()
            .map(|s| normalize(&domain, s.airspeed_ms, s.rpm))
            .collect();
        let hull = ConvexHull::new(&points);
        let triangulation = Triangulation::new(points)?;

        debug!(
            samples = samples.len(),
            triangles = triangulation.triangle_count(),
            hull_vertices = hull.vertices().len(),
            "built propeller surface"
        );

        Ok(Self {
            id: None,
            samples,
            triangulation,
            hull,
            domain,
            config,
        })
    }

    /// Attach the identifier the samples were loaded under.
    pub fn with_id(mut self, id: PropId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<&PropId> {
        self.id.as_ref()
    }

    pub fn samples(&self) -> &[PropSample] {
        &self.samples
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// True when `(airspeed, rpm)` lies inside or on the sample hull.
    pub fn contains(&self, airspeed_ms: f64, rpm: f64) -> bool {
        self.domain.contains(airspeed_ms, rpm) && self.hull.contains(normalize(&self.domain, airspeed_ms, rpm))
    }

    /// RPM interval admitted by the hull at `airspeed_ms`, if any.
    pub fn rpm_range_at(&self, airspeed_ms: f64) -> Option<(f64, f64)> {
        if !airspeed_ms.is_finite() {
            return None;
        }
        let x = (airspeed_ms - self.domain.min_airspeed_ms) / self.airspeed_span();
        let (lo, hi) = self.hull.y_range_at(x)?;
        let span = self.rpm_span();
        let lo = (self.domain.min_rpm + lo * span).max(self.domain.min_rpm);
        let hi = (self.domain.min_rpm + hi * span).min(self.domain.max_rpm);
        (lo <= hi).then_some((lo, hi))
    }

    /// Thrust and power from a single point location.
    ///
    /// # Errors
    /// `InvalidInput` for non-finite arguments, `OutOfEnvelope` outside the hull.
    pub fn evaluate(&self, airspeed_ms: f64, rpm: f64) -> PropResult<PropPoint> {
        ensure_finite(airspeed_ms, "airspeed")?;
        ensure_finite(rpm, "rpm")?;
        if !self.contains(airspeed_ms, rpm) {
            return Err(PropError::OutOfEnvelope { airspeed_ms, rpm });
        }
        let q = normalize(&self.domain, airspeed_ms, rpm);

        let (tri, w) = self.triangulation.locate(q);
        let mut point = PropPoint {
            thrust_n: 0.0,
            power_w: 0.0,
        };
        for k in 0..3 {
            let s = &self.samples[tri[k]];
            point.thrust_n += w[k] * s.thrust_n;
            point.power_w += w[k] * s.power_w;
        }
        Ok(point)
    }

    pub fn thrust(&self, airspeed_ms: f64, rpm: f64) -> PropResult<f64> {
        Ok(self.evaluate(airspeed_ms, rpm)?.thrust_n)
    }

    pub fn power(&self, airspeed_ms: f64, rpm: f64) -> PropResult<f64> {
        Ok(self.evaluate(airspeed_ms, rpm)?.power_w)
    }

    /// Propulsive efficiency `T·v / P`.
    ///
    /// Zero in the static condition, for non-positive power and for
    /// negative thrust (windmilling).
    pub fn efficiency(&self, airspeed_ms: f64, rpm: f64) -> PropResult<f64> {
        let p = self.evaluate(airspeed_ms, rpm)?;
        if airspeed_ms.abs() < STATIC_AIRSPEED_MS || p.power_w <= MIN_POWER_W || p.thrust_n < 0.0 {
            return Ok(0.0);
        }
        Ok(p.thrust_n * airspeed_ms / p.power_w)
    }

    /// Thrust at the top of the admitted RPM range.
    ///
    /// Thrust is increasing in RPM at fixed airspeed, so this is the
    /// attainable maximum.
    pub fn max_thrust(&self, airspeed_ms: f64) -> PropResult<f64> {
        let (_, hi) = self.admitted_rpm_range(airspeed_ms)?;
        self.thrust(airspeed_ms, hi)
    }

    /// RPM and power that produce `thrust_required_n` at `airspeed_ms`.
    ///
    /// # Errors
    /// - `AirspeedOutOfEnvelope` when no sampled RPM exists at the airspeed
    /// - `Infeasible` when the thrust exceeds the maximum at the airspeed
    /// - `BelowEnvelope` when it is below the lowest sampled thrust
    /// - `NonConvergence` when the root finder hits its iteration cap
    pub fn power_for_thrust(&self, airspeed_ms: f64, thrust_required_n: f64) -> PropResult<ThrustSolution> {
        ensure_finite(thrust_required_n, "required thrust")?;
        let (lo, hi) = self.admitted_rpm_range(airspeed_ms)?;

        let t_hi = self.thrust(airspeed_ms, hi)?;
        if thrust_required_n > t_hi {
            return Err(PropError::Infeasible {
                airspeed_ms,
                thrust_required_n,
                max_thrust_n: t_hi,
            });
        }
        let t_lo = self.thrust(airspeed_ms, lo)?;
        if thrust_required_n < t_lo {
            return Err(PropError::BelowEnvelope {
                airspeed_ms,
                thrust_required_n,
                min_thrust_n: t_lo,
            });
        }

        if hi - lo <= GEOM_EPS * self.rpm_span() {
            let p = self.evaluate(airspeed_ms, lo)?;
            return Ok(ThrustSolution {
                rpm: lo,
                power_w: p.power_w,
                thrust_n: p.thrust_n,
            });
        }

        let root = brent(
            |rpm| Ok::<_, PropError>(self.thrust(airspeed_ms, rpm)? - thrust_required_n),
            lo,
            hi,
            &self.config.root,
        )?;
        trace!(rpm = root.root, residual = root.residual, iterations = root.iterations, "thrust inversion");
        if !root.converged {
            return Err(PropError::NonConvergence {
                iterations: root.iterations,
            });
        }

        let p = self.evaluate(airspeed_ms, root.root)?;
        Ok(ThrustSolution {
            rpm: root.root,
            power_w: p.power_w,
            thrust_n: p.thrust_n,
        })
    }

    fn admitted_rpm_range(&self, airspeed_ms: f64) -> PropResult<(f64, f64)> {
        ensure_finite(airspeed_ms, "airspeed")?;
        self.rpm_range_at(airspeed_ms)
            .ok_or(PropError::AirspeedOutOfEnvelope {
                airspeed_ms,
                min: self.domain.min_airspeed_ms,
                max: self.domain.max_airspeed_ms,
            })
    }

    fn airspeed_span(&self) -> f64 {
        self.domain.max_airspeed_ms - self.domain.min_airspeed_ms
    }

    fn rpm_span(&self) -> f64 {
        self.domain.max_rpm - self.domain.min_rpm
    }
}

fn normalize(domain: &Domain, airspeed_ms: f64, rpm: f64) -> Point {
    [
        (airspeed_ms - domain.min_airspeed_ms) / (domain.max_airspeed_ms - domain.min_airspeed_ms),
        (rpm - domain.min_rpm) / (domain.max_rpm - domain.min_rpm),
    ]
}

//! Bracketed scalar root finding.
//!
//! Brent's method: inverse quadratic interpolation with a bisection fallback,
//! so the bracket always shrinks and the iteration count is bounded.

use crate::error::CoreError;

/// Brent solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct BrentConfig {
    /// Maximum function evaluations after the two bracket endpoints
    pub max_iterations: usize,
    /// Relative tolerance on the root location
    pub x_rel_tol: f64,
    /// Absolute tolerance on the root location
    pub x_abs_tol: f64,
}

impl Default for BrentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            x_rel_tol: 1e-3,
            x_abs_tol: 1e-6,
        }
    }
}

/// Root-finding result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootSolution {
    /// Best estimate of the root
    pub root: f64,
    /// Function value at `root`
    pub residual: f64,
    /// Number of iterations taken
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Find a root of `f` inside `[lo, hi]`.
///
/// `f(lo)` and `f(hi)` must differ in sign (or one of them must be zero),
/// otherwise [`CoreError::NotBracketed`] is returned. Evaluation errors from
/// `f` are propagated unchanged.
///
/// Terminates when the bracket half-width falls below
/// `0.5 * max(x_abs_tol, x_rel_tol * |x|)` or after `max_iterations`, in which
/// case the best estimate is returned with `converged = false`.
pub fn brent<F, E>(mut f: F, lo: f64, hi: f64, config: &BrentConfig) -> Result<RootSolution, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<CoreError>,
{
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(CoreError::InvalidArg {
            what: "root bracket must be finite with lo < hi",
        }
        .into());
    }

    let mut a = lo;
    let mut b = hi;
    let mut fa = f(a)?;
    let mut fb = f(b)?;

    if fa == 0.0 {
        return Ok(RootSolution {
            root: a,
            residual: 0.0,
            iterations: 0,
            converged: true,
        });
    }
    if fb == 0.0 {
        return Ok(RootSolution {
            root: b,
            residual: 0.0,
            iterations: 0,
            converged: true,
        });
    }
    if fa.signum() == fb.signum() {
        return Err(CoreError::NotBracketed {
            lo,
            hi,
            f_lo: fa,
            f_hi: fb,
        }
        .into());
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iter in 1..=config.max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = config.x_abs_tol.max(config.x_rel_tol * b.abs());
        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol;
        let xm = 0.5 * (c - b);

        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(RootSolution {
                root: b,
                residual: fb,
                iterations: iter,
                converged: true,
            });
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant step
                (2.0 * xm * s, 1.0 - s)
            } else {
                // Inverse quadratic interpolation
                let q0 = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q0 * (q0 - r) - (b - a) * (r - 1.0)),
                    (q0 - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
        fb = f(b)?;
    }

    Ok(RootSolution {
        root: b,
        residual: fb,
        iterations: config.max_iterations,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight() -> BrentConfig {
        BrentConfig {
            max_iterations: 100,
            x_rel_tol: 1e-12,
            x_abs_tol: 1e-12,
        }
    }

    #[test]
    fn finds_sqrt_two() {
        let sol = brent(|x| Ok::<_, CoreError>(x * x - 2.0), 0.0, 2.0, &tight()).unwrap();
        assert!(sol.converged);
        assert!((sol.root - 2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn decreasing_function() {
        let sol = brent(|x| Ok::<_, CoreError>(1.0 - x.powi(3)), 0.0, 3.0, &tight()).unwrap();
        assert!((sol.root - 1.0).abs() < 1e-10);
    }

    #[test]
    fn endpoint_root_returns_immediately() {
        let sol = brent(|x| Ok::<_, CoreError>(x - 1.0), 1.0, 4.0, &tight()).unwrap();
        assert_eq!(sol.root, 1.0);
        assert_eq!(sol.iterations, 0);
    }

    #[test]
    fn rejects_unbracketed() {
        let err = brent(|x| Ok::<_, CoreError>(x * x + 1.0), -1.0, 1.0, &tight()).unwrap_err();
        assert!(matches!(err, CoreError::NotBracketed { .. }));
    }

    #[test]
    fn rejects_inverted_bracket() {
        let err = brent(|x| Ok::<_, CoreError>(x), 1.0, -1.0, &tight()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArg { .. }));
    }

    #[test]
    fn propagates_evaluation_error() {
        let err = brent(
            |x| {
                if x > 0.5 {
                    Err(CoreError::InvalidArg { what: "residual" })
                } else {
                    Ok(x - 0.75)
                }
            },
            0.0,
            1.0,
            &tight(),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::InvalidArg { what: "residual" });
    }

    #[test]
    fn relative_tolerance_controls_precision() {
        let cfg = BrentConfig::default();
        let target = 22_847.0;
        let sol = brent(|x| Ok::<_, CoreError>(x - target), 20_000.0, 25_000.0, &cfg).unwrap();
        assert!((sol.root - target).abs() <= 1e-3 * target);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let cfg = BrentConfig {
            max_iterations: 2,
            x_rel_tol: 0.0,
            x_abs_tol: 0.0,
        };
        let sol = brent(|x| Ok::<_, CoreError>(x.powi(3) - 0.3), 0.0, 10.0, &cfg).unwrap();
        assert!(!sol.converged);
        assert_eq!(sol.iterations, 2);
    }
}

use crate::CoreError;

/// Finite, any sign.
pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: f64, what: &'static str) -> Result<f64, CoreError> {
    ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    Ok(v)
}

/// Finite and strictly `> 0`.
pub fn ensure_positive(v: f64, what: &'static str) -> Result<f64, CoreError> {
    ensure_finite(v, what)?;
    if v <= 0.0 {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
        });
    }
    Ok(v)
}

/// Finite and inside the closed interval `[min, max]`.
pub fn ensure_in_range(v: f64, min: f64, max: f64, what: &'static str) -> Result<f64, CoreError> {
    ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Piecewise-linear lookup in a table of `(x, y)` anchors sorted by ascending `x`.
///
/// Queries outside the table are clamped to the end anchors; callers validate
/// the domain first when clamping is not acceptable.
pub fn interp_table(table: &[(f64, f64)], x: f64) -> f64 {
    let Some(&(x_first, y_first)) = table.first() else {
        return f64::NAN;
    };
    if x <= x_first {
        return y_first;
    }
    for pair in table.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            let span = x1 - x0;
            if span <= 0.0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / span;
        }
    }
    table[table.len() - 1].1
}

/// Under-relaxed update `old + factor * (new - old)`.
#[inline]
pub fn relax(old: f64, new: f64, factor: f64) -> f64 {
    old + factor * (new - old)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn range_guards() {
        assert!(ensure_positive(0.0, "r").is_err());
        assert!(ensure_non_negative(0.0, "r").is_ok());
        assert!(ensure_non_negative(-1e-9, "r").is_err());
        assert!(ensure_in_range(100.0, 0.0, 100.0, "soc").is_ok());
        assert!(matches!(
            ensure_in_range(100.5, 0.0, 100.0, "soc"),
            Err(CoreError::OutOfRange { what: "soc", .. })
        ));
    }

    #[test]
    fn table_lookup_interpolates_and_clamps() {
        let table = [(0.0, 3.0), (50.0, 3.8), (100.0, 4.2)];
        assert_eq!(interp_table(&table, 0.0), 3.0);
        assert!((interp_table(&table, 25.0) - 3.4).abs() < 1e-12);
        assert!((interp_table(&table, 75.0) - 4.0).abs() < 1e-12);
        assert_eq!(interp_table(&table, 150.0), 4.2);
        assert_eq!(interp_table(&table, -5.0), 3.0);
        assert!(interp_table(&[], 1.0).is_nan());
    }

    #[test]
    fn relax_blends() {
        assert_eq!(relax(10.0, 20.0, 1.0), 20.0);
        assert_eq!(relax(10.0, 20.0, 0.5), 15.0);
    }
}

//! Interpolation and finite differences on non-uniform time bases.

/// Linear interpolation of `(xp, fp)` at each `x`, clamped to the end values
/// outside `xp`. `xp` must be ascending.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return vec![f64::NAN; x.len()];
    }

    x.iter()
        .map(|&xi| {
            if xi <= xp[0] {
                return fp[0];
            }
            if xi >= xp[n - 1] {
                return fp[n - 1];
            }
            // First index with xp[i] > xi; 1 <= i < n here.
            let i = xp[..n].partition_point(|&v| v <= xi);
            let (x0, x1) = (xp[i - 1], xp[i]);
            let (f0, f1) = (fp[i - 1], fp[i]);
            if x1 == x0 {
                f0
            } else {
                f0 + (f1 - f0) * (xi - x0) / (x1 - x0)
            }
        })
        .collect()
}

/// dx/dt by second-order differences.
///
/// Interior points use central differences; the end points use second-order
/// one-sided stencils. Two samples fall back to a first-order difference and
/// fewer give zeros.
pub fn second_order_diff(x: &[f64], t: &[f64]) -> Vec<f64> {
    let n = x.len().min(t.len());
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        2 => {
            let d = (x[1] - x[0]) / (t[1] - t[0]);
            vec![d, d]
        }
        _ => {
            let mut d = vec![0.0; n];
            d[0] = (-3.0 * x[0] + 4.0 * x[1] - x[2]) / (t[2] - t[0]);
            d[n - 1] = (3.0 * x[n - 1] - 4.0 * x[n - 2] + x[n - 3]) / (t[n - 1] - t[n - 3]);
            for i in 1..n - 1 {
                d[i] = (x[i + 1] - x[i - 1]) / (t[i + 1] - t[i - 1]);
            }
            d
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interp_clamps_at_ends() {
        let y = interp(&[-1.0, 0.5, 5.0], &[0.0, 1.0, 2.0], &[10.0, 20.0, 40.0]);
        assert_eq!(y, vec![10.0, 15.0, 40.0]);
    }

    #[test]
    fn interp_hits_knots_exactly() {
        let y = interp(&[1.0, 1.5], &[0.0, 1.0, 2.0], &[10.0, 20.0, 40.0]);
        assert_eq!(y, vec![20.0, 30.0]);
    }

    #[test]
    fn quadratic_is_differentiated_exactly() {
        // x = t^2 on a uniform grid: every stencil is exact for quadratics.
        let t: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let x: Vec<f64> = t.iter().map(|t| t * t).collect();
        let d = second_order_diff(&x, &t);
        for (di, ti) in d.iter().zip(&t) {
            assert!((di - 2.0 * ti).abs() < 1e-12, "{} vs {}", di, 2.0 * ti);
        }
    }

    #[test]
    fn short_series() {
        assert_eq!(second_order_diff(&[1.0, 3.0], &[0.0, 0.5]), vec![4.0, 4.0]);
        assert_eq!(second_order_diff(&[1.0], &[0.0]), vec![0.0]);
        assert!(second_order_diff(&[], &[]).is_empty());
    }
}

use crate::scoring::SLOW_BELOW_SECS;

/// (response number, seconds) pairs for the results chart
pub fn latency_points(latencies: &[f64]) -> Vec<(f64, f64)> {
    latencies
        .iter()
        .enumerate()
        .map(|(i, &rt)| ((i + 1) as f64, rt))
        .collect()
}

/// Compute X (responses) and Y (seconds) upper bounds for the results chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let mut slowest = SLOW_BELOW_SECS;
    for &(_, rt) in points {
        if rt > slowest {
            slowest = rt;
        }
    }

    let count = match points.last() {
        Some(p) => p.0,
        None => 1.0,
    };

    (count.max(1.0), (slowest * 10.0).ceil() / 10.0)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 1.0);
        assert_eq!(y, 0.6);
    }

    #[test]
    fn test_compute_chart_params_slow_response() {
        let points = latency_points(&[0.2, 0.71, 0.3]);
        assert_eq!(points[1], (2.0, 0.71));
        let (x, y) = compute_chart_params(&points);
        assert_eq!(x, 3.0);
        assert_eq!(y, 0.8);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(0.8), "0.80");
    }
}

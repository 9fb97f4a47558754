//! Unit conversions shared across the aggregation core and the API layer.

/// Millimeters per inch, the conversion used for all rain accounting.
pub const MM_PER_IN: f64 = 25.4;

/// Meters-per-second to miles-per-hour factor for wind reporting.
pub const M_S_TO_MPH: f64 = 2.2369;

/// Converts degrees Celsius to degrees Fahrenheit.
pub fn c_to_f(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Converts a cumulative millimeter reading delta to inches.
pub fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_IN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_to_f_known_points() {
        assert!((c_to_f(0.0) - 32.0).abs() < 1e-9);
        assert!((c_to_f(100.0) - 212.0).abs() < 1e-9);
        assert!((c_to_f(-40.0) - (-40.0)).abs() < 1e-9);
    }

    #[test]
    fn test_mm_to_in() {
        assert!((mm_to_in(25.4) - 1.0).abs() < 1e-9);
        assert!((mm_to_in(12.7) - 0.5).abs() < 1e-9);
    }
}

//! Unit conversion helpers.
//!
//! Internally everything is SI: meters, m³/s, meters of head. Source files
//! and catalogs use liters per second and inches, so the boundaries convert.

/// One inch in meters.
pub const INCH_M: f64 = 0.0254;

/// Convert a diameter given in inches to meters.
pub fn inches_to_m(inches: f64) -> f64 {
    inches * INCH_M
}

/// Convert liters per second to m³/s.
pub fn lps_to_m3s(lps: f64) -> f64 {
    lps / 1000.0
}

/// Convert m³/s to liters per second.
pub fn m3s_to_lps(m3s: f64) -> f64 {
    m3s * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inch_conversion() {
        assert!((inches_to_m(12.0) - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_flow_conversion() {
        assert!((lps_to_m3s(250.0) - 0.25).abs() < 1e-12);
        assert!((m3s_to_lps(0.25) - 250.0).abs() < 1e-9);
    }
}

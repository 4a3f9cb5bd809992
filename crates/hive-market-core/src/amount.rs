//! Numeric policy for amounts typed into the market forms.
//!
//! Amounts travel as display strings. Every comparison goes through
//! [`parse_amount`], which never fails: malformed, negative or non-finite
//! input reads as `0`, and `0` is "below minimum" at the submit gate.

/// Parses a display amount, stripping `,` thousands separators.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) => sanitize(v),
        Err(_) => 0.0,
    }
}

/// Coerces values that must not reach the submit gate to `0`.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Shortest representation that round-trips, so `50.0` renders as `"50"`.
pub fn format_amount(value: f64) -> String {
    format!("{}", sanitize(value))
}

pub fn format_fixed3(value: f64) -> String {
    format!("{value:.3}")
}

/// Relative tolerance used when checking `to ~= from * rate`.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= scale * 1e-9
}

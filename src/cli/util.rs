pub fn fmt_money(v: f64) -> String {
    format!("{v:.2}")
}

/// Parses a user-typed amount; only finite positive numbers come back.
pub fn parse_amount(s: &str) -> Option<f64> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => None,
    }
}

pub fn parse_months(s: &str) -> Option<u32> {
    match s.trim().parse::<u32>() {
        Ok(v) if v > 0 => Some(v),
        _ => None,
    }
}

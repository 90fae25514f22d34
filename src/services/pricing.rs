//! Price estimates derived from the `production` block of a smeta.
//!
//! area = trunc(length) × trunc(width); base rate per m² times a foundation multiplier.
use serde::Serialize;
use serde_json::Value;

pub const BASE_PRICE_PER_M2: f64 = 15_000.0;
pub const VAT_DIVISOR: f64 = 1.2;

pub fn foundation_multiplier(foundation: &str) -> f64 {
    match foundation {
        "slab" => 1.2,
        "piles" => 1.1,
        "strip" => 1.15,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DetailedPrices {
    pub total_with_vat: i64,
    pub total_without_vat: i64,
    pub price_per_m2: i64,
}

/// Numbers or numeric strings; anything else is absent.
fn number(production: &Value, field: &str) -> Option<f64> {
    match production.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn whole_area(production: &Value) -> i64 {
    let length = number(production, "length").unwrap_or(0.0).trunc() as i64;
    let width = number(production, "width").unwrap_or(0.0).trunc() as i64;
    length.saturating_mul(width)
}

/// Rounded total for the list cards. Zero when dimensions are missing.
pub fn estimate(production: &Value) -> i64 {
    let area = whole_area(production);
    if area == 0 {
        return 0;
    }

    let foundation = production
        .get("foundation")
        .and_then(Value::as_str)
        .unwrap_or("none");

    (area as f64 * BASE_PRICE_PER_M2 * foundation_multiplier(foundation)).round() as i64
}

pub fn detailed(production: &Value) -> DetailedPrices {
    let area = whole_area(production);
    if area == 0 {
        return DetailedPrices::default();
    }

    let total = estimate(production);
    DetailedPrices {
        total_with_vat: total,
        total_without_vat: (total as f64 / VAT_DIVISOR).round() as i64,
        price_per_m2: (total as f64 / area as f64).round() as i64,
    }
}

/// Card caption: `"12×8м (96 м²)"`, or a placeholder when the area is zero.
pub fn parameters(production: &Value) -> String {
    let length = number(production, "length").unwrap_or(0.0);
    let width = number(production, "width").unwrap_or(0.0);
    let area = length * width;

    if area == 0.0 {
        return "Не указаны параметры".to_string();
    }

    format!(
        "{}×{}м ({} м²)",
        plain(length),
        plain(width),
        plain(area)
    )
}

fn plain(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn estimate_applies_foundation_multiplier() {
        let p = json!({"length": 10, "width": 10, "foundation": "slab"});
        assert_eq!(estimate(&p), 1_800_000);

        let p = json!({"length": 10, "width": 10, "foundation": "strip"});
        assert_eq!(estimate(&p), 1_725_000);

        let p = json!({"length": 10, "width": 10, "foundation": "unknown"});
        assert_eq!(estimate(&p), 1_500_000);
    }

    #[test]
    fn estimate_truncates_dimensions() {
        let p = json!({"length": 10.9, "width": "5.5", "foundation": "none"});
        assert_eq!(estimate(&p), 50 * 15_000);
    }

    #[test]
    fn missing_dimensions_price_zero() {
        assert_eq!(estimate(&json!({})), 0);
        assert_eq!(detailed(&json!({"length": 0.5, "width": 3})), DetailedPrices::default());
    }

    #[test]
    fn detailed_splits_vat_and_per_m2() {
        let p = json!({"length": 12, "width": 8, "foundation": "piles"});
        let d = detailed(&p);

        assert_eq!(d.total_with_vat, 1_584_000);
        assert_eq!(d.total_without_vat, 1_320_000);
        assert_eq!(d.price_per_m2, 16_500);
    }

    #[test]
    fn parameters_caption() {
        assert_eq!(
            parameters(&json!({"length": 12, "width": 8})),
            "12×8м (96 м²)"
        );
        assert_eq!(
            parameters(&json!({"length": 2.5, "width": 2})),
            "2.5×2м (5 м²)"
        );
        assert_eq!(parameters(&json!({})), "Не указаны параметры");
    }
}

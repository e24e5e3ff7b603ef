//! Product weight normalization to kilograms.
//!
//! Raw weights arrive as free text: `"1.6kg"`, `"590g"`, `"100ml"`, `"16oz"`,
//! multipacks such as `"12 x 100g"` and the odd `"77g ."`. Three stages turn
//! them into a kilogram literal:
//!
//! 1. [`expand_multiplication`]: `"3 x 200g"` → `"600g"`
//! 2. [`convert_units_to_kg`]: `"600g"` → `"0.6kg"`
//! 3. [`round_kg`]: `"0.45359...kg"` → `"0.454kg"`
//!
//! Each stage takes and returns `Option`: `None` is a missing weight and passes
//! straight through. The composition is idempotent on its own output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ounces per kilogram.
const OUNCES_PER_KG: f64 = 35.274;

/// Grams and millilitres per kilogram (millilitres assume water density).
const GRAMS_PER_KG: f64 = 1000.0;

static MULTIPACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*x\s*(\d+)\s*[A-Za-z]\s*$").expect("Invalid regex: multipack weight")
});

/// Drop a trailing bare `"."` (and the whitespace around it) from a weight.
///
/// `"77g ."` becomes `"77g"`. Values not ending in a period are unchanged.
pub fn strip_trailing_period(weight: Option<&str>) -> Option<String> {
    let weight = weight?;
    if weight.ends_with('.') {
        Some(weight.trim_end_matches('.').trim().to_string())
    } else {
        Some(weight.to_string())
    }
}

/// Stage 1: expand `<N> x <M><unit>` into the product `N*M` in grams.
pub fn expand_multiplication(weight: Option<&str>) -> Option<String> {
    let weight = weight?;
    let Some(caps) = MULTIPACK.captures(weight) else {
        return Some(weight.to_string());
    };

    let count: u64 = caps[1].parse().ok()?;
    let each: u64 = caps[2].parse().ok()?;
    Some(format!("{}g", count.checked_mul(each)?))
}

/// Stage 2: convert the trailing unit (`kg`, `g`, `ml`, `oz`) to kilograms.
///
/// The result always ends in `"kg"`. An unrecognized unit passes through
/// unchanged; a recognized unit with an unparsable amount becomes `None`.
pub fn convert_units_to_kg(weight: Option<&str>) -> Option<String> {
    let weight = weight?;
    let trimmed = weight.trim();

    let (amount, divisor) = if let Some(amount) = trimmed.strip_suffix("kg") {
        (amount, 1.0)
    } else if let Some(amount) = trimmed.strip_suffix("ml") {
        (amount, GRAMS_PER_KG)
    } else if let Some(amount) = trimmed.strip_suffix("oz") {
        (amount, OUNCES_PER_KG)
    } else if let Some(amount) = trimmed.strip_suffix('g') {
        (amount, GRAMS_PER_KG)
    } else {
        return Some(weight.to_string());
    };

    let value: f64 = amount.trim().parse().ok()?;
    Some(format!("{}kg", value / divisor))
}

/// Stage 3: round the kilogram amount to `decimals` places.
///
/// Anything without a parsable `"kg"` amount is rejected as `None`; this is
/// where weights with unrecognized units end up.
pub fn round_kg(weight: Option<&str>, decimals: u32) -> Option<String> {
    let value = strip_kg_suffix(weight)?;
    Some(format!("{}kg", crate::utils::round_to(value, decimals)))
}

/// Strip the `"kg"` suffix and parse the remaining amount.
pub fn strip_kg_suffix(weight: Option<&str>) -> Option<f64> {
    let amount = weight?.trim().strip_suffix("kg")?;
    let value: f64 = amount.trim().parse().ok()?;
    (!value.is_nan()).then_some(value)
}

/// Run all three stages over one weight.
pub fn normalize_weight(weight: Option<&str>, decimals: u32) -> Option<String> {
    let expanded = expand_multiplication(weight);
    let converted = convert_units_to_kg(expanded.as_deref());
    round_kg(converted.as_deref(), decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_trailing_period() {
        assert_eq!(strip_trailing_period(Some("77g .")).as_deref(), Some("77g"));
        assert_eq!(strip_trailing_period(Some("1.5kg")).as_deref(), Some("1.5kg"));
        assert_eq!(strip_trailing_period(None), None);
    }

    #[test]
    fn test_multiplication_stages() {
        let stage1 = expand_multiplication(Some("3 x 200g"));
        assert_eq!(stage1.as_deref(), Some("600g"));

        let stage2 = convert_units_to_kg(stage1.as_deref());
        assert_eq!(stage2.as_deref(), Some("0.6kg"));

        let stage3 = round_kg(stage2.as_deref(), 3);
        assert_eq!(stage3.as_deref(), Some("0.6kg"));
        assert_eq!(strip_kg_suffix(stage3.as_deref()), Some(0.6));
    }

    #[test]
    fn test_multipack_with_two_letter_unit_degrades() {
        // Only a single unit letter is recognized after the multiplier.
        assert_eq!(expand_multiplication(Some("2 x 100ml")).as_deref(), Some("2 x 100ml"));
        assert_eq!(convert_units_to_kg(Some("2 x 100ml")), None);
        assert_eq!(normalize_weight(Some("2 x 100ml"), 3), None);
    }

    #[test]
    fn test_ounces() {
        let stage2 = convert_units_to_kg(Some("16oz"));
        let kg = strip_kg_suffix(stage2.as_deref()).unwrap();
        assert!((kg - 0.4536).abs() < 1e-4);

        let stage3 = round_kg(stage2.as_deref(), 3);
        assert_eq!(stage3.as_deref(), Some("0.454kg"));
        assert_eq!(strip_kg_suffix(stage3.as_deref()), Some(0.454));
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(convert_units_to_kg(Some("1.6kg")).as_deref(), Some("1.6kg"));
        assert_eq!(convert_units_to_kg(Some("590g")).as_deref(), Some("0.59kg"));
        assert_eq!(convert_units_to_kg(Some("100ml")).as_deref(), Some("0.1kg"));
    }

    #[test]
    fn test_other_shapes_pass_through() {
        assert_eq!(expand_multiplication(Some("1.6kg")).as_deref(), Some("1.6kg"));
        assert_eq!(expand_multiplication(None), None);
        assert_eq!(convert_units_to_kg(Some("5 lbs")).as_deref(), Some("5 lbs"));
    }

    #[test]
    fn test_unrecognized_unit_rejected_at_rounding() {
        assert_eq!(normalize_weight(Some("5 lbs"), 3), None);
        assert_eq!(normalize_weight(Some("ZTDGUZVU"), 3), None);
    }

    #[test]
    fn test_bad_amount_degrades_to_missing() {
        assert_eq!(convert_units_to_kg(Some("heavyg")), None);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        for raw in ["3 x 200g", "16oz", "1.6kg", "590g", "100ml", "12 x 100g"] {
            let once = normalize_weight(Some(raw), 3);
            let twice = normalize_weight(once.as_deref(), 3);
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }
}

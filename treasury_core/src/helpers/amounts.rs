use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw token amounts arrive as decimal strings, occasionally as plain numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `raw / 10^decimals` in plain floating point. `None` for anything that is not a number.
pub fn scale_amount(raw: &str, decimals: u32) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(value / 10f64.powi(decimals as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_token_with_18_decimals() {
        let scaled = scale_amount("1000000000000000000", 18).unwrap();
        assert!((scaled - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_and_zero_decimals() {
        assert!((scale_amount("2500000000000000000", 18).unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(scale_amount("7", 0), Some(7.0));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert_eq!(scale_amount("", 18), None);
        assert_eq!(scale_amount("0xde0b6b3a7640000", 18), None);
        assert_eq!(scale_amount("inf", 18), None);
    }
}

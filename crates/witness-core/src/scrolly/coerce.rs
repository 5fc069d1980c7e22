//! JavaScript-compatible coercions. Scene configs are authored against the
//! semantics of `Number(x)` and `String(x)`, so the resolver reproduces them.

use serde_json::Value;

/// `Number(x)`. A missing value (`undefined`) is `NaN`.
pub fn to_number(value: Option<&Value>) -> f64 {
  match value {
    None => f64::NAN,
    Some(Value::Null) => 0.0,
    Some(Value::Bool(b)) => f64::from(u8::from(*b)),
    Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
    Some(Value::String(s)) => parse_numeric(s),
    Some(Value::Array(items)) => match items.as_slice() {
      [] => 0.0,
      [only] => to_number(Some(only)),
      _ => f64::NAN,
    },
    Some(Value::Object(_)) => f64::NAN,
  }
}

fn parse_numeric(s: &str) -> f64 {
  let trimmed = s.trim();
  if trimmed.is_empty() {
    return 0.0;
  }
  // Rust accepts "inf"/"nan" spellings that JavaScript does not.
  let lower = trimmed.to_ascii_lowercase();
  if lower.contains("inf") || lower.contains("nan") {
    return match trimmed {
      "Infinity" | "+Infinity" => f64::INFINITY,
      "-Infinity" => f64::NEG_INFINITY,
      _ => f64::NAN,
    };
  }
  trimmed.parse().unwrap_or(f64::NAN)
}

/// `String(x)`. A missing value is `"undefined"`.
pub fn to_js_string(value: Option<&Value>) -> String {
  match value {
    None => "undefined".to_owned(),
    Some(Value::Null) => "null".to_owned(),
    Some(Value::Bool(b)) => b.to_string(),
    Some(Value::Number(n)) => match n.as_f64() {
      // -0 prints as "0".
      Some(f) if f == 0.0 => "0".to_owned(),
      Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
      _ => n.to_string(),
    },
    Some(Value::String(s)) => s.clone(),
    Some(Value::Array(items)) => items
      .iter()
      .map(|v| match v {
        Value::Null => String::new(),
        other => to_js_string(Some(other)),
      })
      .collect::<Vec<_>>()
      .join(","),
    Some(Value::Object(_)) => "[object Object]".to_owned(),
  }
}

/// Largest integer an `f64` holds exactly (`Number.MAX_SAFE_INTEGER + 1`).
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// `value` with a number in one canonical form, so `1`, `1.0` and `-0`
/// versus `0` compare equal the way JavaScript numbers do.
pub fn canonical_number(value: &Value) -> Value {
  match value {
    Value::Number(n) => match n.as_f64() {
      Some(f) if f.fract() == 0.0 && f.abs() < EXACT_INTEGER_LIMIT => Value::from(f as i64),
      _ => value.clone(),
    },
    other => other.clone(),
  }
}

/// Strict equality (`===`) for JSON scalars; numbers compare by value.
pub fn js_equal(a: Option<&Value>, b: &Value) -> bool {
  match (a, b) {
    (Some(Value::Number(x)), Value::Number(y)) => x.as_f64() == y.as_f64(),
    (Some(x), y) => x == y,
    (None, _) => false,
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn number_coercion_matches_javascript() {
    assert_eq!(to_number(Some(&json!(null))), 0.0);
    assert_eq!(to_number(Some(&json!(true))), 1.0);
    assert_eq!(to_number(Some(&json!(" 42 "))), 42.0);
    assert_eq!(to_number(Some(&json!(""))), 0.0);
    assert_eq!(to_number(Some(&json!([7]))), 7.0);
    assert!(to_number(Some(&json!("forty"))).is_nan());
    assert!(to_number(Some(&json!("inf"))).is_nan());
    assert!(to_number(None).is_nan());
    assert!(to_number(Some(&json!({"a": 1}))).is_nan());
  }

  #[test]
  fn string_coercion_matches_javascript() {
    assert_eq!(to_js_string(Some(&json!(3.0))), "3");
    assert_eq!(to_js_string(Some(&json!(2.5))), "2.5");
    assert_eq!(to_js_string(Some(&json!(false))), "false");
    assert_eq!(to_js_string(Some(&json!([1, null, "a"]))), "1,,a");
    assert_eq!(to_js_string(None), "undefined");
    assert_eq!(to_js_string(Some(&json!(-0.0))), "0");
  }

  #[test]
  fn canonical_numbers_collapse_integer_forms() {
    assert_eq!(canonical_number(&json!(1.0)), canonical_number(&json!(1)));
    assert_eq!(canonical_number(&json!(-0.0)), json!(0));
    assert_eq!(canonical_number(&json!(2.5)), json!(2.5));
    assert_eq!(canonical_number(&json!("1")), json!("1"));
  }

  #[test]
  fn integer_and_float_numbers_are_equal() {
    assert!(js_equal(Some(&json!(1)), &json!(1.0)));
    assert!(!js_equal(Some(&json!("1")), &json!(1)));
    assert!(!js_equal(None, &json!(null)));
  }
}

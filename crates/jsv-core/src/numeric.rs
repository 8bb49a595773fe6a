//! # Numeric Helpers
//!
//! Comparison and divisibility over `serde_json::Number`.
//!
//! JSON numbers arrive as `i64`, `u64` or `f64`. Comparisons between two
//! integers are done exactly in `i128`; any float operand moves the
//! comparison to `f64`. `serde_json` never produces NaN or infinities, so
//! float comparisons are total in practice.

use std::cmp::Ordering;

use serde_json::Number;

/// Relative tolerance for float divisibility in `multipleOf`.
const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

/// Exact integer view of a number, if it has one.
fn as_i128(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        Some(i128::from(i))
    } else {
        n.as_u64().map(i128::from)
    }
}

/// Float view of a number. Every `serde_json::Number` has one.
fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

/// Returns true if the number has a zero fractional part.
pub fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    let f = as_f64(n);
    f.is_finite() && f.fract() == 0.0
}

/// Total order over JSON numbers by mathematical value.
pub fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (as_i128(a), as_i128(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => as_f64(a)
            .partial_cmp(&as_f64(b))
            .unwrap_or(Ordering::Equal),
    }
}

/// Returns true if `value / divisor` is an integer.
///
/// Integer operands use exact remainder arithmetic. Otherwise the quotient
/// is accepted when it lies within a relative tolerance of an integer, so
/// `0.3` is a multiple of `0.1`. A zero divisor is never satisfied.
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (as_i128(value), as_i128(divisor)) {
        return d != 0 && v % d == 0;
    }
    let d = as_f64(divisor);
    if d == 0.0 {
        return false;
    }
    let quotient = as_f64(value) / d;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= MULTIPLE_OF_TOLERANCE * quotient.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn num(v: serde_json::Value) -> Number {
        match v {
            serde_json::Value::Number(n) => n,
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn test_is_integral() {
        assert!(is_integral(&num(json!(4))));
        assert!(is_integral(&num(json!(u64::MAX))));
        assert!(is_integral(&num(json!(-2.0))));
        assert!(!is_integral(&num(json!(2.5))));
    }

    #[test]
    fn test_compare_mixed_representations() {
        assert_eq!(compare_numbers(&num(json!(1)), &num(json!(1.0))), Ordering::Equal);
        assert_eq!(compare_numbers(&num(json!(-1)), &num(json!(u64::MAX))), Ordering::Less);
        assert_eq!(compare_numbers(&num(json!(2.5)), &num(json!(2))), Ordering::Greater);
    }

    #[test]
    fn test_multiple_of_integers() {
        let fifteen = num(json!(15));
        assert!(is_multiple_of(&num(json!(0)), &fifteen));
        assert!(is_multiple_of(&num(json!(15)), &fifteen));
        assert!(is_multiple_of(&num(json!(30)), &fifteen));
        assert!(!is_multiple_of(&num(json!(14)), &fifteen));
    }

    #[test]
    fn test_multiple_of_floats_within_tolerance() {
        assert!(is_multiple_of(&num(json!(0.3)), &num(json!(0.1))));
        assert!(is_multiple_of(&num(json!(7.5)), &num(json!(2.5))));
        assert!(!is_multiple_of(&num(json!(0.35)), &num(json!(0.1))));
    }

    #[test]
    fn test_multiple_of_zero_divisor() {
        assert!(!is_multiple_of(&num(json!(10)), &num(json!(0))));
        assert!(!is_multiple_of(&num(json!(1.5)), &num(json!(0.0))));
    }
}

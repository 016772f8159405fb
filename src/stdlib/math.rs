use std::sync::Arc;

use crate::ast::{Definitions, Expression, Primitive};
use crate::interpreter::EvalError;
use crate::stdlib::{insert_primitive, integer_binary};
use crate::{t_boolean, t_fn, t_integer};

fn overflow(function: &str) -> EvalError {
    EvalError::DynamicKind {
        function: function.to_string(),
        expected: "a result that fits in 64 bits".to_string(),
        found: "an overflow".to_string(),
    }
}

fn division_by_zero(function: &str) -> EvalError {
    EvalError::DynamicKind {
        function: function.to_string(),
        expected: "a non-zero divisor".to_string(),
        found: "Integer 0".to_string(),
    }
}

/// Rounds the quotient towards negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// The result takes the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

pub fn add_math_functions(definitions: &mut Definitions) {
    let binary = t_fn!([t_integer!(), t_integer!()] -> t_integer!());
    let comparison = t_fn!([t_integer!(), t_integer!()] -> t_boolean!());

    // plus(a: Integer, b: Integer) -> Integer
    insert_primitive(
        definitions,
        "plus",
        binary.clone(),
        &["a", "b"],
        integer_binary("plus", |a, b| {
            a.checked_add(b)
                .map(Expression::integer)
                .ok_or_else(|| overflow("plus"))
        }),
    );

    // minus(a: Integer, b: Integer) -> Integer
    insert_primitive(
        definitions,
        "minus",
        binary.clone(),
        &["a", "b"],
        integer_binary("minus", |a, b| {
            a.checked_sub(b)
                .map(Expression::integer)
                .ok_or_else(|| overflow("minus"))
        }),
    );

    // multiply(a: Integer, b: Integer) -> Integer
    insert_primitive(
        definitions,
        "multiply",
        binary.clone(),
        &["a", "b"],
        integer_binary("multiply", |a, b| {
            a.checked_mul(b)
                .map(Expression::integer)
                .ok_or_else(|| overflow("multiply"))
        }),
    );

    // divide(numerator: Integer, denominator: Integer) -> Integer
    insert_primitive(
        definitions,
        "divide",
        binary.clone(),
        &["numerator", "denominator"],
        integer_binary("divide", |a, b| {
            if b == 0 {
                return Err(division_by_zero("divide"));
            }
            floor_div(a, b)
                .map(Expression::integer)
                .ok_or_else(|| overflow("divide"))
        }),
    );

    // modulo(numerator: Integer, denominator: Integer) -> Integer
    insert_primitive(
        definitions,
        "modulo",
        binary,
        &["numerator", "denominator"],
        integer_binary("modulo", |a, b| {
            if b == 0 {
                return Err(division_by_zero("modulo"));
            }
            floor_mod(a, b)
                .map(Expression::integer)
                .ok_or_else(|| overflow("modulo"))
        }),
    );

    // less(a: Integer, b: Integer) -> Boolean
    insert_primitive(
        definitions,
        "less",
        comparison.clone(),
        &["a", "b"],
        integer_binary("less", |a, b| Ok(Expression::boolean(a < b))),
    );

    // greater(a: Integer, b: Integer) -> Boolean
    insert_primitive(
        definitions,
        "greater",
        comparison.clone(),
        &["a", "b"],
        integer_binary("greater", |a, b| Ok(Expression::boolean(a > b))),
    );

    // equal(a: Integer, b: Integer) -> Boolean
    // Statically typed over integers, but at runtime any two values without
    // functions inside compare structurally.
    insert_primitive(
        definitions,
        "equal",
        comparison,
        &["a", "b"],
        Arc::new(|args: &[Expression]| {
            let [a, b] = args else {
                return Err(EvalError::Arity {
                    callee: "equal".to_string(),
                    expected: 2,
                    given: args.len(),
                });
            };
            for value in [a, b] {
                if !is_comparable(value) {
                    return Err(EvalError::kind("equal", "a comparable value", value));
                }
            }
            Ok(Expression::boolean(a == b))
        }),
    );
}

fn is_comparable(value: &Expression) -> bool {
    match value {
        Expression::Primitive(Primitive::Record(record)) => {
            record.fields.iter().all(|(_, field)| is_comparable(field))
        }
        Expression::Primitive(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_division_follows_the_divisor_sign() {
        assert_eq!(floor_div(7, 2), Some(3));
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_mod(-7, 2), Some(1));
        assert_eq!(floor_mod(7, -2), Some(-1));
        assert_eq!(floor_mod(29, 19), Some(10));
        assert_eq!(floor_div(i64::MIN, -1), None);
    }
}

pub mod io;
pub mod math;
pub mod string;


use std::sync::Arc;

use crate::ast::{Definition, Definitions, Expression, NativeFn, Primitive, TypeSignature};
use crate::interpreter::EvalError;

pub use io::Output;

/// The only conditional. Handled as a special form by both the checker and the
/// evaluator, so it has no entry in the definition table.
pub const IF_ELSE: &str = "ifElse";

/// Builds the table of builtins every program sees. `printLine` writes to `output`.
pub fn standard_library(output: Output) -> Definitions {
    let mut definitions = Definitions::new();
    math::add_math_functions(&mut definitions);
    string::add_string_functions(&mut definitions);
    io::add_io_functions(&mut definitions, output);
    definitions
}

pub fn insert_primitive(
    definitions: &mut Definitions,
    name: &str,
    type_sig: TypeSignature,
    parameters: &[&str],
    implementation: NativeFn,
) {
    definitions.insert(
        name.to_string(),
        Definition::PrimitiveFunction {
            type_sig,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            implementation,
        },
    );
}

pub fn expect_integer(function: &str, value: &Expression) -> Result<i64, EvalError> {
    match value {
        Expression::Primitive(Primitive::Integer(i)) => Ok(*i),
        other => Err(EvalError::kind(function, "an Integer", other)),
    }
}

pub fn expect_string<'v>(function: &str, value: &'v Expression) -> Result<&'v str, EvalError> {
    match value {
        Expression::Primitive(Primitive::String(s)) => Ok(s),
        other => Err(EvalError::kind(function, "a String", other)),
    }
}

/// Wraps a two-argument integer operation as a native implementation.
pub fn integer_binary<F>(name: &'static str, op: F) -> NativeFn
where
    F: Fn(i64, i64) -> Result<Expression, EvalError> + Send + Sync + 'static,
{
    Arc::new(move |args: &[Expression]| {
        let [a, b] = args else {
            return Err(EvalError::Arity {
                callee: name.to_string(),
                expected: 2,
                given: args.len(),
            });
        };
        op(expect_integer(name, a)?, expect_integer(name, b)?)
    })
}

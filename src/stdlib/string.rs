use std::sync::Arc;

use crate::ast::{Definitions, Expression};
use crate::interpreter::EvalError;
use crate::stdlib::{expect_integer, expect_string, insert_primitive};
use crate::{t_fn, t_integer, t_string};

pub fn add_string_functions(definitions: &mut Definitions) {
    // concat(a: String, b: String) -> String
    insert_primitive(
        definitions,
        "concat",
        t_fn!([t_string!(), t_string!()] -> t_string!()),
        &["a", "b"],
        Arc::new(|args: &[Expression]| {
            let [a, b] = args else {
                return Err(EvalError::Arity {
                    callee: "concat".to_string(),
                    expected: 2,
                    given: args.len(),
                });
            };
            let a = expect_string("concat", a)?;
            let b = expect_string("concat", b)?;
            Ok(Expression::string(format!("{a}{b}")))
        }),
    );

    // intToStr(number: Integer) -> String
    insert_primitive(
        definitions,
        "intToStr",
        t_fn!([t_integer!()] -> t_string!()),
        &["number"],
        Arc::new(|args: &[Expression]| {
            let [number] = args else {
                return Err(EvalError::Arity {
                    callee: "intToStr".to_string(),
                    expected: 1,
                    given: args.len(),
                });
            };
            Ok(Expression::string(
                expect_integer("intToStr", number)?.to_string(),
            ))
        }),
    );
}

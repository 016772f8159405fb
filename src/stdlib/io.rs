use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::ast::{Definitions, Expression};
use crate::interpreter::EvalError;
use crate::stdlib::{expect_string, insert_primitive};
use crate::{t_fn, t_none, t_string};

/// Where `printLine` writes to.
pub type Output = Arc<Mutex<dyn Write + Send>>;

pub fn stdout() -> Output {
    Arc::new(Mutex::new(std::io::stdout()))
}

/// For tables that are only type checked, never run.
pub fn discard() -> Output {
    Arc::new(Mutex::new(std::io::sink()))
}

pub fn add_io_functions(definitions: &mut Definitions, output: Output) {
    // printLine(message: String) -> None
    insert_primitive(
        definitions,
        "printLine",
        t_fn!([t_string!()] -> t_none!()),
        &["message"],
        Arc::new(move |args: &[Expression]| {
            let [message] = args else {
                return Err(EvalError::Arity {
                    callee: "printLine".to_string(),
                    expected: 1,
                    given: args.len(),
                });
            };
            let message = expect_string("printLine", message)?;
            let mut sink = output
                .lock()
                .map_err(|_| EvalError::Output("output sink is poisoned".to_string()))?;
            writeln!(sink, "{message}").map_err(|e| EvalError::Output(e.to_string()))?;
            Ok(Expression::none())
        }),
    );
}

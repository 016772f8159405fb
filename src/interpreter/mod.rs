pub mod environment;


use std::cmp::Ordering;
use std::panic;
use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use crate::ast::{Closure, Definition, Definitions, Expression, Primitive, Program, flatten};
use crate::stdlib::IF_ELSE;

pub use environment::Environment;

/// Default limit on nested evaluations. Evaluation always runs on a stack
/// sized from the limit, so running past it is `RecursionLimitExceeded` on
/// any caller thread rather than a stack overflow.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Stack reserved per level of nesting. A level is a few frames, several KiB
/// in debug builds.
const STACK_PER_LEVEL: usize = 16 * 1024;
const MIN_STACK: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unbound name `{0}`")]
    UnboundName(String),
    #[error("`{callee}` takes {expected} argument(s) but {given} were supplied")]
    Arity {
        callee: String,
        expected: usize,
        given: usize,
    },
    #[error("`{function}` expected {expected} but got {found}")]
    DynamicKind {
        function: String,
        expected: String,
        found: String,
    },
    #[error("`{0}` is not a function and cannot be applied")]
    NotAFunction(String),
    #[error("evaluation exceeded the maximum depth of {0} nested expressions")]
    RecursionLimitExceeded(usize),
    #[error("the program has no `main` definition")]
    MissingMain,
    #[error("`main` must be a constant whose expression is a call")]
    InvalidMain,
    #[error("failed to write output: {0}")]
    Output(String),
    #[error("could not reserve {size} bytes of stack for evaluation: {reason}")]
    Stack { size: usize, reason: String },
}

impl EvalError {
    pub fn kind(function: &str, expected: &str, found: &Expression) -> Self {
        EvalError::DynamicKind {
            function: function.to_string(),
            expected: expected.to_string(),
            found: kind_name(found),
        }
    }
}

/// Runtime kind of a value, as used in error messages.
pub fn kind_name(value: &Expression) -> String {
    match value {
        Expression::Primitive(Primitive::Integer(i)) => format!("Integer {i}"),
        Expression::Primitive(Primitive::String(s)) => format!("String {s:?}"),
        Expression::Primitive(Primitive::Boolean(b)) => format!("Boolean {b}"),
        Expression::Primitive(Primitive::None) => "None".to_string(),
        Expression::Primitive(Primitive::Record(record)) => record.type_name.clone(),
        Expression::Closure(_) | Expression::Function(_) => "a function".to_string(),
        Expression::Variable(_) | Expression::Call { .. } | Expression::Scope { .. } => {
            "an unevaluated expression".to_string()
        }
    }
}

/// The environment a program runs in: builtins at the bottom, the program's
/// own definitions layered on top so they shadow builtins of the same name.
pub fn base_environment(builtins: &Definitions, definitions: &Definitions) -> Environment {
    Environment::new()
        .extend(flatten(builtins))
        .extend(flatten(definitions))
}

pub fn evaluate(environment: &Environment, expression: &Expression) -> Result<Expression, EvalError> {
    Evaluator::default().evaluate(environment, expression)
}

pub fn apply(closure: &Arc<Closure>, arguments: Vec<Expression>) -> Result<Expression, EvalError> {
    Evaluator::default().apply(closure, arguments)
}

/// Evaluates `main` against the builtins plus the program's definitions.
pub fn interpret(
    program: &Program,
    builtins: &Definitions,
    max_depth: usize,
) -> Result<Expression, EvalError> {
    let Some(main) = program.definitions.get("main") else {
        return Err(EvalError::MissingMain);
    };
    let Definition::Constant {
        expression: expression @ Expression::Call { .. },
        ..
    } = main
    else {
        return Err(EvalError::InvalidMain);
    };

    let environment = base_environment(builtins, &program.definitions);
    let scope = match main.sub_definitions() {
        Some(locals) if !locals.is_empty() => environment.extend(flatten(locals)),
        _ => environment,
    };
    debug!(definitions = program.definitions.len(), "running main");
    Evaluator::new(max_depth).evaluate(&scope, expression)
}

#[derive(Debug)]
pub struct Evaluator {
    max_depth: usize,
    depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(DEFAULT_MAX_DEPTH)
    }
}

impl Evaluator {
    pub fn new(max_depth: usize) -> Self {
        Evaluator {
            max_depth,
            depth: 0,
        }
    }

    pub fn evaluate(
        &mut self,
        environment: &Environment,
        expression: &Expression,
    ) -> Result<Expression, EvalError> {
        self.on_own_stack(move |evaluator| evaluator.eval(environment, expression))
    }

    pub fn apply(
        &mut self,
        closure: &Arc<Closure>,
        arguments: Vec<Expression>,
    ) -> Result<Expression, EvalError> {
        self.on_own_stack(move |evaluator| evaluator.apply_closure(closure, arguments))
    }

    /// Runs `f` on a scoped thread whose stack holds `max_depth` levels.
    fn on_own_stack<F>(&mut self, f: F) -> Result<Expression, EvalError>
    where
        F: FnOnce(&mut Evaluator) -> Result<Expression, EvalError> + Send,
    {
        let size = self
            .max_depth
            .saturating_mul(STACK_PER_LEVEL)
            .max(MIN_STACK);
        thread::scope(move |scope| {
            let evaluator = thread::Builder::new()
                .name("evaluator".to_string())
                .stack_size(size)
                .spawn_scoped(scope, move || f(self))
                .map_err(|err| EvalError::Stack {
                    size,
                    reason: err.to_string(),
                })?;
            evaluator
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }

    fn eval(
        &mut self,
        environment: &Environment,
        expression: &Expression,
    ) -> Result<Expression, EvalError> {
        if self.depth >= self.max_depth {
            return Err(EvalError::RecursionLimitExceeded(self.max_depth));
        }
        self.depth += 1;
        let result = self.evaluate_inner(environment, expression);
        self.depth -= 1;
        result
    }

    fn evaluate_inner(
        &mut self,
        environment: &Environment,
        expression: &Expression,
    ) -> Result<Expression, EvalError> {
        match expression {
            Expression::Primitive(_) | Expression::Closure(_) => Ok(expression.clone()),
            Expression::Variable(name) => {
                let Some((bound, scope)) = resolve(environment, name) else {
                    return Err(EvalError::UnboundName(name.clone()));
                };
                if bound.is_normal_form() {
                    return Ok(bound.clone());
                }
                self.eval(&scope, bound)
            }
            Expression::Function(lambda) => Ok(Expression::Closure(Arc::new(Closure::Compound {
                parameters: lambda.parameters.clone(),
                environment: environment.clone(),
                locals: lambda.locals.clone(),
                body: lambda.body.clone(),
            }))),
            Expression::Scope { locals, body } => {
                self.eval(&environment.extend_shared(locals.clone()), body)
            }
            Expression::Call { operator, operands } => {
                if matches!(&**operator, Expression::Variable(name) if name == IF_ELSE) {
                    return self.evaluate_if_else(environment, operands);
                }

                let callee = self.eval(environment, operator)?;
                let Expression::Closure(closure) = callee else {
                    return Err(EvalError::NotAFunction(operator.to_string()));
                };
                let arguments = operands
                    .iter()
                    .map(|operand| self.eval(environment, operand))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply_closure(&closure, arguments)
            }
        }
    }

    /// Only the selected branch is evaluated.
    fn evaluate_if_else(
        &mut self,
        environment: &Environment,
        operands: &[Expression],
    ) -> Result<Expression, EvalError> {
        let [condition, then_branch, else_branch] = operands else {
            return Err(EvalError::Arity {
                callee: IF_ELSE.to_string(),
                expected: 3,
                given: operands.len(),
            });
        };
        match self.eval(environment, condition)? {
            Expression::Primitive(Primitive::Boolean(true)) => {
                self.eval(environment, then_branch)
            }
            Expression::Primitive(Primitive::Boolean(false)) => {
                self.eval(environment, else_branch)
            }
            other => Err(EvalError::kind(IF_ELSE, "a Boolean condition", &other)),
        }
    }

    fn apply_closure(
        &mut self,
        closure: &Arc<Closure>,
        arguments: Vec<Expression>,
    ) -> Result<Expression, EvalError> {
        let arity = closure.parameters().len();
        trace!(callee = %callee_name(closure), arity, given = arguments.len(), "apply");

        match arguments.len().cmp(&arity) {
            Ordering::Greater => Err(EvalError::Arity {
                callee: callee_name(closure),
                expected: arity,
                given: arguments.len(),
            }),
            Ordering::Less => Ok(Expression::Closure(Arc::new(partially_apply(
                closure, arguments,
            )))),
            Ordering::Equal => match &**closure {
                Closure::Primitive {
                    applied,
                    implementation,
                    ..
                } => {
                    if applied.is_empty() {
                        implementation(&arguments)
                    } else {
                        let mut all = applied.clone();
                        all.extend(arguments);
                        implementation(&all)
                    }
                }
                Closure::Compound {
                    parameters,
                    environment,
                    locals,
                    body,
                } => {
                    let scope = environment
                        .bind(parameters, &arguments)
                        .extend_shared(locals.clone());
                    self.eval(&scope, body)
                }
            },
        }
    }
}

/// Binds the leading parameters to `arguments` and keeps the rest open.
fn partially_apply(closure: &Closure, arguments: Vec<Expression>) -> Closure {
    let supplied = arguments.len();
    match closure {
        Closure::Compound {
            parameters,
            environment,
            locals,
            body,
        } => Closure::Compound {
            parameters: parameters[supplied..].to_vec(),
            environment: environment.bind(&parameters[..supplied], &arguments),
            locals: locals.clone(),
            body: body.clone(),
        },
        Closure::Primitive {
            name,
            parameters,
            applied,
            implementation,
        } => {
            let mut applied = applied.clone();
            applied.extend(arguments);
            Closure::Primitive {
                name: name.clone(),
                parameters: parameters[supplied..].to_vec(),
                applied,
                implementation: implementation.clone(),
            }
        }
    }
}

fn callee_name(closure: &Closure) -> String {
    match closure {
        Closure::Primitive { name, .. } => name.clone(),
        Closure::Compound { .. } => "<closure>".to_string(),
    }
}

/// Looks `name` up innermost first. A qualified `outer.inner` that is not
/// bound directly is searched for among the nested definitions of `outer`
/// when `outer` is a constant. Nested definitions of a function may use its
/// parameters, so they are only reachable from inside the function.
fn resolve<'e>(environment: &'e Environment, name: &str) -> Option<(&'e Expression, Environment)> {
    if let Some(found) = environment.lookup(name) {
        return Some(found);
    }
    let (outer, inner) = name.rsplit_once('.')?;
    let (container, scope) = resolve(environment, outer)?;
    let locals = match container {
        Expression::Scope { locals, .. } => locals,
        _ => return None,
    };
    let bound = locals.get(inner)?;
    Some((bound, scope.extend_shared(locals.clone())))
}

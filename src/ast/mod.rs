use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::interpreter::{Environment, EvalError};

#[cfg(test)]
pub mod test;

pub type Span = Range<usize>;

/// Definitions of one scope, keyed by their local name.
pub type Definitions = BTreeMap<String, Definition>;

/// Runtime view of a scope: definitions with their type annotations stripped.
pub type Bindings = BTreeMap<String, Expression>;

/// Union name -> names of the primitive types it stands for.
pub type TypeAliases = BTreeMap<String, BTreeSet<String>>;

pub type NativeFn = Arc<dyn Fn(&[Expression]) -> Result<Expression, EvalError> + Send + Sync>;

pub const INTEGER: &str = "Integer";
pub const STRING: &str = "String";
pub const BOOLEAN: &str = "Boolean";
pub const NONE: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Primitive(String),
    Function {
        params: Vec<TypeSignature>,
        return_type: Box<TypeSignature>,
    },
    Struct {
        fields: Vec<(String, TypeSignature)>,
    },
    Sum {
        options: Vec<TypeSignature>,
    },
}

impl TypeSignature {
    pub fn primitive(name: &str) -> Self {
        TypeSignature::Primitive(name.to_string())
    }

    pub fn function(params: Vec<TypeSignature>, return_type: TypeSignature) -> Self {
        TypeSignature::Function {
            params,
            return_type: Box::new(return_type),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Primitive(name) => write!(f, "{name}"),
            TypeSignature::Function {
                params,
                return_type,
            } => {
                let params = params
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({params} -> {return_type})")
            }
            TypeSignature::Struct { fields } => {
                write!(f, "struct")?;
                for (name, ty) in fields {
                    write!(f, " {name}:{ty}")?;
                }
                Ok(())
            }
            TypeSignature::Sum { options } => {
                let options = options
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "union {options}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Integer(i64),
    String(String),
    Boolean(bool),
    None,
    Record(Arc<Record>),
}

/// A struct value: the declaring struct's name plus its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<(String, Expression)>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Expression> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Primitive(Primitive),
    Variable(String),
    Call {
        operator: Box<Expression>,
        operands: Vec<Expression>,
    },
    /// A compound function that has not been captured into a closure yet.
    Function(Arc<Lambda>),
    /// A constant body evaluated with its nested definitions in scope.
    Scope {
        locals: Arc<Bindings>,
        body: Box<Expression>,
    },
    Closure(Arc<Closure>),
}

impl Expression {
    pub fn integer(value: i64) -> Self {
        Expression::Primitive(Primitive::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Primitive(Primitive::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Primitive(Primitive::Boolean(value))
    }

    pub fn none() -> Self {
        Expression::Primitive(Primitive::None)
    }

    pub fn variable(name: &str) -> Self {
        Expression::Variable(name.to_string())
    }

    pub fn call(operator: Expression, operands: Vec<Expression>) -> Self {
        Expression::Call {
            operator: Box::new(operator),
            operands,
        }
    }

    /// Primitives and closures; everything else still has to be evaluated.
    pub fn is_normal_form(&self) -> bool {
        matches!(self, Expression::Primitive(_) | Expression::Closure(_))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Primitive(Primitive::Integer(i)) => write!(f, "{i}"),
            Expression::Primitive(Primitive::String(s)) => write!(f, "{s:?}"),
            Expression::Primitive(Primitive::Boolean(b)) => write!(f, "{b}"),
            Expression::Primitive(Primitive::None) => write!(f, "none"),
            Expression::Primitive(Primitive::Record(record)) => {
                write!(f, "{} {{", record.type_name)?;
                for (i, (name, value)) in record.fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{name}: {value}")?;
                }
                write!(f, " }}")
            }
            Expression::Variable(name) => write!(f, "{name}"),
            Expression::Call { operator, operands } => {
                write!(f, "({operator}")?;
                for operand in operands {
                    write!(f, " {operand}")?;
                }
                write!(f, ")")
            }
            Expression::Function(lambda) => write!(f, "<function/{}>", lambda.parameters.len()),
            Expression::Scope { body, .. } => write!(f, "{body}"),
            Expression::Closure(closure) => match &**closure {
                Closure::Compound { parameters, .. } => {
                    write!(f, "<closure/{}>", parameters.len())
                }
                Closure::Primitive {
                    name, parameters, ..
                } => write!(f, "<builtin {name}/{}>", parameters.len()),
            },
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<String>,
    pub locals: Arc<Bindings>,
    pub body: Arc<Expression>,
}

pub enum Closure {
    Compound {
        parameters: Vec<String>,
        environment: Environment,
        locals: Arc<Bindings>,
        body: Arc<Expression>,
    },
    Primitive {
        name: String,
        parameters: Vec<String>,
        /// Arguments bound by earlier partial applications.
        applied: Vec<Expression>,
        implementation: NativeFn,
    },
}

impl Closure {
    pub fn parameters(&self) -> &[String] {
        match self {
            Closure::Compound { parameters, .. } | Closure::Primitive { parameters, .. } => {
                parameters
            }
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closure::Compound {
                parameters, body, ..
            } => f
                .debug_struct("Compound")
                .field("parameters", parameters)
                .field("body", body)
                .finish_non_exhaustive(),
            Closure::Primitive {
                name,
                parameters,
                applied,
                ..
            } => f
                .debug_struct("Primitive")
                .field("name", name)
                .field("parameters", parameters)
                .field("applied", applied)
                .finish_non_exhaustive(),
        }
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Closure::Compound {
                    parameters: p1,
                    environment: e1,
                    locals: l1,
                    body: b1,
                },
                Closure::Compound {
                    parameters: p2,
                    environment: e2,
                    locals: l2,
                    body: b2,
                },
            ) => p1 == p2 && e1.ptr_eq(e2) && l1 == l2 && b1 == b2,
            (
                Closure::Primitive {
                    name: n1,
                    parameters: p1,
                    applied: a1,
                    implementation: i1,
                },
                Closure::Primitive {
                    name: n2,
                    parameters: p2,
                    applied: a2,
                    implementation: i2,
                },
            ) => n1 == n2 && p1 == p2 && a1 == a2 && Arc::ptr_eq(i1, i2),
            _ => false,
        }
    }
}

#[derive(Clone)]
pub enum Definition {
    Constant {
        type_sig: TypeSignature,
        expression: Expression,
        sub_definitions: Definitions,
    },
    CompoundFunction {
        type_sig: TypeSignature,
        parameters: Vec<String>,
        body: Expression,
        sub_definitions: Definitions,
    },
    PrimitiveFunction {
        type_sig: TypeSignature,
        parameters: Vec<String>,
        implementation: NativeFn,
    },
}

impl Definition {
    pub fn type_sig(&self) -> &TypeSignature {
        match self {
            Definition::Constant { type_sig, .. }
            | Definition::CompoundFunction { type_sig, .. }
            | Definition::PrimitiveFunction { type_sig, .. } => type_sig,
        }
    }

    pub fn sub_definitions(&self) -> Option<&Definitions> {
        match self {
            Definition::Constant {
                sub_definitions, ..
            }
            | Definition::CompoundFunction {
                sub_definitions, ..
            } => Some(sub_definitions),
            Definition::PrimitiveFunction { .. } => None,
        }
    }

    /// Strips the type annotations, turning the definition into what the
    /// interpreter binds under `name`.
    pub fn to_expression(&self, name: &str) -> Expression {
        match self {
            Definition::Constant {
                expression,
                sub_definitions,
                ..
            } => {
                if sub_definitions.is_empty() {
                    expression.clone()
                } else {
                    Expression::Scope {
                        locals: Arc::new(flatten(sub_definitions)),
                        body: Box::new(expression.clone()),
                    }
                }
            }
            Definition::CompoundFunction {
                parameters,
                body,
                sub_definitions,
                ..
            } => Expression::Function(Arc::new(Lambda {
                parameters: parameters.clone(),
                locals: Arc::new(flatten(sub_definitions)),
                body: Arc::new(body.clone()),
            })),
            Definition::PrimitiveFunction {
                parameters,
                implementation,
                ..
            } => Expression::Closure(Arc::new(Closure::Primitive {
                name: name.to_string(),
                parameters: parameters.clone(),
                applied: vec![],
                implementation: implementation.clone(),
            })),
        }
    }
}

pub fn flatten(definitions: &Definitions) -> Bindings {
    definitions
        .iter()
        .map(|(name, definition)| (name.clone(), definition.to_expression(name)))
        .collect()
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Constant {
                type_sig,
                expression,
                sub_definitions,
            } => f
                .debug_struct("Constant")
                .field("type_sig", type_sig)
                .field("expression", expression)
                .field("sub_definitions", sub_definitions)
                .finish(),
            Definition::CompoundFunction {
                type_sig,
                parameters,
                body,
                sub_definitions,
            } => f
                .debug_struct("CompoundFunction")
                .field("type_sig", type_sig)
                .field("parameters", parameters)
                .field("body", body)
                .field("sub_definitions", sub_definitions)
                .finish(),
            Definition::PrimitiveFunction {
                type_sig,
                parameters,
                ..
            } => f
                .debug_struct("PrimitiveFunction")
                .field("type_sig", type_sig)
                .field("parameters", parameters)
                .finish_non_exhaustive(),
        }
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Definition::Constant {
                    type_sig: t1,
                    expression: e1,
                    sub_definitions: s1,
                },
                Definition::Constant {
                    type_sig: t2,
                    expression: e2,
                    sub_definitions: s2,
                },
            ) => t1 == t2 && e1 == e2 && s1 == s2,
            (
                Definition::CompoundFunction {
                    type_sig: t1,
                    parameters: p1,
                    body: b1,
                    sub_definitions: s1,
                },
                Definition::CompoundFunction {
                    type_sig: t2,
                    parameters: p2,
                    body: b2,
                    sub_definitions: s2,
                },
            ) => t1 == t2 && p1 == p2 && b1 == b2 && s1 == s2,
            (
                Definition::PrimitiveFunction {
                    type_sig: t1,
                    parameters: p1,
                    implementation: i1,
                },
                Definition::PrimitiveFunction {
                    type_sig: t2,
                    parameters: p2,
                    implementation: i2,
                },
            ) => t1 == t2 && p1 == p2 && Arc::ptr_eq(i1, i2),
            _ => false,
        }
    }
}

/// Everything the parser produces for one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub definitions: Definitions,
    pub type_aliases: TypeAliases,
    /// Declared struct and union types by name.
    pub types: BTreeMap<String, TypeSignature>,
}

#[macro_export]
macro_rules! t_prim {
    ($name:expr) => {
        $crate::ast::TypeSignature::primitive($name)
    };
}

#[macro_export]
macro_rules! t_integer {
    () => {
        $crate::t_prim!($crate::ast::INTEGER)
    };
}

#[macro_export]
macro_rules! t_string {
    () => {
        $crate::t_prim!($crate::ast::STRING)
    };
}

#[macro_export]
macro_rules! t_boolean {
    () => {
        $crate::t_prim!($crate::ast::BOOLEAN)
    };
}

#[macro_export]
macro_rules! t_none {
    () => {
        $crate::t_prim!($crate::ast::NONE)
    };
}

#[macro_export]
macro_rules! t_fn {
    ([$($param:expr),* $(,)?] -> $ret:expr) => {
        $crate::ast::TypeSignature::function(vec![$($param),*], $ret)
    };
}

pub mod definition;
pub mod expression;

#[cfg(test)]
pub mod test;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::ast::{Definition, Definitions, TypeAliases, TypeSignature};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("type error in `{definition}`: {kind}")]
pub struct TypeCheckError {
    /// Qualified name of the innermost definition being checked.
    pub definition: String,
    pub kind: TypeErrorKind,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeErrorKind {
    #[error("declared as {expected} but has type {found}")]
    Mismatch {
        expected: TypeSignature,
        found: TypeSignature,
    },
    #[error("`{callee}` takes {expected} argument(s) but {given} were supplied")]
    Arity {
        callee: String,
        expected: usize,
        given: usize,
    },
    #[error("argument {position} of `{callee}` should be {expected} but is {found}")]
    Argument {
        callee: String,
        position: usize,
        expected: TypeSignature,
        found: TypeSignature,
    },
    #[error("malformed function signature {0}")]
    MalformedSignature(TypeSignature),
    #[error("inconsistent number of parameters: the signature has {signature}, the definition {parameters}")]
    ParameterCount { signature: usize, parameters: usize },
    #[error("unknown name `{0}`")]
    UnknownName(String),
    #[error("`{callee}` has type {found} and cannot be applied")]
    NotAFunction { callee: String, found: TypeSignature },
    #[error("the condition of ifElse must be Boolean, found {0}")]
    Condition(TypeSignature),
    #[error("the branches of ifElse have different types: {then_type} and {else_type}")]
    BranchMismatch {
        then_type: TypeSignature,
        else_type: TypeSignature,
    },
    #[error("`{0}` cannot appear in source code")]
    Uncheckable(String),
}

/// What a name in scope stands for while checking.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Parameter(&'a TypeSignature),
    Definition(&'a Definition),
}

impl<'a> Entry<'a> {
    pub fn type_sig(self) -> &'a TypeSignature {
        match self {
            Entry::Parameter(type_sig) => type_sig,
            Entry::Definition(definition) => definition.type_sig(),
        }
    }
}

pub type Frame<'a> = BTreeMap<&'a str, Entry<'a>>;

#[derive(Debug)]
pub struct TypeEnv<'a> {
    pub type_aliases: &'a TypeAliases,
    scopes: Vec<Frame<'a>>,
}

/// Checks every definition of the table. `definitions` is expected to hold the
/// standard library as well, so that calls to builtins resolve.
pub fn check_types(
    definitions: &Definitions,
    type_aliases: &TypeAliases,
) -> Result<(), TypeCheckError> {
    let mut env = TypeEnv::new(type_aliases);
    env.push_definitions(definitions);
    for (name, definition) in definitions {
        env.check_definition(name, definition)?;
    }
    debug!(definitions = definitions.len(), "type check passed");
    Ok(())
}

impl<'a> TypeEnv<'a> {
    pub fn new(type_aliases: &'a TypeAliases) -> Self {
        TypeEnv {
            type_aliases,
            scopes: vec![],
        }
    }

    pub fn push_definitions(&mut self, definitions: &'a Definitions) {
        self.scopes.push(
            definitions
                .iter()
                .map(|(name, definition)| (name.as_str(), Entry::Definition(definition)))
                .collect(),
        );
    }

    /// Runs `f` with `frame` as the innermost scope.
    pub fn scoped<T>(
        &mut self,
        frame: Frame<'a>,
        f: impl FnOnce(&mut Self) -> Result<T, TypeCheckError>,
    ) -> Result<T, TypeCheckError> {
        self.scopes.push(frame);
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Innermost entry for `name`. A qualified `outer.inner` that is not in
    /// scope directly is looked up among the nested definitions of `outer`
    /// when `outer` is a constant. Those of a function may depend on its
    /// parameters and are not reachable from outside.
    pub fn lookup(&self, name: &str) -> Option<Entry<'a>> {
        if let Some(entry) = self.scopes.iter().rev().find_map(|frame| frame.get(name)) {
            return Some(*entry);
        }
        let (outer, inner) = name.rsplit_once('.')?;
        match self.lookup(outer)? {
            Entry::Definition(Definition::Constant {
                sub_definitions, ..
            }) => sub_definitions.get(inner).map(Entry::Definition),
            _ => None,
        }
    }

    pub fn same_type(&self, a: &TypeSignature, b: &TypeSignature) -> bool {
        same_type(self.type_aliases, a, b)
    }
}

/// Alias-aware type equality.
///
/// Each primitive name expands to the options of its union, or to itself. Two
/// singletons must be equal, a singleton must be one of the options of the
/// other side, and two proper unions must have exactly the same options.
pub fn same_type(type_aliases: &TypeAliases, a: &TypeSignature, b: &TypeSignature) -> bool {
    match (a, b) {
        (TypeSignature::Primitive(a), TypeSignature::Primitive(b)) => {
            let a = expand(type_aliases, a);
            let b = expand(type_aliases, b);
            match (a.len(), b.len()) {
                (1, 1) => a == b,
                (1, _) => a.is_subset(&b),
                (_, 1) => b.is_subset(&a),
                _ => a == b,
            }
        }
        (
            TypeSignature::Function {
                params: params_a,
                return_type: return_a,
            },
            TypeSignature::Function {
                params: params_b,
                return_type: return_b,
            },
        ) => {
            params_a.len() == params_b.len()
                && params_a
                    .iter()
                    .zip(params_b)
                    .all(|(a, b)| same_type(type_aliases, a, b))
                && same_type(type_aliases, return_a, return_b)
        }
        _ => a == b,
    }
}

fn expand<'t>(type_aliases: &'t TypeAliases, name: &'t str) -> BTreeSet<&'t str> {
    match type_aliases.get(name) {
        Some(options) => options.iter().map(String::as_str).collect(),
        None => BTreeSet::from([name]),
    }
}

use std::sync::Arc;

use crate::ast::{Bindings, Expression};

struct Frame {
    bindings: Arc<Bindings>,
    parent: Option<Arc<Frame>>,
}

/// A persistent chain of scopes. Extending never touches the frames below, so
/// an environment can be shared freely between closures and threads.
#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Arc<Frame>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn extend(&self, bindings: Bindings) -> Environment {
        self.extend_shared(Arc::new(bindings))
    }

    pub fn extend_shared(&self, bindings: Arc<Bindings>) -> Environment {
        if bindings.is_empty() {
            return self.clone();
        }
        Environment {
            head: Some(Arc::new(Frame {
                bindings,
                parent: self.head.clone(),
            })),
        }
    }

    /// Binds `parameters` to `arguments` pairwise in a new frame.
    pub fn bind(&self, parameters: &[String], arguments: &[Expression]) -> Environment {
        self.extend(
            parameters
                .iter()
                .cloned()
                .zip(arguments.iter().cloned())
                .collect(),
        )
    }

    /// Innermost binding of `name` together with the environment of the frame
    /// that holds it, which is where the bound expression has to be evaluated.
    pub fn lookup(&self, name: &str) -> Option<(&Expression, Environment)> {
        let mut frame = self.head.as_ref();
        while let Some(current) = frame {
            if let Some(expression) = current.bindings.get(name) {
                let scope = Environment {
                    head: Some(current.clone()),
                };
                return Some((expression, scope));
            }
            frame = current.parent.as_ref();
        }
        None
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.head.as_ref();
        while let Some(current) = frame {
            depth += 1;
            frame = current.parent.as_ref();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment(depth = {})", self.depth())
    }
}

use crate::ast::{Expression, Primitive, TypeSignature};
use crate::stdlib::IF_ELSE;
use crate::typechecker::{TypeEnv, TypeErrorKind};
use crate::{t_boolean, t_integer, t_none, t_prim, t_string};

impl TypeEnv<'_> {
    pub fn derive_type(&self, expression: &Expression) -> Result<TypeSignature, TypeErrorKind> {
        match expression {
            Expression::Primitive(Primitive::Integer(_)) => Ok(t_integer!()),
            Expression::Primitive(Primitive::String(_)) => Ok(t_string!()),
            Expression::Primitive(Primitive::Boolean(_)) => Ok(t_boolean!()),
            Expression::Primitive(Primitive::None) => Ok(t_none!()),
            Expression::Primitive(Primitive::Record(record)) => Ok(t_prim!(&record.type_name)),
            Expression::Variable(name) => self
                .lookup(name)
                .map(|entry| entry.type_sig().clone())
                .ok_or_else(|| TypeErrorKind::UnknownName(name.clone())),
            Expression::Call { operator, operands } => {
                if matches!(&**operator, Expression::Variable(name) if name == IF_ELSE) {
                    return self.derive_if_else(operands);
                }
                self.derive_call(operator, operands)
            }
            Expression::Function(_) | Expression::Scope { .. } | Expression::Closure(_) => {
                Err(TypeErrorKind::Uncheckable(expression.to_string()))
            }
        }
    }

    /// Calls have to supply every argument; partial application is only
    /// available at runtime.
    fn derive_call(
        &self,
        operator: &Expression,
        operands: &[Expression],
    ) -> Result<TypeSignature, TypeErrorKind> {
        let callee = operator.to_string();
        let (params, return_type) = match self.derive_type(operator)? {
            TypeSignature::Function {
                params,
                return_type,
            } => (params, return_type),
            found => return Err(TypeErrorKind::NotAFunction { callee, found }),
        };

        if params.len() != operands.len() {
            return Err(TypeErrorKind::Arity {
                callee,
                expected: params.len(),
                given: operands.len(),
            });
        }
        for (position, (param, operand)) in params.iter().zip(operands).enumerate() {
            let found = self.derive_type(operand)?;
            if !self.same_type(param, &found) {
                return Err(TypeErrorKind::Argument {
                    callee,
                    position: position + 1,
                    expected: param.clone(),
                    found,
                });
            }
        }
        Ok(*return_type)
    }

    fn derive_if_else(&self, operands: &[Expression]) -> Result<TypeSignature, TypeErrorKind> {
        let [condition, then_branch, else_branch] = operands else {
            return Err(TypeErrorKind::Arity {
                callee: IF_ELSE.to_string(),
                expected: 3,
                given: operands.len(),
            });
        };

        // Exactly Boolean; a union that merely contains it is not enough.
        let condition = self.derive_type(condition)?;
        if condition != t_boolean!() {
            return Err(TypeErrorKind::Condition(condition));
        }
        let then_type = self.derive_type(then_branch)?;
        let else_type = self.derive_type(else_branch)?;
        if !self.same_type(&then_type, &else_type) {
            return Err(TypeErrorKind::BranchMismatch {
                then_type,
                else_type,
            });
        }
        Ok(then_type)
    }
}

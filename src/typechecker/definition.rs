use tracing::debug;

use crate::ast::{Definition, Definitions, TypeSignature};
use crate::typechecker::{Entry, Frame, TypeCheckError, TypeEnv, TypeErrorKind};

impl<'a> TypeEnv<'a> {
    /// Checks one definition and everything nested in it. `path` is the
    /// qualified name used in error messages.
    pub fn check_definition(
        &mut self,
        path: &str,
        definition: &'a Definition,
    ) -> Result<(), TypeCheckError> {
        let at = |kind: TypeErrorKind| TypeCheckError {
            definition: path.to_string(),
            kind,
        };

        match definition {
            Definition::PrimitiveFunction { .. } => Ok(()),
            Definition::Constant {
                type_sig,
                expression,
                sub_definitions,
            } => {
                debug!(definition = path, "checking constant");
                self.scoped(nested_frame(sub_definitions), |env| {
                    env.check_nested(path, sub_definitions)?;
                    let found = env.derive_type(expression).map_err(at)?;
                    if !env.same_type(type_sig, &found) {
                        return Err(at(TypeErrorKind::Mismatch {
                            expected: type_sig.clone(),
                            found,
                        }));
                    }
                    Ok(())
                })
            }
            Definition::CompoundFunction {
                type_sig,
                parameters,
                body,
                sub_definitions,
            } => {
                debug!(definition = path, "checking function");
                let TypeSignature::Function {
                    params,
                    return_type,
                } = type_sig
                else {
                    return Err(at(TypeErrorKind::MalformedSignature(type_sig.clone())));
                };
                if params.len() != parameters.len() {
                    return Err(at(TypeErrorKind::ParameterCount {
                        signature: params.len(),
                        parameters: parameters.len(),
                    }));
                }

                let mut frame = nested_frame(sub_definitions);
                for (parameter, ty) in parameters.iter().zip(params) {
                    frame.insert(parameter.as_str(), Entry::Parameter(ty));
                }
                self.scoped(frame, |env| {
                    env.check_nested(path, sub_definitions)?;
                    let found = env.derive_type(body).map_err(at)?;
                    if !env.same_type(return_type, &found) {
                        return Err(at(TypeErrorKind::Mismatch {
                            expected: (**return_type).clone(),
                            found,
                        }));
                    }
                    Ok(())
                })
            }
        }
    }

    fn check_nested(
        &mut self,
        path: &str,
        sub_definitions: &'a Definitions,
    ) -> Result<(), TypeCheckError> {
        for (name, definition) in sub_definitions {
            self.check_definition(&format!("{path}.{name}"), definition)?;
        }
        Ok(())
    }
}

fn nested_frame(sub_definitions: &Definitions) -> Frame<'_> {
    sub_definitions
        .iter()
        .map(|(name, definition)| (name.as_str(), Entry::Definition(definition)))
        .collect()
}

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ast::{Definition, Expression, NativeFn, Primitive, Record, Span, TypeSignature};
use crate::interpreter::EvalError;
use crate::lexer::Token;
use crate::parser::{ParseError, Parser};

use ariadne::{Color, Fmt};
use tracing::debug;
use yansi::Paint;

fn declaration_syntax() -> String {
    format!(
        "\
        The syntax for type declarations is:
            Name {} {} field{}Type ...
            Name {} {} TypeA {} TypeB ...
        ",
        Fmt::fg(":=", Color::Yellow).bold(),
        Fmt::fg("struct", Color::Yellow).bold(),
        Fmt::fg(":", Color::Yellow).bold(),
        Fmt::fg(":=", Color::Yellow).bold(),
        Fmt::fg("union", Color::Yellow).bold(),
        Fmt::fg("|", Color::Yellow).bold(),
    )
}

impl Parser {
    /// `Name` has already been consumed. Returns the definitions the
    /// declaration generates (a constructor and accessors for structs,
    /// nothing for unions).
    pub fn parse_type_declaration(
        &mut self,
        name: &str,
        span: &Span,
    ) -> Result<Vec<(String, Definition)>, ParseError> {
        self.expect(Token::ColonEqual, "in a type declaration")?;
        if self.program.types.contains_key(name) {
            return Err(ParseError::duplicate(span.clone(), name));
        }

        match self.next_token("`struct` or `union`")? {
            (Token::KeywordStruct, keyword) => self.parse_struct(name, keyword),
            (Token::KeywordUnion, _) => {
                self.parse_union(name)?;
                Ok(vec![])
            }
            (token, span) => Err(ParseError::syntax(
                span,
                "unknown type declaration",
                format!(
                    "expected {} or {}, found {}",
                    Fmt::fg("struct", Color::Yellow).bold(),
                    Fmt::fg("union", Color::Yellow).bold(),
                    token.describe()
                ),
            )
            .with_note(declaration_syntax())),
        }
    }

    fn parse_struct(
        &mut self,
        name: &str,
        keyword: Span,
    ) -> Result<Vec<(String, Definition)>, ParseError> {
        let mut fields: Vec<(String, TypeSignature)> = vec![];
        while let Some(token) = self.peek() {
            if token.ends_expression() {
                break;
            }
            let (field, field_span) = self.expect_name("in a struct declaration")?;
            if fields.iter().any(|(existing, _)| *existing == field) {
                return Err(ParseError::duplicate(field_span, &field));
            }
            self.expect(Token::Colon, "after a field name")?;
            fields.push((field, self.parse_type()?));
        }

        if fields.is_empty() {
            return Err(ParseError::syntax(
                keyword,
                "empty struct",
                format!("{} declares no fields", Fmt::fg(name, Color::Blue).bold()),
            )
            .with_note(declaration_syntax()));
        }

        debug!(r#type = name, fields = fields.len(), "parsed struct");
        self.program.types.insert(
            name.to_string(),
            TypeSignature::Struct {
                fields: fields.clone(),
            },
        );

        let struct_type = TypeSignature::primitive(name);
        let mut definitions = vec![(
            name.to_string(),
            Definition::PrimitiveFunction {
                type_sig: TypeSignature::function(
                    fields.iter().map(|(_, ty)| ty.clone()).collect(),
                    struct_type.clone(),
                ),
                parameters: fields.iter().map(|(field, _)| field.clone()).collect(),
                implementation: constructor(name, &fields),
            },
        )];
        for (field, ty) in &fields {
            definitions.push((
                format!("{name}.{field}"),
                Definition::PrimitiveFunction {
                    type_sig: TypeSignature::function(vec![struct_type.clone()], ty.clone()),
                    parameters: vec!["value".to_string()],
                    implementation: accessor(name, field),
                },
            ));
        }
        Ok(definitions)
    }

    fn parse_union(&mut self, name: &str) -> Result<(), ParseError> {
        let mut options = BTreeSet::new();
        let mut ordered = vec![];
        loop {
            let (option, _) = self.expect_name("in a union declaration")?;
            if options.insert(option.clone()) {
                ordered.push(TypeSignature::Primitive(option));
            }
            match self.tokens.next_if(|(token, _)| !token.ends_expression()) {
                None => break,
                Some((Token::Union, _)) => {}
                Some((token, span)) => {
                    return Err(ParseError::syntax(
                        span,
                        "unexpected token in a union declaration",
                        format!("expected `|` or end of line, found {}", token.describe()),
                    )
                    .with_note(declaration_syntax()));
                }
            }
        }

        debug!(r#type = name, options = options.len(), "parsed union");
        self.program
            .types
            .insert(name.to_string(), TypeSignature::Sum { options: ordered });
        self.program.type_aliases.insert(name.to_string(), options);
        Ok(())
    }
}

fn constructor(name: &str, fields: &[(String, TypeSignature)]) -> NativeFn {
    let type_name = name.to_string();
    let field_names: Vec<String> = fields.iter().map(|(field, _)| field.clone()).collect();
    Arc::new(move |args: &[Expression]| {
        if args.len() != field_names.len() {
            return Err(EvalError::Arity {
                callee: type_name.clone(),
                expected: field_names.len(),
                given: args.len(),
            });
        }
        let record = Record {
            type_name: type_name.clone(),
            fields: field_names.iter().cloned().zip(args.iter().cloned()).collect(),
        };
        Ok(Expression::Primitive(Primitive::Record(Arc::new(record))))
    })
}

fn accessor(name: &str, field: &str) -> NativeFn {
    let type_name = name.to_string();
    let field = field.to_string();
    let qualified = format!("{name}.{field}");
    Arc::new(move |args: &[Expression]| {
        let [value] = args else {
            return Err(EvalError::Arity {
                callee: qualified.clone(),
                expected: 1,
                given: args.len(),
            });
        };
        match value {
            Expression::Primitive(Primitive::Record(record)) if record.type_name == type_name => {
                record
                    .field(&field)
                    .cloned()
                    .ok_or_else(|| EvalError::kind(&qualified, &format!("a {type_name}"), value))
            }
            other => Err(EvalError::kind(&qualified, &format!("a {type_name}"), other)),
        }
    })
}

use crate::ast::{Definition, Definitions, TypeSignature};
use crate::lexer::Token;
use crate::parser::{ParseError, Parser};

use ariadne::{Color, Fmt};
use yansi::Paint;
use tracing::debug;

pub fn definition_syntax() -> String {
    format!(
        "\
        The syntax for a definition is:
            name{}{} {}{}{} ... = expression
        ",
        Fmt::fg(":", Color::Yellow).bold(),
        Fmt::fg("ReturnType", Color::Rgb(205, 150, 100)).bold(),
        Fmt::fg("param", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg(":", Color::Yellow).bold(),
        Fmt::fg("Type", Color::Rgb(205, 150, 100)).bold(),
    )
}

pub fn type_syntax() -> String {
    format!(
        "\
        A type is either a name like {} or a function type like {}
        ",
        Fmt::fg("Integer", Color::Rgb(205, 150, 100)).bold(),
        Fmt::fg("(Integer, Boolean -> String)", Color::Rgb(205, 150, 100)).bold(),
    )
}

impl Parser {
    /// `name` has already been consumed; parses `: Type params... = expression`
    /// and a nested scope if one follows.
    pub fn parse_definition(&mut self, name: &str) -> Result<Definition, ParseError> {
        self.expect(Token::Colon, "after the defined name")?;
        let declared = self.parse_type()?;

        let mut parameters: Vec<String> = vec![];
        let mut parameter_types = vec![];
        loop {
            match self.tokens.peek() {
                Some((Token::Assign, _)) => break,
                Some((Token::Name(_), _)) => {
                    let (parameter, span) = self.expect_name("in the parameter list")?;
                    if parameters.contains(&parameter) {
                        return Err(ParseError::duplicate(span, &parameter));
                    }
                    self.expect(Token::Colon, "after a parameter name")?;
                    parameter_types.push(self.parse_type()?);
                    parameters.push(parameter);
                }
                Some((token, span)) => {
                    return Err(ParseError::syntax(
                        span.clone(),
                        format!("unexpected token in the definition of `{name}`"),
                        format!("expected a parameter or `=`, found {}", token.describe()),
                    )
                    .with_note(definition_syntax()));
                }
                None => {
                    return Err(ParseError::eof(
                        self.end.clone(),
                        format!("expected `=` in the definition of `{name}`"),
                    )
                    .with_note(definition_syntax()));
                }
            }
        }
        self.expect(Token::Assign, "before the definition body")?;

        let expression = self.parse_expression()?;
        if let Some((Token::RParen, span)) = self.tokens.peek() {
            return Err(ParseError::syntax(
                span.clone(),
                "unmatched closing parenthesis",
                "this `)` has no matching `(`",
            ));
        }

        self.skip_terminators();
        let sub_definitions = match self.tokens.peek() {
            Some((Token::ScopeOpen, span)) => {
                let open = span.clone();
                self.tokens.next();
                self.parse_scope(Some(open), &parameters)?
            }
            _ => Definitions::new(),
        };

        debug!(
            definition = name,
            parameters = parameters.len(),
            nested = sub_definitions.len(),
            "parsed definition"
        );

        if parameters.is_empty() {
            Ok(Definition::Constant {
                type_sig: declared,
                expression,
                sub_definitions,
            })
        } else {
            Ok(Definition::CompoundFunction {
                type_sig: TypeSignature::function(parameter_types, declared),
                parameters,
                body: expression,
                sub_definitions,
            })
        }
    }

    /// `Name` or `(T1, T2 -> R)`, where every `T` may itself be a function type.
    pub fn parse_type(&mut self) -> Result<TypeSignature, ParseError> {
        match self.next_token("a type")? {
            (Token::Name(name), _) => Ok(TypeSignature::Primitive(name)),
            (Token::LParen, open) => {
                let mut params = vec![];
                if !matches!(self.peek(), Some(Token::Arrow)) {
                    params.push(self.parse_type()?);
                    while let Some(Token::Comma) = self.peek() {
                        self.tokens.next();
                        params.push(self.parse_type()?);
                    }
                }

                match self.tokens.next() {
                    Some((Token::Arrow, _)) => {}
                    Some((token, span)) => {
                        return Err(ParseError::syntax(
                            span,
                            "missing `->` in function type",
                            format!("expected `,` or `->`, found {}", token.describe()),
                        )
                        .with_note(type_syntax()));
                    }
                    None => {
                        return Err(ParseError::eof(open, "this function type is never finished")
                            .with_note(type_syntax()));
                    }
                }

                let return_type = self.parse_type()?;
                match self.tokens.next() {
                    Some((Token::RParen, _)) => Ok(TypeSignature::function(params, return_type)),
                    Some((token, span)) => Err(ParseError::syntax(
                        span,
                        "unclosed function type",
                        format!("expected `)`, found {}", token.describe()),
                    )
                    .with_note(type_syntax())),
                    None => Err(ParseError::eof(open, "unclosed function type. expected `)`")
                        .with_note(type_syntax())),
                }
            }
            (token, span) => Err(ParseError::syntax(
                span,
                "expected a type",
                format!("found {} where a type was expected", token.describe()),
            )
            .with_note(type_syntax())),
        }
    }
}

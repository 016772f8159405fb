pub mod definition;
pub mod expression;
pub mod struct_;


use crate::ast::{Definition, Definitions, Expression, Program, Span};
use crate::lexer::Token;

use ariadne::{Color, ColorGenerator, Fmt, Label, Report, ReportKind};
use yansi::Paint;
use tracing::debug;

use std::iter::Peekable;
use std::vec::IntoIter;

type TokenIter = Peekable<IntoIter<(Token, Span)>>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: &'static str,
    pub message: String,
    pub label: String,
    pub span: Span,
    pub note: Option<String>,
}

impl ParseError {
    pub fn syntax(span: Span, message: impl Into<String>, label: impl Into<String>) -> Self {
        ParseError {
            code: "Syntax Error",
            message: message.into(),
            label: label.into(),
            span,
            note: None,
        }
    }

    pub fn eof(span: Span, label: impl Into<String>) -> Self {
        ParseError {
            code: "EOF",
            message: "reached end of file while parsing".to_string(),
            label: label.into(),
            span,
            note: None,
        }
    }

    pub fn duplicate(span: Span, name: &str) -> Self {
        ParseError {
            code: "Duplicate",
            message: format!("`{name}` is defined more than once in the same scope"),
            label: format!(
                "{} is already defined here",
                Fmt::fg(name, Color::Blue).bold()
            ),
            span,
            note: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }

    pub fn report(&self, file: &str) -> Report<'static, (String, Span)> {
        let mut report = Report::build(ReportKind::Error, (file.to_string(), self.span.clone()))
            .with_code(self.code)
            .with_label(
                Label::new((file.to_string(), self.span.clone()))
                    .with_message(&self.label)
                    .with_color(ColorGenerator::new().next()),
            )
            .with_message(&self.message);
        if let Some(note) = &self.note {
            report = report.with_note(note);
        }
        report.finish()
    }
}

pub struct Parser {
    tokens: TokenIter,
    end: Span,
    program: Program,
}

/// Parses a whole program: definitions, structs and unions.
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}

/// Parses a single expression, allowing trailing statement terminators.
pub fn parse_expression(tokens: Vec<(Token, Span)>) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(tokens);
    let expression = parser.parse_expression()?;
    parser.skip_terminators();
    match parser.tokens.next() {
        None => Ok(expression),
        Some((token, span)) => Err(ParseError::syntax(
            span,
            "unexpected token after the expression",
            format!("found {} here", token.describe()),
        )),
    }
}

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>) -> Self {
        let end = tokens
            .last()
            .map(|(_, span)| span.end..span.end)
            .unwrap_or(0..0);
        Parser {
            tokens: tokens.into_iter().peekable(),
            end,
            program: Program::default(),
        }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let definitions = self.parse_scope(None, &[])?;
        self.program.definitions = definitions;
        debug!(
            definitions = self.program.definitions.len(),
            types = self.program.types.len(),
            "parsed program"
        );
        Ok(self.program)
    }

    /// Parses definitions until the end of input, or until the `}` matching
    /// `opening` for a nested scope. `reserved` holds names the scope may not
    /// redefine, i.e. the parameters of the enclosing function.
    pub fn parse_scope(
        &mut self,
        opening: Option<Span>,
        reserved: &[String],
    ) -> Result<Definitions, ParseError> {
        let mut definitions = Definitions::new();
        loop {
            self.skip_terminators();
            let Some((token, span)) = self.tokens.next() else {
                return match opening {
                    Some(open) => Err(ParseError::eof(
                        open,
                        "this nested scope is never closed",
                    )),
                    None => Ok(definitions),
                };
            };

            match token {
                Token::ScopeClose if opening.is_some() => return Ok(definitions),
                Token::Name(name) => match self.tokens.peek() {
                    Some((Token::Colon, _)) => {
                        let definition = self.parse_definition(&name)?;
                        insert_unique(&mut definitions, reserved, name, span, definition)?;
                    }
                    Some((Token::ColonEqual, _)) if opening.is_none() => {
                        for (name, definition) in self.parse_type_declaration(&name, &span)? {
                            insert_unique(&mut definitions, reserved, name, span.clone(), definition)?;
                        }
                    }
                    Some((Token::ColonEqual, op_span)) => {
                        return Err(ParseError::syntax(
                            op_span.clone(),
                            "struct and union declarations are only allowed at the top level",
                            format!(
                                "move {} out of the nested scope",
                                Fmt::fg(&name, Color::Blue).bold()
                            ),
                        ));
                    }
                    Some((other, other_span)) => {
                        return Err(ParseError::syntax(
                            other_span.clone(),
                            "expected a declaration",
                            format!(
                                "expected `:` or `:=` after {}, found {}",
                                Fmt::fg(&name, Color::Blue).bold(),
                                other.describe()
                            ),
                        )
                        .with_note(definition::definition_syntax()));
                    }
                    None => {
                        return Err(ParseError::eof(
                            span,
                            "expected `:` or `:=` after this name",
                        )
                        .with_note(definition::definition_syntax()));
                    }
                },
                other => {
                    return Err(ParseError::syntax(
                        span,
                        "unexpected token while parsing definitions",
                        format!("expected a definition, found {}", other.describe()),
                    )
                    .with_note(definition::definition_syntax()));
                }
            }
        }
    }

    pub fn skip_terminators(&mut self) {
        while let Some((Token::Semicolon, _)) = self.tokens.peek() {
            self.tokens.next();
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|(token, _)| token)
    }

    fn next_token(&mut self, expected: &str) -> Result<(Token, Span), ParseError> {
        self.tokens
            .next()
            .ok_or_else(|| ParseError::eof(self.end.clone(), format!("expected {expected}")))
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<Span, ParseError> {
        let (token, span) = self.next_token(&expected.describe())?;
        if token == expected {
            Ok(span)
        } else {
            Err(ParseError::syntax(
                span,
                format!("unexpected token {context}"),
                format!(
                    "expected {}, found {}",
                    Fmt::fg(expected.describe(), Color::Yellow).bold(),
                    Fmt::fg(token.describe(), Color::Red).bold()
                ),
            ))
        }
    }

    fn expect_name(&mut self, context: &str) -> Result<(String, Span), ParseError> {
        match self.next_token("a name")? {
            (Token::Name(name), span) => Ok((name, span)),
            (token, span) => Err(ParseError::syntax(
                span,
                format!("unexpected token {context}"),
                format!(
                    "expected a name, found {}",
                    Fmt::fg(token.describe(), Color::Red).bold()
                ),
            )),
        }
    }
}

fn insert_unique(
    definitions: &mut Definitions,
    reserved: &[String],
    name: String,
    span: Span,
    definition: Definition,
) -> Result<(), ParseError> {
    if definitions.contains_key(&name) || reserved.contains(&name) {
        return Err(ParseError::duplicate(span, &name));
    }
    definitions.insert(name, definition);
    Ok(())
}

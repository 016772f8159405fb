use crate::ast::{Expression, Span};
use crate::lexer::Token;
use crate::parser::{ParseError, Parser};

use ariadne::{Color, Fmt};
use yansi::Paint;

fn application_syntax() -> String {
    format!(
        "the syntax for applying a function is '{} argument1 argument2 ...', use {} to group",
        Fmt::fg("function", Color::Blue).bold(),
        Fmt::fg("( )", Color::Yellow).bold(),
    )
}

impl Parser {
    /// Prefix application: the first atom is the operator when more atoms
    /// follow before a terminator.
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let (head, head_span) = self.parse_atom()?;

        let mut operands = vec![];
        while let Some(token) = self.peek() {
            if token.ends_expression() {
                break;
            }
            operands.push(self.parse_atom()?.0);
        }

        if operands.is_empty() {
            return Ok(head);
        }
        if let Expression::Primitive(_) = head {
            return Err(ParseError::syntax(
                head_span,
                "a literal cannot be applied",
                format!(
                    "{} is followed by {} operand(s)",
                    Fmt::fg(&head, Color::Red).bold(),
                    operands.len()
                ),
            )
            .with_note(application_syntax()));
        }
        Ok(Expression::call(head, operands))
    }

    fn parse_atom(&mut self) -> Result<(Expression, Span), ParseError> {
        let (token, span) = self.next_token("an expression")?;
        let expression = match token {
            Token::Int(i) => Expression::integer(i),
            Token::String(s) => Expression::string(s),
            Token::Bool(b) => Expression::boolean(b),
            Token::NoneLiteral => Expression::none(),
            Token::Name(name) => Expression::Variable(name),
            Token::LParen => {
                let inner = self.parse_expression()?;
                match self.tokens.next() {
                    Some((Token::RParen, close)) => return Ok((inner, span.start..close.end)),
                    Some((other, other_span)) => {
                        return Err(ParseError::syntax(
                            other_span,
                            "unclosed parenthesis",
                            format!("expected `)`, found {}", other.describe()),
                        ));
                    }
                    None => {
                        return Err(ParseError::eof(
                            span,
                            "unclosed parenthesis. expected `)` but reached end of file",
                        ));
                    }
                }
            }
            other => {
                return Err(ParseError::syntax(
                    span,
                    "unexpected token while parsing expressions",
                    format!("expected an expression, found {}", other.describe()),
                )
                .with_note(application_syntax()));
            }
        };
        Ok((expression, span))
    }
}

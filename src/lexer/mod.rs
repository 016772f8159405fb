use logos::Logos;

use crate::ast::Span;


#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \n\r\t\f]+")] // Ignore this regex pattern between tokens
#[logos(skip r"#[^\n]*")] // Comments run to the end of the line
#[derive(Clone)]
pub enum Token {
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1]) // strip the quotes
    })]
    String(String),

    #[token("none")]
    NoneLiteral,

    // Dots are part of names so that `Point.x` and `outer.inner` lex as one name.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.]*", |lex| lex.slice().to_string())]
    #[regex(r"[-+*/%<>]", |lex| lex.slice().to_string())]
    #[token("==", |lex| lex.slice().to_string())]
    Name(String),

    #[token("struct")]
    KeywordStruct,

    #[token("union")]
    KeywordUnion,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(":=")]
    ColonEqual,

    #[token("->")]
    Arrow,

    #[token("=")]
    Assign,

    #[token(";")]
    Semicolon,

    #[token("{")]
    ScopeOpen,

    #[token("}")]
    ScopeClose,

    #[token("|")]
    Union,
}

impl Token {
    /// Tokens that end an application chain.
    pub fn ends_expression(&self) -> bool {
        matches!(
            self,
            Token::Semicolon | Token::RParen | Token::ScopeOpen | Token::ScopeClose
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Token::Bool(b) => format!("boolean `{b}`"),
            Token::Int(i) => format!("integer `{i}`"),
            Token::String(s) => format!("string {s:?}"),
            Token::NoneLiteral => "`none`".to_string(),
            Token::Name(name) => format!("name `{name}`"),
            Token::KeywordStruct => "`struct`".to_string(),
            Token::KeywordUnion => "`union`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::ColonEqual => "`:=`".to_string(),
            Token::Arrow => "`->`".to_string(),
            Token::Assign => "`=`".to_string(),
            Token::Semicolon => "end of statement".to_string(),
            Token::ScopeOpen => "start of a nested scope".to_string(),
            Token::ScopeClose => "end of a nested scope".to_string(),
            Token::Union => "`|`".to_string(),
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            // unknown escapes are kept verbatim
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unrecognized input `{slice}` at byte {}", .span.start)]
pub struct LexError {
    pub slice: String,
    pub span: Span,
}

/// Lexes the whole input up front; the first unrecognized token aborts.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut tokens = vec![];
    for (token, span) in Token::lexer(source).spanned() {
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(LexError {
                    slice: source[span.clone()].to_string(),
                    span,
                });
            }
        }
    }
    Ok(tokens)
}

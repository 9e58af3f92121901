use logos::Logos;

use crate::ast::{Condition, Register};

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip(r";[^\n]*", allow_greedy = true))]
pub enum Token {
    // Mnemonics
    #[token("mov")]
    Mov,
    #[token("inc")]
    Inc,
    #[token("dec")]
    Dec,
    #[token("cmp")]
    Cmp,
    #[token("jmp", |_| Condition::Always)]
    #[token("je", |_| Condition::Equal)]
    #[token("jne", |_| Condition::NotEqual)]
    #[token("jl", |_| Condition::Less)]
    #[token("jle", |_| Condition::LessOrEqual)]
    #[token("jg", |_| Condition::Greater)]
    #[token("jge", |_| Condition::GreaterOrEqual)]
    Jump(Condition),

    #[token("ax", |_| Register::Ax)]
    #[token("bx", |_| Register::Bx)]
    #[token("cx", |_| Register::Cx)]
    #[token("dx", |_| Register::Dx)]
    Register(Register),

    // Punctuation
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    // Labels, and anything else word-shaped the parser will reject with context
    #[regex(r"[A-Za-z_.][A-Za-z0-9_.]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Statement terminator
    #[token("\n")]
    Newline,
}

impl Token {
    /// Human-readable name used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Mov => "'mov'".into(),
            Token::Inc => "'inc'".into(),
            Token::Dec => "'dec'".into(),
            Token::Cmp => "'cmp'".into(),
            Token::Jump(c) => format!("'{}'", c.mnemonic()),
            Token::Register(r) => format!("register '{r}'"),
            Token::Colon => "':'".into(),
            Token::Comma => "','".into(),
            Token::Int(n) => format!("integer {n}"),
            Token::Ident(name) => format!("'{name}'"),
            Token::Newline => "end of line".into(),
        }
    }
}

/// Lex assembly source into a stream of tokens with positions.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                let snippet = &source[span.clone()];
                return Err(LexError {
                    code: lex_error_code(snippet),
                    position: span.start,
                    snippet: snippet.to_string(),
                    suggestion: suggest_fix(snippet),
                });
            }
        }
    }

    Ok(tokens)
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn lex_error_code(bad_token: &str) -> &'static str {
    if is_integer_literal(bad_token) { "QA-L002" } else { "QA-L001" }
}

fn suggest_fix(bad_token: &str) -> String {
    if is_integer_literal(bad_token) {
        return format!(
            "Integer literal '{}' does not fit in 64 bits (range {}..={})",
            bad_token,
            i64::MIN,
            i64::MAX
        );
    }
    match bad_token.chars().next() {
        Some('#') => "Comments start with ';'".to_string(),
        Some('$' | '%') => "Registers are written without a sigil, e.g. 'ax'".to_string(),
        _ => format!(
            "Unexpected character(s): '{}'. Expected a mnemonic, register, integer or label.",
            bad_token
        ),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Lex error at position {position}: '{snippet}'. {suggestion}")]
pub struct LexError {
    pub code: &'static str,
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}

//! Line-oriented assembly parser.
//!
//! Every statement is fed straight into a [`ProgramBuilder`], so the parser
//! shares the builder's semantics: labels bind to the index of the next
//! instruction, redeclaring a label rebinds it, and jump targets are not
//! checked here.

use crate::ast::*;
use crate::builder::ProgramBuilder;
use crate::lexer::Token;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    builder: ProgramBuilder,
    spans: Vec<Span>,
}

#[derive(Debug, thiserror::Error)]
#[error("Parse error at token {position}: {message}")]
pub struct ParseError {
    pub code: &'static str,
    pub position: usize,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

type Result<T> = std::result::Result<T, ParseError>;

/// A parsed program plus the source span of every instruction, by index.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProgram {
    pub program: Program,
    pub spans: Vec<Span>,
}

impl ParsedProgram {
    pub fn span_of(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }
}

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0, builder: ProgramBuilder::new(), spans: Vec::new() }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, s)) => *s,
            None => self
                .tokens
                .last()
                .map(|(_, s)| Span { start: s.end, end: s.end })
                .unwrap_or(Span::UNKNOWN),
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Newline))
    }

    fn error(&self, code: &'static str, message: String) -> ParseError {
        ParseError { code, position: self.pos, span: self.peek_span(), message, hint: None }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(Token::Newline) | None => {
                self.error("QA-P004", format!("expected {expected}, got end of line"))
            }
            Some(tok) => self.error("QA-P003", format!("expected {expected}, got {}", tok.describe())),
        }
    }

    fn expect_comma(&mut self) -> Result<()> {
        match self.peek() {
            Some(Token::Comma) => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected("','")),
        }
    }

    fn expect_register(&mut self) -> Result<Register> {
        match self.peek() {
            Some(Token::Register(r)) => {
                let r = *r;
                self.advance();
                Ok(r)
            }
            Some(Token::Int(n)) => {
                let mut err = self.error(
                    "QA-P002",
                    format!("expected a destination register, got integer {n}"),
                );
                err.hint = Some("only ax, bx, cx and dx can be written to".into());
                Err(err)
            }
            Some(Token::Ident(name)) => {
                let mut err = self.error("QA-P005", format!("invalid operand '{name}'"));
                err.hint = closest_register(name).map(|r| format!("did you mean '{r}'?"));
                Err(err)
            }
            _ => Err(self.unexpected("a register")),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.peek() {
            Some(Token::Register(r)) => {
                let r = *r;
                self.advance();
                Ok(Operand::Register(r))
            }
            Some(Token::Int(n)) => {
                let n = *n;
                self.advance();
                Ok(Operand::Literal(n))
            }
            Some(Token::Ident(name)) => {
                let mut err = self.error("QA-P005", format!("invalid operand '{name}'"));
                err.hint = Some(match closest_register(name) {
                    Some(r) => format!("did you mean '{r}'?"),
                    None => "operands are integer literals or one of ax, bx, cx, dx".into(),
                });
                Err(err)
            }
            _ => Err(self.unexpected("an operand")),
        }
    }

    /// Optional `, operand` after `inc`/`dec`; defaults to 1.
    fn parse_step(&mut self) -> Result<Operand> {
        if matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            self.parse_operand()
        } else {
            Ok(Operand::Literal(1))
        }
    }

    fn parse_target(&mut self) -> Result<JumpTarget> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(JumpTarget::Label(name))
            }
            Some(Token::Int(n)) if n >= 0 => {
                self.advance();
                Ok(JumpTarget::Index(n as usize))
            }
            Some(Token::Int(n)) => Err(self.error(
                "QA-P006",
                format!("jump target must be a label or a non-negative index, got {n}"),
            )),
            Some(Token::Register(r)) => {
                let mut err = self.error("QA-P006", format!("cannot jump to register '{r}'"));
                err.hint = Some("jump targets are labels or instruction indices".into());
                Err(err)
            }
            _ => Err(self.unexpected("a label or instruction index")),
        }
    }

    fn parse_instruction(&mut self) -> Result<()> {
        let start = self.peek_span();
        let Some(head) = self.advance() else {
            return Ok(());
        };
        match head {
            Token::Mov => {
                let dst = self.expect_register()?;
                self.expect_comma()?;
                let src = self.parse_operand()?;
                self.builder.assign(dst, src);
            }
            Token::Inc => {
                let dst = self.expect_register()?;
                let by = self.parse_step()?;
                self.builder.increment_by(dst, by);
            }
            Token::Dec => {
                let dst = self.expect_register()?;
                let by = self.parse_step()?;
                self.builder.decrement_by(dst, by);
            }
            Token::Cmp => {
                let a = self.parse_operand()?;
                self.expect_comma()?;
                let b = self.parse_operand()?;
                self.builder.compare(a, b);
            }
            Token::Jump(condition) => {
                let target = self.parse_target()?;
                self.builder.jump_when(condition, target);
            }
            Token::Ident(name) => {
                self.pos -= 1;
                let mut err = self.error("QA-P001", format!("unknown mnemonic '{name}'"));
                let lower = name.to_lowercase();
                if lower != name && is_mnemonic(&lower) {
                    err.hint = Some(format!("mnemonics are lowercase: '{lower}'"));
                } else {
                    err.hint = Some(
                        "expected one of mov, inc, dec, cmp, jmp, je, jne, jl, jle, jg, jge".into(),
                    );
                }
                return Err(err);
            }
            other => {
                self.pos -= 1;
                return Err(self.error(
                    "QA-P001",
                    format!("expected an instruction or label, got {}", other.describe()),
                ));
            }
        }
        let end = self.tokens[self.pos - 1].1;
        self.spans.push(start.merge(end));
        Ok(())
    }

    /// `{label:} [instruction]` up to and including the newline.
    fn parse_line(&mut self) -> Result<()> {
        while let (Some(Token::Ident(name)), Some((Token::Colon, _))) =
            (self.peek().cloned(), self.tokens.get(self.pos + 1))
        {
            self.builder.label(name);
            self.pos += 2;
        }
        if !self.at_line_end() {
            self.parse_instruction()?;
        }
        match self.peek() {
            None => Ok(()),
            Some(Token::Newline) => {
                self.advance();
                Ok(())
            }
            Some(tok) => Err(self.error(
                "QA-P007",
                format!("expected end of line after instruction, got {}", tok.describe()),
            )),
        }
    }

    pub fn parse_program(mut self) -> Result<ParsedProgram> {
        while self.peek().is_some() {
            self.parse_line()?;
        }
        tracing::debug!(
            instructions = self.builder.len(),
            labels = self.builder.labels().len(),
            "parsed program"
        );
        Ok(ParsedProgram { program: self.builder.into_program(), spans: self.spans })
    }
}

/// A register one edit away from `name`, e.g. `ex` or `AX`.
fn closest_register(name: &str) -> Option<Register> {
    let lower = name.to_lowercase();
    if let Some(r) = Register::from_name(&lower) {
        return Some(r);
    }
    if lower.len() != 2 {
        return None;
    }
    Register::ALL.into_iter().find(|r| {
        r.name().chars().zip(lower.chars()).filter(|(a, b)| a != b).count() == 1
    })
}

/// Parse a token stream into a program and its instruction spans.
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<ParsedProgram> {
    Parser::new(tokens).parse_program()
}

/// Lex and parse assembly source.
pub fn parse_source(source: &str) -> std::result::Result<ParsedProgram, SourceError> {
    let tokens = crate::lexer::lex(source)?
        .into_iter()
        .map(|(t, range)| (t, Span::from(range)))
        .collect();
    Ok(parse(tokens)?)
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Lex(#[from] crate::lexer::LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Register::*;
    use pretty_assertions::assert_eq;

    fn parse_str(source: &str) -> Program {
        parse_source(source).unwrap().program
    }

    fn parse_err(source: &str) -> ParseError {
        match parse_source(source) {
            Err(SourceError::Parse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn parse_counting_loop() {
        let source = "\
; count to five
    mov cx, 0
    mov ax, 0
loop:
    inc ax
    inc cx, 1
    cmp cx, 5
    jl loop
";
        let expected = Program::compile(|b| {
            b.assign(Cx, 0)
                .assign(Ax, 0)
                .label("loop")
                .increment(Ax)
                .increment_by(Cx, 1)
                .compare(Cx, 5)
                .jump_if_less("loop");
        });
        assert_eq!(parse_str(source), expected);
    }

    #[test]
    fn parse_every_jump_mnemonic() {
        let program = parse_str("jmp a\nje a\njne a\njl a\njle a\njg a\njge 3\n");
        let conditions: Vec<Condition> = program
            .instructions
            .iter()
            .map(|i| match i {
                Instruction::Jump { condition, .. } => *condition,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(conditions, Condition::ALL.to_vec());
        assert_eq!(
            program.instructions[6],
            Instruction::Jump { condition: Condition::GreaterOrEqual, target: JumpTarget::Index(3) }
        );
    }

    #[test]
    fn parse_label_sharing_line() {
        let program = parse_str("start: mov ax, bx\nend:");
        assert_eq!(program.labels["start"], 0);
        assert_eq!(program.labels["end"], 1);
        assert_eq!(program.instructions.len(), 1);
    }

    #[test]
    fn parse_stacked_labels() {
        let program = parse_str("a: b:\nc: dec dx, -2");
        assert_eq!(program.labels.len(), 3);
        assert!(program.labels.values().all(|&i| i == 0));
        assert_eq!(program.instructions[0], Instruction::Decrement { dst: Dx, by: Operand::Literal(-2) });
    }

    #[test]
    fn parse_records_instruction_spans() {
        let parsed = parse_source("mov ax, 1\n  cmp ax, 2\n").unwrap();
        assert_eq!(parsed.spans, vec![Span { start: 0, end: 9 }, Span { start: 12, end: 21 }]);
        assert_eq!(parsed.span_of(1), Some(Span { start: 12, end: 21 }));
        assert_eq!(parsed.span_of(2), None);
    }

    #[test]
    fn parse_blank_and_comment_lines() {
        let program = parse_str("\n\n; nothing\n   \n");
        assert!(program.is_empty());
    }

    #[test]
    fn error_unknown_operand() {
        let e = parse_err("mov ax, ex");
        assert_eq!(e.code, "QA-P005");
        assert_eq!(e.span, Span { start: 8, end: 10 });
        assert_eq!(e.hint.as_deref(), Some("did you mean 'ax'?"));
    }

    #[test]
    fn error_literal_destination() {
        let e = parse_err("mov 5, ax");
        assert_eq!(e.code, "QA-P002");
    }

    #[test]
    fn error_missing_comma() {
        let e = parse_err("cmp ax 5");
        assert_eq!(e.code, "QA-P003");
        assert!(e.message.contains("','"), "{}", e.message);
    }

    #[test]
    fn error_truncated_line() {
        let e = parse_err("mov ax,\n");
        assert_eq!(e.code, "QA-P004");
    }

    #[test]
    fn error_uppercase_mnemonic() {
        let e = parse_err("MOV ax, 1");
        assert_eq!(e.code, "QA-P001");
        assert_eq!(e.hint.as_deref(), Some("mnemonics are lowercase: 'mov'"));
    }

    #[test]
    fn error_negative_jump_index() {
        let e = parse_err("jmp -1");
        assert_eq!(e.code, "QA-P006");
    }

    #[test]
    fn error_trailing_tokens() {
        let e = parse_err("inc ax, 1, 2");
        assert_eq!(e.code, "QA-P007");
    }

    #[test]
    fn lex_error_passes_through() {
        assert!(matches!(parse_source("mov ax, @"), Err(SourceError::Lex(_))));
    }
}

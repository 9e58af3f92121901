pub mod ansi;
pub mod json;
pub mod registry;

use crate::ast::Span;

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// An error report: message, optional code and location, and follow-up hints.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for error types ----

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        let span = Span {
            start: e.position,
            end: e.position + e.snippet.len().max(1),
        };
        let mut d = Diagnostic::error(format!("unexpected token '{}'", e.snippet))
            .with_code(e.code)
            .with_span(span, "here");
        if !e.suggestion.is_empty() {
            d = d.with_suggestion(e.suggestion.clone());
        }
        d
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        let mut d = Diagnostic::error(&e.message).with_code(e.code).with_span(e.span, "here");
        if let Some(hint) = &e.hint {
            d = d.with_suggestion(hint.clone());
        }
        d
    }
}

impl From<&crate::parser::SourceError> for Diagnostic {
    fn from(e: &crate::parser::SourceError) -> Self {
        match e {
            crate::parser::SourceError::Lex(e) => e.into(),
            crate::parser::SourceError::Parse(e) => e.into(),
        }
    }
}

impl From<&crate::verify::VerifyError> for Diagnostic {
    fn from(e: &crate::verify::VerifyError) -> Self {
        let mut d = Diagnostic::error(format!("jump to undefined label '{}'", e.label))
            .with_code(e.code)
            .with_note(format!("at instruction {}", e.index));
        if let Some(hint) = &e.hint {
            d = d.with_suggestion(hint.clone());
        }
        d
    }
}

impl From<&crate::ast::InvalidLabel> for Diagnostic {
    fn from(e: &crate::ast::InvalidLabel) -> Self {
        Diagnostic::error(format!("label {:?} cannot be written as assembly", e.name))
            .with_code("QA-F001")
            .with_suggestion("rename it to an identifier that is not a register or mnemonic")
    }
}

impl From<&crate::vm::VmError> for Diagnostic {
    fn from(e: &crate::vm::VmError) -> Self {
        use crate::vm::VmError;
        match e {
            VmError::UnknownLabel { name, at } => {
                Diagnostic::error(format!("unknown label '{name}'"))
                    .with_code("QA-R001")
                    .with_note(format!("jump at instruction {at} was taken"))
            }
            VmError::InvalidOperand(inner) => {
                Diagnostic::error(inner.to_string()).with_code("QA-R002")
            }
            VmError::StepLimitExceeded { limit } => {
                Diagnostic::error(format!("program did not halt within {limit} steps"))
                    .with_code("QA-R003")
                    .with_suggestion("raise --max-steps, or check the program for an infinite loop")
            }
        }
    }
}

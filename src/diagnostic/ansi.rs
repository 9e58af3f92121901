use crate::ast::SourceMap;
use super::Diagnostic;

pub struct AnsiRenderer {
    pub use_color: bool,
    /// Shown after `-->` when present, e.g. the source file path.
    pub origin: Option<String>,
}

impl AnsiRenderer {
    pub fn new(use_color: bool) -> Self {
        AnsiRenderer { use_color, origin: None }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    fn paint(&self, codes: &str, s: &str) -> String {
        if self.use_color { format!("\x1b[{codes}m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    fn bold_red(&self, s: &str) -> String {
        self.paint("1;31", s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[QA-P005]: message"
        let head = match d.code {
            Some(code) => format!("error[{code}]"),
            None => "error".to_string(),
        };
        out.push_str(&format!("{}: {}\n", self.bold_red(&head), self.bold(&d.message)));

        if let (Some(label), Some(source)) = (d.labels.first(), &d.source) {
            let map = SourceMap::new(source);
            let (line, col) = map.lookup(label.span.start);
            let line_text = map.line_text(source, line);

            let location = match &self.origin {
                Some(origin) => format!("{origin}:{line}:{col}"),
                None => format!("{line}:{col}"),
            };
            out.push_str(&format!("  {} {}\n", self.cyan("-->"), location));

            let gutter = line.to_string().len();
            let pipe = self.cyan("|");
            let pad = " ".repeat(gutter);

            out.push_str(&format!("{pad} {pipe}\n"));
            let line_num = self.cyan(&format!("{line:>gutter$}"));
            out.push_str(&format!("{line_num} {pipe} {line_text}\n"));

            // Carets stop at the end of the line for spans that run past it.
            let start_in_line = col.saturating_sub(1);
            let room = line_text.len().saturating_sub(start_in_line).max(1);
            let span_len = label.span.end.saturating_sub(label.span.start).clamp(1, room);
            let carets = self.bold_red(&"^".repeat(span_len));
            let indent = " ".repeat(start_in_line);
            if label.message.is_empty() {
                out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
            } else {
                out.push_str(&format!("{pad} {pipe} {indent}{carets} {}\n", self.bold_red(&label.message)));
            }
            out.push_str(&format!("{pad} {pipe}\n"));
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }

        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} help: {}\n", self.dim("="), suggestion));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    const SOURCE: &str = "mov ax, 1\ncmp ax, ex\njl top";

    fn make_diag() -> Diagnostic {
        Diagnostic::error("invalid operand 'ex'")
            .with_code("QA-P005")
            .with_span(Span { start: 18, end: 20 }, "here")
            .with_source(SOURCE)
            .with_note("operands are literals or registers")
            .with_suggestion("did you mean 'ax'?")
    }

    fn plain() -> AnsiRenderer {
        AnsiRenderer::new(false)
    }

    #[test]
    fn render_header_includes_code() {
        let out = plain().render(&make_diag());
        assert!(out.starts_with("error[QA-P005]: invalid operand 'ex'\n"), "got:\n{out}");
    }

    #[test]
    fn render_contains_location_and_line() {
        let out = plain().render(&make_diag());
        assert!(out.contains("--> 2:9"), "missing location in:\n{out}");
        assert!(out.contains("2 | cmp ax, ex"), "missing source line in:\n{out}");
    }

    #[test]
    fn render_origin_prefixes_location() {
        let out = plain().with_origin("count.asm").render(&make_diag());
        assert!(out.contains("--> count.asm:2:9"), "got:\n{out}");
    }

    #[test]
    fn caret_length_matches_span() {
        let out = plain().render(&make_diag());
        assert!(out.contains("  |         ^^ here"), "got:\n{out}");
    }

    #[test]
    fn carets_clamped_to_line() {
        let d = Diagnostic::error("bad")
            .with_span(Span { start: 0, end: 40 }, "")
            .with_source(SOURCE);
        let out = plain().render(&d);
        assert!(out.contains(&"^".repeat(9)));
        assert!(!out.contains(&"^".repeat(10)), "got:\n{out}");
    }

    #[test]
    fn render_contains_note_and_help() {
        let out = plain().render(&make_diag());
        assert!(out.contains("note: operands are literals or registers"), "got:\n{out}");
        assert!(out.contains("help: did you mean 'ax'?"), "got:\n{out}");
    }

    #[test]
    fn render_no_source_still_works() {
        let out = plain().render(&Diagnostic::error("unknown label 'end'"));
        assert_eq!(out, "error: unknown label 'end'\n");
    }

    #[test]
    fn color_toggle() {
        assert!(AnsiRenderer::new(true).render(&make_diag()).contains("\x1b["));
        assert!(!plain().render(&make_diag()).contains("\x1b["));
    }
}

/// Maps byte offsets to line/column positions within assembly source.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.bytes().enumerate().filter(|(_, b)| *b == b'\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { line_starts }
    }

    /// Returns (line, col), both 1-based.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line + 1, col + 1)
    }

    /// Returns the full text of the given 1-based line number.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        source[start..end].trim_end_matches('\n').trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let src = "mov ax, 5";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(4), (1, 5));
        assert_eq!(sm.lookup(9), (1, 10));
    }

    #[test]
    fn multi_line() {
        let src = "mov ax, 1\nloop:\ninc ax";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(9), (1, 10)); // '\n' after the mov
        assert_eq!(sm.lookup(10), (2, 1)); // 'l' of "loop:"
        assert_eq!(sm.lookup(16), (3, 1)); // 'i' of "inc ax"
        assert_eq!(sm.line_text(src, 2), "loop:");
        assert_eq!(sm.line_text(src, 3), "inc ax");
    }

    #[test]
    fn crlf_trimmed() {
        let src = "cmp ax, 3\r\njl top\r\n";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "cmp ax, 3");
        assert_eq!(sm.line_text(src, 2), "jl top");
        assert_eq!(sm.line_text(src, 3), "");
    }

    #[test]
    fn line_text_out_of_bounds() {
        let src = "jmp end";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 0), "");
        assert_eq!(sm.line_text(src, 99), "");
    }

    #[test]
    fn empty_source() {
        let sm = SourceMap::new("");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.line_text("", 1), "");
    }
}

//! Indented line accumulation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineWriterError {
    /// More unindents than indents. The emitter's block structure is
    /// unbalanced.
    #[error("unindent with no matching indent")]
    UnmatchedUnindent,
}

/// Accumulates lines of output, each tagged with the indentation depth it
/// was added at. Rendering is deferred so the indentation style is a
/// render-time decision.
#[derive(Debug, Clone, Default)]
pub struct LineWriter {
    lines: Vec<(usize, String)>,
    depth: usize,
}

impl LineWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at the current depth.
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push((self.depth, line.into()));
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn unindent(&mut self) -> Result<(), LineWriterError> {
        if self.depth == 0 {
            return Err(LineWriterError::UnmatchedUnindent);
        }
        self.depth -= 1;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render with one tab per indentation level, lines joined by `\n`
    /// with no trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, (depth, line)) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for _ in 0..*depth {
                out.push('\t');
            }
            out.push_str(line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_indents_with_tabs() {
        let mut writer = LineWriter::new();
        writer.add_line("interface Foo {");
        writer.indent();
        writer.add_line("bar: string;");
        writer.unindent().unwrap();
        writer.add_line("}");

        assert_eq!(writer.render(), "interface Foo {\n\tbar: string;\n}");
    }

    #[test]
    fn test_unmatched_unindent_is_an_error() {
        let mut writer = LineWriter::new();
        assert!(matches!(
            writer.unindent(),
            Err(LineWriterError::UnmatchedUnindent)
        ));
    }

    #[test]
    fn test_empty_writer_renders_empty() {
        let writer = LineWriter::new();
        assert!(writer.is_empty());
        assert_eq!(writer.render(), "");
    }
}

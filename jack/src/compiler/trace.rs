//! Grammar trace.
use crate::lex::Token;

/// Record of the grammar rules entered and exited, and the terminals
/// consumed in between, in the order the compiler saw them.
///
/// ```text
/// <term>
/// <integerConstant> 10 </integerConstant>
/// </term>
/// ```
#[derive(Debug, Default)]
pub struct Trace {
    lines: Vec<String>,
}

impl Trace {
    pub fn open(&mut self, rule: &str) {
        self.lines.push(format!("<{}>", rule));
    }

    pub fn close(&mut self, rule: &str) {
        self.lines.push(format!("</{}>", rule));
    }

    pub fn terminal(&mut self, token: &Token) {
        self.lines.push(token.to_xml());
    }

    /// Trace as text, every entry terminated by a newline.
    pub fn to_text(&self) -> String {
        let mut buf = String::new();
        for line in &self.lines {
            buf.push_str(line);
            buf.push('\n');
        }
        buf
    }
}

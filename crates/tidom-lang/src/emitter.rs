
use crate::attrs::Property;
use crate::interpolation::quote;

/// Append-only buffer of instruction lines with a current indentation level.
#[derive(Debug, Clone)]
pub struct Emitter {
    lines: Vec<String>,
    level: usize,
    indent_width: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Emitter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            level: 0,
            indent_width,
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Writes text at the current level; every non-empty line of it gets indented, except lines
    /// continuing a string literal after a trailing `\`.
    pub fn write(&mut self, text: &str) {
        let indent = " ".repeat(self.level * self.indent_width);
        let mut continued = false;

        for line in text.split('\n') {
            if line.is_empty() || continued {
                self.lines.push(line.to_string());
            } else {
                self.lines.push(format!("{}{}", indent, line));
            }

            continued = line.ends_with('\\');
        }
    }

    pub fn element_open(
        &mut self,
        tag: &str,
        key: Option<&str>,
        statics: Option<&str>,
        properties: &[Property],
    ) {
        let mut args = vec![
            quote(tag),
            key.unwrap_or("null").to_string(),
            statics.unwrap_or("null").to_string(),
        ];

        if properties.is_empty() {
            while args.len() > 1 && args.last().is_some_and(|arg| arg == "null") {
                args.pop();
            }
        } else {
            args.extend(
                properties
                    .iter()
                    .flat_map(|p| [quote(&p.name), p.expr.clone()]),
            );
        }

        self.write(&format!("elementOpen({})", args.join(", ")));
    }

    pub fn element_close(&mut self, tag: &str) {
        self.write(&format!("elementClose({})", quote(tag)));
    }

    pub fn text(&mut self, expr: &str) {
        self.write(&format!("text({})", expr));
    }

    pub fn open_block(&mut self, header: &str) {
        self.write(header);
        self.indent();
    }

    pub fn close_block(&mut self, closer: &str) {
        self.dedent();
        self.write(closer);
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

//! Indented source writer and literal helpers shared by the emitters

/// Accumulates lines of generated source at a tracked indentation level
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    level: usize,
    unit: &'static str,
}

impl CodeWriter {
    /// A writer indenting with `unit` per level
    pub fn new(unit: &'static str) -> Self {
        CodeWriter {
            buf: String::new(),
            level: 0,
            unit,
        }
    }

    /// Write one line at the current level; empty lines carry no indentation
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.level {
                self.buf.push_str(self.unit);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    /// Write several lines, each at the current level
    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// `open`, the body one level deeper, then `close`
    pub fn block<F>(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: F) -> &mut Self
    where
        F: FnOnce(&mut CodeWriter),
    {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close);
        self
    }

    /// `open` followed by the body one level deeper, with no closing line
    pub fn scope<F>(&mut self, open: impl AsRef<str>, body: F) -> &mut Self
    where
        F: FnOnce(&mut CodeWriter),
    {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Double-quoted literal valid in JavaScript, TypeScript, Python and JSON
pub fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.escape_default()))
}

/// Rust string literal
pub fn rust_str(text: &str) -> String {
    format!("{:?}", text)
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "gen",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// A snake_case word turned into a usable Rust identifier
pub fn rust_ident(snake: &str) -> String {
    if snake.is_empty() || snake.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{}", snake);
    }
    match snake {
        "self" | "super" | "crate" => format!("{}_", snake),
        _ if RUST_KEYWORDS.contains(&snake) => format!("r#{}", snake),
        _ => snake.to_string(),
    }
}

/// A PascalCase type name that never starts with a digit
pub fn type_name(pascal: &str) -> String {
    if pascal.is_empty() || pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Command{}", pascal)
    } else {
        pascal.to_string()
    }
}

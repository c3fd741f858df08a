//! Typed fragment builders.
//!
//! Translators assemble calls, literals and routines through these
//! builders instead of interpolating raw strings, so quoting, statement
//! termination and indentation follow one rule per target.

use core::fmt;

use super::Target;

/// Indentation unit inside generated routines.
pub const INDENT: &str = "    ";

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

/// A double-quoted C++ string literal.
pub fn c_string(text: &str) -> String {
    quote(text)
}

/// A double-quoted Python string literal.
pub fn py_string(text: &str) -> String {
    quote(text)
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Integral values print without a fractional part.
pub fn number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Calls and statements
// ---------------------------------------------------------------------------

/// A function or method call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    receiver: Option<String>,
    name: String,
    args: Vec<String>,
}

impl Call {
    pub fn method(receiver: &str, name: &str) -> Self {
        Self {
            receiver: Some(receiver.to_string()),
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    pub fn function(name: &str) -> Self {
        Self {
            receiver: None,
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The call as a complete statement for `target`.
    pub fn statement(&self, target: Target) -> String {
        statement(target, &self.to_string())
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = &self.receiver {
            write!(f, "{r}.")?;
        }
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}

/// Terminate a statement the way `target` requires.  Empty code stays empty.
pub fn statement(target: Target, code: &str) -> String {
    let code = code.trim_end();
    match target {
        Target::Arduino if !code.is_empty() && !code.ends_with(';') && !code.ends_with('}') => {
            format!("{code};")
        }
        _ => code.to_string(),
    }
}

/// Prefix every non-empty line of `code` with `prefix`.
pub fn indent(code: &str, prefix: &str) -> String {
    code.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("{prefix}{l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// A C++ free function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CppFunction {
    ret: String,
    name: String,
    params: Vec<String>,
    body: Vec<String>,
}

impl CppFunction {
    pub fn new(ret: &str, name: &str) -> Self {
        Self {
            ret: ret.to_string(),
            name: name.to_string(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, param: &str) -> Self {
        self.params.push(param.to_string());
        self
    }

    /// Append statements; each is `;`-terminated if needed.
    #[must_use]
    pub fn body<I, S>(mut self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.body.extend(
            statements
                .into_iter()
                .map(|s| statement(Target::Arduino, s.as_ref()))
                .filter(|s| !s.is_empty()),
        );
        self
    }
}

impl fmt::Display for CppFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}({}){{", self.ret, self.name, self.params.join(", "))?;
        for s in &self.body {
            writeln!(f, "{}", indent(s, INDENT))?;
        }
        writeln!(f, "}}")
    }
}

/// A Python `def`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyFunction {
    name: String,
    params: Vec<String>,
    globals: Vec<String>,
    body: Vec<String>,
}

impl PyFunction {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            globals: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, param: &str) -> Self {
        self.params.push(param.to_string());
        self
    }

    #[must_use]
    pub fn global(mut self, name: &str) -> Self {
        self.globals.push(name.to_string());
        self
    }

    #[must_use]
    pub fn body<I, S>(mut self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.body.extend(
            statements
                .into_iter()
                .map(|s| s.as_ref().trim_end().to_string())
                .filter(|s| !s.is_empty()),
        );
        self
    }
}

impl fmt::Display for PyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "def {}({}):", self.name, self.params.join(", "))?;
        if !self.globals.is_empty() {
            writeln!(f, "{INDENT}global {}", self.globals.join(", "))?;
        }
        if self.body.is_empty() {
            writeln!(f, "{INDENT}pass")?;
        }
        for s in &self.body {
            writeln!(f, "{}", indent(s, INDENT))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Replace `[NAME]` placeholders using `lookup`.
///
/// A placeholder is `[` + an ASCII uppercase letter + uppercase letters,
/// digits or `_` + `]`.  Anything else (e.g. `buf[0]`) is copied verbatim.
pub fn fill_template(text: &str, mut lookup: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) if is_placeholder(&after[..close]) => {
                out.push_str(&lookup(&after[..close]));
                rest = &after[close + 1..];
            }
            _ => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_placeholder(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

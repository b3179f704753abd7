//! Small statement/expression tree for the emitted GPT script.
//!
//! Generation code assembles nodes in order and renders once at the end, so
//! ordering is decided structurally and tests can inspect nodes instead of
//! matching whitespace.

use serde_json::Value;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier or dotted path, emitted as is (`googletag.pubads()`).
    Ident(String),
    /// Single-quoted string literal.
    Str(String),
    /// JSON literal (double-quoted strings, arrays, numbers).
    Json(Value),
    /// Trusted script text from configuration, emitted verbatim.
    Raw(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Chain(CallChain),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Expr>,
}

/// `root.method(args).method(args)...`
#[derive(Debug, Clone, PartialEq)]
pub struct CallChain {
    pub root: String,
    pub calls: Vec<Call>,
    /// Put each chained call after the first on its own line.
    pub multiline: bool,
}

impl CallChain {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            calls: Vec::new(),
            multiline: false,
        }
    }

    pub fn call(mut self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        self.calls.push(Call {
            method: method.into(),
            args,
        });
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().map(|c| c.method.as_str())
    }

    pub fn find(&self, method: &str) -> Option<&Call> {
        self.calls.iter().find(|c| c.method == method)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Comment(String),
    /// Boxed banner comment used to separate script sections.
    Banner(String),
    Var { name: String, value: Expr },
    Expr(Expr),
    /// Fixed multi-line runtime code, re-indented on render.
    Raw(String),
    Blank,
}

impl Stmt {
    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }

    pub fn var(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Var {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    stmts: Vec<Stmt>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn extend(&mut self, other: Script) {
        self.stmts.extend(other.stmts);
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.stmts
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.stmts.iter().filter_map(|s| match s {
            Stmt::Comment(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn find_var(&self, name: &str) -> Option<&Expr> {
        self.stmts.iter().find_map(|s| match s {
            Stmt::Var { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    pub fn render(&self) -> String {
        self.render_indented(0)
    }

    pub fn render_indented(&self, level: usize) -> String {
        let mut out = String::new();
        for stmt in &self.stmts {
            render_stmt(stmt, level, &mut out);
        }
        out
    }
}

fn pad(level: usize) -> String {
    INDENT.repeat(level)
}

fn render_stmt(stmt: &Stmt, level: usize, out: &mut String) {
    let indent = pad(level);
    match stmt {
        Stmt::Comment(text) => {
            out.push_str(&indent);
            out.push_str("// ");
            out.push_str(&comment_text(text));
            out.push('\n');
        }
        Stmt::Banner(title) => {
            let rule = "-".repeat(74);
            let title = comment_text(title).to_uppercase();
            out.push_str(&format!("{}/* {} */\n", indent, rule));
            out.push_str(&format!("{}/* {:^74} */\n", indent, title));
            out.push_str(&format!("{}/* {} */\n", indent, rule));
        }
        Stmt::Var { name, value } => {
            out.push_str(&indent);
            out.push_str("var ");
            out.push_str(name);
            out.push_str(" = ");
            render_expr(value, level, out);
            out.push_str(";\n");
        }
        Stmt::Expr(expr) => {
            out.push_str(&indent);
            render_expr(expr, level, out);
            out.push_str(";\n");
        }
        Stmt::Raw(code) => {
            for line in dedent(code).lines() {
                if line.trim().is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&indent);
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        Stmt::Blank => out.push('\n'),
    }
}

fn render_expr(expr: &Expr, level: usize, out: &mut String) {
    match expr {
        Expr::Ident(name) => out.push_str(name),
        Expr::Str(value) => out.push_str(&single_quoted(value)),
        Expr::Json(value) => out.push_str(&json_literal(value)),
        Expr::Raw(code) => out.push_str(code),
        Expr::Array(items) if items.is_empty() => out.push_str("[]"),
        Expr::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&pad(level + 1));
                render_expr(item, level + 1, out);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad(level));
            out.push(']');
        }
        Expr::Object(entries) if entries.is_empty() => out.push_str("{}"),
        Expr::Object(entries) => {
            out.push_str("{\n");
            for (i, (key, value)) in entries.iter().enumerate() {
                out.push_str(&pad(level + 1));
                out.push_str(&single_quoted(key));
                out.push_str(" : ");
                render_expr(value, level + 1, out);
                if i + 1 < entries.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad(level));
            out.push('}');
        }
        Expr::Chain(chain) => {
            out.push_str(&chain.root);
            for (i, call) in chain.calls.iter().enumerate() {
                if chain.multiline && i > 0 {
                    out.push('\n');
                    out.push_str(&pad(level + 1));
                }
                out.push('.');
                out.push_str(&call.method);
                out.push('(');
                for (j, arg) in call.args.iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    render_expr(arg, level + 1, out);
                }
                out.push(')');
            }
        }
    }
}

/// Comments are single-line and must not close the surrounding `<script>`.
fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace("</", "<\\/")
}

pub fn single_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out.replace("</", "<\\/")
}

pub fn json_literal(value: &Value) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

/// Make a configured name usable as a script variable name.
pub fn identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn dedent(code: &str) -> String {
    let min = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    code.lines()
        .map(|l| if l.len() >= min { &l[min..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

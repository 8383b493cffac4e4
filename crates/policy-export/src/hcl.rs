//! Minimal HCL writer.
//!
//! Produces the subset of HCL the export needs, formatted the way
//! `terraform fmt` would leave it:
//!
//! - two spaces of indentation per level
//! - `=` aligned across consecutive single-line attributes
//! - lists with more than one element and non-empty objects span lines,
//!   one element per line
//! - one blank line between a run of attributes and a nested block
//!
//! Output depends only on the input, so identical blocks always render to
//! identical text.

use serde_json::Value;
use std::fmt;

const INDENT: &str = "  ";

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Quoted string literal.
    String(String),
    /// Unquoted expression such as `permitio_role.admin.key` or `string`.
    Traversal(String),
    /// List of expressions.
    List(Vec<Expr>),
    /// Object constructor; keys are quoted unless they are identifiers.
    Object(Vec<(String, Expr)>),
}

impl Expr {
    /// A quoted string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    /// An unquoted expression.
    pub fn traversal(value: impl Into<String>) -> Self {
        Expr::Traversal(value.into())
    }

    /// A list of string literals.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::List(values.into_iter().map(Expr::string).collect())
    }

    /// `jsonencode(...)` of a JSON value.
    ///
    /// JSON is valid HCL expression syntax, apart from template sequences
    /// inside strings, which are escaped.
    pub fn json(value: &Value) -> Self {
        Expr::Traversal(format!("jsonencode({})", escape_templates(&value.to_string())))
    }

    fn render(&self, indent: usize) -> String {
        match self {
            Expr::String(value) => quote(value),
            Expr::Traversal(value) => value.clone(),
            Expr::List(items) if items.len() <= 1 => {
                let inner: Vec<String> = items.iter().map(|item| item.render(indent)).collect();
                format!("[{}]", inner.join(", "))
            }
            Expr::List(items) => {
                let pad = INDENT.repeat(indent + 1);
                let mut out = String::from("[\n");
                for item in items {
                    out.push_str(&pad);
                    out.push_str(&item.render(indent + 1));
                    out.push_str(",\n");
                }
                out.push_str(&INDENT.repeat(indent));
                out.push(']');
                out
            }
            Expr::Object(entries) if entries.is_empty() => "{}".to_string(),
            Expr::Object(entries) => {
                let attributes: Vec<(String, &Expr)> = entries
                    .iter()
                    .map(|(key, value)| (object_key(key), value))
                    .collect();
                let mut out = String::from("{\n");
                write_attributes(&mut out, &attributes, indent + 1);
                out.push_str(&INDENT.repeat(indent));
                out.push('}');
                out
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BodyItem {
    Attribute(String, Expr),
    Block(Block),
}

/// A block such as `resource "permitio_role" "admin" { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    keyword: String,
    labels: Vec<String>,
    body: Vec<BodyItem>,
}

impl Block {
    /// Create an empty block with no labels.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            labels: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A `resource "<block_type>" "<name>"` block.
    pub fn resource(block_type: &str, name: &str) -> Self {
        Self::new("resource").label(block_type).label(name)
    }

    /// Append a label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Append an attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: Expr) -> Self {
        self.body.push(BodyItem::Attribute(key.into(), value));
        self
    }

    /// Append an attribute when `value` is present.
    pub fn optional_attribute(self, key: impl Into<String>, value: Option<Expr>) -> Self {
        match value {
            Some(value) => self.attribute(key, value),
            None => self,
        }
    }

    /// Append a nested block.
    pub fn block(mut self, block: Block) -> Self {
        self.body.push(BodyItem::Block(block));
        self
    }

    fn write(&self, out: &mut String, indent: usize) {
        let pad = INDENT.repeat(indent);
        out.push_str(&pad);
        out.push_str(&self.keyword);
        for label in &self.labels {
            out.push(' ');
            out.push_str(&quote(label));
        }
        out.push_str(" {\n");
        write_body(out, &self.body, indent + 1);
        out.push_str(&pad);
        out.push_str("}\n");
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write(&mut out, 0);
        f.write_str(&out)
    }
}

fn write_body(out: &mut String, body: &[BodyItem], indent: usize) {
    let mut i = 0;
    while i < body.len() {
        if i > 0 {
            out.push('\n');
        }
        match &body[i] {
            BodyItem::Block(block) => {
                block.write(out, indent);
                i += 1;
            }
            BodyItem::Attribute(..) => {
                let mut attributes = Vec::new();
                while let Some(BodyItem::Attribute(key, value)) = body.get(i) {
                    attributes.push((key.clone(), value));
                    i += 1;
                }
                write_attributes(out, &attributes, indent);
            }
        }
    }
}

/// Write attributes, aligning `=` across each run of single-line values.
fn write_attributes(out: &mut String, attributes: &[(String, &Expr)], indent: usize) {
    let pad = INDENT.repeat(indent);
    let rendered: Vec<(&str, String)> = attributes
        .iter()
        .map(|(key, value)| (key.as_str(), value.render(indent)))
        .collect();

    let mut i = 0;
    while i < rendered.len() {
        let (key, value) = &rendered[i];
        if value.contains('\n') {
            out.push_str(&format!("{}{} = {}\n", pad, key, value));
            i += 1;
            continue;
        }

        let start = i;
        while i < rendered.len() && !rendered[i].1.contains('\n') {
            i += 1;
        }
        let width = rendered[start..i]
            .iter()
            .map(|(key, _)| key.len())
            .max()
            .unwrap_or(0);
        for (key, value) in &rendered[start..i] {
            out.push_str(&format!("{}{:<width$} = {}\n", pad, key, value, width = width));
        }
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quote and escape a string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escape `${` and `%{` so they are not read as template sequences.
fn escape_templates(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}

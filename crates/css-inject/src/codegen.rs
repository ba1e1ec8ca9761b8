//! JavaScript emitted for CSS files and for the style-injection helper.
//!
//! Every generated CSS module is parsed back with oxc before it is handed to
//! the host, and the parsed string literal must equal the CSS text exactly.

use crate::naming::ClassNameMap;
use crate::parser::{ParseError, analyze_module};
use crate::types::INJECT_STYLE_ID;
use std::fmt::Write;
use thiserror::Error;

/// Local binding of the injection helper inside generated modules
const INJECT_BINDING: &str = "injectStyle";

/// Source of the virtual `__inject_style__` module.
///
/// The default export appends one `<style>` element per call to
/// `document.head`. `document` defaults to `globalThis.document` and may be
/// injected by the caller; without one the call throws a `ReferenceError`.
pub const INJECT_STYLE_MODULE: &str = r#"export default function injectStyle(text, document = globalThis.document) {
  if (document == null) {
    throw new ReferenceError("document is not defined");
  }
  const style = document.createElement("style");
  style.appendChild(document.createTextNode(text));
  document.head.append(style);
}
"#;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Generated module does not parse: {0}")]
    InvalidModule(#[from] ParseError),

    #[error("Generated module does not round-trip: {0}")]
    Mismatch(String),
}

/// Serialize `value` as a double-quoted JavaScript string literal.
///
/// Quotes, backslashes, template delimiters, line terminators (including
/// U+2028/U+2029), other ASCII control characters and `</` are escaped, so the
/// literal evaluates to exactly `value` wherever it is embedded.
pub fn js_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');

    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '<' if chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("<\\/");
            }
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }

    out.push('"');
    out
}

fn js_object_literal(classes: &ClassNameMap) -> String {
    if classes.is_empty() {
        return "{}".to_string();
    }

    let mut out = String::from("{\n");
    for (key, value) in classes {
        let _ = writeln!(out, "  {}: {},", js_string_literal(key), js_string_literal(value));
    }
    out.push('}');
    out
}

fn render_injection(css: &str) -> String {
    format!(
        "import {INJECT_BINDING} from {};\n{INJECT_BINDING}({});\n",
        js_string_literal(INJECT_STYLE_ID),
        js_string_literal(css)
    )
}

/// Check that `source` parses and carries exactly `css` and `classes`
fn verify(source: &str, css: &str, classes: Option<&ClassNameMap>) -> Result<(), CodegenError> {
    let analysis = analyze_module(source)?;

    let injected: Vec<&str> = analysis
        .calls
        .iter()
        .filter(|call| call.callee == INJECT_BINDING)
        .map(|call| call.argument.as_str())
        .collect();
    if injected != [css] {
        return Err(CodegenError::Mismatch("injected CSS differs from engine output".into()));
    }

    if analysis.default_export.as_ref() != classes {
        return Err(CodegenError::Mismatch("default export differs from class-name map".into()));
    }

    Ok(())
}

/// Module for a plain stylesheet: injects the CSS on evaluation, exports nothing
pub fn plain_css_module(css: &str) -> Result<String, CodegenError> {
    let source = render_injection(css);
    verify(&source, css, None)?;
    Ok(source)
}

/// Module for a CSS Modules stylesheet: injects the CSS and default-exports
/// the class-name map
pub fn css_modules_module(css: &str, classes: &ClassNameMap) -> Result<String, CodegenError> {
    let mut source = render_injection(css);
    source.push_str("export default ");
    source.push_str(&js_object_literal(classes));
    source.push_str(";\n");

    verify(&source, css, Some(classes))?;
    Ok(source)
}

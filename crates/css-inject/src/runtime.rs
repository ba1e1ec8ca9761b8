//! DOM-like sink the style-injection helper writes into.
//!
//! `inject_style` mirrors the generated `__inject_style__` helper step for
//! step, with the document passed in as a capability instead of being read
//! from a global. Hosts that evaluate bundles outside a browser (SSR,
//! snapshot tests) can collect styles with [`StyleCollector`].

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("ReferenceError: document is not defined")]
    MissingDocument,
}

/// The subset of the DOM the injection helper touches
pub trait Document {
    type Element;

    /// `document.createElement("style")`
    fn create_style_element(&mut self) -> Self::Element;

    /// `element.appendChild(document.createTextNode(text))`
    fn append_text(&mut self, element: &mut Self::Element, text: &str);

    /// `document.head.append(element)`
    fn append_to_head(&mut self, element: Self::Element);
}

/// Append one `<style>` element holding `text` to the document head.
///
/// Every call appends a new element; identical text is not deduplicated.
pub fn inject_style<D: Document>(document: Option<&mut D>, text: &str) -> Result<(), RuntimeError> {
    let document = document.ok_or(RuntimeError::MissingDocument)?;
    let mut style = document.create_style_element();
    document.append_text(&mut style, text);
    document.append_to_head(style);
    Ok(())
}

/// A `<style>` element built by [`StyleCollector`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleElement {
    pub text_nodes: Vec<String>,
}

impl StyleElement {
    pub fn text_content(&self) -> String {
        self.text_nodes.concat()
    }
}

/// In-memory document that records the `<style>` elements appended to its head
#[derive(Debug, Default)]
pub struct StyleCollector {
    head: Vec<StyleElement>,
}

impl StyleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Style elements in the order they were appended
    pub fn styles(&self) -> &[StyleElement] {
        &self.head
    }

    /// All collected CSS, one element per line, ready for a single `<style>` tag
    pub fn to_css(&self) -> String {
        self.head.iter().map(StyleElement::text_content).collect::<Vec<_>>().join("\n")
    }
}

impl Document for StyleCollector {
    type Element = StyleElement;

    fn create_style_element(&mut self) -> StyleElement {
        StyleElement::default()
    }

    fn append_text(&mut self, element: &mut StyleElement, text: &str) {
        element.text_nodes.push(text.to_string());
    }

    fn append_to_head(&mut self, element: StyleElement) {
        self.head.push(element);
    }
}

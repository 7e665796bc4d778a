//! Dependency injection for rendered pages
//!
//! Elements may declare the scripts and stylesheets they need in a
//! `data-dependencies` attribute (a comma-separated list). This module
//! gathers those lists across a page, removes repeats, and appends one
//! `<script>` or stylesheet `<link>` per dependency to the page head.

use crate::error::{Error, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Attribute listing the dependencies of an element
pub const DEPENDENCIES_ATTRIBUTE: &str = "data-dependencies";

/// Attribute marking elements added by [`inject_dependencies`]
pub const AUTO_DEPENDENCY_ATTRIBUTE: &str = "data-auto-dependency";

/// An element that can carry attributes
pub trait PageElement {
    fn set_attribute(&mut self, name: &str, value: &str);
}

/// The page operations the injector needs
pub trait PageDocument {
    type Element: PageElement;

    /// Values of `read` on every element carrying `attribute`, in document
    /// order. Elements carrying `attribute` but not `read` are skipped.
    fn query_attribute(&self, attribute: &str, read: &str) -> Result<Vec<String>>;

    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> Self::Element;

    /// Append an element to the end of the head
    fn append_to_head(&mut self, element: Self::Element);
}

/// A detached element with ordered attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize as HTML. Void elements get no closing tag.
    pub fn to_html(&self) -> String {
        let mut html = format!("<{}", self.tag);
        for (name, value) in &self.attributes {
            html.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        html.push('>');
        if !matches!(self.tag.as_str(), "link" | "meta" | "base") {
            html.push_str(&format!("</{}>", self.tag));
        }
        html
    }
}

impl PageElement for Element {
    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split one attribute value into trimmed, non-empty dependencies
pub fn split_dependencies(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|d| !d.is_empty())
}

/// Every distinct dependency across `values`, in order of first appearance
pub fn collect_dependencies<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .flat_map(|v| split_dependencies(v.as_ref()))
        .filter(|d| seen.insert(d.to_string()))
        .map(str::to_string)
        .collect()
}

/// A dependency names a stylesheet when ".css" occurs after its first character
pub fn is_stylesheet(dependency: &str) -> bool {
    dependency.find(".css").is_some_and(|i| i > 0)
}

/// Build the element that loads `dependency`
pub fn create_dependency_element<D: PageDocument>(document: &mut D, dependency: &str) -> D::Element {
    if is_stylesheet(dependency) {
        let mut element = document.create_element("link");
        element.set_attribute("href", dependency);
        element.set_attribute("rel", "stylesheet");
        return element;
    }

    let mut element = document.create_element("script");
    element.set_attribute("src", dependency);
    element
}

/// Append one tagged element per declared dependency to the page head.
///
/// Dependencies already loaded by an element carrying
/// [`AUTO_DEPENDENCY_ATTRIBUTE`] are skipped, so a page processed twice
/// gets each tag once. Returns the number of elements added.
pub fn inject_dependencies<D: PageDocument>(document: &mut D) -> Result<usize> {
    let declared = document.query_attribute(DEPENDENCIES_ATTRIBUTE, DEPENDENCIES_ATTRIBUTE)?;
    if declared.is_empty() {
        return Ok(0);
    }

    let mut present: HashSet<String> = document
        .query_attribute(AUTO_DEPENDENCY_ATTRIBUTE, "src")?
        .into_iter()
        .collect();
    present.extend(document.query_attribute(AUTO_DEPENDENCY_ATTRIBUTE, "href")?);

    let dependencies: Vec<String> = collect_dependencies(&declared)
        .into_iter()
        .filter(|d| !present.contains(d))
        .collect();
    for dependency in &dependencies {
        let mut element = create_dependency_element(document, dependency);
        element.set_attribute(AUTO_DEPENDENCY_ATTRIBUTE, "true");
        document.append_to_head(element);
    }

    debug!(
        elements = declared.len(),
        already_present = present.len(),
        injected = dependencies.len(),
        "injected page dependencies"
    );
    Ok(dependencies.len())
}

/// An HTML page queried with `scraper`; appended elements are spliced in
/// at the end of the head when rendered.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    source: String,
    appended: Vec<Element>,
}

impl HtmlPage {
    pub fn parse(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            appended: Vec::new(),
        }
    }

    /// Elements appended to the head so far
    pub fn appended(&self) -> &[Element] {
        &self.appended
    }

    /// The page source with appended elements in place
    pub fn render(&self) -> String {
        if self.appended.is_empty() {
            return self.source.clone();
        }

        let tags: String = self.appended.iter().map(Element::to_html).collect();
        let at = head_insertion_point(&self.source);

        let mut html = String::with_capacity(self.source.len() + tags.len());
        html.push_str(&self.source[..at]);
        html.push_str(&tags);
        html.push_str(&self.source[at..]);
        html
    }
}

/// Elements whose content is text, never markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

/// Byte offset of the closing head tag, skipping comments and raw-text
/// element bodies. Falls back to the opening body tag, then to the start.
fn head_insertion_point(source: &str) -> usize {
    let lower = source.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut body = None;
    let mut i = 0;

    while let Some(offset) = lower[i..].find('<') {
        i += offset;
        let rest = &lower[i..];

        if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(end) => i += 4 + end + 3,
                None => break,
            }
            continue;
        }
        if is_tag(bytes, i, "</head") {
            return i;
        }
        if body.is_none() && is_tag(bytes, i, "<body") {
            body = Some(i);
        }
        if let Some(name) = RAW_TEXT_ELEMENTS
            .iter()
            .find(|name| is_tag(bytes, i, &format!("<{}", name)))
        {
            let close = format!("</{}", name);
            match rest[1..].find(&close) {
                Some(end) => i += 1 + end + close.len(),
                None => break,
            }
            continue;
        }
        i += 1;
    }

    body.unwrap_or(0)
}

/// `prefix` occurs at `at` and is followed by a tag-name boundary
fn is_tag(bytes: &[u8], at: usize, prefix: &str) -> bool {
    bytes[at..].starts_with(prefix.as_bytes())
        && bytes
            .get(at + prefix.len())
            .map_or(true, |&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
}

impl PageDocument for HtmlPage {
    type Element = Element;

    fn query_attribute(&self, attribute: &str, read: &str) -> Result<Vec<String>> {
        let selector = Selector::parse(&format!("[{}]", attribute))
            .map_err(|e| Error::Selector(format!("{:?}", e)))?;
        let document = Html::parse_document(&self.render());
        Ok(document
            .select(&selector)
            .filter_map(|element| element.value().attr(read))
            .map(str::to_string)
            .collect())
    }

    fn create_element(&mut self, tag: &str) -> Element {
        Element::new(tag)
    }

    fn append_to_head(&mut self, element: Element) {
        self.appended.push(element);
    }
}

/// Inject dependencies into the page at `input`, writing the result to
/// `output`. The page is only rewritten when something was injected.
pub fn inject_file(input: &Path, output: &Path) -> Result<usize> {
    let source = fs::read_to_string(input).map_err(|e| Error::FileRead {
        path: input.to_path_buf(),
        source: e,
    })?;

    let mut page = HtmlPage::parse(source);
    let injected = inject_dependencies(&mut page)?;
    if injected > 0 || input != output {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, page.render())?;
    }
    Ok(injected)
}

//! Node type definitions.
//!
//! The `NodeKind` enum carries the payload of every node in a document tree.
//! Navigation links (parent, children, siblings) live in `NodeData`, not here.

use std::borrow::Cow;
use std::fmt;

/// The kind of a node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,
    /// A tag, e.g. `<div class="x">`.
    Tag(Tag),
    /// A leaf string: text, comment, CDATA, and the other special strings.
    String(NavigableString),
}

/// An element with a name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The tag name, already case-folded when the markup rules fold case.
    pub name: String,
    /// Attributes in the order they were first written.
    pub attributes: Attributes,
}

impl Tag {
    /// Creates a tag with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::default(),
        }
    }
}

/// What a [`NavigableString`] represents in the source markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// Ordinary character data.
    Text,
    /// `<!-- ... -->`
    Comment,
    /// `<![CDATA[ ... ]]>`
    CData,
    /// `<! ... >` other than a doctype.
    Declaration,
    /// `<!DOCTYPE ... >`
    Doctype,
    /// `<? ... >`
    ProcessingInstruction,
}

/// An immutable leaf string with its subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigableString {
    /// The decoded content, without the markup delimiters.
    pub content: String,
    /// What kind of string this is.
    pub kind: StringKind,
}

impl NavigableString {
    /// Creates a plain text string.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, StringKind::Text)
    }

    /// Creates a string of the given kind.
    pub fn new(content: impl Into<String>, kind: StringKind) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }

    /// Returns `true` for text and CDATA, the kinds that count as a tag's text.
    pub fn is_textual(&self) -> bool {
        matches!(self.kind, StringKind::Text | StringKind::CData)
    }
}

/// An attribute value: a single string, or an ordered list for attributes
/// conventionally holding space-separated tokens (such as `class`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A plain value.
    Single(String),
    /// A multi-valued attribute split on whitespace.
    Multi(Vec<String>),
}

impl AttrValue {
    /// Iterates over the individual values. A single value yields once.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        };
        slice.iter().map(String::as_str)
    }

    /// The value as written back to markup: list values joined with one space.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            Self::Single(value) => Cow::Borrowed(value),
            Self::Multi(values) => Cow::Owned(values.join(" ")),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// A single attribute on a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The attribute value.
    pub value: AttrValue,
}

/// An insertion-ordered attribute map.
///
/// Setting an existing name replaces its value in place, so the attribute
/// keeps the position of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Returns the value for `name`, compared exactly.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Returns `true` if an attribute called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name` to `value`, replacing any previous value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        if let Some(existing) = self.0.iter_mut().find(|a| a.name == name) {
            existing.value = value;
        } else {
            self.0.push(Attribute { name, value });
        }
    }

    /// Removes `name`, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let index = self.0.iter().position(|a| a.name == name)?;
        Some(self.0.remove(index).value)
    }

    /// Iterates over attributes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    /// The number of attributes.
    ///
    /// ```
    /// let doc = soupkit::parse_html("<input type=text disabled><br>");
    /// let input = doc.as_tag(doc.tag(doc.root(), "input").unwrap()).unwrap();
    /// assert_eq!(input.attributes.len(), 2);
    /// assert!(input.attributes.contains("disabled"));
    ///
    /// let br = doc.as_tag(doc.tag(doc.root(), "br").unwrap()).unwrap();
    /// assert!(br.attributes.is_empty());
    /// ```
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the tag has no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A borrowed view of a non-document node: either a tag or a string.
///
/// ```
/// let doc = soupkit::parse_html("<b>bold</b>");
/// let b = doc.tag(doc.root(), "b").unwrap();
/// let text = doc.first_child(b).unwrap();
///
/// assert_eq!(doc.element(b).and_then(|e| e.as_tag()).map(|t| t.name.as_str()), Some("b"));
/// assert!(doc.element(b).unwrap().as_string().is_none());
/// assert_eq!(
///     doc.element(text).and_then(|e| e.as_string()).map(|s| s.content.as_str()),
///     Some("bold")
/// );
/// assert!(doc.element(doc.root()).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageElement<'a> {
    /// A tag node.
    Tag(&'a Tag),
    /// A string node.
    String(&'a NavigableString),
}

impl<'a> PageElement<'a> {
    /// Returns the tag, if this is one.
    pub fn as_tag(self) -> Option<&'a Tag> {
        match self {
            Self::Tag(tag) => Some(tag),
            Self::String(_) => None,
        }
    }

    /// Returns the string, if this is one.
    pub fn as_string(self) -> Option<&'a NavigableString> {
        match self {
            Self::String(string) => Some(string),
            Self::Tag(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_insert_keeps_first_position() {
        let mut attrs = Attributes::default();
        attrs.insert("id", "a".into());
        attrs.insert("title", "t".into());
        attrs.insert("id", "b".into());

        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title"]);
        assert_eq!(attrs.get("id"), Some(&AttrValue::from("b")));
    }

    #[test]
    fn test_multi_value_joined() {
        let value = AttrValue::Multi(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(value.joined(), "x y");
        assert_eq!(value.values().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_remove_attribute() {
        let mut attrs = Attributes::default();
        attrs.insert("a", "1".into());
        assert_eq!(attrs.remove("a"), Some(AttrValue::from("1")));
        assert_eq!(attrs.remove("a"), None);
        assert!(attrs.is_empty());
    }
}

//! Value filters used by [`Query`](super::Query).

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::builder::rules::MarkupRules;
use crate::error::FilterError;
use crate::tree::AttrValue;

/// A test applied to a tag name, an attribute value, or string content.
///
/// Multi-valued attributes (such as `class`) match when any single value
/// matches: `Exact("y")` matches `class="x y"`, `Exact("x y")` does not.
#[derive(Clone)]
pub enum Filter {
    /// String equality.
    Exact(String),
    /// The regex finds a match anywhere in the value.
    Pattern(Regex),
    /// `Present(true)`: the attribute exists. `Present(false)`: it does not.
    Present(bool),
    /// Any of the inner filters matches.
    AnyOf(Vec<Filter>),
    /// A caller-supplied test.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Filter {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compiles `pattern` into a [`Filter::Pattern`].
    ///
    /// # Examples
    ///
    /// ```
    /// use soupkit::Filter;
    ///
    /// assert!(Filter::pattern("^h[1-6]$").unwrap().matches_str("h2"));
    /// assert!(Filter::pattern("(unclosed").is_err());
    /// ```
    pub fn pattern(pattern: &str) -> Result<Self, FilterError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::AnyOf(filters.into_iter().collect())
    }

    pub fn predicate(test: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(test))
    }

    /// Tests a present value.
    pub fn matches_str(&self, value: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == value,
            Self::Pattern(regex) => regex.is_match(value),
            Self::Present(present) => *present,
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches_str(value)),
            Self::Predicate(test) => test(value),
        }
    }

    /// Tests an attribute value, or its absence.
    pub fn matches_value(&self, value: Option<&AttrValue>) -> bool {
        match (self, value) {
            (Self::Present(present), value) => value.is_some() == *present,
            (Self::AnyOf(filters), value) => filters.iter().any(|f| f.matches_value(value)),
            (_, None) => false,
            (_, Some(value)) => value.values().any(|v| self.matches_str(v)),
        }
    }

    /// Tests a tag name. Exact names are folded the way the document folds
    /// its tag names, so `Exact("P")` finds `<p>` in HTML.
    pub(crate) fn matches_name(&self, name: &str, rules: &MarkupRules) -> bool {
        match self {
            Self::Exact(expected) => rules.fold(expected) == name,
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches_name(name, rules)),
            _ => self.matches_str(name),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Present(present) => f.debug_tuple("Present").field(present).finish(),
            Self::AnyOf(filters) => f.debug_tuple("AnyOf").field(filters).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_string())
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

impl From<Regex> for Filter {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl From<bool> for Filter {
    fn from(present: bool) -> Self {
        Self::Present(present)
    }
}

impl<F: Into<Filter>> From<Vec<F>> for Filter {
    fn from(filters: Vec<F>) -> Self {
        Self::AnyOf(filters.into_iter().map(Into::into).collect())
    }
}

//! Backend lookup by name or feature.
//!
//! A [`Backend`] pairs a tokenizer with the markup rules its documents are
//! built under, and advertises a list of feature strings (`"html"`,
//! `"xml"`, `"html.parser"`, ...). Callers ask for features, and the registry
//! returns the first backend that provides all of them.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::error::BuildError;
use crate::tokenizer::{HtmlTokenizer, Tokenizer, XmlTokenizer};

use super::rules::{MarkupRules, HTML_RULES, XML_RULES};

/// A registered tokenizer together with its rules table.
#[derive(Clone)]
pub struct Backend {
    /// Name reported by [`Document::backend`](crate::Document::backend).
    pub name: String,
    /// Feature strings this backend answers to, lower-case.
    pub features: Vec<String>,
    pub rules: &'static MarkupRules,
    pub tokenizer: Arc<dyn Tokenizer>,
}

impl Backend {
    pub fn new(
        name: impl Into<String>,
        features: &[&str],
        rules: &'static MarkupRules,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        Self {
            name: name.into(),
            features: features.iter().map(|f| f.to_ascii_lowercase()).collect(),
            rules,
            tokenizer,
        }
    }

    /// Returns `true` if this backend provides `feature` (ASCII case-insensitive).
    pub fn provides(&self, feature: &str) -> bool {
        self.features
            .iter()
            .any(|f| f.eq_ignore_ascii_case(feature))
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("features", &self.features)
            .field("rules", &self.rules.name)
            .finish_non_exhaustive()
    }
}

/// An ordered set of backends. Earlier registrations win ties.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Backend>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backend, builder style.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.register(backend);
        self
    }

    pub fn register(&mut self, backend: Backend) {
        self.backends.push(backend);
    }

    /// Finds the first backend that provides every feature in `features`.
    /// An empty feature list selects the first registered backend.
    pub fn lookup<S: AsRef<str>>(&self, features: &[S]) -> Result<&Backend, BuildError> {
        self.backends
            .iter()
            .find(|backend| features.iter().all(|f| backend.provides(f.as_ref())))
            .ok_or_else(|| BuildError::BackendUnavailable {
                features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            })
    }

    /// All registered backends in registration order.
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }
}

static DEFAULT_REGISTRY: LazyLock<BackendRegistry> = LazyLock::new(|| {
    BackendRegistry::new()
        .with_backend(Backend::new(
            "html.parser",
            &["html.parser", "html"],
            &HTML_RULES,
            Arc::new(HtmlTokenizer),
        ))
        .with_backend(Backend::new(
            "xml",
            &["xml", "lxml-xml"],
            &XML_RULES,
            Arc::new(XmlTokenizer),
        ))
});

/// The registry holding the bundled HTML and XML backends.
pub fn default_registry() -> &'static BackendRegistry {
    &DEFAULT_REGISTRY
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_features_select_first_backend() {
        let backend = default_registry().lookup::<&str>(&[]).unwrap();
        assert_eq!(backend.name, "html.parser");
    }

    #[test]
    fn test_lookup_by_feature() {
        let registry = default_registry();
        assert_eq!(registry.lookup(&["XML"]).unwrap().name, "xml");
        assert_eq!(registry.lookup(&["lxml-xml"]).unwrap().name, "xml");
        assert_eq!(registry.lookup(&["html"]).unwrap().rules.name, "html");
    }

    #[test]
    fn test_all_features_must_match() {
        let err = default_registry().lookup(&["html", "xml"]).unwrap_err();
        assert_eq!(
            err,
            BuildError::BackendUnavailable {
                features: vec!["html".to_string(), "xml".to_string()]
            }
        );
    }

    #[test]
    fn test_custom_registry_order() {
        let registry = BackendRegistry::new()
            .with_backend(Backend::new("strict", &["xml", "strict"], &XML_RULES, Arc::new(XmlTokenizer)))
            .with_backend(Backend::new("loose", &["xml"], &XML_RULES, Arc::new(XmlTokenizer)));
        assert_eq!(registry.lookup(&["xml"]).unwrap().name, "strict");
        assert_eq!(registry.backends().len(), 2);
        assert!(registry.lookup(&["html"]).is_err());
    }
}

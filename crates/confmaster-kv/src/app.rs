//! Applications and the locator that finds them.
//!
//! References select their target application by namespace and labels. The
//! [`Locator`] trait is the seam to whatever registry holds applications;
//! [`MemoryLocator`] is an in-process registry.

use crate::fallback::Config;
use crate::reference::Labels;
use indexmap::IndexMap;
use thiserror::Error;

/// Mutable application metadata; unlike labels, attributes may change over
/// an application's life.
pub type Attributes = IndexMap<String, String>;

/// Namespace that matches every namespace.
pub const NAMESPACE_ALL: &str = "";

/// An application that owns one config.
pub trait Application {
    fn namespace(&self) -> &str;
    fn labels(&self) -> &Labels;
    fn attributes(&self) -> &Attributes;
    fn config(&self) -> &Config;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("No application matches the selector")]
    NotFound,

    #[error("{count} applications match the selector")]
    Ambiguous { count: usize },
}

/// Finds applications by namespace and labels.
pub trait Locator {
    /// The single application matching the selector.
    fn locate(&self, namespace: Option<&str>, labels: &Labels) -> Result<&dyn Application, LocateError>;

    /// Every application matching the selector and attributes.
    fn search(
        &self,
        namespace: Option<&str>,
        labels: &Labels,
        attributes: &Attributes,
    ) -> Vec<&dyn Application>;
}

#[derive(Debug, Clone)]
pub struct MemoryApplication {
    namespace: String,
    labels: Labels,
    attributes: Attributes,
    config: Config,
}

impl MemoryApplication {
    pub fn new(namespace: impl Into<String>, labels: Labels, config: impl Into<Config>) -> Self {
        Self {
            namespace: namespace.into(),
            labels,
            attributes: Attributes::new(),
            config: config.into(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn set_config(&mut self, config: impl Into<Config>) {
        self.config = config.into();
    }
}

impl Application for MemoryApplication {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    apps: Vec<MemoryApplication>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, app: MemoryApplication) {
        self.apps.push(app);
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn matching<'s>(
        &'s self,
        namespace: Option<&str>,
        labels: &Labels,
    ) -> impl Iterator<Item = &'s MemoryApplication> {
        self.apps.iter().filter(move |app| {
            namespace_matches(namespace, &app.namespace) && subset_of(labels, &app.labels)
        })
    }
}

fn namespace_matches(selector: Option<&str>, namespace: &str) -> bool {
    match selector {
        None | Some(NAMESPACE_ALL) => true,
        Some(ns) => ns == namespace,
    }
}

/// Every selector pair is present in `target` with an equal value.
fn subset_of(selector: &IndexMap<String, String>, target: &IndexMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| target.get(k).is_some_and(|t| t == v))
}

impl Locator for MemoryLocator {
    fn locate(&self, namespace: Option<&str>, labels: &Labels) -> Result<&dyn Application, LocateError> {
        let mut found = self.matching(namespace, labels);
        let Some(first) = found.next() else {
            return Err(LocateError::NotFound);
        };
        let others = found.count();
        if others > 0 {
            return Err(LocateError::Ambiguous { count: others + 1 });
        }
        Ok(first)
    }

    fn search(
        &self,
        namespace: Option<&str>,
        labels: &Labels,
        attributes: &Attributes,
    ) -> Vec<&dyn Application> {
        self.matching(namespace, labels)
            .filter(|app| subset_of(attributes, &app.attributes))
            .map(|app| app as &dyn Application)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ConfigObject;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn locator() -> MemoryLocator {
        let mut locator = MemoryLocator::new();
        locator.register(MemoryApplication::new(
            "prod",
            labels(&[("app", "db"), ("cluster", "1")]),
            ConfigObject::new(),
        ));
        locator.register(
            MemoryApplication::new(
                "prod",
                labels(&[("app", "db"), ("cluster", "2")]),
                ConfigObject::new(),
            )
            .with_attributes(labels(&[("state", "draining")])),
        );
        locator.register(MemoryApplication::new(
            "dev",
            labels(&[("app", "db"), ("cluster", "1")]),
            ConfigObject::new(),
        ));
        locator
    }

    #[test]
    fn test_locate_single() {
        let locator = locator();
        let app = locator
            .locate(Some("prod"), &labels(&[("cluster", "2")]))
            .unwrap();
        assert_eq!(app.labels().get("cluster").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_locate_ambiguous_and_missing() {
        let locator = locator();
        assert_eq!(
            locator.locate(None, &labels(&[("cluster", "1")])).err(),
            Some(LocateError::Ambiguous { count: 2 })
        );
        assert_eq!(
            locator.locate(Some(""), &labels(&[("app", "db")])).err(),
            Some(LocateError::Ambiguous { count: 3 })
        );
        assert_eq!(
            locator.locate(Some("prod"), &labels(&[("app", "web")])).err(),
            Some(LocateError::NotFound)
        );
    }

    #[test]
    fn test_search_with_attributes() {
        let locator = locator();
        let all = locator.search(None, &labels(&[("app", "db")]), &Attributes::new());
        assert_eq!(all.len(), 3);
        let draining = locator.search(
            Some("prod"),
            &labels(&[("app", "db")]),
            &labels(&[("state", "draining")]),
        );
        assert_eq!(draining.len(), 1);
        assert_eq!(draining[0].namespace(), "prod");
    }
}

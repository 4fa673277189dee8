//! One application reusing part of another's config.

use crate::error::Result;
use crate::object::ConfigObject;
use crate::path::ConfigPath;
use crate::reference::{Labels, Reference};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maps the upstream path `source` onto the downstream path `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    pub source: String,
    pub target: String,
}

/// A link from the application selected by `upstream` to the one selected
/// by `downstream`. A useful dependency has at least one mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub upstream: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_namespace: Option<String>,
    pub downstream: Labels,
    #[serde(default)]
    pub mappings: Vec<PathMapping>,
}

impl Dependency {
    /// The reference a mapping writes into the downstream config.
    pub fn reference(&self, mapping: &PathMapping) -> Reference {
        Reference::new(
            self.upstream_namespace.clone(),
            self.upstream.clone(),
            mapping.source.as_str(),
        )
    }

    /// Writes one reference per mapping into the downstream `config`.
    ///
    /// Either every mapping is written or, on the first failure, none is.
    pub fn apply(&self, config: &mut ConfigObject) -> Result<()> {
        let writes = self
            .mappings
            .iter()
            .map(|m| -> Result<(ConfigPath, Value)> {
                Ok((ConfigPath::parse(&m.target)?, Value::Reference(self.reference(m))))
            })
            .collect::<Result<Vec<_>>>()?;
        config.set_many(writes)?;
        debug!(mappings = self.mappings.len(), "applied dependency");
        Ok(())
    }
}

//! Hierarchical, path-addressed configuration values.
//!
//! A config is a [`ConfigObject`]: an ordered tree of strings, exact
//! [`Number`]s, booleans, objects, arrays and [`Reference`]s to values in
//! other applications' configs. Values are read and written by dotted paths
//! such as `servers[0].port`.
//!
//! Configs compose with [`ConfigObject::with_fallback`], are resolved against
//! a [`Locator`] by a [`Resolver`], and are written out through a
//! [`Formatter`].
//!
//! ```rust
//! use confmaster_kv::{ConfigObject, ConfigRead, JsonFormatter, MemoryLocator, Resolver};
//!
//! let primary = ConfigObject::from_json(br#"{"a":"A","b":"B"}"#).unwrap();
//! let fallback = ConfigObject::from_json(br#"{"a":"AAA","c":"CCC"}"#).unwrap();
//! let config = primary.with_fallback(&fallback);
//! assert_eq!(config.get_str("c"), Some("CCC"));
//!
//! let locator = MemoryLocator::new();
//! let resolved = Resolver::new(&locator).resolve(&config).unwrap();
//! let json = resolved.format(&JsonFormatter::default()).unwrap();
//! assert_eq!(json, br#"{"a":"A","b":"B","c":"CCC"}"#);
//! ```

pub mod app;
pub mod array;
pub mod decode;
pub mod definition;
pub mod dependency;
pub mod error;
pub mod fallback;
pub mod format;
pub mod number;
pub mod object;
pub mod path;
pub mod readable;
pub mod reference;
pub mod resolve;
pub mod snapshot;
pub mod value;

pub use app::{
    Application, Attributes, LocateError, Locator, MemoryApplication, MemoryLocator, NAMESPACE_ALL,
};
pub use array::ConfigArray;
pub use decode::decode_tokens;
pub use definition::{Definition, OptionValue, ValueRange};
pub use dependency::{Dependency, PathMapping};
pub use error::{KvError, Result};
pub use fallback::{Config, ConfigFallback};
pub use format::{Formatter, JsonFormatter, PropertiesFormatter, YamlFormatter};
pub use number::Number;
pub use object::ConfigObject;
pub use path::{ConfigPath, PathStep};
pub use readable::ConfigRead;
pub use reference::{Labels, REFERENCE_MARKER, Reference};
pub use resolve::{ResolveOptions, ResolvedConfig, Resolver};
pub use snapshot::{MemorySnapshotStore, Snapshot, SnapshotError, SnapshotStore, VersionToken};
pub use value::{Value, ValueType};

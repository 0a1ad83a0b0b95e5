//! Rule-based translation of TypeScript and Python idioms into Rust
//!
//! A [`Catalog`] holds named rules in priority order. The [`Matcher`] picks
//! the first rule whose trigger accepts a [`SourceNode`], and the
//! [`render`] function fills that rule's template with the node's captures.
//! The [`Translator`] ties these together over parsed fragments.
//!
//! ```ignore
//! use pattern_translator::{Catalog, Translator};
//!
//! let translator = Translator::new(Catalog::builtin()?);
//! let result = translator.translate("raise ValueError(\"Cannot divide by zero\")");
//! assert_eq!(
//!     result.text(),
//!     Some("return Err(Error::ValueError(\"Cannot divide by zero\".to_string()));")
//! );
//! ```

pub mod builtin;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod node;
pub mod parser;
pub mod renderer;
pub mod template;
pub mod translator;

mod integration_tests;

pub use builtin::builtin_rules;
pub use catalog::{Catalog, Condition, Rule, RuleSpec, Trigger};
pub use error::{TranslateError, TranslateResult};
pub use loader::{
    TranslatorConfig, catalog_from_json_str, load_catalog_from_file, load_config_from_file,
};
pub use matcher::{Match, Matcher};
pub use node::{CaptureValue, Captures, NodeKind, SourceNode};
pub use parser::{Parser, parse_fragment, parse_type};
pub use renderer::render;
pub use template::{Template, TemplateNode, Transform};
pub use translator::{FallbackPolicy, Failure, TranslationResult, Translator};

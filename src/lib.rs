//! # raddict: FreeRADIUS dictionary compiler
//!
//! Reads a FreeRADIUS dictionary tree (the `dictionary` file plus everything it
//! `$INCLUDE`s) and generates one Rust module per attribute, together with
//! loader modules that register every attribute by numeric type and by name.
//!
//! ## Pipeline
//!
//! 1. [`DictionaryParser`] matches each line against a pest grammar and builds a
//!    [`Registry`] of vendors, attributes, TLV children and named values.
//! 2. [`Generator`] walks the registry, computes the packed vendor/TLV type
//!    numbers, picks a value kind per attribute and writes the source tree.
//!
//! ## Dictionary grammar
//!
//! ```text
//! VENDOR        Acme  9
//! BEGIN-VENDOR  Acme
//! ATTRIBUTE     Acme-Group  5  tlv
//! BEGIN-TLV     Acme-Group
//! ATTRIBUTE     Acme-Member 2  integer
//! END-TLV       Acme-Group
//! END-VENDOR    Acme
//! VALUE         Acme-Member Gold 1
//! $INCLUDE      dictionary.other
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use raddict::{compile, GeneratorConfig, Namespace, ParseOptions};
//!
//! let config = GeneratorConfig::new(Namespace::parse("radius::dictionary"), "src/generated");
//! let report = compile("/usr/share/freeradius", ParseOptions::default(), config)?;
//! assert!(report.is_clean());
//! # Ok::<(), raddict::ParseError>(())
//! ```

pub mod ast;
pub mod emit;
pub mod encoding;
pub mod generate;
pub mod namespace;
pub mod parser;
pub mod registry;
pub mod sanitize;
pub mod value;

pub use ast::Directive;
pub use generate::{GenerateError, GenerationReport, Generator, GeneratorConfig};
pub use namespace::Namespace;
pub use parser::{parse_line, DictionaryParser, ParseError, ParseOptions};
pub use registry::{AttrValueDescriptor, AttributeDescriptor, Registry, VendorDescriptor};
pub use value::{Shape, ValueKind};

use std::path::PathBuf;

/// Parse the dictionary under `dictionary_dir` and generate the source tree.
///
/// Only parsing can fail; generation problems are reported per artifact.
pub fn compile(
    dictionary_dir: impl Into<PathBuf>,
    options: ParseOptions,
    config: GeneratorConfig,
) -> Result<GenerationReport, ParseError> {
    let registry = DictionaryParser::load(dictionary_dir, options)?;
    tracing::debug!(
        vendors = registry.vendors.len(),
        attributes = registry.attribute_count(),
        "dictionary loaded"
    );
    Ok(Generator::new(config).generate(&registry))
}

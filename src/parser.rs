//! Parse FreeRADIUS dictionary files into a [`Registry`].
//!
//! Each line is matched against the pest grammar in `dictionary.pest` and turned
//! into a [`Directive`]; the [`DictionaryParser`] then applies directives in order, tracking
//! the open vendor and TLV scopes and following `$INCLUDE`s relative to the
//! dictionary root.

use crate::ast::*;
use crate::encoding::{parse_number, parse_value_number, MAX_TLV_CHILD_NUMBER};
use crate::namespace::Namespace;
use crate::registry::{AttributeDescriptor, AttributeMap, Registry, VendorDescriptor};
use indexmap::IndexMap;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

#[derive(PestParser)]
#[grammar = "dictionary.pest"]
struct LineParser;

/// Name of the root dictionary file inside the dictionary directory.
pub const ROOT_DICTIONARY: &str = "dictionary";

/// Extension dictionary that is always merged, from disk if possible.
pub const EXTENSION_DICTIONARY: &str = "dictionary.jradius";

/// Definitions merged when [`EXTENSION_DICTIONARY`] was neither included nor
/// found next to the root dictionary.
pub const BUILTIN_EXTENSION: &str = "\
VENDOR\tJRadius\t19211
ATTRIBUTE\tJRadius-Request-Id\t1\tstring\tJRadius
ATTRIBUTE\tJRadius-Session-Id\t2\tstring\tJRadius
ATTRIBUTE\tJRadius-Proxy-Client\t3\toctets\tJRadius
";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Include {file}: {source}")]
    Include {
        file: String,
        #[source]
        source: Box<ParseError>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Fail on an unreadable `$INCLUDE` instead of warning and continuing.
    pub strict_includes: bool,
    /// Merge the extension dictionary when the grammar did not include it.
    pub extension: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict_includes: false,
            extension: true,
        }
    }
}

/// Where a directive came from, for log output.
#[derive(Debug, Clone)]
struct Location {
    file: String,
    line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Parse one dictionary line. Comments and blank lines give `Ok(None)`;
/// unknown or incomplete directives give `Err`.
pub fn parse_line(line: &str) -> Result<Option<Directive>, String> {
    let pairs = LineParser::parse(Rule::line, line.trim())
        .map_err(|e| format!("Parse error: {}", e))?;
    let line_pair = pairs.into_iter().next().ok_or("Empty parse")?;
    match line_pair.into_inner().find(|p| p.as_rule() != Rule::EOI) {
        Some(pair) => build_directive(pair),
        None => Ok(None),
    }
}

fn build_directive(pair: pest::iterators::Pair<Rule>) -> Result<Option<Directive>, String> {
    let rule = pair.as_rule();
    let inner: Vec<_> = pair.into_inner().collect();
    let optional = inner.iter().any(|t| t.as_rule() == Rule::optional);
    let mut tokens = inner
        .into_iter()
        .filter(|t| t.as_rule() == Rule::token)
        .map(|t| t.as_str().to_string());
    let directive = match rule {
        Rule::comment => return Ok(None),
        Rule::include => Directive::Include {
            path: tokens.next().ok_or("$INCLUDE: path")?,
            optional,
        },
        Rule::begin_tlv => Directive::BeginTlv(tokens.next().ok_or("BEGIN-TLV: name")?),
        Rule::end_tlv => Directive::EndTlv(tokens.next()),
        Rule::begin_vendor => Directive::BeginVendor(tokens.next().ok_or("BEGIN-VENDOR: name")?),
        Rule::end_vendor => Directive::EndVendor(tokens.next()),
        Rule::vendor => Directive::Vendor(VendorDef {
            name: tokens.next().ok_or("VENDOR: name")?,
            number: tokens.next().ok_or("VENDOR: number")?,
            extra: tokens.next(),
        }),
        Rule::attribute => Directive::Attribute(AttributeDef {
            name: tokens.next().ok_or("ATTRIBUTE: name")?,
            number: tokens.next().ok_or("ATTRIBUTE: number")?,
            type_tag: tokens.next().ok_or("ATTRIBUTE: type")?,
            trailing: tokens.collect(),
        }),
        Rule::value => Directive::Value(ValueDef {
            attribute: tokens.next().ok_or("VALUE: attribute")?,
            name: tokens.next().ok_or("VALUE: name")?,
            number: tokens.next().ok_or("VALUE: number")?,
        }),
        other => return Err(format!("unexpected rule: {:?}", other)),
    };
    Ok(Some(directive))
}

/// Stateful dictionary reader. Owns the registry until [`DictionaryParser::finish`].
#[derive(Debug)]
pub struct DictionaryParser {
    root: PathBuf,
    options: ParseOptions,
    registry: Registry,
    /// Lowercased attribute names already defined; first definition wins.
    seen_names: HashSet<String>,
    current_vendor: Option<String>,
    current_tlv: Option<String>,
    seen_extension: bool,
    include_stack: Vec<PathBuf>,
}

impl DictionaryParser {
    /// New parser resolving includes relative to `root`.
    pub fn new(root: impl Into<PathBuf>, options: ParseOptions) -> Self {
        DictionaryParser {
            root: root.into(),
            options,
            registry: Registry::default(),
            seen_names: HashSet::new(),
            current_vendor: None,
            current_tlv: None,
            seen_extension: false,
            include_stack: Vec::new(),
        }
    }

    /// Parse `<root>/dictionary`, merge the extension dictionary and return the registry.
    pub fn load(root: impl Into<PathBuf>, options: ParseOptions) -> Result<Registry, ParseError> {
        let mut parser = DictionaryParser::new(root, options);
        parser.parse_file(ROOT_DICTIONARY)?;
        Ok(parser.finish())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registry built so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse a file relative to the dictionary root.
    pub fn parse_file(&mut self, file: &str) -> Result<(), ParseError> {
        let path = self.root.join(file);
        let source = fs_err::read_to_string(&path)?;
        self.include_stack.push(path);
        let result = self.parse_source(&source, file);
        self.include_stack.pop();
        result
    }

    /// Parse dictionary text that did not come from a file.
    pub fn parse_str(&mut self, source: &str) -> Result<(), ParseError> {
        self.parse_source(source, "<string>")
    }

    fn parse_source(&mut self, source: &str, file: &str) -> Result<(), ParseError> {
        for (i, line) in source.lines().enumerate() {
            let at = Location {
                file: file.to_string(),
                line: i + 1,
            };
            match parse_line(line) {
                Ok(Some(directive)) => {
                    trace!(location = %at, "{}", directive.keyword());
                    self.apply(directive, &at)?
                }
                Ok(None) => {}
                Err(e) => trace!(location = %at, error = %e, "ignoring line"),
            }
        }
        Ok(())
    }

    /// Merge the extension dictionary if needed and hand over the registry.
    pub fn finish(mut self) -> Registry {
        if self.options.extension && !self.seen_extension {
            if let Err(e) = self.parse_file(EXTENSION_DICTIONARY) {
                warn!(
                    error = %e,
                    "{} was not included and could not be read; merging built-in definitions",
                    EXTENSION_DICTIONARY
                );
                if let Err(e) = self.parse_source(BUILTIN_EXTENSION, "<built-in>") {
                    warn!(error = %e, "built-in extension dictionary failed to parse");
                }
            }
        }
        self.registry
    }

    fn apply(&mut self, directive: Directive, at: &Location) -> Result<(), ParseError> {
        match directive {
            Directive::Include { path, optional } => return self.include(&path, optional, at),
            Directive::BeginTlv(name) => {
                if let Some(open) = &self.current_tlv {
                    warn!(location = %at, open = %open, "BEGIN-TLV {} while TLV scope is open", name);
                }
                self.current_tlv = Some(name);
            }
            Directive::EndTlv(name) => {
                check_scope_end(&self.current_tlv, name.as_deref(), "END-TLV", at);
                self.current_tlv = None;
            }
            Directive::BeginVendor(name) => {
                if let Some(open) = &self.current_vendor {
                    warn!(location = %at, open = %open, "BEGIN-VENDOR {} while vendor scope is open", name);
                }
                self.current_vendor = Some(name);
            }
            Directive::EndVendor(name) => {
                check_scope_end(&self.current_vendor, name.as_deref(), "END-VENDOR", at);
                self.current_vendor = None;
            }
            Directive::Vendor(def) => self.define_vendor(def, at),
            Directive::Attribute(def) => self.define_attribute(def, at),
            Directive::Value(def) => self.define_value(def, at),
        }
        Ok(())
    }

    fn include(&mut self, file: &str, optional: bool, at: &Location) -> Result<(), ParseError> {
        let path = self.root.join(file);
        if self.include_stack.contains(&path) {
            warn!(location = %at, "skipping recursive include of {}", file);
            return Ok(());
        }
        if optional && !path.exists() {
            debug!(location = %at, "optional include {} not present", file);
            return Ok(());
        }
        info!("Including file: {}", file);
        match self.parse_file(file) {
            Ok(()) => {
                if file == EXTENSION_DICTIONARY {
                    self.seen_extension = true;
                }
                Ok(())
            }
            Err(e) if self.options.strict_includes => Err(ParseError::Include {
                file: file.to_string(),
                source: Box::new(e),
            }),
            Err(e) => {
                warn!(location = %at, error = %e, "could not include {}", file);
                Ok(())
            }
        }
    }

    fn define_vendor(&mut self, def: VendorDef, at: &Location) {
        let Some(number) = parse_number(&def.number) else {
            debug!(location = %at, "VENDOR {}: bad number {:?}", def.name, def.number);
            return;
        };
        let namespace = Namespace::for_vendor(&def.name);
        match self.registry.vendors.get_mut(&def.name) {
            Some(existing) => {
                debug!(location = %at, "VENDOR {} redefined", def.name);
                existing.number = number;
                existing.namespace = namespace;
                existing.extra = def.extra;
            }
            None => {
                self.registry.vendors.insert(
                    def.name.clone(),
                    VendorDescriptor {
                        name: def.name,
                        number,
                        namespace,
                        extra: def.extra,
                        attributes: AttributeMap::new(),
                    },
                );
            }
        }
    }

    fn define_attribute(&mut self, def: AttributeDef, at: &Location) {
        let Some(number) = parse_number(&def.number) else {
            debug!(location = %at, "ATTRIBUTE {}: bad number {:?}", def.name, def.number);
            return;
        };
        let key = def.name.to_lowercase();
        if self.seen_names.contains(&key) {
            debug!(location = %at, "ATTRIBUTE {} already defined; keeping the first", def.name);
            return;
        }

        if self.current_tlv.is_some() && number > MAX_TLV_CHILD_NUMBER {
            warn!(location = %at, "ATTRIBUTE {}: TLV child number {} does not fit the nested type", def.name, number);
            return;
        }

        let mut vendor = None;
        let mut extra = None;
        for token in def.trailing {
            if self.registry.vendors.contains_key(&token) {
                vendor = Some(token);
            } else {
                extra = Some(token);
            }
        }
        if vendor.is_none() {
            if let Some(open) = &self.current_vendor {
                if self.registry.vendors.contains_key(open) {
                    vendor = Some(open.clone());
                } else {
                    warn!(location = %at, "ATTRIBUTE {}: vendor scope {} was never declared", def.name, open);
                }
            }
        }

        let map = match target_map(
            &mut self.registry,
            vendor.as_deref(),
            self.current_tlv.as_deref(),
        ) {
            Some(map) => map,
            None => {
                warn!(
                    location = %at,
                    "ATTRIBUTE {}: TLV parent {} not found",
                    def.name,
                    self.current_tlv.as_deref().unwrap_or_default()
                );
                return;
            }
        };
        debug!("Seen = {}", def.name);
        map.insert(
            def.name.clone(),
            AttributeDescriptor::new(def.name, number, def.type_tag, extra, vendor),
        );
        self.seen_names.insert(key);
    }

    fn define_value(&mut self, def: ValueDef, at: &Location) {
        let Some(number) = parse_value_number(&def.number) else {
            debug!(location = %at, "VALUE {} {}: bad number {:?}", def.attribute, def.name, def.number);
            return;
        };
        let attr = match self.registry.attributes.get_mut(&def.attribute) {
            Some(attr) => Some(attr),
            None => match &self.current_vendor {
                Some(vendor) => self
                    .registry
                    .vendors
                    .get_mut(vendor)
                    .and_then(|v| v.attributes.get_mut(&def.attribute)),
                None => None,
            },
        };
        match attr {
            Some(attr) => attr.add_value(&def.name, number),
            None => debug!(location = %at, "VALUE for unknown attribute {} dropped", def.attribute),
        }
    }
}

/// Map a new attribute goes into: the vendor's (or top-level) map, or the
/// TLV parent's children when a TLV scope is open.
fn target_map<'a>(
    registry: &'a mut Registry,
    vendor: Option<&str>,
    tlv: Option<&str>,
) -> Option<&'a mut AttributeMap> {
    let map = match vendor {
        Some(name) => &mut registry.vendors.get_mut(name)?.attributes,
        None => &mut registry.attributes,
    };
    match tlv {
        Some(parent) => Some(
            map.get_mut(parent)?
                .sub_attributes
                .get_or_insert_with(IndexMap::new),
        ),
        None => Some(map),
    }
}

fn check_scope_end(open: &Option<String>, closing: Option<&str>, keyword: &str, at: &Location) {
    match (open, closing) {
        (None, _) => warn!(location = %at, "{} with no open scope", keyword),
        (Some(open), Some(closing)) if open != closing => {
            warn!(location = %at, open = %open, "{} {} does not match open scope", keyword, closing)
        }
        _ => {}
    }
}

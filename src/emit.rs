//! Render generated Rust source: one module per attribute and one loader
//! (`mod.rs`) per namespace.
//!
//! Generated code targets a runtime crate given by path (`runtime`), which
//! provides the attribute shapes, value containers and dictionary traits.

use crate::encoding::{TypeIds, MAX_WIRE_TYPE, VENDOR_SPECIFIC_TYPE};
use crate::registry::AttributeDescriptor;
use crate::sanitize::{rust_ident, sanitize};
use crate::value::{Shape, ValueKind};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::{self, Write};

/// Associated items every generated attribute may define; value aliases must not reuse them.
const RESERVED_ITEMS: &[&str] = &[
    "NAME", "TYPE", "VENDOR_ID", "VSA_TYPE", "PARENT_TYPE", "setup", "create",
];

/// Banner at the top of every generated file.
pub fn header(generated_on: &str) -> String {
    format!(
        "// DO NOT EDIT THIS FILE DIRECTLY! - AUTOMATICALLY GENERATED\n\
         // Generated by: {} {}\n\
         // Generated on: {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        generated_on
    )
}

/// Everything needed to render one attribute module.
#[derive(Debug)]
pub struct AttributeArtifact<'a> {
    pub attribute: &'a AttributeDescriptor,
    pub type_name: String,
    pub shape: Shape,
    pub kind: ValueKind,
    pub ids: TypeIds,
    /// Value written to `attribute_type`: 26 for vendor attributes, the
    /// attribute's own number otherwise.
    pub attribute_type: u32,
    /// Parent type for TLV children, as seen from the child module.
    pub parent: Option<String>,
    /// Vendor `format=` override.
    pub format: Option<&'a str>,
    /// Modules of TLV children that were generated.
    pub child_modules: Vec<String>,
}

/// One entry of a loader's registration tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub key: u64,
    /// Module path from the loader to the attribute module.
    pub path: Vec<String>,
    pub type_name: String,
}

impl Registration {
    /// `attr_a::attr_b::Attr_B`
    pub fn type_path(&self) -> String {
        let mut path: Vec<String> = self.path.iter().map(|s| rust_ident(s)).collect();
        path.push(self.type_name.clone());
        path.join("::")
    }
}

/// Vendor namespaces below a loader. Vendor nodes have their own `mod.rs`;
/// other nodes are intermediate path segments rendered as inline modules.
#[derive(Debug, Default, Clone)]
pub struct ModuleTree {
    pub children: IndexMap<String, ModuleTree>,
    pub is_loader: bool,
}

impl ModuleTree {
    pub fn insert(&mut self, segments: &[String]) {
        match segments.split_first() {
            Some((first, rest)) => self
                .children
                .entry(first.clone())
                .or_default()
                .insert(rest),
            None => self.is_loader = true,
        }
    }

    pub fn node(&self, segments: &[String]) -> Option<&ModuleTree> {
        match segments.split_first() {
            Some((first, rest)) => self.children.get(first)?.node(rest),
            None => Some(self),
        }
    }
}

#[derive(Debug)]
pub enum LoaderKind<'a> {
    /// Root loader; `vendor_codes` maps vendor ids to vendor loader module paths.
    Root { vendor_codes: Vec<(u32, Vec<String>)> },
    Vendor { vendor_name: &'a str },
}

#[derive(Debug)]
pub struct LoaderArtifact<'a> {
    pub namespace: String,
    pub kind: LoaderKind<'a>,
    pub registrations: Vec<Registration>,
    pub vendor_modules: Option<&'a ModuleTree>,
}

pub fn render_attribute(artifact: &AttributeArtifact<'_>, runtime: &str, generated_on: &str) -> Result<String, fmt::Error> {
    let attr = artifact.attribute;
    let kind = artifact.kind;
    let mut out = header(generated_on);
    writeln!(out)?;
    write_attribute_docs(&mut out, artifact)?;
    writeln!(out)?;
    writeln!(out, "#![allow(non_camel_case_types, non_upper_case_globals)]")?;
    writeln!(out)?;
    match kind {
        ValueKind::Named { .. } => {
            writeln!(out, "use {}::value::{{NamedValue, NamedValueMap}};", runtime)?
        }
        other => writeln!(out, "use {}::value::{};", runtime, other.type_name())?,
    }
    writeln!(out, "use {}::{{Attribute, {}}};", runtime, artifact.shape.type_name())?;
    writeln!(out)?;
    if !artifact.child_modules.is_empty() {
        for module in &artifact.child_modules {
            writeln!(out, "pub mod {};", rust_ident(module))?;
        }
        writeln!(out)?;
    }

    let ty = &artifact.type_name;
    writeln!(out, "pub struct {};", ty)?;
    writeln!(out)?;
    writeln!(out, "impl {} {{", ty)?;
    writeln!(out, "    pub const NAME: &'static str = {:?};", attr.name)?;
    match artifact.ids {
        TypeIds::Plain { type_id } => {
            writeln!(out, "    pub const TYPE: u64 = {};", type_id)?;
        }
        TypeIds::Vendor {
            vendor_id,
            vsa_type,
            type_id,
        } => {
            writeln!(out, "    pub const VENDOR_ID: u32 = {};", vendor_id)?;
            writeln!(out, "    pub const VSA_TYPE: u32 = {};", vsa_type)?;
            writeln!(out, "    pub const TYPE: u64 = {};", type_id)?;
        }
        TypeIds::Nested {
            vendor_id,
            parent_type,
            vsa_type,
            type_id,
        } => {
            writeln!(out, "    pub const VENDOR_ID: u32 = {};", vendor_id)?;
            writeln!(out, "    pub const PARENT_TYPE: u32 = {};", parent_type)?;
            writeln!(out, "    pub const VSA_TYPE: u32 = {};", vsa_type)?;
            writeln!(out, "    pub const TYPE: u64 = {};", type_id)?;
        }
    }
    if let Some(values) = &attr.values {
        writeln!(out)?;
        let mut emitted: HashSet<String> = RESERVED_ITEMS.iter().map(|s| s.to_string()).collect();
        for value in values.values() {
            for name in &value.names {
                let ident = rust_ident(&sanitize(name));
                if emitted.insert(ident.clone()) {
                    writeln!(out, "    pub const {}: i64 = {};", ident, value.number)?;
                }
            }
        }
    }
    writeln!(out)?;
    write_setup(&mut out, artifact)?;
    writeln!(out)?;
    writeln!(out, "    pub fn create() -> Box<dyn Attribute> {{")?;
    writeln!(out, "        Box::new(Self::setup())")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;

    // Only named values read the table; a TLV container keeps its alias consts.
    if let (ValueKind::Named { .. }, Some(values)) = (kind, &attr.values) {
        writeln!(out)?;
        writeln!(out, "pub static NAMED_VALUES: NamedValueMap = NamedValueMap {{")?;
        let known: Vec<String> = values.keys().map(|n| n.to_string()).collect();
        writeln!(out, "    known_values: &[{}],", known.join(", "))?;
        writeln!(out, "    by_name: &[")?;
        for value in values.values() {
            for name in &value.names {
                writeln!(out, "        ({:?}, {}),", name, value.number)?;
            }
        }
        writeln!(out, "    ],")?;
        writeln!(out, "    by_value: &[")?;
        for value in values.values() {
            if let Some(name) = value.canonical_name() {
                writeln!(out, "        ({}, {:?}),", value.number, name)?;
            }
        }
        writeln!(out, "    ],")?;
        writeln!(out, "}};")?;
    }
    Ok(out)
}

fn write_attribute_docs(out: &mut String, artifact: &AttributeArtifact<'_>) -> fmt::Result {
    let attr = artifact.attribute;
    writeln!(out, "//! Attribute Name: {}", attr.name)?;
    match artifact.ids {
        TypeIds::Plain { type_id } => {
            if type_id > MAX_WIRE_TYPE {
                writeln!(out, "//! Attribute Type: {} (FreeRADIUS Internal Attribute)", type_id)?;
            } else {
                writeln!(out, "//! Attribute Type: {}", type_id)?;
            }
        }
        TypeIds::Vendor { vendor_id, .. } | TypeIds::Nested { vendor_id, .. } => {
            writeln!(out, "//! Attribute Type: {}", VENDOR_SPECIFIC_TYPE)?;
            writeln!(out, "//! Vendor Id: {}", vendor_id)?;
            writeln!(out, "//! VSA Type: {}", attr.number)?;
        }
    }
    writeln!(out, "//! Value Type: {}", artifact.kind.type_name())?;
    if let Some(values) = &attr.values {
        writeln!(out, "//!")?;
        writeln!(out, "//! Possible Values:")?;
        for value in values.values() {
            for name in &value.names {
                writeln!(out, "//! - {} ({})", name, value.number)?;
            }
        }
    }
    Ok(())
}

fn write_setup(out: &mut String, artifact: &AttributeArtifact<'_>) -> fmt::Result {
    let shape = artifact.shape.type_name();
    writeln!(out, "    pub fn setup() -> {} {{", shape)?;
    writeln!(out, "        let mut attribute = {}::default();", shape)?;
    writeln!(out, "        attribute.attribute_name = Self::NAME;")?;
    writeln!(out, "        attribute.attribute_type = {};", artifact.attribute_type)?;
    if artifact.shape.is_vendor_specific() {
        writeln!(out, "        attribute.vendor_id = Self::VENDOR_ID;")?;
        writeln!(out, "        attribute.vsa_attribute_type = Self::VSA_TYPE;")?;
    }
    if let Some(parent) = &artifact.parent {
        writeln!(out, "        attribute.parent = Some({}::create);", parent)?;
    }
    if let Some(format) = artifact.format {
        writeln!(out, "        attribute.set_format({:?});", format)?;
    }
    let value_type = artifact.kind.type_name();
    let constructor = match artifact.kind {
        ValueKind::Named { .. } => format!("{}::new(&NAMED_VALUES)", value_type),
        ValueKind::Tlv => format!("{}::new(Self::VENDOR_ID, Self::VSA_TYPE)", value_type),
        _ => format!("{}::new()", value_type),
    };
    match artifact.kind.integer_width() {
        Some(width) if width < 4 => {
            writeln!(out, "        let mut value = {};", constructor)?;
            writeln!(out, "        value.set_length({});", width)?;
        }
        _ => writeln!(out, "        let value = {};", constructor)?,
    }
    writeln!(out, "        attribute.attribute_value = Box::new(value);")?;
    writeln!(out, "        attribute")?;
    writeln!(out, "    }}")
}

pub fn render_loader(loader: &LoaderArtifact<'_>, runtime: &str, generated_on: &str) -> Result<String, fmt::Error> {
    let mut out = header(generated_on);
    writeln!(out)?;
    writeln!(out, "//! Dictionary for namespace {}", loader.namespace)?;
    writeln!(out)?;

    let mut declared = false;
    for registration in loader.registrations.iter().filter(|r| r.path.len() == 1) {
        writeln!(out, "pub mod {};", rust_ident(&registration.path[0]))?;
        declared = true;
    }
    if let Some(tree) = loader.vendor_modules {
        declared |= !tree.children.is_empty();
        write_module_tree(&mut out, tree, 0)?;
    }
    if declared {
        writeln!(out)?;
    }

    writeln!(out, "use std::collections::HashMap;")?;
    match loader.kind {
        LoaderKind::Root { .. } => writeln!(
            out,
            "use {}::{{AttributeDictionary, AttributeFactory, VSADictionary}};",
            runtime
        )?,
        LoaderKind::Vendor { .. } => {
            writeln!(out, "use {}::{{AttributeFactory, VSADictionary}};", runtime)?
        }
    }
    writeln!(out)?;

    match &loader.kind {
        LoaderKind::Root { vendor_codes } => {
            writeln!(out, "pub struct AttributeDictionaryImpl;")?;
            writeln!(out)?;
            writeln!(out, "impl AttributeDictionary for AttributeDictionaryImpl {{")?;
            writeln!(
                out,
                "    fn load_vendor_codes(&self, map: &mut HashMap<u32, &'static dyn VSADictionary>) {{"
            )?;
            for (vendor_id, path) in vendor_codes {
                let mut path: Vec<String> = path.iter().map(|s| rust_ident(s)).collect();
                path.push("VSADictionaryImpl".to_string());
                writeln!(out, "        map.insert({}, &{});", vendor_id, path.join("::"))?;
            }
            writeln!(out, "    }}")?;
            writeln!(out)?;
        }
        LoaderKind::Vendor { vendor_name } => {
            writeln!(out, "pub struct VSADictionaryImpl;")?;
            writeln!(out)?;
            writeln!(out, "impl VSADictionary for VSADictionaryImpl {{")?;
            writeln!(out, "    fn vendor_name(&self) -> &'static str {{")?;
            writeln!(out, "        {:?}", vendor_name)?;
            writeln!(out, "    }}")?;
            writeln!(out)?;
        }
    }

    writeln!(out, "    fn load_attributes(&self, map: &mut HashMap<u64, AttributeFactory>) {{")?;
    for registration in &loader.registrations {
        writeln!(
            out,
            "        map.insert({}, {}::create);",
            registration.key,
            registration.type_path()
        )?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(
        out,
        "    fn load_attributes_names(&self, map: &mut HashMap<&'static str, AttributeFactory>) {{"
    )?;
    for registration in &loader.registrations {
        let path = registration.type_path();
        writeln!(out, "        map.insert({}::NAME, {}::create);", path, path)?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(out)
}

fn write_module_tree(out: &mut String, tree: &ModuleTree, depth: usize) -> fmt::Result {
    let pad = "    ".repeat(depth);
    for (name, child) in &tree.children {
        let ident = rust_ident(name);
        if child.is_loader {
            writeln!(out, "{}pub mod {};", pad, ident)?;
        } else {
            writeln!(out, "{}pub mod {} {{", pad, ident)?;
            write_module_tree(out, child, depth + 1)?;
            writeln!(out, "{}}}", pad)?;
        }
    }
    Ok(())
}

//! Abstract Syntax Tree for one line of the FreeRADIUS dictionary grammar.
//!
//! The grammar is line oriented: every meaningful line is exactly one directive.
//! Comments and blank lines have no AST node.

/// One recognized dictionary directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `$INCLUDE <path>` or `$INCLUDE- <path>`: path relative to the dictionary
    /// root. The `-` form may name a file that does not exist.
    Include { path: String, optional: bool },
    /// `BEGIN-TLV <parent> [...]`
    BeginTlv(String),
    /// `END-TLV [parent [...]]`
    EndTlv(Option<String>),
    /// `BEGIN-VENDOR <vendor> [format=...]`
    BeginVendor(String),
    /// `END-VENDOR [vendor [...]]`
    EndVendor(Option<String>),
    Vendor(VendorDef),
    Attribute(AttributeDef),
    Value(ValueDef),
}

/// `VENDOR <name> <number> [<extra>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorDef {
    pub name: String,
    pub number: String,
    pub extra: Option<String>,
}

/// `ATTRIBUTE <name> <number> <type> [<vendor-or-extra> ...]`
///
/// Trailing tokens stay unresolved here; whether a token names a vendor depends
/// on parser state (previously declared vendors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    pub number: String,
    pub type_tag: String,
    pub trailing: Vec<String>,
}

/// `VALUE <attribute> <value-name> <number>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDef {
    pub attribute: String,
    pub name: String,
    pub number: String,
}

impl Directive {
    /// Keyword as written in dictionaries, for log output.
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::Include { optional: false, .. } => "$INCLUDE",
            Directive::Include { optional: true, .. } => "$INCLUDE-",
            Directive::BeginTlv(_) => "BEGIN-TLV",
            Directive::EndTlv(_) => "END-TLV",
            Directive::BeginVendor(_) => "BEGIN-VENDOR",
            Directive::EndVendor(_) => "END-VENDOR",
            Directive::Vendor(_) => "VENDOR",
            Directive::Attribute(_) => "ATTRIBUTE",
            Directive::Value(_) => "VALUE",
        }
    }
}

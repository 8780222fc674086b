//! In-memory model of a parsed dictionary: vendors, attributes, TLV children and
//! named values. Built by [`crate::parser::DictionaryParser`], read by the generator.

use crate::namespace::Namespace;
use indexmap::IndexMap;

/// Attributes keyed by name, in declaration order.
pub type AttributeMap = IndexMap<String, AttributeDescriptor>;

/// Everything declared by a dictionary and its includes.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Attributes with no vendor.
    pub attributes: AttributeMap,
    /// Vendors keyed by name (case-sensitive), in declaration order.
    pub vendors: IndexMap<String, VendorDescriptor>,
}

#[derive(Debug, Clone)]
pub struct VendorDescriptor {
    pub name: String,
    pub number: u32,
    /// Namespace relative to the generation root (`vsa_...`).
    pub namespace: Namespace,
    pub extra: Option<String>,
    pub attributes: AttributeMap,
}

#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    pub name: String,
    pub number: u32,
    pub type_tag: String,
    pub extra: Option<String>,
    pub vendor: Option<String>,
    /// Named values keyed by number; created on the first VALUE.
    pub values: Option<IndexMap<i64, AttrValueDescriptor>>,
    /// TLV children; created on the first child.
    pub sub_attributes: Option<AttributeMap>,
}

/// All names given to one enumeration number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValueDescriptor {
    pub number: i64,
    /// Aliases in declaration order, no duplicates.
    pub names: Vec<String>,
}

impl Registry {
    pub fn vendor(&self, name: &str) -> Option<&VendorDescriptor> {
        self.vendors.get(name)
    }

    /// Find an attribute anywhere (top level, vendor maps, TLV children),
    /// comparing names case-insensitively.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        fn search<'a>(map: &'a AttributeMap, name: &str) -> Option<&'a AttributeDescriptor> {
            for attr in map.values() {
                if attr.name.eq_ignore_ascii_case(name) {
                    return Some(attr);
                }
                if let Some(found) = attr.sub_attributes.as_ref().and_then(|m| search(m, name)) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.attributes, name)
            .or_else(|| self.vendors.values().find_map(|v| search(&v.attributes, name)))
    }

    /// Number of attribute descriptors, TLV children included.
    pub fn attribute_count(&self) -> usize {
        fn count(map: &AttributeMap) -> usize {
            map.values()
                .map(|a| 1 + a.sub_attributes.as_ref().map_or(0, count))
                .sum()
        }
        count(&self.attributes) + self.vendors.values().map(|v| count(&v.attributes)).sum::<usize>()
    }
}

impl VendorDescriptor {
    /// Custom wire format from a `format=<layout>` extra, e.g. `format=2,1`.
    pub fn format(&self) -> Option<&str> {
        self.extra.as_deref().and_then(|e| e.strip_prefix("format="))
    }
}

impl AttributeDescriptor {
    pub fn new(
        name: impl Into<String>,
        number: u32,
        type_tag: impl Into<String>,
        extra: Option<String>,
        vendor: Option<String>,
    ) -> Self {
        AttributeDescriptor {
            name: name.into(),
            number,
            type_tag: type_tag.into(),
            extra,
            vendor,
            values: None,
            sub_attributes: None,
        }
    }

    /// Merge one VALUE alias into the enumeration.
    pub fn add_value(&mut self, name: &str, number: i64) {
        let values = self.values.get_or_insert_with(IndexMap::new);
        values
            .entry(number)
            .or_insert_with(|| AttrValueDescriptor { number, names: Vec::new() })
            .add_name(name);
    }

    /// Whether the extra flags (comma separated) contain `flag`.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.extra
            .as_deref()
            .is_some_and(|e| e.split(',').any(|f| f.trim() == flag))
    }

    pub fn has_sub_attributes(&self) -> bool {
        self.sub_attributes.as_ref().is_some_and(|m| !m.is_empty())
    }
}

impl AttrValueDescriptor {
    pub fn add_name(&mut self, name: &str) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    /// Alias used for number → name lookups: the last one added.
    pub fn canonical_name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_aliases_accumulate_and_dedup() {
        let mut attr = AttributeDescriptor::new("Service-Type", 6, "integer", None, None);
        attr.add_value("Login-User", 1);
        attr.add_value("Login", 1);
        attr.add_value("Login-User", 1);
        attr.add_value("Framed-User", 2);
        let values = attr.values.as_ref().expect("values");
        assert_eq!(values.len(), 2);
        let one = &values[&1i64];
        assert_eq!(one.names, vec!["Login-User", "Login"]);
        assert_eq!(one.canonical_name(), Some("Login"));
    }

    #[test]
    fn extra_flags() {
        let attr = AttributeDescriptor::new("User-Password", 2, "string", Some("encrypt=1,has_tag".into()), None);
        assert!(attr.has_flag("encrypt=1"));
        assert!(attr.has_flag("has_tag"));
        assert!(!attr.has_flag("encrypt=2"));
    }

    #[test]
    fn vendor_format() {
        let mut v = VendorDescriptor {
            name: "USR".into(),
            number: 429,
            namespace: Namespace::for_vendor("USR"),
            extra: Some("format=4,0".into()),
            attributes: AttributeMap::new(),
        };
        assert_eq!(v.format(), Some("4,0"));
        v.extra = Some("other".into());
        assert_eq!(v.format(), None);
    }
}

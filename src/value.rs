//! Value representation and structural shape of a generated attribute.

use crate::registry::AttributeDescriptor;

/// Runtime value container a generated attribute is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    EncryptedString,
    /// `width` in bytes: 4 (`integer`, `signed`), 2 (`short`) or 1 (`byte`).
    Integer { width: u8, signed: bool },
    Date,
    IpAddr,
    Ipv6Addr,
    ComboIpAddr,
    Octets,
    /// Enumerated integer; keeps the declared width.
    Named { width: u8 },
    /// Container for TLV children.
    Tlv,
}

/// Runtime attribute type a generated attribute is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Plain top-level attribute.
    Attribute,
    /// Vendor-specific leaf attribute (inside attribute 26).
    VendorSpecific,
    /// Vendor-specific attribute carrying TLV children.
    VsaWithSubAttributes,
    /// TLV child of another attribute.
    SubAttribute,
}

/// Prefix table on the declared type tag; first match wins.
const TYPE_TABLE: &[(&str, ValueKind)] = &[
    ("string", ValueKind::String),
    ("integer", ValueKind::Integer { width: 4, signed: false }),
    ("byte", ValueKind::Integer { width: 1, signed: false }),
    ("short", ValueKind::Integer { width: 2, signed: false }),
    ("signed", ValueKind::Integer { width: 4, signed: true }),
    ("date", ValueKind::Date),
    ("ipaddr", ValueKind::IpAddr),
    ("ipv6addr", ValueKind::Ipv6Addr),
    ("combo-ip", ValueKind::ComboIpAddr),
];

impl ValueKind {
    /// Select the value kind for an attribute. Sub-attributes force [`ValueKind::Tlv`],
    /// named values force [`ValueKind::Named`], otherwise the type table decides
    /// and unknown tags fall back to [`ValueKind::Octets`].
    pub fn for_attribute(attr: &AttributeDescriptor) -> ValueKind {
        if attr.has_sub_attributes() {
            return ValueKind::Tlv;
        }
        let declared = TYPE_TABLE
            .iter()
            .find(|(prefix, _)| attr.type_tag.starts_with(*prefix))
            .map(|(_, kind)| *kind)
            .unwrap_or(ValueKind::Octets);
        if attr.values.is_some() {
            return ValueKind::Named {
                width: declared.integer_width().unwrap_or(4),
            };
        }
        match declared {
            ValueKind::String if attr.has_flag("encrypt=1") => ValueKind::EncryptedString,
            other => other,
        }
    }

    /// Runtime type name under `<runtime>::value`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::String => "StringValue",
            ValueKind::EncryptedString => "EncryptedStringValue",
            ValueKind::Integer { signed: false, .. } => "IntegerValue",
            ValueKind::Integer { signed: true, .. } => "SignedValue",
            ValueKind::Date => "DateValue",
            ValueKind::IpAddr => "IPAddrValue",
            ValueKind::Ipv6Addr => "IPv6AddrValue",
            ValueKind::ComboIpAddr => "ComboIPAddrValue",
            ValueKind::Octets => "OctetsValue",
            ValueKind::Named { .. } => "NamedValue",
            ValueKind::Tlv => "TLVValue",
        }
    }

    pub fn integer_width(&self) -> Option<u8> {
        match self {
            ValueKind::Integer { width, .. } | ValueKind::Named { width } => Some(*width),
            _ => None,
        }
    }
}

impl Shape {
    /// `nested` is true when the attribute is a TLV child.
    pub fn for_attribute(attr: &AttributeDescriptor, nested: bool) -> Shape {
        if nested {
            Shape::SubAttribute
        } else if attr.has_sub_attributes() {
            Shape::VsaWithSubAttributes
        } else if attr.vendor.is_some() {
            Shape::VendorSpecific
        } else {
            Shape::Attribute
        }
    }

    /// Runtime type name under `<runtime>`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Attribute => "RadiusAttribute",
            Shape::VendorSpecific => "VSAttribute",
            Shape::VsaWithSubAttributes => "VSAWithSubAttributes",
            Shape::SubAttribute => "SubAttribute",
        }
    }

    /// Whether the shape carries vendor id and VSA type fields.
    pub fn is_vendor_specific(&self) -> bool {
        !matches!(self, Shape::Attribute)
    }
}

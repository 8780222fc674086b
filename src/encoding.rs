//! Numeric encodings for RADIUS attribute types.
//!
//! Vendor-specific attributes travel inside the outer attribute 26; the
//! compiler packs the vendor id and the (possibly nested) vendor type into a
//! single 64-bit key used by the generated registries.

/// Outer RADIUS attribute number that carries vendor-specific attributes.
pub const VENDOR_SPECIFIC_TYPE: u32 = 26;

/// Top-level attribute numbers above this are FreeRADIUS internal attributes
/// that never go on the wire.
pub const MAX_WIRE_TYPE: u32 = 255;

/// Parse a dictionary number: decimal, or hexadecimal with a `0x`/`0X` prefix.
pub fn parse_number(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parse an enumeration value number. Same syntax as [`parse_number`] but
/// signed, since `signed` attributes may enumerate negative values.
pub fn parse_value_number(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Composite type of a vendor attribute: `((vendor & 0xFFFF) << 16) | vsa_type`.
pub fn vendor_type(vendor_id: u32, vsa_type: u32) -> u64 {
    (((vendor_id & 0xFFFF) as u64) << 16) | vsa_type as u64
}

/// Largest TLV child number whose nested type `(child << 8) | parent` fits in
/// 32 bits.
pub const MAX_TLV_CHILD_NUMBER: u32 = 0x00FF_FFFF;

/// VSA type of a TLV child: `(child << 8) | parent`. `child` must not exceed
/// [`MAX_TLV_CHILD_NUMBER`].
pub fn nested_vsa_type(child: u32, parent: u32) -> u32 {
    (child << 8) | parent
}

/// Key a parent's loader registers a TLV child under:
/// `(child << 8) | (parent & 0xFF)`. Matches the low 16 bits of the child's
/// own [`nested_vsa_type`] whenever the parent number fits in a byte.
pub fn loader_child_key(child: u32, parent: u32) -> u64 {
    ((child as u64) << 8) | (parent & 0xFF) as u64
}

/// Type identifiers of one generated attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeIds {
    /// Top-level attribute: the type is the attribute number.
    Plain { type_id: u32 },
    Vendor {
        vendor_id: u32,
        vsa_type: u32,
        type_id: u64,
    },
    /// TLV child; `parent_type` is the enclosing attribute's number.
    Nested {
        vendor_id: u32,
        parent_type: u32,
        vsa_type: u32,
        type_id: u64,
    },
}

impl TypeIds {
    pub fn vendor(vendor_id: u32, number: u32) -> Self {
        TypeIds::Vendor {
            vendor_id,
            vsa_type: number,
            type_id: vendor_type(vendor_id, number),
        }
    }

    pub fn nested(vendor_id: u32, parent_type: u32, number: u32) -> Self {
        let vsa_type = nested_vsa_type(number, parent_type);
        TypeIds::Nested {
            vendor_id,
            parent_type,
            vsa_type,
            type_id: vendor_type(vendor_id, vsa_type),
        }
    }

    /// Composite type used as the registry key.
    pub fn type_id(&self) -> u64 {
        match *self {
            TypeIds::Plain { type_id } => type_id as u64,
            TypeIds::Vendor { type_id, .. } | TypeIds::Nested { type_id, .. } => type_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids() {
        assert_eq!(TypeIds::Plain { type_id: 1 }.type_id(), 1);
        assert_eq!(TypeIds::vendor(9, 1).type_id(), (9 << 16) | 1);
        assert_eq!(
            TypeIds::nested(9, 5, 2),
            TypeIds::Nested {
                vendor_id: 9,
                parent_type: 5,
                vsa_type: (2 << 8) | 5,
                type_id: (9 << 16) | ((2 << 8) | 5),
            }
        );
    }

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_number("26"), Some(26));
        assert_eq!(parse_number("0x1A"), Some(26));
        assert_eq!(parse_number("0X1a"), Some(26));
        assert_eq!(parse_number("1.2"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("0x"), None);
    }

    #[test]
    fn parses_signed_values() {
        assert_eq!(parse_value_number("-1"), Some(-1));
        assert_eq!(parse_value_number("0xff"), Some(255));
        assert_eq!(parse_value_number("4294967295"), Some(4_294_967_295));
        assert_eq!(parse_value_number("abc"), None);
    }

    #[test]
    fn vendor_packing() {
        assert_eq!(vendor_type(9, 1), (9 << 16) | 1);
        // Only the low 16 bits of the vendor id survive.
        assert_eq!(vendor_type(0x1_0009, 1), (9 << 16) | 1);
        assert_eq!(vendor_type(19211, 3), (19211u64 << 16) | 3);
    }

    #[test]
    fn nested_packing() {
        let vsa = nested_vsa_type(2, 5);
        assert_eq!(vsa, (2 << 8) | 5);
        assert_eq!(vendor_type(9, vsa), (9 << 16) | ((2 << 8) | 5));
        assert_eq!(loader_child_key(2, 5), vsa as u64);
    }

    #[test]
    fn largest_child_number_keeps_loader_key() {
        let child = MAX_TLV_CHILD_NUMBER;
        assert_eq!(nested_vsa_type(child, 5) as u64, loader_child_key(child, 5));
    }

    #[test]
    fn loader_key_masks_parent() {
        assert_eq!(loader_child_key(1, 0x1FF), (1 << 8) | 0xFF);
    }
}

//! Turn free-text dictionary names into identifiers legal in generated Rust.

/// Sanitize an attribute, value or vendor name into an identifier.
///
/// Hyphens become underscores, every other character outside `[A-Za-z0-9_]`
/// is dropped, and a leading digit gets a `_` prefix. An input with no usable
/// characters yields `_`.
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match out.chars().next() {
        None => out.push('_'),
        Some(c) if c.is_ascii_digit() => out.insert(0, '_'),
        Some(_) => {}
    }
    out
}

/// Generated type name for an attribute: `Attr_<sanitized>`.
pub fn type_name(attribute_name: &str) -> String {
    format!("Attr_{}", sanitize(attribute_name))
}

/// Generated module (and file stem) for an attribute: `attr_<sanitized, lowercase>`.
pub fn module_name(attribute_name: &str) -> String {
    format!("attr_{}", sanitize(attribute_name).to_ascii_lowercase())
}

/// Keywords that cannot be used even as raw identifiers.
const PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Make a sanitized identifier usable in Rust source: keywords become raw
/// identifiers, path keywords and a lone `_` get a trailing underscore.
pub fn rust_ident(ident: &str) -> String {
    if ident == "_" || is_path_keyword(ident) {
        format!("{}_", ident)
    } else if KEYWORDS.contains(&ident) {
        format!("r#{}", ident)
    } else {
        ident.to_string()
    }
}

/// `self`, `Self`, `super` and `crate` have no raw form.
pub fn is_path_keyword(ident: &str) -> bool {
    PATH_KEYWORDS.contains(&ident)
}

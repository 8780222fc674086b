//! Rust module paths for generated code.

use crate::sanitize::{is_path_keyword, sanitize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Module path prefix for vendor namespaces.
pub const VENDOR_PREFIX: &str = "vsa_";

/// A module path such as `radius::dictionary::vsa_acme`, kept as segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// Parse a user-supplied namespace. Accepts `a::b::c` and `a.b.c`.
    /// Empty segments are dropped.
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split("::")
            .flat_map(|part| part.split('.'))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Namespace { segments }
    }

    /// Relative namespace of a vendor: `vsa_<name>`, lowercase, where each `-`
    /// in the vendor name starts a new segment.
    pub fn for_vendor(vendor_name: &str) -> Self {
        let lower = vendor_name.to_lowercase();
        let mut parts = lower.split('-').filter(|s| !s.is_empty());
        let mut segments = Vec::new();
        let first = parts.next().unwrap_or_default();
        segments.push(sanitize(&format!("{}{}", VENDOR_PREFIX, first)));
        segments.extend(parts.map(|part| {
            let segment = sanitize(part);
            if is_path_keyword(&segment) {
                format!("{}_", segment)
            } else {
                segment
            }
        }));
        Namespace { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append `other` below `self`.
    pub fn join(&self, other: &Namespace) -> Namespace {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Namespace { segments }
    }

    pub fn child(&self, segment: &str) -> Namespace {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Namespace { segments }
    }

    /// Segments of `self` below `base`, or `None` if `base` is not a prefix.
    pub fn strip_prefix(&self, base: &Namespace) -> Option<&[String]> {
        self.segments.strip_prefix(base.segments.as_slice())
    }

    /// Directory holding this namespace below the output root.
    pub fn to_dir(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        dir.extend(&self.segments);
        dir
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("::"))
    }
}

//! Walk a [`Registry`] and write the generated source tree.
//!
//! Layout below `output_dir`:
//!
//! ```text
//! <namespace>/mod.rs                         top-level loader
//! <namespace>/attr_<name>.rs                 one per top-level attribute
//! <namespace>/attr_<parent>/attr_<child>.rs  TLV children
//! <namespace>/vsa_<vendor>/mod.rs            vendor loader
//! ```
//!
//! Generation never fails as a whole: a failing artifact is logged, recorded
//! in the [`GenerationReport`] and skipped.

use crate::emit::{
    render_attribute, render_loader, AttributeArtifact, LoaderArtifact, LoaderKind, ModuleTree,
    Registration,
};
use crate::encoding::{loader_child_key, TypeIds, VENDOR_SPECIFIC_TYPE};
use crate::namespace::Namespace;
use crate::registry::{AttributeDescriptor, AttributeMap, Registry, VendorDescriptor};
use crate::sanitize::{module_name, sanitize, type_name};
use crate::value::{Shape, ValueKind};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Default path of the runtime crate generated code is built against.
pub const DEFAULT_RUNTIME: &str = "radius::attribute";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Format: {0}")]
    Fmt(#[from] std::fmt::Error),
    #[error("{attribute}: no type known for parent {parent}")]
    UnresolvedParent { attribute: String, parent: String },
    #[error("{} was already generated by another name", .0.display())]
    DuplicateArtifact(PathBuf),
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Module path of the top-level loader, e.g. `radius::dictionary`.
    pub namespace: Namespace,
    pub output_dir: PathBuf,
    /// Path of the runtime crate in generated `use` items.
    pub runtime: String,
    /// Timestamp written into every banner.
    pub generated_on: String,
}

impl GeneratorConfig {
    pub fn new(namespace: Namespace, output_dir: impl Into<PathBuf>) -> Self {
        GeneratorConfig {
            namespace,
            output_dir: output_dir.into(),
            runtime: DEFAULT_RUNTIME.to_string(),
            generated_on: timestamp(),
        }
    }
}

/// Current local time as written in banners.
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("%a, %-d %b %Y %H:%M:%S %z")
        .to_string()
}

#[derive(Debug)]
pub struct ArtifactFailure {
    /// Attribute name, or loader namespace.
    pub artifact: String,
    pub error: GenerateError,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files written, in generation order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
}

impl GenerationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Attribute map being generated and the loader it belongs to.
struct Scope<'a> {
    vendor: Option<&'a VendorDescriptor>,
    dir: PathBuf,
}

pub struct Generator {
    config: GeneratorConfig,
    /// Sanitized attribute name → attribute number, for TLV parent lookups.
    type_ids: HashMap<String, u32>,
    paths: HashSet<PathBuf>,
    report: GenerationReport,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Generator {
            config,
            type_ids: HashMap::new(),
            paths: HashSet::new(),
            report: GenerationReport::default(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Write the top-level map and its loader, then each vendor's map and loader.
    pub fn generate(mut self, registry: &Registry) -> GenerationReport {
        let root = self.config.namespace.clone();
        let mut tree = ModuleTree::default();
        for vendor in registry.vendors.values() {
            tree.insert(vendor.namespace.segments());
        }

        let scope = Scope {
            vendor: None,
            dir: root.to_dir(&self.config.output_dir),
        };
        let registrations = self.generate_map(&registry.attributes, &scope);
        let vendor_codes = registry
            .vendors
            .values()
            .map(|v| (v.number, v.namespace.segments().to_vec()))
            .collect();
        self.write_loader(
            &scope.dir,
            LoaderArtifact {
                namespace: root.to_string(),
                kind: LoaderKind::Root { vendor_codes },
                registrations,
                vendor_modules: Some(&tree),
            },
        );

        for vendor in registry.vendors.values() {
            let namespace = root.join(&vendor.namespace);
            let scope = Scope {
                vendor: Some(vendor),
                dir: namespace.to_dir(&self.config.output_dir),
            };
            let registrations = self.generate_map(&vendor.attributes, &scope);
            self.write_loader(
                &scope.dir,
                LoaderArtifact {
                    namespace: namespace.to_string(),
                    kind: LoaderKind::Vendor {
                        vendor_name: &vendor.name,
                    },
                    registrations,
                    vendor_modules: tree.node(vendor.namespace.segments()),
                },
            );
        }

        debug!(
            written = self.report.written.len(),
            failures = self.report.failures.len(),
            "generation finished"
        );
        self.report
    }

    fn generate_map(&mut self, map: &AttributeMap, scope: &Scope<'_>) -> Vec<Registration> {
        let mut registrations = Vec::new();
        for attr in map.values() {
            let dir = scope.dir.clone();
            registrations.extend(self.generate_attribute(scope, attr, &dir, None, attr.number as u64, &[]));
        }
        registrations
    }

    /// Generate one attribute and its children. Returns the registrations for
    /// the enclosing loader: empty if the attribute itself was not written.
    fn generate_attribute(
        &mut self,
        scope: &Scope<'_>,
        attr: &AttributeDescriptor,
        dir: &Path,
        parent: Option<&AttributeDescriptor>,
        key: u64,
        path: &[String],
    ) -> Vec<Registration> {
        info!("Processing attribute: {}", attr.name);
        let vendor_id = scope.vendor.map_or(0, |v| v.number);
        let ids = match parent {
            Some(parent) => match self.type_ids.get(&sanitize(&parent.name)) {
                Some(&parent_type) => TypeIds::nested(vendor_id, parent_type, attr.number),
                None => {
                    self.fail(
                        &attr.name,
                        GenerateError::UnresolvedParent {
                            attribute: attr.name.clone(),
                            parent: parent.name.clone(),
                        },
                    );
                    return Vec::new();
                }
            },
            None if scope.vendor.is_some() || attr.has_sub_attributes() => {
                TypeIds::vendor(vendor_id, attr.number)
            }
            None => TypeIds::Plain {
                type_id: attr.number,
            },
        };
        self.type_ids.insert(sanitize(&attr.name), attr.number);

        let module = module_name(&attr.name);
        let mut module_path = path.to_vec();
        module_path.push(module.clone());

        // Claimed before the children so a name clash skips the whole subtree.
        let file = dir.join(format!("{}.rs", module));
        if let Err(e) = self.reserve(&file) {
            if attr.has_sub_attributes() {
                warn!("skipping TLV children of {}", attr.name);
            }
            self.fail(&attr.name, e);
            return Vec::new();
        }

        let written_before = self.report.written.len();
        let mut child_modules = Vec::new();
        let mut child_registrations = Vec::new();
        if let Some(children) = &attr.sub_attributes {
            let child_dir = dir.join(&module);
            for child in children.values() {
                let key = loader_child_key(child.number, attr.number);
                let registered =
                    self.generate_attribute(scope, child, &child_dir, Some(attr), key, &module_path);
                if !registered.is_empty() {
                    child_modules.push(module_name(&child.name));
                }
                child_registrations.extend(registered);
            }
        }

        let shape = Shape::for_attribute(attr, parent.is_some());
        let attribute_type = match shape {
            Shape::VendorSpecific | Shape::VsaWithSubAttributes if scope.vendor.is_some() => {
                VENDOR_SPECIFIC_TYPE
            }
            _ => attr.number,
        };
        let artifact = AttributeArtifact {
            attribute: attr,
            type_name: type_name(&attr.name),
            shape,
            kind: ValueKind::for_attribute(attr),
            ids,
            attribute_type,
            parent: parent.map(|p| format!("super::{}", type_name(&p.name))),
            format: scope.vendor.and_then(|v| v.format()),
            child_modules,
        };
        if let Err(e) = self.write_attribute(&file, &artifact) {
            self.fail(&attr.name, e);
            self.discard_since(written_before);
            return Vec::new();
        }

        let mut registrations = vec![Registration {
            key,
            path: module_path,
            type_name: artifact.type_name,
        }];
        registrations.extend(child_registrations);
        registrations
    }

    /// Render and write an attribute whose path was already reserved.
    fn write_attribute(&mut self, file: &Path, artifact: &AttributeArtifact<'_>) -> Result<(), GenerateError> {
        let source = render_attribute(artifact, &self.config.runtime, &self.config.generated_on)?;
        self.write_file(file, &source)
    }

    fn write_loader(&mut self, dir: &Path, loader: LoaderArtifact<'_>) {
        let file = dir.join("mod.rs");
        let result = self.reserve(&file).and_then(|()| {
            let source = render_loader(&loader, &self.config.runtime, &self.config.generated_on)?;
            self.write_file(&file, &source)
        });
        if let Err(e) = result {
            self.fail(&loader.namespace, e);
        }
    }

    /// Claim an output path; a second claim is a name clash.
    fn reserve(&mut self, file: &Path) -> Result<(), GenerateError> {
        if self.paths.insert(file.to_path_buf()) {
            Ok(())
        } else {
            Err(GenerateError::DuplicateArtifact(file.to_path_buf()))
        }
    }

    /// Remove files written after `mark`. Used when a TLV parent fails after
    /// its children were written, so nothing is left undeclared.
    fn discard_since(&mut self, mark: usize) {
        for file in self.report.written.split_off(mark) {
            warn!("removing unreachable {}", file.display());
            if let Err(e) = fs_err::remove_file(&file) {
                warn!(error = %e, "could not remove {}", file.display());
            }
        }
    }

    fn write_file(&mut self, file: &Path, source: &str) -> Result<(), GenerateError> {
        if let Some(dir) = file.parent() {
            fs_err::create_dir_all(dir)?;
        }
        fs_err::write(file, source)?;
        self.report.written.push(file.to_path_buf());
        Ok(())
    }

    fn fail(&mut self, artifact: &str, error: GenerateError) {
        error!(artifact = %artifact, error = %error, "skipping artifact");
        self.report.failures.push(ArtifactFailure {
            artifact: artifact.to_string(),
            error,
        });
    }
}

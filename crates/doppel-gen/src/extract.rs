//! Signature Extractor
//!
//! Computes the method set a double must expose: methods declared directly
//! on the target plus methods promoted one level through embedded fields.
//! Each promoted method remembers the field that supplies it, so the
//! rendered double can call through that field when not stubbed.
//!
//! ## Resolution rules
//!
//! - Depth 0 (declared on the target) shadows depth 1 (promoted).
//! - Two embedded fields supplying the same method is an error; the caller
//!   must disambiguate by declaring the method on the target.
//! - Only exported methods are considered.
//! - The result is sorted by method name.

use crate::catalog::{MethodDecl, Receiver, TypeCatalog, TypeDecl, TypeKind};
use crate::error::{GenError, GenResult, ShapeError};
use crate::ident;
use std::collections::{BTreeMap, BTreeSet};

/// Parameter names the rendered forwarding method binds itself.
pub const RESERVED_PARAMS: &[&str] = &["call"];

/// A named parameter of an extracted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Allocated name
    pub name: String,
    /// Type as written
    pub type_ref: String,
    /// Position in the list
    pub index: usize,
}

/// A named result slot of an extracted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSlot {
    /// Allocated name
    pub name: String,
    /// Type as written
    pub type_ref: String,
    /// Position in the list
    pub index: usize,
}

/// A method as it appears on the double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Receiver borrow
    pub receiver: Receiver,
    /// Parameters after the receiver
    pub params: Vec<Parameter>,
    /// Result slots
    pub results: Vec<ResultSlot>,
    /// The last parameter takes any number of values
    pub variadic: bool,
    /// Trait the method belongs to
    pub capability: Option<String>,
}

impl MethodSignature {
    fn from_decl(decl: &MethodDecl, capability: Option<String>) -> Self {
        let param_names: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
        let result_names: Vec<&str> = decl.results.iter().map(|r| r.name.as_str()).collect();

        let params = ident::param_names(&param_names, RESERVED_PARAMS)
            .into_iter()
            .zip(&decl.params)
            .enumerate()
            .map(|(index, (name, p))| Parameter {
                name,
                type_ref: p.type_ref.clone(),
                index,
            })
            .collect();
        let results = ident::result_names(&result_names, &[])
            .into_iter()
            .zip(&decl.results)
            .enumerate()
            .map(|(index, (name, r))| ResultSlot {
                name,
                type_ref: r.type_ref.clone(),
                index,
            })
            .collect();

        Self {
            name: decl.name.clone(),
            receiver: decl.receiver,
            params,
            results,
            variadic: decl.variadic && !decl.params.is_empty(),
            capability,
        }
    }
}

/// Field that supplies the real implementation of a promoted method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateBinding {
    /// Field name on the target
    pub field: String,
    /// Type or trait embedded by that field
    pub embedded: String,
}

/// One method of the double and where its real implementation lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodShape {
    /// Signature
    pub signature: MethodSignature,
    /// Delegate; `None` for methods declared on the target itself
    pub delegate: Option<DelegateBinding>,
}

/// Everything needed to render a double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeShape {
    /// Target type
    pub type_name: String,
    /// Methods sorted by name
    pub methods: Vec<MethodShape>,
}

impl TypeShape {
    /// Capabilities implemented by the double, sorted.
    #[must_use]
    pub fn capabilities(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .methods
            .iter()
            .filter_map(|m| m.signature.capability.as_deref())
            .collect();
        set.into_iter().collect()
    }

    /// Find a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodShape> {
        self.methods.iter().find(|m| m.signature.name == name)
    }
}

struct Promoted<'a> {
    decl: &'a MethodDecl,
    capability: Option<String>,
    binding: DelegateBinding,
}

/// Extract the method set of `type_name`.
pub fn extract(catalog: &dyn TypeCatalog, type_name: &str) -> GenResult<TypeShape> {
    let decl = catalog
        .lookup(type_name)
        .ok_or_else(|| GenError::lookup(type_name))?;
    if decl.kind != TypeKind::Struct {
        return Err(GenError::shape(type_name, ShapeError::NotStruct));
    }
    check_unique(decl).map_err(|reason| GenError::shape(type_name, reason))?;

    let direct: BTreeSet<&str> = decl
        .methods
        .iter()
        .filter(|m| m.exported)
        .map(|m| m.name.as_str())
        .collect();

    let mut methods: BTreeMap<&str, MethodShape> = BTreeMap::new();
    // Capabilities the double cannot implement in full.
    let mut partial: BTreeSet<String> = BTreeSet::new();
    for (name, promoted) in promoted_methods(catalog, decl)? {
        if direct.contains(name) {
            tracing::debug!(target_type = type_name, method = name, "direct method shadows promoted");
            if let Ok(Promoted {
                capability: Some(capability),
                ..
            }) = &promoted
            {
                let shadow = decl.methods.iter().find(|m| m.exported && m.name == name);
                if shadow.and_then(|m| m.capability.as_ref()) != Some(capability) {
                    partial.insert(capability.clone());
                }
            }
            continue;
        }
        let promoted = promoted.map_err(|reason| GenError::shape(type_name, reason))?;
        tracing::debug!(
            target_type = type_name,
            method = name,
            field = %promoted.binding.field,
            "promoted method"
        );
        methods.insert(
            name,
            MethodShape {
                signature: MethodSignature::from_decl(promoted.decl, promoted.capability),
                delegate: Some(promoted.binding),
            },
        );
    }

    for method in decl.methods.iter().filter(|m| m.exported) {
        methods.insert(
            &method.name,
            MethodShape {
                signature: MethodSignature::from_decl(method, method.capability.clone()),
                delegate: None,
            },
        );
    }

    if methods.is_empty() {
        return Err(GenError::shape(type_name, ShapeError::NoMethods));
    }

    partial.extend(
        methods
            .values()
            .filter_map(|m| m.signature.capability.as_deref())
            .filter(|c| catalog.lookup(c).is_some_and(|t| !t.is_complete()))
            .map(str::to_string),
    );
    for capability in &partial {
        tracing::debug!(
            target_type = type_name,
            capability = %capability,
            "capability not fully captured, double will not implement it"
        );
        for method in methods.values_mut() {
            if method.signature.capability.as_ref() == Some(capability) {
                method.signature.capability = None;
            }
        }
    }

    let shape = TypeShape {
        type_name: type_name.to_string(),
        methods: methods.into_values().collect(),
    };
    tracing::debug!(
        target_type = type_name,
        methods = shape.methods.len(),
        "extracted method set"
    );
    Ok(shape)
}

fn check_unique(decl: &TypeDecl) -> Result<(), ShapeError> {
    let mut seen = BTreeSet::new();
    for method in &decl.methods {
        if !seen.insert(method.name.as_str()) {
            return Err(ShapeError::DuplicateMethod {
                method: method.name.clone(),
            });
        }
    }
    Ok(())
}

// Ambiguity is recorded per method rather than raised at once: a direct
// declaration on the target settles it.
fn promoted_methods<'a>(
    catalog: &'a dyn TypeCatalog,
    decl: &'a TypeDecl,
) -> GenResult<BTreeMap<&'a str, Result<Promoted<'a>, ShapeError>>> {
    let mut promoted: BTreeMap<&str, Result<Promoted<'_>, ShapeError>> = BTreeMap::new();

    for field in &decl.fields {
        let Some(embedded_name) = field.embeds.as_deref() else {
            continue;
        };
        let embedded = catalog
            .lookup(embedded_name)
            .ok_or_else(|| GenError::lookup(embedded_name))?;
        check_unique(embedded).map_err(|reason| GenError::shape(&decl.name, reason))?;

        let trait_field = embedded.kind == TypeKind::Trait;
        for method in embedded.methods.iter().filter(|m| m.exported) {
            if let Some(existing) = promoted.get_mut(method.name.as_str()) {
                let first = existing.as_ref().ok().map(|p| p.binding.field.clone());
                if let Some(first) = first {
                    *existing = Err(ShapeError::AmbiguousDelegate {
                        method: method.name.clone(),
                        first,
                        second: field.name.clone(),
                    });
                }
                continue;
            }
            let capability = match (&method.capability, trait_field) {
                (Some(capability), _) => Some(capability.clone()),
                (None, true) => Some(embedded.name.clone()),
                (None, false) => None,
            };
            promoted.insert(
                &method.name,
                Ok(Promoted {
                    decl: method,
                    capability,
                    binding: DelegateBinding {
                        field: field.name.clone(),
                        embedded: embedded.name.clone(),
                    },
                }),
            );
        }
    }
    Ok(promoted)
}

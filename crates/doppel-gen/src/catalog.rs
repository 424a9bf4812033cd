//! Type Catalog
//!
//! Declarations the generator works from: struct fields (with their
//! embeddings), methods with full signatures, and trait method sets.
//!
//! Two catalogs ship with the crate: [`MemoryCatalog`], filled in code or
//! loaded from a JSON/YAML file, and
//! [`SourceCatalog`](crate::source::SourceCatalog), built by parsing Rust
//! sources.
//!
//! ## Catalog file format
//!
//! ```yaml
//! types:
//!   - name: Engine
//!     kind: struct
//!     fields:
//!       - { name: store, type: "Box<dyn Store>", embeds: Store }
//!   - name: Store
//!     kind: trait
//!     methods:
//!       - name: get
//!         params: [{ name: key, type: "&str" }]
//!         results: [{ type: "Option<String>" }]
//! ```

use crate::error::{GenError, GenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Source of type declarations.
pub trait TypeCatalog {
    /// Find the declaration named `name`.
    fn lookup(&self, name: &str) -> Option<&TypeDecl>;
}

/// What kind of item a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A struct (named or positional fields)
    #[default]
    Struct,
    /// A trait; its methods form a capability set
    Trait,
    /// Anything else (enum, union, alias)
    Other,
}

/// How a method borrows its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    /// `&self`
    #[default]
    Ref,
    /// `&mut self`
    Mut,
}

impl Receiver {
    /// Receiver as written in a signature.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ref => "&self",
            Self::Mut => "&mut self",
        }
    }
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Type name
    pub name: String,
    /// Item kind
    #[serde(default)]
    pub kind: TypeKind,
    /// Fields, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,
    /// Methods, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
    /// Required items that could not be captured. A trait with any is never
    /// implemented by a double.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl TypeDecl {
    /// Empty struct declaration.
    #[must_use]
    pub fn structure(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Struct)
    }

    /// Empty trait declaration.
    #[must_use]
    pub fn capability(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Trait)
    }

    /// Empty declaration of `kind`.
    #[must_use]
    pub fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            methods: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method.
    #[must_use]
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Note a required item that was left out.
    #[must_use]
    pub fn skip(mut self, item: impl Into<String>) -> Self {
        self.skipped.push(item.into());
        self
    }

    /// Whether every required item was captured.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name; positional fields use their index
    pub name: String,
    /// Field type as written
    #[serde(rename = "type")]
    pub type_ref: String,
    /// Type or trait this field embeds, if it is an embedding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeds: Option<String>,
}

impl FieldDecl {
    /// Plain field.
    #[must_use]
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            embeds: None,
        }
    }

    /// Field that promotes the methods of `embeds`.
    #[must_use]
    pub fn embedding(
        name: impl Into<String>,
        type_ref: impl Into<String>,
        embeds: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            embeds: Some(embeds.into()),
        }
    }
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Visible outside its module
    #[serde(default = "exported_by_default")]
    pub exported: bool,
    /// Receiver borrow
    #[serde(default)]
    pub receiver: Receiver,
    /// Parameters after the receiver
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Result slots; several slots form a tuple
    #[serde(default)]
    pub results: Vec<ParamDecl>,
    /// The last parameter takes any number of values
    #[serde(default)]
    pub variadic: bool,
    /// Trait the method is implemented for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}

const fn exported_by_default() -> bool {
    true
}

impl MethodDecl {
    /// Exported `&self` method with no parameters or results.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exported: true,
            receiver: Receiver::Ref,
            params: Vec::new(),
            results: Vec::new(),
            variadic: false,
            capability: None,
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    /// Add a result slot.
    #[must_use]
    pub fn result(mut self, result: ParamDecl) -> Self {
        self.results.push(result);
        self
    }

    /// Take `&mut self`.
    #[must_use]
    pub const fn mutable(mut self) -> Self {
        self.receiver = Receiver::Mut;
        self
    }

    /// Mark the last parameter variadic.
    #[must_use]
    pub const fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Mark the method private.
    #[must_use]
    pub const fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Attribute the method to trait `name`.
    #[must_use]
    pub fn capability(mut self, name: impl Into<String>) -> Self {
        self.capability = Some(name.into());
        self
    }
}

/// A parameter or result slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Declared name; empty when anonymous
    #[serde(default)]
    pub name: String,
    /// Type as written
    #[serde(rename = "type")]
    pub type_ref: String,
}

impl ParamDecl {
    /// Named slot.
    #[must_use]
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
        }
    }

    /// Anonymous slot.
    #[must_use]
    pub fn anonymous(type_ref: impl Into<String>) -> Self {
        Self::new(String::new(), type_ref)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    types: Vec<TypeDecl>,
}

/// In-memory catalog, ordered by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCatalog {
    types: BTreeMap<String, TypeDecl>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a declaration, returning the one it replaced.
    pub fn insert(&mut self, decl: TypeDecl) -> Option<TypeDecl> {
        self.types.insert(decl.name.clone(), decl)
    }

    /// Add a declaration unless its name is taken.
    ///
    /// Returns `false` when an earlier declaration was kept.
    pub fn insert_first(&mut self, decl: TypeDecl) -> bool {
        if self.types.contains_key(&decl.name) {
            return false;
        }
        self.types.insert(decl.name.clone(), decl);
        true
    }

    /// Mutable access to a declaration.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDecl> {
        self.types.get_mut(name)
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declarations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    /// Parse a JSON catalog.
    pub fn from_json_str(text: &str) -> GenResult<Self> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::from_file(file)
    }

    /// Parse a YAML catalog.
    pub fn from_yaml_str(text: &str) -> GenResult<Self> {
        let file: CatalogFile = serde_yaml_ng::from_str(text)?;
        Self::from_file(file)
    }

    /// Serialize as a JSON catalog.
    pub fn to_json(&self) -> GenResult<String> {
        let file = CatalogFile {
            types: self.types.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Load a catalog file; the format follows the extension
    /// (`.json`, `.yaml` or `.yml`).
    pub fn load(path: impl AsRef<Path>) -> GenResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        let catalog = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            _ => {
                return Err(GenError::catalog(format!(
                    "{}: unsupported catalog format (expected .json, .yaml or .yml)",
                    path.display()
                )))
            }
        };
        tracing::debug!(path = %path.display(), types = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    fn from_file(file: CatalogFile) -> GenResult<Self> {
        let mut catalog = Self::new();
        for decl in file.types {
            if decl.name.is_empty() {
                return Err(GenError::catalog("type with empty name"));
            }
            let name = decl.name.clone();
            if !catalog.insert_first(decl) {
                return Err(GenError::catalog(format!("duplicate type {name}")));
            }
        }
        Ok(catalog)
    }
}

impl TypeCatalog for MemoryCatalog {
    fn lookup(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }
}

impl FromIterator<TypeDecl> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = TypeDecl>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for decl in iter {
            catalog.insert(decl);
        }
        catalog
    }
}

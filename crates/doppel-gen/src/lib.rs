//! Doppel generator: source for test doubles from type declarations.
//!
//! # Pipeline
//!
//! ```text
//! TypeCatalog ──► extract ──► TypeShape ──► render ──► Artifact ──► write
//!  (memory or        (method set,            (Rust source,
//!   syn sources)      delegates, names)       <type>_mock.rs)
//! ```
//!
//! # Example
//!
//! ```
//! use doppel_gen::prelude::*;
//!
//! let catalog = SourceCatalog::parse_str(
//!     "pub struct Engine { store: Box<dyn Store> }
//!      pub trait Store { fn get(&self, key: &str) -> Option<String>; }",
//! )?;
//! let artifact = doppel_gen::generate(&catalog, "Engine")?;
//! assert_eq!(artifact.file_name, "engine_mock.rs");
//! assert!(artifact.contents.contains("pub struct MockEngine {"));
//! # Ok::<(), doppel_gen::GenError>(())
//! ```

#![warn(missing_docs)]

pub mod catalog;
mod error;
pub mod extract;
pub mod ident;
pub mod render;
pub mod source;
mod write;

pub use catalog::{MemoryCatalog, TypeCatalog};
pub use error::{GenError, GenResult, ShapeError};
pub use extract::{extract, TypeShape};
pub use render::{render, Artifact};
pub use source::SourceCatalog;
pub use write::write_artifact;

use std::path::{Path, PathBuf};

/// Extract and render the double for `type_name`.
pub fn generate(catalog: &dyn TypeCatalog, type_name: &str) -> GenResult<Artifact> {
    let shape = extract(catalog, type_name)?;
    Ok(render(&shape))
}

/// Generate the double for `type_name` and write it into `out_dir`.
pub fn generate_to(
    catalog: &dyn TypeCatalog,
    type_name: &str,
    out_dir: &Path,
) -> GenResult<PathBuf> {
    let artifact = generate(catalog, type_name)?;
    write_artifact(&artifact, out_dir)
}

/// Common imports.
pub mod prelude {
    pub use crate::catalog::{
        FieldDecl, MemoryCatalog, MethodDecl, ParamDecl, Receiver, TypeCatalog, TypeDecl,
        TypeKind,
    };
    pub use crate::error::{GenError, GenResult, ShapeError};
    pub use crate::extract::{DelegateBinding, MethodShape, MethodSignature, TypeShape};
    pub use crate::render::Artifact;
    pub use crate::source::SourceCatalog;
}

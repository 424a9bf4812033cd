//! Doppel CLI library.
//!
//! Resolves a type from a source tree or a catalog file, renders its test
//! double and emits it.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod logging;

pub use commands::{Cli, LogFormatArg};
pub use config::{CatalogSource, CliConfig, LogFormat, Output, Verbosity};
pub use error::{CliError, CliResult};

use doppel_gen::{MemoryCatalog, SourceCatalog, TypeCatalog};
use std::io::Write;
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    /// Source printed to the writer
    Printed,
    /// Source written to this path
    Written(PathBuf),
}

/// Load the catalog named by `source`.
///
/// # Errors
///
/// Propagates scan and catalog-file failures.
pub fn load_catalog(source: &CatalogSource) -> CliResult<Box<dyn TypeCatalog>> {
    let catalog: Box<dyn TypeCatalog> = match source {
        CatalogSource::Sources(root) => {
            let catalog = SourceCatalog::scan(root)?;
            tracing::debug!(
                root = %root.display(),
                files = catalog.files().len(),
                types = catalog.catalog().len(),
                "scanned sources"
            );
            Box::new(catalog)
        }
        CatalogSource::File(path) => {
            let catalog = MemoryCatalog::load(path)?;
            tracing::debug!(path = %path.display(), types = catalog.len(), "loaded catalog");
            Box::new(catalog)
        }
    };
    Ok(catalog)
}

/// Generate the double described by `config`. Printed output goes to `stdout`.
///
/// # Errors
///
/// Fails when the catalog cannot be loaded, the type cannot be mocked, or
/// the artifact cannot be emitted.
pub fn run(config: &CliConfig, stdout: &mut dyn Write) -> CliResult<Emitted> {
    let catalog = load_catalog(&config.source)?;
    match &config.output {
        Output::Stdout => {
            let artifact = doppel_gen::generate(catalog.as_ref(), &config.type_name)?;
            stdout.write_all(artifact.contents.as_bytes())?;
            stdout.flush()?;
            Ok(Emitted::Printed)
        }
        Output::Dir(dir) => {
            let path = doppel_gen::generate_to(catalog.as_ref(), &config.type_name, dir)?;
            Ok(Emitted::Written(path))
        }
    }
}

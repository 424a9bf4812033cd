// Build script to generate the doubles of the fixture targets

use std::fmt::Write;
use std::path::{Path, PathBuf};

const TARGETS: &[&str] = &["Account", "Engine"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let src = Path::new(&std::env::var("CARGO_MANIFEST_DIR")?).join("src");

    let catalog = doppel_gen::SourceCatalog::scan(&src)?;
    let mut modules = String::new();
    for target in TARGETS {
        let path = doppel_gen::generate_to(&catalog, target, &out_dir)?;
        let module = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or("artifact path has no file name")?;
        // `#[path]` keeps the artifact's inner attributes legal.
        writeln!(modules, "#[cfg(test)]")?;
        writeln!(modules, "#[path = {:?}]", path.display().to_string())?;
        writeln!(modules, "mod {module};")?;
    }
    std::fs::write(out_dir.join("doubles.rs"), modules)?;

    println!("cargo:rerun-if-changed=src");
    Ok(())
}

//! `pack`: unpacked folders back into containers.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use core_material::Material;

use super::collect_unpacked;

pub struct PackArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

pub fn run(args: &PackArgs) -> Result<()> {
    std::fs::create_dir_all(&args.output)?;
    for folder in collect_unpacked(&args.inputs)? {
        let stem = folder
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("material")
            .to_string();
        info!(material = %stem, "packing");

        let material = Material::load_unpacked(&folder)
            .with_context(|| format!("failed to load unpacked material {}", folder.display()))?;
        let target = args.output.join(format!("{stem}{}", Material::EXTENSION));
        material
            .save_file(&target)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    Ok(())
}

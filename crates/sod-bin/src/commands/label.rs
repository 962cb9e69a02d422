//! `label`: annotate text shader payloads with their variant information.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use core_material::Material;

use super::collect_packed;

pub struct LabelArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

pub fn run(args: &LabelArgs) -> Result<()> {
    std::fs::create_dir_all(&args.output)?;
    for file in collect_packed(&args.inputs)? {
        let file_name = file.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        info!(material = %file_name.to_string_lossy(), "labelling");

        let mut material = Material::load_file(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        material.label();
        material
            .save_file(&args.output.join(file_name))
            .with_context(|| format!("failed to write labelled {}", file.display()))?;
    }
    Ok(())
}

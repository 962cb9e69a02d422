//! `clear`: strip shader payloads, keeping the container structure.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use core_material::Material;

use super::collect_packed;

pub struct ClearArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

pub fn run(args: &ClearArgs) -> Result<()> {
    std::fs::create_dir_all(&args.output)?;
    for file in collect_packed(&args.inputs)? {
        let file_name = file.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        info!(material = %file_name.to_string_lossy(), "clearing");

        let mut material = Material::load_file(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        for pass in &mut material.passes {
            for variant in &mut pass.variants {
                for shader in &mut variant.shaders {
                    shader.bgfx_shader.shader_bytes.clear();
                }
            }
        }
        material
            .save_file(&args.output.join(file_name))
            .with_context(|| format!("failed to write cleared {}", file.display()))?;
    }
    Ok(())
}

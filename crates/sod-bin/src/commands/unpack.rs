//! `unpack`: packed containers to the editable folder layout.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use core_material::{Material, MaterialError};

use super::{collect_packed, material_stem};

pub struct UnpackArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub sort_flags: bool,
    pub skip_shaders: bool,
}

pub fn run(args: &UnpackArgs) -> Result<()> {
    for file in collect_packed(&args.inputs)? {
        let stem = material_stem(&file);
        info!(material = %stem, "unpacking");

        let mut material = match Material::load_file(&file) {
            Ok(material) => material,
            Err(MaterialError::Encrypted { scheme }) => {
                warn!(
                    material = %stem,
                    scheme,
                    "material is encrypted; this tool cannot unpack encrypted shaders"
                );
                continue;
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read {}", file.display()));
            }
        };
        if args.sort_flags {
            material.sort_variants();
        }
        material
            .store(&args.output.join(&stem), args.skip_shaders)
            .with_context(|| format!("failed to unpack {}", file.display()))?;
    }
    Ok(())
}

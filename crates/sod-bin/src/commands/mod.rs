//! Subcommand implementations.

pub mod clear;
pub mod info;
pub mod label;
pub mod pack;
pub mod restore;
pub mod unpack;

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use core_material::{Material, list_packed_materials};

/// Expand the input arguments into concrete `.material.bin` paths.
pub fn collect_packed(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        bail!("expected a material file or a folder of materials");
    }
    let mut files = Vec::new();
    for input in inputs {
        if !input.exists() {
            bail!("invalid path to material or folder: {}", input.display());
        }
        files.extend(
            list_packed_materials(input)
                .with_context(|| format!("failed to list materials under {}", input.display()))?,
        );
    }
    Ok(files)
}

fn is_unpacked_dir(path: &Path) -> bool {
    path.is_dir() && path.join("material.json").is_file()
}

/// Expand the input arguments into unpacked material folders: the folder
/// itself, a `material.json` inside it, or a folder of such folders.
pub fn collect_unpacked(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        bail!("expected an unpacked material folder");
    }
    let mut folders = Vec::new();
    for input in inputs {
        if !input.exists() {
            bail!("invalid path to material or folder: {}", input.display());
        }
        if input.is_file() && input.file_name().and_then(|n| n.to_str()) == Some("material.json") {
            folders.push(input.parent().unwrap_or(Path::new(".")).to_path_buf());
        } else if is_unpacked_dir(input) {
            folders.push(input.clone());
        } else if input.is_dir() {
            let mut children: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|child| is_unpacked_dir(child))
                .collect();
            children.sort();
            folders.extend(children);
        }
    }
    Ok(folders)
}

/// File stem of a packed material path, without the `.material.bin` suffix.
pub fn material_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    file_name
        .strip_suffix(Material::EXTENSION)
        .unwrap_or(file_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_stem_strips_the_full_extension() {
        assert_eq!(
            material_stem(Path::new("/tmp/entity_static.material.bin")),
            "entity_static"
        );
        assert_eq!(material_stem(Path::new("plain.bin")), "plain.bin");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(collect_packed(&[]).is_err());
        assert!(collect_unpacked(&[]).is_err());
    }
}

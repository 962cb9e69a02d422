//! `info`: human-readable material summary on stdout.

use anyhow::{Context, Result};
use std::path::PathBuf;

use core_material::{Material, MaterialError};
use core_restore::macros::{flag_name_macro, pass_name_macro};

use super::collect_packed;

pub struct InfoArgs {
    pub inputs: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    for file in collect_packed(&args.inputs)? {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("#### {file_name} ####");

        let mut material = match Material::load_file(&file) {
            Ok(material) => material,
            Err(MaterialError::Encrypted { scheme }) => {
                println!("  - Encryption: {scheme}");
                println!("  - Contents unavailable without decryption");
                continue;
            }
            Err(error) => {
                return Err(error).with_context(|| format!("failed to read {}", file.display()));
            }
        };
        material.sort_variants();
        material.passes.sort_by(|a, b| a.name.cmp(&b.name));
        material.buffers.sort_by_key(|b| b.reg1);
        material.uniforms.sort_by(|a, b| a.name.cmp(&b.name));

        print_material(&material);
    }
    Ok(())
}

fn print_material(material: &Material) {
    let shader_count: usize = material
        .passes
        .iter()
        .flat_map(|p| &p.variants)
        .map(|v| v.shaders.len())
        .sum();

    println!("  - Name: {}", material.name);
    println!("  - Encryption: {}", material.encryption.name());
    println!("  - Parent: {}", material.parent);
    println!("  - Total Shaders: {shader_count}");

    let platforms: Vec<&str> = material.platforms().iter().map(|p| p.name()).collect();
    println!("  - Platforms: {}", platforms.join(", "));
    let stages: Vec<&str> = material.stages().iter().map(|s| s.name()).collect();
    println!("  - Stages: {}", stages.join(", "));

    println!("  - Passes:");
    for pass in &material.passes {
        println!("    - {}: {}", pass.name, pass_name_macro(&pass.name));
    }

    let definitions = material.flag_definitions();
    if !definitions.is_empty() {
        println!("  - Flags:");
        for (name, values) in &definitions {
            println!("    - {name} ({}):", values.len());
            for value in values {
                println!("      - {value}: {}", flag_name_macro(name, value, false));
            }
        }
    }

    if !material.buffers.is_empty() {
        println!("  - Buffers:");
        for buffer in &material.buffers {
            let format_suffix = if buffer.texture_format.is_empty() {
                String::new()
            } else {
                format!(" {}", buffer.texture_format)
            };
            println!(
                "    - {} {} {}{format_suffix} (reg {}/{})",
                buffer.precision.name(),
                buffer.buffer_type.name(),
                buffer.name,
                buffer.reg1,
                buffer.reg2,
            );
            if let Some(info) = &buffer.custom_type_info {
                println!("      - struct {} ({} bytes)", info.struct_name, info.size);
            }
        }
    }

    if !material.uniforms.is_empty() {
        println!("  - Uniforms:");
        for uniform in &material.uniforms {
            let count_suffix = if uniform.count > 1 {
                format!("[{}]", uniform.count)
            } else {
                String::new()
            };
            let default_suffix = if uniform.default.is_empty() {
                String::new()
            } else {
                format!(
                    " = [{}]",
                    uniform
                        .default
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            println!(
                "    - {} {}{count_suffix}{default_suffix}",
                uniform.uniform_type.name(),
                uniform.name,
            );
        }
    }
}

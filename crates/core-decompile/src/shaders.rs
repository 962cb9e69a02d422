//! Combined-source restoration for a whole material.
//!
//! Shader payloads are grouped per platform, then per pass and stage
//! (optionally merged), turned into decompiler variants whose flag names are
//! prefixed so macro derivation can tell passes (`pass`), variant flags
//! (`f_*`) and the stage pseudo-flag (`BGFX_SHADER_TYPE_`) apart, and run
//! through the decompiler. The result gets the stage conditionals rewritten
//! to `#if` form and an "Available Macros" header listing every macro the
//! material can define.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};

use core_material::{Material, ShaderPlatform, ShaderStage, insert_header_comment};
use core_restore::macros::{flag_name_macro, pass_name_macro};
use core_restore::{FlagSet, RestoreOptions, SearchObserver, Variant, restore_with_observer};

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    /// Emit one source per pass instead of folding the pass into a flag.
    pub split_passes: bool,
    /// Fold all stages into one source guarded by `BGFX_SHADER_TYPE_*`.
    pub merge_stages: bool,
    /// Run the GLSL-to-shader-compiler rewrites on the payloads.
    pub preprocess: bool,
    pub search_timeout: Option<Duration>,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            split_passes: false,
            merge_stages: false,
            preprocess: true,
            search_timeout: Some(Duration::from_secs(10)),
        }
    }
}

#[derive(Debug)]
pub struct RestoredShader {
    pub platform: ShaderPlatform,
    pub stage: ShaderStage,
    pub pass_name: String,
    pub code: String,
}

type StageVariants = Vec<(ShaderStage, Vec<Variant>)>;

fn stage_entry(stages: &mut StageVariants, stage: ShaderStage) -> &mut Vec<Variant> {
    let index = match stages.iter().position(|(s, _)| *s == stage) {
        Some(index) => index,
        None => {
            stages.push((stage, Vec::new()));
            stages.len() - 1
        }
    };
    &mut stages[index].1
}

fn pass_entry<'a>(
    passes: &'a mut Vec<(String, StageVariants)>,
    name: &str,
) -> &'a mut StageVariants {
    let index = match passes.iter().position(|(n, _)| n == name) {
        Some(index) => index,
        None => {
            passes.push((name.to_string(), Vec::new()));
            passes.len() - 1
        }
    };
    &mut passes[index].1
}

/// Sorted pass names and flag definitions of the whole material, used for
/// the header comment.
fn harvest_definitions(material: &Material) -> (Vec<String>, Vec<(String, Vec<String>)>) {
    let mut passes: Vec<String> = material.passes.iter().map(|p| p.name.clone()).collect();
    passes.sort();

    let mut definitions = material.flag_definitions();
    definitions.sort_by(|a, b| a.0.cmp(&b.0));
    for (_, values) in &mut definitions {
        values.sort();
    }
    (passes, definitions)
}

fn macro_header(
    passes: &[String],
    definitions: &[(String, Vec<String>)],
    used_macros: &HashSet<String>,
) -> String {
    let mut comment = String::from("/*\n* Available Macros:");
    if !passes.is_empty() {
        comment.push_str("\n*\n* Passes:");
        for pass in passes {
            let name = pass_name_macro(pass);
            comment.push_str(&format!("\n* - {name}"));
            if !used_macros.contains(&name) {
                comment.push_str(" (not used)");
            }
        }
    }
    for (flag, values) in definitions {
        comment.push_str(&format!("\n*\n* {flag}:"));
        for value in values {
            let name = flag_name_macro(flag, value, false);
            comment.push_str(&format!("\n* - {name}"));
            if !used_macros.contains(&name) {
                comment.push_str(" (not used)");
            }
        }
    }
    comment.push_str("\n*/");
    comment
}

/// The stage macros are always defined as 0 or 1, so `#ifdef`-style
/// conditionals on them must become value tests.
fn rewrite_stage_conditionals(mut code: String) -> String {
    for stage in ["FRAGMENT", "VERTEX", "COMPUTE"] {
        let name = format!("BGFX_SHADER_TYPE_{stage}");
        code = code
            .replace(&format!("#ifdef {name}"), &format!("#if {name}"))
            .replace(&format!("#ifndef {name}"), &format!("#if !{name}"))
            .replace(&format!("defined({name})"), &name);
    }
    code
}

/// Restore one combined source per requested platform (and per pass/stage,
/// depending on the config) from the material's text shader payloads.
pub fn restore_shaders(
    material: &Material,
    platforms: &[ShaderPlatform],
    stages: &[ShaderStage],
    config: &RestoreConfig,
    observer: &dyn SearchObserver,
) -> Result<Vec<RestoredShader>> {
    if material.passes.is_empty() {
        return Ok(Vec::new());
    }

    let (pass_names, definitions) = harvest_definitions(material);
    let mut restored = Vec::new();

    for &platform in platforms {
        let mut per_pass: Vec<(String, StageVariants)> = Vec::new();
        for pass in &material.passes {
            for variant in &pass.variants {
                for shader in &variant.shaders {
                    if shader.platform != platform || !stages.contains(&shader.stage) {
                        continue;
                    }

                    let mut flags = FlagSet::new();
                    if !config.split_passes {
                        flags.insert("pass", pass.name.clone());
                    }
                    if config.merge_stages {
                        let stage = if shader.stage == ShaderStage::Unknown {
                            ShaderStage::Fragment
                        } else {
                            shader.stage
                        };
                        flags.insert("BGFX_SHADER_TYPE_", stage.name().to_uppercase());
                    }
                    for (name, value) in &variant.flags {
                        flags.insert(format!("f_{name}"), value.clone());
                    }

                    let code = String::from_utf8(shader.bgfx_shader.shader_bytes.clone())
                        .with_context(|| {
                            format!(
                                "shader payload for pass {:?} on {} is not text",
                                pass.name,
                                platform.name()
                            )
                        })?;
                    stage_entry(pass_entry(&mut per_pass, &pass.name), shader.stage)
                        .push(Variant::new(flags, code));
                }
            }
        }
        if per_pass.is_empty() {
            continue;
        }

        if config.merge_stages {
            for (_, stage_variants) in &mut per_pass {
                let merged: Vec<Variant> = stage_variants
                    .drain(..)
                    .flat_map(|(_, variants)| variants)
                    .collect();
                stage_variants.push((ShaderStage::Fragment, merged));
            }
        }
        if !config.split_passes {
            let merged_name = material.passes[0].name.clone();
            let mut merged: StageVariants = Vec::new();
            for (_, stage_variants) in per_pass.drain(..) {
                for (stage, variants) in stage_variants {
                    stage_entry(&mut merged, stage).extend(variants);
                }
            }
            per_pass.push((merged_name, merged));
        }

        for (pass_name, stage_variants) in &per_pass {
            for (stage, variants) in stage_variants {
                let options = RestoreOptions {
                    remove_comments: true,
                    preprocess: config.preprocess,
                    search_timeout: config.search_timeout,
                };
                let result = restore_with_observer(variants, &options, observer);
                let code = rewrite_stage_conditionals(result.code);
                let comment = macro_header(&pass_names, &definitions, &result.used_macros);
                let code = insert_header_comment(&code, &comment);

                restored.push(RestoredShader {
                    platform,
                    stage: *stage,
                    pass_name: pass_name.clone(),
                    code,
                });
            }
        }
    }

    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_material::{BgfxShader, Pass, PassVariant, ShaderDefinition};
    use core_restore::NoopObserver;

    fn shader(platform: ShaderPlatform, stage: ShaderStage, source: &str) -> ShaderDefinition {
        ShaderDefinition {
            platform,
            stage,
            bgfx_shader: BgfxShader {
                shader_bytes: source.as_bytes().to_vec(),
                size: -1,
                ..BgfxShader::default()
            },
            ..ShaderDefinition::default()
        }
    }

    fn sample_material() -> Material {
        Material {
            name: "water".to_string(),
            passes: vec![Pass {
                name: "Opaque".to_string(),
                variants: vec![
                    PassVariant {
                        is_supported: true,
                        flags: vec![("Fog".to_string(), "On".to_string())],
                        shaders: vec![shader(
                            ShaderPlatform::Essl310,
                            ShaderStage::Fragment,
                            "base();\nfog();\n",
                        )],
                    },
                    PassVariant {
                        is_supported: true,
                        flags: vec![("Fog".to_string(), "Off".to_string())],
                        shaders: vec![shader(
                            ShaderPlatform::Essl310,
                            ShaderStage::Fragment,
                            "base();\n",
                        )],
                    },
                ],
                ..Pass::default()
            }],
            ..Material::new()
        }
    }

    fn config() -> RestoreConfig {
        RestoreConfig {
            preprocess: false,
            search_timeout: None,
            ..RestoreConfig::default()
        }
    }

    #[test]
    fn restores_one_source_per_platform_stage() {
        let restored = restore_shaders(
            &sample_material(),
            &[ShaderPlatform::Essl310],
            &ShaderStage::ALL,
            &config(),
            &NoopObserver,
        )
        .unwrap();
        assert_eq!(restored.len(), 1);
        let shader = &restored[0];
        assert_eq!(shader.platform, ShaderPlatform::Essl310);
        assert_eq!(shader.stage, ShaderStage::Fragment);
        assert!(shader.code.contains("#ifdef FOG__ON\nfog();\n#endif"));
        assert!(shader.code.starts_with("/*\n* Available Macros:"));
    }

    #[test]
    fn header_lists_unused_macros() {
        let restored = restore_shaders(
            &sample_material(),
            &[ShaderPlatform::Essl310],
            &ShaderStage::ALL,
            &config(),
            &NoopObserver,
        )
        .unwrap();
        let code = &restored[0].code;
        // Only one pass exists, so the pass macro can never appear in a
        // directive.
        assert!(code.contains("* - OPAQUE_PASS (not used)"));
        assert!(code.contains("* - FOG__ON\n"));
        assert!(code.contains("* - FOG__OFF (not used)"));
    }

    #[test]
    fn other_platforms_produce_nothing() {
        let restored = restore_shaders(
            &sample_material(),
            &[ShaderPlatform::Direct3DSm65],
            &ShaderStage::ALL,
            &config(),
            &NoopObserver,
        )
        .unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn merged_stages_rewrite_stage_conditionals() {
        let mut material = sample_material();
        material.passes[0].variants[0].shaders.push(shader(
            ShaderPlatform::Essl310,
            ShaderStage::Vertex,
            "vertex_main();\n",
        ));
        material.passes[0].variants[1].shaders.push(shader(
            ShaderPlatform::Essl310,
            ShaderStage::Vertex,
            "vertex_main();\n",
        ));
        let restored = restore_shaders(
            &material,
            &[ShaderPlatform::Essl310],
            &ShaderStage::ALL,
            &RestoreConfig {
                merge_stages: true,
                ..config()
            },
            &NoopObserver,
        )
        .unwrap();
        assert_eq!(restored.len(), 1);
        let code = &restored[0].code;
        assert!(!code.contains("#ifdef BGFX_SHADER_TYPE_"));
        assert!(!code.contains("defined(BGFX_SHADER_TYPE_"));
        assert!(code.contains("#if BGFX_SHADER_TYPE_") || code.contains("#if !BGFX_SHADER_TYPE_"));
    }
}

//! `varying.def.sc` reconstruction.
//!
//! The interface file never survives compilation, but every shader records
//! its inputs. Each pass × platform contributes a pseudo-source listing the
//! declarations it needs; the decompiler then folds them into one file with
//! pass/platform conditionals. Afterwards the declaration columns are
//! aligned and platform flag macros become `BGFX_SHADER_LANGUAGE_*` value
//! tests, which is what the shader compiler actually defines.

use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};

use core_material::{Material, ShaderInput, ShaderPlatform, ShaderStage};
use core_restore::macros::flag_name_macro;
use core_restore::{FlagSet, RestoreOptions, SearchObserver, Variant, restore_with_observer};

/// One `varying.def.sc` line for a shader input. Instance data gets its own
/// `i_data*` slot; vertex-stage inputs become `a_*` attributes, everything
/// else `v_*` varyings.
pub(crate) fn varying_line(input: &ShaderInput, stage: ShaderStage) -> (bool, String) {
    let mut line = String::new();
    if let Some(precision) = input.precision {
        line.push_str(precision.name());
        line.push(' ');
    }
    if let Some(interpolation) = input.interpolation {
        line.push_str(interpolation.name());
        line.push(' ');
    }
    line.push_str(input.input_type.name());
    line.push(' ');

    let mut is_instance_data = false;
    let name = if let Some(slot) = input.name.strip_prefix("instanceData") {
        is_instance_data = true;
        format!("i_data{}", slot.parse::<u32>().unwrap_or(0) + 1)
    } else if stage == ShaderStage::Vertex {
        format!("a_{}", input.semantic.variable_name())
    } else {
        format!("v_{}", input.name)
    };
    line.push_str(&format!("{name} : {};", input.semantic.name()));

    (is_instance_data, line)
}

static A_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+? )(a_\w+)(\s+: \w+;)").unwrap());
static I_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+? )(i_\w+)(\s+: \w+;)").unwrap());
static V_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+? )(v_\w+)(\s+: \w+;)").unwrap());

fn align_declarations(code: String, pattern: &Regex) -> String {
    let mut type_width = 0;
    let mut name_width = 0;
    for caps in pattern.captures_iter(&code) {
        type_width = type_width.max(caps[1].len());
        name_width = name_width.max(caps[2].len());
    }
    if type_width == 0 {
        return code;
    }
    pattern
        .replace_all(&code, |caps: &Captures| {
            format!(
                "{:<type_width$}{:<name_width$}{}",
                &caps[1], &caps[2], &caps[3]
            )
        })
        .into_owned()
}

fn platform_language(platform: ShaderPlatform) -> (&'static str, u32) {
    let name = platform.name();
    if name.starts_with("Direct3D_") {
        let version = if platform == ShaderPlatform::Direct3DSm40 {
            400
        } else if name.starts_with("Direct3D_SM") {
            500
        } else {
            1
        };
        ("HLSL", version)
    } else if name.starts_with("GLSL_") || name.starts_with("ESSL_") {
        ("GLSL", name[name.len() - 3..].parse().unwrap_or(1))
    } else if platform == ShaderPlatform::Vulkan {
        ("SPIRV", 1)
    } else if platform == ShaderPlatform::Metal {
        ("METAL", 1)
    } else if platform == ShaderPlatform::Pssl {
        ("PSSL", 1)
    } else {
        ("UNKNOWN", 1)
    }
}

/// Align declaration columns and turn platform flag macros into
/// `BGFX_SHADER_LANGUAGE_*` comparisons.
fn postprocess_varying(code: String) -> String {
    let mut code = code;
    for pattern in [&A_DECL, &I_DECL, &V_DECL] {
        code = align_declarations(code, pattern);
    }

    for platform in ShaderPlatform::ALL {
        let (language, version) = platform_language(platform);
        let language = format!("BGFX_SHADER_LANGUAGE_{language}");
        let macro_name = flag_name_macro("platform", platform.name(), false);
        code = code
            .replace(
                &format!("defined({macro_name})"),
                &format!("({language} == {version})"),
            )
            .replace(
                &format!("#ifdef {macro_name}"),
                &format!("#if {language} == {version}"),
            )
            .replace(
                &format!("#ifndef {macro_name}"),
                &format!("#if {language} != {version}"),
            );
    }
    code
}

/// Rebuild `varying.def.sc` from the input declarations recorded in the
/// material's shaders. Returns an empty string when no shader declares any.
pub fn restore_varying(
    material: &Material,
    search_timeout: Option<Duration>,
    observer: &dyn SearchObserver,
) -> String {
    let mut variants: Vec<Variant> = Vec::new();

    for pass in &material.passes {
        // platform -> stage -> unique inputs, in observation order.
        let mut per_platform: Vec<(ShaderPlatform, Vec<(ShaderStage, Vec<ShaderInput>)>)> =
            Vec::new();
        for variant in &pass.variants {
            for shader in &variant.shaders {
                let platform_index = match per_platform
                    .iter()
                    .position(|(p, _)| *p == shader.platform)
                {
                    Some(index) => index,
                    None => {
                        per_platform.push((shader.platform, Vec::new()));
                        per_platform.len() - 1
                    }
                };
                let stages = &mut per_platform[platform_index].1;
                let stage_index = match stages.iter().position(|(s, _)| *s == shader.stage) {
                    Some(index) => index,
                    None => {
                        stages.push((shader.stage, Vec::new()));
                        stages.len() - 1
                    }
                };
                let inputs = &mut stages[stage_index].1;
                for input in &shader.inputs {
                    if !inputs.contains(input) {
                        inputs.push(input.clone());
                    }
                }
            }
        }

        for (platform, stages) in &mut per_platform {
            let mut vertex_attributes = Vec::new();
            let mut instance_data = Vec::new();
            let mut fragment_varyings = Vec::new();
            for (stage, inputs) in stages {
                inputs.sort_by(|a, b| a.name.cmp(&b.name));
                for input in inputs.iter() {
                    let (is_instance_data, mut line) = varying_line(input, *stage);
                    if inputs.iter().filter(|i| i.name == input.name).count() != 1 {
                        line.push_str(" // ?");
                    }
                    if is_instance_data {
                        instance_data.push(line);
                    } else if *stage == ShaderStage::Vertex {
                        vertex_attributes.push(line);
                    } else {
                        fragment_varyings.push(line);
                    }
                }
            }

            let mut blocks = Vec::new();
            if !vertex_attributes.is_empty() {
                blocks.push(vertex_attributes.join("\n"));
            }
            if !instance_data.is_empty() {
                blocks.push(instance_data.join("\n"));
            }
            if !fragment_varyings.is_empty() {
                blocks.push(fragment_varyings.join("\n"));
            }
            if blocks.is_empty() {
                continue;
            }

            let flags: FlagSet = [
                ("pass".to_string(), pass.name.clone()),
                ("f_platform".to_string(), platform.name().to_string()),
            ]
            .into_iter()
            .collect();
            variants.push(Variant::new(flags, blocks.join("\n\n")));
        }
    }

    if variants.is_empty() {
        return String::new();
    }

    let options = RestoreOptions {
        remove_comments: false,
        preprocess: false,
        search_timeout,
    };
    let restored = restore_with_observer(&variants, &options, observer);
    postprocess_varying(restored.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_material::{
        BgfxShader, InputSemantic, InputType, Pass, PassVariant, Precision, ShaderDefinition,
    };
    use core_restore::NoopObserver;

    fn input(name: &str, input_type: InputType, semantic_index: u8, sub_index: u8) -> ShaderInput {
        ShaderInput {
            name: name.to_string(),
            input_type,
            semantic: InputSemantic {
                index: semantic_index,
                sub_index,
            },
            per_instance: false,
            precision: None,
            interpolation: None,
        }
    }

    #[test]
    fn vertex_inputs_become_attributes() {
        let position = input("position", InputType::Vec3, 0, 0);
        let (instanced, line) = varying_line(&position, ShaderStage::Vertex);
        assert!(!instanced);
        assert_eq!(line, "vec3 a_position : POSITION;");
    }

    #[test]
    fn fragment_inputs_become_varyings() {
        let mut texcoord = input("texcoord0", InputType::Vec2, 7, 0);
        texcoord.precision = Some(Precision::Highp);
        let (instanced, line) = varying_line(&texcoord, ShaderStage::Fragment);
        assert!(!instanced);
        assert_eq!(line, "highp vec2 v_texcoord0 : TEXCOORD0;");
    }

    #[test]
    fn instance_data_maps_to_numbered_slots() {
        let data = input("instanceData0", InputType::Vec4, 7, 1);
        let (instanced, line) = varying_line(&data, ShaderStage::Vertex);
        assert!(instanced);
        assert_eq!(line, "vec4 i_data1 : TEXCOORD1;");
    }

    #[test]
    fn declarations_align_in_columns() {
        let code = "vec4 a_color0 : COLOR0;\nhighp vec3 a_position : POSITION;\n".to_string();
        let aligned = align_declarations(code, &A_DECL);
        assert_eq!(
            aligned,
            "vec4       a_color0   : COLOR0;\nhighp vec3 a_position : POSITION;\n"
        );
    }

    #[test]
    fn platform_macros_become_language_tests() {
        let code = "#ifdef PLATFORM__ESSL_310\nx;\n#endif\n".to_string();
        let out = postprocess_varying(code);
        assert!(out.contains("#if BGFX_SHADER_LANGUAGE_GLSL == 310"));
        let code = "#if defined(PLATFORM__METAL) || defined(PLATFORM__VULKAN)\n".to_string();
        let out = postprocess_varying(code);
        assert!(out.contains("(BGFX_SHADER_LANGUAGE_METAL == 1)"));
        assert!(out.contains("(BGFX_SHADER_LANGUAGE_SPIRV == 1)"));
    }

    #[test]
    fn varying_def_restores_across_platforms() {
        let shader_a = ShaderDefinition {
            platform: ShaderPlatform::Essl310,
            stage: ShaderStage::Vertex,
            inputs: vec![input("position", InputType::Vec3, 0, 0)],
            bgfx_shader: BgfxShader::default(),
            hash: 0,
        };
        let mut shader_b = shader_a.clone();
        shader_b.platform = ShaderPlatform::Glsl430;
        shader_b
            .inputs
            .push(input("color0", InputType::Vec4, 4, 0));

        let material = Material {
            passes: vec![Pass {
                name: "Opaque".to_string(),
                variants: vec![PassVariant {
                    is_supported: true,
                    flags: Vec::new(),
                    shaders: vec![shader_a, shader_b],
                }],
                ..Pass::default()
            }],
            ..Material::new()
        };

        let varying = restore_varying(&material, None, &NoopObserver);
        assert!(varying.contains("a_position"));
        assert!(varying.contains("a_color0"));
        assert!(varying.contains("BGFX_SHADER_LANGUAGE_GLSL == 430"));
    }
}

//! Source normalisation before and after decompilation.
//!
//! `strip_comments` removes `//` and `/* */` comments and collapses blank
//! runs. `preprocess` rewrites raw GLSL output back into the shader-compiler
//! dialect the sources were written in: auto-registered uniforms disappear,
//! attribute/varying declarations become `$input`/`$output` markers, sampler
//! and storage declarations become the AUTOREG macro calls, and the compute
//! thread layout becomes `NUM_THREADS`. The substitution table is a contract;
//! the tests below pin every mapping. Unknown constructs pass through
//! untouched.

use regex::Regex;
use std::sync::LazyLock;

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//.*\n").unwrap());
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n+").unwrap());

/// Remove single-line and multi-line comments, collapsing blank-line runs.
pub(crate) fn strip_comments(code: &str) -> String {
    let code = LINE_COMMENT.replace_all(code, "");
    let code = BLOCK_COMMENT.replace_all(&code, "");
    BLANK_RUN.replace_all(&code, "\n").into_owned()
}

static AUTO_UNIFORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^uniform\s+\w+\s+u_[\w\[\]]+;\n").unwrap());
static FRAG_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\W)bgfx_FragColor(\W)").unwrap());
static FRAG_DATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\W)bgfx_FragData(\W)").unwrap());
static OUT_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^out\s.+?;\n").unwrap());
static VARYING_OUT_DEFINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#define varying out$").unwrap());
static DEFINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#define\s.+?\n").unwrap());
static IF_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?ms)^#if\s.+?#endif\n").unwrap());
static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#extension\s.+?\n").unwrap());
static VARYING_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s\w]*?varying\s.+? (\w+);$").unwrap());
static ATTRIBUTE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s\w]*?attribute\s.+? (\w+);$").unwrap());
static VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A#version\s.+?\n").unwrap());
static THREAD_LAYOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^layout \(local_size_x = (\d+), local_size_y = (\d+), local_size_z = (\d+)\) in;",
    )
    .unwrap()
});

/// `uniform <qualified type> <name>;` to `<MACRO>_AUTOREG(<name>);`.
const SAMPLER_MACROS: &[(&str, &str)] = &[
    ("lowp sampler2D", "SAMPLER2D"),
    ("highp sampler2DMS", "SAMPLER2DMS"),
    ("highp sampler3D", "SAMPLER3D"),
    ("lowp samplerCube", "SAMPLERCUBE"),
    ("highp sampler2DShadow", "SAMPLER2DSHADOW"),
    ("highp sampler2D", "SAMPLER2D_HIGHP"),
    ("highp samplerCube", "SAMPLERCUBE_HIGHP"),
    ("highp sampler2DArray", "SAMPLER2DARRAY"),
    ("highp sampler2DMSArray", "SAMPLER2DMSARRAY"),
    ("highp samplerCubeArray", "SAMPLERCUBEARRAY"),
    ("highp sampler2DArrayShadow", "SAMPLER2DARRAYSHADOW"),
    ("highp isampler2D", "ISAMPLER2D"),
    ("highp usampler2D", "USAMPLER2D"),
    ("highp isampler3D", "ISAMPLER3D"),
];

static SAMPLERS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    SAMPLER_MACROS
        .iter()
        .map(|(glsl, macro_name)| {
            let pattern = format!(r"(?m)^uniform {glsl} (\w+);");
            (
                Regex::new(&pattern).unwrap(),
                format!("{macro_name}_AUTOREG(${{1}});"),
            )
        })
        .collect()
});

static STORAGE_BUFFERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?m)^layout\(std430, .+?\) readonly buffer (\w+) \{ (\w+) .+? \}").unwrap(),
            "BUFFER_RO_AUTOREG(${1}, ${2});",
        ),
        (
            Regex::new(r"(?m)^layout\(std430, .+?\) writeonly buffer (\w+) \{ (\w+) .+? \}")
                .unwrap(),
            "BUFFER_WR_AUTOREG(${1}, ${2});",
        ),
        (
            Regex::new(r"(?m)^layout\(std430, .+?\) buffer (\w+) \{ (\w+) .+? \}").unwrap(),
            "BUFFER_RW_AUTOREG(${1}, ${2})",
        ),
    ]
});

static IMAGES: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    let mut rules = Vec::new();
    for (access_keyword, access_id) in [("readonly ", "RO"), ("writeonly ", "WR"), ("", "RW")] {
        for type_prefix in ["", "u"] {
            for (glsl_dim, macro_dim) in [
                ("image2D", "IMAGE2D"),
                ("image2DArray", "IMAGE2D_ARRAY"),
                ("image3D", "IMAGE3D"),
            ] {
                let macro_prefix = type_prefix.to_uppercase();
                let pattern = format!(
                    r"(?m)^layout\((.+?), .+?\) {access_keyword}uniform highp {type_prefix}{glsl_dim} (\w+)"
                );
                rules.push((
                    Regex::new(&pattern).unwrap(),
                    format!("{macro_prefix}{macro_dim}_{access_id}_AUTOREG(${{2}}, ${{1}})"),
                ));
            }
        }
    }
    rules
});

/// Rewrite plain GLSL back into shader-compiler source.
pub(crate) fn preprocess(code: &str) -> String {
    let mut code = AUTO_UNIFORM.replace_all(code, "").into_owned();

    code = FRAG_COLOR
        .replace_all(&code, "${1}gl_FragColor${2}")
        .into_owned();
    code = FRAG_DATA
        .replace_all(&code, "${1}gl_FragData${2}")
        .into_owned();

    code = OUT_DECL.replace_all(&code, "").into_owned();

    // The compiler emits `#define varying out` only for the vertex stage.
    let is_vertex_stage = VARYING_OUT_DEFINE.is_match(&code);

    code = DEFINE.replace_all(&code, "").into_owned();
    code = IF_BLOCK.replace_all(&code, "").into_owned();
    code = EXTENSION.replace_all(&code, "").into_owned();

    let varying_marker = if is_vertex_stage {
        "$$output ${1}"
    } else {
        "$$input ${1}"
    };
    code = VARYING_DECL.replace_all(&code, varying_marker).into_owned();
    code = ATTRIBUTE_DECL
        .replace_all(&code, "$$input ${1}")
        .into_owned();

    code = VERSION.replace_all(&code, "").into_owned();

    for (pattern, replacement) in SAMPLERS.iter() {
        code = pattern.replace_all(&code, replacement.as_str()).into_owned();
    }
    for (pattern, replacement) in STORAGE_BUFFERS.iter() {
        code = pattern.replace_all(&code, *replacement).into_owned();
    }
    for (pattern, replacement) in IMAGES.iter() {
        code = pattern.replace_all(&code, replacement.as_str()).into_owned();
    }

    code = THREAD_LAYOUT
        .replace_all(&code, "NUM_THREADS(${1}, ${2}, ${3})")
        .into_owned();

    code
}

/// Merge consecutive `$input`/`$output` marker lines and flag lines whose
/// shape suggests a rewrite may have changed semantics.
pub(crate) fn postprocess(code: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum Marker {
        None,
        Input,
        Output,
    }

    fn classify(line: &str) -> (Marker, &'static str) {
        if line.starts_with("$input ") {
            (Marker::Input, "$input ")
        } else if line.starts_with("$output ") {
            (Marker::Output, "$output ")
        } else {
            (Marker::None, "")
        }
    }

    let mut merged: Vec<String> = Vec::new();
    let mut run_args: Vec<String> = Vec::new();
    let mut run_marker = Marker::None;

    for line in code.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let (marker, prefix) = classify(content);

        if run_marker != Marker::None {
            if marker == run_marker {
                run_args.push(content.strip_prefix(prefix).unwrap_or(content).to_string());
            } else {
                merged.push(format!("{}\n", run_args.join(", ")));
            }
        }
        if run_marker == Marker::None || run_marker != marker {
            if marker != Marker::None {
                run_args = vec![content.to_string()];
            } else {
                merged.push(line.to_string());
            }
        }
        run_marker = marker;
    }
    if run_marker != Marker::None {
        merged.push(format!("{}\n", run_args.join(", ")));
    }

    let mut out = String::new();
    for line in &merged {
        if line.contains(") * (") || line.contains("][") {
            let content = line.strip_suffix('\n');
            out.push_str(content.unwrap_or(line));
            out.push_str(" // Attention!");
            if content.is_some() {
                out.push('\n');
            }
        } else {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let src = "a;\n// gone\nb; /* mid */ c;\n/* multi\nline */\nd;\n";
        let out = strip_comments(src);
        assert!(!out.contains("gone"));
        assert!(!out.contains("mid"));
        assert!(!out.contains("multi"));
        assert!(out.contains("a;"));
        assert!(out.contains("b;  c;"));
        assert!(!out.contains("\n\n"));
    }

    #[test]
    fn drops_reserved_uniforms_and_directives() {
        let src = "#version 310 es\n#extension GL_EXT_foo : enable\nuniform mat4 u_viewProj;\nuniform vec4 u_fogColor[2];\n#define FOO 1\nvoid main() {}\n";
        let out = preprocess(src);
        assert!(!out.contains("#version"));
        assert!(!out.contains("#extension"));
        assert!(!out.contains("u_viewProj"));
        assert!(!out.contains("u_fogColor"));
        assert!(!out.contains("#define"));
        assert!(out.contains("void main() {}"));
    }

    #[test]
    fn renames_reserved_outputs() {
        let out = preprocess(" bgfx_FragColor = v; bgfx_FragData[0] = v;\n");
        assert!(out.contains("gl_FragColor"));
        assert!(out.contains("gl_FragData[0]"));
    }

    #[test]
    fn varying_direction_follows_stage() {
        let vertex = "#define varying out\nvarying vec4 v_color;\n";
        let fragment = "varying vec4 v_color;\n";
        assert!(preprocess(vertex).contains("$output v_color"));
        assert!(preprocess(fragment).contains("$input v_color"));
        assert!(preprocess("attribute vec3 a_position;\n").contains("$input a_position"));
    }

    #[test]
    fn sampler_table_maps_to_autoreg_macros() {
        let cases = [
            ("uniform lowp sampler2D s_Mat;", "SAMPLER2D_AUTOREG(s_Mat);"),
            (
                "uniform highp sampler2D s_Depth;",
                "SAMPLER2D_HIGHP_AUTOREG(s_Depth);",
            ),
            (
                "uniform highp sampler2DArrayShadow s_Shadow;",
                "SAMPLER2DARRAYSHADOW_AUTOREG(s_Shadow);",
            ),
            (
                "uniform highp isampler2D s_Ids;",
                "ISAMPLER2D_AUTOREG(s_Ids);",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(preprocess(&format!("{input}\n")).trim_end(), expected);
        }
    }

    #[test]
    fn storage_buffers_map_by_access() {
        let ro = "layout(std430, binding = 0) readonly buffer LightData { vec4 data[]; };\n";
        let wr = "layout(std430, binding = 1) writeonly buffer OutData { uint data[]; };\n";
        let rw = "layout(std430, binding = 2) buffer Histogram { uint bins[]; };\n";
        assert!(preprocess(ro).contains("BUFFER_RO_AUTOREG(LightData, vec4);"));
        assert!(preprocess(wr).contains("BUFFER_WR_AUTOREG(OutData, uint);"));
        assert!(preprocess(rw).contains("BUFFER_RW_AUTOREG(Histogram, uint)"));
    }

    #[test]
    fn images_map_by_access_signedness_and_dimension() {
        let cases = [
            (
                "layout(rgba8, binding = 0) readonly uniform highp image2D s_Src",
                "IMAGE2D_RO_AUTOREG(s_Src, rgba8)",
            ),
            (
                "layout(r32ui, binding = 1) writeonly uniform highp uimage2D s_Dst",
                "UIMAGE2D_WR_AUTOREG(s_Dst, r32ui)",
            ),
            (
                "layout(rgba16f, binding = 2) uniform highp image2DArray s_Layers",
                "IMAGE2D_ARRAY_RW_AUTOREG(s_Layers, rgba16f)",
            ),
            (
                "layout(r32f, binding = 3) readonly uniform highp image3D s_Vol",
                "IMAGE3D_RO_AUTOREG(s_Vol, r32f)",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(preprocess(&format!("{input}\n")).trim_end(), expected);
        }
    }

    #[test]
    fn compute_thread_layout_becomes_num_threads() {
        let src = "layout (local_size_x = 8, local_size_y = 4, local_size_z = 1) in;\n";
        assert_eq!(preprocess(src).trim_end(), "NUM_THREADS(8, 4, 1)");
    }

    #[test]
    fn preprocessor_blocks_are_removed_whole() {
        let src = "#if defined(FOO)\nint x;\n#endif\nint y;\n";
        let out = preprocess(src);
        assert!(!out.contains("int x;"));
        assert!(out.contains("int y;"));
    }

    #[test]
    fn postprocess_merges_marker_runs() {
        let src = "$input a_position\n$input a_normal\n$input a_texcoord0\nvoid main() {\n}\n";
        let out = postprocess(src);
        assert!(out.contains("$input a_position, a_normal, a_texcoord0\n"));
        assert!(out.contains("void main()"));
    }

    #[test]
    fn postprocess_separates_input_and_output_runs() {
        let src = "$input a_position\n$output v_color\n$output v_fog\n";
        let out = postprocess(src);
        assert!(out.contains("$input a_position\n"));
        assert!(out.contains("$output v_color, v_fog\n"));
    }

    #[test]
    fn postprocess_flags_suspect_rewrites() {
        let src = "x = (a) * (b);\ny = m[0][1];\nz = a * b;\n";
        let out = postprocess(src);
        assert!(out.contains("x = (a) * (b); // Attention!"));
        assert!(out.contains("y = m[0][1]; // Attention!"));
        assert!(out.contains("z = a * b;\n"));
    }
}

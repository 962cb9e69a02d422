//! Top-level function and struct extraction.
//!
//! Each extracted body is replaced with a single marker line so that the main
//! body and every function diff in their own namespace. Bodies are matched by
//! brace balancing from the header's opening `{`; if the balance never
//! returns to zero the extraction stops at that function and the remainder
//! stays in the main body untouched.

use regex::Regex;
use std::sync::LazyLock;

static FUNC_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*?([^#\s]\w+)\s+(\w+)\s*\(([^;]*?)\)\s*\{").unwrap());
static STRUCT_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^\s*?struct\s+(\w+)\s*\{(.*?)\};").unwrap());

/// Marker line standing in for an extracted function or struct body.
pub(crate) fn function_marker(signature: &str) -> String {
    format!("@FUNC[{signature}]FUNC@")
}

/// One variant's body after extraction: the residual main body plus the
/// extracted namespaces. A signature occurring twice in one variant keeps the
/// last body.
#[derive(Debug)]
pub(crate) struct ExtractedVariant {
    pub main: String,
    pub functions: Vec<(String, String)>,
}

fn upsert(functions: &mut Vec<(String, String)>, name: String, body: String) {
    match functions.iter().position(|(n, _)| *n == name) {
        Some(index) => functions[index].1 = body,
        None => functions.push((name, body)),
    }
}

pub(crate) fn extract(code: String) -> ExtractedVariant {
    let mut remaining = code;
    let mut modified = String::new();
    let mut functions: Vec<(String, String)> = Vec::new();

    while let Some(caps) = FUNC_HEADER.captures(&remaining) {
        let header = caps.get(0).unwrap();
        let args = caps[3].replace('\n', "");
        let signature = format!("{} {}({})", &caps[1], &caps[2], args);

        let body_start = header.end();
        let mut balance = 1u32;
        let mut body_end = None;
        for (offset, byte) in remaining.as_bytes()[body_start..].iter().enumerate() {
            match byte {
                b'{' => balance += 1,
                b'}' => {
                    balance -= 1;
                    if balance == 0 {
                        body_end = Some(body_start + offset);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = body_end else {
            break;
        };

        modified.push_str(&remaining[..header.start()]);
        modified.push_str(&function_marker(&signature));
        modified.push('\n');
        upsert(&mut functions, signature, remaining[body_start..end].to_string());
        remaining = remaining[end + 1..].to_string();
    }

    let mut main = modified;
    main.push_str(&remaining);

    let matches: Vec<(String, String, String)> = STRUCT_DECL
        .captures_iter(&main)
        .map(|caps| {
            (
                caps.get(0).unwrap().as_str().to_string(),
                format!("struct {}", &caps[1]),
                caps[2].to_string(),
            )
        })
        .collect();
    for (matched, name, body) in matches {
        let marker = format!("{}\n", function_marker(&name));
        main = main.replace(&matched, &marker);
        upsert(&mut functions, name, body);
    }

    ExtractedVariant { main, functions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_bodies_into_namespaces() {
        let src = "int g;\nvoid main() {\n  g = 1;\n}\nfloat f(int a,\n    int b) {\n  return a + b;\n}\n";
        let extracted = extract(src.to_string());
        assert!(extracted.main.contains(&function_marker("void main()")));
        assert!(extracted.main.contains(&function_marker("float f(int a,    int b)")));
        assert!(extracted.main.contains("int g;"));
        let names: Vec<_> = extracted.functions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["void main()", "float f(int a,    int b)"]
        );
        assert_eq!(extracted.functions[0].1, "\n  g = 1;\n");
    }

    #[test]
    fn nested_braces_balance() {
        let src = "void main() {\n  if (x) {\n    y();\n  }\n}\n";
        let extracted = extract(src.to_string());
        assert_eq!(extracted.functions.len(), 1);
        assert!(extracted.functions[0].1.contains("if (x) {"));
        assert!(extracted.functions[0].1.contains("  }\n"));
    }

    #[test]
    fn unterminated_body_stops_extraction_without_duplication() {
        let src = "int g;\nvoid main() {\n  g = 1;\n";
        let extracted = extract(src.to_string());
        assert!(extracted.functions.is_empty());
        assert_eq!(extracted.main, src);
    }

    #[test]
    fn preprocessor_lines_are_not_function_headers() {
        let src = "#define FOO(x) {x}\nint g;\n";
        let extracted = extract(src.to_string());
        assert!(extracted.functions.is_empty());
    }

    #[test]
    fn extracts_structs_with_namespace_prefix() {
        let src = "struct Light {\n  vec3 pos;\n};\nvoid main() {\n}\n";
        let extracted = extract(src.to_string());
        let names: Vec<_> = extracted.functions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["void main()", "struct Light"]);
        assert!(extracted.main.contains(&function_marker("struct Light")));
        assert!(extracted.functions[1].1.contains("vec3 pos;"));
    }
}

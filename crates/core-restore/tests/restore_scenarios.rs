//! End-to-end decompilation scenarios over small hand-built variant sets.

use core_restore::{FlagSet, RestoreOptions, Variant, restore};

fn flags(pairs: &[(&str, &str)]) -> FlagSet {
    pairs.iter().copied().collect()
}

fn saturated() -> RestoreOptions {
    RestoreOptions {
        search_timeout: None,
        ..RestoreOptions::default()
    }
}

#[test]
fn two_variants_one_flag() {
    let variants = vec![
        Variant::new(flags(&[("f_MODE", "A")]), "x=1;\n"),
        Variant::new(flags(&[("f_MODE", "B")]), "x=2;\n"),
    ];
    let restored = restore(&variants, &saturated());
    assert_eq!(
        restored.code,
        "#ifdef MODE__A\nx=1;\n#endif\n#ifdef MODE__B\nx=2;\n#endif"
    );
    assert_eq!(
        restored.used_macros,
        ["MODE__A".to_string(), "MODE__B".to_string()]
            .into_iter()
            .collect()
    );
}

#[test]
fn shared_prelude_stays_unconditional() {
    let variants = vec![
        Variant::new(flags(&[("f_K", "R")]), "init();\nr();\n"),
        Variant::new(flags(&[("f_K", "G")]), "init();\ng();\n"),
        Variant::new(flags(&[("f_K", "B")]), "init();\nb();\n"),
    ];
    let restored = restore(&variants, &saturated());
    assert_eq!(
        restored.code,
        "init();\n\
         #ifdef K__R\nr();\n#endif\n\
         #ifdef K__G\ng();\n#endif\n\
         #ifdef K__B\nb();\n#endif"
    );
}

#[test]
fn function_difference_stays_inside_function() {
    let variants = vec![
        Variant::new(
            flags(&[("f_MODE", "A")]),
            "int g;\nvoid f() {\n  a();\n}\n",
        ),
        Variant::new(
            flags(&[("f_MODE", "B")]),
            "int g;\nvoid f() {\n  b();\n}\n",
        ),
    ];
    let restored = restore(&variants, &saturated());

    let body_start = restored.code.find("void f() {").expect("function emitted");
    let first_directive = restored.code.find("#ifdef").expect("condition emitted");
    assert!(
        first_directive > body_start,
        "main namespace must carry no condition: {}",
        restored.code
    );
    assert!(restored.code.starts_with("int g;"));
    assert!(restored.code.contains("#ifdef MODE__A\n  a();\n#endif"));
    assert!(restored.code.contains("#ifdef MODE__B\n  b();\n#endif"));
}

#[test]
fn struct_difference_reassembles_with_terminator() {
    let variants = vec![
        Variant::new(
            flags(&[("f_MODE", "A")]),
            "struct Light {\n  vec3 pos;\n};\nint g;\n",
        ),
        Variant::new(
            flags(&[("f_MODE", "B")]),
            "struct Light {\n  vec3 pos;\n  vec3 dir;\n};\nint g;\n",
        ),
    ];
    let restored = restore(&variants, &saturated());
    assert!(restored.code.contains("struct Light {"));
    assert!(restored.code.contains("};"));
    assert!(restored.code.contains("#ifdef MODE__B\n  vec3 dir;\n#endif"));
    assert!(restored.code.contains("int g;"));
}

#[test]
fn shared_flag_is_filtered_from_output() {
    let variants = vec![
        Variant::new(
            flags(&[("f_PLATFORM", "X"), ("f_MODE", "A")]),
            "x=1;\n",
        ),
        Variant::new(
            flags(&[("f_PLATFORM", "X"), ("f_MODE", "B")]),
            "x=2;\n",
        ),
    ];
    let restored = restore(&variants, &saturated());
    assert!(!restored.code.contains("PLATFORM"));
    assert!(restored.used_macros.iter().all(|m| !m.contains("PLATFORM")));
    assert!(restored.used_macros.contains("MODE__A"));
}

#[test]
fn boolean_flag_renders_in_positive_form() {
    let variants = vec![
        Variant::new(flags(&[("f_FEATURE", "Off")]), "base;\n"),
        Variant::new(flags(&[("f_FEATURE", "On")]), "base;\nextra;\n"),
    ];
    let restored = restore(&variants, &saturated());
    assert!(restored.code.contains("#ifdef FEATURE__ON\nextra;\n#endif"));
    assert!(!restored.code.contains("#ifndef"));
    assert!(!restored.code.contains("!defined"));
}

#[test]
fn inexpressible_condition_is_marked_approximate() {
    // The guarded line follows the XOR of two flags, which a strict left-fold
    // over single predicates cannot express.
    let variants = vec![
        Variant::new(flags(&[("f_F", "A"), ("f_G", "Y")]), "common;\n"),
        Variant::new(flags(&[("f_F", "A"), ("f_G", "N")]), "common;\nx;\n"),
        Variant::new(flags(&[("f_F", "B"), ("f_G", "Y")]), "common;\nx;\n"),
        Variant::new(flags(&[("f_F", "B"), ("f_G", "N")]), "common;\n"),
    ];
    let options = RestoreOptions {
        search_timeout: Some(std::time::Duration::from_millis(1)),
        ..RestoreOptions::default()
    };
    let restored = restore(&variants, &options);
    assert!(
        restored.code.contains("// Approximation, matches "),
        "missing approximation marker: {}",
        restored.code
    );
    assert!(restored.code.contains(" cases out of 4"));

    let opens = restored
        .code
        .lines()
        .filter(|l| l.starts_with("#if"))
        .count();
    let closes = restored
        .code
        .lines()
        .filter(|l| *l == "#endif")
        .count();
    assert_eq!(opens, closes, "unbalanced output: {}", restored.code);
}

#[test]
fn empty_input_restores_to_empty() {
    let restored = restore(&[], &saturated());
    assert!(restored.code.is_empty());
    assert!(restored.used_macros.is_empty());
}

#[test]
fn conjunction_renders_as_if_with_defined() {
    // Guarded line present only when both flags take their first value.
    let variants = vec![
        Variant::new(flags(&[("f_F", "A"), ("f_G", "Y")]), "common;\nboth;\n"),
        Variant::new(flags(&[("f_F", "A"), ("f_G", "N")]), "common;\n"),
        Variant::new(flags(&[("f_F", "B"), ("f_G", "Y")]), "common;\n"),
        Variant::new(flags(&[("f_F", "B"), ("f_G", "N")]), "common;\n"),
    ];
    let restored = restore(&variants, &saturated());
    assert!(
        restored
            .code
            .contains("#if defined(F__A) && defined(G__Y)\nboth;\n#endif"),
        "unexpected directive: {}",
        restored.code
    );
    assert!(restored.used_macros.contains("F__A"));
    assert!(restored.used_macros.contains("G__Y"));
}

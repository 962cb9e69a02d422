//! Macro identifier derivation.
//!
//! These names are a stable contract: reconstructed sources and the macro
//! summary emitted alongside them must agree across runs and across tools
//! that consume the output.

use regex::Regex;
use std::sync::LazyLock;

static LOWER_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z]+)([A-Z])").unwrap());
static UPPER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static DIGIT_LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)([a-zA-Z])").unwrap());

/// Upper-snake-case form of a camel-case definition name.
///
/// `aA` becomes `A_A`, `AAa` becomes `A_AA`, `00X` becomes `00_X`.
pub fn definition_name(name: &str) -> String {
    let name = LOWER_UPPER.replace_all(name, "${1}_${2}");
    let name = UPPER_RUN.replace_all(&name, "${1}_${2}");
    let name = DIGIT_LETTER.replace_all(&name, "${1}_${2}");
    name.to_uppercase()
}

/// Macro for a named flag. Boolean-valued flags collapse to the bare name;
/// everything else carries the value with a `__` separator.
pub fn flag_name_macro(name: &str, value: &str, is_bool: bool) -> String {
    if is_bool {
        definition_name(name)
    } else {
        definition_name(&format!("{name}__{value}"))
    }
}

/// Macro for a render pass name, always suffixed `_PASS`.
pub fn pass_name_macro(name: &str) -> String {
    let name = definition_name(name);
    if name.ends_with("_PASS") {
        name
    } else {
        format!("{name}_PASS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_name_inserts_boundaries() {
        assert_eq!(definition_name("FancyWater"), "FANCY_WATER");
        assert_eq!(definition_name("RGBLayout"), "RGB_LAYOUT");
        assert_eq!(definition_name("msaa4x"), "MSAA4_X");
        assert_eq!(definition_name("Seasons__Off"), "SEASONS__OFF");
    }

    #[test]
    fn flag_macro_keeps_value_unless_bool() {
        assert_eq!(flag_name_macro("Fog", "Enabled", false), "FOG__ENABLED");
        assert_eq!(flag_name_macro("Fog", "Enabled", true), "FOG");
    }

    #[test]
    fn pass_macro_appends_suffix_once() {
        assert_eq!(pass_name_macro("Transparent"), "TRANSPARENT_PASS");
        assert_eq!(pass_name_macro("DepthOnlyPass"), "DEPTH_ONLY_PASS");
    }
}

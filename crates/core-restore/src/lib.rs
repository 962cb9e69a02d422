//! Macro decompiler: rebuild one parameterised shader source from many
//! compiled variants.
//!
//! Input is a list of `(flag assignment, source)` variants. The pipeline
//! normalises each source, splits out top-level functions and structs so
//! each body diffs in its own namespace, interns lines, merges identical
//! variants, folds everything into one combined sequence with per-line
//! appearance lists, groups consecutive lines by appearance, finds a boolean
//! expression over the flags for every conditional group and re-emits the
//! combined source wrapped in preprocessor conditionals.
//!
//! The whole run is single-threaded and owns its intern tables; output is a
//! deterministic function of the input (given a search budget large enough
//! to saturate, or none).

use std::collections::HashSet;
use std::time::Duration;

pub mod macros;

mod definition;
mod diff;
mod encode;
mod expr;
mod extract;
mod flags;
mod group;
mod namespace;
mod normalize;
mod search;

pub use flags::FlagSet;

use definition::FlagDefinition;
use encode::LineTable;
use extract::function_marker;
use flags::FlagTable;
use search::SearchInput;

/// One concrete shader variant observed at input.
#[derive(Debug, Clone)]
pub struct Variant {
    pub flags: FlagSet,
    pub code: String,
}

impl Variant {
    pub fn new(flags: FlagSet, code: impl Into<String>) -> Self {
        Self {
            flags,
            code: code.into(),
        }
    }
}

/// Knobs for one decompilation run.
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Strip `//` and `/* */` comments before diffing.
    pub remove_comments: bool,
    /// Rewrite raw GLSL into shader-compiler source before diffing and run
    /// the marker-merging fix-ups afterwards.
    pub preprocess: bool,
    /// Wall-clock budget for the brute-force expression search, per
    /// condition. `None` disables the timer; the search then runs until the
    /// bounded token-list space is exhausted, which keeps reference outputs
    /// stable.
    pub search_timeout: Option<Duration>,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            remove_comments: true,
            preprocess: false,
            search_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Progress hook for the expression search. The decompiler itself never logs;
/// callers that want diagnostics install an observer.
pub trait SearchObserver {
    /// The greedy search did not saturate; the brute-force pass starts.
    fn slow_search(&self) {}
    /// Both passes finished without a perfect expression.
    fn not_found(&self) {}
}

/// Observer that drops every notification.
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Result of one decompilation run.
#[derive(Debug)]
pub struct Restored {
    /// Every macro identifier referenced by an emitted directive.
    pub used_macros: HashSet<String>,
    /// The reassembled source.
    pub code: String,
}

pub fn restore(variants: &[Variant], options: &RestoreOptions) -> Restored {
    restore_with_observer(variants, options, &NoopObserver)
}

pub fn restore_with_observer(
    variants: &[Variant],
    options: &RestoreOptions,
    observer: &dyn SearchObserver,
) -> Restored {
    let mut flag_table = FlagTable::default();
    let mut extracted = Vec::with_capacity(variants.len());
    for variant in variants {
        let mut code = variant.code.clone();
        if options.remove_comments {
            code = normalize::strip_comments(&code);
        }
        if options.preprocess {
            code = normalize::preprocess(&code);
        }
        let flags = flag_table.intern(&variant.flags);
        extracted.push((extract::extract(code), flags));
    }

    let mut line_table = LineTable::default();
    let encoded = encode::encode_variants(&extracted, &mut line_table);
    let diffed = encoded.map(diff::fold_permutations);
    let mut grouped = diffed.map(|code| code.group_lines());

    let mut inputs: Vec<SearchInput> = Vec::new();
    grouped.for_each_mut(|groups| {
        let mut flag_def = FlagDefinition::from_groups(groups, &flag_table);
        flag_def.filter_and_bias();
        let universe = group::all_flags_list(groups);
        search::assign_expressions(groups, &universe, &flag_def, &mut inputs);
    });

    let results =
        search::expression_search(&inputs, &flag_table, options.search_timeout, observer);
    let (directives, used_macros) = expr::process_expressions(&results, &inputs);

    let mut code = group::assemble_groups(&grouped.main, &line_table, &directives);
    for (name, groups) in &grouped.functions {
        let mut body = group::assemble_groups(groups, &line_table, &directives);
        if !body.starts_with('\n') {
            body.insert(0, '\n');
        }
        if !body.ends_with('\n') {
            body.push('\n');
        }
        let terminator = if name.starts_with("struct ") { ";" } else { "" };
        code = code.replace(
            &function_marker(name),
            &format!("{name} {{{body}}}{terminator}"),
        );
    }

    if options.preprocess {
        code = normalize::postprocess(&code);
    }

    Restored { used_macros, code }
}

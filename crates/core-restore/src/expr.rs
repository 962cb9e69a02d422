//! Symbolic conditions: lifting, simplification and directive formatting.
//!
//! Token lists are lifted into expressions over macro atoms named by the
//! identifier contract in [`crate::macros`]. Each distinct pre-simplification
//! expression is minimised once (truth table, Quine-McCluskey prime
//! implicants, essential-then-greedy cover) into a canonical sorted
//! sum-of-products, then rendered as a preprocessor directive. Expressions
//! with exactly one atom render as `#ifdef`/`#ifndef`; everything else as
//! `#if` with every atom wrapped in `defined(...)`. A search result that did
//! not saturate gets an approximation comment ahead of its directive.

use std::collections::HashSet;

use crate::definition::FlagDefinition;
use crate::macros::{definition_name, flag_name_macro, pass_name_macro};
use crate::search::{Join, SearchInput, SearchOutput, Token};

/// Atom count above which minimisation is skipped and the raw fold is
/// rendered instead.
const ATOM_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MacroTerm {
    negate: bool,
    join: Join,
    atom: usize,
}

/// A token list lifted over macro atoms, before simplification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MacroExpr {
    atoms: Vec<String>,
    terms: Vec<MacroTerm>,
}

impl MacroExpr {
    fn eval(&self, mask: u32) -> bool {
        let mut acc = false;
        for term in &self.terms {
            let mut value = (mask >> term.atom) & 1 == 1;
            if term.negate {
                value = !value;
            }
            acc = match term.join {
                Join::Initial => value,
                Join::And => acc && value,
                Join::Or => acc || value,
            };
        }
        acc
    }
}

fn macro_atom(name: &str, value: &str) -> String {
    if name == "pass" {
        pass_name_macro(value)
    } else if let Some(flag) = name.strip_prefix("f_") {
        flag_name_macro(flag, value, false)
    } else {
        definition_name(&format!("{name}{value}"))
    }
}

/// Lift a search result over the macro identifiers its flags map to.
pub(crate) fn lift_tokens(tokens: &[Token], def: &FlagDefinition) -> MacroExpr {
    let mut atoms: Vec<String> = Vec::new();
    let mut terms = Vec::new();
    for token in tokens {
        let name = def.name(token.name_index);
        let value = &def.values(token.name_index)[token.value_index];
        let atom_name = macro_atom(name, value);
        let atom = match atoms.iter().position(|a| *a == atom_name) {
            Some(index) => index,
            None => {
                atoms.push(atom_name);
                atoms.len() - 1
            }
        };
        terms.push(MacroTerm {
            negate: token.negate,
            join: token.join,
            atom,
        });
    }
    MacroExpr { atoms, terms }
}

/// Canonical simplified condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Simplified {
    Const(bool),
    Single { atom: String, negated: bool },
    /// Products of `(atom, negated)` literals; literals and products sorted.
    SumOfProducts(Vec<Vec<(String, bool)>>),
    /// Unminimised left-fold, used past [`ATOM_LIMIT`].
    Fold(Vec<(String, bool, Join)>),
}

impl Simplified {
    pub(crate) fn atom_names(&self) -> Vec<&str> {
        match self {
            Simplified::Const(_) => Vec::new(),
            Simplified::Single { atom, .. } => vec![atom.as_str()],
            Simplified::SumOfProducts(products) => {
                let mut names: Vec<&str> = products
                    .iter()
                    .flatten()
                    .map(|(atom, _)| atom.as_str())
                    .collect();
                names.sort_unstable();
                names.dedup();
                names
            }
            Simplified::Fold(terms) => {
                let mut names: Vec<&str> = terms.iter().map(|(atom, _, _)| atom.as_str()).collect();
                names.sort_unstable();
                names.dedup();
                names
            }
        }
    }

    /// Sum-of-products notation with `~`, `&`, `|`; `&` binds tighter.
    pub(crate) fn symbolic(&self) -> String {
        fn literal(atom: &str, negated: bool) -> String {
            if negated {
                format!("~{atom}")
            } else {
                atom.to_string()
            }
        }
        match self {
            Simplified::Const(false) => "False".to_string(),
            Simplified::Const(true) => "True".to_string(),
            Simplified::Single { atom, negated } => literal(atom, *negated),
            Simplified::SumOfProducts(products) => products
                .iter()
                .map(|product| {
                    product
                        .iter()
                        .map(|(atom, negated)| literal(atom, *negated))
                        .collect::<Vec<_>>()
                        .join(" & ")
                })
                .collect::<Vec<_>>()
                .join(" | "),
            Simplified::Fold(terms) => {
                let mut acc = String::new();
                for (atom, negated, join) in terms {
                    let lit = literal(atom, *negated);
                    acc = match join {
                        Join::Initial => lit,
                        Join::And => format!("({acc} & {lit})"),
                        Join::Or => format!("({acc} | {lit})"),
                    };
                }
                acc
            }
        }
    }

    /// The preprocessor directive opening this condition's block.
    pub(crate) fn directive(&self) -> String {
        fn defined(atom: &str, negated: bool) -> String {
            if negated {
                format!("!defined({atom})")
            } else {
                format!("defined({atom})")
            }
        }
        match self {
            Simplified::Const(false) => "#if 0".to_string(),
            Simplified::Const(true) => "#if 1".to_string(),
            Simplified::Single {
                atom,
                negated: false,
            } => format!("#ifdef {atom}"),
            Simplified::Single {
                atom,
                negated: true,
            } => format!("#ifndef {atom}"),
            Simplified::SumOfProducts(products) => {
                let body = products
                    .iter()
                    .map(|product| {
                        product
                            .iter()
                            .map(|(atom, negated)| defined(atom, *negated))
                            .collect::<Vec<_>>()
                            .join(" && ")
                    })
                    .collect::<Vec<_>>()
                    .join(" || ");
                format!("#if {body}")
            }
            Simplified::Fold(terms) => {
                let mut acc = String::new();
                for (atom, negated, join) in terms {
                    let lit = defined(atom, *negated);
                    acc = match join {
                        Join::Initial => lit,
                        Join::And => format!("({acc} && {lit})"),
                        Join::Or => format!("({acc} || {lit})"),
                    };
                }
                format!("#if {acc}")
            }
        }
    }
}

/// All `(value, care)` implicants that cannot be combined further.
fn prime_implicants(minterms: &[u32], width: usize) -> Vec<(u32, u32)> {
    let full = if width == 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };
    let mut current: Vec<(u32, u32)> = minterms.iter().map(|&m| (m, full)).collect();
    current.sort_unstable();
    current.dedup();

    let mut primes = Vec::new();
    while !current.is_empty() {
        let mut combined = vec![false; current.len()];
        let mut next = Vec::new();
        for i in 0..current.len() {
            for j in i + 1..current.len() {
                let (vi, ci) = current[i];
                let (vj, cj) = current[j];
                if ci != cj {
                    continue;
                }
                let diff = vi ^ vj;
                if diff.count_ones() == 1 {
                    combined[i] = true;
                    combined[j] = true;
                    next.push((vi & !diff, ci & !diff));
                }
            }
        }
        for (index, &implicant) in current.iter().enumerate() {
            if !combined[index] {
                primes.push(implicant);
            }
        }
        next.sort_unstable();
        next.dedup();
        current = next;
    }
    primes.sort_unstable();
    primes
}

fn implicant_covers(implicant: (u32, u32), minterm: u32) -> bool {
    (minterm & implicant.1) == implicant.0
}

/// Essential primes first, then greedy by uncovered count with first-wins
/// tie-breaking.
fn select_cover(minterms: &[u32], primes: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut chosen: Vec<(u32, u32)> = Vec::new();

    for &minterm in minterms {
        let mut covering = primes.iter().filter(|&&p| implicant_covers(p, minterm));
        if let (Some(&only), None) = (covering.next(), covering.next()) {
            if !chosen.contains(&only) {
                chosen.push(only);
            }
        }
    }

    let mut covered: Vec<bool> = minterms
        .iter()
        .map(|&m| chosen.iter().any(|&p| implicant_covers(p, m)))
        .collect();

    while covered.iter().any(|c| !c) {
        let mut best: Option<(u32, u32)> = None;
        let mut best_count = 0usize;
        for &prime in primes {
            let count = minterms
                .iter()
                .zip(&covered)
                .filter(|&(&m, &done)| !done && implicant_covers(prime, m))
                .count();
            if count > best_count {
                best_count = count;
                best = Some(prime);
            }
        }
        let prime = best.expect("primes cover every minterm");
        chosen.push(prime);
        for (index, &m) in minterms.iter().enumerate() {
            if implicant_covers(prime, m) {
                covered[index] = true;
            }
        }
    }
    chosen
}

pub(crate) fn simplify(expr: &MacroExpr) -> Simplified {
    let width = expr.atoms.len();
    if width == 0 {
        return Simplified::Const(expr.eval(0));
    }
    if width > ATOM_LIMIT {
        return Simplified::Fold(
            expr.terms
                .iter()
                .map(|t| (expr.atoms[t.atom].clone(), t.negate, t.join))
                .collect(),
        );
    }

    let total = 1u32 << width;
    let minterms: Vec<u32> = (0..total).filter(|&mask| expr.eval(mask)).collect();
    if minterms.is_empty() {
        return Simplified::Const(false);
    }
    if minterms.len() == total as usize {
        return Simplified::Const(true);
    }

    let primes = prime_implicants(&minterms, width);
    let cover = select_cover(&minterms, &primes);

    let mut products: Vec<Vec<(String, bool)>> = cover
        .iter()
        .map(|&(value, care)| {
            let mut literals: Vec<(String, bool)> = (0..width)
                .filter(|&bit| (care >> bit) & 1 == 1)
                .map(|bit| (expr.atoms[bit].clone(), (value >> bit) & 1 == 0))
                .collect();
            literals.sort();
            literals
        })
        .collect();
    products.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    products.dedup();

    if products.len() == 1 && products[0].len() == 1 {
        let (atom, negated) = products[0][0].clone();
        return Simplified::Single { atom, negated };
    }
    Simplified::SumOfProducts(products)
}

/// Lift, simplify (cached per distinct pre-simplification expression),
/// format, harvest used macros and mark approximate results.
pub(crate) fn process_expressions(
    results: &[SearchOutput],
    inputs: &[SearchInput],
) -> (Vec<String>, HashSet<String>) {
    let mut unique: Vec<MacroExpr> = Vec::new();
    let mut formatted: Vec<String> = Vec::new();
    let mut used_macros: HashSet<String> = HashSet::new();
    let mut directives = Vec::with_capacity(results.len());

    for (result, input) in results.iter().zip(inputs) {
        let expr = lift_tokens(&result.tokens, &input.flag_def);
        let index = match unique.iter().position(|u| *u == expr) {
            Some(index) => index,
            None => {
                let simplified = simplify(&expr);
                used_macros.extend(simplified.atom_names().iter().map(|s| s.to_string()));
                formatted.push(simplified.directive());
                unique.push(expr);
                unique.len() - 1
            }
        };
        let mut directive = formatted[index].clone();
        if result.score != input.outcomes.len() {
            directive = format!(
                "// Approximation, matches {} cases out of {}\n{}",
                result.score,
                input.outcomes.len(),
                directive
            );
        }
        directives.push(directive);
    }
    (directives, used_macros)
}

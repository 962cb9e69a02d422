//! Boolean expression search.
//!
//! For each condition key the search looks for an ordered token list whose
//! strict left-fold evaluation matches, for every flag assignment in the
//! namespace's all-flags list, whether that assignment is in the group's
//! appearance list. The greedy pass extends the best-scoring prefix one
//! token at a time; if it does not saturate, a brute-force pass enumerates
//! token lists by a deterministic successor function until the score is
//! perfect or the wall-clock budget runs out. Scores never decrease when the
//! two are combined; equal scores prefer the shorter list.

use std::time::{Duration, Instant};

use crate::SearchObserver;
use crate::definition::FlagDefinition;
use crate::flags::{FlagTable, FlagsId};
use crate::group::LineGroup;

/// How a token combines with the tokens before it. `Initial` is only valid
/// for the first token of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Join {
    Initial,
    Or,
    And,
}

/// One predicate over a flag assignment, indexing into the namespace's flag
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub negate: bool,
    pub join: Join,
    pub name_index: usize,
    pub value_index: usize,
}

/// One deduplicated condition key: for every assignment in the all-flags
/// list, whether the expression must evaluate to true.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SearchInput {
    pub outcomes: Vec<(bool, FlagsId)>,
    pub flag_def: FlagDefinition,
}

/// Best token list found for one condition key.
#[derive(Debug)]
pub(crate) struct SearchOutput {
    pub score: usize,
    pub tokens: Vec<Token>,
}

impl SearchOutput {
    pub(crate) fn is_perfect(&self, input: &SearchInput) -> bool {
        self.score == input.outcomes.len()
    }
}

/// Build the condition key for every conditional group and point the group
/// at its (deduplicated) key index. Groups covering the whole all-flags list
/// stay unconditional.
pub(crate) fn assign_expressions(
    groups: &mut [LineGroup],
    universe: &[FlagsId],
    flag_def: &FlagDefinition,
    inputs: &mut Vec<SearchInput>,
) {
    for group in groups {
        if group.condition.len() == universe.len() {
            continue;
        }
        let input = SearchInput {
            outcomes: universe
                .iter()
                .map(|&flags| (group.condition.contains(&flags), flags))
                .collect(),
            flag_def: flag_def.clone(),
        };
        let index = match inputs.iter().position(|existing| *existing == input) {
            Some(index) => index,
            None => {
                inputs.push(input);
                inputs.len() - 1
            }
        };
        group.expression_index = Some(index);
    }
}

/// Strict left-fold evaluation, scanned in reverse so that a dominating
/// operand short-circuits. The result is identical to the forward fold.
fn evaluate(tokens: &[Token], def: &FlagDefinition, table: &FlagTable, flags: FlagsId) -> bool {
    let assignment = table.resolve(flags);
    for token in tokens.iter().rev() {
        let value = &def.values(token.name_index)[token.value_index];
        let mut atom = assignment.get(def.name(token.name_index)) == Some(value.as_str());
        if token.negate {
            atom = !atom;
        }
        match token.join {
            Join::And => {
                if !atom {
                    return false;
                }
            }
            Join::Or => {
                if atom {
                    return true;
                }
            }
            Join::Initial => return atom,
        }
    }
    false
}

fn calc_score(tokens: &[Token], input: &SearchInput, table: &FlagTable) -> usize {
    input
        .outcomes
        .iter()
        .filter(|&&(goal, flags)| evaluate(tokens, &input.flag_def, table, flags) == goal)
        .count()
}

/// Greedy search: for each position, pick the token that maximises the score
/// of the prefix, keeping the best prefix seen overall.
fn fast_search(input: &SearchInput, table: &FlagTable) -> SearchOutput {
    let def = &input.flag_def;
    let mut best: Vec<Token> = Vec::new();
    let mut best_score = 0usize;
    let mut current: Vec<Token> = Vec::new();

    for _ in 0..def.len() + 5 {
        let joins: &[Join] = if current.is_empty() {
            &[Join::Initial]
        } else {
            &[Join::Or, Join::And]
        };

        let mut best_token: Option<Token> = None;
        let mut best_token_score = 0usize;
        for negate in [false, true] {
            for &join in joins {
                for name_index in 0..def.len() {
                    for value_index in 0..def.values(name_index).len() {
                        let token = Token {
                            negate,
                            join,
                            name_index,
                            value_index,
                        };
                        current.push(token);
                        let score = calc_score(&current, input, table);
                        current.pop();
                        if score > best_token_score {
                            best_token_score = score;
                            best_token = Some(token);
                        }
                    }
                }
            }
        }

        let Some(token) = best_token else {
            break;
        };
        current.push(token);

        if best_token_score > best_score {
            best = current.clone();
            best_score = best_token_score;
        }
        if best_score >= input.outcomes.len() {
            break;
        }
    }

    SearchOutput {
        score: best_score,
        tokens: best,
    }
}

/// Deterministic successor over token lists: value, then name, then join
/// (`Or` <-> `And`), then negation; a full rollover appends a token.
fn increment(tokens: &mut Vec<Token>, def: &FlagDefinition) {
    for token in tokens.iter_mut() {
        if token.value_index + 1 < def.values(token.name_index).len() {
            token.value_index += 1;
            return;
        }
        token.value_index = 0;

        if token.name_index + 1 < def.len() {
            token.name_index += 1;
            return;
        }
        token.name_index = 0;

        if token.join != Join::Initial {
            if token.join == Join::Or {
                token.join = Join::And;
                return;
            }
            token.join = Join::Or;
        }

        if !token.negate {
            token.negate = true;
            return;
        }
        token.negate = false;
    }

    tokens.push(Token {
        negate: false,
        join: if tokens.is_empty() {
            Join::Initial
        } else {
            Join::Or
        },
        name_index: 0,
        value_index: 0,
    });
}

/// Brute-force search. With a budget the wall clock is polled between
/// candidate scorings; without one (saturation mode) the token list length
/// bounds the walk instead.
fn slow_search(input: &SearchInput, table: &FlagTable, budget: Option<Duration>) -> SearchOutput {
    let def = &input.flag_def;
    let mut best: Vec<Token> = Vec::new();
    let mut best_score = 0usize;
    let mut current: Vec<Token> = Vec::new();
    let start = Instant::now();

    loop {
        let score = calc_score(&current, input, table);
        if score > best_score {
            best_score = score;
            best = current.clone();
        }
        if best_score == input.outcomes.len() {
            break;
        }
        if let Some(budget) = budget {
            if start.elapsed() >= budget {
                break;
            }
        } else if current.len() > def.len() + 5 {
            break;
        }
        increment(&mut current, def);
    }

    SearchOutput {
        score: best_score,
        tokens: best,
    }
}

/// Run the fast search for every condition key, falling back to the slow
/// search when it does not saturate; keep whichever result scores higher,
/// preferring the shorter token list on ties.
pub(crate) fn expression_search(
    inputs: &[SearchInput],
    table: &FlagTable,
    budget: Option<Duration>,
    observer: &dyn SearchObserver,
) -> Vec<SearchOutput> {
    inputs
        .iter()
        .map(|input| {
            let mut result = fast_search(input, table);
            if !result.is_perfect(input) && !input.flag_def.is_empty() {
                observer.slow_search();
                let slow = slow_search(input, table, budget);
                if slow.score > result.score
                    || (slow.score == result.score && slow.tokens.len() < result.tokens.len())
                {
                    result = slow;
                }
                if !result.is_perfect(input) {
                    observer.not_found();
                }
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;

    fn table_with(values: &[&[(&str, &str)]]) -> (FlagTable, Vec<FlagsId>) {
        let mut table = FlagTable::default();
        let ids = values
            .iter()
            .map(|pairs| table.intern(&pairs.iter().copied().collect::<FlagSet>()))
            .collect();
        (table, ids)
    }

    fn def_of(pairs: &[(&str, &[&str])]) -> FlagDefinition {
        FlagDefinition::from_pairs(pairs)
    }

    #[test]
    fn single_flag_condition_saturates_fast() {
        let (table, ids) = table_with(&[&[("MODE", "A")], &[("MODE", "B")]]);
        let input = SearchInput {
            outcomes: vec![(true, ids[0]), (false, ids[1])],
            flag_def: def_of(&[("MODE", &["A", "B"])]),
        };
        let result = fast_search(&input, &table);
        assert!(result.is_perfect(&input));
        assert_eq!(result.tokens.len(), 1);
        let token = result.tokens[0];
        assert_eq!(token.join, Join::Initial);
        assert!(!token.negate);
        assert_eq!(input.flag_def.name(token.name_index), "MODE");
        assert_eq!(
            input.flag_def.values(token.name_index)[token.value_index],
            "A"
        );
    }

    #[test]
    fn absent_flag_evaluates_false() {
        let (table, ids) = table_with(&[&[("MODE", "A")], &[("OTHER", "X")]]);
        let input = SearchInput {
            outcomes: vec![(true, ids[0]), (false, ids[1])],
            flag_def: def_of(&[("MODE", &["A", "B"])]),
        };
        let tokens = vec![Token {
            negate: false,
            join: Join::Initial,
            name_index: 0,
            value_index: 0,
        }];
        assert!(evaluate(&tokens, &input.flag_def, &table, ids[0]));
        assert!(!evaluate(&tokens, &input.flag_def, &table, ids[1]));
    }

    #[test]
    fn left_fold_has_no_precedence() {
        // Tokens: A  Or B  And C  ==  ((A | B) & C), not A | (B & C).
        let (table, ids) = table_with(&[&[("F", "A"), ("G", "N")]]);
        let def = def_of(&[("F", &["A", "B"]), ("G", &["Y", "N"])]);
        let tokens = vec![
            Token {
                negate: false,
                join: Join::Initial,
                name_index: 0,
                value_index: 0,
            },
            Token {
                negate: false,
                join: Join::Or,
                name_index: 0,
                value_index: 1,
            },
            Token {
                negate: false,
                join: Join::And,
                name_index: 1,
                value_index: 0,
            },
        ];
        // F == A holds, G == Y fails: ((true | false) & false) == false.
        assert!(!evaluate(&tokens, &def, &table, ids[0]));
    }

    #[test]
    fn slow_search_finds_two_token_conjunction() {
        // Target set needs F == A && G == Y; greedy can also find this, so
        // drive the slow search directly.
        let (table, ids) = table_with(&[
            &[("F", "A"), ("G", "Y")],
            &[("F", "A"), ("G", "N")],
            &[("F", "B"), ("G", "Y")],
            &[("F", "B"), ("G", "N")],
        ]);
        let input = SearchInput {
            outcomes: vec![
                (true, ids[0]),
                (false, ids[1]),
                (false, ids[2]),
                (false, ids[3]),
            ],
            flag_def: def_of(&[("F", &["A", "B"]), ("G", &["Y", "N"])]),
        };
        let result = slow_search(&input, &table, None);
        assert!(result.is_perfect(&input));
        assert!(result.tokens.len() <= 2);
    }

    #[test]
    fn xor_with_zero_budget_returns_partial_score() {
        // XOR of two two-valued flags cannot be expressed by a short
        // left-fold; with an exhausted budget the best partial comes back.
        let (table, ids) = table_with(&[
            &[("F", "A"), ("G", "Y")],
            &[("F", "A"), ("G", "N")],
            &[("F", "B"), ("G", "Y")],
            &[("F", "B"), ("G", "N")],
        ]);
        let input = SearchInput {
            outcomes: vec![
                (false, ids[0]),
                (true, ids[1]),
                (true, ids[2]),
                (false, ids[3]),
            ],
            flag_def: def_of(&[("F", &["A", "B"]), ("G", &["Y", "N"])]),
        };
        let result = slow_search(&input, &table, Some(Duration::ZERO));
        assert!(result.score < input.outcomes.len());
    }

    #[test]
    fn combined_search_prefers_shorter_on_tied_score() {
        let (table, ids) = table_with(&[&[("MODE", "A")], &[("MODE", "B")]]);
        let inputs = vec![SearchInput {
            outcomes: vec![(true, ids[0]), (false, ids[1])],
            flag_def: def_of(&[("MODE", &["A", "B"])]),
        }];
        let results = expression_search(&inputs, &table, None, &crate::NoopObserver);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_perfect(&inputs[0]));
        assert_eq!(results[0].tokens.len(), 1);
    }

    #[test]
    fn successor_rolls_value_then_name_then_join_then_negation() {
        let def = def_of(&[("F", &["A", "B"]), ("G", &["Y"])]);
        let mut tokens = Vec::new();
        increment(&mut tokens, &def);
        assert_eq!(tokens.len(), 1);
        assert_eq!(
            (tokens[0].name_index, tokens[0].value_index, tokens[0].negate),
            (0, 0, false)
        );
        increment(&mut tokens, &def);
        assert_eq!((tokens[0].name_index, tokens[0].value_index), (0, 1));
        increment(&mut tokens, &def);
        assert_eq!((tokens[0].name_index, tokens[0].value_index), (1, 0));
        increment(&mut tokens, &def);
        // Initial join skips the Or/And toggle and flips negation.
        assert_eq!(
            (tokens[0].name_index, tokens[0].value_index, tokens[0].negate),
            (0, 0, true)
        );
    }
}

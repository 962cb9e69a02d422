//! Multi-way diff fold.
//!
//! Permutations of a namespace are folded one at a time into a combined line
//! sequence. Each fold step is a pairwise Myers diff of the running combined
//! sequence against the next permutation:
//!
//! * inserted lines enter with a fresh copy of the permutation's flag list;
//! * removed lines stay, keeping their appearance list unchanged;
//! * kept lines stay and their appearance list is extended with the
//!   permutation's flag list.
//!
//! Inside a replace hunk removals are emitted before insertions; with the
//! Myers tie-breaking of the diff this makes the fold deterministic.

use similar::{Algorithm, DiffOp, capture_diff_slices};

use crate::encode::{LineId, Permutation};
use crate::flags::FlagsId;

/// Combined line sequence of one namespace with per-line appearance lists.
#[derive(Debug, Default)]
pub(crate) struct DiffedCode {
    pub lines: Vec<LineId>,
    pub conditions: Vec<Vec<FlagsId>>,
}

pub(crate) fn fold_permutations(permutations: Vec<Permutation>) -> DiffedCode {
    let mut lines: Vec<LineId> = Vec::new();
    let mut conditions: Vec<Vec<FlagsId>> = Vec::new();

    for permutation in permutations {
        let ops = capture_diff_slices(Algorithm::Myers, &lines, &permutation.lines);
        let mut new_lines = Vec::with_capacity(lines.len() + permutation.lines.len());
        let mut new_conditions = Vec::with_capacity(new_lines.capacity());
        let mut old_conditions = conditions;

        let mut keep = |index: usize,
                        extend: bool,
                        new_lines: &mut Vec<LineId>,
                        new_conditions: &mut Vec<Vec<FlagsId>>| {
            let mut condition = std::mem::take(&mut old_conditions[index]);
            if extend {
                condition.extend_from_slice(&permutation.flags);
            }
            new_lines.push(lines[index]);
            new_conditions.push(condition);
        };

        for op in ops {
            match op {
                DiffOp::Equal { old_index, len, .. } => {
                    for k in 0..len {
                        keep(old_index + k, true, &mut new_lines, &mut new_conditions);
                    }
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    for k in 0..old_len {
                        keep(old_index + k, false, &mut new_lines, &mut new_conditions);
                    }
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    for k in 0..new_len {
                        new_lines.push(permutation.lines[new_index + k]);
                        new_conditions.push(permutation.flags.clone());
                    }
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    for k in 0..old_len {
                        keep(old_index + k, false, &mut new_lines, &mut new_conditions);
                    }
                    for k in 0..new_len {
                        new_lines.push(permutation.lines[new_index + k]);
                        new_conditions.push(permutation.flags.clone());
                    }
                }
            }
        }

        lines = new_lines;
        conditions = new_conditions;
    }

    DiffedCode { lines, conditions }
}

//! Line grouping, all-flags lists and group assembly.
//!
//! Consecutive diffed lines with the same appearance list collapse into one
//! group. Appearance lists compare element-wise; reordering changes identity,
//! so two groups are the same condition only if their lists are equal as
//! lists. A group whose list covers the namespace's whole all-flags list is
//! unconditional and never gets a directive.

use crate::diff::DiffedCode;
use crate::encode::{LineId, LineTable};
use crate::flags::FlagsId;

/// Contiguous run of lines sharing one appearance list.
#[derive(Debug)]
pub(crate) struct LineGroup {
    pub lines: Vec<LineId>,
    pub condition: Vec<FlagsId>,
    pub expression_index: Option<usize>,
}

impl LineGroup {
    fn assemble(&self, table: &LineTable, conditionals: &[String]) -> String {
        let code = self
            .lines
            .iter()
            .map(|&id| table.get(id))
            .collect::<Vec<_>>()
            .join("\n");
        match self.expression_index {
            Some(index) => format!("{}\n{}\n#endif", conditionals[index], code),
            None => code,
        }
    }
}

impl DiffedCode {
    pub(crate) fn group_lines(self) -> Vec<LineGroup> {
        let mut groups: Vec<LineGroup> = Vec::new();
        if self.lines.is_empty() {
            return groups;
        }

        let mut pairs = self.lines.into_iter().zip(self.conditions);
        let (line, condition) = pairs.next().unwrap();
        let mut current = LineGroup {
            lines: vec![line],
            condition,
            expression_index: None,
        };
        for (line, condition) in pairs {
            if condition != current.condition {
                groups.push(current);
                current = LineGroup {
                    lines: Vec::new(),
                    condition,
                    expression_index: None,
                };
            }
            current.lines.push(line);
        }
        groups.push(current);
        groups
    }
}

/// Ordered unique list of every flag assignment appearing in any group.
pub(crate) fn all_flags_list(groups: &[LineGroup]) -> Vec<FlagsId> {
    let mut all: Vec<FlagsId> = Vec::new();
    for group in groups {
        for &flags in &group.condition {
            if !all.contains(&flags) {
                all.push(flags);
            }
        }
    }
    all
}

/// Emit the namespace's groups in order, wrapping conditional groups in their
/// directive and `#endif`.
pub(crate) fn assemble_groups(
    groups: &[LineGroup],
    table: &LineTable,
    conditionals: &[String],
) -> String {
    groups
        .iter()
        .map(|group| group.assemble(table, conditionals))
        .collect::<Vec<_>>()
        .join("\n")
}

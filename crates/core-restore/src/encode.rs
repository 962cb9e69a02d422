//! Line interning and per-namespace uniquification.
//!
//! Every distinct source line is interned into a run-owned `LineTable`
//! (dense ids, two-map lookup, append-only). Within a namespace, variants
//! with byte-identical code are merged into one permutation that carries
//! every contributing flag assignment.

use std::collections::HashMap;

use crate::extract::ExtractedVariant;
use crate::flags::FlagsId;
use crate::namespace::Namespaces;

pub(crate) type LineId = u32;

/// Append-only intern table for source lines.
#[derive(Debug, Default)]
pub(crate) struct LineTable {
    lines: Vec<String>,
    index: HashMap<String, LineId>,
}

impl LineTable {
    pub(crate) fn intern(&mut self, line: &str) -> LineId {
        if let Some(&id) = self.index.get(line) {
            return id;
        }
        let id = self.lines.len() as LineId;
        self.lines.push(line.to_string());
        self.index.insert(line.to_string(), id);
        id
    }

    pub(crate) fn get(&self, id: LineId) -> &str {
        &self.lines[id as usize]
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}

/// One distinct body within a namespace and the flag assignments that
/// produced it.
#[derive(Debug)]
pub(crate) struct Permutation {
    pub lines: Vec<LineId>,
    pub flags: Vec<FlagsId>,
}

fn insert_unique(table: &mut Vec<(String, Vec<FlagsId>)>, code: &str, flags: FlagsId) {
    match table.iter().position(|(c, _)| c == code) {
        Some(index) => table[index].1.push(flags),
        None => table.push((code.to_string(), vec![flags])),
    }
}

fn encode_table(table: Vec<(String, Vec<FlagsId>)>, lines: &mut LineTable) -> Vec<Permutation> {
    table
        .into_iter()
        .map(|(code, flags)| Permutation {
            lines: code.lines().map(|line| lines.intern(line)).collect(),
            flags,
        })
        .collect()
}

/// Uniquify and encode all variants, namespace by namespace. Function
/// namespaces keep their first-seen order across variants.
pub(crate) fn encode_variants(
    variants: &[(ExtractedVariant, FlagsId)],
    lines: &mut LineTable,
) -> Namespaces<Vec<Permutation>> {
    let mut main: Vec<(String, Vec<FlagsId>)> = Vec::new();
    let mut functions: Vec<(String, Vec<(String, Vec<FlagsId>)>)> = Vec::new();

    for (variant, flags) in variants {
        insert_unique(&mut main, &variant.main, *flags);
        for (name, body) in &variant.functions {
            let index = match functions.iter().position(|(n, _)| n == name) {
                Some(index) => index,
                None => {
                    functions.push((name.clone(), Vec::new()));
                    functions.len() - 1
                }
            };
            insert_unique(&mut functions[index].1, body, *flags);
        }
    }

    Namespaces {
        main: encode_table(main, lines),
        functions: functions
            .into_iter()
            .map(|(name, table)| (name, encode_table(table, lines)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{FlagSet, FlagTable};

    fn ids(table: &mut FlagTable, sets: &[FlagSet]) -> Vec<FlagsId> {
        sets.iter().map(|s| table.intern(s)).collect()
    }

    #[test]
    fn identical_codes_merge_and_union_flags() {
        let mut flag_table = FlagTable::default();
        let a: FlagSet = [("M", "A")].into_iter().collect();
        let b: FlagSet = [("M", "B")].into_iter().collect();
        let fid = ids(&mut flag_table, &[a, b]);

        let variants = vec![
            (
                ExtractedVariant {
                    main: "x;\ny;".to_string(),
                    functions: vec![],
                },
                fid[0],
            ),
            (
                ExtractedVariant {
                    main: "x;\ny;".to_string(),
                    functions: vec![],
                },
                fid[1],
            ),
        ];

        let mut lines = LineTable::default();
        let encoded = encode_variants(&variants, &mut lines);
        assert_eq!(encoded.main.len(), 1);
        assert_eq!(encoded.main[0].flags, fid);
        assert_eq!(encoded.main[0].lines.len(), 2);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn shared_lines_intern_to_one_id() {
        let mut flag_table = FlagTable::default();
        let a: FlagSet = [("M", "A")].into_iter().collect();
        let b: FlagSet = [("M", "B")].into_iter().collect();
        let fid = ids(&mut flag_table, &[a, b]);

        let variants = vec![
            (
                ExtractedVariant {
                    main: "shared;\nonly_a;".to_string(),
                    functions: vec![],
                },
                fid[0],
            ),
            (
                ExtractedVariant {
                    main: "shared;\nonly_b;".to_string(),
                    functions: vec![],
                },
                fid[1],
            ),
        ];

        let mut lines = LineTable::default();
        let encoded = encode_variants(&variants, &mut lines);
        assert_eq!(encoded.main.len(), 2);
        assert_eq!(encoded.main[0].lines[0], encoded.main[1].lines[0]);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn function_namespaces_keep_first_seen_order() {
        let mut flag_table = FlagTable::default();
        let a: FlagSet = [("M", "A")].into_iter().collect();
        let fid = flag_table.intern(&a);

        let variants = vec![(
            ExtractedVariant {
                main: "m;".to_string(),
                functions: vec![
                    ("void b()".to_string(), "x;".to_string()),
                    ("void a()".to_string(), "y;".to_string()),
                ],
            },
            fid,
        )];

        let mut lines = LineTable::default();
        let encoded = encode_variants(&variants, &mut lines);
        let names: Vec<_> = encoded.functions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["void b()", "void a()"]);
    }
}

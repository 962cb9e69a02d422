//! Per-namespace flag definitions.
//!
//! A definition maps every flag name seen in the namespace's groups to the
//! ordered list of its observed values. Names with a single value carry no
//! information and are dropped. Value lists are then biased so the greedy
//! search states conditions positively: `On`/`Enabled` move to the front,
//! `Off`/`Disabled` to the back.

use crate::flags::FlagTable;
use crate::group::LineGroup;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FlagDefinition {
    entries: Vec<(String, Vec<String>)>,
}

impl FlagDefinition {
    pub(crate) fn from_groups(groups: &[LineGroup], table: &FlagTable) -> Self {
        let mut def = FlagDefinition::default();
        for group in groups {
            for &flags in &group.condition {
                for (name, value) in table.resolve(flags).iter() {
                    let index = match def.entries.iter().position(|(n, _)| n == name) {
                        Some(index) => index,
                        None => {
                            def.entries.push((name.to_string(), Vec::new()));
                            def.entries.len() - 1
                        }
                    };
                    let values = &mut def.entries[index].1;
                    if !values.iter().any(|v| v == value) {
                        values.push(value.to_string());
                    }
                }
            }
        }
        def
    }

    pub(crate) fn filter_and_bias(&mut self) {
        self.entries.retain(|(_, values)| values.len() > 1);
        for (_, values) in &mut self.entries {
            for disabling in ["Off", "Disabled"] {
                if let Some(pos) = values.iter().position(|v| v == disabling) {
                    let value = values.remove(pos);
                    values.push(value);
                }
            }
            for enabling in ["On", "Enabled"] {
                if let Some(pos) = values.iter().position(|v| v == enabling) {
                    let value = values.remove(pos);
                    values.insert(0, value);
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        &self.entries[index].0
    }

    pub(crate) fn values(&self, index: usize) -> &[String] {
        &self.entries[index].1
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        FlagDefinition {
            entries: pairs
                .iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;

    fn def_of(pairs: &[(&str, &[&str])]) -> FlagDefinition {
        FlagDefinition::from_pairs(pairs)
    }

    #[test]
    fn collects_values_in_first_seen_order() {
        let mut table = FlagTable::default();
        let a = table.intern(&[("K", "R"), ("P", "X")].into_iter().collect::<FlagSet>());
        let b = table.intern(&[("K", "G"), ("P", "X")].into_iter().collect::<FlagSet>());
        let groups = vec![LineGroup {
            lines: vec![0],
            condition: vec![a, b],
            expression_index: None,
        }];
        let def = FlagDefinition::from_groups(&groups, &table);
        assert_eq!(def, def_of(&[("K", &["R", "G"]), ("P", &["X"])]));
    }

    #[test]
    fn single_valued_flags_are_dropped() {
        let mut def = def_of(&[("K", &["R", "G"]), ("P", &["X"])]);
        def.filter_and_bias();
        assert_eq!(def, def_of(&[("K", &["R", "G"])]));
    }

    #[test]
    fn bias_prefers_enabling_values() {
        let mut def = def_of(&[("F", &["Off", "Medium", "On"])]);
        def.filter_and_bias();
        assert_eq!(def, def_of(&[("F", &["On", "Medium", "Off"])]));

        let mut def = def_of(&[("G", &["Disabled", "Enabled"])]);
        def.filter_and_bias();
        assert_eq!(def, def_of(&[("G", &["Enabled", "Disabled"])]));
    }
}

use aho_corasick::AhoCorasick;
use indexmap::IndexMap;
use regex_syntax::hir::literal::{ExtractKind, Extractor};

use crate::error::Result;

/// Literals shorter than this are too common in user-agents to be worth
/// gating on.
const MIN_LITERAL_LEN: usize = 3;

/// Extract the prefix literals one of which every match of `pattern` must
/// start with. Returns `None` when no such finite set exists, when any
/// alternative is too short, or when the pattern uses syntax `regex_syntax`
/// does not understand (lookaround, backreferences); such rules are tried on
/// every input.
pub(crate) fn required_literals(pattern: &str) -> Option<Vec<String>> {
    let hir = regex_syntax::parse(pattern).ok()?;

    let mut extractor = Extractor::new();
    extractor.kind(ExtractKind::Prefix);
    let seq = extractor.extract(&hir);

    let literals = seq.literals()?;
    if literals.is_empty() {
        return None;
    }

    literals
        .iter()
        .map(|lit| {
            let s = std::str::from_utf8(lit.as_bytes()).ok()?;
            // ASCII-only so that case-insensitive automaton matching agrees
            // with the regex's (?i) flag.
            if s.len() < MIN_LITERAL_LEN || !s.is_ascii() {
                return None;
            }
            Some(s.to_ascii_lowercase())
        })
        .collect()
}

/// Aho-Corasick gate over the literals of every rule in a component.
pub(crate) struct Prefilter {
    automaton: Option<AhoCorasick>,
    /// Automaton pattern index → rules that require that literal.
    literal_rules: Vec<Vec<usize>>,
    /// Rules without usable literals.
    always: Vec<usize>,
    rule_count: usize,
}

impl Prefilter {
    pub fn build<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut by_literal: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut always = Vec::new();
        let mut rule_count = 0;

        for (idx, pattern) in patterns.into_iter().enumerate() {
            rule_count += 1;
            match required_literals(pattern) {
                Some(lits) => {
                    for lit in lits {
                        let rules = by_literal.entry(lit).or_default();
                        if rules.last() != Some(&idx) {
                            rules.push(idx);
                        }
                    }
                }
                None => always.push(idx),
            }
        }

        let automaton = if by_literal.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(by_literal.keys())?,
            )
        };

        Ok(Self {
            automaton,
            literal_rules: by_literal.into_values().collect(),
            always,
            rule_count,
        })
    }

    /// Mask of rules that may match `ua`, indexed by rule position.
    pub fn candidates(&self, ua: &str) -> Vec<bool> {
        let mut mask = vec![false; self.rule_count];
        for &idx in &self.always {
            mask[idx] = true;
        }
        if let Some(ac) = &self.automaton {
            for m in ac.find_overlapping_iter(ua) {
                for &idx in &self.literal_rules[m.pattern().as_usize()] {
                    mask[idx] = true;
                }
            }
        }
        mask
    }

    pub fn gated_rules(&self) -> usize {
        self.rule_count - self.always.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_literal() {
        assert_eq!(required_literals("Firefox"), Some(vec!["firefox".to_string()]));
    }

    #[test]
    fn alternation() {
        let lits = required_literals("(?:Firefox|Chrome)/").unwrap();
        assert!(lits.contains(&"firefox/".to_string()));
        assert!(lits.contains(&"chrome/".to_string()));
    }

    #[test]
    fn short_or_open_patterns_are_ungated() {
        assert_eq!(required_literals(r"\d+\.\d+"), None);
        assert_eq!(required_literals("(?:OS|Firefox)"), None);
        assert_eq!(required_literals(".*Mobile"), None);
        assert_eq!(required_literals(r"Android(?!.*Mobile)"), None);
    }

    #[test]
    fn candidates_are_case_insensitive() {
        let pf = Prefilter::build(["iPhone", "Android", r"\d+"]).unwrap();
        assert_eq!(pf.gated_rules(), 2);
        assert_eq!(pf.candidates("Mozilla (ANDROID 14)"), vec![false, true, true]);
        assert_eq!(pf.candidates("curl/8"), vec![false, false, true]);
    }
}

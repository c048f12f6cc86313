use rayon::prelude::*;
use tracing::debug;

use super::database::ComponentEntry;
use super::prefilter::Prefilter;
use super::template::{expand, normalise_version};
use crate::error::Result;
use crate::types::{PropertySet, PropertyValue};

/// Case-insensitive, unanchored form of a rule pattern.
pub(crate) fn full_pattern(pattern: &str) -> String {
    format!("(?i)(?:{})", pattern)
}

pub(crate) fn compile_regex(pattern: &str) -> Result<fancy_regex::Regex> {
    Ok(fancy_regex::Regex::new(&full_pattern(pattern))?)
}

/// One compiled rule: its regex plus the property templates it sets.
pub(crate) struct CompiledRule {
    pub regex: fancy_regex::Regex,
    pub properties: Vec<(String, String)>,
}

/// An ordered, first-match-wins rule list (platform, browser, hardware, ...).
pub(crate) struct CompiledComponent {
    pub name: String,
    rules: Vec<CompiledRule>,
    prefilter: Prefilter,
}

impl CompiledComponent {
    pub fn build(entry: ComponentEntry) -> Result<Self> {
        let prefilter = Prefilter::build(entry.rules.iter().map(|r| r.regex.as_str()))?;

        let rules = entry
            .rules
            .into_par_iter()
            .map(|rule| {
                Ok(CompiledRule {
                    regex: compile_regex(&rule.regex)?,
                    properties: rule.properties.into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            component = %entry.name,
            rules = rules.len(),
            gated = prefilter.gated_rules(),
            "compiled detection component"
        );

        Ok(Self {
            name: entry.name,
            rules,
            prefilter,
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Apply the first matching rule's properties to `out`. Returns whether
    /// any rule matched.
    pub fn apply(&self, ua: &str, out: &mut PropertySet) -> bool {
        let candidates = self.prefilter.candidates(ua);

        for (rule, _) in self.rules.iter().zip(candidates).filter(|(_, c)| *c) {
            // A backtracking limit hit counts as no match.
            let Ok(Some(caps)) = rule.regex.captures(ua) else {
                continue;
            };
            for (name, template) in &rule.properties {
                let value = normalise_version(name, expand(template, &caps));
                out.insert(name.clone(), PropertyValue::new(value));
            }
            out.matched_components.push(self.name.clone());
            return true;
        }

        false
    }
}

use serde::Serialize;

use crate::grammar::{Category, Grammar, MatchRule, VocabEntry};
use crate::normalize::{normalize_clause, placeholder, placeholder_name, spaced, unhyphenated};
use crate::vocab::ValueTemplate;

/// Outcome of classifying one clause. Never stored; recomputed per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: Option<String>,
    /// Matched value, or the trimmed clause itself when nothing matched.
    pub canonical_value: String,
}

impl Classification {
    pub fn is_descriptive(&self) -> bool {
        self.category.is_none()
    }
}

/// One category a clause could belong to.
#[derive(Debug, Clone)]
pub struct Candidate<'g> {
    pub index: usize,
    pub category: &'g Category,
    pub value: String,
}

struct Probe<'a> {
    text: &'a str,
    normalized: String,
    compact: String,
    lowered: String,
}

impl<'a> Probe<'a> {
    fn new(text: &'a str) -> Self {
        let normalized = normalize_clause(text);
        Self {
            text,
            compact: unhyphenated(&normalized),
            lowered: text.to_lowercase(),
            normalized,
        }
    }

    fn matches(&self, rule: MatchRule, entry: &VocabEntry) -> bool {
        match rule {
            MatchRule::Substring => self.normalized.contains(entry.normalized.as_str()),
            MatchRule::ShotVariants => {
                let needles = [
                    entry.normalized.clone(),
                    unhyphenated(&entry.normalized),
                    spaced(&entry.normalized),
                ];
                let haystacks = [&self.normalized, &self.compact, &self.lowered];
                needles.iter().any(|needle| {
                    haystacks
                        .iter()
                        .any(|haystack| haystack.contains(needle.as_str()))
                })
            }
        }
    }

    /// The literal span of `value` inside the clause, compared ASCII case-insensitively.
    fn literal(&self, value: &str) -> Option<&'a str> {
        let haystack = self.text.to_ascii_lowercase();
        let start = haystack.find(&value.to_ascii_lowercase())?;
        self.text.get(start..start + value.len())
    }
}

/// Every category the clause matches, in the grammar's priority order.
pub fn classify_candidates<'g>(grammar: &'g Grammar, clause: &str) -> Vec<Candidate<'g>> {
    let text = clause.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if let Some(candidate) = placeholder_candidate(grammar, text) {
        return vec![candidate];
    }
    if grammar.is_ignored(text) {
        log::debug!("[classify] ignoring clause {text:?}");
        return Vec::new();
    }

    let probe = Probe::new(text);
    let candidates = grammar
        .priority()
        .iter()
        .filter_map(|&index| {
            let category = &grammar.categories()[index];
            match_category(category, &probe).map(|value| Candidate {
                index,
                category,
                value,
            })
        })
        .collect::<Vec<_>>();

    log::debug!(
        "[classify] {text:?} -> [{}]",
        candidates
            .iter()
            .map(|candidate| candidate.category.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    candidates
}

/// Classifies one clause into at most one category; a miss is a normal outcome.
pub fn classify_segment(grammar: &Grammar, clause: &str) -> Classification {
    match classify_candidates(grammar, clause).into_iter().next() {
        Some(candidate) => Classification {
            category: Some(candidate.category.name().to_owned()),
            canonical_value: candidate.value,
        },
        None => Classification {
            category: None,
            canonical_value: clause.trim().to_owned(),
        },
    }
}

/// A clause that is a category's `[Name]` slot, either bare or written through the
/// category's template (`inspired by [Name]`). Brackets elsewhere in a clause are text.
fn placeholder_candidate<'g>(grammar: &'g Grammar, text: &str) -> Option<Candidate<'g>> {
    if let Some(name) = placeholder_name(text) {
        let index = grammar.index_of(name)?;
        return Some(Candidate {
            index,
            category: &grammar.categories()[index],
            value: placeholder(name),
        });
    }
    grammar
        .categories()
        .iter()
        .enumerate()
        .filter(|(_, category)| category.template() != ValueTemplate::Bare)
        .find(|(_, category)| {
            category
                .format_value(&category.placeholder())
                .eq_ignore_ascii_case(text)
        })
        .map(|(index, category)| Candidate {
            index,
            category,
            value: text.to_owned(),
        })
}

fn match_category(category: &Category, probe: &Probe<'_>) -> Option<String> {
    if category
        .vetoes()
        .iter()
        .any(|veto| probe.normalized.contains(veto.as_str()))
    {
        return None;
    }

    let best = longest_match(category, probe);
    let keyword_hit = category
        .keywords()
        .any(|keyword| probe.normalized.contains(keyword));

    match category.template() {
        ValueTemplate::Bare => best
            .map(|entry| entry.raw.clone())
            .or_else(|| keyword_hit.then(|| probe.text.to_owned())),
        _ if keyword_hit => {
            let value = best
                .map(|entry| category.format_value(&entry.raw))
                .and_then(|formatted| probe.literal(&formatted))
                .unwrap_or(probe.text);
            Some(value.to_owned())
        }
        // Without its marker a templated category only takes a clause that is exactly one
        // of its values.
        _ => best
            .filter(|entry| entry.normalized == probe.normalized)
            .map(|entry| category.format_value(&entry.raw)),
    }
}

fn longest_match<'c>(category: &'c Category, probe: &Probe<'_>) -> Option<&'c VocabEntry> {
    category
        .entries()
        .iter()
        .filter(|entry| probe.matches(category.match_rule(), entry))
        .fold(None, |best: Option<&VocabEntry>, entry| match best {
            Some(current) if current.normalized.len() >= entry.normalized.len() => Some(current),
            _ => Some(entry),
        })
}

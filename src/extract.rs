//! Parameter extraction: splits a prompt into clauses and projects it onto a grammar.
//!
//! The parameter list is always derived from the text and recomputed after every edit;
//! nothing here holds state between calls.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::classify::classify_candidates;
use crate::grammar::Grammar;
use crate::vocab::DIRECTIVE_SUFFIX;

/// A whole directive with its argument (`--ar 16:9`, `--style raw`).
pub(crate) fn directive_re() -> &'static Regex {
    static DIRECTIVE_RE: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE_RE.get_or_init(|| {
        Regex::new(r"--(?:ar|style)\b(?:\s+[^\s,]+)?").expect("directive regex should compile")
    })
}

/// Byte offset where the trailing run of directives begins, or `text.len()` when the text
/// does not end in one. A directive followed by more prompt text stays in the body.
pub(crate) fn suffix_start(text: &str) -> usize {
    let mut start = text.len();
    let found = directive_re().find_iter(text).collect::<Vec<_>>();
    for directive in found.into_iter().rev() {
        let gap = &text[directive.end()..start];
        if !gap.chars().all(|ch| ch.is_whitespace() || ch == ',') {
            break;
        }
        start = directive.start();
    }
    start
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseRole {
    Leading,
    Parameter,
    Descriptive,
    Ignored,
}

/// One non-empty comma-separated clause. `start..end` is its trimmed byte span in the
/// full prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedClause {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub role: ClauseRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip)]
    pub(crate) category_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRecord {
    pub category: String,
    pub current_value: String,
    pub allowed_options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clause_index: Option<usize>,
}

impl ParameterRecord {
    pub fn is_placeholder(&self) -> bool {
        self.clause_index.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub clauses: Vec<AnnotatedClause>,
    pub directive_suffix: bool,
}

#[derive(Debug, Clone)]
pub struct PromptLayout<'g> {
    grammar: &'g Grammar,
    body: String,
    has_suffix: bool,
    clauses: Vec<AnnotatedClause>,
}

impl<'g> PromptLayout<'g> {
    pub fn parse(grammar: &'g Grammar, prompt: &str) -> Self {
        let body = &prompt[..suffix_start(prompt)];
        let mut clauses = split_clauses(body);

        let mut claimed = vec![false; grammar.categories().len()];
        let mut seen_content = false;
        for clause in &mut clauses {
            if clause.index == 0 && grammar.is_leading_token(&clause.text) {
                clause.role = ClauseRole::Leading;
                continue;
            }
            let first_content = !seen_content;
            seen_content = true;

            let candidates = classify_candidates(grammar, &clause.text);
            if let Some(candidate) = candidates
                .into_iter()
                .find(|candidate| !claimed[candidate.index])
            {
                claimed[candidate.index] = true;
                clause.assign(candidate.index, candidate.category.name(), candidate.value);
                continue;
            }

            if grammar.is_ignored(&clause.text) {
                clause.role = ClauseRole::Ignored;
                continue;
            }

            if let Some(forced) = grammar
                .force_first_clause()
                .filter(|index| first_content && !claimed[*index])
            {
                claimed[forced] = true;
                let name = grammar.categories()[forced].name().to_owned();
                log::debug!("[extract] first clause {:?} forced into {name}", clause.text);
                let value = clause.text.clone();
                clause.assign(forced, &name, value);
            }
        }

        Self {
            grammar,
            body: body.to_owned(),
            has_suffix: prompt.trim_end().ends_with(DIRECTIVE_SUFFIX),
            clauses,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Prompt text before the trailing directives.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn has_suffix(&self) -> bool {
        self.has_suffix
    }

    pub fn clauses(&self) -> &[AnnotatedClause] {
        &self.clauses
    }

    /// The clause holding `category_index`, if any clause claimed it.
    pub fn claim(&self, category_index: usize) -> Option<&AnnotatedClause> {
        self.clauses
            .iter()
            .find(|clause| clause.category_index == Some(category_index))
    }

    pub fn records(&self) -> Vec<ParameterRecord> {
        if self.clauses.is_empty() {
            return Vec::new();
        }
        self.grammar
            .categories()
            .iter()
            .enumerate()
            .filter_map(|(index, category)| {
                let (current_value, clause_index) = match self.claim(index) {
                    Some(clause) => (clause.value.clone()?, Some(clause.index)),
                    None if category.is_mandatory() => (category.placeholder(), None),
                    None => return None,
                };
                Some(ParameterRecord {
                    category: category.name().to_owned(),
                    current_value,
                    allowed_options: category.allowed_options(),
                    clause_index,
                })
            })
            .collect()
    }

    pub fn annotation(&self) -> Annotation {
        Annotation {
            clauses: self.clauses.clone(),
            directive_suffix: self.has_suffix,
        }
    }
}

impl AnnotatedClause {
    fn assign(&mut self, category_index: usize, category: &str, value: String) {
        self.role = ClauseRole::Parameter;
        self.category_index = Some(category_index);
        self.category = Some(category.to_owned());
        self.value = Some(value);
    }
}

fn split_clauses(body: &str) -> Vec<AnnotatedClause> {
    let mut clauses = Vec::new();
    let mut offset = 0;
    for piece in body.split(',') {
        let text = piece.trim();
        if !text.is_empty() {
            let start = offset + (piece.len() - piece.trim_start().len());
            clauses.push(AnnotatedClause {
                index: clauses.len(),
                text: text.to_owned(),
                start,
                end: start + text.len(),
                role: ClauseRole::Descriptive,
                category: None,
                value: None,
                category_index: None,
            });
        }
        offset += piece.len() + 1;
    }
    clauses
}

/// Projects prompt text onto the grammar's categories, in canonical category order.
///
/// Each category takes the first clause that matches it. Mandatory categories no clause
/// matched come back as `[Category]` placeholders. Blank text (or text holding only the
/// directive suffix) yields an empty list, since there is no prompt yet.
pub fn extract_parameters(grammar: &Grammar, prompt: &str) -> Vec<ParameterRecord> {
    let records = PromptLayout::parse(grammar, prompt).records();
    log::debug!(
        "[extract] {} records, {} placeholders",
        records.len(),
        records.iter().filter(|record| record.is_placeholder()).count()
    );
    records
}

pub fn annotate(grammar: &Grammar, prompt: &str) -> Annotation {
    PromptLayout::parse(grammar, prompt).annotation()
}

use serde::Serialize;

use crate::extract::{
    directive_re, extract_parameters, suffix_start, AnnotatedClause, ParameterRecord,
    PromptLayout,
};
use crate::grammar::{Category, Grammar};
use crate::normalize::placeholder_name;
use crate::vocab::DIRECTIVE_SUFFIX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditLocation {
    Unchanged,
    Replaced { clause: usize },
    Inserted { clause: usize },
    Appended,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reassembly {
    pub prompt: String,
    pub parameters: Vec<ParameterRecord>,
    pub edit: EditLocation,
}

/// Guarantees the text ends with exactly one directive suffix. Idempotent.
///
/// Text that already ends with the suffix and carries no other directive is returned
/// trimmed. Anything else has every directive stripped and empty clauses dropped before
/// the suffix is appended as the final clause. Blank text stays blank.
pub fn ensure_directive_suffix(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Some(head) = trimmed.strip_suffix(DIRECTIVE_SUFFIX) {
        if !directive_re().is_match(head) {
            return trimmed.to_owned();
        }
    }

    // Removing one directive can splice its neighbours into another, so strip to a fixpoint.
    let mut stripped = trimmed.to_owned();
    while directive_re().is_match(&stripped) {
        stripped = directive_re().replace_all(&stripped, "").into_owned();
    }
    let clauses = stripped
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect::<Vec<_>>();
    if clauses.is_empty() {
        DIRECTIVE_SUFFIX.to_owned()
    } else {
        format!("{}, {DIRECTIVE_SUFFIX}", clauses.join(", "))
    }
}

/// Makes the grammar's leading token the exact first clause. Idempotent; a no-op for
/// grammars without one.
pub fn ensure_leading_token(grammar: &Grammar, text: &str) -> String {
    let Some(token) = grammar.leading_token() else {
        return text.to_owned();
    };
    let trimmed = text.trim_start();
    if trimmed.trim_end().is_empty() {
        return String::new();
    }
    let first_end = trimmed.find(',').unwrap_or(trimmed.len());
    let first = trimmed[..first_end].trim();
    if first == token {
        trimmed.to_owned()
    } else if first.eq_ignore_ascii_case(token) {
        format!("{token}{}", &trimmed[first_end..])
    } else {
        format!("{token}, {trimmed}")
    }
}

/// Leading token, then directive suffix.
pub fn finalize(grammar: &Grammar, text: &str) -> String {
    ensure_directive_suffix(&ensure_leading_token(grammar, text))
}

/// Replaces one clause value and re-derives the parameter list from the new text.
///
/// A placeholder `old` targets its category's slot rather than literal bracket text. A value
/// found nowhere is appended as a new trailing clause, so this never fails.
pub fn reassemble(grammar: &Grammar, prompt: &str, old: &str, new: &str) -> Reassembly {
    let (old, new) = (old.trim(), new.trim());
    if old == new {
        let prompt = finalize(grammar, prompt);
        return Reassembly {
            parameters: extract_parameters(grammar, &prompt),
            prompt,
            edit: EditLocation::Unchanged,
        };
    }

    let layout = PromptLayout::parse(grammar, prompt);
    let (mut edited, edit) = apply_edit(&layout, prompt, old, new);
    if new.is_empty() {
        edited = drop_empty_clauses(&edited);
    }
    log::info!("[reassemble] {old:?} -> {new:?} ({edit:?})");

    let prompt = finalize(grammar, &edited);
    Reassembly {
        parameters: extract_parameters(grammar, &prompt),
        prompt,
        edit,
    }
}

fn apply_edit(
    layout: &PromptLayout<'_>,
    prompt: &str,
    old: &str,
    new: &str,
) -> (String, EditLocation) {
    let grammar = layout.grammar();

    if let Some(index) = placeholder_name(old).and_then(|name| grammar.index_of(name)) {
        let category = &grammar.categories()[index];
        let value = formatted(category, new);
        // The slot clause may carry its template around the brackets, so the formatted
        // value takes the whole clause.
        if let Some(clause) = layout.claim(index) {
            return replace_in_clause(prompt, clause, "", &value);
        }
        // Unfilled slot: place it ahead of the first clause of a later category so the
        // text keeps canonical order where it can.
        let next = layout
            .clauses()
            .iter()
            .filter(|clause| clause.category_index.is_some_and(|other| other > index))
            .min_by_key(|clause| clause.start);
        return match next {
            Some(clause) => (
                format!("{}{value}, {}", &prompt[..clause.start], &prompt[clause.start..]),
                EditLocation::Inserted {
                    clause: clause.index,
                },
            ),
            None => (
                append_clause(prompt, layout.body().len(), &value),
                EditLocation::Appended,
            ),
        };
    }

    if !old.is_empty() {
        let claimed = |exact: bool| {
            layout.clauses().iter().find(|clause| {
                clause.value.as_deref().is_some_and(|value| {
                    if exact {
                        value == old
                    } else {
                        value.eq_ignore_ascii_case(old)
                    }
                })
            })
        };
        if let Some(clause) = claimed(true).or_else(|| claimed(false)) {
            let value = clause
                .category_index
                .map(|index| formatted(&grammar.categories()[index], new))
                .unwrap_or_else(|| new.to_owned());
            return replace_in_clause(prompt, clause, old, &value);
        }

        if let Some(clause) = layout
            .clauses()
            .iter()
            .find(|clause| clause.text.contains(old))
        {
            return replace_in_clause(prompt, clause, old, new);
        }
    }

    if new.is_empty() {
        return (prompt.to_owned(), EditLocation::Unchanged);
    }
    (
        append_clause(prompt, layout.body().len(), new),
        EditLocation::Appended,
    )
}

fn formatted(category: &Category, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        category.format_value(value)
    }
}

fn replace_in_clause(
    prompt: &str,
    clause: &AnnotatedClause,
    old: &str,
    new: &str,
) -> (String, EditLocation) {
    let span = &prompt[clause.start..clause.end];
    let (start, end) = match span.find(old) {
        Some(offset) if !old.is_empty() => (clause.start + offset, clause.start + offset + old.len()),
        _ => (clause.start, clause.end),
    };
    (
        format!("{}{new}{}", &prompt[..start], &prompt[end..]),
        EditLocation::Replaced {
            clause: clause.index,
        },
    )
}

fn append_clause(prompt: &str, body_len: usize, value: &str) -> String {
    let body = &prompt[..body_len];
    let rest = &prompt[body_len..];
    let kept = body.trim_end();
    let head = kept.strip_suffix(',').unwrap_or(kept).trim_end();
    if head.is_empty() {
        return if rest.trim().is_empty() {
            value.to_owned()
        } else {
            format!("{value}, {}", rest.trim_start())
        };
    }
    let separator = &body[head.len()..];
    format!("{head}, {value}{separator}{rest}")
}

fn drop_empty_clauses(text: &str) -> String {
    let body_end = suffix_start(text);
    let body = text[..body_end]
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let rest = text[body_end..].trim();
    match (body.is_empty(), rest.is_empty()) {
        (_, true) => body,
        (true, false) => rest.to_owned(),
        (false, false) => format!("{body}, {rest}"),
    }
}

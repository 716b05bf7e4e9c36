//! Form-driven prompt assembly: values picked per category plus free descriptors, walked
//! through the grammar's structure slots.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::CodedError;
use crate::grammar::{Grammar, Slot};
use crate::normalize::placeholder;
use crate::reassemble::finalize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Composition {
    #[serde(default)]
    pub selections: BTreeMap<String, String>,
    #[serde(default)]
    pub descriptors: BTreeMap<String, String>,
}

impl Composition {
    pub fn select(mut self, category: &str, value: &str) -> Self {
        self.selections.insert(category.to_owned(), value.to_owned());
        self
    }

    pub fn describe(mut self, label: &str, text: &str) -> Self {
        self.descriptors.insert(label.to_owned(), text.to_owned());
        self
    }
}

pub fn compose(grammar: &Grammar, composition: &Composition) -> Result<String> {
    for name in composition.selections.keys() {
        if grammar.lookup(name).is_none() {
            return Err(anyhow!(CodedError::usage(
                "UNKNOWN_CATEGORY",
                format!("grammar '{}' has no category '{name}'", grammar.name()),
            )
            .with_details(json!({
                "provided": name,
                "expected": grammar
                    .categories()
                    .iter()
                    .map(|category| category.name())
                    .collect::<Vec<_>>(),
            }))));
        }
    }
    for label in composition.descriptors.keys() {
        if !grammar.descriptor_labels().any(|known| known == label.as_str()) {
            return Err(anyhow!(CodedError::usage(
                "UNKNOWN_DESCRIPTOR",
                format!("grammar '{}' has no descriptor '{label}'", grammar.name()),
            )
            .with_details(json!({
                "provided": label,
                "expected": grammar.descriptor_labels().collect::<Vec<_>>(),
            }))));
        }
    }

    let mut clauses = Vec::with_capacity(grammar.structure().len());
    for slot in grammar.structure() {
        match slot {
            Slot::Category(index) => {
                let category = &grammar.categories()[*index];
                let selected = composition
                    .selections
                    .get(category.name())
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty());
                match selected {
                    Some(value) => clauses.push(category.format_value(value)),
                    None if category.is_mandatory() => clauses.push(category.placeholder()),
                    None => {}
                }
            }
            Slot::Descriptor(label) => {
                if let Some(text) = composition
                    .descriptors
                    .get(label)
                    .map(|text| text.trim())
                    .filter(|text| !text.is_empty())
                {
                    clauses.push(text.to_owned());
                }
            }
        }
    }

    log::debug!(
        "[compose] {} slots filled from {} selections",
        clauses.len(),
        composition.selections.len()
    );
    Ok(finalize(grammar, &clauses.join(", ")))
}

/// Every slot as a `[Label]` placeholder; the instruction skeleton for prompt generation.
pub fn structure_template(grammar: &Grammar) -> String {
    let slots = grammar
        .structure()
        .iter()
        .map(|slot| match slot {
            Slot::Category(index) => grammar.categories()[*index].placeholder(),
            Slot::Descriptor(label) => placeholder(label),
        })
        .collect::<Vec<_>>();
    finalize(grammar, &slots.join(", "))
}

#[cfg(test)]
mod tests {
    use super::{compose, structure_template, Composition};
    use crate::error_codes::find_coded_error;
    use crate::extract::extract_parameters;
    use crate::grammar::{illustration, photography};

    #[test]
    fn full_selection_reproduces_scenario_order() {
        let composition = Composition::default()
            .select("Illustration/Animation Type", "Cartoon Illustration")
            .describe("Subject", "happy robot")
            .select("Shot Type", "Medium Shot")
            .select("Camera Angle", "Eye Level")
            .select("Style of Illustrator/Animation Studio", "Studio Ghibli")
            .select("3D Rendering/Animation Engine", "created in Blender")
            .select("Illustration/Animation Aesthetic", "Studio Ghibli");

        let prompt = compose(illustration(), &composition).expect("compose should succeed");
        assert_eq!(
            prompt,
            "Cartoon Illustration, happy robot, Medium Shot, Eye Level, inspired by Studio Ghibli, created in Blender, Studio Ghibli Aesthetic, --ar 16:9 --style raw"
        );
        assert!(extract_parameters(illustration(), &prompt)
            .iter()
            .all(|record| !record.is_placeholder()));
    }

    #[test]
    fn unselected_mandatory_categories_stay_as_placeholders() {
        let prompt = compose(
            photography(),
            &Composition::default().select("Film Stock", "Kodak Portra 400"),
        )
        .expect("compose should succeed");
        assert!(prompt.starts_with("Cinematic, [Photography Genre], [Shot/Frame Type]"));
        assert!(prompt.contains(", Kodak Portra 400, "));
        assert!(prompt.ends_with("[Photography Aesthetic], --ar 16:9 --style raw"));
    }

    #[test]
    fn unknown_category_is_a_usage_error() {
        let error = compose(
            illustration(),
            &Composition::default().select("Lens Type", "35mm"),
        )
        .expect_err("unknown category should fail");
        let coded = find_coded_error(&error).expect("coded error");
        assert_eq!(coded.code, "UNKNOWN_CATEGORY");
        assert_eq!(coded.kind.exit_code(), 2);
    }

    #[test]
    fn unknown_descriptor_is_a_usage_error() {
        let error = compose(
            illustration(),
            &Composition::default().describe("Lenses", "35mm"),
        )
        .expect_err("illustration has no lens slot");
        assert_eq!(
            find_coded_error(&error).map(|coded| coded.code),
            Some("UNKNOWN_DESCRIPTOR")
        );
    }

    #[test]
    fn structure_template_lists_every_slot() {
        let template = structure_template(photography());
        assert!(template.starts_with("Cinematic, [Photography Genre], [Subject], [Action], "));
        assert!(template.contains("[Lenses], [Film Stock]"));
        assert!(template.ends_with("[Mood], --ar 16:9 --style raw"));
    }
}

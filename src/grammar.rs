//! Grammar definitions: the ordered categories a prompt is parsed into.
//!
//! One classification/extraction engine serves every prompt flavour; the differences
//! between illustration and photography prompts (vocabularies, templates, the leading
//! `Cinematic` token, first-clause policy, ignored lens clauses) are all data here.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::CodedError;
use crate::normalize::{normalize_clause, placeholder};
use crate::vocab::{
    ValueTemplate, CINEMATIC_LEADING_TOKEN, CINEMATOGRAPHERS_AND_DIRECTORS, FILM_STOCKS,
    FILM_STOCK_BRANDS, ILLUSTRATION_AESTHETICS, ILLUSTRATION_CAMERA_ANGLES,
    ILLUSTRATION_SHOT_TYPES, ILLUSTRATION_STYLES, ILLUSTRATION_TYPES, LENS_PATTERNS,
    PHOTOGRAPHY_AESTHETICS, PHOTOGRAPHY_CAMERA_ANGLES, PHOTOGRAPHY_GENRES,
    PHOTOGRAPHY_SHOT_TYPES, RENDERING_ENGINES,
};

pub const ILLUSTRATION: &str = "illustration";
pub const PHOTOGRAPHY: &str = "photography";
pub const BUILTIN_GRAMMARS: [&str; 2] = [ILLUSTRATION, PHOTOGRAPHY];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Clause contains the normalized value.
    #[default]
    Substring,
    /// Also tries unhyphenated and spaced spellings of each value.
    ShotVariants,
}

#[derive(Debug, Clone)]
pub struct VocabEntry {
    pub raw: String,
    pub normalized: String,
}

#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    entries: Vec<VocabEntry>,
    template: ValueTemplate,
    mandatory: bool,
    match_rule: MatchRule,
    keywords: Vec<String>,
    vetoes: Vec<String>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    pub fn template(&self) -> ValueTemplate {
        self.template
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn match_rule(&self) -> MatchRule {
        self.match_rule
    }

    /// Normalized detection keywords, template marker included.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.template
            .keyword()
            .into_iter()
            .chain(self.keywords.iter().map(String::as_str))
    }

    pub fn vetoes(&self) -> &[String] {
        &self.vetoes
    }

    pub fn placeholder(&self) -> String {
        placeholder(&self.name)
    }

    pub fn format_value(&self, value: &str) -> String {
        self.template.format(value)
    }

    /// Literal options as they are written into prompt text.
    pub fn allowed_options(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| self.template.apply(&entry.raw))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Category(usize),
    Descriptor(String),
}

#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    categories: Vec<Category>,
    priority: Vec<usize>,
    leading_token: Option<String>,
    force_first_clause: Option<usize>,
    ignore_patterns: Vec<Regex>,
    structure: Vec<Slot>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Categories in canonical output order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category indices in classification priority order.
    pub fn priority(&self) -> &[usize] {
        &self.priority
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.categories
            .iter()
            .position(|category| category.name == name)
    }

    pub fn lookup(&self, name: &str) -> Option<&Category> {
        self.index_of(name).map(|index| &self.categories[index])
    }

    /// Panics on an unknown name: asking a grammar for a category it never declared is a
    /// programming error. Use [`Grammar::lookup`] for user-supplied names.
    pub fn category(&self, name: &str) -> &Category {
        self.lookup(name)
            .unwrap_or_else(|| panic!("grammar '{}' has no category '{name}'", self.name))
    }

    pub fn leading_token(&self) -> Option<&str> {
        self.leading_token.as_deref()
    }

    pub fn is_leading_token(&self, clause: &str) -> bool {
        self.leading_token
            .as_deref()
            .is_some_and(|token| clause.trim().eq_ignore_ascii_case(token))
    }

    pub fn force_first_clause(&self) -> Option<usize> {
        self.force_first_clause
    }

    pub fn is_ignored(&self, clause: &str) -> bool {
        self.ignore_patterns.iter().any(|re| re.is_match(clause))
    }

    pub fn structure(&self) -> &[Slot] {
        &self.structure
    }

    pub fn descriptor_labels(&self) -> impl Iterator<Item = &str> {
        self.structure.iter().filter_map(|slot| match slot {
            Slot::Descriptor(label) => Some(label.as_str()),
            Slot::Category(_) => None,
        })
    }

    pub fn summary(&self) -> GrammarSummary {
        GrammarSummary {
            name: self.name.clone(),
            leading_token: self.leading_token.clone(),
            force_first_clause: self
                .force_first_clause
                .map(|index| self.categories[index].name.clone()),
            categories: self
                .categories
                .iter()
                .map(|category| CategorySummary {
                    name: category.name.clone(),
                    template: category.template,
                    mandatory: category.mandatory,
                    options: category.entries.len(),
                })
                .collect(),
            priority: self
                .priority
                .iter()
                .map(|index| self.categories[*index].name.clone())
                .collect(),
        }
    }

    pub fn from_spec(spec: GrammarSpec) -> Result<Self> {
        let grammar_name = spec.name.trim().to_owned();
        if grammar_name.is_empty() {
            return Err(invalid_grammar("<unnamed>", "grammar name cannot be empty"));
        }
        if spec.categories.is_empty() {
            return Err(invalid_grammar(
                &grammar_name,
                "grammar must declare at least one category",
            ));
        }

        let mut seen = BTreeSet::new();
        let mut categories = Vec::with_capacity(spec.categories.len());
        for category in spec.categories {
            let name = category.name.trim().to_owned();
            validate_label(&grammar_name, "category", &name)?;
            if !seen.insert(name.clone()) {
                return Err(invalid_grammar(
                    &grammar_name,
                    format!("duplicate category '{name}'"),
                ));
            }
            let entries = category
                .values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(|value| VocabEntry {
                    raw: value.to_owned(),
                    normalized: normalize_clause(value),
                })
                .filter(|entry| !entry.normalized.is_empty())
                .collect::<Vec<_>>();
            let keywords = normalize_keywords(&category.keywords);
            if entries.is_empty() && keywords.is_empty() && category.template == ValueTemplate::Bare
            {
                return Err(invalid_grammar(
                    &grammar_name,
                    format!("category '{name}' has no values, keywords or template and can never match"),
                ));
            }
            categories.push(Category {
                name,
                entries,
                template: category.template,
                mandatory: category.mandatory,
                match_rule: category.match_rule,
                keywords,
                vetoes: normalize_keywords(&category.vetoes),
            });
        }

        let position = |name: &str| {
            categories
                .iter()
                .position(|category| category.name == name.trim())
                .ok_or_else(|| {
                    invalid_grammar(&grammar_name, format!("unknown category '{}'", name.trim()))
                })
        };

        let mut priority = Vec::with_capacity(categories.len());
        for name in &spec.priority {
            let index = position(name.as_str())?;
            if priority.contains(&index) {
                return Err(invalid_grammar(
                    &grammar_name,
                    format!("category '{}' listed twice in priority", name.trim()),
                ));
            }
            priority.push(index);
        }
        for index in 0..categories.len() {
            if !priority.contains(&index) {
                priority.push(index);
            }
        }

        let force_first_clause = spec
            .force_first_clause
            .as_deref()
            .map(&position)
            .transpose()?;

        let leading_token = match spec.leading_token.as_deref().map(str::trim) {
            Some(token) => {
                validate_label(&grammar_name, "leading token", token)?;
                Some(token.to_owned())
            }
            None => None,
        };

        let ignore_patterns = spec
            .ignore_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|error| {
                    invalid_grammar(
                        &grammar_name,
                        format!("invalid ignore pattern '{pattern}': {error}"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let structure = if spec.structure.is_empty() {
            (0..categories.len()).map(Slot::Category).collect()
        } else {
            let mut slots = Vec::with_capacity(spec.structure.len());
            for slot in &spec.structure {
                match (slot.category.as_deref(), slot.descriptor.as_deref()) {
                    (Some(name), None) => slots.push(Slot::Category(position(name)?)),
                    (None, Some(label)) => {
                        let label = label.trim();
                        validate_label(&grammar_name, "descriptor", label)?;
                        slots.push(Slot::Descriptor(label.to_owned()));
                    }
                    _ => {
                        return Err(invalid_grammar(
                            &grammar_name,
                            "each structure slot needs exactly one of `category` or `descriptor`",
                        ))
                    }
                }
            }
            slots
        };

        Ok(Self {
            name: grammar_name,
            categories,
            priority,
            leading_token,
            force_first_clause,
            ignore_patterns,
            structure,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file {}", path.display()))?;
        let spec: GrammarSpec = serde_yaml::from_str(&content).map_err(|error| {
            anyhow!(CodedError::invalid_data(
                "INVALID_GRAMMAR",
                format!("failed to parse grammar {}: {error}", path.display()),
            ))
        })?;
        Self::from_spec(spec)
            .with_context(|| format!("invalid grammar file {}", path.display()))
    }
}

fn validate_label(grammar: &str, what: &str, label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(invalid_grammar(grammar, format!("{what} cannot be empty")));
    }
    if label.contains([',', '[', ']']) {
        return Err(invalid_grammar(
            grammar,
            format!("{what} '{label}' cannot contain ',', '[' or ']'"),
        ));
    }
    Ok(())
}

fn normalize_keywords(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|keyword| normalize_clause(keyword))
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn invalid_grammar(grammar: &str, message: impl Into<String>) -> anyhow::Error {
    anyhow!(
        CodedError::invalid_data("INVALID_GRAMMAR", message).with_details(json!({
            "grammar": grammar,
        }))
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct GrammarSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_first_clause: Option<String>,
    pub categories: Vec<CategorySummary>,
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub template: ValueTemplate,
    pub mandatory: bool,
    pub options: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarSpec {
    pub name: String,
    #[serde(default)]
    pub leading_token: Option<String>,
    #[serde(default)]
    pub force_first_clause: Option<String>,
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub structure: Vec<SlotSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub template: ValueTemplate,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
    #[serde(default)]
    pub match_rule: MatchRule,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub vetoes: Vec<String>,
}

fn default_mandatory() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotSpec {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub descriptor: Option<String>,
}

impl SlotSpec {
    fn category(name: &str) -> Self {
        Self {
            category: Some(name.to_owned()),
            descriptor: None,
        }
    }

    fn descriptor(label: &str) -> Self {
        Self {
            category: None,
            descriptor: Some(label.to_owned()),
        }
    }
}

fn builtin_category(
    name: &str,
    values: &[&str],
    template: ValueTemplate,
    match_rule: MatchRule,
) -> CategorySpec {
    CategorySpec {
        name: name.to_owned(),
        values: values.iter().map(|value| (*value).to_owned()).collect(),
        template,
        mandatory: true,
        match_rule,
        keywords: Vec::new(),
        vetoes: Vec::new(),
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

pub fn illustration_spec() -> GrammarSpec {
    const TYPE: &str = "Illustration/Animation Type";
    const SHOT: &str = "Shot Type";
    const ANGLE: &str = "Camera Angle";
    const STYLE: &str = "Style of Illustrator/Animation Studio";
    const ENGINE: &str = "3D Rendering/Animation Engine";
    const AESTHETIC: &str = "Illustration/Animation Aesthetic";

    GrammarSpec {
        name: ILLUSTRATION.to_owned(),
        leading_token: None,
        force_first_clause: Some(TYPE.to_owned()),
        priority: Vec::new(),
        ignore_patterns: Vec::new(),
        categories: vec![
            builtin_category(TYPE, ILLUSTRATION_TYPES, ValueTemplate::Bare, MatchRule::Substring),
            builtin_category(
                SHOT,
                ILLUSTRATION_SHOT_TYPES,
                ValueTemplate::Bare,
                MatchRule::ShotVariants,
            ),
            builtin_category(
                ANGLE,
                ILLUSTRATION_CAMERA_ANGLES,
                ValueTemplate::Bare,
                MatchRule::Substring,
            ),
            builtin_category(
                STYLE,
                ILLUSTRATION_STYLES,
                ValueTemplate::InspiredBy,
                MatchRule::Substring,
            ),
            builtin_category(
                ENGINE,
                RENDERING_ENGINES,
                ValueTemplate::CreatedIn,
                MatchRule::Substring,
            ),
            builtin_category(
                AESTHETIC,
                ILLUSTRATION_AESTHETICS,
                ValueTemplate::Aesthetic,
                MatchRule::Substring,
            ),
        ],
        structure: vec![
            SlotSpec::category(TYPE),
            SlotSpec::descriptor("Subject"),
            SlotSpec::descriptor("Action"),
            SlotSpec::category(SHOT),
            SlotSpec::category(ANGLE),
            SlotSpec::descriptor("Location"),
            SlotSpec::descriptor("Time of Day"),
            SlotSpec::descriptor("Background"),
            SlotSpec::category(STYLE),
            SlotSpec::category(ENGINE),
            SlotSpec::descriptor("Lighting"),
            SlotSpec::descriptor("Color Palette"),
            SlotSpec::category(AESTHETIC),
            SlotSpec::descriptor("Mood"),
        ],
    }
}

pub fn photography_spec() -> GrammarSpec {
    const GENRE: &str = "Photography Genre";
    const SHOT: &str = "Shot/Frame Type";
    const ANGLE: &str = "Camera Angle";
    const DIRECTOR: &str = "Name of Cinematographer or Film Director";
    const STOCK: &str = "Film Stock";
    const AESTHETIC: &str = "Photography Aesthetic";

    let mut genre = builtin_category(
        GENRE,
        PHOTOGRAPHY_GENRES,
        ValueTemplate::Bare,
        MatchRule::Substring,
    );
    genre.keywords = vec!["photography".to_owned()];
    genre.vetoes = vec!["aesthetic".to_owned(), "inspired by".to_owned()];

    let mut stock = builtin_category(STOCK, FILM_STOCKS, ValueTemplate::Bare, MatchRule::Substring);
    stock.keywords = to_strings(FILM_STOCK_BRANDS);

    GrammarSpec {
        name: PHOTOGRAPHY.to_owned(),
        leading_token: Some(CINEMATIC_LEADING_TOKEN.to_owned()),
        force_first_clause: None,
        priority: Vec::new(),
        ignore_patterns: to_strings(LENS_PATTERNS),
        categories: vec![
            genre,
            builtin_category(
                SHOT,
                PHOTOGRAPHY_SHOT_TYPES,
                ValueTemplate::Bare,
                MatchRule::ShotVariants,
            ),
            builtin_category(
                ANGLE,
                PHOTOGRAPHY_CAMERA_ANGLES,
                ValueTemplate::Bare,
                MatchRule::Substring,
            ),
            builtin_category(
                DIRECTOR,
                CINEMATOGRAPHERS_AND_DIRECTORS,
                ValueTemplate::InspiredBy,
                MatchRule::Substring,
            ),
            stock,
            builtin_category(
                AESTHETIC,
                PHOTOGRAPHY_AESTHETICS,
                ValueTemplate::Aesthetic,
                MatchRule::Substring,
            ),
        ],
        structure: vec![
            SlotSpec::category(GENRE),
            SlotSpec::descriptor("Subject"),
            SlotSpec::descriptor("Action"),
            SlotSpec::category(SHOT),
            SlotSpec::category(ANGLE),
            SlotSpec::descriptor("Location"),
            SlotSpec::descriptor("Background"),
            SlotSpec::category(DIRECTOR),
            SlotSpec::descriptor("Camera"),
            SlotSpec::descriptor("Lenses"),
            SlotSpec::category(STOCK),
            SlotSpec::descriptor("Lighting"),
            SlotSpec::descriptor("Color Palette"),
            SlotSpec::category(AESTHETIC),
            SlotSpec::descriptor("Mood"),
        ],
    }
}

pub fn illustration() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Grammar::from_spec(illustration_spec()).expect("illustration grammar should validate")
    })
}

pub fn photography() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Grammar::from_spec(photography_spec()).expect("photography grammar should validate")
    })
}

pub fn builtin(name: &str) -> Option<&'static Grammar> {
    match name.trim().to_ascii_lowercase().as_str() {
        ILLUSTRATION => Some(illustration()),
        PHOTOGRAPHY => Some(photography()),
        _ => None,
    }
}

/// Resolves a built-in grammar name or a path to a YAML grammar file.
pub fn resolve(reference: &str) -> Result<Grammar> {
    if let Some(grammar) = builtin(reference) {
        return Ok(grammar.clone());
    }
    let path = Path::new(reference);
    if path.is_file() {
        return Grammar::load(path);
    }
    Err(anyhow!(CodedError::usage(
        "UNKNOWN_GRAMMAR",
        format!("'{reference}' is neither a built-in grammar nor a grammar file"),
    )
    .with_details(json!({
        "provided": reference,
        "builtin": BUILTIN_GRAMMARS,
    }))))
}

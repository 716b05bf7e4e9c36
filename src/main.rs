use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use serde::Serialize;
use serde_json::json;

use shotprompt::classify::classify_segment;
use shotprompt::compose::{compose, structure_template, Composition};
use shotprompt::error_codes::{envelope_for, exit_code_for, CodedError};
use shotprompt::extract::{annotate, extract_parameters, ClauseRole};
use shotprompt::grammar::{self, Grammar, BUILTIN_GRAMMARS};
use shotprompt::reassemble::{ensure_directive_suffix, finalize, reassemble, EditLocation};
use shotprompt::store::{self, DEFAULT_STORE_DIR};

#[derive(Debug, Parser)]
#[command(name = "shotprompt")]
#[command(about = "Classify, edit and assemble structured image/video generation prompts")]
#[command(version = env!("SHOTPROMPT_VERSION"))]
struct Cli {
    /// Built-in grammar name (illustration, photography) or path to a YAML grammar.
    #[arg(
        long = "grammar",
        global = true,
        env = "SHOTPROMPT_GRAMMAR",
        default_value = grammar::ILLUSTRATION
    )]
    grammar: String,
    /// Emit JSON on stdout, and JSON error envelopes on stderr.
    #[arg(long = "json", global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a single clause.
    Classify { clause: String },
    /// List the parameter records of a prompt in canonical category order.
    Extract {
        #[command(flatten)]
        input: PromptInput,
    },
    /// Show every clause with its role and category.
    Annotate {
        #[command(flatten)]
        input: PromptInput,
    },
    /// Replace one clause value and re-extract.
    Edit {
        #[arg(long = "old")]
        old: String,
        #[arg(long = "new")]
        new: String,
        #[command(flatten)]
        input: PromptInput,
    },
    /// Ensure the prompt ends with exactly one directive suffix.
    Suffix {
        #[command(flatten)]
        input: PromptInput,
    },
    /// Apply the grammar's leading token and the directive suffix.
    Finalize {
        #[command(flatten)]
        input: PromptInput,
    },
    /// Assemble a prompt from per-category selections and descriptors.
    Compose {
        /// JSON file holding `selections` and `descriptors` maps.
        #[arg(long = "from")]
        from: Option<PathBuf>,
        #[arg(long = "set", value_name = "CATEGORY=VALUE")]
        set: Vec<String>,
        #[arg(long = "describe", value_name = "LABEL=TEXT")]
        describe: Vec<String>,
    },
    /// Print the grammar's prompt skeleton with every slot as a placeholder.
    Template,
    /// List allowed options, for one category or all of them.
    Vocab { category: Option<String> },
    /// Summarize the built-in grammars.
    Grammars,
    /// Saved prompts.
    Store {
        #[arg(
            long = "store-dir",
            env = "SHOTPROMPT_HOME",
            default_value = DEFAULT_STORE_DIR
        )]
        store_dir: PathBuf,
        #[command(subcommand)]
        action: StoreCommand,
    },
}

#[derive(Debug, Subcommand)]
enum StoreCommand {
    /// Finalize a prompt and save it under KEY.
    Put {
        key: String,
        #[command(flatten)]
        input: PromptInput,
    },
    Get {
        key: String,
    },
    List,
    Rm {
        key: String,
    },
}

#[derive(Debug, Args)]
struct PromptInput {
    /// Prompt text, or `-` to read stdin.
    prompt: Option<String>,
    #[arg(long = "file", conflicts_with = "prompt")]
    file: Option<PathBuf>,
}

impl PromptInput {
    fn read(&self) -> Result<String> {
        match (&self.prompt, &self.file) {
            (_, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read prompt file {}", path.display())),
            (Some(text), None) if text == "-" => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("failed to read prompt from stdin")?;
                Ok(buffer)
            }
            (Some(text), None) => Ok(text.clone()),
            (None, None) => Err(anyhow!(CodedError::usage(
                "MISSING_PROMPT",
                "provide prompt text, `-` for stdin, or --file <PATH>",
            ))),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(error) = run(cli) {
        report_error(&error, json);
        process::exit(exit_code_for(&error));
    }
}

fn report_error(error: &anyhow::Error, json: bool) {
    if json {
        match serde_json::to_string(&envelope_for(error)) {
            Ok(envelope) => eprintln!("{envelope}"),
            Err(_) => eprintln!("error: {error:#}"),
        }
    } else {
        eprintln!("error: {error:#}");
    }
}

fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    let grammar_ref = cli.grammar;
    let resolve = || -> Result<Grammar> {
        let grammar = grammar::resolve(&grammar_ref)?;
        log::debug!("[cli] using grammar '{}'", grammar.name());
        Ok(grammar)
    };

    match cli.command {
        Commands::Classify { clause } => {
            let grammar = resolve()?;
            let result = classify_segment(&grammar, &clause);
            emit(json, &result, || match &result.category {
                Some(category) => format!("{category}: {}", result.canonical_value),
                None => format!("(descriptive): {}", result.canonical_value),
            })
        }
        Commands::Extract { input } => {
            let grammar = resolve()?;
            let records = extract_parameters(&grammar, &input.read()?);
            emit(json, &json!({ "parameters": records }), || {
                records
                    .iter()
                    .map(|record| format!("{}: {}", record.category, record.current_value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Commands::Annotate { input } => {
            let grammar = resolve()?;
            let annotation = annotate(&grammar, &input.read()?);
            emit(json, &annotation, || {
                annotation
                    .clauses
                    .iter()
                    .map(|clause| {
                        let label = match (clause.role, &clause.category) {
                            (ClauseRole::Parameter, Some(category)) => category.clone(),
                            (ClauseRole::Leading, _) => "leading".to_owned(),
                            (ClauseRole::Ignored, _) => "ignored".to_owned(),
                            _ => "descriptive".to_owned(),
                        };
                        format!("{:>3}  {label}: {}", clause.index, clause.text)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Commands::Edit { old, new, input } => {
            let grammar = resolve()?;
            let result = reassemble(&grammar, &input.read()?, &old, &new);
            if result.edit == EditLocation::Appended {
                log::warn!("'{old}' not found; appended '{new}' as a new clause");
            }
            emit(json, &result, || result.prompt.clone())
        }
        Commands::Suffix { input } => {
            let prompt = ensure_directive_suffix(&input.read()?);
            emit(json, &json!({ "prompt": prompt }), || prompt.clone())
        }
        Commands::Finalize { input } => {
            let grammar = resolve()?;
            let prompt = finalize(&grammar, &input.read()?);
            emit(json, &json!({ "prompt": prompt }), || prompt.clone())
        }
        Commands::Compose { from, set, describe } => {
            let grammar = resolve()?;
            let mut composition = match from {
                Some(path) => load_composition(&path)?,
                None => Composition::default(),
            };
            for raw in &set {
                let (category, value) = parse_assignment(raw)?;
                composition.selections.insert(category, value);
            }
            for raw in &describe {
                let (label, text) = parse_assignment(raw)?;
                composition.descriptors.insert(label, text);
            }
            let prompt = compose(&grammar, &composition)?;
            emit(json, &json!({ "prompt": prompt }), || prompt.clone())
        }
        Commands::Template => {
            let prompt = structure_template(&resolve()?);
            emit(json, &json!({ "prompt": prompt }), || prompt.clone())
        }
        Commands::Vocab { category } => run_vocab(&resolve()?, category.as_deref(), json),
        Commands::Grammars => run_grammars(json),
        Commands::Store { store_dir, action } => run_store(&store_dir, action, resolve, json),
    }
}

fn run_vocab(grammar: &Grammar, category: Option<&str>, json: bool) -> Result<()> {
    let categories = match category {
        Some(name) => {
            let found = grammar.lookup(name).ok_or_else(|| {
                anyhow!(CodedError::usage(
                    "UNKNOWN_CATEGORY",
                    format!("grammar '{}' has no category '{name}'", grammar.name()),
                )
                .with_details(json!({ "provided": name })))
            })?;
            vec![found]
        }
        None => grammar.categories().iter().collect(),
    };

    let listing = categories
        .iter()
        .map(|category| {
            json!({
                "category": category.name(),
                "template": category.template(),
                "mandatory": category.is_mandatory(),
                "options": category.allowed_options(),
            })
        })
        .collect::<Vec<_>>();
    emit(json, &json!({ "categories": listing }), || {
        categories
            .iter()
            .map(|category| {
                let mut block = format!("{}:", category.name());
                for option in category.allowed_options() {
                    block.push_str(&format!("\n  {option}"));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn run_grammars(json: bool) -> Result<()> {
    let summaries = BUILTIN_GRAMMARS
        .iter()
        .filter_map(|name| grammar::builtin(name))
        .map(Grammar::summary)
        .collect::<Vec<_>>();
    emit(json, &json!({ "grammars": summaries }), || {
        summaries
            .iter()
            .map(|summary| {
                let leading = summary
                    .leading_token
                    .as_deref()
                    .map(|token| format!(" (leading token: {token})"))
                    .unwrap_or_default();
                format!("{}{leading}: {}", summary.name, summary.priority.join(" > "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn run_store(
    store_dir: &Path,
    action: StoreCommand,
    resolve: impl FnOnce() -> Result<Grammar>,
    json: bool,
) -> Result<()> {
    match action {
        StoreCommand::Put { key, input } => {
            let grammar = resolve()?;
            let prompt = finalize(&grammar, &input.read()?);
            let entry = store::put_prompt(store_dir, &key, grammar.name(), &prompt)?;
            emit(json, &entry, || format!("saved '{}'", entry.key))
        }
        StoreCommand::Get { key } => {
            let entry = store::get_prompt(store_dir, &key)?;
            emit(json, &entry, || entry.prompt.clone())
        }
        StoreCommand::List => {
            let entries = store::list_prompts(store_dir)?;
            emit(json, &json!({ "entries": entries }), || {
                entries
                    .iter()
                    .map(|entry| format!("{}\t{}\t{}", entry.key, entry.grammar, entry.saved_at))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        StoreCommand::Rm { key } => {
            let entry = store::remove_prompt(store_dir, &key)?;
            emit(json, &entry, || format!("removed '{}'", entry.key))
        }
    }
}

fn load_composition(path: &Path) -> Result<Composition> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read composition {}", path.display()))?;
    serde_json::from_str(&content).map_err(|error| {
        anyhow!(CodedError::usage(
            "INVALID_COMPOSITION",
            format!("failed to parse composition {}: {error}", path.display()),
        ))
    })
}

fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(anyhow!(CodedError::usage(
            "INVALID_ASSIGNMENT",
            format!("expected KEY=VALUE, got '{raw}'"),
        )
        .with_details(json!({ "provided": raw })))),
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(value).context("failed to serialize JSON output")?;
        println!("{rendered}");
    } else {
        let rendered = text();
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{parse_assignment, Cli, Commands};
    use shotprompt::error_codes::find_coded_error;

    #[test]
    fn assignment_splits_on_first_equals() {
        let (key, value) = parse_assignment("Shot Type = Wide Shot").expect("should parse");
        assert_eq!(key, "Shot Type");
        assert_eq!(value, "Wide Shot");
        let (_, value) = parse_assignment("Subject=a=b").expect("should parse");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn assignment_without_key_is_a_usage_error() {
        for raw in ["Wide Shot", "=Wide Shot"] {
            let error = parse_assignment(raw).expect_err("should fail");
            assert_eq!(
                find_coded_error(&error).map(|coded| coded.code),
                Some("INVALID_ASSIGNMENT")
            );
        }
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shotprompt",
            "extract",
            "Anime, Wide Shot",
            "--grammar",
            "photography",
            "--json",
        ])
        .expect("cli should parse");
        assert!(cli.json);
        assert_eq!(cli.grammar, "photography");
        assert!(matches!(cli.command, Commands::Extract { .. }));
    }
}

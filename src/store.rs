use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::CodedError;

pub const STORE_FILE_NAME: &str = "store.json";
pub const DEFAULT_STORE_DIR: &str = ".shotprompt";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PromptStore {
    #[serde(default = "default_store_version")]
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<StoredPrompt>,
}

impl Default for PromptStore {
    fn default() -> Self {
        Self {
            version: default_store_version(),
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoredPrompt {
    pub key: String,
    pub grammar: String,
    pub prompt: String,
    pub saved_at: String,
}

fn default_store_version() -> u32 {
    1
}

impl PromptStore {
    pub fn get(&self, key: &str) -> Option<&StoredPrompt> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Inserts or replaces `key`, returning the previous entry.
    pub fn put(
        &mut self,
        key: &str,
        grammar: &str,
        prompt: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<Option<StoredPrompt>> {
        validate_key(key)?;
        let entry = StoredPrompt {
            key: key.to_owned(),
            grammar: grammar.to_owned(),
            prompt: prompt.to_owned(),
            saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let previous = self.remove(key);
        self.entries.push(entry);
        self.entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(previous)
    }

    pub fn remove(&mut self, key: &str) -> Option<StoredPrompt> {
        let index = self.entries.iter().position(|entry| entry.key == key)?;
        Some(self.entries.remove(index))
    }
}

pub fn store_path(store_dir: &Path) -> PathBuf {
    store_dir.join(STORE_FILE_NAME)
}

/// Keys are kebab-case: lowercase ASCII letters and digits, single hyphens between words.
pub fn validate_key(key: &str) -> Result<()> {
    let problem = if key.is_empty() {
        Some("key cannot be empty")
    } else if key.starts_with('-') || key.ends_with('-') || key.contains("--") {
        Some("use words separated by single hyphens")
    } else if !key
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    {
        Some("use lowercase letters, digits, and '-' only")
    } else {
        None
    };

    match problem {
        Some(problem) => Err(anyhow!(CodedError::usage(
            "INVALID_KEY",
            format!("invalid key '{key}': {problem}"),
        )
        .with_details(json!({ "provided": key })))),
        None => Ok(()),
    }
}

pub fn load_store(store_dir: &Path) -> Result<PromptStore> {
    let path = store_path(store_dir);
    if !path.exists() {
        return Ok(PromptStore::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read prompt store {}", path.display()))?;
    let mut store: PromptStore = serde_json::from_str(&content).map_err(|error| {
        anyhow!(CodedError::invalid_data(
            "INVALID_STORE",
            format!("failed to parse prompt store {}: {error}", path.display()),
        ))
    })?;
    normalize_store_in_place(&mut store)
        .with_context(|| format!("invalid prompt store {}", path.display()))?;
    Ok(store)
}

pub fn save_store(store_dir: &Path, store: &PromptStore) -> Result<PathBuf> {
    let mut normalized = store.clone();
    normalize_store_in_place(&mut normalized)?;

    fs::create_dir_all(store_dir)
        .with_context(|| format!("failed to create store directory {}", store_dir.display()))?;
    let path = store_path(store_dir);
    let json = serde_json::to_string_pretty(&normalized)
        .context("failed to serialize prompt store JSON")?;
    fs::write(&path, format!("{json}\n"))
        .with_context(|| format!("failed to write prompt store {}", path.display()))?;
    Ok(path)
}

fn normalize_store_in_place(store: &mut PromptStore) -> Result<()> {
    if store.version == 0 {
        bail!("prompt store version must be >= 1");
    }
    store.entries.sort_by(|a, b| a.key.cmp(&b.key));
    let mut seen = BTreeSet::new();
    for entry in &store.entries {
        validate_key(&entry.key)?;
        if !seen.insert(entry.key.as_str()) {
            bail!("duplicate key '{}' in prompt store", entry.key);
        }
    }
    Ok(())
}

pub fn put_prompt(store_dir: &Path, key: &str, grammar: &str, prompt: &str) -> Result<StoredPrompt> {
    let mut store = load_store(store_dir)?;
    let replaced = store.put(key, grammar, prompt, Utc::now())?;
    let path = save_store(store_dir, &store)?;
    log::info!(
        "[store] {} '{key}' in {}",
        if replaced.is_some() { "replaced" } else { "saved" },
        path.display()
    );
    store
        .get(key)
        .cloned()
        .ok_or_else(|| anyhow!("stored prompt '{key}' missing after write"))
}

pub fn get_prompt(store_dir: &Path, key: &str) -> Result<StoredPrompt> {
    validate_key(key)?;
    let store = load_store(store_dir)?;
    store.get(key).cloned().ok_or_else(|| unknown_key(key))
}

pub fn remove_prompt(store_dir: &Path, key: &str) -> Result<StoredPrompt> {
    validate_key(key)?;
    let mut store = load_store(store_dir)?;
    let removed = store.remove(key).ok_or_else(|| unknown_key(key))?;
    let path = save_store(store_dir, &store)?;
    log::info!("[store] removed '{key}' from {}", path.display());
    Ok(removed)
}

pub fn list_prompts(store_dir: &Path) -> Result<Vec<StoredPrompt>> {
    Ok(load_store(store_dir)?.entries)
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(CodedError::usage("UNKNOWN_KEY", format!("no stored prompt named '{key}'"))
        .with_details(json!({ "provided": key })))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::{
        get_prompt, list_prompts, load_store, put_prompt, remove_prompt, save_store, store_path,
        validate_key, PromptStore,
    };
    use crate::error_codes::find_coded_error;

    #[test]
    fn validates_key_rules() {
        for valid in ["alpha", "alpha-1", "robot-scene-2", "2024-shoot"] {
            validate_key(valid).expect("valid key should pass");
        }
        for invalid in ["", "Alpha", "snake_case", "alpha--beta", "alpha-", "-alpha", "alpha beta"] {
            assert!(validate_key(invalid).is_err(), "invalid key should fail: {invalid}");
        }
    }

    #[test]
    fn store_write_is_stable_and_sorted() {
        let dir = tempdir().expect("tempdir should create");
        let saved_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut store = PromptStore::default();
        store
            .put("zeta", "illustration", "Anime, --ar 16:9 --style raw", saved_at)
            .expect("put should succeed");
        store
            .put("alpha", "photography", "Cinematic, --ar 16:9 --style raw", saved_at)
            .expect("put should succeed");

        let path = save_store(dir.path(), &store).expect("store should save");
        let first = std::fs::read_to_string(&path).expect("store should read");
        save_store(dir.path(), &load_store(dir.path()).expect("store should load"))
            .expect("store should save again");
        let second = std::fs::read_to_string(&path).expect("store should read");

        assert_eq!(first, second);
        assert!(first.ends_with('\n'));
        assert!(first.find("\"alpha\"") < first.find("\"zeta\""));
        assert!(first.contains("\"saved_at\": \"2024-05-01T12:00:00Z\""));
    }

    #[test]
    fn put_get_remove_round_trip() {
        let dir = tempdir().expect("tempdir should create");
        put_prompt(dir.path(), "robot", "illustration", "Anime, --ar 16:9 --style raw")
            .expect("put should succeed");
        put_prompt(dir.path(), "robot", "illustration", "Anime, a robot, --ar 16:9 --style raw")
            .expect("overwrite should succeed");

        let entry = get_prompt(dir.path(), "robot").expect("get should succeed");
        assert_eq!(entry.prompt, "Anime, a robot, --ar 16:9 --style raw");
        assert_eq!(list_prompts(dir.path()).expect("list").len(), 1);

        remove_prompt(dir.path(), "robot").expect("remove should succeed");
        let error = get_prompt(dir.path(), "robot").expect_err("entry is gone");
        assert_eq!(
            find_coded_error(&error).map(|coded| coded.code),
            Some("UNKNOWN_KEY")
        );
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempdir().expect("tempdir should create");
        assert!(list_prompts(&dir.path().join("nested")).expect("list").is_empty());
    }

    #[test]
    fn corrupt_store_is_invalid_data() {
        let dir = tempdir().expect("tempdir should create");
        std::fs::write(store_path(dir.path()), "{not json").expect("store should write");
        let error = load_store(dir.path()).expect_err("corrupt store should fail");
        let coded = find_coded_error(&error).expect("coded error");
        assert_eq!(coded.code, "INVALID_STORE");
        assert_eq!(coded.kind.exit_code(), 1);
    }
}

//! Provider configuration for specdoc
//!
//! Providers come from a fixed built-in table. Each slot reads its credential
//! from an `AI_API_KEY_<n>` variable in an environment snapshot, so selection
//! is a pure function of that snapshot and the requested batch index.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// OpenRouter chat-completions endpoint used by the raw POST backend
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Credentials this short are treated as placeholders.
const MIN_CREDENTIAL_LEN: usize = 10;

/// Which HTTP call shape a provider uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenAI-compatible client call with a JSON response format
    Native,
    /// Raw POST to OpenRouter; JSON is scraped out of free-form content
    OpenRouter,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::OpenRouter => "openrouter",
        }
    }
}

/// One AI backend, frozen for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub batch_index: u32,
    pub name: String,
    pub api_key: String,
    pub kind: BackendKind,
    pub model: String,
    /// Full chat-completions URL
    pub endpoint: String,
}

struct ProviderSlot {
    batch_index: u32,
    name: &'static str,
    kind: BackendKind,
    model: &'static str,
    endpoint: &'static str,
}

const PROVIDER_SLOTS: &[ProviderSlot] = &[
    ProviderSlot {
        batch_index: 1,
        name: "Groq Llama 3.3 70B",
        kind: BackendKind::Native,
        model: "llama-3.3-70b-versatile",
        endpoint: "https://api.groq.com/openai/v1/chat/completions",
    },
    ProviderSlot {
        batch_index: 2,
        name: "OpenAI GPT-4o mini",
        kind: BackendKind::Native,
        model: "gpt-4o-mini",
        endpoint: "https://api.openai.com/v1/chat/completions",
    },
    ProviderSlot {
        batch_index: 3,
        name: "OpenRouter DeepSeek V3",
        kind: BackendKind::OpenRouter,
        model: "deepseek/deepseek-chat:free",
        endpoint: OPENROUTER_URL,
    },
    ProviderSlot {
        batch_index: 4,
        name: "OpenRouter Llama 3.3 70B",
        kind: BackendKind::OpenRouter,
        model: "meta-llama/llama-3.3-70b-instruct:free",
        endpoint: OPENROUTER_URL,
    },
    ProviderSlot {
        batch_index: 5,
        name: "OpenRouter Qwen 2.5 72B",
        kind: BackendKind::OpenRouter,
        model: "qwen/qwen-2.5-72b-instruct:free",
        endpoint: OPENROUTER_URL,
    },
];

/// Environment variable holding the credential for a batch slot
pub fn credential_var(batch_index: u32) -> String {
    format!("AI_API_KEY_{}", batch_index)
}

fn credential_is_usable(key: &str) -> bool {
    key.trim().len() > MIN_CREDENTIAL_LEN
}

/// Build the candidate list from an environment snapshot.
///
/// Slots whose credential is missing or implausibly short are left out.
pub fn load_providers(env: &HashMap<String, String>) -> Vec<ProviderDescriptor> {
    PROVIDER_SLOTS
        .iter()
        .filter_map(|slot| {
            let key = env.get(&credential_var(slot.batch_index))?;
            if !credential_is_usable(key) {
                return None;
            }
            Some(ProviderDescriptor {
                batch_index: slot.batch_index,
                name: slot.name.to_string(),
                api_key: key.trim().to_string(),
                kind: slot.kind,
                model: slot.model.to_string(),
                endpoint: slot.endpoint.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no provider configured for batch index {index} (set {var})")]
    NoProvider { index: u32, var: String },
}

/// Pick the descriptor for `batch_index` out of the candidate list.
pub fn resolve_provider(
    providers: &[ProviderDescriptor],
    batch_index: u32,
) -> Result<ProviderDescriptor, ConfigError> {
    providers
        .iter()
        .find(|p| p.batch_index == batch_index)
        .cloned()
        .ok_or_else(|| ConfigError::NoProvider {
            index: batch_index,
            var: credential_var(batch_index),
        })
}

/// Paths and pacing for one invocation
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub failed_list: PathBuf,
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub delay: Duration,
    pub request_timeout: Duration,
    pub resume: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            failed_list: PathBuf::from("failed-tests.txt"),
            template: PathBuf::from("docs/test-doc-template.md"),
            output_dir: PathBuf::from("docs/generated"),
            delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(60),
            resume: false,
        }
    }
}

impl RunSettings {
    /// Final report for a batch
    pub fn report_path(&self, batch_index: u32) -> PathBuf {
        self.output_dir
            .join(format!("retry-results-{}.json", batch_index))
    }

    pub fn markdown_path(&self, batch_index: u32) -> PathBuf {
        self.output_dir.join(format!("retry-results-{}.md", batch_index))
    }

    /// Append-only log written as each file completes
    pub fn progress_path(&self, batch_index: u32) -> PathBuf {
        self.output_dir
            .join(format!("retry-results-{}.progress.jsonl", batch_index))
    }

    /// Paths that failed again, in failed-list format
    pub fn remaining_path(&self, batch_index: u32) -> PathBuf {
        self.output_dir
            .join(format!("failed-tests-remaining-{}.txt", batch_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_providers_skips_missing_and_short_keys() {
        let snapshot = env(&[
            ("AI_API_KEY_1", "sk-short"),
            ("AI_API_KEY_3", "sk-or-v1-0123456789abcdef"),
            ("AI_API_KEY_5", "   "),
        ]);
        let providers = load_providers(&snapshot);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].batch_index, 3);
        assert_eq!(providers[0].kind, BackendKind::OpenRouter);
    }

    #[test]
    fn test_resolve_is_stable_for_same_snapshot() {
        let snapshot = env(&[("AI_API_KEY_5", "sk-or-v1-aaaaaaaaaaaaaaaa")]);
        let first = resolve_provider(&load_providers(&snapshot), 5).unwrap();
        let second = resolve_provider(&load_providers(&snapshot), 5).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.model, "qwen/qwen-2.5-72b-instruct:free");
        assert_eq!(first.endpoint, OPENROUTER_URL);
    }

    #[test]
    fn test_resolve_unknown_index_names_the_variable() {
        let snapshot = env(&[("AI_API_KEY_5", "sk-or-v1-aaaaaaaaaaaaaaaa")]);
        let err = resolve_provider(&load_providers(&snapshot), 2).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NoProvider {
                index: 2,
                var: "AI_API_KEY_2".to_string()
            }
        );
        assert!(err.to_string().contains("AI_API_KEY_2"));
    }

    #[test]
    fn test_credential_of_exactly_ten_chars_is_rejected() {
        let snapshot = env(&[("AI_API_KEY_1", "0123456789")]);
        assert!(load_providers(&snapshot).is_empty());
    }

    #[test]
    fn test_output_paths_are_keyed_by_batch() {
        let settings = RunSettings::default();
        assert!(settings
            .report_path(4)
            .ends_with("docs/generated/retry-results-4.json"));
        assert!(settings
            .remaining_path(4)
            .ends_with("failed-tests-remaining-4.txt"));
    }
}

//! Slug generation: random, or suggested by a language model with fallback.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde::Deserialize;
use tracing::{debug, warn};

use super::link_store::{CreateOutcome, LinkStore};
use crate::config::GenerationSettings;
use crate::domain::entities::{LinkRecord, NewLink};
use crate::domain::providers::CompletionProvider;
use crate::domain::repositories::KvStore;
use crate::error::AppError;
use crate::utils::slug::{SlugPolicy, UNAMBIGUOUS_ALPHABET, random_slug};

/// How a slug is produced when the caller does not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Random,
    Assisted,
}

/// The only accepted shape of a completion.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Suggestion {
    slug: String,
}

/// Parses completion output strictly. Surrounding whitespace is the only
/// tolerance.
fn parse_suggestion(raw: &str) -> Result<String, AppError> {
    let suggestion: Suggestion = serde_json::from_str(raw.trim())
        .map_err(|e| AppError::SuggestionUnavailable(format!("malformed suggestion: {}", e)))?;

    if suggestion.slug.is_empty() {
        return Err(AppError::SuggestionUnavailable(
            "empty suggestion".to_string(),
        ));
    }

    Ok(suggestion.slug)
}

pub struct SlugGenerator<K: KvStore + ?Sized = dyn KvStore> {
    store: Arc<LinkStore<K>>,
    completion: Arc<dyn CompletionProvider>,
    policy: Arc<SlugPolicy>,
    settings: GenerationSettings,
    alphabet: Vec<u8>,
}

impl<K: KvStore + ?Sized> SlugGenerator<K> {
    pub fn new(
        store: Arc<LinkStore<K>>,
        completion: Arc<dyn CompletionProvider>,
        policy: Arc<SlugPolicy>,
        settings: GenerationSettings,
    ) -> Self {
        let alphabet = match policy.generation_alphabet(settings.default_length) {
            alphabet if alphabet.is_empty() => UNAMBIGUOUS_ALPHABET.to_vec(),
            alphabet => alphabet,
        };

        Self {
            store,
            completion,
            policy,
            settings,
            alphabet,
        }
    }

    /// Asks the completion service for a slug and validates it like user input.
    ///
    /// The call is cancelled after the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SuggestionUnavailable`] on timeout, transport
    /// failure, malformed output or a suggestion the policy rejects.
    pub async fn suggest(&self, url: &str) -> Result<String, AppError> {
        let raw = tokio::time::timeout(
            self.settings.assist_timeout,
            self.completion.complete(&self.settings.prompt, url),
        )
        .await
        .map_err(|_| {
            counter!("slug_suggestions_total", "outcome" => "timeout").increment(1);
            AppError::SuggestionUnavailable("timed out".to_string())
        })?
        .map_err(|e| {
            counter!("slug_suggestions_total", "outcome" => "error").increment(1);
            AppError::SuggestionUnavailable(e.to_string())
        })?;

        let candidate = parse_suggestion(&raw).inspect_err(|_| {
            counter!("slug_suggestions_total", "outcome" => "malformed").increment(1);
        })?;

        let slug = self.policy.check(&candidate).map_err(|e| {
            counter!("slug_suggestions_total", "outcome" => "rejected").increment(1);
            AppError::SuggestionUnavailable(e.to_string())
        })?;

        counter!("slug_suggestions_total", "outcome" => "accepted").increment(1);
        Ok(slug)
    }

    /// Produces a random slug that satisfies the policy, or `None` if the
    /// pattern or reserved set rejected it.
    fn random_candidate(&self) -> Option<String> {
        let candidate = random_slug(&self.alphabet, self.settings.default_length);
        self.policy.check(&candidate).ok()
    }

    /// Candidate for one creation attempt. Only the first attempt of an
    /// assisted generation consults the completion service.
    async fn candidate(&self, url: &str, mode: GenerationMode, attempt: usize) -> Option<String> {
        if attempt == 0 && mode == GenerationMode::Assisted {
            match self.suggest(url).await {
                Ok(slug) => return Some(slug),
                Err(e) => warn!("Assisted generation fell back to random: {}", e),
            }
        }
        self.random_candidate()
    }

    /// Produces a slug for `url` that the policy accepts. Assisted mode falls
    /// back to a random slug on any suggestion failure.
    ///
    /// The result is not reserved in the store; see [`Self::create_link`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GenerationExhausted`] if no attempt produced an
    /// acceptable slug, which a validated configuration only allows when
    /// every draw hit the reserved set.
    pub async fn generate(&self, url: &str, mode: GenerationMode) -> Result<String, AppError> {
        let attempts = self.settings.max_attempts;
        for attempt in 0..attempts {
            if let Some(slug) = self.candidate(url, mode, attempt).await {
                return Ok(slug);
            }
        }
        Err(AppError::GenerationExhausted { attempts })
    }

    /// Creates a link under a generated slug.
    ///
    /// The first attempt honours `mode`; collisions retry with random slugs
    /// up to the configured attempt count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GenerationExhausted`] when every attempt collided,
    /// or [`AppError::StoreUnavailable`] on store failure.
    pub async fn create_link(
        &self,
        new_link: NewLink,
        mode: GenerationMode,
    ) -> Result<LinkRecord, AppError> {
        let attempts = self.settings.max_attempts;

        for attempt in 0..attempts {
            let Some(slug) = self.candidate(&new_link.url, mode, attempt).await else {
                continue;
            };

            let record = LinkRecord::new(slug, new_link.clone(), Utc::now());
            match self.store.create_if_absent(record).await? {
                CreateOutcome::Created(record) => return Ok(record),
                CreateOutcome::AlreadyExists => {
                    debug!("Generated slug collided (attempt {})", attempt + 1);
                }
            }
        }

        Err(AppError::GenerationExhausted { attempts })
    }
}

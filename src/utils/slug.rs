//! Slug policy, validation and random generation.
//!
//! Validation is pure and allocation-light so it can run on every request.
//! Generated and assisted slugs go through the same [`SlugPolicy::check`] as
//! user-submitted ones.

use crate::error::AppError;
use rand::Rng;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;

/// Alphabet for random slugs: lowercase letters and digits without the
/// easily confused `0`, `1`, `i`, `l` and `o`.
pub const UNAMBIGUOUS_ALPHABET: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Default slug pattern: lowercase words separated by single hyphens.
pub const DEFAULT_SLUG_PATTERN: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";

/// Random slugs sampled when checking that a pattern admits generation.
const GENERATION_SAMPLES: usize = 64;

/// Why a candidate slug was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlugRejection {
    #[error("slug does not match the required pattern")]
    Malformed,
    #[error("slug is reserved")]
    Reserved,
}

/// Immutable slug rules shared by validation, storage keys and cache keys.
///
/// Constructed once from [`crate::config::Config`] and shared by `Arc`.
#[derive(Debug, Clone)]
pub struct SlugPolicy {
    pattern: Regex,
    source: String,
    reserved: HashSet<String>,
    case_sensitive: bool,
}

impl SlugPolicy {
    /// Compiles a policy. The pattern is always enforced as a full match.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the pattern does not compile.
    pub fn new<I, S>(pattern: &str, reserved: I, case_sensitive: bool) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))?;

        let reserved = reserved
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| if case_sensitive { s } else { s.to_lowercase() })
            .collect();

        Ok(Self {
            pattern: anchored,
            source: pattern.to_string(),
            reserved,
            case_sensitive,
        })
    }

    /// The pattern as configured, before anchoring.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Normalizes a slug for use as a store or cache key.
    pub fn normalize<'a>(&self, slug: &'a str) -> Cow<'a, str> {
        if self.case_sensitive || !slug.chars().any(|c| c.is_uppercase()) {
            Cow::Borrowed(slug)
        } else {
            Cow::Owned(slug.to_lowercase())
        }
    }

    /// Returns true if the (normalized) slug is in the reserved set.
    pub fn is_reserved(&self, slug: &str) -> bool {
        self.reserved.contains(self.normalize(slug).as_ref())
    }

    /// Validates a candidate slug. The reserved set is checked before the
    /// pattern, so a reserved name is always reported as reserved.
    ///
    /// Under a case-insensitive policy the candidate is normalized first, so
    /// `My-Link` and `my-link` are the same slug.
    pub fn validate(&self, candidate: &str) -> Result<(), SlugRejection> {
        let slug = self.normalize(candidate);

        if self.reserved.contains(slug.as_ref()) {
            return Err(SlugRejection::Reserved);
        }

        if slug.is_empty() || !self.pattern.is_match(&slug) {
            return Err(SlugRejection::Malformed);
        }

        Ok(())
    }

    /// The characters of [`UNAMBIGUOUS_ALPHABET`] the pattern accepts as a
    /// slug of `length` made of that character alone.
    pub fn generation_alphabet(&self, length: usize) -> Vec<u8> {
        UNAMBIGUOUS_ALPHABET
            .iter()
            .copied()
            .filter(|&b| {
                let slug = char::from(b).to_string().repeat(length);
                self.pattern.is_match(&self.normalize(&slug))
            })
            .collect()
    }

    /// Returns true if random slugs of `length` drawn from the generation
    /// alphabet match the pattern.
    ///
    /// The reserved set is not considered; a reserved draw is a collision.
    pub fn supports_random(&self, length: usize) -> bool {
        let alphabet = self.generation_alphabet(length);
        !alphabet.is_empty()
            && (0..GENERATION_SAMPLES).all(|_| {
                let slug = random_slug(&alphabet, length);
                self.pattern.is_match(&self.normalize(&slug))
            })
    }

    /// Validates a candidate and returns its normalized form.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MalformedSlug`] or [`AppError::ReservedSlug`].
    pub fn check(&self, candidate: &str) -> Result<String, AppError> {
        match self.validate(candidate) {
            Ok(()) => Ok(self.normalize(candidate).into_owned()),
            Err(SlugRejection::Malformed) => Err(AppError::MalformedSlug {
                slug: candidate.to_string(),
            }),
            Err(SlugRejection::Reserved) => Err(AppError::ReservedSlug {
                slug: candidate.to_string(),
            }),
        }
    }
}

/// Generates a random slug of `length` characters from `alphabet`.
///
/// `alphabet` must not be empty.
pub fn random_slug(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(case_sensitive: bool) -> SlugPolicy {
        SlugPolicy::new(DEFAULT_SLUG_PATTERN, ["dashboard"], case_sensitive).unwrap()
    }

    #[test]
    fn test_uppercase_rejected_when_case_sensitive() {
        assert_eq!(
            policy(true).validate("My-Link"),
            Err(SlugRejection::Malformed)
        );
    }

    #[test]
    fn test_reserved_slug_rejected() {
        assert_eq!(
            policy(true).validate("dashboard"),
            Err(SlugRejection::Reserved)
        );
    }

    #[test]
    fn test_reserved_checked_before_pattern() {
        let policy = SlugPolicy::new(DEFAULT_SLUG_PATTERN, ["_admin"], true).unwrap();
        assert_eq!(policy.validate("_admin"), Err(SlugRejection::Reserved));
        assert_eq!(policy.validate("_other"), Err(SlugRejection::Malformed));
    }

    #[test]
    fn test_valid_slug_accepted() {
        assert!(policy(true).validate("my-link").is_ok());
    }

    #[test]
    fn test_case_insensitive_normalizes_before_matching() {
        let policy = policy(false);
        assert!(policy.validate("My-Link").is_ok());
        assert_eq!(policy.check("My-Link").unwrap(), "my-link");
        assert_eq!(policy.validate("DashBoard"), Err(SlugRejection::Reserved));
    }

    #[test]
    fn test_case_sensitive_keeps_slug_as_is() {
        let policy = SlugPolicy::new("[A-Za-z0-9]+", ["Admin"], true).unwrap();
        assert_eq!(policy.normalize("AbC"), "AbC");
        assert!(policy.validate("admin").is_ok());
        assert_eq!(policy.validate("Admin"), Err(SlugRejection::Reserved));
    }

    #[test]
    fn test_pattern_is_full_match_even_without_anchors() {
        let policy = SlugPolicy::new("[a-z]+", Vec::<String>::new(), true).unwrap();
        assert!(policy.validate("abc").is_ok());
        assert_eq!(policy.validate("abc-1"), Err(SlugRejection::Malformed));
    }

    #[test]
    fn test_malformed_candidates() {
        let policy = policy(true);
        for candidate in ["", "-abc", "abc-", "a--b", "a b", "a_b", "ünï"] {
            assert_eq!(
                policy.validate(candidate),
                Err(SlugRejection::Malformed),
                "{candidate:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_check_maps_to_app_errors() {
        let policy = policy(true);
        assert!(matches!(
            policy.check("Bad"),
            Err(AppError::MalformedSlug { .. })
        ));
        assert!(matches!(
            policy.check("dashboard"),
            Err(AppError::ReservedSlug { .. })
        ));
    }

    #[test]
    fn test_accepted_iff_matches_and_not_reserved() {
        let policy = policy(true);
        let full_match = Regex::new(DEFAULT_SLUG_PATTERN).unwrap();

        for candidate in [
            "a", "dashboard", "dash-board", "Dashboard", "x-1-y", "1", "-", "a-", "abc123",
        ] {
            let accepted = policy.validate(candidate).is_ok();
            let expected = full_match.is_match(candidate) && candidate != "dashboard";
            assert_eq!(accepted, expected, "{candidate:?}");
        }
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(SlugPolicy::new("([a-z", ["x"], true).is_err());
    }

    #[test]
    fn test_random_slug_length_and_alphabet() {
        let slug = random_slug(UNAMBIGUOUS_ALPHABET, 6);
        assert_eq!(slug.len(), 6);
        assert!(slug.bytes().all(|b| UNAMBIGUOUS_ALPHABET.contains(&b)));
        assert!(policy(true).validate(&slug).is_ok());
    }

    #[test]
    fn test_random_slugs_rarely_collide() {
        let slugs: HashSet<String> = (0..1000)
            .map(|_| random_slug(UNAMBIGUOUS_ALPHABET, 10))
            .collect();
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn test_generation_alphabet_follows_pattern() {
        assert_eq!(policy(true).generation_alphabet(6), UNAMBIGUOUS_ALPHABET);

        let letters = SlugPolicy::new("[a-z]+", Vec::<String>::new(), true).unwrap();
        let alphabet = letters.generation_alphabet(6);
        assert!(!alphabet.is_empty());
        assert!(alphabet.iter().all(u8::is_ascii_lowercase));

        for _ in 0..200 {
            assert!(letters.validate(&random_slug(&alphabet, 6)).is_ok());
        }
    }

    #[test]
    fn test_generation_alphabet_respects_length_bounds() {
        let bounded = SlugPolicy::new("[0-9]{4}", Vec::<String>::new(), true).unwrap();
        assert_eq!(bounded.generation_alphabet(4), b"23456789");
        assert!(bounded.generation_alphabet(6).is_empty());
    }

    #[test]
    fn test_supports_random() {
        assert!(policy(true).supports_random(6));
        assert!(policy(false).supports_random(1));

        let letters = SlugPolicy::new("[a-z]+", Vec::<String>::new(), true).unwrap();
        assert!(letters.supports_random(6));

        let uppercase = SlugPolicy::new("[A-Z]+", Vec::<String>::new(), true).unwrap();
        assert!(!uppercase.supports_random(6));

        let needs_suffix = SlugPolicy::new("[a-z]+[0-9]", Vec::<String>::new(), true).unwrap();
        assert!(!needs_suffix.supports_random(6));

        let either = SlugPolicy::new("[a-z]+|[2-9]+", Vec::<String>::new(), true).unwrap();
        assert!(!either.supports_random(6));
    }
}

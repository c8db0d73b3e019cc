//! User context sanitization and prompt-injection guard
//!
//! Sanitization strips a handful of structural characters and bounds the
//! length. The guard is a plain case-insensitive substring match against a
//! fixed blocklist; innocent text containing a listed word is refused too.

use crate::models::{RecommendationSet, Refusal};

/// Longest sanitized context forwarded to the model, in characters
pub const MAX_CONTEXT_CHARS: usize = 500;

const STRIPPED_CHARS: [char; 7] = ['<', '>', '{', '}', ';', '(', ')'];

/// Words whose presence anywhere in the lower-cased context triggers a refusal
pub const FORBIDDEN_WORDS: [&str; 10] = [
    "prompt",
    "system",
    "instruction",
    "bypass",
    "contourner",
    "règle",
    "affiche",
    "montre",
    "révèle",
    "hack",
];

pub const REFUSAL_THEME: &str = "Sécurité avant tout";
pub const REFUSAL_MOOD: &str = "Taquin mais ferme";
pub const REFUSAL_MESSAGE: &str =
    "Hey ! Pas de ça chez nous ! 😄 On ne regarde pas sous le capot, ce n'est pas ta voiture !";

/// Outcome of screening a raw user context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// Safe to forward; holds the sanitized text (possibly empty)
    Clean(String),
    Refused,
}

/// Removes `< > { } ; ( )`, trims, and truncates to [`MAX_CONTEXT_CHARS`]
pub fn sanitize_user_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_CONTEXT_CHARS)
        .collect()
}

pub fn is_prompt_malicious(input: &str) -> bool {
    let lowercase = input.to_lowercase();
    FORBIDDEN_WORDS.iter().any(|word| lowercase.contains(word))
}

/// Sanitizes then checks the context against the blocklist
pub fn screen(user_context: Option<&str>) -> Screening {
    let sanitized = user_context.map(sanitize_user_input).unwrap_or_default();
    if is_prompt_malicious(&sanitized) {
        tracing::warn!(
            context_chars = sanitized.chars().count(),
            "Blocked user context matching the injection blocklist"
        );
        Screening::Refused
    } else {
        Screening::Clean(sanitized)
    }
}

/// The fixed payload returned instead of recommendations
pub fn refusal<T>() -> RecommendationSet<T> {
    RecommendationSet {
        recommendations: Vec::new(),
        theme: REFUSAL_THEME.to_string(),
        mood: REFUSAL_MOOD.to_string(),
        refusal: Some(Refusal {
            error: true,
            message: REFUSAL_MESSAGE.to_string(),
        }),
    }
}

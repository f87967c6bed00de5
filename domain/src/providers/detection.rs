//! API key format detection for the legacy single-key slot.

use super::ProviderFamily;
use regex::Regex;
use std::sync::LazyLock;

/// Exact key formats, checked in this order.
static KEY_PATTERNS: LazyLock<Vec<(ProviderFamily, Regex)>> = LazyLock::new(|| {
    [
        (ProviderFamily::Groq, r"^gsk_[a-zA-Z0-9]{52}$"),
        (ProviderFamily::OpenRouter, r"^sk-or-v1-[a-z0-9]{64}$"),
        (
            ProviderFamily::OpenAi,
            r"^sk-[a-zA-Z0-9]{48}$|^sk-proj-[a-zA-Z0-9_-]+$",
        ),
        (ProviderFamily::Anthropic, r"^sk-ant-api03-[a-zA-Z0-9_-]+$"),
        (ProviderFamily::Gemini, r"^AIza[0-9A-Za-z_-]{35}$"),
    ]
    .into_iter()
    .filter_map(|(family, pattern)| Regex::new(pattern).ok().map(|re| (family, re)))
    .collect()
});

/// Generic prefixes used when no exact format matches. Order matters:
/// `sk-` is a prefix of the others.
const PREFIX_FALLBACKS: [(&str, ProviderFamily); 4] = [
    ("sk-or-", ProviderFamily::OpenRouter),
    ("gsk_", ProviderFamily::Groq),
    ("sk-ant-", ProviderFamily::Anthropic),
    ("sk-", ProviderFamily::OpenAi),
];

/// Guess which provider family an API key belongs to.
///
/// Exact formats win over prefixes; anything unrecognized is
/// [`ProviderFamily::Unknown`].
pub fn detect_family(api_key: &str) -> ProviderFamily {
    let key = api_key.trim();
    if key.is_empty() {
        return ProviderFamily::Unknown;
    }

    if let Some((family, _)) = KEY_PATTERNS.iter().find(|(_, re)| re.is_match(key)) {
        return *family;
    }

    PREFIX_FALLBACKS
        .iter()
        .find(|(prefix, _)| key.starts_with(prefix))
        .map_or(ProviderFamily::Unknown, |(_, family)| *family)
}

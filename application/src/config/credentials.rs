//! Credential store and per-run credential snapshots.
//!
//! Keys live in a [`CredentialStore`] that can be updated at any time. Each
//! run takes one immutable [`Credentials`] snapshot at its start, which also
//! captures the provider environment variables, and uses only that snapshot.

use council_domain::{ProviderAdapter, ProviderFamily, detect_family};
use std::sync::RwLock;
use tracing::debug;

pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Prefix marking an OpenRouter key stored in an OpenAI slot
const OPENROUTER_PREFIX: &str = "sk-or-";

/// Provider keys found in the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvKeys {
    pub openrouter: Option<String>,
    pub groq: Option<String>,
    pub openai: Option<String>,
}

impl EnvKeys {
    /// Read the provider variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the provider variables through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| non_blank(lookup(name));
        Self {
            openrouter: get(ENV_OPENROUTER_API_KEY),
            groq: get(ENV_GROQ_API_KEY),
            openai: get(ENV_OPENAI_API_KEY),
        }
    }

    /// `OPENAI_API_KEY` holding an OpenRouter key
    fn openai_as_openrouter(&self) -> Option<&str> {
        self.openai
            .as_deref()
            .filter(|k| k.starts_with(OPENROUTER_PREFIX))
    }

    fn openai_native(&self) -> Option<&str> {
        self.openai
            .as_deref()
            .filter(|k| !k.starts_with(OPENROUTER_PREFIX))
    }
}

/// Immutable credential snapshot used for the whole of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub openrouter_key: Option<String>,
    pub groq_key: Option<String>,
    /// Legacy single-key slot
    pub universal_key: Option<String>,
    /// Explicit family of the legacy key; detected from its format when unset
    pub universal_family: Option<ProviderFamily>,
    pub env: EnvKeys,
}

impl Credentials {
    /// Family of the legacy key, if one is stored.
    pub fn legacy_family(&self) -> Option<ProviderFamily> {
        let key = self.universal_key.as_deref()?;
        Some(self.universal_family.unwrap_or_else(|| detect_family(key)))
    }

    /// Key usable with `adapter`, checking the dedicated slot, then the
    /// legacy slot, then the environment.
    pub fn key_for(&self, adapter: ProviderAdapter) -> Option<&str> {
        let legacy = self
            .legacy_family()
            .filter(|f| ProviderAdapter::for_family(*f) == adapter)
            .and(self.universal_key.as_deref());

        match adapter {
            ProviderAdapter::OpenRouter => self
                .openrouter_key
                .as_deref()
                .or(legacy)
                .or(self.env.openrouter.as_deref())
                .or(self.env.openai_as_openrouter()),
            ProviderAdapter::Groq => self
                .groq_key
                .as_deref()
                .or(legacy)
                .or(self.env.groq.as_deref()),
            ProviderAdapter::OpenAi => legacy.or(self.env.openai_native()),
        }
    }

    /// Whether a key exists that can serve `family`.
    pub fn has_credential(&self, family: ProviderFamily) -> bool {
        self.key_for(ProviderAdapter::for_family(family)).is_some()
    }

    /// Candidate `(family, key)` pairs in resolution priority order:
    /// dedicated OpenRouter and Groq slots, the legacy slot, then the
    /// environment.
    pub fn resolution_order(&self) -> Vec<(ProviderFamily, &str)> {
        let mut order = Vec::new();
        if let Some(key) = self.openrouter_key.as_deref() {
            order.push((ProviderFamily::OpenRouter, key));
        }
        if let Some(key) = self.groq_key.as_deref() {
            order.push((ProviderFamily::Groq, key));
        }
        if let (Some(family), Some(key)) = (self.legacy_family(), self.universal_key.as_deref()) {
            order.push((family, key));
        }
        if let Some(key) = self.env.openrouter.as_deref() {
            order.push((ProviderFamily::OpenRouter, key));
        }
        if let Some(key) = self.env.groq.as_deref() {
            order.push((ProviderFamily::Groq, key));
        }
        if let Some(key) = self.env.openai_as_openrouter() {
            order.push((ProviderFamily::OpenRouter, key));
        }
        if let Some(key) = self.env.openai_native() {
            order.push((ProviderFamily::OpenAi, key));
        }
        order
    }

    /// Families that have a stored or environment key.
    pub fn configured_families(&self) -> Vec<ProviderFamily> {
        let mut families: Vec<ProviderFamily> = Vec::new();
        for (family, _) in self.resolution_order() {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families
    }

    pub fn is_empty(&self) -> bool {
        self.resolution_order().is_empty()
    }
}

/// Requested change to the stored keys.
///
/// `None` leaves a slot untouched; an empty string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub openrouter_key: Option<String>,
    pub groq_key: Option<String>,
    /// Key of any family; routed to the matching slot
    pub universal_key: Option<String>,
}

/// Runtime credential storage guarded by a lock
pub struct CredentialStore {
    inner: RwLock<Credentials>,
    read_env: bool,
}

impl CredentialStore {
    /// Store whose snapshots include the process environment.
    pub fn new(initial: Credentials) -> Self {
        Self {
            inner: RwLock::new(initial),
            read_env: true,
        }
    }

    /// Store whose snapshots never look at the process environment.
    pub fn isolated(initial: Credentials) -> Self {
        Self {
            inner: RwLock::new(initial),
            read_env: false,
        }
    }

    /// Take the immutable snapshot for one run.
    pub fn snapshot(&self) -> Credentials {
        let mut credentials = match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if self.read_env {
            credentials.env = EnvKeys::from_env();
        }
        credentials
    }

    /// Apply an update and return the OpenRouter/Groq slots it filled.
    ///
    /// A universal key of any other family goes to the legacy slot and is
    /// not reported.
    pub fn update(&self, update: CredentialUpdate) -> Vec<ProviderFamily> {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut updated = Vec::new();

        if let Some(key) = update.openrouter_key {
            guard.openrouter_key = non_blank(Some(key));
            if guard.openrouter_key.is_some() {
                updated.push(ProviderFamily::OpenRouter);
            }
        }

        if let Some(key) = update.groq_key {
            guard.groq_key = non_blank(Some(key));
            if guard.groq_key.is_some() {
                updated.push(ProviderFamily::Groq);
            }
        }

        if let Some(key) = non_blank(update.universal_key) {
            let family = detect_family(&key);
            debug!(family = %family, "Routing universal key");
            match family {
                ProviderFamily::OpenRouter => {
                    guard.openrouter_key = Some(key);
                    updated.push(family);
                }
                ProviderFamily::Groq => {
                    guard.groq_key = Some(key);
                    updated.push(family);
                }
                _ => {
                    guard.universal_key = Some(key);
                    guard.universal_family = Some(family);
                }
            }
        }

        updated
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

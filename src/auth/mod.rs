pub mod storage;

pub use storage::{AuthStorage, KeySource};

use anyhow::{Context, Result, bail};

/// Providers that accept a stored API key.
const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

/// Save an API key for a provider.
///
/// Returns an error if the provider is not supported, the key is blank,
/// or the key cannot be saved.
pub fn login(db_path: &str, provider: &str, key: &str) -> Result<()> {
    if !SUPPORTED_PROVIDERS.contains(&provider) {
        bail!("unsupported provider: {provider}");
    }
    let key = key.trim();
    if key.is_empty() {
        bail!("no API key provided");
    }
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .save(provider, key)
        .context("failed to save API key")?;
    Ok(())
}

/// Forget the saved key for a provider. Returns whether one was saved.
pub fn logout(db_path: &str, provider: &str) -> Result<bool> {
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage.forget(provider).context("failed to remove API key")
}

/// Human-readable auth state for the banner.
pub fn status(storage: &AuthStorage, provider: &str, env_var: &str) -> Result<String> {
    if let Some(stored) = storage.stored(provider)? {
        return Ok(format!("API key ✓ (saved {})", stored.saved_at.format("%Y-%m-%d")));
    }
    let status = match storage.resolve(provider, env_var)? {
        Some(_) => "API key (env) ✓",
        None => "not authenticated",
    };
    Ok(status.to_string())
}

//! One-shot CLI commands over the file-backed stores and the live
//! provider APIs.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use emotedrop::cache::{CacheConfig, ResolverCache};
use emotedrop::resolver::{HttpLookup, ResolverSet};
use emotedrop::store::{JsonFileStore, StoreError};
use emotedrop::{Settings, SettingsPatch, classify};

use crate::cli::{Cli, Command};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("neither ${0} nor $HOME is set; pass --{1}")]
    NoDefaultPath(&'static str, &'static str),
    #[error("not an emote URL: {0}")]
    NotAnEmote(String),
    #[error("{0} is disabled in settings")]
    Disabled(String),
    #[error("could not resolve {0}")]
    Unresolved(String),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Run the parsed command.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Classify { url } => {
            let emote = classify(&url).ok_or(CliError::NotAnEmote(url))?;
            println!("{} {}", emote.provider, emote.id);
        }
        Command::Resolve { url } => {
            let emote = classify(&url).ok_or_else(|| CliError::NotAnEmote(url.clone()))?;
            let settings = Settings::load(&settings_store(cli.settings)?).await;
            if !settings.enabled {
                return Err(CliError::Disabled("emotedrop".into()));
            }
            if !settings.provider_enabled(emote.provider) {
                return Err(CliError::Disabled(emote.provider.to_string()));
            }

            let cache = Rc::new(ResolverCache::new(
                Rc::new(cache_store(cli.cache)?),
                cache_config(cli.ttl_days),
            ));
            let resolvers = ResolverSet::new(cache, Rc::new(HttpLookup::default()));
            let keyword = resolvers
                .get(emote.provider)
                .resolve(&emote.id)
                .await
                .ok_or(CliError::Unresolved(url))?;
            println!("{keyword}");
        }
        Command::Sweep => {
            let cache = ResolverCache::new(
                Rc::new(cache_store(cli.cache)?),
                cache_config(cli.ttl_days),
            );
            let removed = cache.sweep().await;
            println!("removed {removed} expired entries");
        }
        Command::Settings {
            enabled,
            enable_7tv,
            enable_bttv,
            enable_ffz,
        } => {
            let store = settings_store(cli.settings)?;
            let mut settings = Settings::load(&store).await;
            let patch = SettingsPatch {
                enabled,
                enable_7tv,
                enable_bttv,
                enable_ffz,
            };
            if patch != SettingsPatch::default() {
                settings.apply(&patch);
                settings.save(&store).await?;
                tracing::info!(path = %store.path().display(), "settings saved");
            }
            print_settings(&settings);
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("enabled     {}", settings.enabled);
    println!("enable7tv   {}", settings.enable_7tv);
    println!("enableBttv  {}", settings.enable_bttv);
    println!("enableFfz   {}", settings.enable_ffz);
}

fn cache_config(ttl_days: u64) -> CacheConfig {
    CacheConfig {
        ttl: Duration::from_secs(ttl_days.saturating_mul(24 * 60 * 60)),
    }
}

fn cache_store(explicit: Option<PathBuf>) -> Result<JsonFileStore, CliError> {
    let path = match explicit {
        Some(path) => path,
        None => default_path(env_var, "XDG_CACHE_HOME", ".cache", "cache.json")
            .ok_or(CliError::NoDefaultPath("XDG_CACHE_HOME", "cache"))?,
    };
    Ok(JsonFileStore::new(path))
}

fn settings_store(explicit: Option<PathBuf>) -> Result<JsonFileStore, CliError> {
    let path = match explicit {
        Some(path) => path,
        None => default_path(env_var, "XDG_CONFIG_HOME", ".config", "settings.json")
            .ok_or(CliError::NoDefaultPath("XDG_CONFIG_HOME", "settings"))?,
    };
    Ok(JsonFileStore::new(path))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// `$<xdg_var>/emotedrop/<file>`, falling back to
/// `$HOME/<home_dir>/emotedrop/<file>`.
fn default_path(
    env: impl Fn(&str) -> Option<String>,
    xdg_var: &str,
    home_dir: &str,
    file: &str,
) -> Option<PathBuf> {
    let base = match env(xdg_var) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env("HOME")?).join(home_dir),
    };
    Some(base.join("emotedrop").join(file))
}

//! Feature settings and the live settings cell shared by every handler.
//!
//! Exactly one [`SharedSettings`] exists per page context. Updates are
//! applied in place, so every holder observes them on its next read.
//! Handlers read at each decision point and never keep a copy across
//! an await.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::emote::Provider;
use crate::store::{KeyValueStore, StoreError};

/// Persisted key for the master switch.
pub const KEY_ENABLED: &str = "enabled";
/// Persisted key for the 7TV flag.
pub const KEY_ENABLE_7TV: &str = "enable7tv";
/// Persisted key for the BetterTTV flag.
pub const KEY_ENABLE_BTTV: &str = "enableBttv";
/// Persisted key for the FrankerFaceZ flag.
pub const KEY_ENABLE_FFZ: &str = "enableFfz";

/// User-facing feature flags. Every flag defaults to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "enable7tv", default = "default_true")]
    pub enable_7tv: bool,
    #[serde(rename = "enableBttv", default = "default_true")]
    pub enable_bttv: bool,
    #[serde(rename = "enableFfz", default = "default_true")]
    pub enable_ffz: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_7tv: true,
            enable_bttv: true,
            enable_ffz: true,
        }
    }
}

impl Settings {
    /// Whether drops from `provider` should be resolved.
    pub fn provider_enabled(&self, provider: Provider) -> bool {
        match provider {
            Provider::SevenTv => self.enable_7tv,
            Provider::Bttv => self.enable_bttv,
            Provider::Ffz => self.enable_ffz,
        }
    }

    /// Load settings from the persisted store.
    ///
    /// Absent or non-boolean values read as `true`. A failing store
    /// yields the defaults.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        let mut settings = Self::default();
        for (key, slot) in [
            (KEY_ENABLED, &mut settings.enabled),
            (KEY_ENABLE_7TV, &mut settings.enable_7tv),
            (KEY_ENABLE_BTTV, &mut settings.enable_bttv),
            (KEY_ENABLE_FFZ, &mut settings.enable_ffz),
        ] {
            match store.get(key).await {
                Ok(value) => *slot = value.and_then(|v| v.as_bool()).unwrap_or(true),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "settings read failed, using default");
                }
            }
        }
        settings
    }

    /// Persist every flag.
    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(KEY_ENABLED, self.enabled.into()).await?;
        store.set(KEY_ENABLE_7TV, self.enable_7tv.into()).await?;
        store.set(KEY_ENABLE_BTTV, self.enable_bttv.into()).await?;
        store.set(KEY_ENABLE_FFZ, self.enable_ffz.into()).await?;
        Ok(())
    }

    /// Assign every field present in `patch`.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.enable_7tv {
            self.enable_7tv = v;
        }
        if let Some(v) = patch.enable_bttv {
            self.enable_bttv = v;
        }
        if let Some(v) = patch.enable_ffz {
            self.enable_ffz = v;
        }
    }
}

/// A settings update as pushed by the settings UI. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "enable7tv", default, skip_serializing_if = "Option::is_none")]
    pub enable_7tv: Option<bool>,
    #[serde(rename = "enableBttv", default, skip_serializing_if = "Option::is_none")]
    pub enable_bttv: Option<bool>,
    #[serde(rename = "enableFfz", default, skip_serializing_if = "Option::is_none")]
    pub enable_ffz: Option<bool>,
}

impl From<Settings> for SettingsPatch {
    fn from(s: Settings) -> Self {
        Self {
            enabled: Some(s.enabled),
            enable_7tv: Some(s.enable_7tv),
            enable_bttv: Some(s.enable_bttv),
            enable_ffz: Some(s.enable_ffz),
        }
    }
}

/// The live settings object, shared by reference.
///
/// Cloning yields another handle to the same cell.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Rc<RefCell<Settings>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Rc::new(RefCell::new(settings)))
    }

    /// Current value. Read again at every decision point.
    pub fn current(&self) -> Settings {
        *self.0.borrow()
    }

    pub fn enabled(&self) -> bool {
        self.0.borrow().enabled
    }

    pub fn provider_enabled(&self, provider: Provider) -> bool {
        self.0.borrow().provider_enabled(provider)
    }

    /// Mutate the shared value in place.
    pub fn apply(&self, patch: &SettingsPatch) {
        self.0.borrow_mut().apply(patch);
        tracing::debug!(settings = ?self.current(), "settings updated");
    }
}

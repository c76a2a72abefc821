//! Page-context runtime.
//!
//! Owns the live settings, the resolver stack and the field registry
//! for one page. [`ContentScript::run`] is a single-task event loop:
//! element discovery batches attach controllers, settings pushes mutate
//! the shared settings in place and re-attach every field. Drag events
//! bypass the loop; the host delivers them straight to the listeners
//! installed on each element.

use std::rc::Rc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheConfig, Clock, ResolverCache, SystemClock};
use crate::field::{DropContext, FieldRegistry};
use crate::host::{Clipboard, HostElement};
use crate::insert::Inserter;
use crate::resolver::{LookupService, ResolverSet};
use crate::settings::{Settings, SettingsPatch, SharedSettings};
use crate::store::KeyValueStore;

/// Messages pushed to every page instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RuntimeMessage {
    #[serde(rename = "updateSettings")]
    UpdateSettings { settings: SettingsPatch },
}

impl RuntimeMessage {
    /// Decode a raw message. Unknown actions and malformed bodies are
    /// not for us and yield `None`.
    pub fn parse(raw: &Value) -> Option<Self> {
        match serde_json::from_value(raw.clone()) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::trace!(error = %e, "ignoring runtime message");
                None
            }
        }
    }
}

/// External collaborators of a page instance.
pub struct Services {
    /// Persisted user settings.
    pub settings_store: Rc<dyn KeyValueStore>,
    /// Backing store of the resolver cache.
    pub cache_store: Rc<dyn KeyValueStore>,
    pub lookup: Rc<dyn LookupService>,
    pub clipboard: Rc<dyn Clipboard>,
    pub clock: Rc<dyn Clock>,
    pub cache: CacheConfig,
}

impl Services {
    pub fn new(
        settings_store: Rc<dyn KeyValueStore>,
        cache_store: Rc<dyn KeyValueStore>,
        lookup: Rc<dyn LookupService>,
        clipboard: Rc<dyn Clipboard>,
    ) -> Self {
        Self {
            settings_store,
            cache_store,
            lookup,
            clipboard,
            clock: Rc::new(SystemClock),
            cache: CacheConfig::default(),
        }
    }
}

/// One page's emote-drop machinery.
pub struct ContentScript {
    settings: SharedSettings,
    cache: Rc<ResolverCache>,
    registry: FieldRegistry,
}

impl ContentScript {
    /// Load persisted settings and wire the resolver stack.
    pub async fn initialize(services: Services) -> Self {
        let settings = SharedSettings::new(Settings::load(&*services.settings_store).await);
        tracing::debug!(settings = ?settings.current(), "settings loaded");

        let cache = Rc::new(ResolverCache::with_clock(
            services.cache_store,
            services.cache,
            services.clock,
        ));
        let ctx = DropContext {
            settings: settings.clone(),
            resolvers: Rc::new(ResolverSet::new(cache.clone(), services.lookup)),
            inserter: Inserter::new(services.clipboard),
        };
        Self {
            settings,
            cache,
            registry: FieldRegistry::new(ctx),
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Attach to every chat input already present under `root`.
    pub fn scan(&mut self, root: &Rc<dyn HostElement>) -> usize {
        self.registry.discover(std::slice::from_ref(root))
    }

    /// Attach to chat inputs in a batch of newly inserted subtrees.
    pub fn discover(&mut self, batch: &[Rc<dyn HostElement>]) -> usize {
        self.registry.discover(batch)
    }

    pub fn handle_message(&mut self, message: RuntimeMessage) {
        match message {
            RuntimeMessage::UpdateSettings { settings } => {
                self.settings.apply(&settings);
                let count = self.registry.reattach_all();
                tracing::info!(fields = count, "settings applied");
            }
        }
    }

    /// Scan `root`, sweep expired cache entries, then process discovery
    /// batches and runtime messages until both streams end.
    pub async fn run<D, M>(&mut self, root: Rc<dyn HostElement>, discovery: D, messages: M)
    where
        D: Stream<Item = Vec<Rc<dyn HostElement>>> + Unpin,
        M: Stream<Item = RuntimeMessage> + Unpin,
    {
        let found = self.scan(&root);
        tracing::info!(fields = found, "content script started");

        self.cache.sweep().await;

        let mut discovery = discovery.fuse();
        let mut messages = messages.fuse();
        loop {
            tokio::select! {
                Some(batch) = discovery.next() => {
                    self.discover(&batch);
                }
                Some(message) = messages.next() => {
                    self.handle_message(message);
                }
                else => break,
            }
        }

        tracing::info!("content script stopped");
    }
}

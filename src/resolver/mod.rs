//! Provider resolvers: emote id to keyword, cache first.
//!
//! One [`ProviderResolver`] per provider, all sharing the same
//! [`ResolverCache`] and [`LookupService`]. A miss issues exactly one
//! lookup. Failures are not retried and not cached; the next drop of
//! the same id tries again. Concurrent drops of one unresolved id are
//! not de-duplicated.

pub mod lookup;

use std::rc::Rc;

pub use lookup::{Endpoints, HttpLookup, LookupError, LookupService, extract_keyword};

use crate::cache::ResolverCache;
use crate::emote::Provider;

/// Resolves ids for a single provider.
pub struct ProviderResolver {
    provider: Provider,
    cache: Rc<ResolverCache>,
    lookup: Rc<dyn LookupService>,
}

impl ProviderResolver {
    pub fn new(provider: Provider, cache: Rc<ResolverCache>, lookup: Rc<dyn LookupService>) -> Self {
        Self {
            provider,
            cache,
            lookup,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Resolve `id` to its keyword.
    ///
    /// Returns `None` on any transport failure, non-success response or
    /// missing keyword field. Only successful lookups are cached.
    pub async fn resolve(&self, id: &str) -> Option<String> {
        let provider = self.provider;
        if let Some(keyword) = self.cache.get(provider, id).await {
            tracing::debug!(%provider, %id, %keyword, "cache hit");
            return Some(keyword);
        }

        let keyword = match self.fetch(id).await {
            Ok(keyword) => keyword,
            Err(e) => {
                tracing::debug!(%provider, %id, error = %e, "lookup failed");
                return None;
            }
        };
        if keyword.is_empty() {
            tracing::debug!(%provider, %id, "lookup returned empty keyword");
            return None;
        }

        self.cache.put(provider, id, &keyword).await;
        tracing::debug!(%provider, %id, %keyword, "resolved");
        Some(keyword)
    }

    async fn fetch(&self, id: &str) -> Result<String, LookupError> {
        let body = self.lookup.lookup(self.provider, id).await?;
        extract_keyword(self.provider, body)
    }
}

/// The three provider resolvers, composed at startup.
pub struct ResolverSet {
    seven_tv: ProviderResolver,
    bttv: ProviderResolver,
    ffz: ProviderResolver,
}

impl ResolverSet {
    pub fn new(cache: Rc<ResolverCache>, lookup: Rc<dyn LookupService>) -> Self {
        let resolver = |provider| ProviderResolver::new(provider, cache.clone(), lookup.clone());
        Self {
            seven_tv: resolver(Provider::SevenTv),
            bttv: resolver(Provider::Bttv),
            ffz: resolver(Provider::Ffz),
        }
    }

    pub fn get(&self, provider: Provider) -> &ProviderResolver {
        match provider {
            Provider::SevenTv => &self.seven_tv,
            Provider::Bttv => &self.bttv,
            Provider::Ffz => &self.ffz,
        }
    }
}

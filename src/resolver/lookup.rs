//! Remote id-resolution services.
//!
//! Each provider exposes a read-only JSON endpoint keyed by emote id.
//! The keyword lives at a provider-specific path in the response body.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde_json::Value;

use crate::emote::Provider;

/// Errors from a single lookup request.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("response has no keyword: {0}")]
    MissingKeyword(#[from] serde_json::Error),
}

/// A request/response service mapping an emote id to its JSON record.
pub trait LookupService {
    fn lookup<'a>(
        &'a self,
        provider: Provider,
        id: &'a str,
    ) -> LocalBoxFuture<'a, Result<Value, LookupError>>;
}

/// Base URLs of the three id-resolution services. The request URL is
/// `{base}/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub seven_tv: String,
    pub bttv: String,
    pub ffz: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            seven_tv: "https://api.7tv.app/v3/emotes".into(),
            bttv: "https://api.betterttv.net/3/emotes".into(),
            ffz: "https://api.frankerfacez.com/v1/emote".into(),
        }
    }
}

impl Endpoints {
    pub fn url(&self, provider: Provider, id: &str) -> String {
        let base = match provider {
            Provider::SevenTv => &self.seven_tv,
            Provider::Bttv => &self.bttv,
            Provider::Ffz => &self.ffz,
        };
        format!("{}/{id}", base.trim_end_matches('/'))
    }
}

/// [`LookupService`] over HTTPS.
///
/// No timeout is configured: a hung request leaves only its own drop
/// unresolved.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpLookup {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }
}

impl Default for HttpLookup {
    fn default() -> Self {
        Self::new(Endpoints::default())
    }
}

impl LookupService for HttpLookup {
    fn lookup<'a>(
        &'a self,
        provider: Provider,
        id: &'a str,
    ) -> LocalBoxFuture<'a, Result<Value, LookupError>> {
        async move {
            let url = self.endpoints.url(provider, id);
            tracing::debug!(%provider, %id, %url, "looking up emote");
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LookupError::Status(status.as_u16()));
            }
            Ok(response.json::<Value>().await?)
        }
        .boxed_local()
    }
}

// -- Response shapes --

/// 7TV: `{"name": ...}`.
#[derive(Debug, Deserialize)]
struct SevenTvEmote {
    name: String,
}

/// BetterTTV: `{"code": ...}`.
#[derive(Debug, Deserialize)]
struct BttvEmote {
    code: String,
}

/// FrankerFaceZ: `{"emote": {"name": ...}}`.
#[derive(Debug, Deserialize)]
struct FfzResponse {
    emote: FfzEmote,
}

#[derive(Debug, Deserialize)]
struct FfzEmote {
    name: String,
}

/// Pull the keyword out of a provider's response body.
pub fn extract_keyword(provider: Provider, body: Value) -> Result<String, LookupError> {
    let keyword = match provider {
        Provider::SevenTv => serde_json::from_value::<SevenTvEmote>(body)?.name,
        Provider::Bttv => serde_json::from_value::<BttvEmote>(body)?.code,
        Provider::Ffz => serde_json::from_value::<FfzResponse>(body)?.emote.name,
    };
    Ok(keyword)
}

//! Emote URL classification.
//!
//! Maps a dropped URL onto the provider whose CDN served it and the
//! provider's opaque emote id. Pure, no I/O.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// An emote provider with its own CDN and id-resolution service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    SevenTv,
    Bttv,
    Ffz,
}

impl Provider {
    /// All providers, in classification order.
    pub const ALL: [Provider; 3] = [Provider::SevenTv, Provider::Bttv, Provider::Ffz];

    /// Short name used in cache keys and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::SevenTv => "7tv",
            Provider::Bttv => "bttv",
            Provider::Ffz => "ffz",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified emote: provider plus the id captured from the URL.
///
/// Derived transiently from a drop payload and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteRef {
    pub provider: Provider,
    pub id: String,
}

/// 7TV CDN path. Ids are upper-case ULIDs.
const SEVEN_TV: &str = r"https://cdn\.7tv\.app/emote/([0-9A-Z]+)/";

/// BetterTTV CDN path. Ids are lower-case hex object ids.
const BTTV: &str = r"https://cdn\.betterttv\.net/emote/([0-9a-f]+)/";

/// FrankerFaceZ CDN path. Ids are decimal.
const FFZ: &str = r"https://cdn\.frankerfacez\.com/emote/([0-9]+)/";

static PATTERNS: LazyLock<[(Provider, Regex); 3]> = LazyLock::new(|| {
    let compile = |pattern: &str| Regex::new(pattern).expect("emote URL pattern is valid");
    [
        (Provider::SevenTv, compile(SEVEN_TV)),
        (Provider::Bttv, compile(BTTV)),
        (Provider::Ffz, compile(FFZ)),
    ]
});

/// Classify a dropped URL.
///
/// Patterns are tried in [`Provider::ALL`] order and the first match
/// wins. A CDN URL anywhere in the payload counts. Returns `None` for anything that is not an emote CDN URL; the
/// caller must then leave the native drop behavior alone.
pub fn classify(url: &str) -> Option<EmoteRef> {
    PATTERNS.iter().find_map(|(provider, re)| {
        re.captures(url).map(|caps| EmoteRef {
            provider: *provider,
            id: caps[1].to_string(),
        })
    })
}

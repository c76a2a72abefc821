//! Drag-and-drop emote keywords for web chat inputs.
//!
//! Dropping an emote image from 7TV, BetterTTV or FrankerFaceZ onto a
//! chat input inserts the emote's keyword instead of the image. The
//! host page is reached only through the traits in [`host`]; storage
//! and the provider APIs through [`store`] and [`resolver`].
//!
//! Everything runs on one thread. Shared state lives in `Rc`/`Cell`
//! and collaborator futures are `LocalBoxFuture`s.

pub mod cache;
pub mod content;
pub mod emote;
pub mod field;
pub mod host;
pub mod insert;
pub mod resolver;
pub mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::{CacheConfig, ResolverCache};
pub use content::{ContentScript, RuntimeMessage, Services};
pub use emote::{EmoteRef, Provider, classify};
pub use field::{FieldController, FieldRegistry, FieldState};
pub use settings::{Settings, SettingsPatch, SharedSettings};

//! Test doubles for the host page and the external services.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde_json::{Map, Value};
use tokio::sync::Notify;

use crate::cache::{CacheConfig, Clock, ResolverCache};
use crate::emote::Provider;
use crate::field::{DropContext, FieldRegistry};
use crate::host::{
    CHAT_INPUT_SELECTOR, Clipboard, DragEvent, DragListener, DropTask, HostElement, HostError,
    ListenerId, PasteEvent,
};
use crate::insert::Inserter;
use crate::resolver::{LookupError, LookupService, ResolverSet};
use crate::settings::{Settings, SharedSettings};
use crate::store::{KeyValueStore, MemoryStore, StoreError};

// -- Clock --

pub struct ManualClock(Cell<u64>);

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self(Cell::new(now))
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.get()
    }
}

// -- Store --

/// A store whose every operation fails.
pub struct FailingStore;

impl FailingStore {
    fn err() -> StoreError {
        StoreError::Unavailable("injected failure".into())
    }
}

impl KeyValueStore for FailingStore {
    fn get<'a>(&'a self, _key: &'a str) -> LocalBoxFuture<'a, Result<Option<Value>, StoreError>> {
        future::ready(Err(Self::err())).boxed_local()
    }

    fn set<'a>(&'a self, _key: &'a str, _value: Value) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        future::ready(Err(Self::err())).boxed_local()
    }

    fn remove<'a>(&'a self, _keys: &'a [String]) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        future::ready(Err(Self::err())).boxed_local()
    }

    fn entries(&self) -> LocalBoxFuture<'_, Result<Map<String, Value>, StoreError>> {
        future::ready(Err(Self::err())).boxed_local()
    }
}

// -- Lookup --

/// Scripted lookup service counting every request.
#[derive(Default)]
pub struct FakeLookup {
    responses: RefCell<HashMap<(Provider, String), Result<Value, u16>>>,
    calls: Cell<usize>,
    held: Cell<bool>,
    gate: Notify,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, provider: Provider, id: &str, body: Value) {
        self.responses
            .borrow_mut()
            .insert((provider, id.to_string()), Ok(body));
    }

    pub fn fail(&self, provider: Provider, id: &str, status: u16) {
        self.responses
            .borrow_mut()
            .insert((provider, id.to_string()), Err(status));
    }

    /// Make subsequent lookups wait for [`release`](Self::release).
    pub fn hold(&self) {
        self.held.set(true);
    }

    pub fn release(&self) {
        self.held.set(false);
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl LookupService for FakeLookup {
    fn lookup<'a>(
        &'a self,
        provider: Provider,
        id: &'a str,
    ) -> LocalBoxFuture<'a, Result<Value, LookupError>> {
        self.calls.set(self.calls.get() + 1);
        async move {
            if self.held.get() {
                self.gate.notified().await;
            }
            let response = self
                .responses
                .borrow()
                .get(&(provider, id.to_string()))
                .cloned()
                .unwrap_or(Err(404));
            response.map_err(LookupError::Status)
        }
        .boxed_local()
    }
}

// -- Clipboard --

pub struct RecordingClipboard {
    written: RefCell<Vec<String>>,
    denied: bool,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
            denied: false,
        }
    }

    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::new()
        }
    }

    pub fn written(&self) -> Vec<String> {
        self.written.borrow().clone()
    }
}

impl Clipboard for RecordingClipboard {
    fn write_text<'a>(&'a self, text: &'a str) -> LocalBoxFuture<'a, Result<(), HostError>> {
        let result = if self.denied {
            Err(HostError::Clipboard("permission denied".into()))
        } else {
            self.written.borrow_mut().push(text.to_string());
            Ok(())
        };
        future::ready(result).boxed_local()
    }
}

// -- Element --

/// Minimal DOM element. Only the chat-input selector is understood.
pub struct FakeElement {
    tag: String,
    chat_input: bool,
    editable: Cell<bool>,
    armed: Cell<bool>,
    focused: Cell<bool>,
    children: RefCell<Vec<Rc<FakeElement>>>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn DragListener>)>>,
    next_listener: Cell<u64>,
    pastes: RefCell<Vec<PasteEvent>>,
}

impl FakeElement {
    fn build(tag: &str, chat_input: bool) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_string(),
            chat_input,
            editable: Cell::new(chat_input),
            armed: Cell::new(false),
            focused: Cell::new(false),
            children: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(1),
            pastes: RefCell::new(Vec::new()),
        })
    }

    /// An editable `div[data-a-target="chat-input"]`.
    pub fn chat_input() -> Rc<Self> {
        Self::build("div", true)
    }

    pub fn plain(tag: &str) -> Rc<Self> {
        Self::build(tag, false)
    }

    pub fn append(&self, child: Rc<FakeElement>) {
        self.children.borrow_mut().push(child);
    }

    pub fn set_editable(&self, editable: bool) {
        self.editable.set(editable);
    }

    /// Dispatch `event` to every listener, returning the event after
    /// dispatch and any drop continuations.
    pub fn fire(&self, mut event: DragEvent) -> (DragEvent, Vec<DropTask>) {
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        let tasks = listeners
            .iter()
            .filter_map(|l| l.handle(&mut event))
            .collect();
        (event, tasks)
    }

    pub fn armed(&self) -> bool {
        self.armed.get()
    }

    pub fn focused(&self) -> bool {
        self.focused.get()
    }

    pub fn pastes(&self) -> Vec<PasteEvent> {
        self.pastes.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl HostElement for FakeElement {
    fn matches(&self, selector: &str) -> bool {
        selector == CHAT_INPUT_SELECTOR && self.chat_input && self.tag == "div"
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Rc<dyn HostElement>> {
        let mut found: Vec<Rc<dyn HostElement>> = Vec::new();
        for child in self.children.borrow().iter() {
            if child.matches(selector) {
                found.push(child.clone());
            }
            found.extend(child.query_selector_all(selector));
        }
        found
    }

    fn is_content_editable(&self) -> bool {
        self.editable.get()
    }

    fn set_drag_feedback(&self, armed: bool) {
        self.armed.set(armed);
    }

    fn focus(&self) {
        self.focused.set(true);
    }

    fn add_drag_listener(&self, listener: Rc<dyn DragListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove_drag_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(l, _)| *l != id);
    }

    fn dispatch_paste(&self, event: PasteEvent) -> Result<(), HostError> {
        self.pastes.borrow_mut().push(event);
        Ok(())
    }
}

// -- Wiring --

/// A registry wired to fakes, with handles to each collaborator.
pub struct Harness {
    pub registry: FieldRegistry,
    pub settings: SharedSettings,
    pub cache: Rc<ResolverCache>,
    pub lookup: Rc<FakeLookup>,
    pub clipboard: Rc<RecordingClipboard>,
}

impl Harness {
    pub fn new() -> Self {
        let settings = SharedSettings::new(Settings::default());
        let cache = Rc::new(ResolverCache::with_clock(
            Rc::new(MemoryStore::new()),
            CacheConfig::default(),
            Rc::new(ManualClock::new(1_700_000_000_000)),
        ));
        let lookup = Rc::new(FakeLookup::new());
        let clipboard = Rc::new(RecordingClipboard::new());
        let ctx = DropContext {
            settings: settings.clone(),
            resolvers: Rc::new(ResolverSet::new(cache.clone(), lookup.clone())),
            inserter: Inserter::new(clipboard.clone()),
        };
        Self {
            registry: FieldRegistry::new(ctx),
            settings,
            cache,
            lookup,
            clipboard,
        }
    }
}

//! In-memory stand-ins for the browser seams, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};

use crate::export::{Clipboard, ExportError, FileSaver};
use crate::fields::{Field, FormFields};
use crate::request::{HttpReply, Transport, TransportError};
use crate::schedule::{Scheduler, TimerGuard};
use crate::session::{Platform, Session};
use crate::settings::Settings;
use crate::storage::{KeyValueStore, StorageError};
use crate::view::{STAT_PLACEHOLDER, StatSlot, View};

#[derive(Clone, Default)]
pub struct MemoryForm {
    values: Rc<RefCell<HashMap<Field, String>>>,
    flags: Rc<RefCell<HashMap<Field, bool>>>,
}

impl MemoryForm {
    /// Every control present, holding the values the server page renders.
    pub fn with_all_controls() -> Self {
        let form = Self::default();
        let defaults = Settings::default();
        {
            let mut values = form.values.borrow_mut();
            values.insert(Field::Url, defaults.url);
            values.insert(Field::Provider, defaults.provider);
            values.insert(Field::ModelName, defaults.model_name);
            values.insert(Field::Host, defaults.host);
            values.insert(Field::TargetLanguage, defaults.target_language);
            values.insert(Field::Length, defaults.length.as_str().to_string());
            values.insert(Field::Temperature, defaults.temperature.to_string());
            values.insert(
                Field::TargetChunkWords,
                defaults.target_chunk_words.to_string(),
            );
            values.insert(Field::MaxTokens, defaults.max_tokens.to_string());
            values.insert(Field::MaxRetries, defaults.max_retries.to_string());
        }
        {
            let mut flags = form.flags.borrow_mut();
            flags.insert(Field::Think, defaults.think);
            flags.insert(Field::IncludeSummary, defaults.include_summary);
            flags.insert(Field::IncludeKeyPoints, defaults.include_key_points);
        }
        form
    }
}

impl FormFields for MemoryForm {
    fn value(&self, field: Field) -> Option<String> {
        self.values.borrow().get(&field).cloned()
    }

    fn set_value(&self, field: Field, value: &str) {
        if let Some(slot) = self.values.borrow_mut().get_mut(&field) {
            *slot = value.to_string();
        }
    }

    fn checked(&self, field: Field) -> Option<bool> {
        self.flags.borrow().get(&field).copied()
    }

    fn set_checked(&self, field: Field, checked: bool) {
        if let Some(slot) = self.flags.borrow_mut().get_mut(&field) {
            *slot = checked;
        }
    }
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, String>,
    unavailable: bool,
    writes: usize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<StoreState>>,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.borrow().entries.get(key).cloned()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.state.borrow();
        if state.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        if state.unavailable {
            return Err(StorageError::Unavailable);
        }
        state.entries.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}

type ReplyOutcome = Result<HttpReply, TransportError>;

enum QueuedReply {
    Ready(ReplyOutcome),
    /// Resolves once the test sends through the paired sender.
    Gated(oneshot::Receiver<ReplyOutcome>),
}

#[derive(Default)]
struct TransportState {
    replies: VecDeque<QueuedReply>,
    requests: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<TransportState>>,
}

impl FakeTransport {
    pub fn push_reply(&self, reply: HttpReply) {
        self.state
            .borrow_mut()
            .replies
            .push_back(QueuedReply::Ready(Ok(reply)));
    }

    pub fn push_error(&self, err: TransportError) {
        self.state
            .borrow_mut()
            .replies
            .push_back(QueuedReply::Ready(Err(err)));
    }

    /// Queue a reply that stays pending until the returned sender fires.
    pub fn push_gated(&self) -> oneshot::Sender<ReplyOutcome> {
        let (tx, rx) = oneshot::channel();
        self.state
            .borrow_mut()
            .replies
            .push_back(QueuedReply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.borrow().requests.clone()
    }
}

impl Transport for FakeTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        body: String,
    ) -> LocalBoxFuture<'a, Result<HttpReply, TransportError>> {
        let mut state = self.state.borrow_mut();
        state.requests.push((url.to_string(), body));
        match state.replies.pop_front() {
            Some(QueuedReply::Ready(reply)) => Box::pin(future::ready(reply)),
            Some(QueuedReply::Gated(rx)) => Box::pin(async move {
                rx.await
                    .unwrap_or_else(|_| Err(TransportError("gate dropped".to_string())))
            }),
            None => Box::pin(future::ready(Err(TransportError(
                "no reply queued".to_string(),
            )))),
        }
    }
}

#[derive(Default)]
struct ViewState {
    status: String,
    trigger_history: Vec<bool>,
    preview: String,
    error: Option<String>,
    progress_shown: usize,
    stats: HashMap<StatSlot, String>,
}

#[derive(Clone, Default)]
pub struct RecordingView {
    state: Rc<RefCell<ViewState>>,
}

impl RecordingView {
    pub fn trigger_enabled(&self) -> bool {
        self.state
            .borrow()
            .trigger_history
            .last()
            .copied()
            .unwrap_or(true)
    }

    pub fn trigger_history(&self) -> Vec<bool> {
        self.state.borrow().trigger_history.clone()
    }

    pub fn preview(&self) -> String {
        self.state.borrow().preview.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn progress_shown(&self) -> usize {
        self.state.borrow().progress_shown
    }

    pub fn stat(&self, slot: StatSlot) -> String {
        self.state
            .borrow()
            .stats
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| STAT_PLACEHOLDER.to_string())
    }
}

impl View for RecordingView {
    fn status(&self) -> String {
        self.state.borrow().status.clone()
    }

    fn set_status(&self, text: &str) {
        self.state.borrow_mut().status = text.to_string();
    }

    fn set_trigger_enabled(&self, enabled: bool) {
        self.state.borrow_mut().trigger_history.push(enabled);
    }

    fn show_progress(&self) {
        let mut state = self.state.borrow_mut();
        state.progress_shown += 1;
        state.preview.clear();
        state.error = None;
    }

    fn show_preview(&self, html: &str) {
        let mut state = self.state.borrow_mut();
        state.preview = html.to_string();
        state.error = None;
    }

    fn show_error(&self, message: &str) {
        let mut state = self.state.borrow_mut();
        state.preview.clear();
        state.error = Some(message.to_string());
    }

    fn set_stat(&self, slot: StatSlot, text: &str) {
        self.state.borrow_mut().stats.insert(slot, text.to_string());
    }
}

#[derive(Clone, Default)]
pub struct FakeClipboard {
    copied: Rc<RefCell<Vec<String>>>,
    reject: Rc<Cell<bool>>,
}

impl FakeClipboard {
    pub fn reject_writes(&self) {
        self.reject.set(true);
    }

    pub fn copied(&self) -> Vec<String> {
        self.copied.borrow().clone()
    }
}

impl Clipboard for FakeClipboard {
    fn write_text<'a>(&'a self, text: &'a str) -> LocalBoxFuture<'a, Result<(), ExportError>> {
        let outcome = if self.reject.get() {
            Err(ExportError::Rejected)
        } else {
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        };
        Box::pin(future::ready(outcome))
    }
}

#[derive(Clone, Default)]
pub struct FakeFiles {
    saved: Rc<RefCell<Vec<(String, String, String)>>>,
}

impl FakeFiles {
    pub fn saved(&self) -> Vec<(String, String, String)> {
        self.saved.borrow().clone()
    }
}

impl FileSaver for FakeFiles {
    fn save(&self, filename: &str, mime: &str, contents: &str) -> Result<(), ExportError> {
        self.saved.borrow_mut().push((
            filename.to_string(),
            mime.to_string(),
            contents.to_string(),
        ));
        Ok(())
    }
}

struct PendingTimer {
    id: u64,
    due: u64,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ClockState {
    now: u64,
    next_id: u64,
    timers: Vec<PendingTimer>,
}

/// Virtual clock: timers only fire inside `advance`.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ClockState>>,
}

impl ManualScheduler {
    pub fn advance(&self, ms: u64) {
        let target = self.state.borrow().now + ms;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let earliest = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.id))
                    .map(|(idx, _)| idx);
                earliest.map(|idx| {
                    let timer = state.timers.remove(idx);
                    state.now = timer.due;
                    timer
                })
            };
            match next {
                Some(timer) => (timer.task)(),
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerGuard {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            let due = state.now + u64::from(delay_ms);
            state.timers.push(PendingTimer { id, due, task });
            id
        };

        let state: Weak<RefCell<ClockState>> = Rc::downgrade(&self.state);
        TimerGuard::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().timers.retain(|timer| timer.id != id);
            }
        })
    }
}

/// A session wired to fakes, with handles kept for assertions.
pub struct Harness {
    pub form: MemoryForm,
    pub store: MemoryStore,
    pub transport: FakeTransport,
    pub view: RecordingView,
    pub clipboard: FakeClipboard,
    pub files: FakeFiles,
    pub clock: ManualScheduler,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            form: MemoryForm::with_all_controls(),
            store: MemoryStore::default(),
            transport: FakeTransport::default(),
            view: RecordingView::default(),
            clipboard: FakeClipboard::default(),
            files: FakeFiles::default(),
            clock: ManualScheduler::default(),
        }
    }

    pub fn session(&self) -> Rc<Session> {
        Session::new(Platform {
            form: Box::new(self.form.clone()),
            store: Box::new(self.store.clone()),
            transport: Box::new(self.transport.clone()),
            view: Box::new(self.view.clone()),
            clipboard: Box::new(self.clipboard.clone()),
            files: Box::new(self.files.clone()),
            scheduler: Rc::new(self.clock.clone()),
        })
    }
}

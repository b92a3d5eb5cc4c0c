use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::export::{Clipboard, FileSaver, MARKDOWN_MIME, download_filename};
use crate::fields::{Field, FormFields};
use crate::request::{
    RequestError, SUMMARIZE_ENDPOINT, SummarizeRequest, SummaryResult, Transport, interpret_reply,
};
use crate::schedule::{Debouncer, Scheduler, TimerGuard};
use crate::settings::Settings;
use crate::storage::{KeyValueStore, load_settings, save_settings};
use crate::view::{STAT_PLACEHOLDER, StatSlot, View, stat_texts};

pub const AUTOSAVE_DELAY_MS: u32 = 300;
pub const FLASH_DURATION_MS: u32 = 1500;

pub const READY_STATUS: &str = "Ready";
pub const MISSING_URL_STATUS: &str = "Enter a video URL.";
pub const RUNNING_STATUS: &str = "Summarizing...";
pub const DONE_STATUS: &str = "Done";
pub const ERROR_STATUS: &str = "Error";
pub const COPIED_STATUS: &str = "Copied to clipboard.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Done,
    Error,
}

/// Browser capabilities the session drives.
pub struct Platform {
    pub form: Box<dyn FormFields>,
    pub store: Box<dyn KeyValueStore>,
    pub transport: Box<dyn Transport>,
    pub view: Box<dyn View>,
    pub clipboard: Box<dyn Clipboard>,
    pub files: Box<dyn FileSaver>,
    pub scheduler: Rc<dyn Scheduler>,
}

struct StatusFlash {
    // Taken when the flash ends; the guard stays until the next flash replaces it.
    restore: Option<String>,
    _timer: TimerGuard,
}

/// Page-lifetime state of the summarize form: the last result, the request phase
/// and the pending timers. Event handlers share it through an `Rc`.
pub struct Session {
    platform: Platform,
    autosave: Debouncer,
    phase: Cell<Phase>,
    last: RefCell<Option<SummaryResult>>,
    flash: RefCell<Option<StatusFlash>>,
}

impl Session {
    pub fn new(platform: Platform) -> Rc<Self> {
        let autosave = Debouncer::new(platform.scheduler.clone(), AUTOSAVE_DELAY_MS);
        Rc::new(Self {
            platform,
            autosave,
            phase: Cell::new(Phase::Idle),
            last: RefCell::new(None),
            flash: RefCell::new(None),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn last_result(&self) -> Option<SummaryResult> {
        self.last.borrow().clone()
    }

    /// Merge persisted settings into the form. Returns whether anything was stored.
    pub fn restore(&self) -> bool {
        let restored = match load_settings(self.platform.store.as_ref()) {
            Some(patch) => {
                patch.apply_to(self.platform.form.as_ref());
                true
            }
            None => false,
        };
        self.platform.view.set_status(READY_STATUS);
        restored
    }

    pub fn persist(&self) {
        let settings = Settings::read_from(self.platform.form.as_ref());
        save_settings(self.platform.store.as_ref(), &settings);
    }

    /// Called on every tracked field edit; the write lands once edits pause.
    pub fn schedule_autosave(self: &Rc<Self>) {
        let session = Rc::downgrade(self);
        self.autosave.trigger(move || {
            if let Some(session) = session.upgrade() {
                session.persist();
            }
        });
    }

    pub async fn submit(&self) {
        if self.phase.get() == Phase::Running {
            debug!("summarize already in flight; ignoring trigger");
            return;
        }
        let url = self
            .platform
            .form
            .value(Field::Url)
            .unwrap_or_default()
            .trim()
            .to_string();
        if url.is_empty() {
            self.platform.view.set_status(MISSING_URL_STATUS);
            return;
        }

        self.begin_run();
        let settings = Settings::read_from(self.platform.form.as_ref());
        save_settings(self.platform.store.as_ref(), &settings);

        match self.send(&url, &settings).await {
            Ok(result) => self.finish_done(result),
            Err(err) => self.finish_error(&err),
        }
        self.platform.view.set_trigger_enabled(true);
    }

    async fn send(&self, url: &str, settings: &Settings) -> Result<SummaryResult, RequestError> {
        let body = serde_json::to_string(&SummarizeRequest {
            url,
            config: settings,
        })?;
        let reply = self
            .platform
            .transport
            .post_json(SUMMARIZE_ENDPOINT, body)
            .await?;
        interpret_reply(&reply)
    }

    fn begin_run(&self) {
        self.phase.set(Phase::Running);
        self.flash.borrow_mut().take();
        self.last.borrow_mut().take();

        let view = self.platform.view.as_ref();
        view.set_trigger_enabled(false);
        for slot in StatSlot::ALL {
            view.set_stat(slot, STAT_PLACEHOLDER);
        }
        view.show_progress();
        view.set_status(RUNNING_STATUS);
    }

    fn finish_done(&self, result: SummaryResult) {
        info!(
            video_id = %result.video_id,
            elapsed = result.stats.elapsed_seconds,
            "summary received"
        );
        let view = self.platform.view.as_ref();
        view.show_preview(&result.html);
        for (slot, text) in stat_texts(&result.stats) {
            view.set_stat(slot, &text);
        }
        view.set_status(DONE_STATUS);
        *self.last.borrow_mut() = Some(result);
        self.phase.set(Phase::Done);
    }

    fn finish_error(&self, err: &RequestError) {
        warn!("summarize failed: {err}");
        let view = self.platform.view.as_ref();
        view.show_error(&err.to_string());
        view.set_status(ERROR_STATUS);
        self.phase.set(Phase::Error);
    }

    pub async fn copy_result(self: &Rc<Self>) {
        let markdown = match self.last.borrow().as_ref() {
            Some(result) => result.markdown.clone(),
            None => return,
        };

        match self.platform.clipboard.write_text(&markdown).await {
            Ok(()) => self.flash_status(COPIED_STATUS),
            Err(err) => debug!("copy failed: {err}"),
        }
    }

    pub fn download_result(&self) {
        let last = self.last.borrow();
        let Some(result) = last.as_ref() else {
            return;
        };
        let filename = download_filename(&result.video_id);
        if let Err(err) = self
            .platform
            .files
            .save(&filename, MARKDOWN_MIME, &result.markdown)
        {
            debug!("download of {filename} failed: {err}");
        }
    }

    fn flash_status(self: &Rc<Self>, text: &str) {
        let view = self.platform.view.as_ref();
        let previous = self.flash.borrow_mut().take();
        let restore = previous
            .and_then(|flash| flash.restore)
            .unwrap_or_else(|| view.status());
        view.set_status(text);

        let session = Rc::downgrade(self);
        let timer = self.platform.scheduler.schedule(
            FLASH_DURATION_MS,
            Box::new(move || {
                if let Some(session) = session.upgrade() {
                    session.end_flash();
                }
            }),
        );
        *self.flash.borrow_mut() = Some(StatusFlash {
            restore: Some(restore),
            _timer: timer,
        });
    }

    fn end_flash(&self) {
        let restore = self
            .flash
            .borrow_mut()
            .as_mut()
            .and_then(|flash| flash.restore.take());
        if let Some(text) = restore {
            self.platform.view.set_status(&text);
        }
    }
}

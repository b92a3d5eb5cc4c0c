use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use gloo_timers::callback::Timeout;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Blob, BlobPropertyBag, Document, Element, HtmlAnchorElement, HtmlButtonElement, HtmlDocument,
    HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, KeyboardEvent, Storage,
};

use crate::export::{Clipboard, ExportError, FileSaver};
use crate::fields::{Field, FormFields};
use crate::request::{HttpReply, Transport, TransportError};
use crate::schedule::{Scheduler, TimerGuard};
use crate::session::{Platform, Session};
use crate::storage::{KeyValueStore, StorageError};
use crate::view::{StatSlot, View};

const FORM_ID: &str = "settings-form";
const TRIGGER_ID: &str = "summarize-btn";
const STATUS_ID: &str = "status";
const PREVIEW_ID: &str = "preview";
const COPY_ID: &str = "copy-btn";
const DOWNLOAD_ID: &str = "download-btn";

const PROGRESS_TEXT: &str = "Working on it. Long videos can take a few minutes.";

fn web_document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

fn element(id: &str) -> Option<Element> {
    web_document().and_then(|doc| doc.get_element_by_id(id))
}

fn set_text(id: &str, value: &str) {
    let Some(node) = element(id) else {
        return;
    };
    if node.text_content().as_deref() == Some(value) {
        return;
    }
    node.set_text_content(Some(value));
}

fn js_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

pub struct DomForm;

impl FormFields for DomForm {
    fn value(&self, field: Field) -> Option<String> {
        let node = element(field.element_id())?;
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            return Some(select.value());
        }
        node.dyn_ref::<HtmlTextAreaElement>()
            .map(HtmlTextAreaElement::value)
    }

    fn set_value(&self, field: Field, value: &str) {
        let Some(node) = element(field.element_id()) else {
            return;
        };
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.set_value(value);
        }
    }

    fn checked(&self, field: Field) -> Option<bool> {
        element(field.element_id())?
            .dyn_ref::<HtmlInputElement>()
            .map(HtmlInputElement::checked)
    }

    fn set_checked(&self, field: Field, checked: bool) {
        if let Some(input) = element(field.element_id())
            .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_checked(checked);
        }
    }
}

pub struct LocalStore;

fn local_storage() -> Result<Storage, StorageError> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or(StorageError::Unavailable)
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        local_storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::Rejected(js_message(&err)))
    }
}

pub struct FetchTransport;

impl Transport for FetchTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        body: String,
    ) -> LocalBoxFuture<'a, Result<HttpReply, TransportError>> {
        Box::pin(async move {
            let request = Request::post(url)
                .header("Content-Type", "application/json")
                .body(body)
                .map_err(|err| TransportError(err.to_string()))?;
            let response = request
                .send()
                .await
                .map_err(|err| TransportError(err.to_string()))?;
            let status = response.status();
            // An unreadable body still carries a usable status.
            let body = response.text().await.unwrap_or_default();
            Ok(HttpReply { status, body })
        })
    }
}

pub struct DomView;

impl DomView {
    fn preview() -> Option<Element> {
        element(PREVIEW_ID)
    }

    fn replace_preview_with(tag: &str, class_name: &str, text: &str) {
        let (Some(doc), Some(preview)) = (web_document(), Self::preview()) else {
            return;
        };
        preview.set_inner_html("");
        let Ok(node) = doc.create_element(tag) else {
            return;
        };
        node.set_class_name(class_name);
        node.set_text_content(Some(text));
        let _ = preview.append_child(&node);
    }
}

impl View for DomView {
    fn status(&self) -> String {
        element(STATUS_ID)
            .and_then(|node| node.text_content())
            .unwrap_or_default()
    }

    fn set_status(&self, text: &str) {
        set_text(STATUS_ID, text);
    }

    fn set_trigger_enabled(&self, enabled: bool) {
        if let Some(button) =
            element(TRIGGER_ID).and_then(|node| node.dyn_into::<HtmlButtonElement>().ok())
        {
            button.set_disabled(!enabled);
            let _ = button.set_attribute("aria-busy", if enabled { "false" } else { "true" });
        }
    }

    fn show_progress(&self) {
        Self::replace_preview_with("p", "placeholder", PROGRESS_TEXT);
    }

    fn show_preview(&self, html: &str) {
        if let Some(preview) = Self::preview() {
            preview.set_inner_html(html);
        }
    }

    fn show_error(&self, message: &str) {
        Self::replace_preview_with("pre", "error", message);
    }

    fn set_stat(&self, slot: StatSlot, text: &str) {
        set_text(slot.element_id(), text);
    }
}

pub struct DomClipboard;

async fn write_async_clipboard(text: &str) -> Result<(), ExportError> {
    let window = web_sys::window().ok_or(ExportError::Unsupported)?;
    let navigator = window.navigator();
    // Absent outside secure contexts; calling through undefined would throw.
    let handle = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .map_err(|err| ExportError::Js(js_message(&err)))?;
    if handle.is_undefined() || handle.is_null() {
        return Err(ExportError::Unsupported);
    }
    let clipboard: web_sys::Clipboard = handle.unchecked_into();
    JsFuture::from(clipboard.write_text(text))
        .await
        .map(|_| ())
        .map_err(|_| ExportError::Rejected)
}

fn copy_with_selection(text: &str) -> Result<(), ExportError> {
    let doc = web_document().ok_or(ExportError::Unsupported)?;
    let body = doc.body().ok_or(ExportError::Unsupported)?;
    let area = doc
        .create_element("textarea")
        .map_err(|err| ExportError::Js(js_message(&err)))?
        .dyn_into::<HtmlTextAreaElement>()
        .map_err(|_| ExportError::Unsupported)?;
    area.set_value(text);
    let _ = area.set_attribute("readonly", "");
    let style = area.style();
    let _ = style.set_property("position", "fixed");
    let _ = style.set_property("left", "-9999px");
    let _ = style.set_property("opacity", "0");

    body.append_child(&area)
        .map_err(|err| ExportError::Js(js_message(&err)))?;
    area.select();
    let copied = doc
        .dyn_ref::<HtmlDocument>()
        .and_then(|html| html.exec_command("copy").ok())
        .unwrap_or(false);
    area.remove();

    if copied {
        Ok(())
    } else {
        Err(ExportError::Rejected)
    }
}

impl Clipboard for DomClipboard {
    fn write_text<'a>(&'a self, text: &'a str) -> LocalBoxFuture<'a, Result<(), ExportError>> {
        Box::pin(async move {
            match write_async_clipboard(text).await {
                Ok(()) => Ok(()),
                Err(_) => copy_with_selection(text),
            }
        })
    }
}

pub struct DomFileSaver;

impl FileSaver for DomFileSaver {
    fn save(&self, filename: &str, mime: &str, contents: &str) -> Result<(), ExportError> {
        let doc = web_document().ok_or(ExportError::Unsupported)?;
        let body = doc.body().ok_or(ExportError::Unsupported)?;

        let parts = js_sys::Array::of1(&JsValue::from_str(contents));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options)
            .map_err(|err| ExportError::Js(js_message(&err)))?;
        let href = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|err| ExportError::Js(js_message(&err)))?;

        let link = doc
            .create_element("a")
            .map_err(|err| ExportError::Js(js_message(&err)))?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| ExportError::Unsupported)?;
        link.set_href(&href);
        link.set_download(filename);
        let _ = link.style().set_property("display", "none");
        body.append_child(&link)
            .map_err(|err| ExportError::Js(js_message(&err)))?;
        link.click();
        link.remove();

        Timeout::new(0, move || {
            let _ = web_sys::Url::revoke_object_url(&href);
        })
        .forget();
        Ok(())
    }
}

pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerGuard {
        let timeout = Timeout::new(delay_ms, task);
        TimerGuard::new(move || drop(timeout))
    }
}

fn listen(id: &str, event: &str, handler: impl FnMut(web_sys::Event) + 'static) {
    let Some(node) = element(id) else {
        warn!("#{id} missing; {event} handler not installed");
        return;
    };
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    let _ = node.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
    callback.forget();
}

fn spawn_submit(session: &Rc<Session>) {
    let session = session.clone();
    spawn_local(async move {
        session.submit().await;
    });
}

/// Build the browser session, restore saved settings and wire the page events.
pub fn init_summarize_form() {
    if web_document().is_none() {
        return;
    }

    let session = Session::new(Platform {
        form: Box::new(DomForm),
        store: Box::new(LocalStore),
        transport: Box::new(FetchTransport),
        view: Box::new(DomView),
        clipboard: Box::new(DomClipboard),
        files: Box::new(DomFileSaver),
        scheduler: Rc::new(GlooScheduler),
    });
    session.restore();

    listen(FORM_ID, "submit", |event: web_sys::Event| {
        event.prevent_default();
    });

    {
        let session = session.clone();
        listen(TRIGGER_ID, "click", move |event: web_sys::Event| {
            event.prevent_default();
            spawn_submit(&session);
        });
    }

    {
        let session = session.clone();
        listen(
            Field::Url.element_id(),
            "keydown",
            move |event: web_sys::Event| {
                let is_enter = event
                    .dyn_ref::<KeyboardEvent>()
                    .map(|key| key.key() == "Enter")
                    .unwrap_or(false);
                if is_enter {
                    event.prevent_default();
                    spawn_submit(&session);
                }
            },
        );
    }

    for event_name in ["input", "change"] {
        let session = session.clone();
        listen(FORM_ID, event_name, move |_event: web_sys::Event| {
            session.schedule_autosave();
        });
    }

    {
        let session = session.clone();
        listen(COPY_ID, "click", move |event: web_sys::Event| {
            event.prevent_default();
            let session = session.clone();
            spawn_local(async move {
                session.copy_result().await;
            });
        });
    }

    listen(DOWNLOAD_ID, "click", move |event: web_sys::Event| {
        event.prevent_default();
        session.download_result();
    });

    if let Some(url) = element(Field::Url.element_id())
        .and_then(|node| node.dyn_into::<HtmlElement>().ok())
    {
        let _ = url.focus();
    }
}

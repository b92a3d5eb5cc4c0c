#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod export;
mod fields;
mod request;
mod schedule;
mod session;
mod settings;
mod storage;
mod view;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
use leptos::prelude::*;

#[cfg(target_arch = "wasm32")]
#[component]
fn App() -> impl IntoView {
    view! {
        <div
            id="leptos-runtime-marker"
            data-runtime="reko-frontend"
            style="display:none;"
        ></div>
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    console_error_panic_hook::set_once();
    logging::init_tracing();

    leptos::mount::mount_to_body(App);

    dom::init_summarize_form();
}

// The controller only runs in the browser; native builds exist for the test suite.
#[cfg(not(target_arch = "wasm32"))]
fn main() {}

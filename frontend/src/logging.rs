use tracing::debug;

/// Route `tracing` output to the browser console. A second call keeps the first subscriber.
pub fn init_tracing() {
    if let Err(err) = tracing_wasm::try_set_as_global_default() {
        debug!("tracing already initialised: {err}");
    }
}

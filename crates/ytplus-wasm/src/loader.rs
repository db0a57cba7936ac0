//! Loads the iframe API script once per page
//!
//! Callers queue a callback; it runs as soon as `window.YT.Player` exists.
//! The script tag is only injected when the page does not already carry one,
//! and any `onYouTubeIframeAPIReady` hook the page installed keeps firing.

use std::cell::{Cell, RefCell};

use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use ytplus_core::IFRAME_API_SRC;

use crate::bindings::api_available;

const READY_HOOK: &str = "onYouTubeIframeAPIReady";

type LoadCallback = Box<dyn FnOnce(Result<(), String>)>;

thread_local! {
    static PENDING: RefCell<Vec<LoadCallback>> = RefCell::new(Vec::new());
    static HOOK_INSTALLED: Cell<bool> = const { Cell::new(false) };
}

/// Run `callback` once the iframe API is available, or with the reason it failed to load
pub fn load_iframe_api(callback: impl FnOnce(Result<(), String>) + 'static) {
    if api_available() {
        callback(Ok(()));
        return;
    }

    PENDING.with(|pending| pending.borrow_mut().push(Box::new(callback)));

    if let Err(err) = inject_script() {
        warn!(error = %err, "Could not inject iframe API script");
        drain(Err(err));
        return;
    }
    install_ready_hook();
}

fn drain(result: Result<(), String>) {
    let callbacks = PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
    debug!(count = callbacks.len(), ok = result.is_ok(), "Iframe API settled");
    for callback in callbacks {
        callback(result.clone());
    }
}

fn inject_script() -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document".to_string())?;

    let selector = format!("script[src=\"{IFRAME_API_SRC}\"]");
    if document.query_selector(&selector).ok().flatten().is_some() {
        return Ok(());
    }

    let script: web_sys::HtmlScriptElement = document
        .create_element("script")
        .map_err(|e| crate::bindings::js_error_message(&e))?
        .unchecked_into();
    script.set_src(IFRAME_API_SRC);
    script.set_defer(true);

    let on_error = Closure::once_into_js(move || {
        drain(Err(format!("Failed to load {IFRAME_API_SRC}")));
    });
    script.set_onerror(Some(on_error.unchecked_ref()));

    let parent: web_sys::Node = match document.head() {
        Some(head) => head.into(),
        None => document
            .document_element()
            .ok_or_else(|| "no document element".to_string())?
            .into(),
    };
    parent
        .append_child(&script)
        .map_err(|e| crate::bindings::js_error_message(&e))?;

    debug!(src = IFRAME_API_SRC, "Injected iframe API script");
    Ok(())
}

fn install_ready_hook() {
    if HOOK_INSTALLED.with(Cell::get) {
        return;
    }
    let global = js_sys::global();
    let key = JsValue::from_str(READY_HOOK);
    let previous = js_sys::Reflect::get(&global, &key)
        .ok()
        .and_then(|value| value.dyn_into::<js_sys::Function>().ok());

    let hook = Closure::<dyn FnMut()>::new(move || {
        if let Some(previous) = &previous {
            if let Err(err) = previous.call0(&JsValue::NULL) {
                warn!(error = ?err, "Page onYouTubeIframeAPIReady hook threw");
            }
        }
        drain(Ok(()));
    });

    if js_sys::Reflect::set(&global, &key, hook.as_ref()).is_ok() {
        HOOK_INSTALLED.with(|installed| installed.set(true));
    }
    // The API calls the hook once; the page owns it afterwards
    hook.forget();
}

//! `setInterval` ticker

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use ytplus_core::Ticker;

use crate::player::{Inbound, Shared};

/// Filled in once the shared player state exists
pub(crate) type SharedSlot = Rc<RefCell<Weak<Shared>>>;

pub struct IntervalTicker {
    target: SharedSlot,
    handle: Option<i32>,
    callback: Option<Closure<dyn FnMut()>>,
}

impl IntervalTicker {
    pub(crate) fn new(target: SharedSlot) -> Self {
        Self {
            target,
            handle: None,
            callback: None,
        }
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, period: Duration) {
        self.stop();
        let Some(window) = web_sys::window() else {
            warn!("No window; time updates disabled");
            return;
        };

        let target = self.target.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            let shared = target.borrow().upgrade();
            if let Some(shared) = shared {
                shared.deliver(Inbound::Tick);
            }
        });

        let millis = i32::try_from(period.as_millis()).unwrap_or(i32::MAX);
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            millis,
        ) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.callback = Some(callback);
            }
            Err(err) => warn!(error = ?err, "setInterval failed"),
        }
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(handle);
            }
        }
        self.callback = None;
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

//! `setTimeout` scheduler and `window.location`

use std::time::Duration;

use futures::future::LocalBoxFuture;
use wasm_bindgen_futures::JsFuture;

use crate::runtime::Scheduler;
use crate::wallet::PageLocation;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
            }
        });
        Box::pin(async move {
            let _ = JsFuture::from(promise).await;
        })
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Current page path, recorded in the switch history.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowLocation;

impl PageLocation for WindowLocation {
    fn path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_string())
    }
}

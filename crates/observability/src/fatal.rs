//! Last-resort error reporting.
//!
//! Unrecoverable errors and panics end up here: they are logged and counted,
//! and session state is left alone.

use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct GlobalErrorHandler {
    reported: AtomicU64,
}

impl GlobalErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, error: &anyhow::Error) {
        let count = self.reported.fetch_add(1, Ordering::Relaxed) + 1;
        ::tracing::error!(
            error = %format!("{error:#}"),
            reported = count,
            "unhandled error"
        );
    }

    pub fn report_panic(&self, info: &PanicHookInfo<'_>) {
        let count = self.reported.fetch_add(1, Ordering::Relaxed) + 1;
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_default();

        ::tracing::error!(panic = %payload, %location, reported = count, "panic");
    }

    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}

/// Route panics through `handler`, then to the previously installed hook.
pub fn install_panic_hook(handler: Arc<GlobalErrorHandler>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        handler.report_panic(info);
        previous(info);
    }));
}

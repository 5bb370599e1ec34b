//! Panic recovery middleware.
//!
//! Wraps the rest of the chain in a fault boundary: a panic raised while
//! the inner service is polled is caught, logged with the request's
//! coordinates and a backtrace, and turned into a generic 500 response.
//! The panic never propagates past this stage.
//!
//! Stages below this one can register headers through [`RecoveryHeaders`]
//! before delegating; they are copied onto the 500 answered for a panic.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Once};

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;

use crate::context;
use crate::error::HttpwareError;

thread_local! {
    /// Backtrace of the most recent panic on this thread.
    static LAST_PANIC_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Chains a process-wide panic hook that records the panicking thread's
/// backtrace.
///
/// Once installed, every panic in the process pays for a backtrace capture,
/// not only panics inside requests. The previous hook still runs. Installed
/// at most once per process; the recovery middleware calls this itself, so
/// explicit calls are optional.
pub fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture();
            LAST_PANIC_BACKTRACE.with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(backtrace);
                }
            });
            previous(info);
        }));
    });
}

fn clear_panic_backtrace() {
    LAST_PANIC_BACKTRACE.with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            *slot = None;
        }
    });
}

/// The hook runs on the thread that unwinds, which is the thread that
/// catches the panic within the same poll. A panic re-raised with
/// `resume_unwind` skips the hook and gets a backtrace of this point.
fn take_panic_backtrace() -> Backtrace {
    LAST_PANIC_BACKTRACE
        .with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .unwrap_or_else(Backtrace::force_capture)
}

/// Renders a panic payload for logging.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Response headers to keep on the 500 answered for a recovered panic.
///
/// The recovery stage inserts one into the request extensions; downstream
/// stages that set response headers before delegating record them here.
#[derive(Debug, Clone, Default)]
pub struct RecoveryHeaders(Arc<Mutex<HeaderMap>>);

impl RecoveryHeaders {
    pub fn extend(&self, headers: &HeaderMap) {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        slot.extend(headers.clone());
    }

    fn take(&self) -> HeaderMap {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *slot)
    }
}

/// Middleware that converts handler panics into 500 responses.
///
/// # Logged Information
/// - error: the panic payload
/// - path, method, request_id
/// - stack: backtrace captured at the panic site
///
/// Must sit upstream of every stage that can panic.
pub async fn recover_middleware(mut request: Request, next: Next) -> Response {
    install_panic_hook();
    clear_panic_backtrace();

    let recovery_headers = RecoveryHeaders::default();
    request.extensions_mut().insert(recovery_headers.clone());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = context::get_request_id(request.extensions())
        .unwrap_or_default()
        .to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let backtrace = take_panic_backtrace();

            tracing::error!(
                error = %message,
                path = %path,
                method = %method,
                request_id = %request_id,
                stack = %backtrace,
                "panic recovered"
            );

            let mut response = HttpwareError::internal(message).into_response();
            response.headers_mut().extend(recovery_headers.take());
            response
        }
    }
}

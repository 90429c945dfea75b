//! Keyboard interception while the history menu is open.
//!
//! Native menu tracking swallows ordinary typing, so while the menu is open
//! a synchronous UI-thread keyboard handler is installed ahead of it. Each
//! event is classified (see [`classify`]): typing and delete are consumed
//! and turned into query edits, everything else falls through untouched so
//! arrow navigation, return and escape keep their native behavior.
//!
//! ## Lifecycle
//!
//! [`EventInterceptor::attach`] installs the handler through a [`KeyTap`]
//! and returns an [`InterceptorHandle`]. Dropping the handle (or passing it
//! to [`EventInterceptor::detach`]) removes the handler exactly once. Once
//! removed, a callback that was already queued by the platform sees the
//! handle's inert flag and passes the event through without classifying it.

mod classify;

pub use classify::{classify, ClassifyContext, Decision};

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use crate::error::Result;
use crate::keys::{KeyCode, KeyEvent};
use crate::logging;
use crate::query::QueryController;

/// Opaque identity of the native window the menu is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub usize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{:x}", self.0)
    }
}

/// What the native tap should do with the event it just delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapResponse {
    /// Suppress the event; native menu tracking never sees it.
    Consume,
    /// Continue normal dispatch with the event unmodified.
    PassThrough,
}

pub type TapCallback = Rc<dyn Fn(&KeyEvent) -> TapResponse>;

/// Identifies one installation inside a [`KeyTap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TapToken(pub u64);

/// Platform seam: a synchronous keyboard handler on the UI thread.
pub trait KeyTap {
    /// Install `callback` ahead of native key dispatch for `window`.
    ///
    /// `window` bounds the installation's lifetime, not its reach: the
    /// installation lives exactly as long as the menu session in `window`,
    /// and only one session is open at a time, so while installed the
    /// menu's window is the active context. Backends whose hook is
    /// application-wide (the Carbon dispatcher target) therefore do not
    /// filter events by window.
    ///
    /// Fails with `HistoryMenuError::HookInstall` when the platform has no
    /// event-dispatch target to attach to.
    fn install(&self, window: WindowId, callback: TapCallback) -> Result<TapToken>;

    /// Remove an installation. Unknown tokens are ignored.
    fn remove(&self, token: TapToken);
}

/// Answers "would the toolkit deliver this key to the search field itself?"
pub trait FocusSource {
    fn query_field_has_focus(&self) -> bool;
}

#[derive(Debug, Default)]
struct InterceptorStats {
    classified: Cell<u64>,
    consumed: Cell<u64>,
}

pub struct EventInterceptor {
    tap: Rc<dyn KeyTap>,
    controller: Rc<QueryController>,
    extra_reserved: Rc<[KeyCode]>,
    stats: Rc<InterceptorStats>,
}

impl EventInterceptor {
    pub fn new(
        tap: Rc<dyn KeyTap>,
        controller: Rc<QueryController>,
        extra_reserved: Vec<KeyCode>,
    ) -> Self {
        Self {
            tap,
            controller,
            extra_reserved: extra_reserved.into(),
            stats: Rc::new(InterceptorStats::default()),
        }
    }

    /// Install the keyboard handler for `window`.
    pub fn attach(
        &self,
        window: WindowId,
        focus: Rc<dyn FocusSource>,
    ) -> Result<InterceptorHandle> {
        let live = Rc::new(Cell::new(true));

        let callback: TapCallback = {
            let live = Rc::clone(&live);
            let controller = Rc::clone(&self.controller);
            let extra_reserved = Rc::clone(&self.extra_reserved);
            let stats = Rc::clone(&self.stats);
            Rc::new(move |event: &KeyEvent| {
                if !live.get() {
                    return TapResponse::PassThrough;
                }
                stats.classified.set(stats.classified.get() + 1);

                let ctx = ClassifyContext {
                    query_field_focused: focus.query_field_has_focus(),
                    extra_reserved: &extra_reserved,
                };
                let decision = classify(event, &ctx);
                logging::log_key_event(
                    &event.key.name(),
                    &event.modifiers.to_string(),
                    decision.label(),
                );

                match decision {
                    Decision::Consume(edit) => {
                        stats.consumed.set(stats.consumed.get() + 1);
                        controller.on_classified_event(edit);
                        TapResponse::Consume
                    }
                    Decision::PassThrough => TapResponse::PassThrough,
                }
            })
        };

        let token = self.tap.install(window, callback)?;
        info!(window = %window, token = token.0, "Keyboard interception attached");

        Ok(InterceptorHandle {
            tap: Rc::clone(&self.tap),
            token: Some(token),
            live,
            window,
        })
    }

    /// Remove the handler behind `handle`. `None` is a no-op.
    pub fn detach(handle: Option<InterceptorHandle>) {
        match handle {
            Some(handle) => handle.release(),
            None => debug!("Detach without an installed handler, nothing to do"),
        }
    }

    /// Number of events that reached classification so far.
    pub fn classified_count(&self) -> u64 {
        self.stats.classified.get()
    }

    /// Number of events consumed as query edits so far.
    pub fn consumed_count(&self) -> u64 {
        self.stats.consumed.get()
    }
}

/// Owned installation of the keyboard handler. Removing it happens in `Drop`,
/// so every exit path releases it exactly once.
pub struct InterceptorHandle {
    tap: Rc<dyn KeyTap>,
    token: Option<TapToken>,
    live: Rc<Cell<bool>>,
    window: WindowId,
}

impl InterceptorHandle {
    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for InterceptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorHandle")
            .field("token", &self.token)
            .field("window", &self.window)
            .finish()
    }
}

impl Drop for InterceptorHandle {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.live.set(false);
            self.tap.remove(token);
            info!(window = %self.window, token = token.0, "Keyboard interception detached");
        }
    }
}

#[cfg(test)]
#[path = "interceptor_tests.rs"]
mod tests;

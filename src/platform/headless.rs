//! Backends that need no window server.
//!
//! `HeadlessKeyTap` behaves like a native tap whose events are fed by the
//! host (`deliver`), which is what the smoke binary and the tests use.
//! `UnavailableKeyTap` models a platform with no event-dispatch target: every
//! install fails and the menu opens without interception.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::{HistoryMenuError, Result};
use crate::interceptor::{KeyTap, TapCallback, TapResponse, TapToken, WindowId};
use crate::keys::KeyEvent;

#[derive(Default)]
pub struct HeadlessKeyTap {
    installed: RefCell<BTreeMap<TapToken, (WindowId, TapCallback)>>,
    next_token: Cell<u64>,
    unavailable: Cell<bool>,
    installs: Cell<u64>,
    removals: Cell<u64>,
}

impl HeadlessKeyTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent installs fail as if no dispatch target existed.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Feed one key event through the installed handlers, newest first,
    /// the way a native dispatcher walks its handler chain. The first
    /// handler that consumes stops the walk.
    pub fn deliver(&self, event: &KeyEvent) -> TapResponse {
        let callbacks: Vec<TapCallback> = self
            .installed
            .borrow()
            .values()
            .rev()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            if callback(event) == TapResponse::Consume {
                return TapResponse::Consume;
            }
        }
        TapResponse::PassThrough
    }

    pub fn installed_count(&self) -> usize {
        self.installed.borrow().len()
    }

    pub fn is_installed_for(&self, window: WindowId) -> bool {
        self.installed.borrow().values().any(|(w, _)| *w == window)
    }

    pub fn install_count(&self) -> u64 {
        self.installs.get()
    }

    pub fn removal_count(&self) -> u64 {
        self.removals.get()
    }
}

impl KeyTap for HeadlessKeyTap {
    fn install(&self, window: WindowId, callback: TapCallback) -> Result<TapToken> {
        if self.unavailable.get() {
            return Err(HistoryMenuError::HookInstall(
                "event dispatch target unavailable".to_string(),
            ));
        }
        let token = TapToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.installed.borrow_mut().insert(token, (window, callback));
        self.installs.set(self.installs.get() + 1);
        Ok(token)
    }

    fn remove(&self, token: TapToken) {
        if self.installed.borrow_mut().remove(&token).is_some() {
            self.removals.set(self.removals.get() + 1);
        }
    }
}

#[derive(Debug, Default)]
pub struct UnavailableKeyTap;

impl KeyTap for UnavailableKeyTap {
    fn install(&self, _window: WindowId, _callback: TapCallback) -> Result<TapToken> {
        Err(HistoryMenuError::HookInstall(
            "no keyboard event dispatch target on this platform".to_string(),
        ))
    }

    fn remove(&self, _token: TapToken) {}
}

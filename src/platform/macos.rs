//! macOS backend.
//!
//! - [`CarbonKeyTap`]: a raw-key handler on the application event dispatcher.
//!   It is the only keyboard hook that still sees events while `NSMenu` runs
//!   its own tracking loop.
//! - [`MainQueueDispatcher`]: defers work onto the GCD main queue.
//! - [`NsMenu`]: `ItemSource` / `Highlighter` / `MenuSurface` over a live `NSMenu`.
//!
//! All of it is UI-thread only.

#![allow(non_upper_case_globals)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use cocoa::base::{id, nil, BOOL, NO, YES};
use objc::runtime::Class;
use objc::{msg_send, sel, sel_impl};
use tracing::{debug, warn};

use crate::dispatch::{DeferredTask, MainThreadDispatcher};
use crate::error::{HistoryMenuError, Result};
use crate::interceptor::{KeyTap, TapCallback, TapResponse, TapToken, WindowId};
use crate::keys::{KeyEvent, KeyEventKind, Modifiers};
use crate::logging;
use crate::menu::{Highlighter, ItemSource, MenuSurface, SearchAffordance};

// ============================================================================
// Carbon event manager
// ============================================================================

type OSStatus = i32;
type EventRef = *mut c_void;
type EventHandlerRef = *mut c_void;
type EventHandlerCallRef = *mut c_void;
type EventTargetRef = *mut c_void;
type EventHandlerProcPtr =
    extern "C" fn(EventHandlerCallRef, EventRef, *mut c_void) -> OSStatus;

#[repr(C)]
struct EventTypeSpec {
    event_class: u32,
    event_kind: u32,
}

const noErr: OSStatus = 0;
const eventNotHandledErr: OSStatus = -9874;

const kEventClassKeyboard: u32 = u32::from_be_bytes(*b"keyb");
const kEventRawKeyDown: u32 = 1;
const kEventRawKeyRepeat: u32 = 2;
const kEventRawKeyUp: u32 = 3;

const kEventParamKeyCode: u32 = u32::from_be_bytes(*b"kcod");
const kEventParamKeyModifiers: u32 = u32::from_be_bytes(*b"kmod");
const kEventParamKeyUnicodes: u32 = u32::from_be_bytes(*b"kuni");
const typeUInt32: u32 = u32::from_be_bytes(*b"magn");
const typeUnicodeText: u32 = u32::from_be_bytes(*b"utxt");

// Carbon modifier bits (Events.h)
const cmdKey: u32 = 0x0100;
const shiftKey: u32 = 0x0200;
const optionKey: u32 = 0x0800;
const controlKey: u32 = 0x1000;

#[link(name = "Carbon", kind = "framework")]
extern "C" {
    fn GetEventDispatcherTarget() -> EventTargetRef;
    fn InstallEventHandler(
        target: EventTargetRef,
        handler: EventHandlerProcPtr,
        num_types: u32,
        list: *const EventTypeSpec,
        user_data: *mut c_void,
        out_ref: *mut EventHandlerRef,
    ) -> OSStatus;
    fn RemoveEventHandler(handler: EventHandlerRef) -> OSStatus;
    fn GetEventKind(event: EventRef) -> u32;
    fn GetEventParameter(
        event: EventRef,
        name: u32,
        desired_type: u32,
        out_actual_type: *mut u32,
        buffer_size: usize,
        out_actual_size: *mut usize,
        out_data: *mut c_void,
    ) -> OSStatus;
}

fn modifiers_from_carbon(bits: u32) -> Modifiers {
    Modifiers {
        command: bits & cmdKey != 0,
        control: bits & controlKey != 0,
        option: bits & optionKey != 0,
        shift: bits & shiftKey != 0,
    }
}

/// # Safety
/// `event` must be a live Carbon keyboard event.
unsafe fn read_u32_param(event: EventRef, name: u32) -> Option<u32> {
    let mut value: u32 = 0;
    let status = GetEventParameter(
        event,
        name,
        typeUInt32,
        std::ptr::null_mut(),
        std::mem::size_of::<u32>(),
        std::ptr::null_mut(),
        &mut value as *mut u32 as *mut c_void,
    );
    (status == noErr).then_some(value)
}

/// # Safety
/// `event` must be a live Carbon keyboard event.
unsafe fn read_characters(event: EventRef) -> String {
    let mut units = [0u16; 8];
    let mut size: usize = 0;
    let status = GetEventParameter(
        event,
        kEventParamKeyUnicodes,
        typeUnicodeText,
        std::ptr::null_mut(),
        std::mem::size_of_val(&units),
        &mut size,
        units.as_mut_ptr() as *mut c_void,
    );
    if status != noErr {
        return String::new();
    }
    let count = (size / std::mem::size_of::<u16>()).min(units.len());
    String::from_utf16_lossy(&units[..count])
}

/// # Safety
/// `event` must be a live Carbon event.
unsafe fn key_event_from_carbon(event: EventRef) -> Option<KeyEvent> {
    let kind = match GetEventKind(event) {
        kEventRawKeyDown => KeyEventKind::KeyDown,
        kEventRawKeyRepeat => KeyEventKind::KeyRepeat,
        kEventRawKeyUp => KeyEventKind::KeyUp,
        _ => return None,
    };
    let code = read_u32_param(event, kEventParamKeyCode)?;
    let modifier_bits = read_u32_param(event, kEventParamKeyModifiers).unwrap_or(0);
    let modifiers = modifiers_from_carbon(modifier_bits);
    let characters = read_characters(event);
    Some(KeyEvent::from_virtual_keycode(
        code as u16,
        kind,
        modifiers,
        characters,
    ))
}

// SAFETY: Carbon calls this on the main thread while the app (or a menu's
// tracking loop) pumps events. `user_data` is the `TapCallback` boxed in
// `CarbonKeyTap::install` and stays valid until `RemoveEventHandler` returns.
// Panics must not unwind into Carbon.
extern "C" fn raw_key_handler(
    _call: EventHandlerCallRef,
    event: EventRef,
    user_data: *mut c_void,
) -> OSStatus {
    let result = catch_unwind(AssertUnwindSafe(|| {
        objc::rc::autoreleasepool(|| unsafe {
            if user_data.is_null() {
                return TapResponse::PassThrough;
            }
            match key_event_from_carbon(event) {
                Some(key_event) => invoke_installed(user_data as *const TapCallback, &key_event),
                None => TapResponse::PassThrough,
            }
        })
    }));

    match result {
        Ok(TapResponse::Consume) => noErr,
        Ok(TapResponse::PassThrough) => eventNotHandledErr,
        Err(_) => {
            logging::log_error("KEYTAP", "panic in keyboard handler", Some("event passed through"));
            eventNotHandledErr
        }
    }
}

/// Run the installed callback on `event`.
///
/// The callback may close the menu, which removes this installation and
/// frees the box behind `installed`; the local `Rc` keeps the closure alive
/// until it returns.
///
/// # Safety
/// `installed` must point at a live boxed `TapCallback`.
unsafe fn invoke_installed(installed: *const TapCallback, event: &KeyEvent) -> TapResponse {
    let callback: TapCallback = Rc::clone(&*installed);
    callback(event)
}

struct Installation {
    handler: EventHandlerRef,
    callback: *mut TapCallback,
    window: WindowId,
}

/// Keyboard tap on the Carbon application event dispatcher.
///
/// The dispatcher target is application-wide. While `NSMenu` tracks, the
/// menu's window is the only one receiving keys, so the window id is kept
/// for bookkeeping and logging only (see [`KeyTap::install`]).
#[derive(Default)]
pub struct CarbonKeyTap {
    installed: RefCell<BTreeMap<TapToken, Installation>>,
    next_token: Cell<u64>,
}

impl CarbonKeyTap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed_count(&self) -> usize {
        self.installed.borrow().len()
    }
}

impl KeyTap for CarbonKeyTap {
    fn install(&self, window: WindowId, callback: TapCallback) -> Result<TapToken> {
        debug_assert!(unsafe { libc::pthread_main_np() } != 0);

        let target = unsafe { GetEventDispatcherTarget() };
        if target.is_null() {
            return Err(HistoryMenuError::HookInstall(
                "GetEventDispatcherTarget returned null".to_string(),
            ));
        }

        let types = [
            EventTypeSpec {
                event_class: kEventClassKeyboard,
                event_kind: kEventRawKeyDown,
            },
            EventTypeSpec {
                event_class: kEventClassKeyboard,
                event_kind: kEventRawKeyRepeat,
            },
        ];
        let user_data = Box::into_raw(Box::new(callback));
        let mut handler: EventHandlerRef = std::ptr::null_mut();

        let status = unsafe {
            InstallEventHandler(
                target,
                raw_key_handler,
                types.len() as u32,
                types.as_ptr(),
                user_data as *mut c_void,
                &mut handler,
            )
        };
        if status != noErr || handler.is_null() {
            // SAFETY: Carbon never saw a handler referencing this pointer
            drop(unsafe { Box::from_raw(user_data) });
            return Err(HistoryMenuError::HookInstall(format!(
                "InstallEventHandler failed with status {}",
                status
            )));
        }

        let token = TapToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.installed.borrow_mut().insert(
            token,
            Installation {
                handler,
                callback: user_data,
                window,
            },
        );
        debug!(window = %window, token = token.0, "Carbon key handler installed");
        Ok(token)
    }

    fn remove(&self, token: TapToken) {
        let Some(installation) = self.installed.borrow_mut().remove(&token) else {
            return;
        };
        let status = unsafe { RemoveEventHandler(installation.handler) };
        if status != noErr {
            warn!(status, window = %installation.window, "RemoveEventHandler failed");
        }
        // SAFETY: the handler is gone, Carbon holds no more references
        drop(unsafe { Box::from_raw(installation.callback) });
    }
}

impl Drop for CarbonKeyTap {
    fn drop(&mut self) {
        let tokens: Vec<TapToken> = self.installed.borrow().keys().copied().collect();
        for token in tokens {
            self.remove(token);
        }
    }
}

// ============================================================================
// GCD main queue
// ============================================================================

mod gcd {
    use std::ffi::c_void;

    // dispatch_get_main_queue() is a macro over the _dispatch_main_q symbol
    #[link(name = "System", kind = "framework")]
    extern "C" {
        fn dispatch_async_f(
            queue: *const c_void,
            context: *mut c_void,
            work: extern "C" fn(*mut c_void),
        );
        #[link_name = "_dispatch_main_q"]
        static DISPATCH_MAIN_QUEUE: c_void;
    }

    /// Queue `task` on the main queue.
    ///
    /// # Safety
    /// Must be called on the main thread: the task is not `Send` and only
    /// ever runs on the thread that queued it.
    pub unsafe fn dispatch_to_main(task: Box<dyn FnOnce()>) {
        let raw = Box::into_raw(Box::new(task));

        extern "C" fn trampoline(context: *mut c_void) {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
                let task: Box<Box<dyn FnOnce()>> = Box::from_raw(context as *mut _);
                task();
            }));
        }

        let main_queue = &DISPATCH_MAIN_QUEUE as *const c_void;
        dispatch_async_f(main_queue, raw as *mut c_void, trampoline);
    }
}

/// Runs deferred work on the next main run-loop cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct MainQueueDispatcher;

impl MainThreadDispatcher for MainQueueDispatcher {
    fn dispatch_deferred(&self, task: DeferredTask) {
        if unsafe { libc::pthread_main_np() } == 0 {
            logging::log_error(
                "DISPATCH",
                "deferred task queued off the main thread",
                Some("task dropped"),
            );
            return;
        }
        // SAFETY: checked above that we are on the main thread
        unsafe { gcd::dispatch_to_main(task) };
    }
}

// ============================================================================
// NSMenu
// ============================================================================

/// Tag marking the search row so re-inserting it is a no-op.
const SEARCH_ITEM_TAG: isize = 0x5EA4C;

/// # Safety
/// `nsstring` must be an `NSString` or nil.
unsafe fn get_nsstring(nsstring: id) -> Option<String> {
    if nsstring == nil {
        return None;
    }
    let utf8: *const std::os::raw::c_char = msg_send![nsstring, UTF8String];
    if utf8.is_null() {
        return None;
    }
    std::ffi::CStr::from_ptr(utf8)
        .to_str()
        .ok()
        .map(|s| s.to_string())
}

/// # Safety
/// Main thread only. The result is autoreleased.
unsafe fn make_nsstring(s: &str) -> id {
    let Some(class) = Class::get("NSString") else {
        return nil;
    };
    let Ok(cstr) = std::ffi::CString::new(s) else {
        return nil;
    };
    msg_send![class, stringWithUTF8String: cstr.as_ptr()]
}

/// A live `NSMenu`. Retained for the wrapper's lifetime.
pub struct NsMenu {
    menu: id,
}

impl NsMenu {
    /// # Safety
    /// `menu` must be an `NSMenu` instance and the wrapper must only be
    /// used on the main thread.
    pub unsafe fn new(menu: id) -> Self {
        let _: id = msg_send![menu, retain];
        Self { menu }
    }

    fn item_at(&self, index: usize) -> Option<id> {
        if index >= self.item_count() {
            return None;
        }
        let item: id = unsafe { msg_send![self.menu, itemAtIndex: index as isize] };
        (item != nil).then_some(item)
    }

    fn has_search_row(&self) -> bool {
        let item: id = unsafe { msg_send![self.menu, itemWithTag: SEARCH_ITEM_TAG] };
        item != nil
    }
}

impl Drop for NsMenu {
    fn drop(&mut self) {
        let _: () = unsafe { msg_send![self.menu, release] };
    }
}

impl ItemSource for NsMenu {
    fn item_count(&self) -> usize {
        let count: isize = unsafe { msg_send![self.menu, numberOfItems] };
        count.max(0) as usize
    }

    fn item_title(&self, index: usize) -> Option<String> {
        let item = self.item_at(index)?;
        objc::rc::autoreleasepool(|| unsafe { get_nsstring(msg_send![item, title]) })
    }

    fn highlighted_index(&self) -> Option<usize> {
        let item: id = unsafe { msg_send![self.menu, highlightedItem] };
        if item == nil {
            return None;
        }
        let index: isize = unsafe { msg_send![self.menu, indexOfItem: item] };
        usize::try_from(index).ok()
    }

    fn perform_action(&self, index: usize) {
        if self.item_at(index).is_some() {
            let index = index as isize;
            let _: () = unsafe { msg_send![self.menu, performActionForItemAtIndex: index] };
        }
    }
}

impl Highlighter for NsMenu {
    fn highlight_item(&self, index: usize) -> bool {
        let Some(item) = self.item_at(index) else {
            return false;
        };
        // -[NSMenu highlightItem:] is private; check respondsToSelector first
        let responds: BOOL =
            unsafe { msg_send![self.menu, respondsToSelector: sel!(highlightItem:)] };
        if responds == NO {
            debug!("NSMenu does not respond to highlightItem:");
            return false;
        }
        let _: id = unsafe {
            msg_send![self.menu, performSelector: sel!(highlightItem:) withObject: item]
        };
        true
    }
}

impl MenuSurface for NsMenu {
    fn insert_search_affordance(&self, affordance: &SearchAffordance) {
        if self.has_search_row() {
            return;
        }
        let Some(item_class) = Class::get("NSMenuItem") else {
            logging::log_error("MENU", "NSMenuItem class unavailable", Some("search row"));
            return;
        };
        objc::rc::autoreleasepool(|| unsafe {
            let title = make_nsstring(affordance.title());
            let empty = make_nsstring("");
            let item: id = msg_send![item_class, alloc];
            let no_action = std::ptr::null::<c_void>();
            let item: id = msg_send![
                item,
                initWithTitle: title
                action: no_action
                keyEquivalent: empty
            ];
            let _: () = msg_send![item, setTag: SEARCH_ITEM_TAG];
            let enabled: BOOL = if affordance.is_enabled() { YES } else { NO };
            let _: () = msg_send![item, setEnabled: enabled];
            let _: () = msg_send![self.menu, insertItem: item atIndex: 0isize];
            let _: () = msg_send![item, release];

            let separator: id = msg_send![item_class, separatorItem];
            let _: () = msg_send![self.menu, insertItem: separator atIndex: 1isize];
        });
        debug!("Search row inserted into NSMenu");
    }

    fn cancel_tracking(&self) {
        let _: () = unsafe { msg_send![self.menu, cancelTracking] };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_char_codes() {
        assert_eq!(kEventClassKeyboard, 0x6B65_7962);
        assert_eq!(kEventParamKeyCode, 0x6B63_6F64);
        assert_eq!(typeUInt32, 0x6D61_676E);
    }

    #[test]
    fn test_carbon_modifier_bits() {
        assert_eq!(modifiers_from_carbon(0), Modifiers::none());
        assert_eq!(modifiers_from_carbon(cmdKey), Modifiers::command());
        let mods = modifiers_from_carbon(shiftKey | optionKey);
        assert!(mods.shift && mods.option);
        assert!(!mods.command && !mods.control);
        assert!(modifiers_from_carbon(controlKey).control);
    }

    #[test]
    fn test_callback_outlives_its_installation_being_freed() {
        let slot: Rc<Cell<*mut TapCallback>> = Rc::new(Cell::new(std::ptr::null_mut()));
        let calls = Rc::new(Cell::new(0u32));
        let callback: TapCallback = {
            let slot = slot.clone();
            let calls = calls.clone();
            Rc::new(move |_: &KeyEvent| {
                // What CarbonKeyTap::remove does when the menu closes mid-event
                let installed = slot.replace(std::ptr::null_mut());
                if !installed.is_null() {
                    drop(unsafe { Box::from_raw(installed) });
                }
                calls.set(calls.get() + 1);
                TapResponse::Consume
            })
        };
        let installed = Box::into_raw(Box::new(callback));
        slot.set(installed);

        let response = unsafe { invoke_installed(installed, &KeyEvent::character('a')) };
        assert_eq!(response, TapResponse::Consume);
        assert_eq!(calls.get(), 1);
        assert!(slot.get().is_null());
    }

    #[cfg(feature = "system-tests")]
    #[test]
    fn test_install_and_remove_on_dispatcher_target() {
        let tap = CarbonKeyTap::new();
        let token = tap
            .install(WindowId(1), Rc::new(|_: &KeyEvent| TapResponse::PassThrough))
            .expect("install should succeed on the main thread");
        assert_eq!(tap.installed_count(), 1);
        tap.remove(token);
        assert_eq!(tap.installed_count(), 0);
        tap.remove(token);
    }
}

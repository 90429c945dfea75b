//! Native backends behind the interceptor and menu seams.
//!
//! - `headless`: host-driven key tap, usable everywhere
//! - `macos`: Carbon keyboard handler, GCD main-queue dispatch, `NSMenu` wrapper

use std::rc::Rc;

use crate::interceptor::KeyTap;

pub mod headless;
#[cfg(target_os = "macos")]
pub mod macos;

/// The keyboard tap for the current platform. Platforms without one get a
/// tap whose installs always fail, so menus open without interception.
pub fn default_key_tap() -> Rc<dyn KeyTap> {
    #[cfg(target_os = "macos")]
    {
        Rc::new(macos::CarbonKeyTap::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        tracing::info!("No native keyboard tap on this platform, search typing disabled");
        Rc::new(headless::UnavailableKeyTap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_default_tap_without_native_backend_refuses_install() {
        use crate::error::HistoryMenuError;
        use crate::interceptor::{TapResponse, WindowId};
        use crate::keys::KeyEvent;

        let tap = default_key_tap();
        let err = tap
            .install(WindowId(1), Rc::new(|_: &KeyEvent| TapResponse::PassThrough))
            .unwrap_err();
        assert!(matches!(err, HistoryMenuError::HookInstall(_)));
    }
}

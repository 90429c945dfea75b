use super::*;
use crate::config::MenuConfig;
use crate::dispatch::DeferredQueue;
use crate::history_items::HistoryItems;
use crate::keys::{KeyCode, KeyEvent, Modifiers};
use crate::notifications::SEARCH_QUERY_UPDATED;
use crate::platform::headless::HeadlessKeyTap;

const WINDOW: WindowId = WindowId(0x7);

struct Fixture {
    env: Rc<AppEnvironment>,
    items: Rc<HistoryItems>,
    tap: Rc<HeadlessKeyTap>,
    queue: Rc<DeferredQueue>,
    menu: Rc<HistoryMenu>,
}

fn entries(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("clip {}", i)).collect()
}

fn fixture_with(config: MenuConfig, leading: Vec<String>, history: Vec<String>) -> Fixture {
    let env = AppEnvironment::new(config);
    let items = Rc::new(HistoryItems::new(leading, history));
    items.subscribe(&env);
    let tap = Rc::new(HeadlessKeyTap::new());
    let queue = Rc::new(DeferredQueue::new());
    let menu = HistoryMenu::new(
        env.clone(),
        MenuCollaborators {
            items: items.clone(),
            highlighter: items.clone(),
            surface: items.clone(),
            key_tap: tap.clone(),
            dispatcher: queue.clone(),
        },
    );
    Fixture {
        env,
        items,
        tap,
        queue,
        menu,
    }
}

fn fixture() -> Fixture {
    fixture_with(MenuConfig::default(), Vec::new(), entries(4))
}

fn type_text(tap: &HeadlessKeyTap, text: &str) {
    for c in text.chars() {
        tap.deliver(&KeyEvent::character(c));
    }
}

#[test]
fn test_starts_closed_without_back_reference() {
    let f = fixture();
    assert_eq!(f.menu.state(), OverlayState::Closed);
    assert!(f.env.history_menu().is_none());
    assert_eq!(f.menu.minimum_width(), 300.0);
}

#[test]
fn test_open_inserts_search_row_and_attaches() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);

    assert_eq!(f.menu.state(), OverlayState::Open);
    assert_eq!(f.menu.window(), Some(WINDOW));
    assert!(f.menu.is_intercepting());
    assert_eq!(f.menu.search_unavailable_reason(), None);
    assert!(f.items.has_search_row());
    assert!(f.tap.is_installed_for(WINDOW));

    let active = f.env.history_menu().unwrap();
    assert!(Rc::ptr_eq(&active, &f.menu));
}

#[test]
fn test_default_highlight_with_search_row() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    assert_eq!(f.menu.menu_will_display(), Some(3));
    assert_eq!(f.items.highlighted_index(), Some(3));
    assert_eq!(f.items.highlighted_title().as_deref(), Some("clip 2"));
}

#[test]
fn test_default_highlight_with_indicator_and_no_search() {
    let config = MenuConfig {
        enable_search_in_history_menu: false,
        indicate_paste_as_plain_text_modifier: true,
        ..MenuConfig::default()
    };
    let f = fixture_with(config, vec!["History".to_string()], entries(4));
    f.menu.menu_will_open(WINDOW);
    assert_eq!(f.menu.menu_will_display(), Some(3));
    assert_eq!(f.items.highlighted_title().as_deref(), Some("clip 3"));
}

#[test]
fn test_short_list_leaves_highlight_alone() {
    let f = fixture_with(MenuConfig::default(), Vec::new(), entries(1));
    f.menu.menu_will_open(WINDOW);
    assert_eq!(f.menu.menu_will_display(), None);
    assert_eq!(f.items.highlighted_index(), None);
}

#[test]
fn test_auto_highlight_can_be_disabled() {
    let config = MenuConfig {
        auto_highlight_second_history_item: false,
        ..MenuConfig::default()
    };
    let f = fixture_with(config, Vec::new(), entries(4));
    f.menu.menu_will_open(WINDOW);
    assert_eq!(f.menu.menu_will_display(), None);
}

#[test]
fn test_display_while_closed_does_nothing() {
    let f = fixture();
    assert_eq!(f.menu.menu_will_display(), None);
    assert_eq!(f.items.highlighted_index(), None);
}

#[test]
fn test_typing_filters_items() {
    let f = fixture_with(
        MenuConfig::default(),
        Vec::new(),
        vec!["hello world".into(), "cargo test".into(), "help".into()],
    );
    f.menu.menu_will_open(WINDOW);
    type_text(&f.tap, "hel");

    assert_eq!(f.menu.query(), "hel");
    assert_eq!(f.env.search_query(), "hel");
    let visible = f.items.visible_titles();
    assert_eq!(visible.len(), 2);
    assert!(!visible.contains(&"cargo test".to_string()));
}

#[test]
fn test_select_accepts_and_ends_tracking() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    f.menu.menu_will_display();

    assert!(f.menu.select());
    assert_eq!(f.items.accepted(), vec!["clip 2".to_string()]);
    assert_eq!(f.items.cancel_count(), 1);
}

#[test]
fn test_select_without_highlight_is_noop() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    assert!(!f.menu.select());
    assert!(f.items.accepted().is_empty());
    assert_eq!(f.items.cancel_count(), 0);
}

#[test]
fn test_select_while_closed_is_noop() {
    let f = fixture();
    f.items.highlight_item(0);
    assert!(!f.menu.select());
    assert!(f.items.accepted().is_empty());
}

#[test]
fn test_select_through_environment_back_reference() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    f.menu.menu_will_display();
    let active = f.env.history_menu().unwrap();
    assert!(active.select());
    assert_eq!(f.items.accepted().len(), 1);
}

#[test]
fn test_close_detaches_and_clears_on_next_cycle() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    type_text(&f.tap, "cl");

    f.menu.menu_did_close();
    assert_eq!(f.menu.state(), OverlayState::Closed);
    assert!(f.env.history_menu().is_none());
    assert_eq!(f.tap.installed_count(), 0);
    // Not yet: the field is still being torn down
    assert_eq!(f.menu.query(), "cl");

    assert_eq!(f.queue.run_pending(), 1);
    assert_eq!(f.menu.query(), "");
    assert_eq!(f.env.search_query(), "");
    assert_eq!(f.items.visible_titles().len(), 4);
}

#[test]
fn test_typing_after_close_does_not_edit_query() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    f.menu.menu_did_close();
    f.queue.run_pending();

    let response = f.tap.deliver(&KeyEvent::character('z'));
    assert_eq!(response, crate::interceptor::TapResponse::PassThrough);
    assert_eq!(f.menu.query(), "");
}

#[test]
fn test_reopen_before_deferred_clear_starts_empty() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    type_text(&f.tap, "abc");
    f.menu.menu_did_close();

    f.menu.menu_will_open(WINDOW);
    assert_eq!(f.menu.query(), "");

    // The queued clear must not wipe what is typed in the new session
    type_text(&f.tap, "x");
    f.queue.run_pending();
    assert_eq!(f.menu.query(), "x");
}

#[test]
fn test_clear_on_empty_query_is_silent() {
    let f = fixture();
    let posts = Rc::new(Cell::new(0));
    let p = posts.clone();
    f.env
        .notifications()
        .add_observer(SEARCH_QUERY_UPDATED, move || p.set(p.get() + 1));

    f.menu.menu_will_open(WINDOW);
    f.menu.menu_did_close();
    f.queue.run_pending();
    assert_eq!(posts.get(), 0);
}

#[test]
fn test_close_while_closed_is_noop() {
    let f = fixture();
    f.menu.menu_did_close();
    assert_eq!(f.queue.pending(), 0);
    assert_eq!(f.tap.removal_count(), 0);
}

#[test]
fn test_double_open_keeps_single_installation() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    f.menu.menu_will_open(WindowId(0x8));
    assert_eq!(f.menu.window(), Some(WINDOW));
    assert_eq!(f.tap.installed_count(), 1);
}

#[test]
fn test_hook_install_failure_degrades_to_plain_menu() {
    let f = fixture();
    f.tap.set_unavailable(true);
    f.menu.menu_will_open(WINDOW);

    assert_eq!(f.menu.state(), OverlayState::Open);
    assert!(!f.menu.is_intercepting());
    assert_eq!(
        f.menu.search_unavailable_reason().as_deref(),
        Some("Search is unavailable for this menu")
    );
    assert_eq!(f.menu.menu_will_display(), Some(3));

    f.menu.menu_did_close();
    assert_eq!(f.menu.state(), OverlayState::Closed);
    assert_eq!(f.tap.removal_count(), 0);
    assert_eq!(f.menu.search_unavailable_reason(), None);
}

#[test]
fn test_search_disabled_means_no_row_and_no_interception() {
    let config = MenuConfig {
        enable_search_in_history_menu: false,
        ..MenuConfig::default()
    };
    let f = fixture_with(config, Vec::new(), entries(4));
    assert!(f.menu.affordance().is_none());

    f.menu.menu_will_open(WINDOW);
    assert!(!f.items.has_search_row());
    assert!(!f.menu.is_intercepting());
    assert_eq!(f.tap.install_count(), 0);
    assert_eq!(f.menu.menu_will_display(), Some(2));
}

#[test]
fn test_focused_field_edits_go_through_text_did_change() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    let field = f.menu.affordance().unwrap().clone();
    field.set_focused(true);

    // The tap leaves keys alone while the field has focus
    type_text(&f.tap, "q");
    assert_eq!(f.menu.query(), "");
    field.text_did_change("q");
    assert_eq!(f.menu.query(), "q");

    // Arrow down hands control back to the menu, typing is captured again
    assert!(field.do_command(FieldCommand::MoveDown));
    type_text(&f.tap, "r");
    assert_eq!(f.menu.query(), "qr");
}

#[test]
fn test_close_unfocuses_field() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    let field = f.menu.affordance().unwrap().clone();
    field.set_focused(true);
    f.menu.menu_did_close();
    assert!(!field.is_focused());
}

#[test]
fn test_navigation_passes_through_while_open() {
    let f = fixture();
    f.menu.menu_will_open(WINDOW);
    for key in [KeyCode::ArrowDown, KeyCode::Escape, KeyCode::Return] {
        let response = f.tap.deliver(&KeyEvent::key_down(key, Modifiers::none()));
        assert_eq!(response, crate::interceptor::TapResponse::PassThrough);
    }
    assert_eq!(f.menu.interceptor().consumed_count(), 0);
}

#[test]
fn test_repeated_sessions_release_every_hook() {
    let f = fixture();
    for _ in 0..3 {
        f.menu.menu_will_open(WINDOW);
        type_text(&f.tap, "c");
        f.menu.menu_did_close();
        f.queue.run_pending();
    }
    assert_eq!(f.tap.install_count(), 3);
    assert_eq!(f.tap.removal_count(), 3);
    assert_eq!(f.tap.installed_count(), 0);
    assert!(f.items.has_search_row());
    assert_eq!(f.items.item_count(), 6);
}

#[test]
fn test_close_from_inside_a_consumed_key_event() {
    let f = fixture();
    let weak_env = Rc::downgrade(&f.env);
    f.env.notifications().add_observer(SEARCH_QUERY_UPDATED, move || {
        let active = weak_env.upgrade().and_then(|env| env.history_menu());
        if let Some(menu) = active {
            menu.menu_did_close();
        }
    });
    f.menu.menu_will_open(WINDOW);

    let response = f.tap.deliver(&KeyEvent::character('a'));
    assert_eq!(response, crate::interceptor::TapResponse::Consume);
    assert_eq!(f.menu.state(), OverlayState::Closed);
    assert_eq!(f.tap.installed_count(), 0);
    assert_eq!(f.menu.interceptor().consumed_count(), 1);

    // Later keys hit no installation at all
    let response = f.tap.deliver(&KeyEvent::character('b'));
    assert_eq!(response, crate::interceptor::TapResponse::PassThrough);
    f.queue.run_pending();
    assert_eq!(f.menu.query(), "");
}

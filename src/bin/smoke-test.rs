//! Smoke test binary for the history menu core
//!
//! Run with: cargo run --bin smoke-test
//! Run with a sample history file: cargo run --bin smoke-test -- history.txt
//!
//! Drives one scripted session against the headless backends:
//! 1. Open the menu and apply the default highlight
//! 2. Type a query, delete a character, type again
//! 3. Accept the highlighted row
//! 4. Close and let the deferred clear run

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};

use history_menu::config;
use history_menu::dispatch::DeferredQueue;
use history_menu::history_items::HistoryItems;
use history_menu::keys::{KeyCode, KeyEvent, Modifiers};
use history_menu::logging;
use history_menu::menu::ItemSource;
use history_menu::platform::headless::HeadlessKeyTap;
use history_menu::{AppEnvironment, HistoryMenu, MenuCollaborators, WindowId};

const SAMPLE_HISTORY: &[&str] = &[
    "git status",
    "cargo test --workspace",
    "https://docs.rs/tracing",
    "Clipboard history notes",
    "cargo clippy -- -D warnings",
];

fn load_history(path: Option<PathBuf>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading history from {}", path.display()))?;
            Ok(text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect())
        }
        None => Ok(SAMPLE_HISTORY.iter().map(|s| s.to_string()).collect()),
    }
}

fn report(step: &str, menu: &HistoryMenu, items: &HistoryItems) {
    logging::log("SMOKE", &format!("step {} state={:?}", step, menu.state()));
    println!(
        "   {:<10} state={:?} query={:?} rows={} highlighted={:?}",
        step,
        menu.state(),
        menu.query(),
        items.item_count(),
        items.highlighted_title()
    );
}

fn main() -> Result<()> {
    let _guard = logging::init();
    let history = load_history(std::env::args().nth(1).map(PathBuf::from))?;

    println!("=== History Menu Smoke Test ===\n");

    let config = config::load_config();
    println!("1. Config: {:?}\n", config);

    let env = AppEnvironment::new(config);
    let items = Rc::new(HistoryItems::new(vec!["History".to_string()], history));
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

    println!("2. Open");
    menu.menu_will_open(WindowId(1));
    menu.menu_will_display();
    report("open", &menu, &items);

    println!("3. Type");
    for c in "cargo".chars() {
        tap.deliver(&KeyEvent::character(c));
    }
    menu.menu_will_display();
    report("typed", &menu, &items);
    println!("   visible: {:?}", items.visible_titles());

    tap.deliver(&KeyEvent::key_down(KeyCode::Delete, Modifiers::none()));
    tap.deliver(&KeyEvent::character('o'));
    menu.menu_will_display();
    report("edited", &menu, &items);

    let copy = KeyEvent::character('c').with_modifiers(Modifiers::command());
    println!("   cmd+c -> {:?}", tap.deliver(&copy));

    println!("4. Select");
    let accepted = env
        .history_menu()
        .map(|active| active.select())
        .unwrap_or(false);
    println!("   accepted={} items={:?}", accepted, items.accepted());

    println!("5. Close");
    menu.menu_did_close();
    report("closed", &menu, &items);
    let ran = queue.run_pending();
    println!("   deferred tasks run: {}", ran);
    report("cleared", &menu, &items);

    println!(
        "\nInterceptor: {} classified, {} consumed",
        menu.interceptor().classified_count(),
        menu.interceptor().consumed_count()
    );
    println!(
        "\nRecent log lines ({} buffered, newest first):",
        logging::get_recent_logs().len()
    );
    for line in logging::get_last_logs(8) {
        println!("   {}", line);
    }
    println!("Log file: {}", logging::log_path().display());
    println!("\n=== Smoke Test Complete ===");
    Ok(())
}

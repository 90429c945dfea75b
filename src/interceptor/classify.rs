//! Consume / pass-through decision for one intercepted key event.
//!
//! Runs synchronously ahead of native dispatch for every keystroke while the
//! menu is open: no allocation-heavy work, no I/O, no locks.

use crate::keys::{KeyCode, KeyEvent, KeyEventKind};
use crate::query::QueryEdit;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Swallow the event and apply the edit to the query.
    Consume(QueryEdit),
    /// Let native handling see the event unmodified.
    PassThrough,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Consume(QueryEdit::Append(_)) => "consume:append",
            Decision::Consume(QueryEdit::DeleteLast) => "consume:delete",
            Decision::PassThrough => "pass-through",
        }
    }
}

/// State the decision depends on besides the event itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassifyContext<'a> {
    /// The search field is first responder; the toolkit will deliver the key there.
    pub query_field_focused: bool,
    /// Keys flagged as toolkit-reserved in the settings.
    pub extra_reserved: &'a [KeyCode],
}

pub fn classify(event: &KeyEvent, ctx: &ClassifyContext<'_>) -> Decision {
    if ctx.query_field_focused {
        return Decision::PassThrough;
    }

    // Held keys repeat: a held delete keeps erasing, a held letter keeps typing
    if event.kind == KeyEventKind::KeyUp {
        return Decision::PassThrough;
    }

    let key = event.key;
    if key.is_menu_navigation() || key.is_toolkit_reserved() || ctx.extra_reserved.contains(&key)
    {
        return Decision::PassThrough;
    }

    if key == KeyCode::Delete {
        return Decision::Consume(QueryEdit::DeleteLast);
    }

    if event.modifiers.is_shortcut_chord() {
        return Decision::PassThrough;
    }

    let mut chars = event.characters.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Decision::Consume(QueryEdit::Append(c)),
        _ => Decision::PassThrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Modifiers;

    fn plain(event: &KeyEvent) -> Decision {
        classify(event, &ClassifyContext::default())
    }

    #[test]
    fn test_single_character_is_appended() {
        assert_eq!(
            plain(&KeyEvent::character('a')),
            Decision::Consume(QueryEdit::Append('a'))
        );
        assert_eq!(
            plain(&KeyEvent::character(' ')),
            Decision::Consume(QueryEdit::Append(' '))
        );
    }

    #[test]
    fn test_shift_still_types() {
        let event = KeyEvent::character('A').with_modifiers(Modifiers::shift());
        assert_eq!(plain(&event), Decision::Consume(QueryEdit::Append('A')));
    }

    #[test]
    fn test_navigation_keys_pass_through_regardless_of_modifiers() {
        for key in [
            KeyCode::Return,
            KeyCode::KeypadEnter,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
        ] {
            for mods in [Modifiers::none(), Modifiers::command(), Modifiers::shift()] {
                let event = KeyEvent::key_down(key, mods);
                assert_eq!(plain(&event), Decision::PassThrough, "{:?}", key);
            }
        }
    }

    #[test]
    fn test_escape_and_tab_pass_through_even_with_character_text() {
        let escape = KeyEvent::new(
            KeyCode::Escape,
            KeyEventKind::KeyDown,
            Modifiers::none(),
            "\u{1b}",
        );
        assert_eq!(plain(&escape), Decision::PassThrough);

        let tab = KeyEvent::new(KeyCode::Tab, KeyEventKind::KeyDown, Modifiers::none(), "\t");
        assert_eq!(plain(&tab), Decision::PassThrough);
    }

    #[test]
    fn test_delete_is_consumed() {
        let event = KeyEvent::key_down(KeyCode::Delete, Modifiers::none());
        assert_eq!(plain(&event), Decision::Consume(QueryEdit::DeleteLast));
    }

    #[test]
    fn test_delete_with_modifier_is_still_consumed() {
        // delete is checked before the shortcut-chord rule
        let event = KeyEvent::key_down(KeyCode::Delete, Modifiers::option());
        assert_eq!(plain(&event), Decision::Consume(QueryEdit::DeleteLast));
    }

    #[test]
    fn test_shortcut_chords_pass_through() {
        for mods in [Modifiers::command(), Modifiers::control(), Modifiers::option()] {
            let event = KeyEvent::character('c').with_modifiers(mods);
            assert_eq!(plain(&event), Decision::PassThrough);
        }
    }

    #[test]
    fn test_key_up_passes_through() {
        let up = KeyEvent::character('a').with_kind(KeyEventKind::KeyUp);
        assert_eq!(plain(&up), Decision::PassThrough);
        let delete_up =
            KeyEvent::key_down(KeyCode::Delete, Modifiers::none()).with_kind(KeyEventKind::KeyUp);
        assert_eq!(plain(&delete_up), Decision::PassThrough);
    }

    #[test]
    fn test_repeats_edit_like_key_down() {
        let delete = KeyEvent::key_down(KeyCode::Delete, Modifiers::none())
            .with_kind(KeyEventKind::KeyRepeat);
        assert_eq!(plain(&delete), Decision::Consume(QueryEdit::DeleteLast));

        let letter = KeyEvent::character('a').with_kind(KeyEventKind::KeyRepeat);
        assert_eq!(plain(&letter), Decision::Consume(QueryEdit::Append('a')));

        let arrow = KeyEvent::key_down(KeyCode::ArrowDown, Modifiers::none())
            .with_kind(KeyEventKind::KeyRepeat);
        assert_eq!(plain(&arrow), Decision::PassThrough);
    }

    #[test]
    fn test_multi_or_empty_resolution_passes_through() {
        let dead_key = KeyEvent::new(
            KeyCode::Character,
            KeyEventKind::KeyDown,
            Modifiers::none(),
            "",
        );
        let composed = KeyEvent::new(
            KeyCode::Character,
            KeyEventKind::KeyDown,
            Modifiers::none(),
            "´e",
        );
        assert_eq!(plain(&dead_key), Decision::PassThrough);
        assert_eq!(plain(&composed), Decision::PassThrough);
    }

    #[test]
    fn test_focused_query_field_wins_over_everything() {
        let ctx = ClassifyContext {
            query_field_focused: true,
            extra_reserved: &[],
        };
        assert_eq!(
            classify(&KeyEvent::character('a'), &ctx),
            Decision::PassThrough
        );
        let delete = KeyEvent::key_down(KeyCode::Delete, Modifiers::none());
        assert_eq!(classify(&delete, &ctx), Decision::PassThrough);
    }

    #[test]
    fn test_configured_reserved_keys_pass_through() {
        let reserved = [KeyCode::Delete];
        let ctx = ClassifyContext {
            query_field_focused: false,
            extra_reserved: &reserved,
        };
        let delete = KeyEvent::key_down(KeyCode::Delete, Modifiers::none());
        assert_eq!(classify(&delete, &ctx), Decision::PassThrough);
    }

    #[test]
    fn test_decision_labels() {
        assert_eq!(Decision::PassThrough.label(), "pass-through");
        assert_eq!(
            Decision::Consume(QueryEdit::Append('x')).label(),
            "consume:append"
        );
        assert_eq!(
            Decision::Consume(QueryEdit::DeleteLast).label(),
            "consume:delete"
        );
    }
}

//! Centralized keyboard shortcuts registry.
//!
//! Single source of truth for the shortcuts of the console. The help dialog
//! renders from it and the app's key handling follows it.

use crossterm::event::KeyCode;

/// A keyboard shortcut definition
#[derive(Debug, Clone)]
pub struct Shortcut {
    /// Primary key for this shortcut
    pub key: KeyCode,
    /// Alternative key (e.g., arrow key variant)
    pub alt_key: Option<KeyCode>,
    /// Whether Ctrl must be held
    pub ctrl: bool,
    pub description: &'static str,
    /// Category for grouping in help
    pub category: ShortcutCategory,
    /// Context where this shortcut is active
    pub context: ShortcutContext,
}

/// Categories for organizing shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutCategory {
    General,
    Navigation,
    Actions,
}

/// Contexts where shortcuts are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutContext {
    /// Active anywhere on the dashboard
    Global,
    /// Active in record tables (devices, marketplace, users)
    List,
    /// Active while a wizard dialog is open
    Wizard,
}

impl ShortcutCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutCategory::General => "General",
            ShortcutCategory::Navigation => "Navigation",
            ShortcutCategory::Actions => "Actions",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [ShortcutCategory] {
        &[
            ShortcutCategory::General,
            ShortcutCategory::Navigation,
            ShortcutCategory::Actions,
        ]
    }
}

impl ShortcutContext {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutContext::Global => "Dashboard",
            ShortcutContext::List => "Tables",
            ShortcutContext::Wizard => "Wizards",
        }
    }

    /// All contexts in display order
    pub fn all() -> &'static [ShortcutContext] {
        &[
            ShortcutContext::Global,
            ShortcutContext::List,
            ShortcutContext::Wizard,
        ]
    }
}

impl Shortcut {
    /// Format key for display (e.g., "q", "Tab", "j/↓", "Ctrl+B")
    pub fn key_display(&self) -> String {
        let primary = if self.ctrl {
            format!("Ctrl+{}", format_keycode(&self.key).to_uppercase())
        } else {
            format_keycode(&self.key)
        };
        match &self.alt_key {
            Some(alt) => format!("{}/{}", primary, format_keycode(alt)),
            None => primary,
        }
    }

    /// Format key for help dialog (left-padded to 10 chars)
    pub fn key_display_padded(&self) -> String {
        format!("{:<10}", self.key_display())
    }
}

/// Format a KeyCode for display
fn format_keycode(key: &KeyCode) -> String {
    match key {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => format!("{:?}", key),
    }
}

const fn key(
    key: KeyCode,
    alt_key: Option<KeyCode>,
    description: &'static str,
    category: ShortcutCategory,
    context: ShortcutContext,
) -> Shortcut {
    Shortcut {
        key,
        alt_key,
        ctrl: false,
        description,
        category,
        context,
    }
}

/// Static registry of all keyboard shortcuts
pub static SHORTCUTS: &[Shortcut] = &[
    // === Dashboard ===
    key(KeyCode::Char('q'), None, "Quit", ShortcutCategory::General, ShortcutContext::Global),
    key(KeyCode::Char('?'), None, "Toggle help", ShortcutCategory::General, ShortcutContext::Global),
    key(
        KeyCode::Char('r'),
        None,
        "Reload data from the backend",
        ShortcutCategory::General,
        ShortcutContext::Global,
    ),
    key(
        KeyCode::Tab,
        Some(KeyCode::BackTab),
        "Next / previous section",
        ShortcutCategory::Navigation,
        ShortcutContext::Global,
    ),
    key(
        KeyCode::Char('1'),
        None,
        "Jump to section 1-5",
        ShortcutCategory::Navigation,
        ShortcutContext::Global,
    ),
    key(
        KeyCode::Char('S'),
        None,
        "Sign up a new organization",
        ShortcutCategory::Actions,
        ShortcutContext::Global,
    ),
    key(
        KeyCode::Char('F'),
        None,
        "Forgot password",
        ShortcutCategory::Actions,
        ShortcutContext::Global,
    ),
    key(
        KeyCode::Char('U'),
        None,
        "Submit a marketplace module",
        ShortcutCategory::Actions,
        ShortcutContext::Global,
    ),
    key(
        KeyCode::Char('A'),
        None,
        "Start / stop the REST API",
        ShortcutCategory::Actions,
        ShortcutContext::Global,
    ),
    // === Tables ===
    key(KeyCode::Char('j'), Some(KeyCode::Down), "Move down", ShortcutCategory::Navigation, ShortcutContext::List),
    key(KeyCode::Char('k'), Some(KeyCode::Up), "Move up", ShortcutCategory::Navigation, ShortcutContext::List),
    key(KeyCode::Char('n'), Some(KeyCode::PageDown), "Next page", ShortcutCategory::Navigation, ShortcutContext::List),
    key(KeyCode::Char('p'), Some(KeyCode::PageUp), "Previous page", ShortcutCategory::Navigation, ShortcutContext::List),
    key(KeyCode::Char('f'), None, "Cycle status filter", ShortcutCategory::Actions, ShortcutContext::List),
    key(KeyCode::Char('s'), None, "Sort by next column", ShortcutCategory::Actions, ShortcutContext::List),
    key(KeyCode::Char('o'), None, "Reverse sort order", ShortcutCategory::Actions, ShortcutContext::List),
    key(KeyCode::Char('/'), None, "Search (Enter/Esc to finish)", ShortcutCategory::Actions, ShortcutContext::List),
    key(KeyCode::Char(' '), None, "Select row", ShortcutCategory::Actions, ShortcutContext::List),
    key(KeyCode::Char('x'), None, "Select / clear page", ShortcutCategory::Actions, ShortcutContext::List),
    key(KeyCode::Char('c'), None, "Clear search", ShortcutCategory::Actions, ShortcutContext::List),
    // === Wizards ===
    key(
        KeyCode::Tab,
        Some(KeyCode::BackTab),
        "Next / previous field",
        ShortcutCategory::Navigation,
        ShortcutContext::Wizard,
    ),
    key(
        KeyCode::F(1),
        None,
        "Jump to a reached step (F1-F5)",
        ShortcutCategory::Navigation,
        ShortcutContext::Wizard,
    ),
    Shortcut {
        key: KeyCode::Char('b'),
        alt_key: None,
        ctrl: true,
        description: "Previous step",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::Wizard,
    },
    key(
        KeyCode::Enter,
        None,
        "Next step / submit",
        ShortcutCategory::Actions,
        ShortcutContext::Wizard,
    ),
    Shortcut {
        key: KeyCode::Char('r'),
        alt_key: None,
        ctrl: true,
        description: "Resend verification code",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::Wizard,
    },
    key(
        KeyCode::Esc,
        None,
        "Cancel wizard",
        ShortcutCategory::General,
        ShortcutContext::Wizard,
    ),
];

/// Get all shortcuts for a given context
pub fn shortcuts_for_context(context: ShortcutContext) -> impl Iterator<Item = &'static Shortcut> {
    SHORTCUTS.iter().filter(move |s| s.context == context)
}

/// Grouped shortcuts by category
pub type GroupedByCategory = Vec<(ShortcutCategory, Vec<&'static Shortcut>)>;

/// Get shortcuts grouped by category for a given context
pub fn shortcuts_by_category_for_context(context: ShortcutContext) -> GroupedByCategory {
    let mut result = Vec::new();
    for category in ShortcutCategory::all() {
        let shortcuts: Vec<&Shortcut> = shortcuts_for_context(context)
            .filter(|s| s.category == *category)
            .collect();
        if !shortcuts.is_empty() {
            result.push((*category, shortcuts));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shortcuts_have_descriptions() {
        for shortcut in SHORTCUTS {
            assert!(
                !shortcut.description.is_empty(),
                "Shortcut {:?} has empty description",
                shortcut.key
            );
        }
    }

    #[test]
    fn test_key_display_with_alt() {
        let shortcut = key(
            KeyCode::Char('j'),
            Some(KeyCode::Down),
            "Test",
            ShortcutCategory::Navigation,
            ShortcutContext::List,
        );
        assert_eq!(shortcut.key_display(), "j/↓");
    }

    #[test]
    fn test_ctrl_shortcuts_display_modifier() {
        let back = shortcuts_for_context(ShortcutContext::Wizard)
            .find(|s| s.ctrl && s.key == KeyCode::Char('b'))
            .unwrap();
        assert_eq!(back.key_display(), "Ctrl+B");
    }

    #[test]
    fn test_key_display_special_keys() {
        assert_eq!(format_keycode(&KeyCode::Char(' ')), "Space");
        assert_eq!(format_keycode(&KeyCode::BackTab), "Shift+Tab");
        assert_eq!(format_keycode(&KeyCode::F(3)), "F3");
    }

    #[test]
    fn test_no_duplicate_keys_within_a_context() {
        for context in ShortcutContext::all() {
            let mut seen = Vec::new();
            for s in shortcuts_for_context(*context) {
                let entry = (s.key, s.ctrl);
                assert!(!seen.contains(&entry), "duplicate {:?} in {:?}", s.key, context);
                seen.push(entry);
            }
        }
    }

    #[test]
    fn test_every_context_has_shortcuts() {
        for context in ShortcutContext::all() {
            assert!(!shortcuts_by_category_for_context(*context).is_empty());
        }
    }
}

//! Form field widgets for wizard steps.
//!
//! Widgets hold editing state only. Every edit is reported back so the
//! wizard stays the single owner of field values.

use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::wizard::{FieldKind, FieldSpec, StepSchema};

/// Rows shown for a choice list before it scrolls
const CHOICE_ROWS: u16 = 6;
const TEXTAREA_ROWS: u16 = 5;

/// Byte offset of the `cursor`-th character
fn byte_index(value: &str, cursor: usize) -> usize {
    value
        .char_indices()
        .nth(cursor)
        .map_or(value.len(), |(i, _)| i)
}

/// A single input widget
pub enum FormField {
    /// Single-line text input, optionally masked
    TextInput {
        value: String,
        cursor_pos: usize,
        placeholder: String,
        secret: bool,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
    /// One of a fixed list of `(value, label)` options
    Choice {
        options: Vec<(String, String)>,
        selected: Option<usize>,
        list_state: ListState,
    },
}

impl FormField {
    /// Create the widget for a field spec, pre-filled with `initial`
    pub fn from_spec(spec: &FieldSpec, initial: &str) -> Self {
        let placeholder = spec.placeholder.unwrap_or_default().to_string();
        match &spec.kind {
            FieldKind::Text | FieldKind::Secret => FormField::TextInput {
                value: initial.to_string(),
                cursor_pos: initial.chars().count(),
                placeholder,
                secret: spec.kind == FieldKind::Secret,
            },
            FieldKind::Multiline => {
                let mut textarea = TextArea::default();
                textarea.insert_str(initial);
                FormField::TextArea {
                    textarea: Box::new(textarea),
                    placeholder,
                }
            }
            FieldKind::Choice(options) => {
                let selected = options.iter().position(|(v, _)| v == initial);
                let mut list_state = ListState::default();
                list_state.select(selected);
                FormField::Choice {
                    options: options.clone(),
                    selected,
                    list_state,
                }
            }
        }
    }

    /// Current value as entered
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. } => value.clone(),
            FormField::TextArea { textarea, .. } => textarea.lines().join("\n"),
            FormField::Choice {
                options, selected, ..
            } => selected
                .and_then(|i| options.get(i))
                .map(|(v, _)| v.clone())
                .unwrap_or_default(),
        }
    }

    /// Handle a key event, returns true if the value changed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => match key.code {
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    value.insert(byte_index(value, *cursor_pos), c);
                    *cursor_pos += 1;
                    true
                }
                KeyCode::Backspace if *cursor_pos > 0 => {
                    *cursor_pos -= 1;
                    value.remove(byte_index(value, *cursor_pos));
                    true
                }
                KeyCode::Delete if *cursor_pos < value.chars().count() => {
                    value.remove(byte_index(value, *cursor_pos));
                    true
                }
                KeyCode::Left => {
                    *cursor_pos = cursor_pos.saturating_sub(1);
                    false
                }
                KeyCode::Right => {
                    *cursor_pos = (*cursor_pos + 1).min(value.chars().count());
                    false
                }
                KeyCode::Home => {
                    *cursor_pos = 0;
                    false
                }
                KeyCode::End => {
                    *cursor_pos = value.chars().count();
                    false
                }
                _ => false,
            },
            FormField::TextArea { textarea, .. } => textarea.input(key),
            FormField::Choice {
                options,
                selected,
                list_state,
            } => {
                if options.is_empty() {
                    return false;
                }
                let last = options.len() - 1;
                let next = match (key.code, *selected) {
                    (KeyCode::Up | KeyCode::Char('k'), Some(i)) => i.saturating_sub(1),
                    (KeyCode::Down | KeyCode::Char('j'), Some(i)) => (i + 1).min(last),
                    (KeyCode::Up | KeyCode::Down | KeyCode::Char('j' | 'k'), None) => 0,
                    _ => return false,
                };
                let changed = *selected != Some(next);
                *selected = Some(next);
                list_state.select(Some(next));
                changed
            }
        }
    }

    /// Rows needed to render this widget
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } => 1,
            FormField::TextArea { .. } => TEXTAREA_ROWS,
            FormField::Choice { options, .. } => (options.len() as u16).clamp(1, CHOICE_ROWS),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let border_color = if focused { Color::Cyan } else { Color::Gray };

        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                secret,
            } => {
                let mut text: String = if *secret {
                    "•".repeat(value.chars().count())
                } else {
                    value.clone()
                };
                if focused {
                    text.insert(byte_index(&text, *cursor_pos), '|');
                }

                let content = if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    Line::from(text)
                };

                let para = Paragraph::new(content).style(Style::default().fg(if focused {
                    Color::White
                } else {
                    Color::Gray
                }));
                frame.render_widget(para, area);
            }
            FormField::TextArea {
                textarea,
                placeholder,
            } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::LEFT)
                        .border_style(Style::default().fg(border_color)),
                );
                textarea.set_placeholder_text(placeholder.clone());
                textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));

                frame.render_widget(&**textarea, area);
            }
            FormField::Choice {
                options,
                selected,
                list_state,
            } => {
                let items: Vec<ListItem> = options
                    .iter()
                    .enumerate()
                    .map(|(i, (_, label))| {
                        let style = if Some(i) == *selected {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::Gray)
                        };
                        ListItem::new(Span::styled(label.clone(), style))
                    })
                    .collect();

                let highlight = if focused {
                    Style::default()
                        .add_modifier(Modifier::REVERSED)
                        .fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                let list = List::new(items)
                    .highlight_style(highlight)
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list, area, list_state);
            }
        }
    }
}

/// The inputs of one wizard step
pub struct StepForm {
    specs: Vec<FieldSpec>,
    fields: Vec<FormField>,
    focused: usize,
}

impl StepForm {
    /// Build the widgets for `schema`, reading initial values from `value_of`
    pub fn new<'a>(schema: &StepSchema, value_of: impl Fn(&str) -> &'a str) -> Self {
        let specs = schema.fields.clone();
        let fields = specs
            .iter()
            .map(|spec| FormField::from_spec(spec, value_of(spec.name)))
            .collect();
        Self {
            specs,
            fields,
            focused: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn focused_name(&self) -> Option<&'static str> {
        self.specs.get(self.focused).map(|s| s.name)
    }

    /// Focus a field by name, used to jump to the first error
    pub fn focus(&mut self, name: &str) {
        if let Some(i) = self.specs.iter().position(|s| s.name == name) {
            self.focused = i;
        }
    }

    /// Whether the focused widget uses the arrow keys itself
    pub fn captures_arrows(&self) -> bool {
        matches!(
            self.fields.get(self.focused),
            Some(FormField::Choice { .. } | FormField::TextArea { .. })
        )
    }

    pub fn next_field(&mut self) {
        if !self.specs.is_empty() {
            self.focused = (self.focused + 1) % self.specs.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.specs.is_empty() {
            self.focused = (self.focused + self.specs.len() - 1) % self.specs.len();
        }
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .and_then(|i| self.fields.get(i))
            .map(FormField::value)
    }

    /// Route a key to the focused widget. Returns the field name and new
    /// value when the value changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<(&'static str, String)> {
        let spec = self.specs.get(self.focused)?;
        let field = self.fields.get_mut(self.focused)?;
        if field.handle_key(key) {
            Some((spec.name, field.value()))
        } else {
            None
        }
    }

    /// Rows needed to render every field with its label and error line
    pub fn render_height(&self) -> u16 {
        self.fields.iter().map(|f| f.render_height() + 2).sum()
    }

    /// Render label, input and inline error for every field
    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        errors: &BTreeMap<String, String>,
        enabled: bool,
    ) {
        let constraints: Vec<Constraint> = self
            .fields
            .iter()
            .flat_map(|f| {
                [
                    Constraint::Length(1),
                    Constraint::Length(f.render_height()),
                    Constraint::Length(1),
                ]
            })
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (i, (spec, field)) in self.specs.iter().zip(self.fields.iter_mut()).enumerate() {
            let focused = enabled && i == self.focused;
            let marker = if spec.is_required() { " *" } else { "" };
            let label_style = if focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(spec.label, label_style),
                    Span::styled(marker, Style::default().fg(Color::DarkGray)),
                ])),
                rows[i * 3],
            );

            field.render(frame, rows[i * 3 + 1], focused);

            if let Some(message) = errors.get(spec.name) {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        message.as_str(),
                        Style::default().fg(Color::Red),
                    )),
                    rows[i * 3 + 2],
                );
            }
        }
    }
}

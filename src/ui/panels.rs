use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::icons::{icon, Icon};
use crate::rest::RestApiStatus;
use crate::types::{StatusTag, Tone};
use crate::ui::dashboard::Section;

/// Terminal color for a status tone
pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::Green,
        Tone::Neutral => Color::Gray,
        Tone::Warning => Color::Yellow,
        Tone::Critical => Color::Red,
    }
}

/// Terminal color for a named icon color
pub fn named_color(name: &str) -> Color {
    match name {
        "blue" => Color::Blue,
        "cyan" => Color::Cyan,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "magenta" => Color::Magenta,
        "red" => Color::Red,
        "white" => Color::White,
        _ => Color::Gray,
    }
}

pub fn icon_span(icon: Icon) -> Span<'static> {
    Span::styled(
        format!("{} ", icon.glyph),
        Style::default().fg(named_color(icon.color)),
    )
}

/// Status label colored by its tone
pub fn status_span<T: StatusTag>(status: T) -> Span<'static> {
    Span::styled(status.label(), Style::default().fg(tone_color(status.tone())))
}

/// Transient message shown in the status bar
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub tone: Tone,
    pub shown_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            shown_at: Instant::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Neutral)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Positive)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Critical)
    }

    pub fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= ttl
    }
}

pub struct StatusBar<'a> {
    pub notice: Option<&'a Notice>,
    pub api_status: &'a RestApiStatus,
    pub loading: bool,
}

impl StatusBar<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let api_color = match self.api_status {
            RestApiStatus::Running { .. } => Color::Green,
            RestApiStatus::Error(_) => Color::Red,
            _ => Color::DarkGray,
        };
        let mut spans = vec![Span::styled(
            format!(" {}", self.api_status.label()),
            Style::default().fg(api_color),
        )];

        if self.loading {
            spans.push(Span::styled("  loading…", Style::default().fg(Color::Yellow)));
        }

        match self.notice {
            Some(notice) => spans.push(Span::styled(
                format!("  {}", notice.text),
                Style::default()
                    .fg(tone_color(notice.tone))
                    .add_modifier(Modifier::BOLD),
            )),
            None => spans.push(Span::styled(
                "  [Tab]Section [S]ignup [F]orgot password [U]pload [A]PI [r]efresh [?]Help [q]uit",
                Style::default().fg(Color::DarkGray),
            )),
        }

        let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::TOP));
        frame.render_widget(bar, area);
    }
}

pub struct HeaderBar {
    pub version: &'static str,
    pub active: Section,
}

impl HeaderBar {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                " Smart Sensor Flow",
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" v{}", self.version),
                Style::default().fg(Color::Gray),
            ),
            Span::styled("  │ ", Style::default().fg(Color::DarkGray)),
        ];

        for (i, section) in Section::all().iter().enumerate() {
            let style = if *section == self.active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::raw(" "));
            spans.push(icon_span(icon(section.icon_key())));
            spans.push(Span::styled(format!("{} {}", i + 1, section.label()), style));
            spans.push(Span::raw(" "));
        }

        let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(bar, area);
    }
}

//! Wizard dialog: renders a [`Wizard`] and runs its submissions off the
//! event loop.
//!
//! Submissions are spawned as tokio tasks and their results come back over
//! an mpsc channel that [`WizardPane::poll`] drains on every tick. Closing
//! the dialog aborts the task; a result that still arrives is stale and the
//! wizard ignores it.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ui::dialogs::centered_rect;
use crate::ui::form_field::StepForm;
use crate::ui::panels::Notice;
use crate::wizard::{
    FieldKind, Flow, PendingSubmission, SubmissionResult, Wizard, WizardError, WizardStep,
};

/// What the app should do after a key went to the wizard
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    None,
    Close,
    Notify(Notice),
}

/// Object-safe face of a [`WizardDialog`], so the app can hold any flow
pub trait WizardPane {
    fn title(&self) -> &'static str;

    fn handle_key(&mut self, key: KeyEvent) -> WizardAction;

    /// Apply finished submissions. Returns a notice to show, if any.
    fn poll(&mut self) -> Option<Notice>;

    fn render(&mut self, frame: &mut Frame, area: Rect);

    /// Abort any in-flight submission
    fn close(&mut self);

    fn is_finished(&self) -> bool;
}

pub struct WizardDialog<F: Flow> {
    wizard: Wizard<F>,
    form: StepForm,
    form_step: F::Step,
    results_tx: mpsc::UnboundedSender<SubmissionResult<F::Step>>,
    results_rx: mpsc::UnboundedReceiver<SubmissionResult<F::Step>>,
    task: Option<JoinHandle<()>>,
}

impl<F: Flow> WizardDialog<F> {
    pub fn new(flow: F) -> Self {
        let wizard = Wizard::new(flow);
        let form = StepForm::new(&wizard.schema(), |name| wizard.field(name));
        let form_step = wizard.current();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            wizard,
            form,
            form_step,
            results_tx,
            results_rx,
            task: None,
        }
    }

    pub fn wizard(&self) -> &Wizard<F> {
        &self.wizard
    }

    /// Rebuild the inputs when the wizard moved to another step
    fn sync_form(&mut self) {
        if self.wizard.current() != self.form_step {
            self.form = StepForm::new(&self.wizard.schema(), |name| self.wizard.field(name));
            self.form_step = self.wizard.current();
        }
    }

    fn spawn(&mut self, pending: PendingSubmission<F>) {
        let tx = self.results_tx.clone();
        self.task = Some(tokio::spawn(async move {
            let result = pending.run().await;
            // The receiver is gone once the dialog closed
            let _ = tx.send(result);
        }));
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn submit(&mut self) -> WizardAction {
        match self.wizard.begin_submit() {
            Ok(pending) => {
                self.spawn(pending);
                WizardAction::None
            }
            Err(WizardError::Invalid(report)) => {
                if let Some(name) = report.errors().keys().next() {
                    self.form.focus(name);
                }
                WizardAction::None
            }
            Err(WizardError::InFlight) => WizardAction::None,
            Err(err) => WizardAction::Notify(Notice::error(err.to_string())),
        }
    }

    fn resend(&mut self) -> WizardAction {
        match self.wizard.begin_resend() {
            Ok(pending) => {
                self.spawn(pending);
                WizardAction::None
            }
            Err(WizardError::Unsupported) => WizardAction::None,
            Err(err) => WizardAction::Notify(Notice::info(err.to_string())),
        }
    }

    fn back(&mut self) {
        if self.wizard.back() {
            self.abort_task();
            self.sync_form();
        }
    }

    fn jump(&mut self, index: usize) -> WizardAction {
        let Some(step) = F::Step::sequence().get(index).copied() else {
            return WizardAction::None;
        };
        match self.wizard.jump_to(step) {
            Ok(true) => {
                self.abort_task();
                self.sync_form();
                WizardAction::None
            }
            Ok(false) => WizardAction::None,
            Err(err) => WizardAction::Notify(Notice::info(err.to_string())),
        }
    }
}

impl<F: Flow> WizardPane for WizardDialog<F> {
    fn title(&self) -> &'static str {
        self.wizard.title()
    }

    fn handle_key(&mut self, key: KeyEvent) -> WizardAction {
        if key.code == KeyCode::Esc {
            self.close();
            return WizardAction::Close;
        }
        if self.wizard.is_finished() {
            return match key.code {
                KeyCode::Enter => WizardAction::Close,
                _ => WizardAction::None,
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('b') if ctrl => {
                self.back();
                WizardAction::None
            }
            KeyCode::Char('r') if ctrl => self.resend(),
            KeyCode::F(n) if n >= 1 => self.jump(usize::from(n - 1)),
            KeyCode::Enter => self.submit(),
            _ if self.wizard.is_submitting() => WizardAction::None,
            KeyCode::Tab => {
                self.form.next_field();
                WizardAction::None
            }
            KeyCode::BackTab => {
                self.form.prev_field();
                WizardAction::None
            }
            KeyCode::Down if !self.form.captures_arrows() => {
                self.form.next_field();
                WizardAction::None
            }
            KeyCode::Up if !self.form.captures_arrows() => {
                self.form.prev_field();
                WizardAction::None
            }
            _ => {
                if let Some((name, value)) = self.form.handle_key(key) {
                    self.wizard.update_field(name, value);
                }
                WizardAction::None
            }
        }
    }

    fn poll(&mut self) -> Option<Notice> {
        let mut notice = None;
        while let Ok(result) = self.results_rx.try_recv() {
            match self.wizard.finish_submit(result) {
                Ok(true) => {
                    self.task = None;
                    self.sync_form();
                    if let Some(text) = self.wizard.take_notice() {
                        notice = Some(Notice::success(text));
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    self.task = None;
                    if let Some(name) = self.wizard.stepper().errors().keys().next() {
                        self.form.focus(name);
                    }
                    notice = Some(Notice::error(err.to_string()));
                }
            }
        }
        notice
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        render_wizard(frame, area, &self.wizard, &mut self.form, Instant::now());
    }

    fn close(&mut self) {
        if self.wizard.is_submitting() {
            tracing::debug!(flow = self.wizard.title(), "aborting in-flight submission");
        }
        self.abort_task();
    }

    fn is_finished(&self) -> bool {
        self.wizard.is_finished()
    }
}

impl<F: Flow> Drop for WizardDialog<F> {
    fn drop(&mut self) {
        self.abort_task();
    }
}

/// Step labels with done, current and pending markers
fn progress_line<F: Flow>(wizard: &Wizard<F>) -> Line<'static> {
    let current = wizard.current();
    let mut spans = Vec::new();
    for (i, step) in F::Step::sequence().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ─ ", Style::default().fg(Color::DarkGray)));
        }
        let (marker, style) = if *step == current {
            (
                "●",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else if *step < current || *step <= wizard.furthest() {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("○", Style::default().fg(Color::DarkGray))
        };
        spans.push(Span::styled(format!("{} {}", marker, step.label()), style));
    }
    Line::from(spans)
}

/// Values entered on earlier steps, secrets masked
fn review_lines<F: Flow>(wizard: &Wizard<F>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for step in F::Step::sequence()
        .iter()
        .copied()
        .filter(|s| *s < wizard.current())
    {
        let schema = wizard.flow().schema(step);
        if schema.fields.is_empty() {
            continue;
        }
        lines.push(Line::from(Span::styled(
            step.label(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for spec in &schema.fields {
            let raw = wizard.stepper().field(step, spec.name).unwrap_or("");
            let shown = match &spec.kind {
                FieldKind::Secret => "•".repeat(raw.chars().count()),
                FieldKind::Choice(options) => options
                    .iter()
                    .find(|(v, _)| v == raw)
                    .map_or_else(|| raw.to_string(), |(_, label)| label.clone()),
                _ => raw.replace('\n', " "),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", spec.label), Style::default().fg(Color::Gray)),
                Span::raw(if shown.is_empty() { "—".to_string() } else { shown }),
            ]));
        }
    }
    lines
}

/// Draw the wizard as a centered dialog.
///
/// Reads wizard state only; the form widgets carry nothing but editing state.
pub fn render_wizard<F: Flow>(
    frame: &mut Frame,
    area: Rect,
    wizard: &Wizard<F>,
    form: &mut StepForm,
    now: Instant,
) {
    let dialog = centered_rect(70, 85, area);
    frame.render_widget(Clear, dialog);

    let (position, total) = wizard.stepper().position();
    let block = Block::default()
        .title(format!(" {} ", wizard.title()))
        .title_bottom(format!(" Step {} of {} ", position, total))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // progress
            Constraint::Min(3),    // body
            Constraint::Length(1), // failure
            Constraint::Length(1), // controls
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(progress_line(wizard)), chunks[0]);

    let submitting = wizard.is_submitting();
    if wizard.is_finished() {
        let mut lines = vec![Line::from(Span::styled(
            "✓ All done",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))];
        if let Some(receipt) = wizard.receipt() {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", receipt.label), Style::default().fg(Color::Gray)),
                Span::styled(
                    receipt.value.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), chunks[1]);
    } else if form.is_empty() {
        let lines = review_lines(wizard);
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[1]);
    } else {
        form.render(frame, chunks[1], wizard.stepper().errors(), !submitting);
    }

    if let Some(failure) = wizard.failure() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                failure.to_string(),
                Style::default().fg(Color::Red),
            )),
            chunks[2],
        );
    }

    let hint = Style::default().fg(Color::DarkGray);
    let controls = if wizard.is_finished() {
        Line::from(Span::styled("[Enter] Close", hint))
    } else if submitting {
        Line::from(Span::styled(
            "Submitting…",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        let action = if wizard.current().index() + 2 == total {
            "Submit"
        } else {
            "Next"
        };
        let mut spans = vec![Span::styled(format!("[Enter] {}", action), hint)];
        if !wizard.stepper().is_first() {
            spans.push(Span::styled("  [Ctrl+B] Back", hint));
        }
        if wizard.countdown().is_some() {
            let remaining = wizard.resend_remaining_secs_at(now);
            let text = if remaining > 0 {
                format!("  Resend code in {}s", remaining)
            } else {
                "  [Ctrl+R] Resend code".to_string()
            };
            spans.push(Span::styled(text, hint));
        }
        spans.push(Span::styled("  [Esc] Cancel", hint));
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(controls), chunks[3]);
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::rest::{ApiState, RestApiServer, RestApiStatus};
use crate::store::{Backend, BackendResult};
use crate::types::OrganizationStatus;
use crate::ui::dashboard::Snapshot;
use crate::ui::dialogs::HelpDialog;
use crate::ui::panels::Notice;
use crate::ui::terminal_guard::{install_panic_hook, TerminalGuard};
use crate::ui::wizard::{WizardAction, WizardDialog, WizardPane};
use crate::ui::Dashboard;
use crate::wizard::flows::{ModuleUploadFlow, ResetPasswordFlow, SignupFlow};

/// Publisher used for module submissions before any organization is loaded
const DEFAULT_PUBLISHER: &str = "Smart Sensor Flow";

pub struct App {
    config: Config,
    backend: Arc<dyn Backend>,
    dashboard: Dashboard,
    help_dialog: HelpDialog,
    /// Open wizard, if any. Keys go to it first.
    wizard: Option<Box<dyn WizardPane>>,
    notice: Option<Notice>,
    api_server: RestApiServer,
    loads_tx: mpsc::UnboundedSender<BackendResult<Snapshot>>,
    loads_rx: mpsc::UnboundedReceiver<BackendResult<Snapshot>>,
    loading: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let dashboard = Dashboard::new(&config);
        let api_server = RestApiServer::new(
            ApiState::new(config.clone(), backend.clone()),
            config.rest_api.port,
        );
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();

        Self {
            config,
            backend,
            dashboard,
            help_dialog: HelpDialog::new(),
            wizard: None,
            notice: None,
            api_server,
            loads_tx,
            loads_rx,
            loading: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let mut guard = TerminalGuard::enter()?;

        self.reload();
        if self.config.rest_api.enabled {
            self.toggle_api();
        }

        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);

        while !self.should_quit {
            guard.terminal().draw(|f| self.render(f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.tick(Instant::now());
        }

        if let Some(wizard) = self.wizard.as_mut() {
            wizard.close();
        }
        if self.api_server.is_running() {
            self.api_server.stop();
        }
        tracing::info!("console closed");
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let api_status = self.api_server.status();
        self.dashboard
            .render(frame, self.notice.as_ref(), &api_status, self.loading);
        let area = frame.area();
        if let Some(wizard) = self.wizard.as_mut() {
            wizard.render(frame, area);
        }
        self.help_dialog.render(frame);
    }

    /// Fetch a fresh snapshot in the background
    fn reload(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;
        let backend = self.backend.clone();
        let tx = self.loads_tx.clone();
        tokio::spawn(async move {
            let result = Snapshot::load(backend.as_ref()).await;
            let _ = tx.send(result);
        });
    }

    /// Apply background results and expire the notice
    fn tick(&mut self, now: Instant) {
        while let Ok(result) = self.loads_rx.try_recv() {
            self.loading = false;
            match result {
                Ok(snapshot) => {
                    tracing::debug!(devices = snapshot.devices.len(), "snapshot loaded");
                    self.dashboard.apply_snapshot(snapshot);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load dashboard data");
                    self.notify(Notice::error(format!("Could not load data: {}", err)));
                }
            }
        }

        if let Some(wizard) = self.wizard.as_mut() {
            let was_finished = wizard.is_finished();
            let notice = wizard.poll();
            let just_finished = !was_finished && wizard.is_finished();
            if let Some(notice) = notice {
                self.notify(notice);
            }
            // New organizations and modules show up in the tables
            if just_finished {
                self.reload();
            }
        }

        let ttl = Duration::from_secs(self.config.ui.notice_secs);
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.is_expired_at(now, ttl))
        {
            self.notice = None;
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.help_dialog.visible {
            self.help_dialog.toggle();
            return;
        }

        if let Some(wizard) = self.wizard.as_mut() {
            match wizard.handle_key(key) {
                WizardAction::None => {}
                WizardAction::Notify(notice) => self.notify(notice),
                WizardAction::Close => self.close_wizard(),
            }
            return;
        }

        if self.dashboard.searching {
            self.dashboard.handle_list_key(key.code);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.help_dialog.toggle(),
            KeyCode::Tab => self.dashboard.focus_next(),
            KeyCode::BackTab => self.dashboard.focus_prev(),
            KeyCode::Char(c @ '1'..='5') => {
                self.dashboard
                    .select_section(c.to_digit(10).map_or(0, |d| d as usize));
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('S') => self.open_signup(),
            KeyCode::Char('F') => self.open_wizard(Box::new(WizardDialog::new(
                ResetPasswordFlow::from_config(self.backend.clone(), &self.config),
            ))),
            KeyCode::Char('U') => self.open_upload(),
            KeyCode::Char('A') => self.toggle_api(),
            code => {
                self.dashboard.handle_list_key(code);
            }
        }
    }

    fn open_wizard(&mut self, wizard: Box<dyn WizardPane>) {
        tracing::info!(flow = wizard.title(), "wizard opened");
        self.wizard = Some(wizard);
    }

    fn close_wizard(&mut self) {
        if let Some(mut wizard) = self.wizard.take() {
            wizard.close();
            tracing::info!(flow = wizard.title(), finished = wizard.is_finished(), "wizard closed");
        }
    }

    fn open_signup(&mut self) {
        if self.dashboard.plans.is_empty() {
            self.notify(Notice::info("Plans are still loading, try again in a moment"));
            return;
        }
        let flow = SignupFlow::new(self.backend.clone(), self.dashboard.plans.clone())
            .with_password_min(self.config.wizard.password_min_length);
        self.open_wizard(Box::new(WizardDialog::new(flow)));
    }

    fn open_upload(&mut self) {
        let publisher = self
            .dashboard
            .organizations
            .iter()
            .find(|o| o.status == OrganizationStatus::Active)
            .map_or(DEFAULT_PUBLISHER, |o| o.name.as_str())
            .to_string();
        let flow = ModuleUploadFlow::new(self.backend.clone(), publisher);
        self.open_wizard(Box::new(WizardDialog::new(flow)));
    }

    fn toggle_api(&mut self) {
        match self.api_server.toggle() {
            Ok(()) if self.api_server.status() == RestApiStatus::Stopped => {
                self.notify(Notice::info("REST API stopped"));
            }
            Ok(()) => {
                self.notify(Notice::success(format!(
                    "REST API starting on port {}",
                    self.api_server.port()
                )));
            }
            Err(err) => self.notify(Notice::error(err)),
        }
    }
}

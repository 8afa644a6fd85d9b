use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use super::paginated_list::{render_paginated_list, PaginatedList};
use super::panels::{icon_span, status_span, HeaderBar, Notice, StatusBar};
use crate::config::Config;
use crate::icons::{icon, icon_for_tag, IconKey};
use crate::listing::{DeviceSort, ListQuery, Listable, ModuleSort, SortSpec, UserSort};
use crate::rest::RestApiStatus;
use crate::store::{Backend, BackendResult};
use crate::types::{
    Device, DeviceStatus, Module, ModuleStatus, Organization, OrganizationStatus, Permission,
    Plan, Role, Subscription, SubscriptionStatus, User,
};

/// Top-level navigation sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    Devices,
    Marketplace,
    Subscriptions,
    Access,
}

impl Section {
    pub fn all() -> &'static [Section] {
        &[
            Section::Overview,
            Section::Devices,
            Section::Marketplace,
            Section::Subscriptions,
            Section::Access,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Devices => "Devices",
            Section::Marketplace => "Marketplace",
            Section::Subscriptions => "Subscriptions",
            Section::Access => "Access",
        }
    }

    pub fn icon_key(&self) -> IconKey {
        match self {
            Section::Overview => IconKey::Overview,
            Section::Devices => IconKey::Devices,
            Section::Marketplace => IconKey::Marketplace,
            Section::Subscriptions => IconKey::Subscriptions,
            Section::Access => IconKey::Access,
        }
    }

    fn index(self) -> usize {
        Section::all().iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Section {
        let all = Section::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn prev(self) -> Section {
        let all = Section::all();
        all[(self.index() + all.len() - 1) % all.len()]
    }
}

/// Everything the dashboard shows, fetched in one go
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub plans: Vec<Plan>,
    pub organizations: Vec<Organization>,
    pub devices: Vec<Device>,
    pub modules: Vec<Module>,
    pub subscriptions: Vec<Subscription>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub users: Vec<User>,
}

impl Snapshot {
    pub async fn load(backend: &dyn Backend) -> BackendResult<Self> {
        let (plans, organizations, devices, modules) = tokio::try_join!(
            backend.list_plans(),
            backend.list_organizations(),
            backend.list_devices(),
            backend.list_modules(),
        )?;
        let (subscriptions, roles, permissions, users) = tokio::try_join!(
            backend.list_subscriptions(),
            backend.list_roles(),
            backend.list_permissions(),
            backend.list_users(),
        )?;
        Ok(Self {
            plans,
            organizations,
            devices,
            modules,
            subscriptions,
            roles,
            permissions,
            users,
        })
    }
}

/// "just now", "5m ago", "3h ago", "2d ago"
fn ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(at).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

fn battery_span(level: Option<u8>) -> Span<'static> {
    match level {
        Some(pct) => {
            let color = match pct {
                0..=19 => Color::Red,
                20..=49 => Color::Yellow,
                _ => Color::Green,
            };
            Span::styled(format!("{}%", pct), Style::default().fg(color))
        }
        None => Span::styled("mains", Style::default().fg(Color::DarkGray)),
    }
}

/// Route a table key to `list`. Returns true if it was consumed.
fn list_key<R: Listable>(list: &mut PaginatedList<R>, code: KeyCode, searching: &mut bool) -> bool {
    if *searching {
        match code {
            KeyCode::Enter | KeyCode::Esc => *searching = false,
            KeyCode::Backspace => list.pop_search_char(),
            KeyCode::Char(c) => list.push_search_char(c),
            _ => return false,
        }
        return true;
    }

    match code {
        KeyCode::Char('j') | KeyCode::Down => list.select_next(),
        KeyCode::Char('k') | KeyCode::Up => list.select_prev(),
        KeyCode::Char('n') | KeyCode::PageDown => list.next_page(),
        KeyCode::Char('p') | KeyCode::PageUp => list.prev_page(),
        KeyCode::Char('f') => list.cycle_status(),
        KeyCode::Char('s') => list.next_sort_key(),
        KeyCode::Char('o') => list.reverse_sort(),
        KeyCode::Char(' ') => list.toggle_selected(),
        KeyCode::Char('x') => list.toggle_all_visible(),
        KeyCode::Char('c') => list.clear_search(),
        KeyCode::Char('/') => *searching = true,
        _ => return false,
    }
    true
}

pub struct Dashboard {
    pub section: Section,
    pub plans: Vec<Plan>,
    pub organizations: Vec<Organization>,
    pub subscriptions: Vec<Subscription>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub devices: PaginatedList<Device>,
    pub modules: PaginatedList<Module>,
    pub users: PaginatedList<User>,
    /// Typing goes to the search box of the active table
    pub searching: bool,
}

impl Dashboard {
    pub fn new(config: &Config) -> Self {
        let page_size = config.ui.page_size;
        Self {
            section: Section::Overview,
            plans: Vec::new(),
            organizations: Vec::new(),
            subscriptions: Vec::new(),
            roles: Vec::new(),
            permissions: Vec::new(),
            devices: PaginatedList::new(
                page_size,
                ListQuery::new().sort(SortSpec::ascending(DeviceSort::Name)),
            ),
            modules: PaginatedList::new(
                page_size,
                ListQuery::new().sort(SortSpec::descending(ModuleSort::Downloads)),
            ),
            users: PaginatedList::new(
                page_size,
                ListQuery::new().sort(SortSpec::ascending(UserSort::Name)),
            ),
            searching: false,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.plans = snapshot.plans;
        self.organizations = snapshot.organizations;
        self.subscriptions = snapshot.subscriptions;
        self.roles = snapshot.roles;
        self.permissions = snapshot.permissions;
        self.devices.set_records(snapshot.devices);
        self.modules.set_records(snapshot.modules);
        self.users.set_records(snapshot.users);
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
        self.searching = false;
    }

    /// Select a section by its 1-based number
    pub fn select_section(&mut self, number: usize) {
        if let Some(section) = number
            .checked_sub(1)
            .and_then(|i| Section::all().get(i))
        {
            self.set_section(*section);
        }
    }

    pub fn focus_next(&mut self) {
        self.set_section(self.section.next());
    }

    pub fn focus_prev(&mut self) {
        self.set_section(self.section.prev());
    }

    /// Whether the active section has a record table
    pub fn has_table(&self) -> bool {
        matches!(
            self.section,
            Section::Devices | Section::Marketplace | Section::Access
        )
    }

    /// Route a key to the table of the active section
    pub fn handle_list_key(&mut self, code: KeyCode) -> bool {
        match self.section {
            Section::Devices => list_key(&mut self.devices, code, &mut self.searching),
            Section::Marketplace => list_key(&mut self.modules, code, &mut self.searching),
            Section::Access => list_key(&mut self.users, code, &mut self.searching),
            Section::Overview | Section::Subscriptions => false,
        }
    }

    fn organization_name(&self, id: &str) -> String {
        self.organizations
            .iter()
            .find(|o| o.id == id)
            .map_or_else(|| id.to_string(), |o| o.name.clone())
    }

    fn plan_name(&self, id: &str) -> String {
        self.plans
            .iter()
            .find(|p| p.id == id)
            .map_or_else(|| id.to_string(), |p| p.name.clone())
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        notice: Option<&Notice>,
        api_status: &RestApiStatus,
        loading: bool,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(10),   // Main content
                Constraint::Length(2), // Status bar
            ])
            .split(frame.area());

        HeaderBar {
            version: env!("CARGO_PKG_VERSION"),
            active: self.section,
        }
        .render(frame, chunks[0]);

        let now = Utc::now();
        match self.section {
            Section::Overview => self.render_overview(frame, chunks[1]),
            Section::Devices => self.render_devices(frame, chunks[1], now),
            Section::Marketplace => self.render_marketplace(frame, chunks[1]),
            Section::Subscriptions => self.render_subscriptions(frame, chunks[1]),
            Section::Access => self.render_access(frame, chunks[1], now),
        }

        StatusBar {
            notice,
            api_status,
            loading,
        }
        .render(frame, chunks[2]);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(5)])
            .split(area);
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(rows[0]);

        let devices = self.devices.total_records();
        let online = self.count_devices(DeviceStatus::Online);
        let attention =
            self.count_devices(DeviceStatus::Error) + self.count_devices(DeviceStatus::Offline);
        let pending_orgs = self
            .organizations
            .iter()
            .filter(|o| o.status == OrganizationStatus::Pending)
            .count();
        let active_subs = self
            .subscriptions
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .count();

        let card_data = [
            (
                IconKey::Overview,
                "Organizations",
                self.organizations.len().to_string(),
                format!("{} pending", pending_orgs),
            ),
            (
                IconKey::Devices,
                "Devices",
                format!("{}/{}", online, devices),
                format!("{} need attention", attention),
            ),
            (
                IconKey::Marketplace,
                "Modules",
                self.modules.total_records().to_string(),
                "in the marketplace".to_string(),
            ),
            (
                IconKey::Subscriptions,
                "Subscriptions",
                active_subs.to_string(),
                format!("of {} active", self.subscriptions.len()),
            ),
        ];
        for ((key, title, value, detail), area) in card_data.into_iter().zip(cards.iter()) {
            let text = vec![
                Line::from(Span::styled(
                    value,
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(detail, Style::default().fg(Color::Gray))),
            ];
            let card = Paragraph::new(text).block(
                Block::default()
                    .title(Line::from(vec![icon_span(icon(key)), Span::raw(title)]))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray)),
            );
            frame.render_widget(card, *area);
        }

        let lower = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[1]);

        let plan_items: Vec<ListItem> = self
            .plans
            .iter()
            .map(|p| {
                let mut spans = vec![
                    Span::styled(
                        format!("{:<12}", p.name),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("${:>7.2}/mo", p.price), Style::default().fg(Color::Gray)),
                ];
                if p.is_popular {
                    spans.push(Span::styled("  ★ popular", Style::default().fg(Color::Yellow)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        frame.render_widget(
            List::new(plan_items).block(Block::default().title(" Plans ").borders(Borders::ALL)),
            lower[0],
        );

        let org_items: Vec<ListItem> = self
            .organizations
            .iter()
            .map(|o| {
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:<24}", o.name)),
                    Span::styled(
                        format!("{:<14}", self.plan_name(&o.plan_id)),
                        Style::default().fg(Color::Gray),
                    ),
                    status_span(o.status),
                ]))
            })
            .collect();
        frame.render_widget(
            List::new(org_items)
                .block(Block::default().title(" Organizations ").borders(Borders::ALL)),
            lower[1],
        );
    }

    fn count_devices(&self, status: DeviceStatus) -> usize {
        self.devices
            .records()
            .iter()
            .filter(|d| d.status == status)
            .count()
    }

    fn render_devices(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
        let title = if self.searching {
            format!("Devices  /{}▏", self.devices.query().text)
        } else {
            "Devices".to_string()
        };
        render_paginated_list(
            frame,
            area,
            &mut self.devices,
            &title,
            &["Name", "Serial", "Type", "Status", "Battery", "Location", "Last seen"],
            &[
                Constraint::Min(22),
                Constraint::Length(20),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(14),
                Constraint::Length(10),
            ],
            |d| {
                vec![
                    Cell::from(Line::from(vec![
                        icon_span(icon(IconKey::Device(d.kind))),
                        Span::raw(d.name.clone()),
                    ])),
                    Cell::from(d.serial_number.clone()),
                    Cell::from(d.kind.label()),
                    Cell::from(status_span(d.status)),
                    Cell::from(battery_span(d.battery_level)),
                    Cell::from(d.location.clone()),
                    Cell::from(ago(d.last_seen, now)),
                ]
            },
        );
    }

    fn render_marketplace(&mut self, frame: &mut Frame, area: Rect) {
        let title = if self.searching {
            format!("Marketplace  /{}▏", self.modules.query().text)
        } else {
            "Marketplace".to_string()
        };
        render_paginated_list(
            frame,
            area,
            &mut self.modules,
            &title,
            &["Module", "Version", "Category", "Price", "Rating", "Downloads", "Status"],
            &[
                Constraint::Min(24),
                Constraint::Length(8),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Length(15),
            ],
            |m| {
                let status = if m.status == ModuleStatus::Published {
                    Cell::from(status_span(m.status))
                } else {
                    Cell::from(status_span(m.status)).style(Style::default().add_modifier(Modifier::ITALIC))
                };
                vec![
                    Cell::from(Line::from(vec![
                        icon_span(icon(IconKey::Module(m.category))),
                        Span::raw(m.name.clone()),
                    ])),
                    Cell::from(m.version.clone()),
                    Cell::from(m.category.label()),
                    Cell::from(m.pricing.display()),
                    Cell::from(format!("{:.1}★", m.rating)),
                    Cell::from(m.downloads.to_string()),
                    status,
                ]
            },
        );
    }

    fn render_subscriptions(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .subscriptions
            .iter()
            .map(|s| {
                Row::new(vec![
                    Cell::from(self.organization_name(&s.organization_id)),
                    Cell::from(self.plan_name(&s.plan_id)),
                    Cell::from(status_span(s.status)),
                    Cell::from(s.seats.to_string()),
                    Cell::from(s.started_at.format("%Y-%m-%d").to_string()),
                    Cell::from(s.renews_at.format("%Y-%m-%d").to_string()),
                ])
            })
            .collect();

        let header = Row::new(["Organization", "Plan", "Status", "Seats", "Started", "Renews"])
            .style(
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            );
        let table = Table::new(
            rows,
            [
                Constraint::Min(24),
                Constraint::Length(14),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Length(11),
                Constraint::Length(11),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(Line::from(vec![
                    icon_span(icon(IconKey::Subscriptions)),
                    Span::raw("Subscriptions "),
                ]))
                .borders(Borders::ALL),
        );
        frame.render_widget(table, area);
    }

    fn render_access(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.roles.len() as u16 + 2), Constraint::Min(3)])
            .split(columns[0]);

        let role_items: Vec<ListItem> = self
            .roles
            .iter()
            .map(|r| {
                let grants = if r.permissions.iter().any(|p| p == "*") {
                    "all permissions".to_string()
                } else {
                    format!("{} permissions", r.permissions.len())
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<14}", r.name), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(grants, Style::default().fg(Color::Gray)),
                ]))
            })
            .collect();
        frame.render_widget(
            List::new(role_items).block(Block::default().title(" Roles ").borders(Borders::ALL)),
            left[0],
        );

        let permission_items: Vec<ListItem> = self
            .permissions
            .iter()
            .map(|p| {
                ListItem::new(Line::from(vec![
                    icon_span(icon_for_tag(&p.group)),
                    Span::raw(p.name.clone()),
                ]))
            })
            .collect();
        frame.render_widget(
            List::new(permission_items)
                .block(Block::default().title(" Permissions ").borders(Borders::ALL)),
            left[1],
        );

        let roles = &self.roles;
        let title = if self.searching {
            format!("Users  /{}▏", self.users.query().text)
        } else {
            "Users".to_string()
        };
        render_paginated_list(
            frame,
            columns[1],
            &mut self.users,
            &title,
            &["Name", "Email", "Role", "Status", "Last login"],
            &[
                Constraint::Min(18),
                Constraint::Min(24),
                Constraint::Length(12),
                Constraint::Length(9),
                Constraint::Length(11),
            ],
            |u| {
                let role = roles
                    .iter()
                    .find(|r| r.id == u.role_id)
                    .map_or_else(|| u.role_id.clone(), |r| r.name.clone());
                vec![
                    Cell::from(u.name.clone()),
                    Cell::from(u.email.clone()),
                    Cell::from(role),
                    Cell::from(status_span(u.status)),
                    Cell::from(u.last_login.map_or_else(|| "never".to_string(), |t| ago(t, now))),
                ]
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockBackend;
    use crate::types::AccountStatus;
    use ratatui::{backend::TestBackend, Terminal};

    async fn loaded_dashboard() -> Dashboard {
        let backend = MockBackend::seeded();
        let snapshot = Snapshot::load(&backend).await.unwrap();
        let mut dashboard = Dashboard::new(&Config::default());
        dashboard.apply_snapshot(snapshot);
        dashboard
    }

    fn screen(dashboard: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal
            .draw(|frame| dashboard.render(frame, None, &RestApiStatus::Stopped, false))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_sections_cycle_both_ways() {
        assert_eq!(Section::Access.next(), Section::Overview);
        assert_eq!(Section::Overview.prev(), Section::Access);
        for section in Section::all() {
            assert_eq!(section.next().prev(), *section);
        }
    }

    #[test]
    fn test_ago() {
        let now = Utc::now();
        assert_eq!(ago(now, now), "just now");
        assert_eq!(ago(now - chrono::Duration::minutes(5), now), "5m ago");
        assert_eq!(ago(now - chrono::Duration::minutes(180), now), "3h ago");
        assert_eq!(ago(now - chrono::Duration::minutes(4320), now), "3d ago");
    }

    #[tokio::test]
    async fn test_snapshot_fills_every_section() {
        let dashboard = loaded_dashboard().await;
        assert_eq!(dashboard.plans.len(), 4);
        assert_eq!(dashboard.organizations.len(), 3);
        assert_eq!(dashboard.devices.total_records(), 18);
        assert_eq!(dashboard.users.total_records(), 8);
        assert_eq!(dashboard.subscriptions.len(), 3);
    }

    #[tokio::test]
    async fn test_number_keys_select_sections() {
        let mut dashboard = loaded_dashboard().await;
        dashboard.select_section(2);
        assert_eq!(dashboard.section, Section::Devices);
        dashboard.select_section(0);
        dashboard.select_section(9);
        assert_eq!(dashboard.section, Section::Devices);
    }

    #[tokio::test]
    async fn test_search_mode_captures_typing() {
        let mut dashboard = loaded_dashboard().await;
        dashboard.set_section(Section::Devices);

        assert!(dashboard.handle_list_key(KeyCode::Char('/')));
        assert!(dashboard.searching);
        for c in "gateway".chars() {
            assert!(dashboard.handle_list_key(KeyCode::Char(c)));
        }
        assert!(dashboard.handle_list_key(KeyCode::Enter));
        assert!(!dashboard.searching);
        assert_eq!(dashboard.devices.len(), 3);

        // Outside search mode, letters are commands
        assert!(dashboard.handle_list_key(KeyCode::Char('c')));
        assert_eq!(dashboard.devices.len(), 18);
    }

    #[tokio::test]
    async fn test_access_filter_cycles_account_status() {
        let mut dashboard = loaded_dashboard().await;
        dashboard.set_section(Section::Access);
        // All -> Active -> Invited -> Locked
        for _ in 0..3 {
            dashboard.handle_list_key(KeyCode::Char('f'));
        }
        let emails: Vec<&str> = dashboard
            .users
            .current_page_items()
            .iter()
            .map(|u| u.email.as_str())
            .collect();
        assert_eq!(emails, vec!["anouk@greenleaf.example"]);
        assert!(dashboard
            .users
            .current_page_items()
            .iter()
            .all(|u| u.status == AccountStatus::Locked));
    }

    #[tokio::test]
    async fn test_tables_ignore_keys_on_overview() {
        let mut dashboard = loaded_dashboard().await;
        assert!(!dashboard.has_table());
        assert!(!dashboard.handle_list_key(KeyCode::Char('j')));
    }

    #[tokio::test]
    async fn test_every_section_renders() {
        let mut dashboard = loaded_dashboard().await;
        for section in Section::all() {
            dashboard.set_section(*section);
            let text = screen(&mut dashboard);
            assert!(text.contains("Smart Sensor Flow"));
        }
        dashboard.set_section(Section::Devices);
        assert!(screen(&mut dashboard).contains("Freezer A1"));
        dashboard.set_section(Section::Access);
        assert!(screen(&mut dashboard).contains("Permissions"));
    }
}

//! Paginated record table for the dashboard sections.
//!
//! Holds the full record set, the active [`ListQuery`] and the filtered view.
//! Every change to the query re-applies it and resets the cursor.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::listing::{page_count, page_slice, ListQuery, Listable, Selection, SortKey};

/// A filtered, sorted and paged view over records
pub struct PaginatedList<R: Listable> {
    records: Vec<R>,
    query: ListQuery<R>,
    view: Vec<R>,
    selection: Selection,
    page: usize,
    page_size: usize,
    /// Cursor within the current page
    selected: usize,
    table_state: TableState,
}

impl<R: Listable> PaginatedList<R> {
    pub fn new(page_size: usize, query: ListQuery<R>) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            records: Vec::new(),
            query,
            view: Vec::new(),
            selection: Selection::new(),
            page: 0,
            page_size: page_size.max(1),
            selected: 0,
            table_state,
        }
    }

    /// Replace the records, keeping query and the still-known selection
    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.selection
            .retain_known(self.records.iter().map(|r| r.id()));
        self.refresh();
    }

    fn refresh(&mut self) {
        self.view = self.query.apply(&self.records);
        self.page = 0;
        self.selected = 0;
        self.table_state.select(Some(0));
    }

    pub fn query(&self) -> &ListQuery<R> {
        &self.query
    }

    pub fn cycle_status(&mut self) {
        self.query.status = self.query.status.cycle();
        self.refresh();
    }

    /// Sort by the key after the active one
    pub fn next_sort_key(&mut self) {
        let keys = R::SortKey::all();
        let next = match self.query.sort {
            Some(spec) => {
                let idx = keys.iter().position(|k| *k == spec.key).unwrap_or(0);
                keys[(idx + 1) % keys.len()]
            }
            None => keys[0],
        };
        self.query.sort = None;
        self.query.toggle_sort(next);
        self.refresh();
    }

    pub fn reverse_sort(&mut self) {
        let key = self.query.sort.map_or(R::SortKey::all()[0], |s| s.key);
        self.query.toggle_sort(key);
        self.refresh();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.query.text.push(c);
        self.refresh();
    }

    pub fn pop_search_char(&mut self) {
        self.query.text.pop();
        self.refresh();
    }

    pub fn clear_search(&mut self) {
        if !self.query.text.is_empty() {
            self.query.text.clear();
            self.refresh();
        }
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Every record, ignoring the query
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.view.len(), self.page_size)
    }

    /// Current page number (1-indexed for display)
    pub fn current_page(&self) -> usize {
        self.page + 1
    }

    pub fn current_page_items(&self) -> &[R] {
        page_slice(&self.view, self.page, self.page_size)
    }

    pub fn selected_item(&self) -> Option<&R> {
        self.current_page_items().get(self.selected)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggle the record under the cursor
    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_item().map(|r| r.id().to_string()) {
            self.selection.toggle(&id);
        }
    }

    /// Select every record on the page, or clear if they all are selected
    pub fn toggle_all_visible(&mut self) {
        let visible: Vec<String> = self
            .current_page_items()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        self.selection.toggle_all(visible.iter().map(String::as_str));
    }

    pub fn select_next(&mut self) {
        let page_items = self.current_page_items().len();
        if page_items == 0 {
            return;
        }

        if self.selected + 1 < page_items {
            self.selected += 1;
        } else if self.page + 1 < self.total_pages() {
            self.page += 1;
            self.selected = 0;
        } else {
            self.page = 0;
            self.selected = 0;
        }
        self.table_state.select(Some(self.selected));
    }

    pub fn select_prev(&mut self) {
        if self.view.is_empty() {
            return;
        }

        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.page = if self.page > 0 {
                self.page - 1
            } else {
                self.total_pages().saturating_sub(1)
            };
            self.selected = self.current_page_items().len().saturating_sub(1);
        }
        self.table_state.select(Some(self.selected));
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.total_pages() {
            self.page += 1;
            self.selected = 0;
            self.table_state.select(Some(0));
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.selected = 0;
            self.table_state.select(Some(0));
        }
    }

    /// Filter, sort, search and paging summary
    pub fn footer_line(&self) -> Line<'static> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut spans = vec![
            Span::styled(
                format!("Page {}/{}", self.current_page(), self.total_pages()),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("  {} of {}", self.view.len(), self.records.len()),
                dim,
            ),
            Span::styled(
                format!("  status: {}", self.query.status.label()),
                Style::default().fg(Color::Yellow),
            ),
        ];
        if let Some(spec) = self.query.sort {
            spans.push(Span::styled(
                format!("  sort: {} {}", spec.key.label(), spec.order.arrow()),
                Style::default().fg(Color::Yellow),
            ));
        }
        if !self.query.text.is_empty() {
            spans.push(Span::styled(
                format!("  search: {}", self.query.text),
                Style::default().fg(Color::Yellow),
            ));
        }
        if !self.selection.is_empty() {
            spans.push(Span::styled(
                format!("  {} selected", self.selection.len()),
                Style::default().fg(Color::Magenta),
            ));
        }
        Line::from(spans)
    }
}

/// Render a paginated table with a custom row renderer.
///
/// `cells` builds the data cells of one record; a selection checkbox column
/// is prepended.
pub fn render_paginated_list<R, F>(
    frame: &mut Frame,
    area: Rect,
    list: &mut PaginatedList<R>,
    title: &str,
    header: &[&'static str],
    widths: &[Constraint],
    cells: F,
) where
    R: Listable,
    F: Fn(&R) -> Vec<Cell<'static>>,
{
    let rows: Vec<Row> = list
        .current_page_items()
        .iter()
        .map(|record| {
            let mark = if list.selection.is_selected(record.id()) {
                "[x]"
            } else {
                "[ ]"
            };
            let mut row_cells = vec![Cell::from(mark)];
            row_cells.extend(cells(record));
            Row::new(row_cells)
        })
        .collect();

    let header_row = Row::new(
        std::iter::once("")
            .chain(header.iter().copied())
            .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .style(Style::default().fg(Color::Gray));

    let mut all_widths = vec![Constraint::Length(3)];
    all_widths.extend_from_slice(widths);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_bottom(list.footer_line())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let table = Table::new(rows, all_widths)
        .header(header_row)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut list.table_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{DeviceSort, SortOrder, StatusFilter};
    use crate::store::MockData;
    use crate::types::{Device, DeviceStatus};

    fn device_list(page_size: usize) -> PaginatedList<Device> {
        let mut list = PaginatedList::new(page_size, ListQuery::new());
        list.set_records(MockData::seeded().devices);
        list
    }

    #[test]
    fn test_empty_list() {
        let list: PaginatedList<Device> = PaginatedList::new(5, ListQuery::new());
        assert!(list.is_empty());
        assert_eq!(list.total_pages(), 1);
        assert!(list.selected_item().is_none());
    }

    #[test]
    fn test_pages_cover_the_view() {
        let mut list = device_list(5);
        assert_eq!(list.len(), 18);
        assert_eq!(list.total_pages(), 4);
        assert_eq!(list.current_page_items().len(), 5);

        list.next_page();
        list.next_page();
        list.next_page();
        assert_eq!(list.current_page(), 4);
        assert_eq!(list.current_page_items().len(), 3);

        list.next_page();
        assert_eq!(list.current_page(), 4);
    }

    #[test]
    fn test_cursor_moves_across_pages_and_wraps() {
        let mut list = device_list(5);
        for _ in 0..5 {
            list.select_next();
        }
        assert_eq!(list.current_page(), 2);

        let mut list = device_list(5);
        list.select_prev();
        assert_eq!(list.current_page(), 4);
        assert_eq!(list.selected_item().map(|d| d.id.as_str()), Some("dev-018"));
    }

    #[test]
    fn test_cycling_status_filters_the_view() {
        let mut list = device_list(50);
        list.cycle_status();
        assert!(matches!(list.query().status, StatusFilter::Only(_)));
        let StatusFilter::Only(status) = list.query().status else {
            unreachable!()
        };
        assert!(list.current_page_items().iter().all(|d| d.status == status));
        assert_eq!(
            list.len(),
            MockData::seeded()
                .devices
                .iter()
                .filter(|d| d.status == status)
                .count()
        );
    }

    #[test]
    fn test_sort_key_and_order_toggle() {
        let mut list = device_list(50);
        list.next_sort_key();
        let spec = list.query().sort.unwrap();
        assert_eq!(spec.key, DeviceSort::Name);
        assert_eq!(spec.order, SortOrder::Ascending);
        let ascending: Vec<String> = list.current_page_items().iter().map(|d| d.id.clone()).collect();

        list.reverse_sort();
        assert_eq!(list.query().sort.unwrap().order, SortOrder::Descending);
        let mut descending: Vec<String> =
            list.current_page_items().iter().map(|d| d.id.clone()).collect();
        descending.reverse();
        assert_eq!(ascending, descending);

        list.next_sort_key();
        assert_eq!(list.query().sort.unwrap().key, DeviceSort::Status);
    }

    #[test]
    fn test_search_narrows_and_clears() {
        let mut list = device_list(50);
        for c in "freezer".chars() {
            list.push_search_char(c);
        }
        assert_eq!(list.len(), 3);
        list.pop_search_char();
        assert_eq!(list.query().text, "freeze");
        list.clear_search();
        assert_eq!(list.len(), 18);
    }

    #[test]
    fn test_select_all_visible_twice_clears() {
        let mut list = device_list(5);
        list.toggle_selected();
        assert_eq!(list.selection().len(), 1);

        list.toggle_all_visible();
        assert_eq!(list.selection().len(), 5);
        list.toggle_all_visible();
        assert!(list.selection().is_empty());
    }

    #[test]
    fn test_selection_survives_reload_for_known_ids() {
        let mut list = device_list(5);
        list.toggle_selected();
        let mut records = MockData::seeded().devices;
        records.retain(|d| d.status != DeviceStatus::Offline || d.id == "dev-001");
        list.set_records(records);
        assert!(list.selection().is_selected("dev-001"));
    }
}

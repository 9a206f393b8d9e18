use courtside_core::executor::QueryBackend;
use courtside_core::filters::Bound;
use courtside_core::session::{BrowserSession, BrowserView};
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pane {
    Queries,
    Filters,
    Results,
}

impl Pane {
    pub(crate) fn next(self) -> Self {
        match self {
            Self::Queries => Self::Filters,
            Self::Filters => Self::Results,
            Self::Results => Self::Queries,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Queries => "Queries",
            Self::Filters => "Filters",
            Self::Results => "Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectionKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Msg {
    Quit,
    ToggleHelp,
    ToggleLogs,
    NextPane,
    Navigate(DirectionKey),
    Rerun,
    ResetFilters,
    FocusSearch,
    SearchInput(char),
    SearchBackspace,
    ClearSearch,
    Activate,
    Escape,
}

/// Focusable entry of the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterSlot {
    Range { control: usize, bound: Bound },
    Search,
}

pub(crate) struct TuiApp<'c, B: QueryBackend> {
    session: BrowserSession<'c, B>,
    runtime: Runtime,
    pub(crate) view: BrowserView,
    pub(crate) pane: Pane,
    pub(crate) query_cursor: usize,
    pub(crate) filter_cursor: usize,
    pub(crate) results_offset: usize,
    pub(crate) search_editing: bool,
    pub(crate) show_help: bool,
    pub(crate) show_logs: bool,
    pub(crate) should_quit: bool,
    pub(crate) renders: u64,
}

impl<'c, B: QueryBackend> TuiApp<'c, B> {
    pub(crate) fn new(mut session: BrowserSession<'c, B>, runtime: Runtime) -> Self {
        let query_cursor = session
            .selected()
            .and_then(|name| session.catalog().position(name))
            .unwrap_or(0);
        let view = runtime.block_on(session.render());
        Self {
            session,
            runtime,
            view,
            pane: Pane::Queries,
            query_cursor,
            filter_cursor: 0,
            results_offset: 0,
            search_editing: false,
            show_help: false,
            show_logs: false,
            should_quit: false,
            renders: 1,
        }
    }

    pub(crate) fn target(&self) -> String {
        self.session.provider().settings().display_target()
    }

    /// Reruns the full cycle for the current selection and filters.
    pub(crate) fn rerender(&mut self) {
        self.view = self.runtime.block_on(self.session.render());
        self.renders += 1;
        self.filter_cursor = self.filter_cursor.min(self.filter_slots().len() - 1);
        let shown = self.view.table.as_ref().map_or(0, |table| table.row_count());
        self.results_offset = self.results_offset.min(shown.saturating_sub(1));
    }

    pub(crate) fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Quit => self.should_quit = true,
            Msg::ToggleHelp => self.show_help = !self.show_help,
            Msg::ToggleLogs => self.show_logs = !self.show_logs,
            Msg::NextPane => {
                self.search_editing = false;
                self.pane = self.pane.next();
            }
            Msg::Navigate(direction) => self.navigate(direction),
            Msg::Rerun => self.rerender(),
            Msg::ResetFilters => {
                let filters = self.session.filters_mut();
                filters.reset_ranges();
                filters.clear_search();
                self.rerender();
            }
            Msg::FocusSearch => {
                self.pane = Pane::Filters;
                self.filter_cursor = self.filter_slots().len() - 1;
                self.search_editing = true;
            }
            Msg::SearchInput(ch) => {
                self.session.filters_mut().push_search_char(ch);
                self.results_offset = 0;
                self.rerender();
            }
            Msg::SearchBackspace => {
                if self.session.filters_mut().pop_search_char().is_some() {
                    self.rerender();
                }
            }
            Msg::ClearSearch => {
                self.session.filters_mut().clear_search();
                self.rerender();
            }
            Msg::Activate => {
                if self.focused_slot() == Some(FilterSlot::Search) {
                    self.search_editing = true;
                }
            }
            Msg::Escape => {
                self.search_editing = false;
                self.show_help = false;
            }
        }
    }

    pub(crate) fn filter_slots(&self) -> Vec<FilterSlot> {
        let mut slots = Vec::with_capacity(self.view.controls.len() * 2 + 1);
        for control in 0..self.view.controls.len() {
            slots.push(FilterSlot::Range {
                control,
                bound: Bound::Lower,
            });
            slots.push(FilterSlot::Range {
                control,
                bound: Bound::Upper,
            });
        }
        slots.push(FilterSlot::Search);
        slots
    }

    pub(crate) fn focused_slot(&self) -> Option<FilterSlot> {
        (self.pane == Pane::Filters)
            .then(|| self.filter_slots().get(self.filter_cursor).copied())
            .flatten()
    }

    pub(crate) fn status_line(&self) -> String {
        if let Some(notice) = self.view.notices.first() {
            return notice.text.clone();
        }
        match &self.view.table {
            Some(table) => format!(
                "Showing {} of {} rows",
                table.row_count(),
                self.view.total_rows
            ),
            None => "No query loaded".to_string(),
        }
    }

    fn navigate(&mut self, direction: DirectionKey) {
        match self.pane {
            Pane::Queries => self.navigate_queries(direction),
            Pane::Filters => self.navigate_filters(direction),
            Pane::Results => self.navigate_results(direction),
        }
    }

    fn navigate_queries(&mut self, direction: DirectionKey) {
        let count = self.view.query_names.len();
        if count == 0 {
            return;
        }

        let next = match direction {
            DirectionKey::Up | DirectionKey::Left => self.query_cursor.saturating_sub(1),
            DirectionKey::Down | DirectionKey::Right => (self.query_cursor + 1).min(count - 1),
        };
        if next == self.query_cursor {
            return;
        }

        self.query_cursor = next;
        let name = self.view.query_names[next].clone();
        self.session.select_query(name);
        self.filter_cursor = 0;
        self.results_offset = 0;
        self.rerender();
    }

    fn navigate_filters(&mut self, direction: DirectionKey) {
        let slots = self.filter_slots();
        match direction {
            DirectionKey::Up => self.filter_cursor = self.filter_cursor.saturating_sub(1),
            DirectionKey::Down => {
                self.filter_cursor = (self.filter_cursor + 1).min(slots.len() - 1);
            }
            DirectionKey::Left | DirectionKey::Right => {
                let Some(FilterSlot::Range { control, bound }) =
                    slots.get(self.filter_cursor).copied()
                else {
                    return;
                };
                let Some(control) = self.view.controls.get(control) else {
                    return;
                };
                let step = control.step();
                let delta = if direction == DirectionKey::Left {
                    -step
                } else {
                    step
                };
                let column = control.column.clone();
                if self.session.filters_mut().adjust_range(&column, bound, delta) {
                    self.results_offset = 0;
                    self.rerender();
                }
            }
        }
    }

    fn navigate_results(&mut self, direction: DirectionKey) {
        let shown = self.view.table.as_ref().map_or(0, |table| table.row_count());
        if shown == 0 {
            return;
        }
        match direction {
            DirectionKey::Up | DirectionKey::Left => {
                self.results_offset = self.results_offset.saturating_sub(1);
            }
            DirectionKey::Down | DirectionKey::Right => {
                self.results_offset = (self.results_offset + 1).min(shown - 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use courtside_core::filters::Bound;
    use courtside_core::session::ViewState;

    use super::{DirectionKey, FilterSlot, Msg, Pane};
    use crate::test_support::{app, catalog, ratios_catalog};

    #[test]
    fn startup_renders_first_query() {
        let catalog = catalog();
        let app = app(&catalog);
        assert_eq!(app.renders, 1);
        assert_eq!(app.view.selected.as_deref(), Some("rankings"));
        assert_eq!(app.view.state(), ViewState::Data);
        assert_eq!(app.status_line(), "Showing 2 of 2 rows");
    }

    #[test]
    fn moving_through_queries_rerenders_with_fresh_controls() {
        let catalog = catalog();
        let mut app = app(&catalog);
        assert_eq!(app.view.controls.len(), 1);

        app.handle(Msg::Navigate(DirectionKey::Down));
        assert_eq!(app.view.selected.as_deref(), Some("venues"));
        assert!(app.view.controls.is_empty());
        assert_eq!(app.renders, 2);

        app.handle(Msg::Navigate(DirectionKey::Down));
        assert_eq!(app.view.selected.as_deref(), Some("broken"));
        assert_eq!(app.view.state(), ViewState::NoData);
        assert_eq!(
            app.status_line(),
            "error executing query: Table 'tennis.missing' doesn't exist"
        );

        app.handle(Msg::Navigate(DirectionKey::Down));
        assert_eq!(app.renders, 3, "cursor at the end should not rerender");
    }

    #[test]
    fn adjusting_a_bound_filters_rows() {
        let catalog = catalog();
        let mut app = app(&catalog);
        app.handle(Msg::NextPane);
        assert_eq!(app.pane, Pane::Filters);
        assert_eq!(
            app.focused_slot(),
            Some(FilterSlot::Range {
                control: 0,
                bound: Bound::Lower
            })
        );

        app.handle(Msg::Navigate(DirectionKey::Right));
        let range = app.view.controls[0].range;
        assert_eq!(range.lo, 915.0);
        assert_eq!(app.status_line(), "Showing 1 of 2 rows");

        app.handle(Msg::ResetFilters);
        assert_eq!(app.status_line(), "Showing 2 of 2 rows");
    }

    #[test]
    fn fractional_bound_stepped_out_and_back_shows_every_row() {
        let catalog = ratios_catalog();
        let mut app = app(&catalog);
        assert!(!app.view.controls[0].integral);
        app.handle(Msg::NextPane);

        for _ in 0..3 {
            app.handle(Msg::Navigate(DirectionKey::Right));
        }
        assert_eq!(app.status_line(), "Showing 2 of 4 rows");

        for _ in 0..3 {
            app.handle(Msg::Navigate(DirectionKey::Left));
        }
        let range = app.view.controls[0].range;
        assert_eq!(range.lo, range.min);
        assert!(!range.is_narrowed());
        assert_eq!(app.status_line(), "Showing 4 of 4 rows");
    }

    #[test]
    fn search_typing_rerenders_on_every_keystroke() {
        let catalog = catalog();
        let mut app = app(&catalog);
        app.handle(Msg::FocusSearch);
        assert!(app.search_editing);
        assert_eq!(app.focused_slot(), Some(FilterSlot::Search));

        app.handle(Msg::SearchInput('b'));
        app.handle(Msg::SearchInput('O'));
        assert_eq!(app.renders, 3);
        assert_eq!(app.view.search, "bO");
        assert_eq!(app.status_line(), "Showing 1 of 2 rows");

        app.handle(Msg::SearchBackspace);
        app.handle(Msg::ClearSearch);
        assert_eq!(app.view.search, "");
        app.handle(Msg::Escape);
        assert!(!app.search_editing);
    }

    #[test]
    fn enter_on_search_slot_starts_editing() {
        let catalog = catalog();
        let mut app = app(&catalog);
        app.handle(Msg::NextPane);
        app.handle(Msg::Activate);
        assert!(!app.search_editing, "a range bound is focused first");

        app.handle(Msg::Navigate(DirectionKey::Down));
        app.handle(Msg::Navigate(DirectionKey::Down));
        assert_eq!(app.focused_slot(), Some(FilterSlot::Search));
        app.handle(Msg::Activate);
        assert!(app.search_editing);
    }

    #[test]
    fn results_cursor_stays_inside_rows() {
        let catalog = catalog();
        let mut app = app(&catalog);
        app.handle(Msg::NextPane);
        app.handle(Msg::NextPane);
        assert_eq!(app.pane, Pane::Results);

        app.handle(Msg::Navigate(DirectionKey::Down));
        app.handle(Msg::Navigate(DirectionKey::Down));
        assert_eq!(app.results_offset, 1);
        app.handle(Msg::Navigate(DirectionKey::Up));
        assert_eq!(app.results_offset, 0);
    }

    #[test]
    fn quit_help_and_logs_toggle_flags() {
        let catalog = catalog();
        let mut app = app(&catalog);
        app.handle(Msg::ToggleHelp);
        app.handle(Msg::ToggleLogs);
        assert!(app.show_help);
        assert!(app.show_logs);
        app.handle(Msg::Escape);
        assert!(!app.show_help);
        app.handle(Msg::Quit);
        assert!(app.should_quit);
    }
}

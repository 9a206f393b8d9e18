use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::QueryCatalog;
use crate::connection::ConnectionProvider;
use crate::executor::{execute_named, QueryBackend};
use crate::filters::{self, FilterSet, NumericRange};
use crate::table::{CellValue, ColumnType, ResultTable};

pub const VIEW_TITLE: &str = "MySQL Table Viewer with Filters and Search";

/// Fraction of a control's span moved by one step.
const RANGE_STEPS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// One range selector, derived from a numeric column of the loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeControl {
    pub column: String,
    pub range: NumericRange,
    pub integral: bool,
}

impl RangeControl {
    /// Distance a single key press moves a bound.
    #[must_use]
    pub fn step(&self) -> f64 {
        let span = self.range.max - self.range.min;
        if self.integral {
            (span / RANGE_STEPS).round().max(1.0)
        } else if span > 0.0 {
            span / RANGE_STEPS
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// The filtered table has rows.
    Data,
    /// Nothing to show: empty result, failed query, or every row filtered out.
    NoData,
    /// The cycle stopped before a query could run.
    Halted,
}

/// Everything the front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserView {
    pub title: &'static str,
    pub query_names: Vec<String>,
    pub selected: Option<String>,
    pub controls: Vec<RangeControl>,
    pub search: String,
    pub table: Option<ResultTable>,
    pub total_rows: usize,
    pub notices: Vec<Notice>,
    pub latency: Option<Duration>,
}

impl BrowserView {
    fn new(catalog: &QueryCatalog, selected: Option<String>, search: &str) -> Self {
        Self {
            title: VIEW_TITLE,
            query_names: catalog
                .list_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            selected,
            controls: Vec::new(),
            search: search.to_string(),
            table: None,
            total_rows: 0,
            notices: Vec::new(),
            latency: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState {
        match &self.table {
            Some(table) if !table.is_empty() => ViewState::Data,
            None if self
                .notices
                .iter()
                .any(|notice| notice.level == NoticeLevel::Error) =>
            {
                ViewState::Halted
            }
            _ => ViewState::NoData,
        }
    }

    #[must_use]
    pub fn heading(&self) -> Option<String> {
        self.selected.as_ref().map(|name| format!("Viewing {name}"))
    }
}

/// State of one browsing session: the selected query and its filters.
///
/// Every interaction mutates one of those two inputs and then calls
/// [`BrowserSession::render`], which reruns the whole cycle.
#[derive(Debug)]
pub struct BrowserSession<'c, B: QueryBackend> {
    catalog: &'c QueryCatalog,
    provider: ConnectionProvider<B>,
    selected: Option<String>,
    filters: FilterSet,
}

impl<'c, B: QueryBackend> BrowserSession<'c, B> {
    #[must_use]
    pub fn new(catalog: &'c QueryCatalog, provider: ConnectionProvider<B>) -> Self {
        Self {
            catalog,
            selected: catalog.first_name().map(str::to_string),
            provider,
            filters: FilterSet::default(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &'c QueryCatalog {
        self.catalog
    }

    #[must_use]
    pub fn provider(&self) -> &ConnectionProvider<B> {
        &self.provider
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    /// Switches to another query and drops every filter of the previous one.
    pub fn select_query(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.selected.as_deref() == Some(name.as_str()) {
            return;
        }
        info!(query = %name, "query selected");
        self.selected = Some(name);
        self.filters = FilterSet::default();
    }

    /// Acquire, execute, filter, release. Never fails: problems end up in
    /// [`BrowserView::notices`].
    pub async fn render(&mut self) -> BrowserView {
        let mut view =
            BrowserView::new(self.catalog, self.selected.clone(), self.filters.search());

        let mut lease = match self.provider.acquire().await {
            Ok(lease) => lease,
            Err(error) => {
                view.notices
                    .push(Notice::error(format!("Error connecting to MySQL: {error}")));
                return view;
            }
        };
        view.latency = Some(lease.latency());

        let Some(name) = self.selected.clone() else {
            lease.release().await;
            return view;
        };
        let outcome = execute_named(self.catalog, &name, &mut lease).await;
        lease.release().await;

        if let Some(warning) = &outcome.warning {
            view.notices.push(Notice::warning(warning.to_string()));
        }

        let fetched = outcome.table;
        if self.filters.reconcile(&fetched) {
            debug!(query = %name, "filters reset for new columns");
        }

        if !fetched.is_empty() {
            view.controls = range_controls(&fetched, &self.filters);
        }
        view.search = self.filters.search().to_string();
        view.total_rows = fetched.row_count();
        let filtered = filters::apply(&fetched, &self.filters);
        debug!(
            query = %name,
            fetched = fetched.row_count(),
            shown = filtered.row_count(),
            "render cycle complete"
        );
        view.table = Some(filtered);
        view
    }
}

fn range_controls(table: &ResultTable, filters: &FilterSet) -> Vec<RangeControl> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| column.column_type == ColumnType::Numeric)
        .filter_map(|(index, column)| {
            let range = *filters.range(&column.name)?;
            let integral = table
                .rows()
                .iter()
                .all(|row| !matches!(row.get(index), Some(CellValue::Float(_))));
            Some(RangeControl {
                column: column.name.clone(),
                range,
                integral,
            })
        })
        .collect()
}

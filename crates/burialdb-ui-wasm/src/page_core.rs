#![forbid(unsafe_code)]

//! Platform-independent page state shared by the wasm-bindgen exports and
//! the native test harness. No JS/WASM types here.

use core::fmt;

use burialdb_ui::config::{ConfigError, UiConfig};
use burialdb_ui::fragment::FragmentRequest;
use burialdb_ui::loader::{
    IncrementalLoader, LoaderEvent, LoaderSnapshot, LoaderTransition, ScrollMetrics,
};
use burialdb_ui::rows::{BindReport, Navigation, RowBinder, RowCandidate, RowKey};
use burialdb_ui::scroll_top::ScrollTopButton;
use burialdb_ui::search::{SearchMode, SearchModeView};
use burialdb_ui::visibility::{VisibilityPlan, VisibilityRules};
use tracing::debug;

/// Errors raised while wiring up a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    Config(ConfigError),
    /// Pagination was already activated for this list anchor.
    DuplicateList(String),
    /// No paginated list is registered under this anchor.
    UnknownList(String),
    /// The list anchor id is blank.
    BlankAnchor,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::DuplicateList(anchor) => {
                write!(f, "pagination already active for list {anchor:?}")
            }
            Self::UnknownList(anchor) => write!(f, "no paginated list {anchor:?}"),
            Self::BlankAnchor => write!(f, "list anchor id must not be empty"),
        }
    }
}

impl std::error::Error for PageError {}

impl From<ConfigError> for PageError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// A fetch the host must start for one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub anchor_id: String,
    pub request: FragmentRequest,
}

/// Everything one scroll event asks the host to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub fetches: Vec<PendingFetch>,
    /// New scroll-to-top button visibility, when it changed.
    pub scroll_top_visible: Option<bool>,
}

/// All UI state of one rendered page.
#[derive(Debug)]
pub struct PageCore {
    config: UiConfig,
    loaders: Vec<(String, IncrementalLoader)>,
    rows: RowBinder,
    visibility: VisibilityRules,
    search: SearchMode,
    scroll_top: ScrollTopButton,
}

impl PageCore {
    pub fn new(config: UiConfig) -> Result<Self, PageError> {
        config.validate()?;
        let visibility = config.visibility.rules()?;
        let scroll_top = ScrollTopButton::new(config.scroll_top.threshold_px);
        Ok(Self {
            config,
            loaders: Vec::new(),
            rows: RowBinder::new(),
            visibility,
            search: SearchMode::default(),
            scroll_top,
        })
    }

    /// Build from a JSON config document; blank input means defaults.
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        if json.trim().is_empty() {
            return Self::new(UiConfig::default());
        }
        Self::new(UiConfig::from_json(json)?)
    }

    #[must_use]
    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// Start incremental loading for the list rendered under `anchor_id`.
    pub fn activate_pagination(
        &mut self,
        anchor_id: &str,
        start_page: u32,
        endpoint: &str,
    ) -> Result<(), PageError> {
        let anchor_id = anchor_id.trim();
        if anchor_id.is_empty() {
            return Err(PageError::BlankAnchor);
        }
        if self.loaders.iter().any(|(id, _)| id == anchor_id) {
            return Err(PageError::DuplicateList(anchor_id.to_owned()));
        }
        debug!(anchor = anchor_id, start_page, endpoint, "pagination activated");
        self.loaders.push((
            anchor_id.to_owned(),
            IncrementalLoader::new(start_page, endpoint, &self.config.pagination),
        ));
        Ok(())
    }

    #[must_use]
    pub fn has_paginated_lists(&self) -> bool {
        !self.loaders.is_empty()
    }

    /// Fan one scroll sample out to every live loader and the scroll-to-top
    /// button. Stopped and exhausted lists are skipped.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> ScrollOutcome {
        let fetches = self
            .loaders
            .iter_mut()
            .filter(|(_, loader)| !loader.state().is_terminal())
            .filter_map(|(anchor_id, loader)| {
                let transition = loader.handle_event(LoaderEvent::Scrolled(metrics));
                transition.fetch_request().cloned().map(|request| PendingFetch {
                    anchor_id: anchor_id.clone(),
                    request,
                })
            })
            .collect();
        ScrollOutcome {
            fetches,
            scroll_top_visible: self.scroll_top.update(metrics.scroll_top),
        }
    }

    /// Refresh only the scroll-to-top button, e.g. at page load.
    pub fn update_scroll_top(&mut self, scroll_top: f64) -> Option<bool> {
        self.scroll_top.update(scroll_top)
    }

    /// Feed a fetch completion back to the list's loader.
    pub fn on_fetch_complete(
        &mut self,
        anchor_id: &str,
        event: LoaderEvent,
    ) -> Result<LoaderTransition, PageError> {
        let loader = self.loader_mut(anchor_id)?;
        Ok(loader.handle_event(event))
    }

    pub fn loader_snapshot(&self, anchor_id: &str) -> Result<LoaderSnapshot, PageError> {
        self.loaders
            .iter()
            .find(|(id, _)| id == anchor_id)
            .map(|(_, loader)| loader.snapshot())
            .ok_or_else(|| PageError::UnknownList(anchor_id.to_owned()))
    }

    /// Transition JSONL of every list, in activation order.
    pub fn drain_transition_jsonl(&mut self, run_id: &str) -> Vec<String> {
        self.loaders
            .iter_mut()
            .flat_map(|(_, loader)| loader.drain_transition_jsonl(run_id))
            .collect()
    }

    pub fn bind_rows(
        &mut self,
        candidates: impl IntoIterator<Item = RowCandidate>,
    ) -> BindReport {
        self.rows.bind(candidates)
    }

    #[must_use]
    pub fn navigation_for(&self, key: RowKey) -> Option<Navigation> {
        self.rows.navigation_for(key)
    }

    #[must_use]
    pub fn visibility_plan(&self, state_value: &str) -> VisibilityPlan {
        self.visibility.plan(state_value)
    }

    /// Adopt the mode rendered by the server.
    pub fn init_search(&mut self, flag: &str) -> SearchModeView {
        self.search = SearchMode::from_flag(flag);
        self.search.view()
    }

    pub fn toggle_search(&mut self) -> SearchMode {
        self.search = self.search.toggled();
        self.search
    }

    #[must_use]
    pub fn search_mode(&self) -> SearchMode {
        self.search
    }

    fn loader_mut(&mut self, anchor_id: &str) -> Result<&mut IncrementalLoader, PageError> {
        self.loaders
            .iter_mut()
            .find(|(id, _)| id == anchor_id)
            .map(|(_, loader)| loader)
            .ok_or_else(|| PageError::UnknownList(anchor_id.to_owned()))
    }
}

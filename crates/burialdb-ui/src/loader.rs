#![forbid(unsafe_code)]

//! Incremental list loader.
//!
//! Appends further pages of a server-rendered list when the user scrolls to
//! the bottom of the page. [`IncrementalLoader`] is a deterministic state
//! machine: the host feeds it [`LoaderEvent`]s and executes the
//! [`LoaderAction`]s recorded in each [`LoaderTransition`]. The network
//! request itself is [`run_fetch`], an async task whose result the host
//! feeds back as the completion event. No borrow of the loader is needed
//! while the request is pending.
//!
//! # Lifecycle
//!
//! ```text
//!           bottom reached              fetch ok
//!   Idle ───────────────────> Fetching ──────────> Idle
//!                                │  └─ blank / has_next=false ─> Exhausted
//!                                └─ fetch failed ─────────────> Stopped
//! ```
//!
//! `Stopped` and `Exhausted` are terminal for the lifetime of the page.
//! While `Fetching`, further bottom-of-page scrolls are ignored, so the page
//! requested is always `cursor + 1`.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, trace};

use crate::config::PaginationConfig;
use crate::fragment::{
    FragmentEndpoint, FragmentFetchError, FragmentPayload, FragmentRequest, FragmentSource,
};

/// Default slack (CSS px) for the bottom-of-page test.
pub const DEFAULT_BOTTOM_TOLERANCE_PX: f64 = 1.0;

/// Schema tag for transition JSONL lines.
pub const TRANSITION_SCHEMA_VERSION: &str = "burialdb-ui-jsonl-v1";

const TRANSITION_LOG_CAPACITY: usize = 512;

/// Loader lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderState {
    Idle,
    Fetching,
    /// A fetch failed; no further pages are requested.
    Stopped,
    /// The server signalled the end of the list.
    Exhausted,
}

impl LoaderState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Stopped => "stopped",
            Self::Exhausted => "exhausted",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Exhausted)
    }
}

/// Event classes recorded in transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderEventKind {
    Scrolled,
    FetchSucceeded,
    FetchFailed,
}

impl LoaderEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scrolled => "scrolled",
            Self::FetchSucceeded => "fetch_succeeded",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

/// Viewport geometry sampled on a scroll event (CSS px).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Current vertical scroll offset of the window.
    pub scroll_top: f64,
    /// Total scrollable height of the document.
    pub document_height: f64,
    /// Height of the visible viewport.
    pub viewport_height: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub const fn new(scroll_top: f64, document_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_top,
            document_height,
            viewport_height,
        }
    }

    /// Largest reachable scroll offset.
    #[must_use]
    pub fn max_offset(&self) -> f64 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    /// Whether the viewport sits within `tolerance_px` of the bottom.
    ///
    /// Overscroll (offset past the maximum, as on elastic touch scrolling)
    /// counts as the bottom. Non-finite samples never do.
    #[must_use]
    pub fn is_at_bottom(&self, tolerance_px: f64) -> bool {
        if !(self.scroll_top.is_finite()
            && self.document_height.is_finite()
            && self.viewport_height.is_finite())
        {
            return false;
        }
        self.max_offset() - self.scroll_top <= tolerance_px
    }
}

/// Input events accepted by the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    Scrolled(ScrollMetrics),
    FetchSucceeded {
        page: u32,
        payload: FragmentPayload,
    },
    FetchFailed {
        page: u32,
        error: FragmentFetchError,
    },
}

/// Side effects the host performs after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoaderAction {
    /// Issue the request, then feed its outcome back (see [`run_fetch`]).
    Fetch(FragmentRequest),
    /// Insert `content` after the last row of the list.
    InsertFragment { page: u32, content: String },
    /// Re-run the row navigation binder over the list.
    BindRows,
    /// Re-activate tooltip/popover widgets in the inserted rows.
    ActivateWidgets { page: u32 },
}

/// Snapshot returned to host callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderSnapshot {
    pub state: LoaderState,
    pub start_page: u32,
    pub cursor: u32,
    pub pages_loaded: u32,
    pub in_flight_page: Option<u32>,
    pub failure_code: Option<String>,
}

/// Transition record and deterministic log payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderTransition {
    pub seq: u64,
    pub event: LoaderEventKind,
    pub from_state: LoaderState,
    pub to_state: LoaderState,
    pub cursor: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flight_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<String>,
    pub actions: Vec<LoaderAction>,
}

impl LoaderTransition {
    /// The request to issue, if this transition started one.
    #[must_use]
    pub fn fetch_request(&self) -> Option<&FragmentRequest> {
        self.actions.iter().find_map(|action| match action {
            LoaderAction::Fetch(request) => Some(request),
            _ => None,
        })
    }

    /// Serialize one JSONL transition line for diagnostics.
    #[must_use]
    pub fn to_jsonl_line(&self, run_id: &str) -> String {
        let record = LoaderTransitionJsonl {
            schema_version: TRANSITION_SCHEMA_VERSION,
            event: "loader_state_transition",
            run_id,
            transition_seq: self.seq,
            loader_event: self.event.as_str(),
            from_state: self.from_state.as_str(),
            to_state: self.to_state.as_str(),
            cursor: self.cursor,
            in_flight_page: self.in_flight_page,
            reason: self.reason.as_deref(),
            failure_code: self.failure_code.as_deref(),
            actions: &self.actions,
        };
        match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(error) => serde_json::to_string(&json!({
                "schema_version": TRANSITION_SCHEMA_VERSION,
                "event": "loader_state_transition_encode_error",
                "run_id": run_id,
                "transition_seq": self.seq,
                "error": error.to_string(),
            }))
            .unwrap_or_else(|_| {
                concat!(
                    r#"{"schema_version":"burialdb-ui-jsonl-v1","#,
                    r#""event":"loader_state_transition_encode_error"}"#,
                )
                .to_owned()
            }),
        }
    }
}

#[derive(Serialize)]
struct LoaderTransitionJsonl<'a> {
    schema_version: &'static str,
    event: &'static str,
    run_id: &'a str,
    transition_seq: u64,
    loader_event: &'static str,
    from_state: &'static str,
    to_state: &'static str,
    cursor: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_flight_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_code: Option<&'a str>,
    actions: &'a [LoaderAction],
}

/// Pagination state for one list on the page.
#[derive(Debug, Clone)]
pub struct IncrementalLoader {
    endpoint: FragmentEndpoint,
    bottom_tolerance_px: f64,
    exhaust_on_blank: bool,
    start_page: u32,
    cursor: u32,
    state: LoaderState,
    in_flight_page: Option<u32>,
    failure_code: Option<String>,
    transition_seq: u64,
    transitions: VecDeque<LoaderTransition>,
}

impl IncrementalLoader {
    /// `start_page` is the page the server already rendered.
    #[must_use]
    pub fn new(start_page: u32, endpoint: impl Into<String>, config: &PaginationConfig) -> Self {
        Self {
            endpoint: FragmentEndpoint::with_page_param(endpoint, config.page_param.clone()),
            bottom_tolerance_px: config.bottom_tolerance_px,
            exhaust_on_blank: config.exhaust_on_blank,
            start_page,
            cursor: start_page,
            state: LoaderState::Idle,
            in_flight_page: None,
            failure_code: None,
            transition_seq: 0,
            transitions: VecDeque::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> LoaderState {
        self.state
    }

    /// Last page successfully loaded.
    #[must_use]
    pub const fn cursor(&self) -> u32 {
        self.cursor
    }

    #[must_use]
    pub fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            state: self.state,
            start_page: self.start_page,
            cursor: self.cursor,
            pages_loaded: self.cursor.saturating_sub(self.start_page),
            in_flight_page: self.in_flight_page,
            failure_code: self.failure_code.clone(),
        }
    }

    pub fn handle_event(&mut self, event: LoaderEvent) -> LoaderTransition {
        match event {
            LoaderEvent::Scrolled(metrics) => self.on_scrolled(metrics),
            LoaderEvent::FetchSucceeded { page, payload } => self.on_fetch_succeeded(page, payload),
            LoaderEvent::FetchFailed { page, error } => self.on_fetch_failed(page, &error),
        }
    }

    #[must_use]
    pub fn drain_transitions(&mut self) -> Vec<LoaderTransition> {
        self.transitions.drain(..).collect()
    }

    #[must_use]
    pub fn drain_transition_jsonl(&mut self, run_id: &str) -> Vec<String> {
        self.drain_transitions()
            .into_iter()
            .map(|transition| transition.to_jsonl_line(run_id))
            .collect()
    }

    fn on_scrolled(&mut self, metrics: ScrollMetrics) -> LoaderTransition {
        let from_state = self.state;
        let mut actions = Vec::new();

        let reason = match self.state {
            LoaderState::Stopped => Some("loading_stopped"),
            LoaderState::Exhausted => Some("list_exhausted"),
            LoaderState::Fetching => Some("fetch_in_flight"),
            LoaderState::Idle if !metrics.is_at_bottom(self.bottom_tolerance_px) => {
                Some("not_at_bottom")
            }
            LoaderState::Idle => match self.cursor.checked_add(1) {
                Some(next_page) => {
                    self.state = LoaderState::Fetching;
                    self.in_flight_page = Some(next_page);
                    actions.push(LoaderAction::Fetch(self.endpoint.request(next_page)));
                    None
                }
                None => {
                    self.state = LoaderState::Exhausted;
                    Some("page_number_overflow")
                }
            },
        };

        self.record_transition(
            LoaderEventKind::Scrolled,
            from_state,
            reason.map(str::to_owned),
            actions,
        )
    }

    fn on_fetch_succeeded(&mut self, page: u32, payload: FragmentPayload) -> LoaderTransition {
        let from_state = self.state;
        let mut actions = Vec::new();

        if !self.is_awaiting(page) {
            return self.record_transition(
                LoaderEventKind::FetchSucceeded,
                from_state,
                Some("stale_completion".to_owned()),
                actions,
            );
        }

        self.cursor = page;
        self.in_flight_page = None;

        let blank = payload.is_blank();
        if !blank {
            actions.push(LoaderAction::InsertFragment {
                page,
                content: payload.content,
            });
            actions.push(LoaderAction::BindRows);
            actions.push(LoaderAction::ActivateWidgets { page });
        }

        // An explicit hint from the server overrides the blank-content rule.
        let exhausted = payload.has_next.map_or(blank && self.exhaust_on_blank, |next| !next);
        let reason = if exhausted {
            self.state = LoaderState::Exhausted;
            Some("list_exhausted".to_owned())
        } else {
            self.state = LoaderState::Idle;
            None
        };

        self.record_transition(LoaderEventKind::FetchSucceeded, from_state, reason, actions)
    }

    fn on_fetch_failed(&mut self, page: u32, error: &FragmentFetchError) -> LoaderTransition {
        let from_state = self.state;

        if !self.is_awaiting(page) {
            return self.record_transition(
                LoaderEventKind::FetchFailed,
                from_state,
                Some("stale_completion".to_owned()),
                Vec::new(),
            );
        }

        self.state = LoaderState::Stopped;
        self.in_flight_page = None;
        self.failure_code = Some(error.code());

        self.record_transition(
            LoaderEventKind::FetchFailed,
            from_state,
            Some(error.to_string()),
            Vec::new(),
        )
    }

    fn is_awaiting(&self, page: u32) -> bool {
        self.state == LoaderState::Fetching && self.in_flight_page == Some(page)
    }

    fn record_transition(
        &mut self,
        event: LoaderEventKind,
        from_state: LoaderState,
        reason: Option<String>,
        actions: Vec<LoaderAction>,
    ) -> LoaderTransition {
        self.transition_seq = self.transition_seq.saturating_add(1);
        let transition = LoaderTransition {
            seq: self.transition_seq,
            event,
            from_state,
            to_state: self.state,
            cursor: self.cursor,
            in_flight_page: self.in_flight_page,
            reason,
            failure_code: self.failure_code.clone(),
            actions,
        };

        if transition.from_state != transition.to_state {
            debug!(
                event = event.as_str(),
                from = from_state.as_str(),
                to = self.state.as_str(),
                cursor = self.cursor,
                reason = transition.reason.as_deref(),
                "loader transition"
            );
        } else {
            trace!(
                event = event.as_str(),
                state = self.state.as_str(),
                reason = transition.reason.as_deref(),
                "loader event ignored"
            );
        }

        if self.transitions.len() >= TRANSITION_LOG_CAPACITY {
            let _ = self.transitions.pop_front();
        }
        self.transitions.push_back(transition.clone());
        transition
    }
}

/// Perform one fragment request and turn its outcome into the completion
/// event for [`IncrementalLoader::handle_event`].
pub async fn run_fetch<S: FragmentSource>(source: &S, request: FragmentRequest) -> LoaderEvent {
    match source.fetch(&request).await {
        Ok(payload) => LoaderEvent::FetchSucceeded {
            page: request.page,
            payload,
        },
        Err(error) => LoaderEvent::FetchFailed {
            page: request.page,
            error,
        },
    }
}

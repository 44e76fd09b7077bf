#![forbid(unsafe_code)]

//! Host-independent UI behaviors for the burialdb web application.
//!
//! Each module is a small state object driven by plain values read from the
//! page; none of them touch the DOM. The `burialdb-ui-wasm` crate reads the
//! DOM, feeds these objects, and applies what they decide.
//!
//! - [`loader`]: infinite-scroll pagination of server-rendered lists.
//! - [`fragment`]: the fragment endpoint contract the loader calls.
//! - [`rows`]: click-to-navigate table rows.
//! - [`visibility`]: field groups shown or hidden by a state selector.
//! - [`search`], [`copy_field`], [`scroll_top`]: form and page helpers.
//! - [`config`]: page configuration with defaults matching the templates.

pub mod config;
pub mod copy_field;
pub mod fragment;
pub mod loader;
pub mod rows;
pub mod scroll_top;
pub mod search;
pub mod visibility;

pub use config::{ConfigError, UiConfig};
pub use fragment::{FragmentFetchError, FragmentPayload, FragmentRequest, FragmentSource};
pub use loader::{
    IncrementalLoader, LoaderAction, LoaderEvent, LoaderState, LoaderTransition, ScrollMetrics,
    run_fetch,
};
pub use rows::{Navigation, RowBinder, RowCandidate, RowKey};
pub use search::SearchMode;
pub use visibility::{VisibilityPlan, VisibilityRules};

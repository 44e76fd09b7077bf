#![forbid(unsafe_code)]

//! Browser glue for the burialdb pages.
//!
//! [`page_core::PageCore`] holds all UI state of one page and is plain Rust,
//! so it builds and tests natively. On `wasm32` the crate also exports
//! `BurialDbPage`, which reads the DOM, feeds the core, and applies its
//! decisions with `web-sys`.
//!
//! ```text
//! const page = new BurialDbPage({ pagination: { bottomTolerancePx: 2 } });
//! page.init();
//! page.activatePagination(1, "/persons/", "person-list");
//! ```

pub mod page_core;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod fetch;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::BurialDbPage;

pub use page_core::{PageCore, PageError, PendingFetch, ScrollOutcome};

#[cfg(test)]
mod tests {
    use super::page_core::{PageCore, PageError};
    use burialdb_ui::fragment::{FragmentFetchError, FragmentPayload};
    use burialdb_ui::loader::{LoaderAction, LoaderEvent, LoaderState, ScrollMetrics};
    use burialdb_ui::rows::{Navigation, RowCandidate};
    use burialdb_ui::search::SearchMode;
    use pretty_assertions::assert_eq;

    const AT_BOTTOM: ScrollMetrics = ScrollMetrics::new(1200.0, 2000.0, 800.0);
    const NEAR_TOP: ScrollMetrics = ScrollMetrics::new(50.0, 2000.0, 800.0);

    fn page() -> PageCore {
        PageCore::from_json("").expect("defaults are valid")
    }

    #[test]
    fn page_core_rejects_invalid_config() {
        let err = PageCore::from_json(r#"{"hiddenClass":""}"#).expect_err("blank class");
        assert!(matches!(err, PageError::Config(_)));
    }

    #[test]
    fn page_core_activation_validates_anchor() {
        let mut core = page();
        assert_eq!(
            core.activate_pagination("  ", 1, "/persons/"),
            Err(PageError::BlankAnchor)
        );
        core.activate_pagination("person-list", 1, "/persons/")
            .expect("first activation");
        assert_eq!(
            core.activate_pagination("person-list", 1, "/persons/"),
            Err(PageError::DuplicateList("person-list".to_owned()))
        );
        assert!(core.has_paginated_lists());
    }

    #[test]
    fn page_core_scroll_fans_out_to_every_list() {
        let mut core = page();
        core.activate_pagination("persons", 1, "/persons/").expect("persons");
        core.activate_pagination("hospitals", 4, "/hospitals/").expect("hospitals");

        let outcome = core.on_scroll(AT_BOTTOM);
        let urls: Vec<_> = outcome
            .fetches
            .iter()
            .map(|f| (f.anchor_id.as_str(), f.request.url.as_str()))
            .collect();
        assert_eq!(
            urls,
            vec![("persons", "/persons/?page=2"), ("hospitals", "/hospitals/?page=5")]
        );
        assert_eq!(outcome.scroll_top_visible, Some(true));
    }

    #[test]
    fn page_core_scroll_without_lists_still_drives_scroll_top() {
        let mut core = page();
        assert_eq!(core.on_scroll(NEAR_TOP).scroll_top_visible, Some(false));
        assert_eq!(core.on_scroll(NEAR_TOP).scroll_top_visible, None);
        let outcome = core.on_scroll(AT_BOTTOM);
        assert!(outcome.fetches.is_empty());
        assert_eq!(outcome.scroll_top_visible, Some(true));
    }

    #[test]
    fn page_core_load_time_scroll_top_issues_no_fetch() {
        let mut core = page();
        core.activate_pagination("persons", 1, "/persons/").expect("persons");
        assert_eq!(core.update_scroll_top(1200.0), Some(true));
        let snapshot = core.loader_snapshot("persons").expect("persons");
        assert_eq!(snapshot.state, LoaderState::Idle);
        assert_eq!(snapshot.in_flight_page, None);
        // Already visible, so the next scroll reports no change.
        assert_eq!(core.on_scroll(AT_BOTTOM).scroll_top_visible, None);
    }

    #[test]
    fn page_core_completion_routes_to_its_list() {
        let mut core = page();
        core.activate_pagination("persons", 1, "/persons/").expect("persons");
        core.activate_pagination("hospitals", 1, "/hospitals/").expect("hospitals");
        core.on_scroll(AT_BOTTOM);

        let ok = core
            .on_fetch_complete(
                "persons",
                LoaderEvent::FetchSucceeded {
                    page: 2,
                    payload: FragmentPayload::new("<tr></tr>"),
                },
            )
            .expect("known list");
        assert!(ok.actions.contains(&LoaderAction::BindRows));

        core.on_fetch_complete(
            "hospitals",
            LoaderEvent::FetchFailed {
                page: 2,
                error: FragmentFetchError::Status(500),
            },
        )
        .expect("known list");

        let persons = core.loader_snapshot("persons").expect("persons");
        let hospitals = core.loader_snapshot("hospitals").expect("hospitals");
        assert_eq!((persons.state, persons.cursor), (LoaderState::Idle, 2));
        assert_eq!((hospitals.state, hospitals.cursor), (LoaderState::Stopped, 1));

        assert_eq!(
            core.on_fetch_complete(
                "cemeteries",
                LoaderEvent::FetchFailed {
                    page: 2,
                    error: FragmentFetchError::Status(500),
                },
            ),
            Err(PageError::UnknownList("cemeteries".to_owned()))
        );
    }

    #[test]
    fn page_core_skips_finished_lists_on_scroll() {
        let mut core = page();
        core.activate_pagination("persons", 1, "/persons/").expect("persons");
        core.on_scroll(AT_BOTTOM);
        core.on_fetch_complete(
            "persons",
            LoaderEvent::FetchFailed {
                page: 2,
                error: FragmentFetchError::Transport("offline".to_owned()),
            },
        )
        .expect("known list");
        let logged = core.drain_transition_jsonl("run");
        assert_eq!(logged.len(), 2);

        for _ in 0..5 {
            assert!(core.on_scroll(AT_BOTTOM).fetches.is_empty());
        }
        assert!(core.drain_transition_jsonl("run").is_empty());
        let snapshot = core.loader_snapshot("persons").expect("persons");
        assert_eq!(snapshot.state, LoaderState::Stopped);
        assert_eq!(snapshot.failure_code.as_deref(), Some("transport"));
    }

    #[test]
    fn page_core_rows_and_search() {
        let mut core = page();
        let report = core.bind_rows(vec![RowCandidate {
            href: Some("/persons/3/".to_owned()),
            target: Some("_blank".to_owned()),
            ..RowCandidate::default()
        }]);
        assert_eq!(
            core.navigation_for(report.bound[0].key),
            Some(Navigation::NewContext("/persons/3/".to_owned()))
        );

        let view = core.init_search("1");
        assert!(view.fields_visible);
        assert!(view.off_control_visible);
        assert!(!view.on_control_visible);
        assert_eq!(core.toggle_search(), SearchMode::Basic);
        assert_eq!(core.search_mode().flag(), "0");
    }

    #[test]
    fn page_core_visibility_uses_configured_preset() {
        let core = PageCore::from_json(r#"{"visibility":{"preset":"state_codes"}}"#)
            .expect("valid preset");
        let plan = core.visibility_plan("2");
        assert!(plan.is_hidden("hide-if-state-2"));
        assert!(!plan.is_hidden("hide-if-state-1"));
    }

    #[test]
    fn page_core_drains_jsonl_from_all_lists() {
        let mut core = page();
        core.activate_pagination("a", 1, "/a/").expect("a");
        core.activate_pagination("b", 1, "/b/").expect("b");
        core.on_scroll(AT_BOTTOM);
        let lines = core.drain_transition_jsonl("run-1");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.contains("\"run_id\":\"run-1\"")));
        assert!(core.drain_transition_jsonl("run-1").is_empty());
    }
}

#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`BurialDbPage`].
//!
//! Wraps [`super::page_core::PageCore`] in `Rc<RefCell<_>>` and wires it to
//! DOM events. No `RefCell` borrow is held across an `.await` or across a
//! call into JS.

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use burialdb_ui::copy_field::CopyFieldSpec;
use burialdb_ui::loader::{LoaderAction, run_fetch};
use burialdb_ui::rows::{Navigation, RowCandidate, RowKey};
use burialdb_ui::search::SearchModeView;
use js_sys::{Array, Function, Reflect};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, ScrollBehavior, ScrollToOptions};

use crate::dom::{self, DomError};
use crate::fetch::BrowserFragmentSource;
use crate::logging::{init_console_logging, install_panic_hook};
use crate::page_core::{PageCore, PendingFetch};

const DEFAULT_RUN_ID: &str = "burialdb-ui";
/// Set on controls whose listener is installed; `init` skips them.
const BOUND_ATTRIBUTE: &str = "data-burialdb-bound";

type Listener = Closure<dyn FnMut(Event)>;

/// State reachable from event listeners and fetch tasks.
struct Shared {
    core: RefCell<PageCore>,
    on_fragment_inserted: RefCell<Option<Function>>,
    /// Installed listeners; they live as long as the page.
    listeners: RefCell<Vec<Listener>>,
}

impl Shared {
    fn listen(
        &self,
        target: &web_sys::EventTarget,
        event: &str,
        listener: Listener,
    ) -> Result<(), DomError> {
        target.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())?;
        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    /// Attach `listener` unless `element` already carries [`BOUND_ATTRIBUTE`].
    fn listen_once(
        &self,
        element: &Element,
        event: &str,
        listener: Listener,
    ) -> Result<(), DomError> {
        if element.has_attribute(BOUND_ATTRIBUTE) {
            trace!(id = element.id().as_str(), event, "control already bound");
            return Ok(());
        }
        self.listen(element, event, listener)?;
        element.set_attribute(BOUND_ATTRIBUTE, event)?;
        Ok(())
    }

    fn hidden_class(&self) -> String {
        self.core.borrow().config().hidden_class.clone()
    }
}

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// The options object as a JSON document. A string is taken as JSON as-is.
fn options_json(options: &Option<JsValue>) -> Result<String, JsValue> {
    let Some(obj) = options.as_ref().filter(|v| !v.is_null() && !v.is_undefined()) else {
        return Ok(String::new());
    };
    if let Some(text) = obj.as_string() {
        return Ok(text);
    }
    Ok(String::from(js_sys::JSON::stringify(obj)?))
}

fn parse_init_string(options: &Option<JsValue>, key: &str) -> Option<String> {
    let obj = options.as_ref()?;
    Reflect::get(obj, &JsValue::from_str(key)).ok()?.as_string()
}

fn parse_init_function(options: &Option<JsValue>, key: &str) -> Option<Function> {
    let obj = options.as_ref()?;
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Interactive behavior of one rendered page.
///
/// Options (all optional) follow the page config in camelCase, plus
/// `runId` for transition logs and an `onFragmentInserted(anchorId, page)`
/// callback that re-activates tooltips and popovers in appended rows.
#[wasm_bindgen]
pub struct BurialDbPage {
    shared: Rc<Shared>,
    run_id: String,
    initialized: bool,
    scroll_listening: bool,
}

#[wasm_bindgen]
impl BurialDbPage {
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<JsValue>) -> Result<BurialDbPage, JsValue> {
        install_panic_hook();
        let core = PageCore::from_json(&options_json(&options)?).map_err(js_error)?;
        init_console_logging(core.config().log_level().map_err(js_error)?);

        Ok(Self {
            shared: Rc::new(Shared {
                core: RefCell::new(core),
                on_fragment_inserted: RefCell::new(parse_init_function(
                    &options,
                    "onFragmentInserted",
                )),
                listeners: RefCell::new(Vec::new()),
            }),
            run_id: parse_init_string(&options, "runId")
                .unwrap_or_else(|| DEFAULT_RUN_ID.to_owned()),
            initialized: false,
            scroll_listening: false,
        })
    }

    /// Bind everything already on the page. Later calls do nothing; a call
    /// that failed part-way can be retried without binding a control twice.
    pub fn init(&mut self) -> Result<(), JsValue> {
        if self.initialized {
            return Ok(());
        }
        let document = dom::document()?;
        bind_rows(&self.shared, &document)?;
        init_visibility(&self.shared, &document)?;
        init_search(&self.shared, &document)?;
        init_copy_fields(&self.shared, &document)?;
        init_scroll_top(&self.shared, &document)?;
        self.ensure_scroll_listener()?;
        self.initialized = true;
        debug!("page initialized");
        Ok(())
    }

    /// Append further pages to the list under `list_anchor` as the user
    /// scrolls. `start_page` is the last page the server already rendered.
    #[wasm_bindgen(js_name = activatePagination)]
    pub fn activate_pagination(
        &mut self,
        start_page: u32,
        endpoint: &str,
        list_anchor: &str,
    ) -> Result<(), JsValue> {
        self.shared
            .core
            .borrow_mut()
            .activate_pagination(list_anchor, start_page, endpoint)
            .map_err(js_error)?;
        self.ensure_scroll_listener()
    }

    /// Bind rows not bound yet; returns how many were bound.
    #[wasm_bindgen(js_name = bindRows)]
    pub fn bind_rows(&self) -> Result<u32, JsValue> {
        Ok(bind_rows(&self.shared, &dom::document()?)?)
    }

    #[wasm_bindgen(js_name = setFragmentInsertedHook)]
    pub fn set_fragment_inserted_hook(&self, callback: Option<Function>) {
        *self.shared.on_fragment_inserted.borrow_mut() = callback;
    }

    /// `{ state, start_page, cursor, pages_loaded, in_flight_page, failure_code }`.
    #[wasm_bindgen(js_name = loaderSnapshot)]
    pub fn loader_snapshot(&self, list_anchor: &str) -> Result<JsValue, JsValue> {
        let snapshot = self
            .shared
            .core
            .borrow()
            .loader_snapshot(list_anchor)
            .map_err(js_error)?;
        let json = serde_json::to_string(&snapshot).map_err(js_error)?;
        js_sys::JSON::parse(&json)
    }

    /// Drain buffered loader transitions as JSONL lines.
    #[wasm_bindgen(js_name = drainTransitionJsonl)]
    pub fn drain_transition_jsonl(&self) -> Array {
        self.shared
            .core
            .borrow_mut()
            .drain_transition_jsonl(&self.run_id)
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    /// Current advanced-search flag, `"0"` or `"1"`.
    #[wasm_bindgen(js_name = searchMode)]
    pub fn search_mode(&self) -> String {
        self.shared.core.borrow().search_mode().flag().to_owned()
    }
}

impl BurialDbPage {
    fn ensure_scroll_listener(&mut self) -> Result<(), JsValue> {
        if self.scroll_listening {
            return Ok(());
        }
        let window = dom::window()?;
        let shared = Rc::clone(&self.shared);
        let listener = Closure::<dyn FnMut(Event)>::new(move |_event: Event| on_scroll(&shared));
        self.shared.listen(&window, "scroll", listener)?;
        self.scroll_listening = true;
        Ok(())
    }
}

fn on_scroll(shared: &Rc<Shared>) {
    let metrics = match dom::window()
        .and_then(|window| dom::scroll_metrics(&window, &dom::document()?))
    {
        Ok(metrics) => metrics,
        Err(err) => {
            warn!(%err, "scroll metrics unavailable");
            return;
        }
    };
    let outcome = shared.core.borrow_mut().on_scroll(metrics);
    if let Some(visible) = outcome.scroll_top_visible {
        if let Err(err) = show_scroll_top(shared, visible) {
            warn!(%err, "scroll-to-top update failed");
        }
    }
    for pending in outcome.fetches {
        spawn_fetch(Rc::clone(shared), pending);
    }
}

fn spawn_fetch(shared: Rc<Shared>, pending: PendingFetch) {
    spawn_local(async move {
        let PendingFetch { anchor_id, request } = pending;
        let event = run_fetch(&BrowserFragmentSource, request).await;
        let transition = shared.core.borrow_mut().on_fetch_complete(&anchor_id, event);
        match transition {
            Ok(transition) => apply_loader_actions(&shared, &anchor_id, &transition.actions),
            Err(err) => warn!(%err, "fetch completed for an unregistered list"),
        }
    });
}

fn apply_loader_actions(shared: &Rc<Shared>, anchor_id: &str, actions: &[LoaderAction]) {
    let document = match dom::document() {
        Ok(document) => document,
        Err(err) => {
            warn!(%err, "cannot apply loader actions");
            return;
        }
    };
    for action in actions {
        match action {
            // Requests are only started from scroll events.
            LoaderAction::Fetch(_) => {}
            LoaderAction::InsertFragment { page, content } => {
                if let Err(err) = dom::insert_after_last_row(&document, anchor_id, content) {
                    warn!(%err, page, anchor = anchor_id, "fragment insertion failed");
                }
            }
            LoaderAction::BindRows => {
                if let Err(err) = bind_rows(shared, &document) {
                    warn!(%err, "row binding failed");
                }
            }
            LoaderAction::ActivateWidgets { page } => {
                let hook = shared.on_fragment_inserted.borrow().clone();
                let Some(hook) = hook else {
                    trace!(page, anchor = anchor_id, "no onFragmentInserted hook set");
                    continue;
                };
                let anchor = JsValue::from_str(anchor_id);
                if let Err(err) = hook.call2(&JsValue::NULL, &anchor, &JsValue::from(*page)) {
                    warn!(error = ?err, page, "onFragmentInserted threw");
                }
            }
        }
    }
}

fn bind_rows(shared: &Rc<Shared>, document: &Document) -> Result<u32, DomError> {
    let config = shared.core.borrow().config().rows.clone();
    let elements = dom::query_all(document, &config.selector)?;
    let candidates = elements.iter().map(|element| RowCandidate {
        key: element.get_attribute(&config.key_attribute),
        href: element.get_attribute(&config.href_attribute),
        target: element.get_attribute(&config.target_attribute),
        new_window: element.get_attribute(&config.new_window_attribute),
    });
    let report = shared.core.borrow_mut().bind_rows(candidates);

    for (index, err) in &report.rejected {
        debug!(%err, index, "clickable row skipped");
    }
    for bound in &report.bound {
        let Some(element) = elements.get(bound.index) else {
            continue;
        };
        element.set_attribute(&config.key_attribute, &bound.key.to_string())?;
        let key = bound.key;
        let click_shared = Rc::clone(shared);
        let listener =
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| navigate(&click_shared, key));
        shared.listen(element, "click", listener)?;
    }
    Ok(u32::try_from(report.bound.len()).unwrap_or(u32::MAX))
}

fn navigate(shared: &Shared, key: RowKey) {
    let Some(navigation) = shared.core.borrow().navigation_for(key) else {
        return;
    };
    let result = dom::window().map_err(js_error).and_then(|window| match &navigation {
        Navigation::SameContext(href) => window.location().set_href(href),
        Navigation::NewContext(href) => window.open_with_url_and_target(href, "_blank").map(drop),
    });
    if let Err(err) = result {
        warn!(href = navigation.href(), error = ?err, "row navigation failed");
    }
}

fn init_visibility(shared: &Rc<Shared>, document: &Document) -> Result<(), DomError> {
    let selector_id = shared.core.borrow().config().visibility.selector_id.clone();
    let Some(select) = dom::by_id(document, &selector_id) else {
        return Ok(());
    };
    apply_visibility(shared, document, &select)?;

    let change_shared = Rc::clone(shared);
    let change_document = document.clone();
    let change_select = select.clone();
    let listener = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        if let Err(err) = apply_visibility(&change_shared, &change_document, &change_select) {
            warn!(%err, "field visibility update failed");
        }
    });
    shared.listen_once(&select, "change", listener)
}

fn apply_visibility(
    shared: &Shared,
    document: &Document,
    select: &Element,
) -> Result<(), DomError> {
    let value = dom::control_value(select).unwrap_or_default();
    let plan = shared.core.borrow().visibility_plan(&value);
    let hidden_class = shared.hidden_class();
    // Show first so an element in both a shown and a hidden group ends hidden.
    for (groups, hidden) in [(&plan.shown, false), (&plan.hidden, true)] {
        for group in groups {
            for element in dom::query_all(document, &format!(".{group}"))? {
                dom::set_hidden(&element, &hidden_class, hidden)?;
            }
        }
    }
    debug!(value = value.as_str(), hidden = ?plan.hidden, "field visibility applied");
    Ok(())
}

fn init_search(shared: &Rc<Shared>, document: &Document) -> Result<(), DomError> {
    let config = shared.core.borrow().config().search.clone();
    let Some(flag_input) = dom::by_id(document, &config.flag_input_id) else {
        return Ok(());
    };
    let flag = dom::control_value(&flag_input).unwrap_or_default();
    let view = shared.core.borrow_mut().init_search(&flag);
    apply_search_view(shared, document, view)?;

    for control_id in [&config.on_control_id, &config.off_control_id] {
        let Some(control) = dom::by_id(document, control_id) else {
            continue;
        };
        let click_shared = Rc::clone(shared);
        let click_document = document.clone();
        let click_input = flag_input.clone();
        let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            let mode = click_shared.core.borrow_mut().toggle_search();
            dom::set_control_value(&click_input, mode.flag());
            if let Err(err) = apply_search_view(&click_shared, &click_document, mode.view()) {
                warn!(%err, "advanced search toggle failed");
            }
        });
        shared.listen_once(&control, "click", listener)?;
    }
    Ok(())
}

fn apply_search_view(
    shared: &Shared,
    document: &Document,
    view: SearchModeView,
) -> Result<(), DomError> {
    let config = shared.core.borrow().config().search.clone();
    let hidden_class = shared.hidden_class();
    for field in dom::query_all(document, &config.field_selector)? {
        dom::set_hidden(&field, &hidden_class, !view.fields_visible)?;
    }
    for (control_id, visible) in [
        (&config.on_control_id, view.on_control_visible),
        (&config.off_control_id, view.off_control_visible),
    ] {
        if let Some(control) = dom::by_id(document, control_id) {
            dom::set_hidden(&control, &hidden_class, !visible)?;
        }
    }
    Ok(())
}

fn init_copy_fields(shared: &Rc<Shared>, document: &Document) -> Result<(), DomError> {
    let selector = shared.core.borrow().config().copy_field.selector.clone();
    for control in dom::query_all(document, &selector)? {
        let spec = match CopyFieldSpec::from_attributes(
            control.get_attribute("data-copy-from").as_deref(),
            control.get_attribute("data-copy-to").as_deref(),
            control.get_attribute("data-copy-only-if-empty").as_deref(),
        ) {
            Ok(spec) => spec,
            Err(err) => {
                debug!(%err, "copy control skipped");
                continue;
            }
        };
        let click_document = document.clone();
        let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            if let Err(err) = copy_field(&click_document, &spec) {
                warn!(%err, "copy field failed");
            }
        });
        shared.listen_once(&control, "click", listener)?;
    }
    Ok(())
}

fn copy_field(document: &Document, spec: &CopyFieldSpec) -> Result<(), DomError> {
    let source = dom::by_id(document, spec.source_id())
        .ok_or_else(|| DomError::MissingElement(format!("#{}", spec.source_id())))?;
    let target = dom::by_id(document, spec.target_id())
        .ok_or_else(|| DomError::MissingElement(format!("#{}", spec.target_id())))?;
    let (Some(source_value), Some(target_value)) =
        (dom::control_value(&source), dom::control_value(&target))
    else {
        return Ok(());
    };
    if let Some(value) = spec.apply(&source_value, &target_value) {
        if dom::set_control_value(&target, &value) {
            // Let dependent handlers (e.g. field visibility) react.
            target.dispatch_event(&Event::new("change")?)?;
        }
    }
    Ok(())
}

fn init_scroll_top(shared: &Rc<Shared>, document: &Document) -> Result<(), DomError> {
    let button_id = shared.core.borrow().config().scroll_top.button_id.clone();
    let Some(button) = dom::by_id(document, &button_id) else {
        return Ok(());
    };
    let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();
        if let Ok(window) = dom::window() {
            let options = ScrollToOptions::new();
            options.set_top(0.0);
            options.set_behavior(ScrollBehavior::Smooth);
            window.scroll_to_with_scroll_to_options(&options);
        }
    });
    shared.listen_once(&button, "click", listener)?;

    let scroll_y = dom::window()?.scroll_y()?;
    let changed = shared.core.borrow_mut().update_scroll_top(scroll_y);
    if let Some(visible) = changed {
        show_scroll_top(shared, visible)?;
    }
    Ok(())
}

fn show_scroll_top(shared: &Shared, visible: bool) -> Result<(), DomError> {
    let button_id = shared.core.borrow().config().scroll_top.button_id.clone();
    let Some(button) = dom::by_id(&dom::document()?, &button_id) else {
        return Ok(());
    };
    dom::set_hidden(&button, &shared.hidden_class(), !visible)
}

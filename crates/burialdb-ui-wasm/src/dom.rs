#![forbid(unsafe_code)]

//! Thin `web-sys` helpers: lookups, attribute reads, class toggles, and
//! fragment insertion.

use core::fmt;

use burialdb_ui::loader::ScrollMetrics;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, Window,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DomError {
    NoWindow,
    NoDocument,
    MissingElement(String),
    Js(String),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindow => write!(f, "no global window"),
            Self::NoDocument => write!(f, "window has no document"),
            Self::MissingElement(what) => write!(f, "element {what:?} not found"),
            Self::Js(msg) => write!(f, "DOM call failed: {msg}"),
        }
    }
}

impl std::error::Error for DomError {}

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<DomError> for JsValue {
    fn from(err: DomError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub(crate) fn window() -> Result<Window, DomError> {
    web_sys::window().ok_or(DomError::NoWindow)
}

pub(crate) fn document() -> Result<Document, DomError> {
    window()?.document().ok_or(DomError::NoDocument)
}

/// Current scroll offset, document height and viewport height.
///
/// Document height is the largest of the root and body extents, viewport
/// height is the root element's client height (scrollbar excluded).
pub(crate) fn scroll_metrics(
    window: &Window,
    document: &Document,
) -> Result<ScrollMetrics, DomError> {
    let root = document
        .document_element()
        .ok_or_else(|| DomError::MissingElement("html".to_owned()))?;
    let mut document_height = f64::from(root.scroll_height().max(root.client_height()));
    if let Some(body) = document.body() {
        let body_height = body.scroll_height().max(body.offset_height());
        document_height = document_height.max(f64::from(body_height));
    }
    let viewport_height = match root.client_height() {
        0 => window.inner_height()?.as_f64().unwrap_or(0.0),
        height => f64::from(height),
    };
    Ok(ScrollMetrics::new(window.scroll_y()?, document_height, viewport_height))
}

pub(crate) fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>, DomError> {
    let nodes = document.query_selector_all(selector)?;
    Ok((0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

pub(crate) fn by_id(document: &Document, id: &str) -> Option<Element> {
    document.get_element_by_id(id)
}

/// Show or hide `element` by toggling `hidden_class`.
pub(crate) fn set_hidden(
    element: &Element,
    hidden_class: &str,
    hidden: bool,
) -> Result<(), DomError> {
    element.class_list().toggle_with_force(hidden_class, hidden)?;
    Ok(())
}

/// Value of a form control: `<input>`, `<select>` or `<textarea>`.
pub(crate) fn control_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    element.dyn_ref::<HtmlTextAreaElement>().map(HtmlTextAreaElement::value)
}

pub(crate) fn set_control_value(element: &Element, value: &str) -> bool {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
        return true;
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
        return true;
    }
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
        return true;
    }
    false
}

/// Insert `html` after the last row of the list under `anchor_id`.
///
/// A `<table>` anchor appends into its own last `<tbody>`, so rows never
/// land in a `<tfoot>`. An empty container receives the markup as its
/// first children.
pub(crate) fn insert_after_last_row(
    document: &Document,
    anchor_id: &str,
    html: &str,
) -> Result<(), DomError> {
    let anchor = by_id(document, anchor_id)
        .ok_or_else(|| DomError::MissingElement(format!("#{anchor_id}")))?;
    let container = if anchor.tag_name().eq_ignore_ascii_case("table") {
        anchor
            .query_selector(":scope > tbody:last-of-type")?
            .unwrap_or(anchor)
    } else {
        anchor
    };
    match container.last_element_child() {
        Some(last_row) => last_row.insert_adjacent_html("afterend", html)?,
        None => container.insert_adjacent_html("beforeend", html)?,
    }
    Ok(())
}

//! Browser tests: `wasm-pack test --headless --firefox crates/burialdb-ui-wasm`.

#![cfg(target_arch = "wasm32")]

use burialdb_ui_wasm::BurialDbPage;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, HtmlElement, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .and_then(|w| w.document())
        .expect("test runs in a browser")
}

fn mount(html: &str) -> Document {
    let document = document();
    document.body().expect("body").set_inner_html(html);
    document
}

fn has_class(document: &Document, id: &str, class: &str) -> bool {
    document
        .get_element_by_id(id)
        .expect("element exists")
        .class_list()
        .contains(class)
}

#[wasm_bindgen_test]
fn rows_are_stamped_and_bound_once() {
    let document = mount(
        r#"<table id="persons"><tbody>
             <tr id="r1" class="clickable-row" data-href="/persons/1/"></tr>
             <tr id="r2" class="clickable-row"></tr>
           </tbody></table>"#,
    );
    let mut page = BurialDbPage::new(None).expect("default options");
    page.init().expect("init");

    let stamped = document
        .get_element_by_id("r1")
        .and_then(|row| row.get_attribute("data-row-key"));
    assert!(stamped.is_some());
    // A row without an address is skipped, not stamped.
    let skipped = document
        .get_element_by_id("r2")
        .and_then(|row| row.get_attribute("data-row-key"));
    assert!(skipped.is_none());

    assert_eq!(page.bind_rows().expect("rebind"), 0);
}

#[wasm_bindgen_test]
fn state_selector_hides_matching_groups_at_init() {
    let document = mount(
        r#"<select id="id_state">
             <option value="treated">treated</option>
             <option value="killed" selected>killed</option>
           </select>
           <div id="date-of-death" class="hide-if-treated"></div>
           <div id="hospital" class="hide-if-killed"></div>"#,
    );
    let mut page = BurialDbPage::new(None).expect("default options");
    page.init().expect("init");

    assert!(has_class(&document, "hospital", "d-none"));
    assert!(!has_class(&document, "date-of-death", "d-none"));
}

#[wasm_bindgen_test]
fn advanced_search_flag_round_trips_through_toggle() {
    let document = mount(
        r##"<input type="hidden" id="id_advanced_search" value="1">
           <div id="f1" class="advanced-search-field"></div>
           <a id="advanced-search-on" href="#">more</a>
           <a id="advanced-search-off" href="#">less</a>"##,
    );
    let mut page = BurialDbPage::new(None).expect("default options");
    page.init().expect("init");

    assert_eq!(page.search_mode(), "1");
    assert!(!has_class(&document, "f1", "d-none"));
    assert!(has_class(&document, "advanced-search-on", "d-none"));
    assert!(!has_class(&document, "advanced-search-off", "d-none"));

    document
        .get_element_by_id("advanced-search-off")
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .expect("off control")
        .click();

    assert_eq!(page.search_mode(), "0");
    assert!(has_class(&document, "f1", "d-none"));
    let flag = document
        .get_element_by_id("id_advanced_search")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .expect("flag input");
    assert_eq!(flag.value(), "0");
}

#[wasm_bindgen_test]
fn copy_control_copies_recorded_value() {
    let document = mount(
        r#"<input id="id_name" value="Nowak">
           <input id="id_actual_name" value="">
           <button id="copy" data-copy-from="id_name" data-copy-to="id_actual_name"></button>"#,
    );
    let mut page = BurialDbPage::new(None).expect("default options");
    page.init().expect("init");

    document
        .get_element_by_id("copy")
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .expect("copy control")
        .click();

    let target = document
        .get_element_by_id("id_actual_name")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .expect("target input");
    assert_eq!(target.value(), "Nowak");
}

#[wasm_bindgen_test]
fn pagination_activation_is_per_list() {
    mount(r#"<table id="persons"><tbody></tbody></table>"#);
    let mut page = BurialDbPage::new(None).expect("default options");
    page.activate_pagination(1, "/persons/", "persons")
        .expect("first activation");
    assert!(page.activate_pagination(1, "/persons/", "persons").is_err());
    assert!(page.loader_snapshot("persons").is_ok());
    assert!(page.loader_snapshot("hospitals").is_err());
}

#[wasm_bindgen_test]
fn invalid_options_are_rejected() {
    let options = wasm_bindgen::JsValue::from_str(r#"{"hiddenClass":""}"#);
    assert!(BurialDbPage::new(Some(options)).is_err());
}

#![forbid(unsafe_code)]

//! [`FragmentSource`] over `window.fetch`.

use burialdb_ui::fragment::{FragmentFetchError, FragmentPayload, FragmentRequest, FragmentSource};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCredentials, RequestInit, Response};

/// Sends fragment requests from the browser with the page's cookies.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct BrowserFragmentSource;

fn transport(value: JsValue) -> FragmentFetchError {
    FragmentFetchError::Transport(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

impl BrowserFragmentSource {
    fn build_request(request: &FragmentRequest) -> Result<Request, FragmentFetchError> {
        let init = RequestInit::new();
        init.set_method("GET");
        init.set_credentials(RequestCredentials::SameOrigin);
        let req = Request::new_with_str_and_init(&request.url, &init).map_err(transport)?;
        let headers = req.headers();
        headers.set("Accept", "application/json").map_err(transport)?;
        // Lets the server tell fragment requests from page loads.
        headers
            .set("X-Requested-With", "XMLHttpRequest")
            .map_err(transport)?;
        Ok(req)
    }
}

impl FragmentSource for BrowserFragmentSource {
    async fn fetch(
        &self,
        request: &FragmentRequest,
    ) -> Result<FragmentPayload, FragmentFetchError> {
        let req = Self::build_request(request)?;
        let window = web_sys::window()
            .ok_or_else(|| FragmentFetchError::Transport("no global window".to_owned()))?;

        let response: Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(transport)?
            .dyn_into()
            .map_err(transport)?;
        if !response.ok() {
            return Err(FragmentFetchError::Status(response.status()));
        }

        let body = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?
            .as_string()
            .ok_or_else(|| FragmentFetchError::Decode("response body is not text".to_owned()))?;
        FragmentPayload::from_json(&body)
    }
}

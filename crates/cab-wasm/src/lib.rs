//! WASM bridge for CAB: exposes the tree view to the browser pages.
//!
//! Compiled via `wasm-pack build --target web`. The page does its own
//! `fetch` calls and hands the raw response bodies over; decoding, layout,
//! animation and SVG generation all happen here. Times are `performance.now()`
//! milliseconds supplied by the caller.

use cab_client::{
    ApiError, complex_action_page_url, decode_new_tab, decode_response, parse_page_query,
};
use cab_core::{ActionTree, Catalog, ComplexActionQuery, TreeSchema, build_tree, parse_label};
use cab_render::hit::client_to_view;
use cab_view::{Modifiers, TreeView, ViewConfig, ViewEvent};
use serde_json::{Value, json};
use url::Url;
use wasm_bindgen::prelude::*;

/// The WASM-facing tree viewer.
///
/// Holds at most one loaded tree. Pointer coordinates arrive in client
/// pixels and are mapped through the current view box.
#[wasm_bindgen]
pub struct CabViewer {
    view: Option<TreeView>,
    schema: TreeSchema,
    client_width: f64,
    client_height: f64,
}

#[wasm_bindgen]
impl CabViewer {
    /// `schema` is `"trainNumber"` or `"complexAction"`.
    #[wasm_bindgen(constructor)]
    pub fn new(schema: &str, client_width: f64, client_height: f64) -> Result<CabViewer, String> {
        console_error_panic_hook_setup();
        Ok(Self {
            view: None,
            schema: parse_schema(schema)?,
            client_width,
            client_height,
        })
    }

    /// Replace the tree with a server response body.
    ///
    /// On failure the previous tree is gone too and the error message is
    /// returned for display.
    pub fn load(&mut self, body: &str, now_ms: f64) -> Result<usize, String> {
        self.view = None;
        let tree = decode_tree(self.schema, body).map_err(|e| {
            log::error!("{e}");
            e.to_string()
        })?;
        let len = tree.len();
        self.view = Some(TreeView::new(tree, ViewConfig::for_schema(self.schema), now_ms));
        Ok(len)
    }

    pub fn clear(&mut self) {
        self.view = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.view.is_some()
    }

    /// On-screen size of the `<svg>` element.
    pub fn resize(&mut self, client_width: f64, client_height: f64) {
        self.client_width = client_width;
        self.client_height = client_height;
    }

    /// Handle a click. Returns the `getcplxaction` request body as JSON when
    /// the click asks to open a complex action, otherwise an empty string.
    pub fn click(&mut self, cx: f64, cy: f64, alt: bool, now_ms: f64) -> String {
        let (x, y) = self.to_view(cx, cy, now_ms);
        let Some(view) = self.view.as_mut() else {
            return String::new();
        };
        let modifiers = Modifiers {
            alt,
            ..Modifiers::NONE
        };
        view.click_at(x, y, modifiers, now_ms)
            .into_iter()
            .find_map(|event| match event {
                ViewEvent::OpenComplexAction(query) => serde_json::to_string(&query).ok(),
                ViewEvent::Relayout => None,
            })
            .unwrap_or_default()
    }

    pub fn pointer_move(&mut self, cx: f64, cy: f64, now_ms: f64) {
        let (x, y) = self.to_view(cx, cy, now_ms);
        if let Some(view) = self.view.as_mut() {
            view.pointer_move(x, y, now_ms);
        }
    }

    pub fn pointer_out(&mut self, now_ms: f64) {
        if let Some(view) = self.view.as_mut() {
            view.pointer_out(now_ms);
        }
    }

    pub fn expand_all(&mut self, now_ms: f64) {
        if let Some(view) = self.view.as_mut() {
            view.expand_all(now_ms);
        }
    }

    pub fn collapse_to_depth(&mut self, depth: usize, now_ms: f64) {
        if let Some(view) = self.view.as_mut() {
            view.collapse_to_depth(depth, now_ms);
        }
    }

    /// Advance time. Returns `true` if the page should redraw.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.view.as_mut().is_some_and(|view| view.tick(now_ms))
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.view.as_ref().is_some_and(|view| view.is_animating(now_ms))
    }

    /// Render the current frame. Empty when nothing is loaded.
    pub fn render_svg(&self, now_ms: f64) -> String {
        self.view
            .as_ref()
            .map(|view| view.render_svg(now_ms))
            .unwrap_or_default()
    }
}

impl CabViewer {
    fn to_view(&self, cx: f64, cy: f64, now_ms: f64) -> (f64, f64) {
        match &self.view {
            Some(view) => {
                let p = client_to_view(
                    &view.frame(now_ms),
                    cx,
                    cy,
                    self.client_width,
                    self.client_height,
                );
                (p.x, p.y)
            }
            None => (cx, cy),
        }
    }
}

fn parse_schema(schema: &str) -> Result<TreeSchema, String> {
    match schema {
        "trainNumber" => Ok(TreeSchema::TrainNumber),
        "complexAction" => Ok(TreeSchema::ComplexAction),
        other => Err(format!("unknown schema: {other}")),
    }
}

fn decode_tree(schema: TreeSchema, body: &str) -> Result<ActionTree, ApiError> {
    let operation = match schema {
        TreeSchema::TrainNumber => "getActions",
        TreeSchema::ComplexAction => "getCplxAction",
    };
    let value: Value = decode_response(operation, body)?;
    Ok(build_tree(&value, schema)?)
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("CAB WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone helpers (no viewer needed) ───────────────────────────────

/// Picker labels from an `uploaddb` response body, as a JSON array.
#[wasm_bindgen]
pub fn catalog_labels(body: &str) -> Result<String, String> {
    let catalog: Catalog = decode_response("uploadDbFile", body).map_err(|e| e.to_string())?;
    serde_json::to_string(&catalog.labels()).map_err(|e| e.to_string())
}

/// `getactions` request body for a picker label.
#[wasm_bindgen]
pub fn actions_request(label: &str) -> Result<String, String> {
    let id = parse_label(label).ok_or_else(|| format!("unknown train number: {label}"))?;
    Ok(json!({ "trainNumberId": id }).to_string())
}

/// Complex-action page URL from a `loadcplxaction` response body and the
/// JSON returned by [`CabViewer::click`].
#[wasm_bindgen]
pub fn page_url(base: &str, body: &str, query_json: &str) -> Result<String, String> {
    let base = Url::parse(base).map_err(|e| e.to_string())?;
    let new_tab = decode_new_tab(body).map_err(|e| e.to_string())?;
    let query: ComplexActionQuery = serde_json::from_str(query_json).map_err(|e| e.to_string())?;
    complex_action_page_url(&base, &new_tab, &query)
        .map(String::from)
        .map_err(|e| e.to_string())
}

/// `getcplxaction` request body read from the page's own URL.
#[wasm_bindgen]
pub fn page_request(href: &str) -> Result<String, String> {
    let url = Url::parse(href).map_err(|e| e.to_string())?;
    serde_json::to_string(&parse_page_query(&url)).map_err(|e| e.to_string())
}

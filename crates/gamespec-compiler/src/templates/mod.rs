//! Built-in renderers and their page skeletons
//!
//! Skeletons live in `assets/` and are registered with Tera under `.html`
//! names, so every interpolated value is HTML-escaped unless the template
//! pipes it through `safe`. Values bound for `<script>` go through the
//! `script_json` filter first.

mod bubble_clicker;
mod sandbox;

pub use bubble_clicker::BubbleClickerTemplate;
pub use sandbox::SandboxTemplate;

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

pub(crate) const SANDBOX_PAGE: &str = "sandbox.html";
pub(crate) const BUBBLE_CLICKER_PAGE: &str = "bubble_clicker.html";

const SANDBOX_SKELETON: &str = include_str!("../../assets/sandbox.html");
const BUBBLE_CLICKER_SKELETON: &str = include_str!("../../assets/bubble_clicker.html");

/// Served when a skeleton cannot be rendered
const UNAVAILABLE_PAGE: &str = "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Your Game</title></head><body><p>This game could not be rendered.</p></body></html>";

static PAGES: Lazy<Result<Tera, tera::Error>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (SANDBOX_PAGE, SANDBOX_SKELETON),
        (BUBBLE_CLICKER_PAGE, BUBBLE_CLICKER_SKELETON),
    ])?;
    tera.register_filter("script_json", script_json);
    Ok(tera)
});

/// Render a registered skeleton with `page` as its context
///
/// Never fails: a render error is logged and a static notice page returned.
pub(crate) fn render_page<T: Serialize>(name: &str, page: &T) -> String {
    let rendered = match &*PAGES {
        Ok(tera) => Context::from_serialize(page).and_then(|context| tera.render(name, &context)),
        Err(e) => Err(tera::Error::msg(format!("page skeletons failed to load: {e}"))),
    };
    rendered.unwrap_or_else(|e| {
        tracing::error!(page = name, error = %e, "page render failed");
        UNAVAILABLE_PAGE.to_string()
    })
}

/// Tera filter: the value as JSON that cannot close its `<script>` block
fn script_json(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let json = serde_json::to_string(value).map_err(|e| tera::Error::msg(e.to_string()))?;
    Ok(Value::String(json_for_script(&json)))
}

/// Make serialized JSON safe to inline inside a `<script>` block
pub(crate) fn json_for_script(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

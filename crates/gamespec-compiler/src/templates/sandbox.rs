use super::{render_page, SANDBOX_PAGE};
use crate::params::SandboxParams;
use crate::registry::Template;
use gamespec_model::Theme;
use serde::Serialize;
use serde_json::{json, Value};

/// Movable-object demo; renders any spec
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxTemplate;

#[derive(Serialize)]
struct SandboxPage<'a> {
    title: &'a str,
    bg: &'static str,
    fg: &'static str,
    stage: &'static str,
    w: u32,
    h: u32,
    speed: u32,
    controls: String,
    controller: &'a str,
    config: Value,
}

impl Template for SandboxTemplate {
    fn id(&self) -> &'static str {
        "sandbox"
    }

    fn render(&self, spec: &Value) -> String {
        let p = SandboxParams::from_spec(spec);
        let (bg, fg, stage) = match p.scene.theme {
            Theme::Dark => ("#111", "#fff", "#000"),
            Theme::Light => ("#fafafa", "#111", "#fff"),
        };

        render_page(
            SANDBOX_PAGE,
            &SandboxPage {
                title: &p.scene.title,
                bg,
                fg,
                stage,
                w: p.scene.width,
                h: p.scene.height,
                speed: p.speed,
                controls: p.controls_label(),
                controller: &p.controller,
                config: json!({"w": p.scene.width, "h": p.scene.height, "speed": p.speed}),
            },
        )
    }
}

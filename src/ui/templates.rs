//! Template environment over the embedded `templates/` directory

use axum::response::Html;
use minijinja::Environment;
use rust_embed::RustEmbed;
use serde::Serialize;

use crate::error::Result;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

fn embedded_loader(name: &str) -> std::result::Result<Option<String>, minijinja::Error> {
    Ok(TemplateAssets::get(name).map(|file| String::from_utf8_lossy(&file.data).into_owned()))
}

/// Shared, read-only template environment. `.html` templates auto-escape.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_loader(embedded_loader);
        env.add_global("app_name", "IDC Detect Portal");

        // Fail at startup rather than on first request
        for name in TemplateAssets::iter() {
            env.get_template(&name)?;
        }

        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(ctx)?))
    }
}

use anyhow::{Context, Result};
use minijinja::{context, Environment};

use crate::message::ChatMessage;
use crate::widget::WidgetState;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const MESSAGE_TEMPLATE: &str = include_str!("../templates/message.html");

pub const PAGE_TITLE: &str = "Ask Viridium AI";

// Templates are compiled into the binary. The `.html` names turn on
// minijinja's HTML auto-escaping, so message text is never injected raw.
pub fn create_template_env() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)
        .context("Failed to load index.html template")?;
    env.add_template("message.html", MESSAGE_TEMPLATE)
        .context("Failed to load message.html template")?;
    Ok(env)
}

pub fn render_page(env: &Environment<'_>, state: &WidgetState) -> Result<String> {
    let tmpl = env.get_template("index.html")?;
    let html = tmpl.render(context! {
        title => PAGE_TITLE,
        state => state,
    })?;
    Ok(html)
}

pub fn render_message_html(env: &Environment<'_>, message: &ChatMessage) -> Result<String> {
    let tmpl = env.get_template("message.html")?;
    Ok(tmpl.render(context! { message => message })?.trim_end().to_string())
}

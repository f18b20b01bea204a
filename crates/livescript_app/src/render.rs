use livescript_core::{AppViewModel, TabView};

/// Text lines describing every tab, active tab marked with `*`.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines: Vec<String> = view
        .tabs
        .iter()
        .map(|tab| tab_line(tab, tab.script_type == view.active_tab))
        .collect();
    if let Some(notice) = &view.notice {
        lines.push(format!("  note: {notice}"));
    }
    lines
}

pub fn tab_line(tab: &TabView, active: bool) -> String {
    let marker = if active { '*' } else { ' ' };
    let mut line = format!(
        "{marker} {:<17} {}",
        tab.script_type.to_string(),
        tab.status_line().unwrap_or_else(|| idle_summary(tab))
    );
    if let Some(message) = &tab.validation_message {
        line.push_str(&format!(" [invalid: {message}]"));
    }
    if tab.lookup_pending {
        line.push_str(" [looking up product]");
    }
    line
}

fn idle_summary(tab: &TabView) -> String {
    let readiness = if tab.form_valid { "ready" } else { "incomplete" };
    format!("idle, {} product(s), form {readiness}", tab.product_count)
}

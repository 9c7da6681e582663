//! Terminal rendering of conversation messages

use console::style;
use once_cell::sync::Lazy;
use regex::Regex;
use triage_chat_agent::extract_tags;
use triage_chat_core::session::{Body, Message, Risk, Role, StructuredResponse};

const GAUGE_WIDTH: usize = 20;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Render any message for the terminal
pub fn render_message(message: &Message) -> String {
    match (&message.role, &message.body) {
        (_, Body::Structured { data }) => render_structured(data),
        (Role::User, Body::Freeform { text }) => render_user(text),
        (_, Body::Freeform { text }) => markup_to_text(text),
    }
}

/// User text followed by the keywords picked out of it
pub fn render_user(text: &str) -> String {
    let mut out = format!("{} {}", style("You:").bold().cyan(), text);
    let tags = extract_tags(text);
    if !tags.is_empty() {
        out.push_str(&format!("\n  {}", style(tags.join(" · ")).dim()));
    }
    out
}

pub fn render_structured(data: &StructuredResponse) -> String {
    let mut lines = vec![format!(
        "{} {}",
        style("Severity").bold(),
        severity_gauge(data.severity_level())
    )];

    if !data.possibilities.is_empty() {
        lines.push(String::new());
        lines.push(style("Possible causes").bold().to_string());
        for p in &data.possibilities {
            lines.push(format!("  {} {}", risk_badge(p.risk), style(&p.title).bold()));
            if !p.description.is_empty() {
                lines.push(format!("      {}", p.description));
            }
        }
    }

    push_list(&mut lines, "Next steps", &data.next_steps);
    push_list(&mut lines, "Questions", &data.clarifying_questions);

    if !data.chips.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{} {}",
            style("Quick replies:").dim(),
            data.chips.join(" · ")
        ));
    }

    lines.join("\n")
}

fn push_list(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(style(title).bold().to_string());
    for (i, item) in items.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, item));
    }
}

fn risk_badge(risk: Risk) -> String {
    let label = format!("[{}]", risk.as_str());
    match risk {
        Risk::Low => style(label).green().to_string(),
        Risk::Medium => style(label).yellow().to_string(),
        Risk::High => style(label).red().bold().to_string(),
    }
}

/// Bar of `GAUGE_WIDTH` cells; `level` is already clamped to `0..=100`
pub fn severity_gauge(level: u8) -> String {
    let level = level.min(100) as usize;
    let filled = (level * GAUGE_WIDTH + 50) / 100;
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(GAUGE_WIDTH - filled)
    );
    let bar = match level {
        0..=33 => style(bar).green(),
        34..=66 => style(bar).yellow(),
        _ => style(bar).red(),
    };
    format!("{} {:>3}/100", bar, level)
}

/// Strip markup produced by the normalizer back to readable text
pub fn markup_to_text(markup: &str) -> String {
    let text = markup
        .replace("<li>", "- ")
        .replace("</p>", "\n")
        .replace("<br />", "\n");
    let text = TAG.replace_all(&text, "");
    html_escape::decode_html_entities(&text)
        .trim_end()
        .to_string()
}

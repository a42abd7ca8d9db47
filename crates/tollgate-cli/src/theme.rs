//! CLI theme and styling.

use colored::Colorize;
use tollgate_approval::{ActionStatus, PendingAction, WarningLevel};
use tollgate_core::Severity;

const BOX_WIDTH: usize = 64;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("{}: {}", key.bold(), value)
    }

    /// Format a severity.
    pub(crate) fn severity(level: Severity) -> String {
        match level {
            Severity::Low => "Low".green().to_string(),
            Severity::Medium => "Medium".yellow().to_string(),
            Severity::High => "High".red().to_string(),
            Severity::Critical => "Critical".red().bold().to_string(),
        }
    }

    /// Format a warning level tag.
    pub(crate) fn warning_level(level: WarningLevel) -> String {
        let tag = format!("[{level}]");
        match level {
            WarningLevel::Warning => tag.yellow().to_string(),
            WarningLevel::Danger => tag.red().to_string(),
            WarningLevel::Critical => tag.red().bold().to_string(),
        }
    }

    /// Format a lifecycle status.
    pub(crate) fn status(status: ActionStatus) -> String {
        let text = status.to_string();
        match status {
            ActionStatus::Completed => text.green().to_string(),
            ActionStatus::Failed => text.red().to_string(),
            ActionStatus::Cancelled => text.dimmed().to_string(),
            ActionStatus::Pending | ActionStatus::Confirmed | ActionStatus::Executing => {
                text.cyan().to_string()
            },
        }
    }

    /// Draw a box around `content`, colored by severity.
    pub(crate) fn approval_box(title: &str, content: &str, risk: Severity) -> String {
        let color_fn = match risk {
            Severity::Low => |s: &str| s.green().to_string(),
            Severity::Medium => |s: &str| s.yellow().to_string(),
            Severity::High => |s: &str| s.red().to_string(),
            Severity::Critical => |s: &str| s.red().bold().to_string(),
        };

        let inner = BOX_WIDTH.saturating_sub(2);
        let top = format!("╭{}╮", "─".repeat(inner));
        let bottom = format!("╰{}╯", "─".repeat(inner));
        let empty = format!("│{:w$}│", "", w = inner);

        let pad_line = |text: &str| -> String {
            let visible_len = strip_ansi(text).chars().count();
            let padding = BOX_WIDTH.saturating_sub(4).saturating_sub(visible_len);
            format!("│ {text}{:p$} │", "", p = padding)
        };

        let mut lines = vec![
            color_fn(&top),
            pad_line(&title.bold().to_string()),
            color_fn(&empty),
        ];
        for line in content.lines() {
            lines.push(pad_line(line));
        }
        lines.push(color_fn(&bottom));
        lines.join("\n")
    }

    /// Render everything an operator needs to decide on `action`.
    pub(crate) fn action_box(action: &PendingAction) -> String {
        let mut content = vec![
            Theme::kv("Type", action.kind.as_str()),
            format!("  {}", action.description),
            Theme::kv("Severity", &Theme::severity(action.severity)),
            Theme::kv("Reversible", if action.impact.reversible { "yes" } else { "no" }),
        ];
        if !action.impact.affects.is_empty() {
            content.push(Theme::kv("Affects", &action.impact.affects.join(", ")));
        }
        if let Some(request_id) = &action.request_id {
            content.push(Theme::kv("Request", request_id));
        }

        if !action.parameters.is_empty() {
            content.push(String::new());
            for param in &action.parameters {
                content.push(format!("  {} = {}", param.name.bold(), param.display_value()));
            }
        }

        if !action.security_warnings.is_empty() {
            content.push(String::new());
            for warning in &action.security_warnings {
                content.push(format!(
                    "{} {}",
                    Theme::warning_level(warning.level),
                    warning.message
                ));
                if let Some(rec) = &warning.recommendation {
                    content.push(format!("    {}", Theme::dimmed(rec)));
                }
            }
        }

        Theme::approval_box(&action.title, &content.join("\n"), action.severity)
    }
}

/// Strip ANSI escape codes for visible-length calculation.
fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            result.push(c);
        }
    }
    result
}

//! Standalone HTML page shown in place of a blocked download

use crate::render::escape_html;
use serde::{Deserialize, Serialize};

/// Default page heading.
pub const DEFAULT_PAGE_TITLE: &str = "🚫 Download Blocked";

/// Default background gradient, as two comma-separated colours.
pub const DEFAULT_BACKGROUND: &str = "#4A90E2, #5C6AC4";

const FALLBACK_COLORS: (&str, &str) = ("#4A90E2", "#5C6AC4");

/// Appearance of the block page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    /// Heading shown above the message
    pub title: String,
    /// Gradient colours, `"<start>, <end>"`
    pub background_color: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_PAGE_TITLE.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl PageSettings {
    /// Start and end colour of the background gradient.
    ///
    /// Each colour must be a hex code (`#rgb`, `#rrggbb`, `#rrggbbaa`) or a
    /// plain CSS colour name; anything else is replaced by the default so the
    /// value can never break out of the stylesheet.
    #[must_use]
    pub fn gradient(&self) -> (String, String) {
        let mut parts = self.background_color.split(',').map(str::trim);
        let start = parts
            .next()
            .filter(|c| is_safe_color(c))
            .unwrap_or(FALLBACK_COLORS.0);
        let end = parts
            .next()
            .filter(|c| is_safe_color(c))
            .unwrap_or(FALLBACK_COLORS.1);
        (start.to_string(), end.to_string())
    }

    /// Render the full page around an already escaped message.
    ///
    /// `message_html` is inserted verbatim; pass output of
    /// [`crate::render::render_template`].
    #[must_use]
    pub fn render(&self, message_html: &str) -> String {
        let (start, end) = self.gradient();
        let title = escape_html(&self.title);
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Download Blocked</title>
<style>
body {{ margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center; font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background: linear-gradient(135deg, {start} 0%, {end} 100%); }}
.panel {{ background: #fff; border-radius: 16px; box-shadow: 0 16px 48px rgba(0,0,0,0.25); max-width: 600px; padding: 48px; text-align: center; }}
h1 {{ color: #2C3E50; font-size: 30px; margin: 0 0 20px; }}
.message {{ color: #5D6D7E; font-size: 18px; line-height: 1.6; margin-bottom: 32px; }}
.blocked-value {{ color: #000; font-weight: bold; }}
button {{ padding: 14px 32px; font-size: 16px; border: none; border-radius: 10px; cursor: pointer; color: #fff; background: linear-gradient(135deg, {start} 0%, {end} 100%); }}
</style>
</head>
<body>
<div class="panel">
<h1>{title}</h1>
<div class="message"><p>{message_html}</p></div>
<button onclick="window.close(); setTimeout(function() {{ window.history.back(); }}, 100);">✕ Close</button>
</div>
</body>
</html>
"#
        )
    }
}

fn is_safe_color(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else {
        !value.is_empty() && value.len() <= 32 && value.chars().all(|c| c.is_ascii_alphabetic())
    }
}

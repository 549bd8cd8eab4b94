//! Semantic colors and symbols on top of `console`

use console::{Emoji, Style, measure_text_width};

static CHECK: Emoji<'static, 'static> = Emoji("✓", "+");
static CROSS: Emoji<'static, 'static> = Emoji("✗", "x");
static WARN: Emoji<'static, 'static> = Emoji("!", "!");
static INFO: Emoji<'static, 'static> = Emoji("·", "-");
static BULLET: Emoji<'static, 'static> = Emoji("•", "*");

/// Formats status lines, honouring whether color is wanted
#[derive(Debug, Clone)]
pub struct StyleManager {
    color: bool,
}

impl StyleManager {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Color when both stdout and stderr support it
    pub fn detect() -> Self {
        Self::new(console::colors_enabled() && console::colors_enabled_stderr())
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn style_success(&self, text: &str) -> String {
        self.paint(Style::new().green(), text)
    }

    pub fn style_error(&self, text: &str) -> String {
        self.paint(Style::new().red().bold(), text)
    }

    pub fn style_warning(&self, text: &str) -> String {
        self.paint(Style::new().yellow(), text)
    }

    pub fn style_info(&self, text: &str) -> String {
        self.paint(Style::new().cyan(), text)
    }

    pub fn style_emphasis(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    pub fn style_subtle(&self, text: &str) -> String {
        self.paint(Style::new().dim(), text)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_success(&CHECK.to_string()), message)
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_error(&CROSS.to_string()), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_warning(&WARN.to_string()), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_info(&INFO.to_string()), message)
    }

    pub fn bullet(&self) -> String {
        BULLET.to_string()
    }

    /// Plain-text table with columns padded to their widest cell
    pub fn render_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
        for row in rows {
            for (index, cell) in row.iter().enumerate() {
                let width = measure_text_width(cell);
                match widths.get_mut(index) {
                    Some(current) => *current = (*current).max(width),
                    None => widths.push(width),
                }
            }
        }

        let format_row = |cells: Vec<&str>| -> String {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(index, cell)| {
                    let width = widths.get(index).copied().unwrap_or(0);
                    let padding = width.saturating_sub(measure_text_width(cell));
                    format!("{cell}{}", " ".repeat(padding))
                })
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut lines = vec![self.style_emphasis(&format_row(headers.to_vec()))];
        for row in rows {
            lines.push(format_row(row.iter().map(String::as_str).collect()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    include!("styling.test.rs");
}

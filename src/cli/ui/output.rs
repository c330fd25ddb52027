use console::{Style, style};

/// Styled terminal output for command results
pub struct Output {
    label: Style,
    muted: Style,
}

impl Output {
    pub fn new() -> Self {
        Self {
            label: Style::new().bold(),
            muted: Style::new().dim(),
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// `label: value` line, aligned to a fixed label column
    pub fn field(&self, label: &str, value: &str) {
        println!("  {:<14} {}", self.label.apply_to(format!("{}:", label)), value);
    }

    /// Bulleted item with an optional dimmed detail line
    pub fn item(&self, title: &str, detail: Option<&str>) {
        println!("  • {}", title);
        if let Some(detail) = detail.filter(|d| !d.is_empty()) {
            println!("    {}", self.muted.apply_to(detail));
        }
    }

    /// Multi-line body text, indented under the current section
    pub fn body(&self, text: &str) {
        for line in text.lines() {
            println!("  {}", line);
        }
    }

    pub fn hint(&self, message: &str) {
        println!("{}", self.muted.apply_to(message));
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Text width measurement hook, so line fitting can run against a real
/// font face or a deterministic fake.
pub trait TextMeasure {
    /// Width in pixels of `text` rendered at `px` font size.
    fn text_width(&self, text: &str, px: f32) -> f32;
}

/// Fixed per-character advance. Used when no system font face is
/// available, and by tests that need reproducible widths.
pub struct HeuristicMetrics {
    pub advance_ratio: f32,
}

impl Default for HeuristicMetrics {
    fn default() -> Self {
        Self { advance_ratio: 0.55 }
    }
}

impl TextMeasure for HeuristicMetrics {
    fn text_width(&self, text: &str, px: f32) -> f32 {
        text.chars().count() as f32 * px * self.advance_ratio
    }
}

// Greedy accumulation at word granularity. A word wider than the budget
// still gets its own line and is allowed to overflow; the final candidate
// is always committed.
pub fn wrap_text(text: &str, max_width: f32, px: f32, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };

        if measure.text_width(&candidate, px) > max_width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line = word.to_string();
        } else {
            line = candidate;
        }
    }

    lines.push(line);
    lines
}

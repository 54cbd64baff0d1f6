//! Selection buffer for the step currently in view.

use serde::Serialize;

/// Transient choice(s) for the visible step. Reset on every step change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionBuffer {
    values: Vec<String>,
}

impl SelectionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-choice semantics: the buffer becomes exactly `value`.
    pub fn replace(&mut self, value: impl Into<String>) {
        self.values.clear();
        self.values.push(value.into());
    }

    /// Multi-choice semantics. Removes `value` if present, otherwise appends
    /// it while the buffer holds fewer than `max` entries. Returns whether
    /// the buffer changed.
    pub fn toggle(&mut self, value: &str, max: Option<usize>) -> bool {
        if let Some(pos) = self.values.iter().position(|v| v == value) {
            self.values.remove(pos);
            return true;
        }
        if max.is_some_and(|m| self.values.len() >= m) {
            return false;
        }
        self.values.push(value.to_string());
        true
    }

    /// Free-text semantics: the buffer mirrors the current input, even
    /// when that input is blank.
    pub fn set_text(&mut self, text: &str) {
        self.replace(text);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Comma-joined form used in analytics.
    pub fn joined(&self) -> String {
        self.values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_one_value() {
        let mut buf = SelectionBuffer::new();
        buf.replace("20s");
        buf.replace("30s");
        assert_eq!(buf.values(), ["30s".to_string()]);
    }

    #[test]
    fn toggle_never_exceeds_max() {
        let options = ["a", "b", "c", "d"];
        for max in 1..=3 {
            let mut buf = SelectionBuffer::new();
            for opt in &options[..=max] {
                buf.toggle(opt, Some(max));
            }
            assert_eq!(buf.len(), max, "max {max} exceeded");
            assert!(!buf.contains(options[max]));
        }
    }

    #[test]
    fn toggle_twice_restores_prior_state() {
        let mut buf = SelectionBuffer::new();
        buf.toggle("Pizza", None);
        buf.toggle("Bread", None);
        let before = buf.clone();

        buf.toggle("Cakes", None);
        buf.toggle("Cakes", None);
        assert_eq!(buf, before);

        buf.toggle("Pizza", None);
        buf.toggle("Pizza", None);
        assert_eq!(buf.values(), ["Bread".to_string(), "Pizza".to_string()]);
    }

    #[test]
    fn toggle_at_max_still_removes() {
        let mut buf = SelectionBuffer::new();
        buf.toggle("a", Some(2));
        buf.toggle("b", Some(2));
        assert!(!buf.toggle("c", Some(2)));
        assert!(buf.toggle("a", Some(2)));
        assert!(buf.toggle("c", Some(2)));
        assert_eq!(buf.joined(), "b, c");
    }

    #[test]
    fn unbounded_toggle_accepts_everything() {
        let mut buf = SelectionBuffer::new();
        for i in 0..20 {
            buf.toggle(&i.to_string(), None);
        }
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn set_text_mirrors_input() {
        let mut buf = SelectionBuffer::new();
        buf.set_text("a@b");
        buf.set_text("a@b.com");
        assert_eq!(buf.first(), Some("a@b.com"));
        buf.set_text("   ");
        assert_eq!(buf.values(), ["   "]);
        buf.set_text("");
        assert_eq!(buf.len(), 1);
    }
}

/// Free-text input line. Reports its full value after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputField {
    value: String,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn push(&mut self, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        self.value.push(c);
        true
    }

    /// Delete the last character. Returns false when already empty.
    pub fn backspace(&mut self) -> bool {
        self.value.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_backspace() {
        let mut field = InputField::new();
        assert!(field.push('h'));
        assert!(field.push('é'));
        assert_eq!(field.value(), "hé");

        assert!(field.backspace());
        assert_eq!(field.value(), "h");
        assert!(field.backspace());
        assert!(!field.backspace());
        assert_eq!(field.value(), "");
    }

    #[test]
    fn control_characters_are_rejected() {
        let mut field = InputField::new();
        assert!(!field.push('\n'));
        assert!(!field.push('\u{7f}'));
        assert!(field.value().is_empty());
    }

    #[test]
    fn clear_empties_value() {
        let mut field = InputField::new();
        field.push('a');
        field.clear();
        assert_eq!(field, InputField::default());
    }
}

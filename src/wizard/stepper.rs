//! Step tracking for linear wizards.

use std::collections::BTreeMap;
use std::fmt::Debug;

/// Field values of one step, keyed by field name
pub type StepFields = BTreeMap<String, String>;

/// A step of a wizard with a fixed, linear sequence.
pub trait WizardStep: Copy + Eq + Ord + Debug + Send + Sync + 'static {
    /// Steps in order. The last entry is terminal.
    fn sequence() -> &'static [Self];

    /// Short label shown in the progress header
    fn label(&self) -> &'static str;

    /// Zero-based position within [`WizardStep::sequence`]
    fn index(&self) -> usize {
        Self::sequence()
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    fn first() -> Self {
        Self::sequence()[0]
    }

    fn terminal() -> Self {
        let steps = Self::sequence();
        steps[steps.len() - 1]
    }
}

/// Current step, step-scoped input values and the errors of the active step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stepper<S: WizardStep> {
    current: S,
    fields: BTreeMap<S, StepFields>,
    errors: BTreeMap<String, String>,
}

impl<S: WizardStep> Default for Stepper<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: WizardStep> Stepper<S> {
    pub fn new() -> Self {
        Self {
            current: S::first(),
            fields: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Jump to any declared step. Earlier steps are not re-validated.
    pub fn go_to_step(&mut self, step: S) {
        self.current = step;
        self.errors.clear();
    }

    /// Advance one step. Returns false at the terminal step.
    pub fn next(&mut self) -> bool {
        let steps = S::sequence();
        let idx = self.current.index();
        if idx + 1 >= steps.len() {
            return false;
        }
        self.current = steps[idx + 1];
        self.errors.clear();
        true
    }

    /// Go back one step. Returns false at the first step.
    pub fn back(&mut self) -> bool {
        let idx = self.current.index();
        if idx == 0 {
            return false;
        }
        self.current = S::sequence()[idx - 1];
        self.errors.clear();
        true
    }

    /// Store a value for a field of `step`. Never validates.
    pub fn update_field(&mut self, step: S, name: &str, value: impl Into<String>) {
        self.fields
            .entry(step)
            .or_default()
            .insert(name.to_string(), value.into());
    }

    pub fn field(&self, step: S, name: &str) -> Option<&str> {
        self.fields
            .get(&step)
            .and_then(|f| f.get(name))
            .map(String::as_str)
    }

    /// Values of one step (empty when nothing was entered)
    pub fn step_fields(&self, step: S) -> StepFields {
        self.fields.get(&step).cloned().unwrap_or_default()
    }

    /// Values of every step
    pub fn all_fields(&self) -> &BTreeMap<S, StepFields> {
        &self.fields
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn set_errors(&mut self, errors: BTreeMap<String, String>) {
        self.errors = errors;
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn is_first(&self) -> bool {
        self.current.index() == 0
    }

    pub fn is_terminal(&self) -> bool {
        self.current == S::terminal()
    }

    /// 1-based position and total number of steps
    pub fn position(&self) -> (usize, usize) {
        (self.current.index() + 1, S::sequence().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Demo {
        One,
        Two,
        Three,
    }

    impl WizardStep for Demo {
        fn sequence() -> &'static [Self] {
            &[Demo::One, Demo::Two, Demo::Three]
        }

        fn label(&self) -> &'static str {
            match self {
                Demo::One => "One",
                Demo::Two => "Two",
                Demo::Three => "Three",
            }
        }
    }

    #[test]
    fn test_starts_at_first_step() {
        let stepper = Stepper::<Demo>::new();
        assert_eq!(stepper.current(), Demo::One);
        assert!(stepper.is_first());
        assert_eq!(stepper.position(), (1, 3));
    }

    #[test]
    fn test_next_stops_at_terminal() {
        let mut stepper = Stepper::<Demo>::new();
        assert!(stepper.next());
        assert!(stepper.next());
        assert!(stepper.is_terminal());
        assert!(!stepper.next());
        assert_eq!(stepper.current(), Demo::Three);
    }

    #[test]
    fn test_back_is_noop_at_first_step() {
        let mut stepper = Stepper::<Demo>::new();
        assert!(!stepper.back());
        assert_eq!(stepper.current(), Demo::One);
    }

    #[test]
    fn test_back_after_next_keeps_field_values() {
        let mut stepper = Stepper::<Demo>::new();
        stepper.update_field(Demo::One, "email", "user@example.com");
        stepper.update_field(Demo::One, "name", "Ada");
        let before = stepper.all_fields().clone();

        stepper.next();
        stepper.update_field(Demo::Two, "code", "123456");
        stepper.back();

        assert_eq!(stepper.current(), Demo::One);
        assert_eq!(stepper.step_fields(Demo::One), before[&Demo::One]);
        assert_eq!(stepper.field(Demo::Two, "code"), Some("123456"));
    }

    #[test]
    fn test_fields_are_step_scoped() {
        let mut stepper = Stepper::<Demo>::new();
        stepper.update_field(Demo::One, "value", "a");
        stepper.update_field(Demo::Two, "value", "b");
        assert_eq!(stepper.field(Demo::One, "value"), Some("a"));
        assert_eq!(stepper.field(Demo::Two, "value"), Some("b"));
        assert_eq!(stepper.field(Demo::Three, "value"), None);
    }

    #[test]
    fn test_go_to_step_allows_skipping_and_clears_errors() {
        let mut stepper = Stepper::<Demo>::new();
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "Email is required".to_string());
        stepper.set_errors(errors);

        stepper.go_to_step(Demo::Three);
        assert_eq!(stepper.current(), Demo::Three);
        assert!(stepper.errors().is_empty());
    }
}

use std::cell::RefCell;

/// Sink for human-readable build diagnostics.
///
/// Called zero or more times per build, only on failure paths. Cleanup does
/// not depend on it returning: the builder releases GPU objects through drop
/// guards, so even a panicking reporter leaves nothing behind.
pub trait Reporter {
    fn report(&self, message: &str);
}

impl<F: Fn(&str)> Reporter for F {
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Discards every message. Stands in for an absent UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _message: &str) {}
}

/// Forwards messages to the `tracing` error channel.
///
/// The builder traces its own failure events at `debug` only, so with this
/// reporter each diagnostic appears at `error` level once.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::error!(target: "raytrace_shader::report", "{message}");
    }
}

/// Keeps every message in order. Useful for tests and for on-screen error
/// panels that show the accumulated text.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: RefCell<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// All messages concatenated, the way an error panel's text accumulates.
    pub fn text(&self) -> String {
        self.messages.borrow().concat()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_keeps_order() {
        let reporter = CollectingReporter::new();
        assert!(reporter.is_empty());
        reporter.report("first;");
        reporter.report("second");
        assert_eq!(reporter.messages(), vec!["first;", "second"]);
        assert_eq!(reporter.text(), "first;second");
        assert_eq!(reporter.len(), 2);
        reporter.clear();
        assert!(reporter.is_empty());
    }

    #[test]
    fn closures_are_reporters() {
        let seen = RefCell::new(Vec::new());
        let reporter = |m: &str| seen.borrow_mut().push(m.len());
        reporter.report("abc");
        Reporter::report(&reporter, "de");
        assert_eq!(*seen.borrow(), vec![3, 2]);
    }

    #[test]
    fn null_and_tracing_accept_messages() {
        NullReporter.report("ignored");
        TracingReporter.report("logged");
    }
}

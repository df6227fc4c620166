//! Blocking user notices and confirmations.

use parking_lot::Mutex;
use std::collections::VecDeque;

pub trait UserPrompt {
    /// Show a notice the user has to dismiss.
    fn alert(&self, message: &str);

    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> bool;
}

/// Prompt with scripted confirmation answers that records every message.
///
/// When the script runs out, `confirm` answers with the default.
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    alerts: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
    answers: Mutex<VecDeque<bool>>,
    default_answer: bool,
}

impl RecordingPrompt {
    pub fn new(default_answer: bool) -> Self {
        Self { default_answer, ..Self::default() }
    }

    pub fn with_answers<I: IntoIterator<Item = bool>>(self, answers: I) -> Self {
        self.answers.lock().extend(answers);
        self
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().clone()
    }
}

impl UserPrompt for RecordingPrompt {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.questions.lock().push(message.to_string());
        self.answers.lock().pop_front().unwrap_or(self.default_answer)
    }
}

impl<P: UserPrompt + ?Sized> UserPrompt for std::sync::Arc<P> {
    fn alert(&self, message: &str) {
        (**self).alert(message)
    }

    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }
}

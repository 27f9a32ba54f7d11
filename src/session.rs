//! The mutable state of one upload-analyze-refine interaction, with every
//! mutation funneled through a named transition operation. Illegal
//! transitions are refused rather than panicking, so the UI layer can wire
//! messages straight through without pre-checking.

use crate::picture::Picture;
use crate::prompt::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Analyzing,
    Modifying,
    Success,
    Error,
}

/// Which remote operation is currently in flight. A successful translate,
/// and only a translate, flips the session language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    Analyze,
    Modify,
    Translate(Language),
}

#[derive(Debug, Default)]
pub struct Session {
    status: Status,
    picture: Option<Picture>,
    result_text: String,
    language: Language,
    instruction: String,
    target_length_input: String,
    last_error: String,
    in_flight: Option<PendingOp>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn picture(&self) -> Option<&Picture> {
        self.picture.as_ref()
    }

    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn target_length_input(&self) -> &str {
        &self.target_length_input
    }

    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, Status::Analyzing | Status::Modifying)
    }

    pub fn set_instruction(&mut self, value: String) {
        self.instruction = value;
    }

    pub fn set_target_length_input(&mut self, value: String) {
        self.target_length_input = value;
    }

    /// Empty or unparsable input means "no target length" and is never an
    /// error.
    pub fn target_length(&self) -> Option<u32> {
        self.target_length_input.trim().parse().ok()
    }

    /// A refinement needs an instruction or a target length; with neither,
    /// the request must not be issued at all.
    pub fn can_modify(&self) -> bool {
        self.status == Status::Success
            && (!self.instruction.trim().is_empty() || self.target_length().is_some())
    }

    pub fn begin_analysis(&mut self, picture: Picture) -> bool {
        if self.status != Status::Idle {
            return false;
        }
        self.picture = Some(picture);
        self.status = Status::Analyzing;
        self.in_flight = Some(PendingOp::Analyze);
        true
    }

    pub fn begin_modify(&mut self) -> bool {
        if !self.can_modify() {
            return false;
        }
        self.status = Status::Modifying;
        self.in_flight = Some(PendingOp::Modify);
        true
    }

    /// Starts a translation toward the other language tag and returns the
    /// target, which the caller needs to build the prompt.
    pub fn begin_translate(&mut self) -> Option<Language> {
        if self.status != Status::Success {
            return None;
        }
        let target = self.language.toggled();
        self.status = Status::Modifying;
        self.in_flight = Some(PendingOp::Translate(target));
        Some(target)
    }

    /// Applies a successful gateway response: the result text is replaced
    /// wholesale and the pending operation decides the side effects.
    pub fn complete(&mut self, text: String) -> bool {
        if !self.is_busy() {
            return false;
        }
        match self.in_flight.take() {
            Some(PendingOp::Translate(target)) => self.language = target,
            Some(PendingOp::Modify) => self.instruction.clear(),
            Some(PendingOp::Analyze) | None => {}
        }
        self.result_text = text;
        self.last_error.clear();
        self.status = Status::Success;
        true
    }

    /// Records a gateway failure. The previous result text is kept.
    pub fn fail(&mut self, message: String) -> bool {
        if !self.is_busy() {
            return false;
        }
        self.in_flight = None;
        self.last_error = message;
        self.status = Status::Error;
        true
    }

    /// User-visible reset back to the upload screen. Refused while a remote
    /// call is in flight.
    pub fn reset(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        *self = Self::default();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture() -> Picture {
        Picture {
            base64: "aW1n".to_string(),
            mime_type: "image/jpeg",
        }
    }

    fn session_in_success(result: &str) -> Session {
        let mut session = Session::new();
        assert!(session.begin_analysis(picture()));
        assert!(session.complete(result.to_string()));
        session
    }

    #[test]
    fn test_analyze_success_flow() {
        let mut session = Session::new();
        assert_eq!(session.status(), Status::Idle);

        assert!(session.begin_analysis(picture()));
        assert_eq!(session.status(), Status::Analyzing);
        assert!(session.is_busy());

        assert!(session.complete("{\"subjects\":[\"cat\"]}".to_string()));
        assert_eq!(session.status(), Status::Success);
        assert_eq!(session.result_text(), "{\"subjects\":[\"cat\"]}");
    }

    #[test]
    fn test_analyze_failure_surfaces_message() {
        let mut session = Session::new();
        assert!(session.begin_analysis(picture()));

        assert!(session.fail("API error: 500".to_string()));
        assert_eq!(session.status(), Status::Error);
        assert_eq!(session.last_error(), "API error: 500");

        assert!(session.reset());
        assert_eq!(session.status(), Status::Idle);
        assert_eq!(session.last_error(), "");
    }

    #[test]
    fn test_modify_failure_keeps_result_and_instruction() {
        let mut session = session_in_success("{\"a\":\"x\"}");
        session.set_instruction("make it shorter".to_string());

        assert!(session.begin_modify());
        assert!(session.fail("network error".to_string()));

        assert_eq!(session.result_text(), "{\"a\":\"x\"}");
        assert_eq!(session.instruction(), "make it shorter");
    }

    #[test]
    fn test_modify_clears_instruction_on_success() {
        let mut session = session_in_success("{\"a\":\"x\"}");
        session.set_instruction("remove the mood field".to_string());

        assert!(session.begin_modify());
        assert_eq!(session.status(), Status::Modifying);

        assert!(session.complete("{\"a\":\"y\"}".to_string()));
        assert_eq!(session.result_text(), "{\"a\":\"y\"}");
        assert_eq!(session.instruction(), "");
        assert_eq!(session.language(), Language::English);
    }

    #[test]
    fn test_modify_refused_without_instruction_or_length() {
        let mut session = session_in_success("{}");
        assert!(!session.can_modify());
        assert!(!session.begin_modify());
        assert_eq!(session.status(), Status::Success);

        session.set_instruction("   ".to_string());
        assert!(!session.begin_modify());

        session.set_target_length_input("200".to_string());
        assert!(session.can_modify());
        assert!(session.begin_modify());
    }

    #[test]
    fn test_translate_flips_language_on_success_only() {
        let mut session = session_in_success("{\"a\":\"x\"}");
        assert_eq!(session.language(), Language::English);

        let target = session.begin_translate();
        assert_eq!(target, Some(Language::Chinese));
        // still the old tag while in flight
        assert_eq!(session.language(), Language::English);

        assert!(session.complete("{\"a\":\"y\"}".to_string()));
        assert_eq!(session.language(), Language::Chinese);
        assert_eq!(session.result_text(), "{\"a\":\"y\"}");

        let target = session.begin_translate();
        assert_eq!(target, Some(Language::English));
        assert!(session.fail("boom".to_string()));
        // failed translate must not flip
        assert_eq!(session.language(), Language::Chinese);
    }

    #[test]
    fn test_no_concurrent_remote_operations() {
        let mut session = Session::new();
        assert!(session.begin_analysis(picture()));

        assert!(!session.begin_analysis(picture()));
        assert!(!session.begin_modify());
        assert!(session.begin_translate().is_none());
        assert!(!session.reset());
    }

    #[test]
    fn test_begin_operations_refused_outside_success() {
        let mut session = Session::new();
        session.set_instruction("anything".to_string());
        assert!(!session.begin_modify());
        assert!(session.begin_translate().is_none());
    }

    #[test]
    fn test_reset_returns_to_defaults() {
        let mut session = session_in_success("{\"a\":\"x\"}");
        assert!(session.begin_translate().is_some());
        assert!(session.complete("{\"a\":\"y\"}".to_string()));
        session.set_target_length_input("120".to_string());

        assert!(session.reset());
        assert_eq!(session.status(), Status::Idle);
        assert!(session.picture().is_none());
        assert_eq!(session.result_text(), "");
        assert_eq!(session.language(), Language::English);
        assert_eq!(session.target_length_input(), "");
    }

    #[test]
    fn test_target_length_parsing() {
        let mut session = Session::new();
        assert_eq!(session.target_length(), None);

        session.set_target_length_input(" 200 ".to_string());
        assert_eq!(session.target_length(), Some(200));

        session.set_target_length_input("lots".to_string());
        assert_eq!(session.target_length(), None);
    }
}

//! Ephemeral session state, mutated only through transition methods.

use presence_api::AttendanceReport;
use std::sync::{Arc, Mutex};

/// What the capture path is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A manual capture request is in flight.
    Loading,
    /// The recurring capture task is active.
    AutoCycling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

/// Client-side session state. Nothing here is durable: it is rebuilt
/// from scratch on every process start and re-fetched on demand.
///
/// Notices and the recognition highlight carry a sequence number so a
/// stale expiry timer can never clear a newer notice.
#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    notice: Option<Notice>,
    notice_seq: u64,
    last_recognized: Vec<String>,
    report: Option<AttendanceReport>,
}

/// Session shared between controllers and timer tasks.
pub type SharedSession = Arc<Mutex<Session>>;

pub fn shared() -> SharedSession {
    Arc::new(Mutex::new(Session::default()))
}

impl Session {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn last_recognized(&self) -> &[String] {
        &self.last_recognized
    }

    pub fn report(&self) -> Option<&AttendanceReport> {
        self.report.as_ref()
    }

    /// Idle → Loading. Under auto mode the phase stays AutoCycling;
    /// the busy flag in the controller carries the in-flight state.
    pub fn begin_request(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Loading;
        }
    }

    /// Loading → Idle.
    pub fn end_request(&mut self) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Idle;
        }
    }

    pub fn enter_auto(&mut self) {
        self.phase = Phase::AutoCycling;
    }

    pub fn leave_auto(&mut self) {
        if self.phase == Phase::AutoCycling {
            self.phase = Phase::Idle;
        }
    }

    /// Replace the current notice. Returns the sequence number to pass
    /// to [`expire`](Self::expire) from the one-shot timer.
    pub fn set_notice(&mut self, severity: Severity, text: impl Into<String>) -> u64 {
        self.notice_seq += 1;
        self.notice = Some(Notice {
            severity,
            text: text.into(),
        });
        self.notice_seq
    }

    /// Record a successful recognition: success notice plus the
    /// "last recognized" highlight, both under one sequence number so
    /// they expire together.
    pub fn set_recognition(&mut self, recognized: Vec<String>, text: impl Into<String>) -> u64 {
        self.last_recognized = recognized;
        self.set_notice(Severity::Success, text)
    }

    /// Clear the notice and highlight, but only if `seq` still refers
    /// to the current notice. A stale timer is a no-op.
    pub fn expire(&mut self, seq: u64) {
        if seq == self.notice_seq {
            self.notice = None;
            self.last_recognized.clear();
        }
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn set_report(&mut self, report: AttendanceReport) {
        self.report = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        let mut s = Session::default();
        assert_eq!(s.phase(), Phase::Idle);

        s.begin_request();
        assert_eq!(s.phase(), Phase::Loading);
        s.end_request();
        assert_eq!(s.phase(), Phase::Idle);

        s.enter_auto();
        assert_eq!(s.phase(), Phase::AutoCycling);
        // Requests inside auto mode do not demote the phase.
        s.begin_request();
        assert_eq!(s.phase(), Phase::AutoCycling);
        s.end_request();
        assert_eq!(s.phase(), Phase::AutoCycling);
        s.leave_auto();
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn test_expire_clears_notice_and_highlight() {
        let mut s = Session::default();
        let seq = s.set_recognition(vec!["Alice".into()], "Reconnu: Alice");
        assert!(s.notice().is_some());
        assert_eq!(s.last_recognized(), ["Alice"]);

        s.expire(seq);
        assert!(s.notice().is_none());
        assert!(s.last_recognized().is_empty());
    }

    #[test]
    fn test_stale_expiry_is_a_no_op() {
        let mut s = Session::default();
        let old = s.set_recognition(vec!["Alice".into()], "Reconnu: Alice");
        let _new = s.set_recognition(vec!["Bob".into()], "Reconnu: Bob");

        s.expire(old);
        assert_eq!(s.notice().unwrap().text, "Reconnu: Bob");
        assert_eq!(s.last_recognized(), ["Bob"]);
    }

    #[test]
    fn test_set_notice_replaces_previous() {
        let mut s = Session::default();
        s.set_notice(Severity::Error, "Erreur lors du marquage de présence");
        let seq = s.set_notice(Severity::Success, "Export CSV réussi");
        assert_eq!(s.notice().unwrap().severity, Severity::Success);
        s.expire(seq);
        assert!(s.notice().is_none());
    }
}

//! Fullscreen compliance.
//!
//! Vendor-prefixed fullscreen APIs hide behind [`FullscreenCapability`]; the
//! guard itself only tracks whether the page is compliant and decides when
//! the user must be asked to re-enter. Re-entry always waits for the user to
//! acknowledge a prompt, since platforms only honour fullscreen requests made
//! from a direct user gesture.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Capability, ProctorError};

pub const REENTRY_PROMPT: &str = "Fullscreen mode is required during the test! Please return to fullscreen by pressing F11 or clicking \"I Understand\" to re-enter automatically.";

pub trait FullscreenCapability: Send + Sync {
    fn is_supported(&self) -> bool;
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&self) -> Result<(), ProctorError>;
    fn exit_fullscreen(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenSignal {
    /// Fullscreen was left while the guard was armed.
    Exited,
}

#[derive(Debug, Clone, Default)]
pub struct FullscreenGuard {
    armed: bool,
    compliant: bool,
}

impl FullscreenGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, is_fullscreen: bool) {
        self.armed = true;
        self.compliant = is_fullscreen;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_compliant(&self) -> bool {
        self.compliant
    }

    /// Re-evaluate after a fullscreen change event.
    pub fn on_change(&mut self, is_fullscreen: bool) -> Option<FullscreenSignal> {
        self.compliant = is_fullscreen;
        if self.armed && !is_fullscreen {
            Some(FullscreenSignal::Exited)
        } else {
            None
        }
    }

    /// Status refresh from the polling loop; never prompts.
    pub fn refresh(&mut self, is_fullscreen: bool) {
        self.compliant = is_fullscreen;
    }
}

/// Issue a fullscreen request, reporting a missing API as unavailable.
pub fn request_fullscreen(capability: &dyn FullscreenCapability) -> Result<(), ProctorError> {
    if !capability.is_supported() {
        return Err(ProctorError::unavailable(
            Capability::Fullscreen,
            "Fullscreen API not supported",
        ));
    }
    capability.request_fullscreen()
}

/// In-process fullscreen flag for hosts without a real display and for tests.
#[derive(Debug)]
pub struct SimulatedFullscreen {
    supported: bool,
    active: AtomicBool,
}

impl SimulatedFullscreen {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            active: AtomicBool::new(false),
        }
    }

    /// The user left or entered fullscreen outside of a request.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl FullscreenCapability for SimulatedFullscreen {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn is_fullscreen(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn request_fullscreen(&self) -> Result<(), ProctorError> {
        if !self.supported {
            return Err(ProctorError::unavailable(
                Capability::Fullscreen,
                "Fullscreen API not supported",
            ));
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_fullscreen(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_is_reported_only_while_armed() {
        let mut guard = FullscreenGuard::new();
        assert_eq!(guard.on_change(false), None);

        guard.arm(true);
        assert!(guard.is_compliant());
        assert_eq!(guard.on_change(false), Some(FullscreenSignal::Exited));
        assert!(!guard.is_compliant());
        assert_eq!(guard.on_change(true), None);

        guard.disarm();
        assert_eq!(guard.on_change(false), None);
    }

    #[test]
    fn refresh_updates_status_without_signalling() {
        let mut guard = FullscreenGuard::new();
        guard.arm(true);
        guard.refresh(false);
        assert!(!guard.is_compliant());
        guard.refresh(true);
        assert!(guard.is_compliant());
    }

    #[test]
    fn unsupported_capability_is_reported_unavailable() {
        let capability = SimulatedFullscreen::new(false);
        let err = request_fullscreen(&capability).unwrap_err();
        assert!(matches!(
            err,
            ProctorError::CapabilityUnavailable {
                capability: Capability::Fullscreen,
                ..
            }
        ));

        let capability = SimulatedFullscreen::new(true);
        request_fullscreen(&capability).expect("request succeeds");
        assert!(capability.is_fullscreen());
    }
}

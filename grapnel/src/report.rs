//! # Test-Report Integration
//!
//! Every invocation produces two human-readable artifacts (the outgoing call and the
//! formatted response) plus a step annotation covering the whole operation. Where
//! those artifacts end up is decided by the [`Reporter`] the invoker is configured
//! with, so the invoker itself never hardcodes a dependency on any one reporting
//! system.
//!
//! The default [`StdoutReporter`] mirrors attachment bodies to standard output,
//! which is what you want when running tests locally. Test frameworks that collect
//! rich reports (Allure-style collectors, CI artifact stores, ...) plug in their own
//! implementation instead.
use std::time::Duration;

/// Content-kind tag attached to a report artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Json,
}

/// An observer notified about every request/response artifact the invoker produces.
///
/// All methods default to no-ops so implementations only override what their
/// reporting backend supports.
pub trait Reporter: Send + Sync {
    /// Record a named text artifact.
    fn attach(&self, label: &str, kind: ContentKind, body: &str) {
        let _ = (label, kind, body);
    }

    /// A logical operation (one RPC invocation) started.
    fn step_started(&self, title: &str) {
        let _ = title;
    }

    /// The operation finished, successfully or not, after `elapsed` wall-clock time.
    fn step_finished(&self, title: &str, elapsed: Duration) {
        let _ = (title, elapsed);
    }
}

/// The default reporter: prints every attachment body to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn attach(&self, _label: &str, _kind: ContentKind, body: &str) {
        println!("{body}");
    }
}

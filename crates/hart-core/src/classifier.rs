// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error classification for failed commands.
//!
//! A failed execution is either composite (a set of communication fault
//! bits, each counted on its own) or plain (counted once by its
//! description). Classification never fails and never panics.
//!
//! ```text
//! EngineError ──▶ classify() ──┬─▶ Composite([flag, ...]) ──▶ one increment per flag
//!                              ├─▶ Plain(description)     ──▶ one increment
//!                              └─▶ None (empty flag set)  ──▶ nothing
//! ```

use crate::error::EngineError;
use crate::metrics::HartMetrics;
use crate::status::CommErrorFlag;

/// Label used when an error renders as an empty string.
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Sink for failure counts.
pub trait FailureRecorder: Send + Sync {
    /// Counts one communication fault bit.
    fn record_comm_flag(&self, flag: CommErrorFlag);

    /// Counts one plain error.
    fn record_error(&self, description: &str);
}

impl FailureRecorder for HartMetrics {
    fn record_comm_flag(&self, flag: CommErrorFlag) {
        self.inc_communication_error(flag);
    }

    fn record_error(&self, description: &str) {
        self.inc_command_error(description);
    }
}

/// Result of classifying an engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Every set fault bit, in bit order.
    Composite(Vec<CommErrorFlag>),
    /// Description of a single error.
    Plain(String),
    /// A composite error with no bits set.
    None,
}

impl Classification {
    /// Number of counter increments this classification produces.
    pub fn increments(&self) -> usize {
        match self {
            Classification::Composite(flags) => flags.len(),
            Classification::Plain(_) => 1,
            Classification::None => 0,
        }
    }
}

/// Decomposes engine errors into countable units.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classifies an error without side effects.
    pub fn classify(error: &EngineError) -> Classification {
        if let Some(flags) = error.comm_flags() {
            if flags.is_empty() {
                return Classification::None;
            }
            return Classification::Composite(flags.iter().collect());
        }

        Classification::Plain(error_label(error.to_string()))
    }

    /// Classifies an error and records it. Returns the increments performed.
    pub fn record(error: &EngineError, recorder: &dyn FailureRecorder) -> usize {
        let classification = Self::classify(error);
        match &classification {
            Classification::Composite(flags) => {
                for flag in flags {
                    recorder.record_comm_flag(*flag);
                }
            }
            Classification::Plain(description) => recorder.record_error(description),
            Classification::None => {}
        }
        classification.increments()
    }
}

fn error_label(description: String) -> String {
    if description.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        description
    }
}

// =============================================================================
// Tests
// =============================================================================

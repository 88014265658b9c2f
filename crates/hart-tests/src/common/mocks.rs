// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! [`MockEngine`] answers each command from a per-command script first and
//! falls back to a default reply. Clones share state, so a test keeps one
//! clone as a handle after boxing the other into the scheduler.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use hart_core::{
    CommErrorFlag, CommandKind, EngineError, EngineResult, FailureRecorder, ProtocolEngine,
    Response,
};

use super::fixtures::ResponseFixtures;

// =============================================================================
// Mock Protocol Engine
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    fail_open: bool,
    defaults: HashMap<u8, Response>,
    scripts: HashMap<u8, VecDeque<EngineResult<Response>>>,
    latency: HashMap<u8, Duration>,
    calls: Vec<(u8, Instant)>,
    closes: u32,
}

/// A scripted protocol engine.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// An engine with no replies at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine answering every supported command with the fixture reply.
    pub fn transmitter() -> Self {
        let engine = Self::new();
        for number in [0, 1, 2, 3, 13, 15] {
            if let Some(response) = ResponseFixtures::for_command(number) {
                engine.reply(number, response);
            }
        }
        engine
    }

    /// Sets the fallback reply for a command.
    pub fn reply(&self, number: u8, response: Response) -> &Self {
        self.state.lock().defaults.insert(number, response);
        self
    }

    /// Queues a one-shot reply ahead of the fallback.
    pub fn then_reply(&self, number: u8, response: Response) -> &Self {
        self.push(number, Ok(response))
    }

    /// Queues a one-shot failure ahead of the fallback.
    pub fn then_fail(&self, number: u8, error: EngineError) -> &Self {
        self.push(number, Err(error))
    }

    /// Delays every reply to a command by `latency` of (tokio) time.
    pub fn with_latency(&self, number: u8, latency: Duration) -> &Self {
        self.state.lock().latency.insert(number, latency);
        self
    }

    /// Makes every subsequent `open` fail.
    pub fn fail_open(&self) -> &Self {
        self.state.lock().fail_open = true;
        self
    }

    fn push(&self, number: u8, result: EngineResult<Response>) -> &Self {
        self.state
            .lock()
            .scripts
            .entry(number)
            .or_default()
            .push_back(result);
        self
    }

    /// Command numbers in execution order.
    pub fn calls(&self) -> Vec<u8> {
        self.state.lock().calls.iter().map(|(n, _)| *n).collect()
    }

    /// Command numbers with the (tokio) time they were executed.
    pub fn call_times(&self) -> Vec<(u8, Instant)> {
        self.state.lock().calls.clone()
    }

    /// How often a command was executed.
    pub fn count(&self, number: u8) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(n, _)| *n == number)
            .count()
    }

    /// How often `close` was called on an open engine.
    pub fn close_count(&self) -> u32 {
        self.state.lock().closes
    }
}

#[async_trait]
impl ProtocolEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&mut self, channel: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(EngineError::open_failed(channel, "mock refused to open"));
        }
        state.open = true;
        Ok(())
    }

    async fn close(&mut self) -> EngineResult<()> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.open) {
            state.closes += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    async fn execute(&mut self, command: CommandKind) -> EngineResult<Response> {
        let number = command.number();
        let (result, latency) = {
            let mut state = self.state.lock();
            if !state.open {
                return Err(EngineError::NotOpen);
            }
            state.calls.push((number, Instant::now()));

            let result = match state.scripts.get_mut(&number).and_then(VecDeque::pop_front) {
                Some(result) => result,
                None => state
                    .defaults
                    .get(&number)
                    .cloned()
                    .ok_or_else(|| EngineError::invalid_response(number, "no scripted reply")),
            };
            let latency = state.latency.get(&number).copied().unwrap_or_default();
            (result, latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result
    }
}

// =============================================================================
// Recording Failure Sink
// =============================================================================

/// Records classifier output instead of counting it in a registry.
#[derive(Debug, Clone, Default)]
pub struct RecordingFailures {
    flags: Arc<Mutex<Vec<CommErrorFlag>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingFailures {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded communication flags in order.
    pub fn flags(&self) -> Vec<CommErrorFlag> {
        self.flags.lock().clone()
    }

    /// Recorded plain error descriptions in order.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl FailureRecorder for RecordingFailures {
    fn record_comm_flag(&self, flag: CommErrorFlag) {
        self.flags.lock().push(flag);
    }

    fn record_error(&self, description: &str) {
        self.errors.lock().push(description.to_string());
    }
}

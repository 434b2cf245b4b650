//! Mock signal engines used by the unit tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use crate::consts::DMX_MAX_PACKAGE_SIZE;
use crate::signal_engine::{
    DmxInputEngine, DmxOutputEngine, InputEngineProvider, SignalEngine, SignalEngineError,
};
use crate::types::{EnginePool, Millis, Pin};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MockError(pub &'static str);

impl core::fmt::Display for MockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "mock error: {}", self.0)
    }
}

/// Shared simulated monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct MockClock(Arc<AtomicU64>);

impl MockClock {
    pub fn now(&self) -> Millis {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, now: Millis) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: Millis) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct OutputState {
    pub bound: Option<(Pin, EnginePool)>,
    pub bind_count: usize,
    pub release_count: usize,
    pub writes: Vec<Vec<u8>>,
    /// Amount of [DmxOutputEngine::busy] calls that still report a running transmission.
    pub busy_polls: usize,
    pub busy_polls_per_write: usize,
    pub fail_bind: bool,
}

/// Output engine that records every frame it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct MockOutputEngine(Arc<Mutex<OutputState>>);

impl MockOutputEngine {
    pub fn state(&self) -> MutexGuard<'_, OutputState> {
        self.0.lock().unwrap()
    }
}

impl SignalEngine for MockOutputEngine {
    type DriverError = MockError;
}

impl DmxOutputEngine for MockOutputEngine {
    fn bind(
        &mut self,
        pin: Pin,
        pool: EnginePool,
    ) -> Result<(), SignalEngineError<Self::DriverError>> {
        let mut state = self.state();
        if state.fail_bind {
            return Err(SignalEngineError::DriverError(MockError("bind")));
        }

        state.bound = Some((pin, pool));
        state.bind_count += 1;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.state();
        state.bound = None;
        state.release_count += 1;
    }

    fn write(&mut self, frame: &[u8]) {
        let mut state = self.state();
        state.writes.push(frame.to_vec());
        state.busy_polls = state.busy_polls_per_write;
    }

    fn busy(&self) -> bool {
        let mut state = self.state();
        if state.busy_polls == 0 {
            return false;
        }

        state.busy_polls -= 1;
        true
    }
}

#[derive(Debug, Default)]
pub struct LineState {
    pub pin: Pin,
    pub pool: EnginePool,
    pub start_channel: u16,
    pub num_channels: u16,
    pub inverted: bool,
    pub bound: bool,
    pub receiving: bool,
    pub release_count: usize,
    pub frame: Vec<u8>,
    pub landed_at: Option<Millis>,
    pub fail_bind: bool,
    pub fail_begin_receive: bool,
}

/// The wire side of a [MockInputEngine]. Tests use it to land frames.
#[derive(Debug, Clone)]
pub struct MockLine {
    state: Arc<Mutex<LineState>>,
    clock: MockClock,
}

impl MockLine {
    pub fn new(clock: MockClock) -> Self {
        Self {
            state: Arc::new(Mutex::new(LineState::default())),
            clock,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, LineState> {
        self.state.lock().unwrap()
    }

    /// Simulates the arrival of a complete frame at the current time.
    pub fn land_frame(&self, start_code: u8, channels: &[u8]) {
        let mut state = self.state();
        state.frame.clear();
        state.frame.push(start_code);
        state.frame.extend_from_slice(channels);
        state.landed_at = Some(self.clock.now());
    }

    pub fn engine(&self) -> MockInputEngine {
        MockInputEngine {
            line: self.clone(),
            scratch: [0u8; DMX_MAX_PACKAGE_SIZE],
        }
    }
}

pub struct MockInputEngine {
    line: MockLine,
    scratch: [u8; DMX_MAX_PACKAGE_SIZE],
}

impl MockInputEngine {
    fn frame_length(state: &LineState) -> usize {
        state.num_channels as usize + 1
    }
}

impl SignalEngine for MockInputEngine {
    type DriverError = MockError;
}

impl DmxInputEngine for MockInputEngine {
    fn bind(
        &mut self,
        pin: Pin,
        pool: EnginePool,
        start_channel: u16,
        num_channels: u16,
        inverted: bool,
    ) -> Result<(), SignalEngineError<Self::DriverError>> {
        let mut state = self.line.state();
        if state.fail_bind {
            return Err(SignalEngineError::DriverError(MockError("bind")));
        }

        state.pin = pin;
        state.pool = pool;
        state.start_channel = start_channel;
        state.num_channels = num_channels;
        state.inverted = inverted;
        state.bound = true;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.line.state();
        state.bound = false;
        state.release_count += 1;
    }

    fn begin_receive(&mut self) -> Result<(), SignalEngineError<Self::DriverError>> {
        let mut state = self.line.state();
        if state.fail_begin_receive {
            return Err(SignalEngineError::DriverError(MockError("begin_receive")));
        }

        state.receiving = true;
        Ok(())
    }

    fn end_receive(&mut self) {
        self.line.state().receiving = false;
    }

    fn scratch(&mut self) -> &[u8] {
        let state = self.line.state();
        let length = Self::frame_length(&state);

        self.scratch.fill(0);
        let copy_length = state.frame.len().min(length);
        self.scratch[..copy_length].copy_from_slice(&state.frame[..copy_length]);

        &self.scratch[..length]
    }

    fn read_frame(
        &mut self,
        frame: &mut [u8],
    ) -> Result<usize, SignalEngineError<Self::DriverError>> {
        let state = self.line.state();
        if state.frame.is_empty() {
            return Err(SignalEngineError::TimeoutError);
        }

        let copy_length = state.frame.len().min(frame.len());
        frame[..copy_length].copy_from_slice(&state.frame[..copy_length]);
        Ok(copy_length)
    }

    fn last_frame_timestamp(&self) -> Option<Millis> {
        self.line.state().landed_at
    }

    fn now_millis(&self) -> Millis {
        self.line.clock.now()
    }
}

#[derive(Debug, Default)]
pub struct ProviderState {
    pub lines: Vec<(Pin, MockLine)>,
    pub acquired: usize,
    pub fail_acquire_at: Option<usize>,
    pub fail_bind_at: Option<usize>,
    pub fail_begin_receive_at: Option<usize>,
}

/// Hands out [MockInputEngine]s that share one [MockClock].
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    pub clock: MockClock,
    state: Arc<Mutex<ProviderState>>,
}

impl MockProvider {
    pub fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap()
    }

    /// The line of the engine that was handed out for `pin`.
    pub fn line(&self, pin: Pin) -> MockLine {
        self.state()
            .lines
            .iter()
            .rev()
            .find(|(line_pin, _)| *line_pin == pin)
            .map(|(_, line)| line.clone())
            .unwrap()
    }

    pub fn lines(&self) -> Vec<MockLine> {
        self.state()
            .lines
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl InputEngineProvider for MockProvider {
    type Engine = MockInputEngine;

    fn acquire(&mut self, pin: Pin, _pool: EnginePool) -> Result<MockInputEngine, MockError> {
        let mut state = self.state();
        let index = state.acquired;
        if state.fail_acquire_at == Some(index) {
            return Err(MockError("acquire"));
        }
        state.acquired += 1;

        let line = MockLine::new(self.clock.clone());
        {
            let mut line_state = line.state();
            line_state.fail_bind = state.fail_bind_at == Some(index);
            line_state.fail_begin_receive = state.fail_begin_receive_at == Some(index);
        }
        state.lines.push((pin, line.clone()));

        Ok(line.engine())
    }
}

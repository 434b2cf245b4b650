use crate::types::{EnginePool, Millis, Pin};

/// Failure reported by a signal engine while claiming a line or moving a frame.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalEngineError<E> {
    /// No complete frame arrived on the line in time. Engines report a missing frame with this
    /// variant so callers can tell an idle line from a hardware fault.
    TimeoutError,
    /// The state machine or peripheral behind the engine failed.
    DriverError(E),
}

impl<E: core::fmt::Display> core::fmt::Display for SignalEngineError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SignalEngineError::TimeoutError => write!(f, "no frame received in time"),
            SignalEngineError::DriverError(error) => error.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for SignalEngineError<E> {}

impl<E> From<E> for SignalEngineError<E> {
    fn from(value: E) -> Self {
        Self::DriverError(value)
    }
}

/// Common base of all signal engines. The engine generates and decodes the DMX512 waveform
/// (break, mark after break, slot timing) on one physical line.
pub trait SignalEngine {
    type DriverError;
}

/// A signal engine that can generate DMX512 frames.
pub trait DmxOutputEngine: SignalEngine {
    /// Bind the engine to a physical line.
    fn bind(
        &mut self,
        pin: Pin,
        pool: EnginePool,
    ) -> Result<(), SignalEngineError<Self::DriverError>>;

    /// Release the physical line. Called at most once per successful [DmxOutputEngine::bind].
    fn release(&mut self);

    /// Start sending a frame. The first byte is the start code.
    /// This must not block, completion is observed through [DmxOutputEngine::busy].
    fn write(&mut self, frame: &[u8]);

    /// Returns true while a frame is still being sent.
    fn busy(&self) -> bool;
}

/// A signal engine that can decode DMX512 frames.
///
/// Reception happens asynchronously into a scratch buffer owned by the engine. Once a complete
/// frame has landed in it, the platform is expected to call the completion handler of the owner
/// of the engine ([crate::dmx_receiver::Receiver::handle_frame_complete] or one of the
/// trampolines of [crate::dmx_multi_receiver::MultiUniverseReceiver]).
pub trait DmxInputEngine: SignalEngine {
    /// Bind the engine to a physical line. Only `num_channels` channels beginning with
    /// `start_channel` (1-based) are captured.
    fn bind(
        &mut self,
        pin: Pin,
        pool: EnginePool,
        start_channel: u16,
        num_channels: u16,
        inverted: bool,
    ) -> Result<(), SignalEngineError<Self::DriverError>>;

    /// Release the physical line. Called at most once per successful [DmxInputEngine::bind].
    fn release(&mut self);

    /// Arm asynchronous reception into the scratch buffer.
    fn begin_receive(&mut self) -> Result<(), SignalEngineError<Self::DriverError>>;

    /// Disarm asynchronous reception.
    fn end_receive(&mut self);

    /// The scratch buffer of the last completed frame. The first byte is the start code
    /// followed by the captured channels.
    fn scratch(&mut self) -> &[u8];

    /// Blocking read of one frame into `frame`, start code included.
    /// Returns the number of bytes actually read.
    fn read_frame(
        &mut self,
        frame: &mut [u8],
    ) -> Result<usize, SignalEngineError<Self::DriverError>>;

    /// The monotonic time the last complete frame landed at or `None` if no frame has been
    /// received yet.
    fn last_frame_timestamp(&self) -> Option<Millis>;

    /// The current monotonic time, on the same clock as [DmxInputEngine::last_frame_timestamp].
    fn now_millis(&self) -> Millis;
}

/// Hands out one input engine per universe slot.
pub trait InputEngineProvider {
    type Engine: DmxInputEngine;

    /// Acquire an engine for the line `pin` in `pool`.
    fn acquire(
        &mut self,
        pin: Pin,
        pool: EnginePool,
    ) -> Result<Self::Engine, <Self::Engine as SignalEngine>::DriverError>;
}

#[cfg(test)]
mod tests {
    use super::SignalEngineError;
    use crate::test_utils::MockError;
    use std::string::ToString;

    #[test]
    fn test_error_messages() {
        let timeout: SignalEngineError<MockError> = SignalEngineError::TimeoutError;
        assert_eq!(timeout.to_string(), "no frame received in time");

        let driver: SignalEngineError<MockError> = MockError("state machine stalled").into();
        assert!(matches!(
            driver,
            SignalEngineError::DriverError(MockError("state machine stalled"))
        ));
        assert_eq!(driver.to_string(), "mock error: state machine stalled");
    }
}

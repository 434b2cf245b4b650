use crate::consts::DMX_MAX_PACKAGE_SIZE;
use crate::signal_engine::{DmxOutputEngine, SignalEngineError};
use crate::types::{EnginePool, Pin};
use crate::universe_buffer::{UniverseBuffer, UniverseError};

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitterError<E> {
    /// The transmitter hasn't been started using [Transmitter::begin].
    NotInitialized,
    /// An error raised by the signal engine.
    Engine(SignalEngineError<E>),
}

impl<E: core::fmt::Display> core::fmt::Display for TransmitterError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransmitterError::NotInitialized => write!(f, "transmitter is not initialized"),
            TransmitterError::Engine(error) => error.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for TransmitterError<E> {}

impl<E> From<SignalEngineError<E>> for TransmitterError<E> {
    fn from(value: SignalEngineError<E>) -> Self {
        Self::Engine(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransmitterConfig {
    /// The physical line to send on.
    pub pin: Pin,
    /// The engine pool to use.
    pub pool: EnginePool,
}

/// Sends one DMX universe through a [DmxOutputEngine].
///
/// Channel manipulation only touches the local buffer; the engine is used by
/// [Transmitter::transmit] exclusively.
pub struct Transmitter<E: DmxOutputEngine> {
    engine: E,
    config: TransmitterConfig,
    is_initialized: bool,
    buffer: UniverseBuffer,
}

impl<E: DmxOutputEngine> Transmitter<E> {
    /// Creates a new [Transmitter] with all channels at 0.
    pub fn new(engine: E, config: TransmitterConfig) -> Self {
        Self {
            engine,
            config,
            is_initialized: false,
            buffer: UniverseBuffer::new(),
        }
    }

    /// Bind the engine to the line. Does nothing if the transmitter is already initialized.
    pub fn begin(&mut self) -> Result<(), TransmitterError<E::DriverError>> {
        if self.is_initialized {
            return Ok(());
        }

        self.engine.bind(self.config.pin, self.config.pool)?;
        self.is_initialized = true;

        debug!("transmitter bound to pin {}", self.config.pin);
        Ok(())
    }

    /// Release the line. Safe to call multiple times.
    pub fn end(&mut self) {
        if !self.is_initialized {
            return;
        }

        self.engine.release();
        self.is_initialized = false;

        debug!("transmitter released pin {}", self.config.pin);
    }

    /// Set a channel (1-512).
    pub fn set_channel(&mut self, channel: u16, value: u8) -> Result<(), UniverseError> {
        self.buffer.set(channel, value)
    }

    /// Get a channel (1-512). Returns 0 for channels outside the universe.
    pub fn get_channel(&self, channel: u16) -> u8 {
        self.buffer.get(channel)
    }

    /// Set consecutive channels beginning with `start_channel`.
    pub fn set_channel_range(
        &mut self,
        start_channel: u16,
        data: &[u8],
    ) -> Result<(), UniverseError> {
        self.buffer.set_range(start_channel, data)
    }

    /// Replace the universe with `data`. Channels beyond `data` are set to 0.
    pub fn set_universe(&mut self, data: &[u8]) {
        self.buffer.fill_from(data);
    }

    /// Set all channels to 0.
    pub fn clear_universe(&mut self) {
        self.buffer.clear();
    }

    /// Start sending the first `length` channels (0 = the whole universe) plus the start code.
    /// This doesn't wait for the frame to be sent, see [Transmitter::wait_for_completion].
    ///
    /// Returns the amount of bytes handed to the engine.
    pub fn transmit(&mut self, length: u16) -> Result<usize, TransmitterError<E::DriverError>> {
        if !self.is_initialized {
            return Err(TransmitterError::NotInitialized);
        }

        let transmit_length = match length as usize {
            0 => DMX_MAX_PACKAGE_SIZE,
            length => (length + 1).min(DMX_MAX_PACKAGE_SIZE),
        };

        self.engine.write(&self.buffer.as_frame()[..transmit_length]);
        Ok(transmit_length)
    }

    /// True while a frame is being sent.
    pub fn is_busy(&self) -> bool {
        self.is_initialized && self.engine.busy()
    }

    /// Spins until the current frame has been sent. The wait is bounded by the duration of one
    /// frame ([crate::consts::MAXIMUM_DMX512_MILLIS]).
    pub fn wait_for_completion(&self) {
        while self.is_busy() {
            core::hint::spin_loop();
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn get_pin(&self) -> Pin {
        self.config.pin
    }

    pub fn get_pool(&self) -> EnginePool {
        self.config.pool
    }

    pub fn get_buffer(&self) -> &UniverseBuffer {
        &self.buffer
    }

    /// Get a reference to the underlying engine.
    pub fn get_driver(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: DmxOutputEngine> Drop for Transmitter<E> {
    fn drop(&mut self) {
        self.end();
    }
}

/// Start a frame on every transmitter so the universes go out in parallel.
/// All transmitters are attempted even if one of them fails; the first error is returned.
///
/// Returns the amount of transmitters that started a frame.
pub fn transmit_all<E: DmxOutputEngine>(
    transmitters: &mut [Transmitter<E>],
    length: u16,
) -> Result<usize, TransmitterError<E::DriverError>> {
    let mut started = 0;
    let mut first_error = None;

    for transmitter in transmitters.iter_mut() {
        match transmitter.transmit(length) {
            Ok(_) => started += 1,
            Err(error) => {
                first_error.get_or_insert(error);
            },
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(started),
    }
}

/// Spins until none of the transmitters is busy anymore.
pub fn wait_for_all<E: DmxOutputEngine>(transmitters: &[Transmitter<E>]) {
    while transmitters.iter().any(Transmitter::is_busy) {
        core::hint::spin_loop();
    }
}

use crate::consts::{DMX_MAX_PACKAGE_SIZE, DMX_NULL_START, DMX_UNIVERSE_SIZE};
use crate::signal_engine::{DmxInputEngine, SignalEngineError};
use crate::types::{EnginePool, Millis, Pin};
use crate::universe_buffer::UniverseBuffer;

/// Called after a frame has been copied into the buffer of the [Receiver].
/// It runs in the context the frame completion was signalled from and must not block.
pub type ReceiverCallback<E> = fn(&Receiver<E>);

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiverError<E> {
    /// The receiver hasn't been started using [Receiver::begin].
    NotInitialized,
    /// There is already an active subscription.
    AlreadyActive,
    /// An error raised by the signal engine.
    Engine(SignalEngineError<E>),
}

impl<E: core::fmt::Display> core::fmt::Display for ReceiverError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReceiverError::NotInitialized => write!(f, "receiver is not initialized"),
            ReceiverError::AlreadyActive => write!(f, "asynchronous reception is already active"),
            ReceiverError::Engine(error) => error.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for ReceiverError<E> {}

impl<E> From<SignalEngineError<E>> for ReceiverError<E> {
    fn from(value: SignalEngineError<E>) -> Self {
        Self::Engine(value)
    }
}

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// The physical line to receive on.
    pub pin: Pin,
    /// The first channel (1-based) to capture.
    pub start_channel: u16,
    /// The amount of channels to capture.
    pub num_channels: u16,
    /// The engine pool to use.
    pub pool: EnginePool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            pin: 0,
            start_channel: 1,
            num_channels: DMX_UNIVERSE_SIZE as u16,
            pool: EnginePool::A,
        }
    }
}

/// Receives one DMX universe through a [DmxInputEngine].
///
/// Channels are addressed relative to the configured start channel, starting at 0.
pub struct Receiver<E: DmxInputEngine> {
    engine: E,
    config: ReceiverConfig,
    is_initialized: bool,
    is_async_active: bool,
    buffer: UniverseBuffer,
    callback: Option<ReceiverCallback<E>>,
}

impl<E: DmxInputEngine> Receiver<E> {
    /// Creates a new [Receiver]. The captured window is clamped to the universe.
    pub fn new(engine: E, config: ReceiverConfig) -> Self {
        let start_channel = config.start_channel.clamp(1, DMX_UNIVERSE_SIZE as u16);
        let max_channels = DMX_UNIVERSE_SIZE as u16 - start_channel + 1;

        Self {
            engine,
            config: ReceiverConfig {
                start_channel,
                num_channels: config.num_channels.clamp(1, max_channels),
                ..config
            },
            is_initialized: false,
            is_async_active: false,
            buffer: UniverseBuffer::new(),
            callback: None,
        }
    }

    /// Bind the engine to the line. Does nothing if the receiver is already initialized.
    pub fn begin(&mut self, inverted: bool) -> Result<(), ReceiverError<E::DriverError>> {
        if self.is_initialized {
            return Ok(());
        }

        self.engine.bind(
            self.config.pin,
            self.config.pool,
            self.config.start_channel,
            self.config.num_channels,
            inverted,
        )?;
        self.buffer.clear();
        self.is_initialized = true;

        debug!("receiver bound to pin {}", self.config.pin);
        Ok(())
    }

    /// Stop any subscription and release the line. Safe to call multiple times.
    pub fn end(&mut self) {
        if !self.is_initialized {
            return;
        }

        self.stop_async();
        self.engine.release();
        self.is_initialized = false;

        debug!("receiver released pin {}", self.config.pin);
    }

    /// Blocking read of a single frame. The captured channels get copied into `output`.
    ///
    /// Returns true if the frame carried the null start code.
    pub fn read(&mut self, output: &mut [u8]) -> Result<bool, ReceiverError<E::DriverError>> {
        if !self.is_initialized {
            return Err(ReceiverError::NotInitialized);
        }

        let mut frame = [0u8; DMX_MAX_PACKAGE_SIZE];
        let frame_length = self.config.num_channels as usize + 1;
        let bytes_read = self.engine.read_frame(&mut frame[..frame_length])?;
        if bytes_read == 0 {
            return Ok(false);
        }

        let copy_length = (bytes_read - 1).min(output.len());
        output[..copy_length].copy_from_slice(&frame[1..=copy_length]);

        Ok(frame[0] == DMX_NULL_START)
    }

    /// Arm asynchronous reception. Every completed frame is copied into the buffer of the
    /// receiver before `callback` is invoked.
    pub fn start_async(
        &mut self,
        callback: Option<ReceiverCallback<E>>,
    ) -> Result<(), ReceiverError<E::DriverError>> {
        if !self.is_initialized {
            return Err(ReceiverError::NotInitialized);
        }
        if self.is_async_active {
            return Err(ReceiverError::AlreadyActive);
        }

        self.engine.begin_receive()?;
        self.callback = callback;
        self.is_async_active = true;

        debug!("receiver on pin {} started receiving", self.config.pin);
        Ok(())
    }

    /// Disarm asynchronous reception. Does nothing if there is no active subscription.
    pub fn stop_async(&mut self) {
        if !self.is_async_active {
            return;
        }

        self.engine.end_receive();
        self.is_async_active = false;
        self.callback = None;

        debug!("receiver on pin {} stopped receiving", self.config.pin);
    }

    /// Call this function when the engine signals a completed frame, usually from its
    /// interrupt. Copies the channels out of the engine's scratch buffer and invokes the
    /// callback afterwards.
    ///
    /// Returns false if there is no active subscription, in which case nothing happens.
    pub fn handle_frame_complete(&mut self) -> bool {
        if !self.is_async_active {
            return false;
        }

        let scratch = self.engine.scratch();
        self.buffer.fill_from(scratch.get(1..).unwrap_or(&[]));
        trace!("frame completed on pin {}", self.config.pin);

        if let Some(callback) = self.callback {
            callback(self);
        }

        true
    }

    /// Get a channel relative to the start channel. Returns 0 if the channel wasn't captured
    /// or there is no active subscription.
    pub fn get_channel(&self, relative_channel: u16) -> u8 {
        if !self.is_async_active || relative_channel >= self.config.num_channels {
            return 0;
        }

        self.buffer.get(relative_channel + 1)
    }

    /// Copies consecutive channels into `output`. Returns false if the range wasn't captured
    /// or there is no active subscription.
    pub fn get_channel_range(&self, relative_start: u16, output: &mut [u8]) -> bool {
        let num_channels = self.config.num_channels as usize;
        let start = relative_start as usize;
        if !self.is_async_active || start >= num_channels || start + output.len() > num_channels {
            return false;
        }

        output.copy_from_slice(&self.buffer.channels()[start..start + output.len()]);
        true
    }

    /// The captured channels. Empty without an active subscription.
    pub fn get_channels(&self) -> &[u8] {
        if !self.is_async_active {
            return &[];
        }

        &self.buffer.channels()[..self.config.num_channels as usize]
    }

    /// The time the last frame landed. 0 if nothing has been received yet.
    pub fn get_last_packet_timestamp(&self) -> Millis {
        if !self.is_initialized {
            return 0;
        }

        self.engine.last_frame_timestamp().unwrap_or(0)
    }

    /// True if the last frame landed less than `timeout_millis` ago.
    pub fn is_signal_present(&self, timeout_millis: Millis) -> bool {
        if !self.is_initialized {
            return false;
        }

        match self.engine.last_frame_timestamp() {
            Some(last_frame) => {
                self.engine.now_millis().saturating_sub(last_frame) < timeout_millis
            },
            None => false,
        }
    }

    pub fn get_pin(&self) -> Pin {
        self.config.pin
    }

    pub fn get_pool(&self) -> EnginePool {
        self.config.pool
    }

    pub fn get_start_channel(&self) -> u16 {
        self.config.start_channel
    }

    pub fn get_num_channels(&self) -> u16 {
        self.config.num_channels
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn is_async_active(&self) -> bool {
        self.is_async_active
    }

    /// The buffer the frames are copied into. Channel 1 of the buffer is the start channel.
    pub fn get_buffer(&self) -> &UniverseBuffer {
        &self.buffer
    }

    /// Get a reference to the underlying engine.
    pub fn get_driver(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: DmxInputEngine> Drop for Receiver<E> {
    fn drop(&mut self) {
        self.end();
    }
}

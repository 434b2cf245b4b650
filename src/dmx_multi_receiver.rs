use crate::consts::{DMX_UNIVERSE_SIZE, MAX_UNIVERSES};
use crate::dmx_receiver::{Receiver, ReceiverConfig, ReceiverError};
use crate::signal_engine::{InputEngineProvider, SignalEngine};
use crate::types::{ChannelAssignment, EnginePool, Millis, Pin};
use crate::universe_buffer::ChannelSummary;

type DriverErrorOf<P> = <<P as InputEngineProvider>::Engine as SignalEngine>::DriverError;

/// Called after a frame of `universe_index` has been received and the statistics were updated.
/// It runs in the context the frame completion was signalled from and must not block.
pub type MultiUniverseCallback<P> = fn(&MultiUniverseReceiver<P>, usize);

/// Forwards the frame completion of one fixed universe slot to its coordinator.
pub type UniverseTrampoline<P> = fn(&mut MultiUniverseReceiver<P>);

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MultiReceiverError<E> {
    /// [MultiUniverseReceiver::end] has to be called before setting up again.
    AlreadyInitialized,
    /// Between 1 and [MAX_UNIVERSES] universes are supported.
    InvalidUniverseCount(usize),
    /// The engine for a universe couldn't be acquired.
    Acquisition { universe: usize, error: E },
    /// The receiver for a universe couldn't be started.
    Receiver {
        universe: usize,
        error: ReceiverError<E>,
    },
}

impl<E: core::fmt::Display> core::fmt::Display for MultiReceiverError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MultiReceiverError::AlreadyInitialized => write!(f, "already initialized"),
            MultiReceiverError::InvalidUniverseCount(count) => {
                write!(f, "{count} universes requested, 1 to {MAX_UNIVERSES} are supported")
            },
            MultiReceiverError::Acquisition { universe, error } => {
                write!(f, "acquiring engine of universe {universe} failed: {error}")
            },
            MultiReceiverError::Receiver { universe, error } => {
                write!(f, "starting universe {universe} failed: {error}")
            },
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for MultiReceiverError<E> {}

/// Statistics of a single universe.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UniverseStats {
    /// Frames received since the last reset. Wraps around.
    pub frames_received: u32,
    /// The time the last frame landed.
    pub last_frame_timestamp: Millis,
    /// Amount of channels with a value other than 0.
    pub active_channels: u16,
    /// The highest channel value.
    pub max_value: u8,
    /// The first channel (1-based) holding the highest value. 0 if all channels are 0.
    pub max_value_channel: u16,
}

impl UniverseStats {
    fn apply_summary(&mut self, summary: ChannelSummary) {
        self.active_channels = summary.active_channels;
        self.max_value = summary.max_value;
        self.max_value_channel = summary.max_value_channel;
    }
}

/// Receives up to [MAX_UNIVERSES] universes in parallel.
///
/// The first four universes are put into [EnginePool::A], the remaining ones into
/// [EnginePool::B].
///
/// Frame completions are routed through [MultiUniverseReceiver::trampoline]: every universe
/// slot has its own function which the platform registers with the completion interrupt of the
/// engine it belongs to. The coordinator is handed to the trampoline explicitly, so any number
/// of coordinators can exist at the same time. All mutating paths take `&mut self`; sharing a
/// coordinator with an interrupt handler requires an exclusive-access cell such as a critical
/// section mutex, which also serializes the statistics updates.
pub struct MultiUniverseReceiver<P: InputEngineProvider> {
    provider: P,
    receivers: heapless::Vec<Receiver<P::Engine>, MAX_UNIVERSES>,
    callback: Option<MultiUniverseCallback<P>>,
    stats: [UniverseStats; MAX_UNIVERSES],
}

impl<P: InputEngineProvider> MultiUniverseReceiver<P> {
    const TRAMPOLINES: [UniverseTrampoline<P>; MAX_UNIVERSES] = [
        Self::universe_trampoline::<0>,
        Self::universe_trampoline::<1>,
        Self::universe_trampoline::<2>,
        Self::universe_trampoline::<3>,
        Self::universe_trampoline::<4>,
        Self::universe_trampoline::<5>,
        Self::universe_trampoline::<6>,
        Self::universe_trampoline::<7>,
    ];

    /// Creates a new [MultiUniverseReceiver] that acquires its engines from `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            receivers: heapless::Vec::new(),
            callback: None,
            stats: [UniverseStats::default(); MAX_UNIVERSES],
        }
    }

    /// Start receiving `num_universes` universes on consecutive lines beginning with
    /// `start_pin`.
    pub fn begin(
        &mut self,
        start_pin: Pin,
        num_universes: usize,
        callback: Option<MultiUniverseCallback<P>>,
    ) -> Result<(), MultiReceiverError<DriverErrorOf<P>>> {
        if self.is_initialized() {
            return Err(MultiReceiverError::AlreadyInitialized);
        }
        if num_universes == 0 || num_universes > MAX_UNIVERSES {
            return Err(MultiReceiverError::InvalidUniverseCount(num_universes));
        }

        let mut pins = [0 as Pin; MAX_UNIVERSES];
        for (offset, pin) in pins.iter_mut().enumerate() {
            *pin = start_pin.wrapping_add(offset as Pin);
        }

        self.begin_custom(&pins[..num_universes], callback)
    }

    /// Start receiving one universe per entry of `pins`.
    ///
    /// If any universe fails to start, every universe that was already started is torn down
    /// again and the coordinator stays uninitialized.
    pub fn begin_custom(
        &mut self,
        pins: &[Pin],
        callback: Option<MultiUniverseCallback<P>>,
    ) -> Result<(), MultiReceiverError<DriverErrorOf<P>>> {
        if self.is_initialized() {
            return Err(MultiReceiverError::AlreadyInitialized);
        }
        if pins.is_empty() || pins.len() > MAX_UNIVERSES {
            return Err(MultiReceiverError::InvalidUniverseCount(pins.len()));
        }

        self.callback = callback;
        if let Err(error) = self.bring_up(pins) {
            warn!("bringing up {} universes failed, rolling back", pins.len());
            self.end();
            return Err(error);
        }

        debug!("receiving {} universes", pins.len());
        Ok(())
    }

    fn bring_up(&mut self, pins: &[Pin]) -> Result<(), MultiReceiverError<DriverErrorOf<P>>> {
        for (universe, &pin) in pins.iter().enumerate() {
            let assignment = ChannelAssignment::new(universe, pin)
                .ok_or(MultiReceiverError::InvalidUniverseCount(pins.len()))?;

            let engine = self
                .provider
                .acquire(assignment.pin, assignment.pool)
                .map_err(|error| MultiReceiverError::Acquisition { universe, error })?;

            let receiver = Receiver::new(
                engine,
                ReceiverConfig {
                    pin: assignment.pin,
                    pool: assignment.pool,
                    ..Default::default()
                },
            );
            if self.receivers.push(receiver).is_err() {
                return Err(MultiReceiverError::InvalidUniverseCount(pins.len()));
            }

            let receiver = &mut self.receivers[universe];
            receiver
                .begin(false)
                .and_then(|_| receiver.start_async(None))
                .map_err(|error| MultiReceiverError::Receiver { universe, error })?;

            self.stats[universe] = UniverseStats::default();
        }

        Ok(())
    }

    /// Tear down all universes and reset the statistics. Safe to call multiple times.
    pub fn end(&mut self) {
        if self.is_initialized() {
            debug!("tearing down {} universes", self.receivers.len());
        }

        for receiver in self.receivers.iter_mut() {
            receiver.end();
        }
        self.receivers.clear();
        self.callback = None;
        self.stats = [UniverseStats::default(); MAX_UNIVERSES];
    }

    fn universe_trampoline<const UNIVERSE: usize>(coordinator: &mut Self) {
        coordinator.on_universe_frame(UNIVERSE);
    }

    /// The function that has to be invoked when the engine of `universe_index` completed a
    /// frame. `None` if the index exceeds [MAX_UNIVERSES].
    pub fn trampoline(universe_index: usize) -> Option<UniverseTrampoline<P>> {
        Self::TRAMPOLINES.get(universe_index).copied()
    }

    /// Invoke the trampoline of `universe_index`. For platforms whose completion interrupt
    /// reports the index of the engine.
    pub fn dispatch_frame_complete(&mut self, universe_index: usize) {
        if let Some(trampoline) = Self::trampoline(universe_index) {
            trampoline(self);
        }
    }

    fn on_universe_frame(&mut self, universe_index: usize) {
        let Some(receiver) = self.receivers.get_mut(universe_index) else {
            return;
        };
        if !receiver.handle_frame_complete() {
            return;
        }

        let stats = &mut self.stats[universe_index];
        stats.frames_received = stats.frames_received.wrapping_add(1);
        self.update_stats(universe_index);

        if let Some(callback) = self.callback {
            callback(self, universe_index);
        }
    }

    fn update_stats(&mut self, universe_index: usize) {
        let Some(receiver) = self.receivers.get(universe_index) else {
            return;
        };

        let stats = &mut self.stats[universe_index];
        stats.last_frame_timestamp = receiver.get_last_packet_timestamp();
        stats.apply_summary(ChannelSummary::scan(receiver.get_channels()));
    }

    /// Get a channel (1-512) of a universe. Returns 0 for unknown universes or channels.
    pub fn get_channel(&self, universe_index: usize, channel: u16) -> u8 {
        if channel < 1 || channel as usize > DMX_UNIVERSE_SIZE {
            return 0;
        }

        self.receivers
            .get(universe_index)
            .map_or(0, |receiver| receiver.get_channel(channel - 1))
    }

    /// Copy consecutive channels of a universe into `output`.
    /// Returns false if the universe is unknown or the range exceeds the universe.
    pub fn get_channel_range(
        &self,
        universe_index: usize,
        start_channel: u16,
        output: &mut [u8],
    ) -> bool {
        if start_channel < 1
            || start_channel as usize > DMX_UNIVERSE_SIZE
            || start_channel as usize + output.len() - 1 > DMX_UNIVERSE_SIZE
        {
            return false;
        }

        self.receivers
            .get(universe_index)
            .is_some_and(|receiver| receiver.get_channel_range(start_channel - 1, output))
    }

    /// The 512 channels of a universe. Element 0 is channel 1.
    pub fn get_universe_buffer(&self, universe_index: usize) -> Option<&[u8]> {
        self.receivers
            .get(universe_index)
            .map(Receiver::get_channels)
    }

    pub fn get_last_packet_timestamp(&self, universe_index: usize) -> Millis {
        self.receivers
            .get(universe_index)
            .map_or(0, Receiver::get_last_packet_timestamp)
    }

    /// True if a frame landed on the universe less than `timeout_millis` ago.
    pub fn is_signal_present(&self, universe_index: usize, timeout_millis: Millis) -> bool {
        self.receivers
            .get(universe_index)
            .is_some_and(|receiver| receiver.is_signal_present(timeout_millis))
    }

    /// True if every universe received a frame less than `timeout_millis` ago.
    /// False if the coordinator isn't initialized.
    pub fn are_all_signals_present(&self, timeout_millis: Millis) -> bool {
        self.is_initialized()
            && self
                .receivers
                .iter()
                .all(|receiver| receiver.is_signal_present(timeout_millis))
    }

    /// The statistics of a universe, rescanned before returning. Zeroed for unknown universes.
    pub fn get_universe_stats(&mut self, universe_index: usize) -> UniverseStats {
        if universe_index >= self.receivers.len() {
            return UniverseStats::default();
        }

        self.update_stats(universe_index);
        self.stats[universe_index]
    }

    /// Zero the statistics of all slots, including unused ones.
    pub fn reset_stats(&mut self) {
        self.stats = [UniverseStats::default(); MAX_UNIVERSES];
    }

    pub fn get_num_universes(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_initialized(&self) -> bool {
        !self.receivers.is_empty()
    }

    /// The line of a universe. 0 for unknown universes.
    pub fn get_pin(&self, universe_index: usize) -> Pin {
        self.receivers
            .get(universe_index)
            .map_or(0, Receiver::get_pin)
    }

    pub fn get_pool(&self, universe_index: usize) -> Option<EnginePool> {
        self.receivers.get(universe_index).map(Receiver::get_pool)
    }

    pub fn get_receiver(&self, universe_index: usize) -> Option<&Receiver<P::Engine>> {
        self.receivers.get(universe_index)
    }
}

impl<P: InputEngineProvider> Drop for MultiUniverseReceiver<P> {
    fn drop(&mut self) {
        self.end();
    }
}

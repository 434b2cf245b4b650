pub const DMX_NULL_START: u8 = 0x00;
/// Amount of channels in one universe.
pub const DMX_UNIVERSE_SIZE: usize = 512;
/// start code + 512 byte package
pub const DMX_MAX_PACKAGE_SIZE: usize = DMX_UNIVERSE_SIZE + 1;

/// Upper bound for the duration of one full DMX512 frame. Busy-waits on the signal engine are
/// bounded by this.
pub const MAXIMUM_DMX512_MILLIS: usize = 1250;

/// Amount of universes a [crate::dmx_multi_receiver::MultiUniverseReceiver] can drive in parallel.
pub const MAX_UNIVERSES: usize = 8;
/// Amount of universes that share one engine pool.
pub const UNIVERSES_PER_POOL: usize = 4;

/// Timeout used by the signal presence checks if the caller has no better value.
pub const DEFAULT_SIGNAL_TIMEOUT_MILLIS: u64 = 1000;

use crate::consts::{MAX_UNIVERSES, UNIVERSES_PER_POOL};

/// A physical signal line identifier, for example a gpio pin number.
pub type Pin = u32;

/// Monotonic time in milliseconds.
pub type Millis = u64;

/// One of the two hardware engine groups the universes are distributed across.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EnginePool {
    /// Serves universes 0 to 3.
    #[default]
    A = 0x00,
    /// Serves universes 4 to 7.
    B = 0x01,
}

impl EnginePool {
    /// The pool a universe slot is assigned to. Universes are distributed in blocks of
    /// [UNIVERSES_PER_POOL].
    pub fn for_universe(universe_index: usize) -> Self {
        if universe_index < UNIVERSES_PER_POOL {
            Self::A
        } else {
            Self::B
        }
    }
}

impl TryFrom<u8> for EnginePool {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(Self::A),
            0x01 => Ok(Self::B),
            _ => Err(()),
        }
    }
}

/// Fixed assignment of a universe slot to its physical line and engine pool.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelAssignment {
    pub universe_index: usize,
    pub pin: Pin,
    pub pool: EnginePool,
}

impl ChannelAssignment {
    /// Returns `None` if the universe index exceeds [MAX_UNIVERSES].
    pub fn new(universe_index: usize, pin: Pin) -> Option<Self> {
        if universe_index >= MAX_UNIVERSES {
            return None;
        }

        Some(Self {
            universe_index,
            pin,
            pool: EnginePool::for_universe(universe_index),
        })
    }
}

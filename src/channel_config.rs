use crate::consts::MAX_UNIVERSES;
use crate::dmx_transmitter::Transmitter;
use crate::signal_engine::DmxOutputEngine;

/// A single channel preset.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// The channel (1-512).
    pub channel: u16,
    /// The value of the channel.
    pub value: u8,
}

impl ChannelConfig {
    pub const fn new(channel: u16, value: u8) -> Self {
        Self { channel, value }
    }
}

/// Set every channel listed in `config`. Entries with channels outside of 1 to 512 are skipped.
/// Channels not listed keep their current value.
///
/// Returns the amount of entries that were applied.
pub fn apply_channel_config<E: DmxOutputEngine>(
    transmitter: &mut Transmitter<E>,
    config: &[ChannelConfig],
) -> usize {
    let mut applied = 0;

    for entry in config {
        match transmitter.set_channel(entry.channel, entry.value) {
            Ok(()) => applied += 1,
            Err(_) => warn!(
                "skipping channel {} on pin {}",
                entry.channel,
                transmitter.get_pin()
            ),
        }
    }

    applied
}

/// Clear each universe and apply its configuration, `configs[n]` going to `transmitters[n]`.
/// At most [MAX_UNIVERSES] universes are configured, unconfigured channels stay at 0.
///
/// Returns the amount of universes that were configured.
pub fn apply_universe_configs<E: DmxOutputEngine>(
    transmitters: &mut [Transmitter<E>],
    configs: &[&[ChannelConfig]],
) -> usize {
    let mut configured = 0;

    for (transmitter, config) in transmitters.iter_mut().zip(configs).take(MAX_UNIVERSES) {
        transmitter.clear_universe();
        apply_channel_config(transmitter, config);
        configured += 1;
    }

    configured
}

use crate::consts::{DMX_MAX_PACKAGE_SIZE, DMX_NULL_START, DMX_UNIVERSE_SIZE};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UniverseError {
    /// The channel is not within 1 to 512.
    ChannelOutOfRange(u16),
    /// The range starting at `start` with `length` channels does not fit into the universe.
    RangeOutOfBounds { start: u16, length: usize },
}

impl core::fmt::Display for UniverseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UniverseError::ChannelOutOfRange(channel) => {
                write!(f, "channel {channel} is out of range")
            },
            UniverseError::RangeOutOfBounds { start, length } => write!(
                f,
                "{length} channels starting at channel {start} exceed the universe"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UniverseError {}

/// Result of scanning the channels of a universe.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSummary {
    /// Amount of channels with a value other than 0.
    pub active_channels: u16,
    /// The highest value in the universe.
    pub max_value: u8,
    /// The first channel (1-based) holding [ChannelSummary::max_value]. 0 if all channels are 0.
    pub max_value_channel: u16,
}

impl ChannelSummary {
    /// Scans a slice of channel values. The first element is channel 1.
    pub fn scan(channels: &[u8]) -> Self {
        let mut summary = Self::default();

        for (index, &value) in channels.iter().enumerate() {
            if value == 0 {
                continue;
            }

            summary.active_channels += 1;
            if value > summary.max_value {
                summary.max_value = value;
                summary.max_value_channel = index as u16 + 1;
            }
        }

        summary
    }
}

/// One DMX universe: a start code followed by 512 channels.
///
/// Channels are addressed 1-based. Index 0 of the underlying frame is the start code.
#[derive(Clone, Eq, PartialEq)]
pub struct UniverseBuffer {
    frame: [u8; DMX_MAX_PACKAGE_SIZE],
}

impl core::fmt::Debug for UniverseBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UniverseBuffer")
            .field("start_code", &self.frame[0])
            .field("summary", &self.summary())
            .finish()
    }
}

impl Default for UniverseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl UniverseBuffer {
    /// Creates a universe with the null start code and all channels at 0.
    pub fn new() -> Self {
        let mut frame = [0u8; DMX_MAX_PACKAGE_SIZE];
        frame[0] = DMX_NULL_START;

        Self { frame }
    }

    #[inline]
    fn check_channel(channel: u16) -> Result<usize, UniverseError> {
        if channel < 1 || channel as usize > DMX_UNIVERSE_SIZE {
            return Err(UniverseError::ChannelOutOfRange(channel));
        }

        Ok(channel as usize)
    }

    /// Get the value of a channel (1-512). Returns 0 for channels outside the universe.
    pub fn get(&self, channel: u16) -> u8 {
        match Self::check_channel(channel) {
            Ok(index) => self.frame[index],
            Err(_) => 0,
        }
    }

    /// Set the value of a channel (1-512).
    pub fn set(&mut self, channel: u16, value: u8) -> Result<(), UniverseError> {
        let index = Self::check_channel(channel)?;
        self.frame[index] = value;

        Ok(())
    }

    /// Set consecutive channels starting at `start`. Nothing is written if the range doesn't
    /// fit.
    pub fn set_range(&mut self, start: u16, data: &[u8]) -> Result<(), UniverseError> {
        let start_index = Self::check_channel(start)?;
        if start_index + data.len() - 1 > DMX_UNIVERSE_SIZE {
            return Err(UniverseError::RangeOutOfBounds {
                start,
                length: data.len(),
            });
        }

        self.frame[start_index..start_index + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy up to 512 values into channels 1 onwards and set the remaining channels to 0.
    pub fn fill_from(&mut self, data: &[u8]) {
        let copy_length = data.len().min(DMX_UNIVERSE_SIZE);

        self.frame[1..=copy_length].copy_from_slice(&data[..copy_length]);
        self.frame[copy_length + 1..].fill(0);
    }

    /// Set all channels to 0. The start code is left alone.
    pub fn clear(&mut self) {
        self.frame[1..].fill(0);
    }

    pub fn start_code(&self) -> u8 {
        self.frame[0]
    }

    pub fn set_start_code(&mut self, start_code: u8) {
        self.frame[0] = start_code;
    }

    /// The 512 channel values. Element 0 is channel 1.
    pub fn channels(&self) -> &[u8] {
        &self.frame[1..]
    }

    /// The whole frame including the start code.
    pub fn as_frame(&self) -> &[u8; DMX_MAX_PACKAGE_SIZE] {
        &self.frame
    }

    /// Scan the channels for active channels and the peak value.
    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary::scan(self.channels())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelSummary, UniverseBuffer, UniverseError};

    #[test]
    fn test_set_get_every_channel() {
        let mut buffer = UniverseBuffer::new();

        for channel in 1..=512u16 {
            let value = (channel % 256) as u8;
            buffer.set(channel, value).unwrap();
            assert_eq!(buffer.get(channel), value);
        }

        buffer.set(17, 255).unwrap();
        assert_eq!(buffer.get(17), 255);
        buffer.set(17, 0).unwrap();
        assert_eq!(buffer.get(17), 0);
    }

    #[test]
    fn test_invalid_channels() {
        let mut buffer = UniverseBuffer::new();
        buffer.set(1, 10).unwrap();
        buffer.set(512, 20).unwrap();
        let before = buffer.clone();

        assert_eq!(
            buffer.set(0, 99).unwrap_err(),
            UniverseError::ChannelOutOfRange(0)
        );
        assert_eq!(
            buffer.set(513, 99).unwrap_err(),
            UniverseError::ChannelOutOfRange(513)
        );
        buffer.set(u16::MAX, 99).unwrap_err();

        assert_eq!(buffer.get(0), 0);
        assert_eq!(buffer.get(513), 0);
        assert_eq!(buffer.get(u16::MAX), 0);
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_set_range() {
        let mut buffer = UniverseBuffer::new();

        buffer.set_range(510, &[1, 2, 3]).unwrap();
        assert_eq!(buffer.get(510), 1);
        assert_eq!(buffer.get(512), 3);

        buffer.set_range(1, &[7; 512]).unwrap();
        assert!(buffer.channels().iter().all(|&value| value == 7));
    }

    #[test]
    fn test_set_range_no_partial_write() {
        let mut buffer = UniverseBuffer::new();

        assert_eq!(
            buffer.set_range(511, &[1, 2, 3]).unwrap_err(),
            UniverseError::RangeOutOfBounds {
                start: 511,
                length: 3
            }
        );
        assert_eq!(buffer.get(511), 0);
        assert_eq!(buffer.get(512), 0);

        buffer.set_range(0, &[1]).unwrap_err();
        assert_eq!(buffer, UniverseBuffer::new());
    }

    #[test]
    fn test_fill_from_zero_fills_rest() {
        let mut buffer = UniverseBuffer::new();
        buffer.fill_from(&[9; 512]);
        buffer.fill_from(&[1, 2, 3]);

        assert_eq!(&buffer.channels()[..3], &[1, 2, 3]);
        assert!(buffer.channels()[3..].iter().all(|&value| value == 0));

        // longer inputs are truncated to the universe
        buffer.fill_from(&[5; 600]);
        assert!(buffer.channels().iter().all(|&value| value == 5));
        assert_eq!(buffer.start_code(), 0);
    }

    #[test]
    fn test_clear() {
        let mut buffer = UniverseBuffer::new();
        buffer.set_start_code(0x17);
        buffer.fill_from(&[200; 512]);
        buffer.clear();

        for channel in 1..=512 {
            assert_eq!(buffer.get(channel), 0);
        }
        assert_eq!(buffer.start_code(), 0x17);
    }

    #[test]
    fn test_summary() {
        assert_eq!(ChannelSummary::scan(&[0; 512]), ChannelSummary::default());

        let mut buffer = UniverseBuffer::new();
        buffer.set(3, 64).unwrap();
        buffer.set(10, 200).unwrap();
        buffer.set(20, 200).unwrap();

        assert_eq!(
            buffer.summary(),
            ChannelSummary {
                active_channels: 3,
                max_value: 200,
                max_value_channel: 10,
            }
        );
    }
}

//! Channel addressing
//!
//! A channel maps one fixture's local 1-based fixture-indices onto a
//! contiguous range of absolute slots in the transmitter's buffer.
//! Range arithmetic is validated at construction; distinct fixtures must
//! be given non-overlapping channels, which [`validate_no_overlap`]
//! checks once at topology-build time.

use crate::artnet::ArtNetTransmitter;
use crate::error::{LumenError, Result};
use crate::role::describe_fixture_index;

/// A contiguous slot range addressing one physical fixture
#[derive(Clone)]
pub struct Channel {
    tx: ArtNetTransmitter,
    start_slot: usize,
    width: usize,
}

impl Channel {
    /// Create a channel starting at `start_slot` (1-indexed), spanning
    /// `width` slots.
    ///
    /// Fails with an address error when the range falls outside the
    /// transmitter's universe; a misconfigured topology is fatal at
    /// startup, not something recovered per-update.
    pub fn new(tx: ArtNetTransmitter, start_slot: usize, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(LumenError::Configuration(
                "channel width must be non-zero".into(),
            ));
        }
        let end = start_slot + width - 1;
        if start_slot == 0 || end > tx.packet_size() {
            return Err(LumenError::Address {
                slot: end,
                packet_size: tx.packet_size(),
            });
        }
        Ok(Self {
            tx,
            start_slot,
            width,
        })
    }

    /// Number of fixture slots in this channel
    pub fn width(&self) -> usize {
        self.width
    }

    /// First absolute slot of this channel (1-indexed)
    pub fn start_slot(&self) -> usize {
        self.start_slot
    }

    /// Inclusive absolute slot range covered by this channel
    pub fn range(&self) -> (usize, usize) {
        (self.start_slot, self.start_slot + self.width - 1)
    }

    /// Absolute slot behind a local 1-based fixture-index
    pub fn absolute_slot(&self, fixture_index: usize) -> usize {
        self.start_slot - 1 + fixture_index
    }

    /// Set one fixture slot.
    ///
    /// `value` must fit in [0,255]; rejected values leave the buffer
    /// unchanged. With `show` set, one frame is sent immediately for
    /// low-latency interactive feedback instead of waiting for the next
    /// broadcast tick.
    pub fn set_value(&self, fixture_index: usize, value: u16, show: bool) -> Result<()> {
        if fixture_index == 0 || fixture_index > self.width {
            return Err(LumenError::Address {
                slot: self.absolute_slot(fixture_index),
                packet_size: self.tx.packet_size(),
            });
        }
        let value = u8::try_from(value).map_err(|_| LumenError::Range {
            role: describe_fixture_index(fixture_index),
            value,
        })?;
        self.tx.set_slot(self.absolute_slot(fixture_index), value)?;
        if show {
            self.tx.send()?;
        }
        Ok(())
    }

    /// Set every fixture slot of the channel.
    ///
    /// The length check happens before any slot is written, so a bad
    /// vector never partially applies. No frame is sent; the caller
    /// decides on a final flush (or leaves it to the periodic loop).
    pub fn set_values(&self, values: &[u8]) -> Result<()> {
        if values.len() != self.width {
            return Err(LumenError::WidthMismatch {
                expected: self.width,
                actual: values.len(),
            });
        }
        for (i, &value) in values.iter().enumerate() {
            self.set_value(i + 1, u16::from(value), false)?;
        }
        Ok(())
    }

    /// Drive every slot of the channel to zero
    pub fn reset(&self) -> Result<()> {
        self.set_values(&vec![0u8; self.width])
    }

    /// Transmitter this channel writes into
    pub fn transmitter(&self) -> &ArtNetTransmitter {
        &self.tx
    }
}

/// Check that no two channels address overlapping slot ranges.
///
/// Overlap means two fixtures would alias onto the same slots; this is a
/// topology misconfiguration, flagged before use.
pub fn validate_no_overlap(channels: &[Channel]) -> Result<()> {
    for (i, a) in channels.iter().enumerate() {
        for b in &channels[i + 1..] {
            let (a_start, a_end) = a.range();
            let (b_start, b_end) = b.range();
            if a_start <= b_end && b_start <= a_end {
                return Err(LumenError::Address {
                    slot: a_start.max(b_start),
                    packet_size: a.tx.packet_size(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artnet::DEFAULT_PACKET_SIZE;

    fn transmitter() -> ArtNetTransmitter {
        ArtNetTransmitter::new("255.255.255.255:6454", 0, DEFAULT_PACKET_SIZE, true, true)
            .unwrap()
    }

    #[test]
    fn test_absolute_slot_mapping() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 12, 11).unwrap();

        channel.set_value(1, 200, false).unwrap();
        channel.set_value(11, 50, false).unwrap();

        let buffer = tx.snapshot();
        assert_eq!(buffer[11], 200); // slot 12
        assert_eq!(buffer[21], 50); // slot 22
    }

    #[test]
    fn test_value_out_of_range_names_the_role() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, 11).unwrap();

        let err = channel.set_value(4, 300, false).unwrap_err();
        match err {
            LumenError::Range { role, value } => {
                assert_eq!(role, "red");
                assert_eq!(value, 300);
            }
            other => panic!("expected range error, got {other}"),
        }

        // Rejected before any write
        assert!(tx.snapshot().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_channel_must_fit_the_universe() {
        let tx = transmitter();
        assert!(Channel::new(tx.clone(), 0, 11).is_err());
        assert!(Channel::new(tx.clone(), 510, 11).is_err());
        assert!(Channel::new(tx.clone(), 502, 11).is_ok());
    }

    #[test]
    fn test_set_values_length_checked_before_writes() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, 11).unwrap();

        let err = channel.set_values(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, LumenError::WidthMismatch { expected: 11, actual: 3 }));
        assert!(tx.snapshot().iter().all(|&v| v == 0));

        channel.set_values(&[9; 11]).unwrap();
        assert!(tx.snapshot()[..11].iter().all(|&v| v == 9));
    }

    #[test]
    fn test_reset_zeroes_the_range() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, 11).unwrap();
        channel.set_values(&[9; 11]).unwrap();
        channel.reset().unwrap();
        assert!(tx.snapshot()[..11].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_overlap_validator() {
        let tx = transmitter();
        let a = Channel::new(tx.clone(), 1, 11).unwrap();
        let b = Channel::new(tx.clone(), 12, 11).unwrap();
        assert!(validate_no_overlap(&[a.clone(), b.clone()]).is_ok());

        // start_slot 10 overlaps slots 10 and 11 of the first channel
        let c = Channel::new(tx.clone(), 10, 11).unwrap();
        assert!(matches!(
            validate_no_overlap(&[a, b, c]),
            Err(LumenError::Address { .. })
        ));
    }
}

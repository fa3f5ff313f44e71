//! Art-Net transmitter (Art-Net 4)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.
//! The transmitter owns the slot buffer for one universe and broadcasts the
//! full buffer at a fixed rate. The transport is connectionless and lossy;
//! unconditional periodic retransmission of the whole frame is what keeps
//! receivers consistent, so there is no per-update acknowledgment or retry.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use crate::error::{LumenError, Result};

/// Default Art-Net UDP port
pub const ARTNET_PORT: u16 = 6454;

/// Default number of slots per universe frame
pub const DEFAULT_PACKET_SIZE: usize = 512;

/// Default broadcast rate in frames per second
pub const DEFAULT_FPS: u32 = 40;

/// Art-Net OpDmx header length in bytes
const HEADER_LEN: usize = 18;

struct Inner {
    socket: UdpSocket,
    target: SocketAddr,
    universe: u16,
    packet_size: usize,
    sequence: AtomicU8,
    buffer: Mutex<Vec<u8>>,
}

/// Art-Net sender owning the outbound slot buffer for one universe.
///
/// Cheaply cloneable; clones share the socket and the buffer. The command
/// lane writes slots, the broadcaster lane reads the whole buffer and
/// sends it, each under the buffer lock.
#[derive(Clone)]
pub struct ArtNetTransmitter {
    inner: Arc<Inner>,
}

impl ArtNetTransmitter {
    /// Create a new transmitter.
    ///
    /// # Arguments
    /// * `target` - Destination address (typically "255.255.255.255:6454")
    /// * `universe` - Art-Net universe (0-32767)
    /// * `packet_size` - Slots per frame, 2-512
    /// * `even_packet` - Reject odd packet sizes (some receivers drop
    ///   odd-length frames)
    /// * `broadcast` - Enable broadcast on the socket
    pub fn new(
        target: &str,
        universe: u16,
        packet_size: usize,
        even_packet: bool,
        broadcast: bool,
    ) -> Result<Self> {
        if packet_size == 0 || packet_size > DEFAULT_PACKET_SIZE {
            return Err(LumenError::Configuration(format!(
                "packet size {packet_size} must be in [1,{DEFAULT_PACKET_SIZE}]"
            )));
        }
        if even_packet && packet_size % 2 != 0 {
            return Err(LumenError::Configuration(format!(
                "packet size {packet_size} must be even"
            )));
        }

        let target: SocketAddr = target.parse().map_err(|e| {
            LumenError::Configuration(format!("invalid Art-Net target address: {e}"))
        })?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(broadcast)?;

        tracing::info!("Art-Net transmitter created for universe {} -> {}", universe, target);

        Ok(Self {
            inner: Arc::new(Inner {
                socket,
                target,
                universe,
                packet_size,
                sequence: AtomicU8::new(0),
                buffer: Mutex::new(vec![0u8; packet_size]),
            }),
        })
    }

    /// Write one slot into the outbound buffer. Slots are 1-indexed;
    /// no transmission happens here.
    pub fn set_slot(&self, slot: usize, value: u8) -> Result<()> {
        if slot == 0 || slot > self.inner.packet_size {
            return Err(LumenError::Address {
                slot,
                packet_size: self.inner.packet_size,
            });
        }
        self.inner.buffer.lock()[slot - 1] = value;
        Ok(())
    }

    /// Serialize the current buffer and broadcast it once.
    ///
    /// A send failure is reported to the caller and leaves the buffer
    /// untouched; the periodic loop covers the loss on its next tick.
    pub fn send(&self) -> Result<()> {
        let packet = {
            let buffer = self.inner.buffer.lock();
            self.build_artnet_packet(&buffer)
        };
        self.inner.socket.send_to(&packet, self.inner.target)?;
        self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("sent Art-Net DMX frame for universe {}", self.inner.universe);
        Ok(())
    }

    /// Build an Art-Net DMX packet (OpDmx)
    fn build_artnet_packet(&self, slots: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; HEADER_LEN + slots.len()];

        // Header: "Art-Net\0"
        packet[0..8].copy_from_slice(b"Art-Net\0");

        // OpCode: OpDmx (0x5000)
        packet[8..10].copy_from_slice(&0x5000u16.to_le_bytes());

        // Protocol version (14)
        packet[10..12].copy_from_slice(&14u16.to_be_bytes());

        // Sequence
        packet[12] = self.inner.sequence.load(Ordering::Relaxed);

        // Physical (0)
        packet[13] = 0;

        // Universe (Port-Address)
        packet[14..16].copy_from_slice(&self.inner.universe.to_le_bytes());

        // Length (big-endian)
        packet[16..18].copy_from_slice(&(slots.len() as u16).to_be_bytes());

        // DMX data
        packet[HEADER_LEN..].copy_from_slice(slots);

        packet
    }

    /// Start the fixed-rate broadcast loop on its own thread.
    ///
    /// The loop sends the full current buffer every `1/fps` seconds whether
    /// or not it changed, until the returned handle is stopped. Send
    /// failures are logged and the loop continues; retransmission is
    /// unconditional and stateless per send.
    pub fn run(&self, fps: u32) -> Result<BroadcastHandle> {
        if fps == 0 {
            return Err(LumenError::Configuration("fps must be non-zero".into()));
        }
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps));
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let tx = self.clone();

        let join = std::thread::Builder::new()
            .name("artnet-broadcast".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        if let Err(e) = tx.send() {
                            tracing::warn!("Art-Net broadcast failed, retrying next tick: {e}");
                        }
                    }
                }
            })
            .map_err(LumenError::Transmission)?;

        tracing::info!("Art-Net broadcast loop running at {fps} fps");
        Ok(BroadcastHandle {
            stop_tx,
            join: Some(join),
        })
    }

    /// Copy of the current slot buffer
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.buffer.lock().clone()
    }

    /// Number of slots in the universe frame
    pub fn packet_size(&self) -> usize {
        self.inner.packet_size
    }

    /// Art-Net universe this transmitter addresses
    pub fn universe(&self) -> u16 {
        self.inner.universe
    }
}

/// Handle to a running broadcast loop
pub struct BroadcastHandle {
    stop_tx: Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl BroadcastHandle {
    /// Signal the loop to stop and wait for the thread to exit.
    ///
    /// The signal is honored before the next scheduled tick.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        tracing::info!("Art-Net broadcast loop stopped");
    }
}

impl Drop for BroadcastHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transmitter() -> ArtNetTransmitter {
        ArtNetTransmitter::new("255.255.255.255:6454", 0, DEFAULT_PACKET_SIZE, true, true)
            .unwrap()
    }

    #[test]
    fn test_artnet_packet_structure() {
        let tx = transmitter();
        let slots = vec![0u8; DEFAULT_PACKET_SIZE];
        let packet = tx.build_artnet_packet(&slots);

        // Check header
        assert_eq!(&packet[0..8], b"Art-Net\0");

        // Check OpCode (little-endian)
        assert_eq!(packet[8], 0x00);
        assert_eq!(packet[9], 0x50);

        // Check protocol version (big-endian)
        assert_eq!(packet[10], 0);
        assert_eq!(packet[11], 14);

        // Check length (big-endian)
        assert_eq!(packet[16], 0x02);
        assert_eq!(packet[17], 0x00);

        // Total packet size
        assert_eq!(packet.len(), HEADER_LEN + DEFAULT_PACKET_SIZE);
    }

    #[test]
    fn test_invalid_target() {
        let tx = ArtNetTransmitter::new("invalid:address", 0, 512, true, true);
        assert!(tx.is_err());
    }

    #[test]
    fn test_odd_packet_size_rejected() {
        let tx = ArtNetTransmitter::new("255.255.255.255:6454", 0, 511, true, true);
        assert!(matches!(tx, Err(LumenError::Configuration(_))));

        // Legal when the even-packet policy is disabled
        let tx = ArtNetTransmitter::new("255.255.255.255:6454", 0, 511, false, true);
        assert!(tx.is_ok());
    }

    #[test]
    fn test_oversized_packet_rejected() {
        let tx = ArtNetTransmitter::new("255.255.255.255:6454", 0, 514, true, true);
        assert!(matches!(tx, Err(LumenError::Configuration(_))));
    }

    #[test]
    fn test_set_slot_is_one_indexed() {
        let tx = transmitter();
        tx.set_slot(1, 17).unwrap();
        tx.set_slot(512, 34).unwrap();

        let buffer = tx.snapshot();
        assert_eq!(buffer[0], 17);
        assert_eq!(buffer[511], 34);
    }

    #[test]
    fn test_set_slot_out_of_universe() {
        let tx = transmitter();
        assert!(matches!(tx.set_slot(0, 1), Err(LumenError::Address { .. })));
        assert!(matches!(tx.set_slot(513, 1), Err(LumenError::Address { .. })));

        // Failed writes leave the buffer unchanged
        assert!(tx.snapshot().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_clones_share_the_buffer() {
        let tx = transmitter();
        let clone = tx.clone();
        clone.set_slot(5, 99).unwrap();
        assert_eq!(tx.snapshot()[4], 99);
    }

    #[test]
    fn test_run_rejects_zero_fps() {
        let tx = transmitter();
        assert!(matches!(tx.run(0), Err(LumenError::Configuration(_))));
    }

    #[test]
    fn test_broadcast_loop_stops() {
        let tx = transmitter();
        let handle = tx.run(100).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        handle.stop();
    }
}

//! Rust library for buffering DMX512 (ANSI E1.11) universes and for coordinating up to eight
//! parallel receivers on top of interchangeable signal engines. This library features no-std as
//! well as no-alloc support (no heap allocation) to target embedded as well as os platforms.
//!
//! The generation and decoding of the DMX512 waveform itself is left to a signal engine that
//! implements the traits in [signal_engine], for example a pio state machine or a uart driver.
//!
//! <div class="warning">This library is wip, it has not yet received extensive testing and the api
//! might not be final.</div>
//!
//! # Usage
//!
//! ## Transmitter
//!
//! ```rust
//! use dmx_universe::channel_config::{apply_channel_config, ChannelConfig};
//! use dmx_universe::dmx_transmitter::{Transmitter, TransmitterConfig};
//! use dmx_universe::signal_engine::{DmxOutputEngine, SignalEngine, SignalEngineError};
//! use dmx_universe::types::{EnginePool, Pin};
//!
//! // An engine that sends frames into the void.
//! struct NullEngine;
//!
//! impl SignalEngine for NullEngine {
//!     type DriverError = core::convert::Infallible;
//! }
//!
//! impl DmxOutputEngine for NullEngine {
//!     fn bind(&mut self, _: Pin, _: EnginePool) -> Result<(), SignalEngineError<Self::DriverError>> {
//!         Ok(())
//!     }
//!
//!     fn release(&mut self) {}
//!
//!     fn write(&mut self, frame: &[u8]) {
//!         println!("sending {} bytes", frame.len());
//!     }
//!
//!     fn busy(&self) -> bool {
//!         false
//!     }
//! }
//!
//! const RGB_STRIP: [ChannelConfig; 3] = [
//!     ChannelConfig::new(1, 255), // red
//!     ChannelConfig::new(2, 0),   // green
//!     ChannelConfig::new(3, 128), // blue
//! ];
//!
//! let mut transmitter = Transmitter::new(NullEngine, TransmitterConfig::default());
//! transmitter.begin().unwrap();
//!
//! transmitter.clear_universe();
//! apply_channel_config(&mut transmitter, &RGB_STRIP);
//!
//! loop {
//!     transmitter.transmit(0).unwrap();
//!     transmitter.wait_for_completion();
//!     # break;
//! }
//! ```
//!
//! ## Multiple universes
//!
//! The platform registers the trampoline of every universe with the frame completion interrupt
//! of the engine serving that universe, and polls the coordinator from its main loop.
//!
//! ```rust,ignore
//! use dmx_universe::dmx_multi_receiver::MultiUniverseReceiver;
//!
//! fn on_frame(receiver: &MultiUniverseReceiver<PioProvider>, universe: usize) {
//!     // runs in the interrupt, keep it short
//! }
//!
//! let mut receiver = MultiUniverseReceiver::new(PioProvider::new());
//! receiver.begin(1, 8, Some(on_frame)).unwrap();
//!
//! for universe in 0..8 {
//!     let trampoline = MultiUniverseReceiver::<PioProvider>::trampoline(universe).unwrap();
//!     register_frame_complete_handler(universe, trampoline);
//! }
//!
//! loop {
//!     if receiver.are_all_signals_present(1000) {
//!         let stats = receiver.get_universe_stats(0);
//!         println!("{} frames, peak {} on channel {}", stats.frames_received, stats.max_value, stats.max_value_channel);
//!     }
//! }
//! ```
//!

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod fmt;

/// Module for applying channel presets to transmitters.
pub mod channel_config;
pub mod consts;
/// Module for receiving up to eight universes in parallel.
pub mod dmx_multi_receiver;
/// Module for receiving a single universe.
pub mod dmx_receiver;
/// Module for sending universes.
pub mod dmx_transmitter;
/// Traits that have to be implemented by the hardware that generates and decodes the DMX512
/// signal.
pub mod signal_engine;
#[cfg(test)]
mod test_utils;
pub mod types;
pub mod universe_buffer;

//! WaveRecorder - streaming PCM recorder emitting standalone WAV/FLAC slices
//!
//! This crate provides a MediaRecorder-style state machine over a live audio
//! source. Captured chunks are encoded on a dedicated worker thread and
//! delivered to listeners as complete containers, either periodically or on
//! request, with the final slice always preceding the `stop` event.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: State machine, events, PCM conversion, WAV layout, value objects and errors
//! - **Application**: The recorder use case, encoder worker, event bus and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal capture, WAV/FLAC encoders, config, slice files)
//! - **CLI**: Command-line interface, argument parsing, stdin controls and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Receiver-side command-to-actuation pipeline (hardware-agnostic).
//!
//! All hardware interactions go through the `aromix_traits::Actuators`
//! and `aromix_traits::Transport` traits.
//!
//! ## Architecture
//!
//! - **Messages**: frame codec, additive checksum, validation (`message`)
//! - **Recipes**: predefined + persisted custom catalog (`recipe`)
//! - **Actuators**: single-owner driver with idempotent setters (`actuator`)
//! - **Sequencing**: validate → resolve → scale → drive → time (`sequencer`)
//! - **Monitoring**: status snapshot and bounded error log (`monitor`)
//! - **Hand-off**: depth-1 command inlet and link pump (`inlet`)
//! - **Loop**: the receiver control loop (`runner`)
//!
//! The pipeline is deliberately single-threaded: actuator state is only
//! ever mutated on the control-loop thread, and the receive path hands
//! commands over by moving them through a bounded channel.

pub mod actuator;
pub mod conversions;
pub mod error;
pub mod frames;
pub mod inlet;
pub mod message;
pub mod mocks;
pub mod monitor;
pub mod recipe;
pub mod runner;
pub mod sequencer;
pub mod status;

pub use actuator::{ActuatorDriver, ActuatorSnapshot, FAN_COUNT, PUMP_COUNT, VALVE_COUNT};
pub use error::{RecipeError, ReceiverError, SequenceError, ValidationError};
pub use message::{
    additive_checksum, validate, Command, Limits, MessageKind, OdorDetection, OdorId, ValidCommand,
    FRAME_LEN,
};
pub use monitor::{SystemMonitor, SystemStatus, ERROR_LOG_CAPACITY};
pub use recipe::{FileRecipeStore, Recipe, RecipeCatalog, RecipeStore, MAX_CUSTOM_RECIPES};
pub use runner::{Link, Receiver, RunParams};
pub use sequencer::{Sequencer, SequencerState};
pub use status::{StatusCode, SystemState};

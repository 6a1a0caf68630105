#![forbid(unsafe_code)]

//! Declarative Bézier-ribbon animation engine.
//!
//! A scene description is compiled once into layered ribbon geometry
//! ([`compile`]), then a wall-clock timeline ([`timeline`]) and a
//! pseudo-random state sequencer ([`sequencer`]) decide, frame by frame,
//! which parametric portion of each ribbon is drawn. The [`engine`] facade
//! ties it together and hands the host a flat draw-command list per frame.

pub mod builtin;
pub mod compile;
pub mod core;
pub mod ease;
pub mod emit;
pub mod engine;
pub mod error;
pub mod model;
pub mod sequencer;
pub mod timeline;
pub mod wake;

pub use compile::compile_scene;
pub use core::{Canvas, Rgb, SweepRange, TimeMs, TimeWindow};
pub use ease::Ease;
pub use emit::{DrawCommand, STRIP_SAMPLES};
pub use engine::{Engine, Frame, IDLE_DELAY_MS, Redraw};
pub use error::{WeftError, WeftResult};
pub use model::{Layer, Placement, Ribbon, Scene};
pub use sequencer::{AnimState, Sequencer};
pub use timeline::Timeline;
pub use wake::{WakeHandle, schedule_wake};

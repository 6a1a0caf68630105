//! Engine facade: the single synchronous frame-evaluation path tying the
//! compiler, timeline, sequencer, and emitter together.
//!
//! All scene mutation happens inside [`Engine::on_frame`]; the host owns the
//! surface lifecycle and a persistent accumulation target, calls
//! `initialize` on surface geometry changes, and services the returned
//! [`Redraw`] request (immediately, or via a cancellable wake, see
//! [`crate::wake`]).

use crate::{
    compile::compile_scene,
    core::{Affine, Canvas, TimeMs},
    emit::DrawCommand,
    error::{WeftError, WeftResult},
    model::Scene,
    sequencer::{AnimState, Sequencer},
};

/// Idle gap between animation bursts.
pub const IDLE_DELAY_MS: u64 = 5_000;

/// What the host should do after presenting a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Redraw {
    /// More work pending: request another frame immediately.
    Now,
    /// Burst finished: schedule a cancellable wake at the given time.
    At(TimeMs),
    /// Paused; nothing to schedule.
    Idle,
}

/// One frame's output.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Frame {
    /// The animation state that produced this frame.
    pub state: AnimState,
    pub commands: Vec<DrawCommand>,
    pub request: Redraw,
}

pub struct Engine {
    scene: Scene,
    sequencer: Sequencer,
    canvas: Option<Canvas>,
    paused: bool,
}

impl Engine {
    pub fn new(scene: Scene) -> WeftResult<Self> {
        scene.validate()?;
        Ok(Self {
            scene,
            sequencer: Sequencer::new(),
            canvas: None,
            paused: false,
        })
    }

    /// Engine with a deterministic sequencer, for replay and tests.
    pub fn with_seed(scene: Scene, seed: u64) -> WeftResult<Self> {
        let mut engine = Self::new(scene)?;
        engine.sequencer = Sequencer::with_seed(seed);
        Ok(engine)
    }

    /// Compiles a scene description and wraps it in an engine.
    pub fn from_description(text: &str) -> WeftResult<Self> {
        Self::new(compile_scene(text)?)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Stores the surface geometry and restarts the animation cycle; called
    /// by the host on surface creation and on every geometry change.
    pub fn initialize(&mut self, width: u32, height: u32) -> WeftResult<()> {
        self.canvas = Some(Canvas::new(width, height)?);
        self.reset();
        Ok(())
    }

    /// Restarts the animation cycle from a fresh RenderBase. Idempotent.
    pub fn reset(&mut self) {
        self.sequencer.reset();
    }

    /// Suspends evaluation; any wake the host armed for a previous
    /// [`Redraw::At`] must be cancelled alongside this call.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Reinstates evaluation. Returns true when the host should request a
    /// frame right away.
    pub fn resume(&mut self) -> bool {
        let was_paused = self.paused;
        self.paused = false;
        was_paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Evaluates one frame at the given wall-clock sample. Time is sampled
    /// once here and shared by every curve in the frame.
    #[tracing::instrument(skip(self), fields(now_ms = now.0))]
    pub fn on_frame(&mut self, now: TimeMs) -> WeftResult<Frame> {
        let Some(canvas) = self.canvas else {
            return Err(WeftError::evaluation(
                "on_frame called before initialize",
            ));
        };
        if self.paused {
            return Ok(Frame {
                state: self.sequencer.head(),
                commands: Vec::new(),
                request: Redraw::Idle,
            });
        }

        let aspect = canvas.aspect();
        let view = Affine::scale_non_uniform(aspect.x, aspect.y);
        let state = self.sequencer.eval_frame(&self.scene, now, view);
        tracing::trace!(
            state = ?state.state,
            commands = state.commands.len(),
            complete = state.complete,
            "frame evaluated"
        );

        let request = if state.complete {
            Redraw::At(now.offset(IDLE_DELAY_MS))
        } else {
            Redraw::Now
        };
        Ok(Frame {
            state: state.state,
            commands: state.commands,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_curve_scene() -> Scene {
        compile_scene(
            "layer id=L translate=0,0 scale=1\n\
             line pts=\"0,0 1,0 2,0 3,0\" scale=1,0,0,1 time=100,200 color=white",
        )
        .unwrap()
    }

    #[test]
    fn on_frame_requires_initialize() {
        let mut engine = Engine::with_seed(one_curve_scene(), 1).unwrap();
        assert!(engine.on_frame(TimeMs(0)).is_err());
        engine.initialize(100, 100).unwrap();
        assert!(engine.on_frame(TimeMs(0)).is_ok());
    }

    #[test]
    fn reveal_scenario_invisible_partial_full() {
        let mut engine = Engine::with_seed(one_curve_scene(), 1).unwrap();
        engine.initialize(100, 100).unwrap();

        // First frame: epoch pinned, curve not yet started; only the
        // background wipe is drawn.
        let f0 = engine.on_frame(TimeMs(0)).unwrap();
        assert_eq!(f0.commands.len(), 1);
        assert_eq!(f0.request, Redraw::Now);

        let f1 = engine.on_frame(TimeMs(150)).unwrap();
        assert_eq!(f1.commands.len(), 1);
        assert_eq!(f1.commands[0].sweep.t0, 0.0);
        assert_eq!(f1.commands[0].sweep.t1, 0.25);
        assert_eq!(f1.request, Redraw::Now);

        // Third call finishes the curve: the sweep closes at 1 and the
        // burst ends with a delayed wake.
        let f2 = engine.on_frame(TimeMs(400)).unwrap();
        assert_eq!(f2.commands[0].sweep.t1, 1.0);
        assert_eq!(f2.request, Redraw::At(TimeMs(400 + IDLE_DELAY_MS)));
    }

    #[test]
    fn reset_twice_equals_reset_once() {
        let mut a = Engine::with_seed(one_curve_scene(), 7).unwrap();
        let mut b = Engine::with_seed(one_curve_scene(), 7).unwrap();
        a.initialize(64, 64).unwrap();
        b.initialize(64, 64).unwrap();

        a.reset();
        b.reset();
        b.reset();

        let fa = a.on_frame(TimeMs(5)).unwrap();
        let fb = b.on_frame(TimeMs(5)).unwrap();
        assert_eq!(fa.commands, fb.commands);
        assert_eq!(fa.request, fb.request);
    }

    #[test]
    fn pause_goes_idle_and_resume_requests_a_frame() {
        let mut engine = Engine::with_seed(one_curve_scene(), 1).unwrap();
        engine.initialize(100, 100).unwrap();
        engine.on_frame(TimeMs(0)).unwrap();

        engine.pause();
        let f = engine.on_frame(TimeMs(50)).unwrap();
        assert!(f.commands.is_empty());
        assert_eq!(f.request, Redraw::Idle);

        assert!(engine.resume());
        assert!(!engine.resume());
        assert_eq!(engine.on_frame(TimeMs(60)).unwrap().request, Redraw::Now);
    }

    #[test]
    fn aspect_correction_scales_the_longer_axis() {
        let mut engine = Engine::with_seed(one_curve_scene(), 1).unwrap();
        engine.initialize(200, 100).unwrap();
        engine.on_frame(TimeMs(0)).unwrap();
        let f = engine.on_frame(TimeMs(300)).unwrap();
        // Curve x span 0..3 halves under the 2:1 aspect.
        let cmd = f.commands[0];
        assert!((cmd.points[3].x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn full_cycle_advances_through_the_queue() {
        let mut engine = Engine::with_seed(one_curve_scene(), 3).unwrap();
        engine.initialize(64, 64).unwrap();

        // Drive RenderBase to completion.
        engine.on_frame(TimeMs(0)).unwrap();
        let f = engine.on_frame(TimeMs(10_000)).unwrap();
        assert_eq!(f.request, Redraw::At(TimeMs(15_000)));

        // The scene lacks blink/move target layers, so the remaining picks
        // would trip the contract guard; a reset returns to RenderBase.
        engine.reset();
        let f = engine.on_frame(TimeMs(20_000)).unwrap();
        assert_eq!(f.request, Redraw::Now);
        assert_eq!(f.commands.len(), 1);
    }
}

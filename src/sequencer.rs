//! Animation sequencer: a finite-state machine over a queue of discrete
//! animation states, each with its own local clock.
//!
//! The queue is regenerated once exhausted and always reads
//! `[RenderBase, <20 weighted picks>, Clear]`, so every cycle starts from a
//! known fully-drawn scene and ends by wiping it for the next one. The
//! random source is injectable (seeded) for deterministic replay.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    core::{Affine, Point, Rgb, SweepRange, TimeMs, TimeWindow, Vec2},
    ease::Ease,
    emit::{DrawCommand, emit},
    model::{Layer, Ribbon, Scene},
    timeline::Timeline,
};

/// Full blink close-then-open duration; the half-cycle is 500 ms.
pub const BLINK_MS: u64 = 1_000;
const BLINK_HALF_MS: u64 = BLINK_MS / 2;

/// Move states run a fixed sinusoidal envelope and snap back to rest.
pub const MOVE_MS: u64 = 2_880;
/// Peak displacement of a move, in scene units.
const MOVE_AMPLITUDE: f64 = 3.0;

/// Clear duration is re-rolled inside this range per activation.
pub const CLEAR_MS_MIN: u64 = 4_000;
pub const CLEAR_MS_MAX: u64 = 5_000;
const CLEAR_QUAD_COUNT: usize = 8;
/// Half-extent of a fully grown clear quad; covers the frame from any
/// origin inside [-1, 1]^2.
const CLEAR_QUAD_REACH: f64 = 2.5;

/// Random picks between the bracketing RenderBase and Clear states.
pub const QUEUE_RANDOM_PICKS: usize = 20;

/// The scene background; also the fill color of clear quads.
pub const BACKGROUND: Rgb = Rgb::new(0.2, 0.5, 0.8);

/// Background fill + foreground outline layers sharing one silhouette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPair {
    pub bg: &'static str,
    pub fg: &'static str,
}

const EYE_LEFT: LayerPair = LayerPair {
    bg: "eye_left_bg",
    fg: "eye_left",
};
const EYE_RIGHT: LayerPair = LayerPair {
    bg: "eye_right_bg",
    fg: "eye_right",
};
const BOW: LayerPair = LayerPair {
    bg: "bow_bg",
    fg: "bow",
};
const PAW_LEFT: LayerPair = LayerPair {
    bg: "paw_left_bg",
    fg: "paw_left",
};
const PAW_RIGHT: LayerPair = LayerPair {
    bg: "paw_right_bg",
    fg: "paw_right",
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnimState {
    RenderBase,
    BlinkLeft,
    BlinkRight,
    BlinkBoth,
    MoveBow,
    MovePawLeft,
    MovePawRight,
    Clear,
}

impl AnimState {
    pub fn is_blink(self) -> bool {
        matches!(self, Self::BlinkLeft | Self::BlinkRight | Self::BlinkBoth)
    }

    pub fn is_move(self) -> bool {
        matches!(self, Self::MoveBow | Self::MovePawLeft | Self::MovePawRight)
    }

    fn blink_targets(self) -> &'static [LayerPair] {
        match self {
            Self::BlinkLeft => &[EYE_LEFT],
            Self::BlinkRight => &[EYE_RIGHT],
            Self::BlinkBoth => &[EYE_LEFT, EYE_RIGHT],
            _ => &[],
        }
    }

    fn move_target(self) -> Option<LayerPair> {
        match self {
            Self::MoveBow => Some(BOW),
            Self::MovePawLeft => Some(PAW_LEFT),
            Self::MovePawRight => Some(PAW_RIGHT),
            _ => None,
        }
    }

    /// Every layer id this state resolves at runtime; used to validate a
    /// scene up front.
    pub fn target_layer_ids(self) -> Vec<&'static str> {
        let mut ids = Vec::new();
        for p in self.blink_targets() {
            ids.push(p.bg);
            ids.push(p.fg);
        }
        if let Some(p) = self.move_target() {
            ids.push(p.bg);
            ids.push(p.fg);
        }
        ids
    }
}

/// Builds one cycle's worth of states. Picks are weighted 50% blink
/// (40/40/20 left/right/both) and 50% move (uniform across the three
/// move targets).
pub fn generate_queue(rng: &mut impl Rng) -> VecDeque<AnimState> {
    let mut queue = VecDeque::with_capacity(QUEUE_RANDOM_PICKS + 2);
    queue.push_back(AnimState::RenderBase);
    for _ in 0..QUEUE_RANDOM_PICKS {
        let state = if rng.gen_bool(0.5) {
            match rng.gen_range(0.0..1.0) {
                r if r < 0.4 => AnimState::BlinkLeft,
                r if r < 0.8 => AnimState::BlinkRight,
                _ => AnimState::BlinkBoth,
            }
        } else {
            match rng.gen_range(0..3) {
                0 => AnimState::MoveBow,
                1 => AnimState::MovePawLeft,
                _ => AnimState::MovePawRight,
            }
        };
        queue.push_back(state);
    }
    queue.push_back(AnimState::Clear);
    queue
}

/// One evaluated frame of the active state.
#[derive(Clone, Debug)]
pub struct StateFrame {
    pub state: AnimState,
    pub commands: Vec<DrawCommand>,
    /// The state's local duration has elapsed; the queue head was popped.
    pub complete: bool,
}

/// Parameters drawn once when a state activates.
struct Active {
    state: AnimState,
    duration_ms: u64,
    /// Unit displacement direction (move states).
    direction: Vec2,
    /// Regenerated clear-layer content (clear state).
    clear_quads: Vec<ClearQuad>,
    first_frame: bool,
}

struct ClearQuad {
    ribbon: Ribbon,
    origin: Point,
}

pub struct Sequencer {
    queue: VecDeque<AnimState>,
    rng: StdRng,
    clock: Timeline,
    active: Option<Active>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic sequencer for replay and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            queue: VecDeque::new(),
            rng,
            clock: Timeline::new(),
            active: None,
        }
    }

    /// Drops the active state and pending queue; the next frame starts a
    /// fresh cycle from RenderBase. Idempotent.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.clock.reset();
        self.active = None;
    }

    /// The state that will be (or is being) evaluated next.
    pub fn head(&mut self) -> AnimState {
        if let Some(active) = &self.active {
            return active.state;
        }
        if self.queue.is_empty() {
            self.queue = generate_queue(&mut self.rng);
        }
        *self.queue.front().unwrap_or(&AnimState::RenderBase)
    }

    /// Evaluates exactly the head of the queue for this frame. `view` is the
    /// engine's aspect correction, applied outside each layer's placement.
    pub fn eval_frame(&mut self, scene: &Scene, now: TimeMs, view: Affine) -> StateFrame {
        let mut active = match self.active.take() {
            Some(active) => active,
            None => {
                let state = self.head();
                self.queue.pop_front();
                self.activate(state, scene)
            }
        };
        self.clock.begin_frame(now);
        let first_frame = std::mem::take(&mut active.first_frame);

        let mut commands = Vec::new();
        let complete = match active.state {
            AnimState::RenderBase => {
                if first_frame {
                    commands.extend(emit(&wipe_ribbon(), Affine::IDENTITY, SweepRange::FULL));
                }
                eval_reveal(scene, &self.clock, view, &mut commands)
            }
            AnimState::BlinkLeft | AnimState::BlinkRight | AnimState::BlinkBoth => eval_blink(
                active.state.blink_targets(),
                scene,
                &self.clock,
                view,
                &mut commands,
            ),
            AnimState::MoveBow => self.eval_move_frame(BOW, &active, scene, view, &mut commands),
            AnimState::MovePawLeft => {
                self.eval_move_frame(PAW_LEFT, &active, scene, view, &mut commands)
            }
            AnimState::MovePawRight => {
                self.eval_move_frame(PAW_RIGHT, &active, scene, view, &mut commands)
            }
            AnimState::Clear => eval_clear(
                &active.clear_quads,
                &self.clock,
                active.duration_ms,
                &mut commands,
            ),
        };

        let state = active.state;
        if complete {
            tracing::debug!(?state, "animation state complete");
            self.clock.reset();
        } else {
            self.active = Some(active);
        }
        StateFrame {
            state,
            commands,
            complete,
        }
    }

    fn eval_move_frame(
        &self,
        pair: LayerPair,
        active: &Active,
        scene: &Scene,
        view: Affine,
        commands: &mut Vec<DrawCommand>,
    ) -> bool {
        eval_move(
            pair,
            active.direction,
            scene,
            &self.clock,
            view,
            active.duration_ms,
            commands,
        )
    }

    fn activate(&mut self, state: AnimState, scene: &Scene) -> Active {
        let duration_ms = match state {
            AnimState::RenderBase => scene.reveal_end(),
            s if s.is_blink() => BLINK_MS,
            s if s.is_move() => MOVE_MS,
            _ => self.rng.gen_range(CLEAR_MS_MIN..=CLEAR_MS_MAX),
        };
        let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let direction = Vec2::new(angle.cos(), angle.sin());
        let clear_quads = if state == AnimState::Clear {
            (0..CLEAR_QUAD_COUNT)
                .map(|_| self.random_clear_quad())
                .collect()
        } else {
            Vec::new()
        };
        tracing::debug!(?state, duration_ms, "animation state activated");
        self.clock.reset();
        Active {
            state,
            duration_ms,
            direction,
            clear_quads,
            first_frame: true,
        }
    }

    /// A background-color quad anchored at a random origin, grown from that
    /// origin by the per-frame scale factor.
    fn random_clear_quad(&mut self) -> ClearQuad {
        let origin = Point::new(
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        );
        ClearQuad {
            ribbon: straight_ribbon(
                origin + Vec2::new(-CLEAR_QUAD_REACH, -CLEAR_QUAD_REACH),
                origin + Vec2::new(CLEAR_QUAD_REACH, -CLEAR_QUAD_REACH),
                origin + Vec2::new(-CLEAR_QUAD_REACH, CLEAR_QUAD_REACH),
                origin + Vec2::new(CLEAR_QUAD_REACH, CLEAR_QUAD_REACH),
            ),
            origin,
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract-violation guard: a missing sequencer target aborts in debug
/// builds and is skipped in release.
fn target_layer<'a>(scene: &'a Scene, id: &str) -> Option<&'a Layer> {
    let layer = scene.layer(id);
    debug_assert!(layer.is_some(), "sequencer target layer '{id}' not in scene");
    if layer.is_none() {
        tracing::warn!(id, "sequencer target layer missing; skipping");
    }
    layer
}

/// Full-frame background quad, drawn when a state starts from a blank
/// target.
fn wipe_ribbon() -> Ribbon {
    straight_ribbon(
        Point::new(-1.0, -1.0),
        Point::new(1.0, -1.0),
        Point::new(-1.0, 1.0),
        Point::new(1.0, 1.0),
    )
}

/// Degenerate ribbon whose edges are straight lines, spanning a quad.
fn straight_ribbon(e0a: Point, e0b: Point, e1a: Point, e1b: Point) -> Ribbon {
    let along = |a: Point, b: Point| {
        let d = b - a;
        [a, a + d / 3.0, a + d * (2.0 / 3.0), b]
    };
    Ribbon::new(
        along(e0a, e0b),
        along(e1a, e1b),
        BACKGROUND,
        TimeWindow::new(0, 0),
    )
}

/// Base reveal: the timeline decides every ribbon's sweep. Returns true
/// once no window end lies in the future.
fn eval_reveal(
    scene: &Scene,
    clock: &Timeline,
    view: Affine,
    commands: &mut Vec<DrawCommand>,
) -> bool {
    let mut pending = false;
    for layer in &scene.layers {
        let transform = view * layer.placement.to_affine();
        for ribbon in &layer.ribbons {
            if let Some(sweep) = clock.sweep(ribbon.window) {
                commands.extend(emit(ribbon, transform, sweep));
            }
            pending |= clock.pending(ribbon.window);
        }
    }
    !pending
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Sweep ranges of one blink frame, from the progress values at the
/// previous and current sample (one unit per half-cycle, so 0..2 over the
/// whole blink). The background sweeps forward; the foreground sweeps the
/// mirrored range. Both converge to "fully closed" at progress 1.
pub fn blink_ranges(p_last: f64, p_cur: f64) -> (SweepRange, SweepRange) {
    let bg = SweepRange {
        t0: clamp01(p_last),
        t1: clamp01(p_cur),
    };
    let fg = SweepRange {
        t0: clamp01(2.0 - p_cur),
        t1: clamp01(2.0 - p_last),
    };
    (bg, fg)
}

fn eval_blink(
    pairs: &[LayerPair],
    scene: &Scene,
    clock: &Timeline,
    view: Affine,
    commands: &mut Vec<DrawCommand>,
) -> bool {
    let half = BLINK_HALF_MS as f64;
    let p_last = clock.elapsed_prev() as f64 / half;
    let p_cur = (clock.elapsed() as f64 / half).min(2.0);
    let (bg_sweep, fg_sweep) = blink_ranges(p_last, p_cur);

    for pair in pairs {
        if let Some(bg) = target_layer(scene, pair.bg) {
            let transform = view * bg.placement.to_affine();
            for ribbon in &bg.ribbons {
                commands.extend(emit(ribbon, transform, bg_sweep));
            }
        }
        if let Some(fg) = target_layer(scene, pair.fg) {
            let transform = view * fg.placement.to_affine();
            for ribbon in &fg.ribbons {
                commands.extend(emit(ribbon, transform, fg_sweep));
            }
        }
    }
    clock.elapsed() >= BLINK_MS
}

/// Move: full-scene redraw every frame; the targeted pair's translation is
/// perturbed by the smoothed-sinusoid envelope along the activation's fixed
/// direction, returning exactly to rest at both ends.
fn eval_move(
    pair: LayerPair,
    direction: Vec2,
    scene: &Scene,
    clock: &Timeline,
    view: Affine,
    duration_ms: u64,
    commands: &mut Vec<DrawCommand>,
) -> bool {
    let t = clock.elapsed() as f64 / duration_ms as f64;
    let offset = direction * (MOVE_AMPLITUDE * Ease::SinePulse.apply(t));

    // Resolve the pair before drawing; a missing target trips the guard
    // here.
    let bg = target_layer(scene, pair.bg).map(|l| l.id.as_str());
    let fg = target_layer(scene, pair.fg).map(|l| l.id.as_str());

    commands.extend(emit(&wipe_ribbon(), Affine::IDENTITY, SweepRange::FULL));
    for layer in &scene.layers {
        let mut placement = layer.placement;
        let id = Some(layer.id.as_str());
        if id == bg || id == fg {
            placement.translate += offset;
        }
        let transform = view * placement.to_affine();
        for ribbon in &layer.ribbons {
            commands.extend(emit(ribbon, transform, SweepRange::FULL));
        }
    }

    clock.elapsed() >= duration_ms
}

/// Clear: each quad grows about its own origin under the smoothstep ease
/// until the frame is covered.
fn eval_clear(
    quads: &[ClearQuad],
    clock: &Timeline,
    duration_ms: u64,
    commands: &mut Vec<DrawCommand>,
) -> bool {
    let t = clamp01(clock.elapsed() as f64 / duration_ms as f64);
    let scale = Ease::SmoothStep.apply(t);
    for quad in quads {
        let o = quad.origin.to_vec2();
        let transform = Affine::translate(o) * Affine::scale(scale) * Affine::translate(-o);
        commands.extend(emit(&quad.ribbon, transform, SweepRange::FULL));
    }
    clock.elapsed() >= duration_ms
}

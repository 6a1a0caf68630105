use crate::{
    core::{Affine, Point, Rgb, TimeWindow, Vec2},
    error::{WeftError, WeftResult},
};

/// A filled region between two cubic Bézier edges approximating a stroked
/// curve. Both edges are fixed 4-point control polygons; `edge0` is the
/// inner edge, `edge1` the outer. Immutable value data once compiled.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ribbon {
    pub edge0: [Point; 4],
    pub edge1: [Point; 4],
    pub color: Rgb,
    pub window: TimeWindow,
}

impl Ribbon {
    pub fn new(edge0: [Point; 4], edge1: [Point; 4], color: Rgb, window: TimeWindow) -> Self {
        Self {
            edge0,
            edge1,
            color,
            window,
        }
    }
}

/// Layer-level transform: translation plus uniform scale, composed once at
/// compile time from the layer declaration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub translate: Vec2,
    pub scale: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Placement {
    pub fn new(translate: Vec2, scale: f64) -> Self {
        Self { translate, scale }
    }

    /// Matches the source ordering: translate in scene units, then scale.
    pub fn to_affine(self) -> Affine {
        Affine::scale(self.scale) * Affine::translate(self.translate)
    }
}

/// Named, transform-scoped group of ribbons drawn together. Ribbon order is
/// paint order: later ribbons draw over earlier ones.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    pub id: String,
    pub placement: Placement,
    pub ribbons: Vec<Ribbon>,
}

impl Layer {
    pub fn new(id: impl Into<String>, placement: Placement) -> Self {
        Self {
            id: id.into(),
            placement,
            ribbons: Vec::new(),
        }
    }

    pub fn push(&mut self, ribbon: Ribbon) {
        self.ribbons.push(ribbon);
    }

    /// Scene-relative time at which the last ribbon window elapses.
    pub fn reveal_end(&self) -> u64 {
        self.ribbons
            .iter()
            .map(|r| r.window.end())
            .max()
            .unwrap_or(0)
    }
}

/// The ordered collection of all layers. Built once by the compiler and
/// read-only thereafter; animation-time displacement is applied by the
/// sequencer at evaluation, never written back.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub layers: Vec<Layer>,
}

impl Scene {
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn require_layer(&self, id: &str) -> WeftResult<&Layer> {
        self.layer(id)
            .ok_or_else(|| WeftError::scene(format!("no layer with id '{id}'")))
    }

    pub fn reveal_end(&self) -> u64 {
        self.layers.iter().map(Layer::reveal_end).max().unwrap_or(0)
    }

    pub fn validate(&self) -> WeftResult<()> {
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.id.trim().is_empty() {
                return Err(WeftError::scene(format!("layer #{i} has an empty id")));
            }
            if self.layers[..i].iter().any(|l| l.id == layer.id) {
                return Err(WeftError::scene(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            if layer.placement.scale <= 0.0 {
                return Err(WeftError::scene(format!(
                    "layer '{}' scale must be > 0",
                    layer.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ribbon(start: u64, duration: u64) -> Ribbon {
        let p = Point::ZERO;
        Ribbon::new(
            [p; 4],
            [p; 4],
            Rgb::new(1.0, 1.0, 1.0),
            TimeWindow::new(start, duration),
        )
    }

    #[test]
    fn reveal_end_is_latest_window_end() {
        let mut layer = Layer::new("a", Placement::default());
        layer.push(ribbon(0, 100));
        layer.push(ribbon(500, 200));
        layer.push(ribbon(300, 100));
        assert_eq!(layer.reveal_end(), 700);

        let scene = Scene {
            layers: vec![layer, Layer::new("b", Placement::default())],
        };
        assert_eq!(scene.reveal_end(), 700);
    }

    #[test]
    fn lookup_is_by_id() {
        let scene = Scene {
            layers: vec![
                Layer::new("head", Placement::default()),
                Layer::new("bow", Placement::default()),
            ],
        };
        assert_eq!(scene.layer_index("bow"), Some(1));
        assert!(scene.layer("tail").is_none());
        assert!(scene.require_layer("tail").is_err());
    }

    #[test]
    fn validate_rejects_duplicates_and_bad_scale() {
        let scene = Scene {
            layers: vec![
                Layer::new("a", Placement::default()),
                Layer::new("a", Placement::default()),
            ],
        };
        assert!(scene.validate().is_err());

        let scene = Scene {
            layers: vec![Layer::new("a", Placement::new(Vec2::ZERO, 0.0))],
        };
        assert!(scene.validate().is_err());
    }

    #[test]
    fn placement_translates_before_scaling() {
        let p = Placement::new(Vec2::new(0.0, -25.0), 0.03);
        let out = p.to_affine() * Point::new(10.0, 25.0);
        assert!((out.x - 0.3).abs() < 1e-12);
        assert!(out.y.abs() < 1e-12);
    }
}

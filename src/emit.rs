//! Geometry emitter: flattens a ribbon plus a resolved affine into the draw
//! command consumed by the external rasterizer.
//!
//! The rasterizer owns tessellation: it expands the two 4-point cubics into
//! a fixed-resolution parametric strip (`STRIP_SAMPLES` per edge) and clips
//! visible fragments to the command's sweep range.

use crate::{
    core::{Affine, Point, Rgb, SweepRange},
    model::Ribbon,
};

/// Vertex samples per ribbon edge in the external strip contract.
pub const STRIP_SAMPLES: usize = 20;

/// One ribbon draw: 8 transformed control points (`edge0` then `edge1`),
/// the visible parametric range, and the fill color.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct DrawCommand {
    pub points: [Point; 8],
    pub sweep: SweepRange,
    pub color: Rgb,
}

/// Maps the ribbon's control points through `transform`. Returns `None` for
/// degenerate sweep ranges, which would rasterize to nothing.
pub fn emit(ribbon: &Ribbon, transform: Affine, sweep: SweepRange) -> Option<DrawCommand> {
    if sweep.is_empty() {
        return None;
    }
    let mut points = [Point::ZERO; 8];
    for i in 0..4 {
        points[i] = transform * ribbon.edge0[i];
        points[i + 4] = transform * ribbon.edge1[i];
    }
    Some(DrawCommand {
        points,
        sweep,
        color: ribbon.color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TimeWindow, Vec2};

    fn ribbon() -> Ribbon {
        let edge0 = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        let edge1 = [
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 1.0),
            Point::new(3.0, 1.0),
        ];
        Ribbon::new(edge0, edge1, Rgb::new(0.2, 0.5, 0.8), TimeWindow::new(0, 1))
    }

    #[test]
    fn points_are_transformed_edge0_then_edge1() {
        let tf = Affine::scale(2.0) * Affine::translate(Vec2::new(1.0, 0.0));
        let cmd = emit(&ribbon(), tf, SweepRange::FULL).unwrap();
        assert_eq!(cmd.points[0], Point::new(2.0, 0.0));
        assert_eq!(cmd.points[3], Point::new(8.0, 0.0));
        assert_eq!(cmd.points[4], Point::new(2.0, 2.0));
        assert_eq!(cmd.points[7], Point::new(8.0, 2.0));
    }

    #[test]
    fn empty_sweep_emits_nothing() {
        let r = ribbon();
        assert!(emit(&r, Affine::IDENTITY, SweepRange { t0: 0.5, t1: 0.5 }).is_none());
        assert!(emit(&r, Affine::IDENTITY, SweepRange::FULL).is_some());
    }

    #[test]
    fn color_is_carried_through() {
        let cmd = emit(&ribbon(), Affine::IDENTITY, SweepRange::FULL).unwrap();
        assert_eq!(cmd.color, Rgb::new(0.2, 0.5, 0.8));
    }
}

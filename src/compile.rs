//! Scene compiler: turns the line-oriented curve-description format into a
//! [`Scene`] of layered ribbons.
//!
//! ```text
//! layer id=head translate=0,-25 scale=0.03
//! fill pts1="0,44 -4,44 -8,43 -12,42" pts2="0,44 4,44 8,43 12,42" time=700,200 color=white
//! line pts="-12,42 -20,40 -22,37 -24,34" scale=1,0.15,0.15,1 time=900,200 color=#606060
//! ```
//!
//! `fill` records carry both ribbon edges verbatim. `line` records carry a
//! single centerline which is offset along the curve normal into a ribbon of
//! the declared stroke widths. Consecutive `line` records whose centerlines
//! share an endpoint are chained: the joint edge points are snapped
//! bit-identically so the rendered ribbon is C0-continuous across segments.

use crate::{
    core::{Point, Rgb, TimeWindow, Vec2},
    error::{WeftError, WeftResult},
    model::{Layer, Placement, Ribbon, Scene},
};

/// Compiles a scene description. Any malformed record is fatal: the whole
/// compile fails and no partially built scene is returned.
pub fn compile_scene(text: &str) -> WeftResult<Scene> {
    let mut compiler = Compiler::default();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        compiler
            .record(line)
            .map_err(|e| WeftError::compile(format!("line {line_no}: {e}")))?;
    }
    let scene = compiler.finish();
    scene.validate()?;
    tracing::debug!(
        layers = scene.layers.len(),
        reveal_end_ms = scene.reveal_end(),
        "scene compiled"
    );
    Ok(scene)
}

#[derive(Default)]
struct Compiler {
    layers: Vec<Layer>,
    current: Option<LayerBuild>,
}

struct LayerBuild {
    layer: Layer,
    chain: Option<ChainTail>,
}

/// End of the previous `line` ribbon in the current layer, kept so a
/// follow-up segment can snap its joint exactly.
struct ChainTail {
    center_end: Point,
    edge0_end: Point,
    edge1_end: Point,
}

impl Compiler {
    fn record(&mut self, line: &str) -> WeftResult<()> {
        let (kind, fields) = split_record(line)?;
        match kind.as_str() {
            "layer" => self.begin_layer(&fields),
            "fill" => self.fill(&fields),
            "line" => self.line(&fields),
            other => Err(WeftError::compile(format!("unknown record kind '{other}'"))),
        }
    }

    fn begin_layer(&mut self, fields: &Fields) -> WeftResult<()> {
        self.flush_current();
        let id = fields.get("id")?;
        let translate = fields.floats("translate", 2)?;
        let scale = fields.float("scale")?;
        let placement = Placement::new(Vec2::new(translate[0], translate[1]), scale);
        self.current = Some(LayerBuild {
            layer: Layer::new(id, placement),
            chain: None,
        });
        Ok(())
    }

    fn fill(&mut self, fields: &Fields) -> WeftResult<()> {
        let edge0 = points4(&fields.floats("pts1", 8)?);
        let edge1 = points4(&fields.floats("pts2", 8)?);
        let (window, color) = timing_and_color(fields)?;
        let build = self.current_mut()?;
        build.layer.push(Ribbon::new(edge0, edge1, color, window));
        // A fill between line segments breaks any stroke chain.
        build.chain = None;
        Ok(())
    }

    fn line(&mut self, fields: &Fields) -> WeftResult<()> {
        let center = points4(&fields.floats("pts", 8)?);
        let stroke = fields.floats("scale", 4)?;
        let (window, color) = timing_and_color(fields)?;

        let normal0 = unit_normal(&center, 0.0)?;
        let normal1 = unit_normal(&center, 1.0)?;

        // Offset both ends of the centerline by half the stroke width; the
        // first two control points follow the start normal, the last two the
        // end normal.
        let mut edge0 = center;
        let mut edge1 = center;
        for i in 0..2 {
            let d = normal0 * (stroke[0] / 2.0);
            edge1[i] = center[i] + d;
            edge0[i] = center[i] - d;
        }
        for i in 2..4 {
            let d = normal1 * (stroke[3] / 2.0);
            edge1[i] = center[i] + d;
            edge0[i] = center[i] - d;
        }

        // Tangential bulge at the interior control points of the outer edge
        // approximates constant width along a curved centerline.
        edge1[1] += (edge1[1] - edge1[0]) * stroke[1];
        edge1[2] += (edge1[2] - edge1[3]) * stroke[2];

        let build = self.current_mut()?;
        if let Some(tail) = &build.chain {
            if tail.center_end == center[0] {
                edge0[0] = tail.edge0_end;
                edge1[0] = tail.edge1_end;
            }
        }
        build.chain = Some(ChainTail {
            center_end: center[3],
            edge0_end: edge0[3],
            edge1_end: edge1[3],
        });
        build.layer.push(Ribbon::new(edge0, edge1, color, window));
        Ok(())
    }

    fn current_mut(&mut self) -> WeftResult<&mut LayerBuild> {
        self.current
            .as_mut()
            .ok_or_else(|| WeftError::compile("primitive record before any 'layer' record"))
    }

    fn flush_current(&mut self) {
        if let Some(build) = self.current.take() {
            self.layers.push(build.layer);
        }
    }

    fn finish(mut self) -> Scene {
        self.flush_current();
        Scene {
            layers: self.layers,
        }
    }
}

fn timing_and_color(fields: &Fields) -> WeftResult<(TimeWindow, Rgb)> {
    let time = fields.floats("time", 2)?;
    let ms = |v: f64, what: &str| -> WeftResult<u64> {
        if v < 0.0 || v.fract() != 0.0 {
            return Err(WeftError::compile(format!(
                "time {what} must be a whole non-negative millisecond count, got {v}"
            )));
        }
        Ok(v as u64)
    };
    let window = TimeWindow::new(ms(time[0], "start")?, ms(time[1], "duration")?);
    let color = Rgb::parse(&fields.get("color")?)?;
    Ok((window, color))
}

fn points4(vals: &[f64]) -> [Point; 4] {
    let mut pts = [Point::ZERO; 4];
    for (i, p) in pts.iter_mut().enumerate() {
        *p = Point::new(vals[2 * i], vals[2 * i + 1]);
    }
    pts
}

/// Unit normal of the cubic at parameter `t`: two de Casteljau reduction
/// steps leave the two points spanning the tangent, which is rotated 90°.
fn unit_normal(pts: &[Point; 4], t: f64) -> WeftResult<Vec2> {
    let lerp = |a: Point, b: Point| a + (b - a) * t;
    let q0 = lerp(pts[0], pts[1]);
    let q1 = lerp(pts[1], pts[2]);
    let q2 = lerp(pts[2], pts[3]);
    let r0 = lerp(q0, q1);
    let r1 = lerp(q1, q2);
    let normal = Vec2::new(r0.y - r1.y, r1.x - r0.x);
    let len = normal.hypot();
    if len == 0.0 {
        return Err(WeftError::compile(format!(
            "line has a degenerate tangent at t={t}"
        )));
    }
    Ok(normal / len)
}

struct Fields(Vec<(String, String)>);

impl Fields {
    fn get(&self, key: &str) -> WeftResult<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| WeftError::compile(format!("missing required attribute '{key}'")))
    }

    fn float(&self, key: &str) -> WeftResult<f64> {
        let vals = self.floats(key, 1)?;
        Ok(vals[0])
    }

    /// Parses a comma/whitespace-delimited numeric list of exact length.
    fn floats(&self, key: &str, expect: usize) -> WeftResult<Vec<f64>> {
        let raw = self.get(key)?;
        let mut vals = Vec::with_capacity(expect);
        for tok in raw.split(|c: char| c == ',' || c.is_whitespace()) {
            if tok.is_empty() {
                continue;
            }
            let v: f64 = tok
                .parse()
                .map_err(|_| WeftError::compile(format!("attribute '{key}': bad number '{tok}'")))?;
            vals.push(v);
        }
        if vals.len() != expect {
            return Err(WeftError::compile(format!(
                "attribute '{key}' expects {expect} numbers, got {}",
                vals.len()
            )));
        }
        Ok(vals)
    }
}

/// Splits `kind key=value key="value with spaces" ...`.
fn split_record(line: &str) -> WeftResult<(String, Fields)> {
    let mut tokens = Vec::<String>::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if in_quotes {
        return Err(WeftError::compile("unterminated quote"));
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }

    let mut iter = tokens.into_iter();
    let kind = iter
        .next()
        .ok_or_else(|| WeftError::compile("empty record"))?;
    let mut fields = Vec::new();
    for tok in iter {
        let Some((k, v)) = tok.split_once('=') else {
            return Err(WeftError::compile(format!(
                "expected key=value attribute, got '{tok}'"
            )));
        };
        fields.push((k.to_string(), v.to_string()));
    }
    Ok((kind, Fields(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "layer id=l translate=0,0 scale=1\n";

    #[test]
    fn fill_points_are_copied_verbatim() {
        let src = format!(
            "{HEADER}fill pts1=\"0,0 1,0 2,0 3,0\" pts2=\"0,1 1,1 2,1 3,1\" time=0,100 color=white"
        );
        let scene = compile_scene(&src).unwrap();
        let r = &scene.layers[0].ribbons[0];
        assert_eq!(r.edge0[3], Point::new(3.0, 0.0));
        assert_eq!(r.edge1[0], Point::new(0.0, 1.0));
        assert_eq!(r.window, TimeWindow::new(0, 100));
    }

    #[test]
    fn straight_line_offsets_along_the_normal() {
        // Horizontal centerline, width 2: edges land exactly 1 unit above
        // and below.
        let src = format!(
            "{HEADER}line pts=\"0,0 1,0 2,0 3,0\" scale=2,0,0,2 time=0,100 color=white"
        );
        let scene = compile_scene(&src).unwrap();
        let r = &scene.layers[0].ribbons[0];
        for i in 0..4 {
            assert!((r.edge0[i].y - -1.0).abs() < 1e-12, "edge0[{i}] = {:?}", r.edge0[i]);
            assert!((r.edge1[i].y - 1.0).abs() < 1e-12, "edge1[{i}] = {:?}", r.edge1[i]);
            assert_eq!(r.edge0[i].x, i as f64);
        }
    }

    #[test]
    fn bulge_pushes_outer_interior_points() {
        let src = format!(
            "{HEADER}line pts=\"0,0 1,0 2,0 3,0\" scale=2,0.5,0.5,2 time=0,100 color=white"
        );
        let scene = compile_scene(&src).unwrap();
        let r = &scene.layers[0].ribbons[0];
        // edge1[1] moved away from edge1[0] by half their separation.
        assert!((r.edge1[1].x - 1.5).abs() < 1e-12);
        assert!((r.edge1[2].x - 1.5).abs() < 1e-12);
        // Inner edge untouched by the bulge.
        assert_eq!(r.edge0[1].x, 1.0);
    }

    #[test]
    fn chained_segments_share_joint_edges_bit_identically() {
        let src = format!(
            "{HEADER}\
             line pts=\"0,0 1,1 2,1 3,0\" scale=1,0.2,0.2,1 time=0,100 color=white\n\
             line pts=\"3,0 4,-1 5,-1 6,0\" scale=1,0.2,0.2,1 time=100,100 color=white"
        );
        let scene = compile_scene(&src).unwrap();
        let [a, b] = &scene.layers[0].ribbons[..] else {
            panic!("expected two ribbons");
        };
        assert_eq!(a.edge0[3], b.edge0[0]);
        assert_eq!(a.edge1[3], b.edge1[0]);
    }

    #[test]
    fn non_adjacent_segments_do_not_chain() {
        let src = format!(
            "{HEADER}\
             line pts=\"0,0 1,1 2,1 3,0\" scale=1,0,0,1 time=0,100 color=white\n\
             line pts=\"9,9 10,10 11,10 12,9\" scale=1,0,0,1 time=100,100 color=white"
        );
        let scene = compile_scene(&src).unwrap();
        let [a, b] = &scene.layers[0].ribbons[..] else {
            panic!("expected two ribbons");
        };
        assert_ne!(a.edge0[3], b.edge0[0]);
    }

    #[test]
    fn malformed_records_fail_fast() {
        // Primitive before any layer.
        assert!(compile_scene("fill pts1=\"0,0 0,0 0,0 0,0\" pts2=\"0,0 0,0 0,0 0,0\" time=0,0 color=white").is_err());
        // Wrong element count.
        let short = format!("{HEADER}line pts=\"0,0 1,0 2,0\" scale=1,0,0,1 time=0,1 color=white");
        assert!(compile_scene(&short).is_err());
        // Unparsable number.
        let junk = format!("{HEADER}layer id=x translate=a,b scale=1");
        assert!(compile_scene(&junk).is_err());
        // Unknown record kind.
        let unknown = format!("{HEADER}arc pts=\"0,0 1,0 2,0 3,0\"");
        assert!(compile_scene(&unknown).is_err());
        // Missing attribute.
        let missing = format!("{HEADER}line pts=\"0,0 1,0 2,0 3,0\" time=0,1 color=white");
        assert!(compile_scene(&missing).is_err());
    }

    #[test]
    fn fractional_or_negative_time_is_rejected() {
        for time in ["0.9,0", "0,100.5", "-100,200"] {
            let src = format!(
                "{HEADER}fill pts1=\"0,0 1,0 2,0 3,0\" pts2=\"0,1 1,1 2,1 3,1\" time={time} color=white"
            );
            assert!(compile_scene(&src).is_err(), "time={time} should not compile");
        }
    }

    #[test]
    fn degenerate_tangent_is_a_compile_error() {
        let src = format!(
            "{HEADER}line pts=\"1,1 1,1 1,1 1,1\" scale=1,0,0,1 time=0,1 color=white"
        );
        assert!(compile_scene(&src).is_err());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let src = "# header comment\n\nlayer id=l translate=1,2 scale=3\n";
        let scene = compile_scene(src).unwrap();
        assert_eq!(scene.layers.len(), 1);
        assert_eq!(scene.layers[0].placement.scale, 3.0);
    }
}

use crate::sim::{Particle, Vec3};
use crossterm::{
    cursor, queue,
    style::{Color, Print, SetForegroundColor},
};
use std::io::{self, Write};

// Braille cell is 2x4 subpixels
pub(crate) const SUB_W: usize = 2;
pub(crate) const SUB_H: usize = 4;

// Projection scale: attractor units -> subpixels
pub(crate) const SCALE: f64 = 5.0;

// Per-frame partial clear; the terminal analogue of a 0.1-alpha black fill.
pub(crate) const TRAIL_FADE: f32 = 0.9;

const STROKE_DEPOSIT: f32 = 1.0;
const INTENSITY_CAP: f32 = 1.6;
const DOT_THRESHOLD: f32 = 0.10;
const MAX_STROKE_STEPS: i32 = 256;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScreenPoint {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

/// One 3-D position mapped into the three orthographic planes, each offset
/// to its own screen region: XY lower-left, XZ bottom-centre, YZ lower-right.
/// The vertical axis is negated to convert math-up to screen-down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlanePoints {
    pub(crate) xz: ScreenPoint,
    pub(crate) xy: ScreenPoint,
    pub(crate) yz: ScreenPoint,
}

pub(crate) fn project(p: Vec3, w: f64, h: f64, scale: f64) -> PlanePoints {
    PlanePoints {
        xz: ScreenPoint {
            x: p.x * scale + w / 2.0,
            y: -p.z * scale + h - h / 3.0,
        },
        xy: ScreenPoint {
            x: p.x * scale + w / 4.0,
            y: -p.y * scale + h / 2.0,
        },
        yz: ScreenPoint {
            x: p.y * scale + w - w / 4.0,
            y: -p.z * scale + h - h / 3.0,
        },
    }
}

/// Subpixel drawing surface with per-frame decay. Intensity fades toward
/// zero; hue is overwritten wherever a stroke lands (last stroke wins).
pub(crate) struct TrailCanvas {
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) intensity: Vec<f32>,
    pub(crate) hue: Vec<f32>,
}

impl TrailCanvas {
    pub(crate) fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            intensity: vec![0.0; w * h],
            hue: vec![0.0; w * h],
        }
    }

    pub(crate) fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.intensity.clear();
        self.intensity.resize(w * h, 0.0);
        self.hue.clear();
        self.hue.resize(w * h, 0.0);
    }

    pub(crate) fn fade(&mut self) {
        for v in self.intensity.iter_mut() {
            *v *= TRAIL_FADE;
        }
    }

    /// Stroke a hairline segment by sampling points along it. Non-finite
    /// endpoints and out-of-bounds samples deposit nothing.
    pub(crate) fn stroke_segment(&mut self, a: ScreenPoint, b: ScreenPoint, hue: f32) {
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return;
        }
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let steps = (dist.ceil() as i32).clamp(1, MAX_STROKE_STEPS);

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = (a.x + dx * t).round();
            let y = (a.y + dy * t).round();
            if x < 0.0 || y < 0.0 || x >= self.w as f64 || y >= self.h as f64 {
                continue;
            }
            let at = y as usize * self.w + x as usize;
            self.intensity[at] = (self.intensity[at] + STROKE_DEPOSIT).min(INTENSITY_CAP);
            self.hue[at] = hue;
        }
    }
}

/// Project current and previous position and stroke one segment per plane.
/// A particle that has not yet integrated has no previous position and
/// draws nothing.
pub(crate) fn draw_particle(canvas: &mut TrailCanvas, p: &Particle, scale: f64) {
    let Some(prev) = p.previous_position else {
        return;
    };
    let (w, h) = (canvas.w as f64, canvas.h as f64);
    let cur = project(p.position, w, h, scale);
    let old = project(prev, w, h, scale);
    canvas.stroke_segment(old.xz, cur.xz, p.hue);
    canvas.stroke_segment(old.xy, cur.xy, p.hue);
    canvas.stroke_segment(old.yz, cur.yz, p.hue);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

pub(crate) fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    // h: 0..1
    let h = (h.fract() + 1.0).fract() * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb {
        r: (r.clamp(0.0, 1.0) * 255.0) as u8,
        g: (g.clamp(0.0, 1.0) * 255.0) as u8,
        b: (b.clamp(0.0, 1.0) * 255.0) as u8,
    }
}

fn dot_bit(dx: usize, dy: usize) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

fn braille_char(mask: u8) -> char {
    // Unicode braille block starts at 0x2800
    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
}

/// Cell-level presenter with diff-based drawing: only cells whose braille
/// mask or color changed since the last frame are re-queued.
pub(crate) struct CellGrid {
    w_cells: usize,
    h_cells: usize,
    prev_mask: Vec<u8>,
    prev_color: Vec<Rgb>,
}

impl CellGrid {
    pub(crate) fn new(w_cells: usize, h_cells: usize) -> Self {
        Self {
            w_cells,
            h_cells,
            prev_mask: vec![0; w_cells * h_cells],
            prev_color: vec![Rgb { r: 0, g: 0, b: 0 }; w_cells * h_cells],
        }
    }

    pub(crate) fn resize(&mut self, w_cells: usize, h_cells: usize) {
        self.w_cells = w_cells;
        self.h_cells = h_cells;
        let cells = w_cells * h_cells;
        self.prev_mask.clear();
        self.prev_mask.resize(cells, 0);
        self.prev_color.clear();
        self.prev_color.resize(cells, Rgb { r: 0, g: 0, b: 0 });
    }

    pub(crate) fn draw<W: Write>(&mut self, out: &mut W, canvas: &TrailCanvas) -> io::Result<()> {
        for cy in 0..self.h_cells {
            for cx in 0..self.w_cells {
                let cell_i = cy * self.w_cells + cx;
                let sx0 = cx * SUB_W;
                let sy0 = cy * SUB_H;

                let mut mask: u8 = 0;
                let mut peak = 0.0f32;
                let mut peak_hue = 0.0f32;

                for dy in 0..SUB_H {
                    for dx in 0..SUB_W {
                        let sx = sx0 + dx;
                        let sy = sy0 + dy;
                        if sx >= canvas.w || sy >= canvas.h {
                            continue;
                        }
                        let v = canvas.intensity[sy * canvas.w + sx];
                        if v > peak {
                            peak = v;
                            peak_hue = canvas.hue[sy * canvas.w + sx];
                        }
                        if v > DOT_THRESHOLD {
                            mask |= dot_bit(dx, dy);
                        }
                    }
                }

                let (ch, rgb) = if mask == 0 {
                    (' ', Rgb { r: 0, g: 0, b: 0 })
                } else {
                    // hsl(hue,100%,50%) is hsv(hue,1,1); value dims as the
                    // trail fades
                    (
                        braille_char(mask),
                        hsv_to_rgb(peak_hue / 360.0, 1.0, peak.clamp(0.0, 1.0)),
                    )
                };

                if self.prev_mask[cell_i] == mask && self.prev_color[cell_i] == rgb {
                    continue;
                }
                self.prev_mask[cell_i] = mask;
                self.prev_color[cell_i] = rgb;

                queue!(
                    out,
                    cursor::MoveTo(cx as u16, cy as u16),
                    SetForegroundColor(Color::Rgb {
                        r: rgb.r,
                        g: rgb.g,
                        b: rgb.b
                    }),
                    Print(ch)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LorenzParams;

    fn pt(x: f64, y: f64) -> ScreenPoint {
        ScreenPoint { x, y }
    }

    #[test]
    fn origin_projects_to_the_three_plane_anchors() {
        let p = project(
            Vec3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            800.0,
            600.0,
            SCALE,
        );
        assert_eq!(p.xz, pt(400.0, 400.0));
        assert_eq!(p.xy, pt(200.0, 300.0));
        assert_eq!(p.yz, pt(600.0, 400.0));
    }

    #[test]
    fn projection_is_pure_and_collapses_identical_points() {
        let v = Vec3 {
            x: 3.5,
            y: -2.0,
            z: 20.0,
        };
        let a = project(v, 800.0, 600.0, SCALE);
        let b = project(v, 800.0, 600.0, SCALE);
        assert_eq!(a, b);
        assert_eq!(a.xz, pt(3.5 * 5.0 + 400.0, -100.0 + 400.0));
        assert_eq!(a.xy, pt(3.5 * 5.0 + 200.0, 10.0 + 300.0));
        assert_eq!(a.yz, pt(-10.0 + 600.0, -100.0 + 400.0));
    }

    #[test]
    fn fresh_particle_draws_nothing() {
        let mut canvas = TrailCanvas::new(64, 64);
        let p = Particle::new(
            Vec3 {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
            120.0,
        );
        draw_particle(&mut canvas, &p, SCALE);
        assert!(canvas.intensity.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn stepped_particle_strokes_into_the_canvas() {
        let mut canvas = TrailCanvas::new(240, 120);
        let params = LorenzParams::default();
        let mut p = Particle::new(
            Vec3 {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
            200.0,
        );
        p.step(&params);
        draw_particle(&mut canvas, &p, SCALE);
        assert!(canvas.intensity.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn non_finite_segments_deposit_nothing() {
        let mut canvas = TrailCanvas::new(32, 32);
        canvas.stroke_segment(pt(f64::NAN, 4.0), pt(8.0, 8.0), 0.0);
        canvas.stroke_segment(pt(4.0, 4.0), pt(f64::INFINITY, 8.0), 0.0);
        assert!(canvas.intensity.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn out_of_bounds_segments_deposit_nothing() {
        let mut canvas = TrailCanvas::new(32, 32);
        canvas.stroke_segment(pt(-50.0, -50.0), pt(-40.0, -40.0), 0.0);
        canvas.stroke_segment(pt(100.0, 100.0), pt(120.0, 120.0), 0.0);
        assert!(canvas.intensity.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fade_scales_intensity_by_the_trail_factor() {
        let mut canvas = TrailCanvas::new(16, 16);
        canvas.stroke_segment(pt(4.0, 4.0), pt(9.0, 4.0), 0.0);
        let before = canvas.intensity.clone();
        canvas.fade();
        for (b, a) in before.iter().zip(canvas.intensity.iter()) {
            assert!((a - b * TRAIL_FADE).abs() < 1e-6);
        }
    }

    #[test]
    fn hsv_matches_full_saturation_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb { r: 255, g: 0, b: 0 });
        let g = hsv_to_rgb(1.0 / 3.0, 1.0, 1.0);
        assert_eq!(g.g, 255);
        assert!(g.r < 10 && g.b < 10);
    }

    #[test]
    fn cell_draw_is_diff_based() {
        let mut canvas = TrailCanvas::new(8, 8);
        let mut cells = CellGrid::new(4, 2);
        canvas.stroke_segment(pt(1.0, 1.0), pt(5.0, 5.0), 90.0);

        let mut first = Vec::new();
        cells.draw(&mut first, &canvas).unwrap();
        assert!(!first.is_empty());

        let mut second = Vec::new();
        cells.draw(&mut second, &canvas).unwrap();
        assert!(second.is_empty());
    }
}

use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a line `weight` pixels wide (1 or 2 in practice)
pub fn draw_weighted_line(canvas: &mut BrailleCanvas, a: (i32, i32), b: (i32, i32), weight: u8) {
    draw_line(canvas, a.0, a.1, b.0, b.1);
    if weight >= 2 {
        draw_line(canvas, a.0 + 1, a.1, b.0 + 1, b.1);
        draw_line(canvas, a.0, a.1 + 1, b.0, b.1 + 1);
    }
}

/// Even-odd containment test over any number of rings, so holes and the
/// parts of a multipolygon are handled in one pass.
pub fn rings_contain(rings: &[Vec<DVec2>], p: DVec2) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
    }
    inside
}

/// Area-weighted centroid of a ring, falling back to the vertex mean
/// for degenerate rings.
pub fn ring_centroid(ring: &[DVec2]) -> Option<DVec2> {
    if ring.is_empty() {
        return None;
    }
    let mut area2 = 0.0;
    let mut acc = DVec2::ZERO;
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let cross = a.perp_dot(b);
        area2 += cross;
        acc += (a + b) * cross;
    }
    if area2.abs() < f64::EPSILON {
        let sum: DVec2 = ring.iter().copied().sum();
        return Some(sum / ring.len() as f64);
    }
    Some(acc / (3.0 * area2))
}

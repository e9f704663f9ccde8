//! Rasterization of the drawing commands.
//!
//! Shape functions only compute pixel coordinates. Painting them (brush footprint, blending,
//! progress reporting) is left to the caller so that every pixel write goes through one place.

use std::collections::HashSet;
use std::ops::Range;

use walle_value::Color;

use crate::canvas::Canvas;

/// A pixel coordinate. Coordinates may lie outside the canvas.
pub type Point = (i64, i64);

/// Composes `src` over `dst` with straight alpha. Channels are truncated to whole bytes.
pub fn blend(dst: Color, src: Color) -> Color {
    match src.a {
        255 => src,
        0 => dst,
        alpha => {
            let alpha = alpha as u32;
            let channel = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * (255 - alpha)) / 255) as u8;
            Color::rgba(
                channel(src.r, dst.r),
                channel(src.g, dst.g),
                channel(src.b, dst.b),
                (alpha + dst.a as u32 * (255 - alpha) / 255) as u8,
            )
        }
    }
}

/// Square brush footprint of side `size` centered on (`x`, `y`).
/// `size` is always a positive odd number.
pub fn stamp(x: i64, y: i64, size: i64) -> impl Iterator<Item = Point> {
    let half = size / 2;
    (y - half..=y + half).flat_map(move |py| (x - half..=x + half).map(move |px| (px, py)))
}

/// Range of steps `i` in `0..steps` for which `start + dir * i` lies in `[-margin, extent + margin)`.
/// Lets long strokes skip the part that can never touch the canvas.
fn visible_steps(start: i64, dir: i64, steps: i64, extent: usize, margin: i64) -> Range<i64> {
    let lo = -(margin as i128);
    let hi = extent as i128 + margin as i128 - 1;
    let start = start as i128;
    let (first, last) = match dir {
        0 if (lo..=hi).contains(&start) => return 0..steps,
        0 => return 0..0,
        1 => (lo - start, hi - start),
        _ => (start - hi, start - lo),
    };
    let first = first.max(0);
    let last = last.min(steps as i128 - 1);
    if first > last {
        0..0
    } else {
        first as i64..last as i64 + 1
    }
}

/// Centers of a stroke of `steps` pixels from (`x`, `y`) along (`dir_x`, `dir_y`), clipped to
/// the steps that can reach `canvas` with a brush of `size`.
pub fn line(canvas: &Canvas, (x, y): Point, (dir_x, dir_y): Point, steps: i64, size: i64) -> Vec<Point> {
    let margin = size / 2;
    let xs = visible_steps(x, dir_x, steps, canvas.width(), margin);
    let ys = visible_steps(y, dir_y, steps, canvas.height(), margin);
    (xs.start.max(ys.start)..xs.end.min(ys.end))
        .map(|i| (x + dir_x * i, y + dir_y * i))
        .collect()
}

/// Boundary of a circle with midpoint (Bresenham) rasterization. Every point appears once.
pub fn circle_outline((cx, cy): Point, radius: i64) -> Vec<Point> {
    let mut points = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |point: Point| {
        if seen.insert(point) {
            points.push(point);
        }
    };

    let (mut x, mut y) = (0, radius);
    let mut d = 3 - 2 * radius;
    while y >= x {
        for &(px, py) in &[(x, y), (y, x)] {
            push((cx + px, cy + py));
            push((cx - px, cy + py));
            push((cx + px, cy - py));
            push((cx - px, cy - py));
        }
        x += 1;
        if d > 0 {
            y -= 1;
            d += 4 * (x - y) + 10;
        } else {
            d += 4 * x + 6;
        }
    }
    points
}

/// Every point of `canvas` within `radius` of the center.
pub fn circle_filled(canvas: &Canvas, (cx, cy): Point, radius: i64) -> Vec<Point> {
    let r2 = radius as i128 * radius as i128;
    let rows = clip(cy - radius, cy + radius, canvas.height());
    let cols = clip(cx - radius, cx + radius, canvas.width());
    rows.flat_map(|y| cols.clone().map(move |x| (x, y)))
        .filter(|&(x, y)| {
            let (dx, dy) = ((x - cx) as i128, (y - cy) as i128);
            dx * dx + dy * dy <= r2
        })
        .collect()
}

/// Border of the `width` x `height` rectangle whose top left corner is `left_top`, clipped
/// to the parts reachable with a brush of `size`. Every point appears once.
pub fn rectangle_outline(
    canvas: &Canvas,
    (left, top): Point,
    width: i64,
    height: i64,
    size: i64,
) -> Vec<Point> {
    let right = left.saturating_add(width - 1);
    let bottom = top.saturating_add(height - 1);
    let mut points = Vec::new();
    let mut seen = HashSet::new();
    let sides = [
        ((left, top), (1, 0), width),
        ((right, top), (0, 1), height),
        ((right, bottom), (-1, 0), width),
        ((left, bottom), (0, -1), height),
    ];
    for (start, dir, steps) in sides {
        for point in line(canvas, start, dir, steps, size) {
            if seen.insert(point) {
                points.push(point);
            }
        }
    }
    points
}

/// Every point of `canvas` inside the `width` x `height` rectangle at `left_top`.
pub fn rectangle_filled(canvas: &Canvas, (left, top): Point, width: i64, height: i64) -> Vec<Point> {
    let rows = clip(top, top.saturating_add(height - 1), canvas.height());
    let cols = clip(left, left.saturating_add(width - 1), canvas.width());
    rows.flat_map(|y| cols.clone().map(move |x| (x, y)))
        .collect()
}

/// The 4-connected region of pixels with exactly the seed's color.
/// Empty if the seed is outside the canvas or already has color `fill`.
pub fn flood_region(canvas: &Canvas, (x, y): Point, fill: Color) -> Vec<Point> {
    if !canvas.in_bounds(x, y) {
        return Vec::new();
    }
    let target = canvas.get(x, y);
    if target == fill {
        return Vec::new();
    }

    let mut region = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(x, y)];
    while let Some((px, py)) = stack.pop() {
        if !canvas.in_bounds(px, py) || canvas.get(px, py) != target || !visited.insert((px, py)) {
            continue;
        }
        region.push((px, py));
        stack.extend_from_slice(&[(px + 1, py), (px - 1, py), (px, py + 1), (px, py - 1)]);
    }
    region
}

/// Intersection of the inclusive span `from..=to` with `0..extent`.
fn clip(from: i64, to: i64, extent: usize) -> Range<i64> {
    from.max(0)..to.saturating_add(1).min(extent as i64).max(from.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut points: Vec<Point>) -> Vec<Point> {
        points.sort_unstable();
        points
    }

    #[test]
    fn test_blend() {
        let red = Color::rgb(255, 0, 0);
        assert_eq!(blend(Color::WHITE, red), red);
        assert_eq!(blend(red, Color::TRANSPARENT), red);
        assert_eq!(
            blend(Color::WHITE, Color::rgba(0, 0, 0, 128)),
            Color::rgba(127, 127, 127, 255)
        );
        assert_eq!(
            blend(Color::TRANSPARENT, Color::rgba(255, 0, 0, 51)),
            Color::rgba(51, 0, 0, 51)
        );
    }

    #[test]
    fn test_stamp() {
        assert_eq!(stamp(3, 4, 1).collect::<Vec<_>>(), vec![(3, 4)]);
        let square: Vec<_> = stamp(0, 0, 3).collect();
        assert_eq!(square.len(), 9);
        assert!(square.contains(&(-1, -1)) && square.contains(&(1, 1)));
    }

    #[test]
    fn test_line() {
        let canvas = Canvas::new(10, 10);
        assert_eq!(
            line(&canvas, (0, 0), (1, 0), 5, 1),
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]
        );
        assert_eq!(line(&canvas, (2, 2), (-1, 1), 3, 1), vec![(2, 2), (1, 3), (0, 4)]);
        assert!(line(&canvas, (0, 0), (1, 0), 0, 1).is_empty());
    }

    #[test]
    fn test_line_is_clipped() {
        let canvas = Canvas::new(10, 10);
        let points = line(&canvas, (0, 5), (1, 0), i64::MAX, 1);
        assert_eq!(points.len(), 10);
        assert_eq!(points.last(), Some(&(9, 5)));

        // a wide brush still reaches the canvas from just outside
        let points = line(&canvas, (-3, 5), (1, 0), 2, 5);
        assert_eq!(points, vec![(-2, 5)]);
        assert!(line(&canvas, (-3, 5), (1, 0), 2, 1).is_empty());
        assert!(line(&canvas, (0, 20), (1, 0), 5, 1).is_empty());
        assert_eq!(line(&canvas, (12, 12), (-1, -1), 10, 1).len(), 7);
    }

    #[test]
    fn test_circle_outline() {
        let points = sorted(circle_outline((0, 0), 3));
        let expected = sorted(vec![
            (0, 3), (0, -3), (3, 0), (-3, 0),
            (1, 3), (-1, 3), (1, -3), (-1, -3),
            (3, 1), (-3, 1), (3, -1), (-3, -1),
            (2, 2), (-2, 2), (2, -2), (-2, -2),
        ]);
        assert_eq!(points, expected);
        assert!(!points.contains(&(0, 0)));
    }

    #[test]
    fn test_circle_filled() {
        let canvas = Canvas::new(20, 20);
        let points = circle_filled(&canvas, (10, 10), 2);
        assert_eq!(points.len(), 13);
        assert!(points.contains(&(10, 10)) && points.contains(&(12, 10)));
        assert!(!points.contains(&(12, 12)));

        // only the visible quarter
        assert_eq!(circle_filled(&canvas, (0, 0), 1).len(), 3);
    }

    #[test]
    fn test_rectangle() {
        let canvas = Canvas::new(10, 10);
        let outline = rectangle_outline(&canvas, (1, 1), 3, 2, 1);
        assert_eq!(
            sorted(outline),
            sorted(vec![(1, 1), (2, 1), (3, 1), (1, 2), (2, 2), (3, 2)])
        );
        assert_eq!(rectangle_outline(&canvas, (0, 0), 4, 4, 1).len(), 12);
        assert_eq!(rectangle_filled(&canvas, (0, 0), 4, 4).len(), 16);
        assert_eq!(rectangle_filled(&canvas, (8, 8), 4, 4).len(), 4);
        assert!(rectangle_filled(&canvas, (-10, 0), 4, 4).is_empty());
    }

    #[test]
    fn test_flood_region() {
        let mut canvas = Canvas::new(5, 5);
        // vertical wall at x = 2
        for y in 0..5 {
            canvas.set(2, y, Color::BLACK);
        }
        let region = flood_region(&canvas, (0, 0), Color::rgb(255, 0, 0));
        assert_eq!(region.len(), 10);
        assert!(region.iter().all(|&(x, _)| x < 2));

        assert!(flood_region(&canvas, (2, 2), Color::BLACK).is_empty());
        assert!(flood_region(&canvas, (-1, 0), Color::BLACK).is_empty());
    }
}

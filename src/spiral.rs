/// Vertical distance between spiral rings.
pub const SPIRAL_STEP: f32 = 4.0;

/// Offsets along an outward rectangular spiral, starting with `(0, 0)`.
///
/// The horizontal step is stretched by the canvas aspect ratio so the spiral
/// fills wide canvases evenly. The iterator never ends on its own.
pub struct RectangularSpiral {
    dx: f32,
    dy: f32,
    x: f32,
    y: f32,
    t: u64,
}

fn steps(width: f32, height: f32) -> (f32, f32) {
    let dy = SPIRAL_STEP;
    let dx = if height > 0.0 { dy * width / height } else { dy };
    (dx, dy)
}

/// Number of offsets after which the spiral has reached every edge of a
/// `width × height` canvas centred on its origin.
///
/// After `n` sides the spiral extends about `n / 4` steps along each axis, and `n`
/// sides take about `n² / 4` offsets; the extra rings cover the last partial side.
pub fn steps_to_cover(width: f32, height: f32) -> usize {
    let (dx, dy) = steps(width, height);
    let rings = (width / 2.0 / dx).max(height / 2.0 / dy).max(0.0).ceil() as usize + 2;
    4 * rings * rings
}

impl RectangularSpiral {
    pub fn new(width: f32, height: f32) -> Self {
        let (dx, dy) = steps(width, height);

        RectangularSpiral {
            dx,
            dy,
            x: 0.0,
            y: 0.0,
            t: 0,
        }
    }
}

impl Iterator for RectangularSpiral {
    type Item = (f32, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.t > 0 {
            let side = (((1.0 + 4.0 * self.t as f64).sqrt() - 1.0) as u64) & 3;
            match side {
                0 => self.x += self.dx,
                1 => self.y += self.dy,
                2 => self.x -= self.dx,
                _ => self.y -= self.dy,
            }
        }
        self.t += 1;
        Some((self.x, self.y))
    }
}

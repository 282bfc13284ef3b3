use std::ops::Range;

/// Axis-aligned box in canvas pixels, `x0 <= x1`, `y0 <= y1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Rect {
            x0: cx - width / 2.0,
            y0: cy - height / 2.0,
            x1: cx + width / 2.0,
            y1: cy + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn fits_within(&self, width: f32, height: f32) -> bool {
        self.x0 >= 0.0 && self.y0 >= 0.0 && self.x1 <= width && self.y1 <= height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Coarse occupancy map of a canvas.
///
/// A box marks every cell it touches, so two boxes whose cell spans are disjoint
/// never overlap. Lives for a single layout run.
pub struct OccupancyGrid {
    cell: f32,
    columns: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(width: f32, height: f32, cell: f32) -> Self {
        let cell = cell.max(0.5);
        let columns = (width / cell).ceil().max(1.0) as usize;
        let rows = (height / cell).ceil().max(1.0) as usize;

        OccupancyGrid {
            cell,
            columns,
            rows,
            cells: vec![false; columns * rows],
        }
    }

    fn span(&self, lo: f32, hi: f32, limit: usize) -> Range<usize> {
        let start = (lo / self.cell).floor().max(0.0) as usize;
        let end = ((hi / self.cell).ceil().max(0.0) as usize).min(limit);
        start.min(end)..end
    }

    pub fn region_is_empty(&self, rect: &Rect) -> bool {
        let columns = self.span(rect.x0, rect.x1, self.columns);
        self.span(rect.y0, rect.y1, self.rows).all(|row| {
            let line = &self.cells[row * self.columns..(row + 1) * self.columns];
            !line[columns.clone()].iter().any(|&taken| taken)
        })
    }

    pub fn occupy(&mut self, rect: &Rect) {
        let columns = self.span(rect.x0, rect.x1, self.columns);
        for row in self.span(rect.y0, rect.y1, self.rows) {
            let line = &mut self.cells[row * self.columns..(row + 1) * self.columns];
            line[columns.clone()].iter_mut().for_each(|taken| *taken = true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupied_region_is_not_empty() {
        let mut grid = OccupancyGrid::new(100.0, 100.0, 2.0);
        let placed = Rect::from_center(50.0, 50.0, 20.0, 10.0);
        assert!(grid.region_is_empty(&placed));

        grid.occupy(&placed);
        assert!(!grid.region_is_empty(&placed));
        assert!(!grid.region_is_empty(&Rect::from_center(60.0, 52.0, 4.0, 4.0)));
        assert!(grid.region_is_empty(&Rect::from_center(80.0, 80.0, 10.0, 10.0)));
    }

    #[test]
    fn rect_geometry() {
        let a = Rect::from_center(10.0, 10.0, 10.0, 4.0);
        let b = Rect::from_center(14.0, 10.0, 2.0, 2.0);
        let c = Rect::from_center(30.0, 10.0, 2.0, 2.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c).width(), 26.0);
        assert!(a.fits_within(20.0, 20.0));
        assert!(!c.fits_within(20.0, 20.0));
    }

    #[test]
    fn out_of_range_boxes_are_clamped() {
        let mut grid = OccupancyGrid::new(10.0, 10.0, 1.0);
        grid.occupy(&Rect::from_center(0.0, 0.0, 50.0, 50.0));
        assert!(!grid.region_is_empty(&Rect::from_center(5.0, 5.0, 1.0, 1.0)));
    }
}

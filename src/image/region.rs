//! Axis-aligned regions with a fixed size and a movable origin.

/// Rectangle in frame coordinates: top-left origin plus size.
///
/// The size of a region is fixed at construction. Drift correction only ever
/// produces translated copies, so every region derived from another shares
/// its width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl Region {
    /// Creates a region from origin and size.
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge (column of the origin).
    pub fn x(&self) -> usize {
        self.x
    }

    /// Top edge (row of the origin).
    pub fn y(&self) -> usize {
        self.y
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Origin as `(x, y)`.
    pub fn origin(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// Size as `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Exclusive right edge, if it does not overflow.
    pub fn right(&self) -> Option<usize> {
        self.x.checked_add(self.width)
    }

    /// Exclusive bottom edge, if it does not overflow.
    pub fn bottom(&self) -> Option<usize> {
        self.y.checked_add(self.height)
    }

    /// Returns a copy moved by `(dx, dy)`, or `None` when the origin would go negative.
    pub fn translated(&self, dx: isize, dy: isize) -> Option<Region> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Region { x, y, ..*self })
    }

    /// Returns true when the region lies entirely inside a `width x height` frame.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        match (self.right(), self.bottom()) {
            (Some(r), Some(b)) => r <= width && b <= height,
            _ => false,
        }
    }

    /// Returns true when pixel `(px, py)` lies inside the region.
    pub fn contains(&self, px: usize, py: usize) -> bool {
        px >= self.x && py >= self.y && px - self.x < self.width && py - self.y < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::Region;

    #[test]
    fn translation_preserves_size() {
        let region = Region::new(10, 20, 30, 40);
        let moved = region.translated(-2, 2).unwrap();
        assert_eq!(moved.origin(), (8, 22));
        assert_eq!(moved.size(), region.size());
        assert!(Region::new(1, 1, 4, 4).translated(-2, 0).is_none());
    }

    #[test]
    fn fits_within_checks_both_edges() {
        let region = Region::new(6, 6, 4, 4);
        assert!(region.fits_within(10, 10));
        assert!(!region.fits_within(9, 10));
        assert!(!Region::new(0, 0, 0, 4).fits_within(10, 10));
        assert!(region.contains(9, 6));
        assert!(!region.contains(10, 6));
    }
}

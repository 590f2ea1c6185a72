/// Axis-aligned 2D bounding box.
///
/// An empty box has `min > max` on both axes; extending it with a point yields a
/// zero-size box around that point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut out = Self::empty();
        for p in points {
            out.extend(p);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, p: [f64; 2]) {
        if !p[0].is_finite() || !p[1].is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[0] - self.min[0]
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[1] - self.min[1]
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
        ]
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }

    /// Overlap of both boxes, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Aabb2) -> Option<Aabb2> {
        if !self.intersects(other) {
            return None;
        }
        Some(Aabb2 {
            min: [self.min[0].max(other.min[0]), self.min[1].max(other.min[1])],
            max: [self.max[0].min(other.max[0]), self.max[1].min(other.max[1])],
        })
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn empty_box_has_no_size() {
        let b = Aabb2::empty();
        assert!(b.is_empty());
        assert_eq!(b.width(), 0.0);
        assert!(!b.intersects(&Aabb2::new([0.0, 0.0], [1.0, 1.0])));
    }

    #[test]
    fn from_points_covers_all_points() {
        let b = Aabb2::from_points([[1.0, 5.0], [-2.0, 3.0], [4.0, -1.0]]);
        assert_eq!(b.min, [-2.0, -1.0]);
        assert_eq!(b.max, [4.0, 5.0]);
        assert_eq!(b.center(), [1.0, 2.0]);
        assert!(b.contains([0.0, 0.0]));
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let b = Aabb2::from_points([[f64::NAN, 1.0], [2.0, 2.0]]);
        assert_eq!(b.min, [2.0, 2.0]);
    }

    #[test]
    fn intersection_of_overlapping_boxes() {
        let a = Aabb2::new([0.0, 0.0], [10.0, 10.0]);
        let b = Aabb2::new([5.0, -5.0], [15.0, 5.0]);
        let i = a.intersection(&b).expect("overlap");
        assert_eq!(i, Aabb2::new([5.0, 0.0], [10.0, 5.0]));
        assert!(a.intersection(&Aabb2::new([20.0, 20.0], [30.0, 30.0])).is_none());
    }
}

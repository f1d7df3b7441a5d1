//! Radial gradients between two concentric circles

use super::color::Color;

/// Radial gradient centred on (`cx`, `cy`).
///
/// Inside `inner` the first stop colour applies, beyond `outer` the last.
#[derive(Debug, Clone)]
pub struct RadialGradient {
    pub cx: f32,
    pub cy: f32,
    pub inner: f32,
    pub outer: f32,
    stops: Vec<(f32, Color)>,
}

impl RadialGradient {
    pub fn new(cx: f32, cy: f32, inner: f32, outer: f32) -> Self {
        Self {
            cx,
            cy,
            inner: inner.max(0.0),
            outer: outer.max(inner.max(0.0)),
            stops: Vec::new(),
        }
    }

    /// Add a colour stop; offsets are clamped to [0, 1] and kept sorted
    pub fn with_stop(mut self, offset: f32, color: Color) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let idx = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(idx, (offset, color));
        self
    }

    /// Colour at a point, as straight-alpha unit floats
    pub fn sample(&self, x: f32, y: f32) -> [f32; 4] {
        let dist = ((x - self.cx).powi(2) + (y - self.cy).powi(2)).sqrt();
        let span = self.outer - self.inner;
        let t = if span <= f32::EPSILON {
            if dist < self.inner { 0.0 } else { 1.0 }
        } else {
            ((dist - self.inner) / span).clamp(0.0, 1.0)
        };
        self.color_at(t)
    }

    fn color_at(&self, t: f32) -> [f32; 4] {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return [0.0; 4],
        };
        if t <= first.0 {
            return first.1.to_unit();
        }
        if t >= last.0 {
            return last.1.to_unit();
        }

        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t >= o0 && t <= o1 {
                let local = if o1 - o0 > f32::EPSILON { (t - o0) / (o1 - o0) } else { 1.0 };
                let a = c0.to_unit();
                let b = c1.to_unit();
                return [
                    a[0] + (b[0] - a[0]) * local,
                    a[1] + (b[1] - a[1]) * local,
                    a[2] + (b[2] - a[2]) * local,
                    a[3] + (b[3] - a[3]) * local,
                ];
            }
        }
        last.1.to_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_regions() {
        let g = RadialGradient::new(0.0, 0.0, 10.0, 20.0)
            .with_stop(0.0, Color::rgba(0, 0, 0, 0.0))
            .with_stop(1.0, Color::rgba(0, 0, 0, 0.8));

        assert_eq!(g.sample(5.0, 0.0)[3], 0.0);
        assert!((g.sample(15.0, 0.0)[3] - 0.4).abs() < 1e-5);
        assert!((g.sample(0.0, 40.0)[3] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_no_stops_is_transparent() {
        let g = RadialGradient::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(g.sample(0.0, 0.0), [0.0; 4]);
    }
}

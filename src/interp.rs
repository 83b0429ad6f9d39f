use crate::{
    ease::Ease,
    error::{ScrollmorphError, ScrollmorphResult},
};

/// Maps `value` from `domain` onto `range`, clamping to the range edges.
///
/// `map_range([400.0, 600.0], [1.0, 0.0], 500.0)` is `0.5`; inputs outside
/// the domain pin to the nearest range edge.
pub fn map_range(domain: [f64; 2], range: [f64; 2], value: f64) -> f64 {
    map_range_with(domain, range, value, true)
}

/// Like [`map_range`], but with `clamp == false` inputs outside the domain
/// extrapolate linearly instead of pinning to the range edges.
pub fn map_range_with(domain: [f64; 2], range: [f64; 2], value: f64, clamp: bool) -> f64 {
    let mut normalised = (value - domain[0]) / (domain[1] - domain[0]);
    if clamp {
        normalised = normalised.clamp(0.0, 1.0);
    }
    (range[1] - range[0]) * normalised + range[0]
}

/// Curried form of [`map_range`] for use inside descriptor closures.
pub fn map_range_fn(domain: [f64; 2], range: [f64; 2]) -> impl Fn(f64) -> f64 {
    move |value| map_range(domain, range, value)
}

/// Piecewise-linear interpolation over `(position, value)` keyframes.
///
/// Inputs below the first key return the first value; at or above the last
/// key they return the last value, unless a loop period is set, in which
/// case inputs wrap modulo the period and the segment past the last key
/// interpolates back toward the first value. An easing pre-warps the
/// wrapped position and therefore only takes effect together with a loop
/// period.
pub struct KeyframeMap {
    keys: Vec<(f64, f64)>, // sorted by position
    loop_by: Option<f64>,
    ease: Option<Box<dyn Fn(f64) -> f64>>,
}

impl KeyframeMap {
    /// Builds a keyframe map from `(position, value)` pairs in any order.
    pub fn new(points: &[(f64, f64)]) -> ScrollmorphResult<Self> {
        if points.is_empty() {
            return Err(ScrollmorphError::validation(
                "KeyframeMap must have at least one keyframe",
            ));
        }
        let mut keys = points.to_vec();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self {
            keys,
            loop_by: None,
            ease: None,
        })
    }

    /// Wraps sampled positions modulo `period`. Must be positive.
    pub fn looped(mut self, period: f64) -> Self {
        self.loop_by = Some(period);
        self
    }

    pub fn eased(self, ease: Ease) -> Self {
        self.eased_with(move |t| ease.apply(t))
    }

    pub fn eased_with(mut self, ease: impl Fn(f64) -> f64 + 'static) -> Self {
        self.ease = Some(Box::new(ease));
        self
    }

    pub fn sample(&self, value: f64) -> f64 {
        let mut val = value;
        if let Some(period) = self.loop_by {
            val = match &self.ease {
                Some(ease) => ease((val % period) / period) * period,
                None => val % period,
            };
        }

        let (first_pos, first_val) = self.keys[0];
        if val <= first_pos {
            return first_val;
        }
        let (last_pos, last_val) = self.keys[self.keys.len() - 1];
        if self.loop_by.is_none() && val >= last_pos {
            return last_val;
        }

        let idx = self.keys.partition_point(|&(pos, _)| pos <= val) - 1;
        let (from_pos, from_val) = self.keys[idx];
        match self.keys.get(idx + 1) {
            Some(&(to_pos, to_val)) => map_range([from_pos, to_pos], [from_val, to_val], val),
            // Past the last key inside a loop period: wrap toward the first value.
            None => {
                let period = self.loop_by.unwrap_or(from_pos);
                map_range([from_pos, period], [from_val, first_val], val)
            }
        }
    }
}

impl std::fmt::Debug for KeyframeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyframeMap")
            .field("keys", &self.keys)
            .field("loop_by", &self.loop_by)
            .field("eased", &self.ease.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn map_range_interpolates_and_clamps() {
        assert_eq!(map_range([400.0, 600.0], [1.0, 0.0], 400.0), 1.0);
        assert_eq!(map_range([400.0, 600.0], [1.0, 0.0], 500.0), 0.5);
        assert_eq!(map_range([400.0, 600.0], [1.0, 0.0], 600.0), 0.0);
        assert_eq!(map_range([400.0, 600.0], [1.0, 0.0], 300.0), 1.0);
        assert_eq!(map_range([400.0, 600.0], [1.0, 0.0], 700.0), 0.0);
    }

    #[test]
    fn map_range_extrapolates_when_unclamped() {
        assert_eq!(map_range_with([400.0, 600.0], [1.0, 0.0], 300.0, false), 1.5);
        assert_eq!(
            map_range_with([400.0, 600.0], [1.0, 0.0], 700.0, false),
            -0.5
        );
    }

    #[test]
    fn map_range_fn_is_equivalent() {
        let f = map_range_fn([0.0, 10.0], [0.0, 100.0]);
        assert_eq!(f(2.5), 25.0);
        assert_eq!(f(-1.0), 0.0);
    }

    #[test]
    fn keyframes_clamp_at_ends_and_interpolate_between() {
        let map = KeyframeMap::new(&[(4.0, 0.0), (6.0, 0.5), (8.0, 0.5), (10.0, 1.0)]).unwrap();
        assert_eq!(map.sample(3.0), 0.0);
        assert_eq!(map.sample(4.0), 0.0);
        assert_eq!(map.sample(5.0), 0.25);
        assert_eq!(map.sample(6.0), 0.5);
        assert_eq!(map.sample(7.0), 0.5);
        assert_eq!(map.sample(8.0), 0.5);
        assert_eq!(map.sample(9.0), 0.75);
        assert_eq!(map.sample(10.0), 1.0);
        assert_eq!(map.sample(11.0), 1.0);
    }

    #[test]
    fn keyframes_wrap_with_loop_period() {
        let map = KeyframeMap::new(&[(0.0, 0.0), (1.0, 50.0), (2.0, 50.0), (3.0, 100.0)])
            .unwrap()
            .looped(4.0);
        assert_eq!(map.sample(0.0), 0.0);
        assert_eq!(map.sample(1.0), 50.0);
        assert_eq!(map.sample(3.0), 100.0);
        assert_eq!(map.sample(3.5), 50.0);
        assert_eq!(map.sample(4.0), 0.0);
        assert_eq!(map.sample(5.5), 50.0);
        assert_eq!(map.sample(6.75), 87.5);
    }

    #[test]
    fn easing_prewarps_looped_positions() {
        let map = KeyframeMap::new(&[(0.0, 0.0), (1.0, 50.0), (2.0, 50.0), (3.0, 100.0)])
            .unwrap()
            .looped(4.0)
            .eased_with(|t| t * t);
        assert_eq!(map.sample(0.0), 0.0);
        assert_close(map.sample(0.5), 3.125);
        assert_close(map.sample(1.0), 12.5);
        assert_close(map.sample(2.0), 50.0);
        assert_close(map.sample(2.5), 50.0);
        assert_close(map.sample(3.0), 62.5);
        assert_close(map.sample(3.5), 93.75);
        assert_close(map.sample(3.75), 48.4375);
        assert_eq!(map.sample(4.0), 0.0);
    }

    #[test]
    fn named_easing_matches_closure() {
        let named = KeyframeMap::new(&[(0.0, 0.0), (2.0, 10.0)])
            .unwrap()
            .looped(4.0)
            .eased(Ease::InQuad);
        let closed = KeyframeMap::new(&[(0.0, 0.0), (2.0, 10.0)])
            .unwrap()
            .looped(4.0)
            .eased_with(|t| t * t);
        assert_eq!(named.sample(1.3), closed.sample(1.3));
    }

    #[test]
    fn keys_may_arrive_out_of_order() {
        let map = KeyframeMap::new(&[
            (4665.0, 1.0),
            (5287.0, 0.0),
            (4540.6, 0.0),
            (5162.6, 1.0),
        ])
        .unwrap();
        assert_eq!(map.sample(4500.0), 0.0);
        assert_eq!(map.sample(4700.0), 1.0);
        assert_eq!(map.sample(5100.0), 1.0);
        assert_eq!(map.sample(5300.0), 0.0);
    }

    #[test]
    fn non_integer_positions_interpolate() {
        let map =
            KeyframeMap::new(&[(0.0, 0.0), (0.5, 100.0), (1.0, 150.0), (2.0001, 200.0)]).unwrap();
        assert_close(map.sample(0.25), 50.0);
        assert_close(map.sample(0.75), 125.0);
        assert!((map.sample(1.5) - 175.0).abs() < 0.1);
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(KeyframeMap::new(&[]).is_err());
    }
}

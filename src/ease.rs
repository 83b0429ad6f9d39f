/// Named easing curves for pre-warping interpolation positions.
///
/// Every curve maps `[0, 1]` onto `[0, 1]` with stable endpoints; inputs are
/// clamped into the unit interval before evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    /// Accelerates into the midpoint and out of it again.
    Jump,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(4) / 2.0)
                }
            }
            Self::InQuint => t.powi(5),
            Self::OutQuint => 1.0 - (1.0 - t).powi(5),
            Self::InOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(5) / 2.0)
                }
            }
            Self::Jump => {
                if t < 0.5 {
                    2.0 * t * (1.0 - t)
                } else {
                    2.0 * t * t - 2.0 * t + 1.0
                }
            }
        }
    }

    /// Looks up an easing by its registry name, e.g. `"in-out-cubic"`.
    pub fn by_name(name: &str) -> Option<Self> {
        let ease = match name {
            "linear" => Self::Linear,
            "in-quad" => Self::InQuad,
            "out-quad" => Self::OutQuad,
            "in-out-quad" => Self::InOutQuad,
            "in-cubic" => Self::InCubic,
            "out-cubic" => Self::OutCubic,
            "in-out-cubic" => Self::InOutCubic,
            "in-quart" => Self::InQuart,
            "out-quart" => Self::OutQuart,
            "in-out-quart" => Self::InOutQuart,
            "in-quint" => Self::InQuint,
            "out-quint" => Self::OutQuint,
            "in-out-quint" => Self::InOutQuint,
            "jump" => Self::Jump,
            _ => return None,
        };
        Some(ease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 14] = [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::InQuart,
        Ease::OutQuart,
        Ease::InOutQuart,
        Ease::InQuint,
        Ease::OutQuint,
        Ease::InOutQuint,
        Ease::Jump,
    ];

    #[test]
    fn endpoints_are_stable() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
        }
    }

    #[test]
    fn monotonic_spot_check() {
        for ease in ALL {
            let a = ease.apply(0.25);
            let b = ease.apply(0.5);
            let c = ease.apply(0.75);
            assert!(a < b, "{ease:?} not increasing at 0.25..0.5");
            assert!(b < c, "{ease:?} not increasing at 0.5..0.75");
        }
    }

    #[test]
    fn by_name_roundtrip() {
        assert_eq!(Ease::by_name("linear"), Some(Ease::Linear));
        assert_eq!(Ease::by_name("in-out-quint"), Some(Ease::InOutQuint));
        assert_eq!(Ease::by_name("jump"), Some(Ease::Jump));
        assert_eq!(Ease::by_name("bounce"), None);
    }
}

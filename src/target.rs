use std::{cell::RefCell, rc::Rc};

use kurbo::Vec2;

use crate::error::ScrollmorphResult;

/// A visual target driven by the engine.
///
/// Targets expose a style-like property map and a string attribute map; the
/// engine reads them only during the compute phase and writes them only
/// during the apply phase. A target that reports [`uses_transform_attr`]
/// (vector-graphics content below the root) receives transform output on
/// its `transform` attribute instead of the style property.
///
/// [`uses_transform_attr`]: Target::uses_transform_attr
pub trait Target {
    fn style(&self, name: &str) -> Option<String>;
    fn set_style(&mut self, name: &str, value: &str);
    fn attr(&self, name: &str) -> Option<String>;
    fn set_attr(&mut self, name: &str, value: &str);

    fn uses_transform_attr(&self) -> bool {
        false
    }
}

/// Shared handle to a visual target.
pub type TargetRef = Rc<RefCell<dyn Target>>;

/// Identifies which scroll container supplies the driving `x`/`y` signal.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ScrollSource {
    /// The main viewport.
    Viewport,
    /// A host-resolvable selector or handle for a nested scroll container.
    Selector(String),
}

impl Default for ScrollSource {
    fn default() -> Self {
        Self::Viewport
    }
}

/// Host capabilities consumed by the frame driver: a millisecond clock and
/// a scroll-offset resolver. Resolution failures are reported per source
/// and only affect engines reading that source.
pub trait Host {
    fn now_ms(&self) -> f64;
    fn scroll_offset(&mut self, source: &ScrollSource) -> ScrollmorphResult<Vec2>;
}

/// The host's "request next frame" primitive. [`crate::Runtime::run`] keeps
/// ticking for as long as this returns `true`.
pub trait FrameScheduler {
    fn next_frame(&mut self) -> bool;
}

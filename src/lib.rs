//! Scrollmorph is a scroll- and frame-driven value-interpolation engine.
//!
//! Declarative [`Binding`]s attach computed output channels (transform ops,
//! style properties, attributes) to visual targets. Once per animation
//! frame the [`Runtime`] recomputes every channel from the current driving
//! signals (scroll offset, frame index, timed action progress, custom
//! variables) and applies only the values that changed.
//!
//! # Frame cycle
//!
//! 1. **Compute**: every registered engine stages its channel values under
//!    one fixed signal snapshot; descriptor functions run only when a
//!    declared signal changed (the "smart argument" planner in
//!    [`descriptor`]).
//! 2. **Apply**: staged values are written to the targets; channels whose
//!    value is unchanged are skipped entirely.
//!
//! The two phases run as two full passes across *all* engines, so
//! descriptor functions may read layout-dependent state without
//! interleaving reads and writes.
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded**: engines are driven cooperatively from the host's
//!   frame-scheduling primitive; there is no locking and no blocking.
//! - **Pure descriptors**: channel functions are assumed pure with respect
//!   to their declared arguments; declaring [`Arg::I`] opts into running
//!   every cycle.
//!
//! The host environment is consumed through the narrow traits in
//! [`target`]: visual targets, a scroll-offset resolver with a clock, and
//! the frame scheduler.
#![forbid(unsafe_code)]

pub mod binding;
pub mod descriptor;
pub mod ease;
pub mod error;
pub mod interp;
pub mod runtime;
mod store;
pub mod target;
pub mod transformer;

pub use binding::Binding;
pub use descriptor::{Arg, Args, Computed, Descriptor, Value};
pub use ease::Ease;
pub use error::{ScrollmorphError, ScrollmorphResult};
pub use interp::{KeyframeMap, map_range, map_range_fn, map_range_with};
pub use kurbo::Vec2;
pub use runtime::Runtime;
pub use target::{FrameScheduler, Host, ScrollSource, Target, TargetRef};
pub use transformer::{ActionHandle, Transformer};

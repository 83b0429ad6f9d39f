use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use kurbo::Vec2;

use crate::{
    binding::{Binding, ChannelOp},
    descriptor::{Category, Computed, Signals, plan_call},
    error::ScrollmorphResult,
    runtime::RuntimeInner,
    store::{TargetStore, target_key},
    target::ScrollSource,
};

/// Completion handle returned by [`Transformer::trigger`]. Flips to
/// complete during the compute phase of the cycle where the action's
/// progress reaches 1. A handle orphaned by re-triggering the same action
/// name never completes.
#[derive(Clone, Debug)]
pub struct ActionHandle {
    done: Rc<Cell<bool>>,
}

impl ActionHandle {
    pub fn is_complete(&self) -> bool {
        self.done.get()
    }
}

#[derive(Debug)]
struct ActionState {
    /// Stamped on the first compute phase that observes the action; the
    /// clock is a host capability available only during ticks.
    started_at: Option<f64>,
    duration_ms: f64,
    done: Rc<Cell<bool>>,
}

impl ActionState {
    fn progress(&mut self, now_ms: f64) -> f64 {
        let started = *self.started_at.get_or_insert(now_ms);
        if self.duration_ms > 0.0 {
            ((now_ms - started) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Engine state behind a [`Transformer`] handle. Owns the bindings, the
/// per-cycle diff bookkeeping, and the per-engine target store.
pub(crate) struct Engine {
    pub(crate) i: u64,
    pub(crate) active: bool,
    pub(crate) visible: Option<[f64; 2]>,
    pub(crate) scroll_source: ScrollSource,
    pub(crate) variables: BTreeMap<String, Box<dyn Fn() -> f64>>,
    /// Previous cycle's driving-signal values; starts below any real
    /// scroll position.
    last: Vec2,
    last_vars: BTreeMap<String, f64>,
    actions: BTreeMap<String, ActionState>,
    bindings: Vec<Binding>,
    store: TargetStore,
    /// Snapshot captured by the compute phase, committed by the apply
    /// phase as the next cycle's diffing baseline.
    pending: Option<PendingSnapshot>,
}

struct PendingSnapshot {
    offset: Vec2,
    vars: BTreeMap<String, f64>,
}

impl Engine {
    pub(crate) fn new(bindings: Vec<Binding>) -> Self {
        Self {
            i: 0,
            active: false,
            visible: None,
            scroll_source: ScrollSource::default(),
            variables: BTreeMap::new(),
            last: Vec2::new(-1.0, -1.0),
            last_vars: BTreeMap::new(),
            actions: BTreeMap::new(),
            bindings,
            store: TargetStore::default(),
            pending: None,
        }
    }

    /// Compute phase: stages every binding's channel values for this cycle
    /// without touching any target. Reads targets only on the very first
    /// cycle, to capture pre-engine transform state.
    pub(crate) fn compute(
        &mut self,
        offset: Vec2,
        vars: BTreeMap<String, f64>,
        now_ms: f64,
    ) -> ScrollmorphResult<()> {
        if !self.active {
            return Ok(());
        }

        let mut progress: BTreeMap<String, f64> = BTreeMap::new();
        for (name, action) in &mut self.actions {
            progress.insert(name.clone(), action.progress(now_ms));
        }

        let first_cycle = self.i == 0;
        for binding in &mut self.bindings {
            // Original transforms must be captured before the visibility
            // check so reset() can restore even never-visible targets.
            if first_cycle && !binding.transforms.is_empty() {
                for target in &binding.targets {
                    let original = {
                        let t = target.borrow();
                        if t.uses_transform_attr() {
                            format!("{} ", t.attr("transform").unwrap_or_default())
                        } else {
                            match t.style("transform") {
                                None => String::new(),
                                Some(s) if s.is_empty() || s == "none" => String::new(),
                                Some(s) => format!("{s} "),
                            }
                        }
                    };
                    self.store.capture_transform(target_key(target), original);
                }
            }

            if binding.visible.is_some() || self.visible.is_some() {
                let mut hidden = true;
                if let Some([min, max]) = self.visible {
                    hidden = offset.y < min || offset.y > max;
                }
                if hidden {
                    if let Some([min, max]) = binding.visible {
                        hidden = offset.y < min || offset.y > max;
                    }
                }
                binding.staged.hidden = Some(hidden);
                if hidden {
                    continue;
                }
            } else {
                binding.staged.hidden = None;
            }

            let signals = Signals {
                x: offset.x,
                y: offset.y,
                i: self.i,
                last_x: self.last.x,
                last_y: self.last.y,
                actions: &progress,
                vars: &vars,
                last_vars: &self.last_vars,
            };

            if binding.transforms.is_empty() {
                binding.staged.transforms = None;
            } else {
                let mut pieces = Vec::with_capacity(binding.transforms.len());
                for op in &mut binding.transforms {
                    let computed =
                        plan_call(Category::Transforms, &op.prop, &op.unit, &op.descriptor, &signals)?;
                    let piece = match computed {
                        Computed::Changed(value) => {
                            let piece = format!("{}({value})", op.prop);
                            op.last_piece = Some(piece.clone());
                            piece
                        }
                        Computed::Unchanged => op.last_piece.clone().unwrap_or_default(),
                    };
                    pieces.push(piece);
                }
                let joined = pieces.join(" ");
                if binding.last.transforms.as_deref() == Some(joined.as_str()) {
                    binding.staged.transforms = Some(Computed::Unchanged);
                } else {
                    binding.last.transforms = Some(joined.clone());
                    binding.staged.transforms = Some(Computed::Changed(joined));
                }
            }

            for op in &binding.styles {
                let staged = stage_channel(Category::Styles, op, &signals, &mut binding.last.styles)?;
                binding.staged.styles.insert(op.primary().to_string(), staged);
            }

            for op in &binding.attrs {
                let staged = stage_channel(Category::Attrs, op, &signals, &mut binding.last.attrs)?;
                binding.staged.attrs.insert(op.primary().to_string(), staged);
            }
        }

        // Completed actions are removed only after every binding has had a
        // chance to observe progress 1.
        let completed: Vec<String> = progress
            .iter()
            .filter(|(_, p)| **p >= 1.0)
            .map(|(name, _)| name.clone())
            .collect();
        for name in completed {
            if let Some(action) = self.actions.remove(&name) {
                action.done.set(true);
            }
        }

        self.pending = Some(PendingSnapshot { offset, vars });
        Ok(())
    }

    /// Apply phase: writes staged values to the targets. Never invokes
    /// descriptor functions and never reads layout-relevant state beyond
    /// the lazily captured original display values.
    pub(crate) fn apply(&mut self) {
        if !self.active {
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        for binding in &mut self.bindings {
            match binding.staged.hidden {
                Some(true) => {
                    for target in &binding.targets {
                        let mut t = target.borrow_mut();
                        let current = t.style("display").unwrap_or_default();
                        self.store.capture_display(target_key(target), current);
                        t.set_style("display", "none");
                    }
                    continue;
                }
                Some(false) => {
                    for target in &binding.targets {
                        let display = self
                            .store
                            .original_display(target_key(target))
                            .unwrap_or_default();
                        target.borrow_mut().set_style("display", display);
                    }
                }
                None => {}
            }

            if let Some(Computed::Changed(value)) = &binding.staged.transforms {
                for target in &binding.targets {
                    let original = self
                        .store
                        .original_transform(target_key(target))
                        .unwrap_or_default();
                    let composed = format!("{original}{value}");
                    let mut t = target.borrow_mut();
                    if t.uses_transform_attr() {
                        t.set_attr("transform", &composed);
                    } else {
                        t.set_style("transform", &composed);
                    }
                }
            }

            for op in &binding.styles {
                let Some(Computed::Changed(value)) = binding.staged.styles.get(op.primary()) else {
                    continue;
                };
                for target in &binding.targets {
                    let mut t = target.borrow_mut();
                    for name in &op.names {
                        t.set_style(name, value);
                    }
                }
            }

            for op in &binding.attrs {
                let Some(Computed::Changed(value)) = binding.staged.attrs.get(op.primary()) else {
                    continue;
                };
                for target in &binding.targets {
                    let mut t = target.borrow_mut();
                    for name in &op.names {
                        t.set_attr(name, value);
                    }
                }
            }
        }

        self.i += 1;
        self.last = pending.offset;
        self.last_vars = pending.vars;
    }

    /// Restores captured pre-engine state onto the targets.
    fn restore_targets(&mut self) {
        for binding in &self.bindings {
            if !binding.transforms.is_empty() {
                for target in &binding.targets {
                    if let Some(original) = self.store.original_transform(target_key(target)) {
                        let original = original.trim_end();
                        let mut t = target.borrow_mut();
                        if t.uses_transform_attr() {
                            t.set_attr("transform", original);
                        } else {
                            t.set_style("transform", original);
                        }
                    }
                }
            }

            if binding.visible.is_some() || self.visible.is_some() {
                for target in &binding.targets {
                    if let Some(display) = self.store.original_display(target_key(target)) {
                        target.borrow_mut().set_style("display", display);
                    }
                }
            }
        }
    }
}

fn stage_channel(
    category: Category,
    op: &ChannelOp,
    signals: &Signals<'_>,
    last: &mut BTreeMap<String, String>,
) -> ScrollmorphResult<Computed> {
    let computed = plan_call(category, op.primary(), &op.unit, &op.descriptor, signals)?;
    Ok(match computed {
        Computed::Changed(value) => {
            if last.get(op.primary()).map(String::as_str) == Some(value.as_str()) {
                Computed::Unchanged
            } else {
                last.insert(op.primary().to_string(), value.clone());
                Computed::Changed(value)
            }
        }
        Computed::Unchanged => Computed::Unchanged,
    })
}

/// Owning handle to one engine: a set of bindings recomputed once per
/// animation frame while registered with a [`crate::Runtime`].
///
/// Created via [`crate::Runtime::transformer`], which registers the engine
/// and starts it immediately. Handles are cheap to clone.
#[derive(Clone)]
pub struct Transformer {
    engine: Rc<RefCell<Engine>>,
    runtime: Weak<RefCell<RuntimeInner>>,
}

impl Transformer {
    pub(crate) fn from_parts(
        engine: Rc<RefCell<Engine>>,
        runtime: Weak<RefCell<RuntimeInner>>,
    ) -> Self {
        Self { engine, runtime }
    }

    /// Marks the engine active and (re-)registers it with its runtime.
    /// Idempotent.
    pub fn start(&self) {
        self.engine.borrow_mut().active = true;
        if let Some(inner) = self.runtime.upgrade() {
            let mut inner = inner.borrow_mut();
            if !inner
                .engines
                .iter()
                .any(|e| Rc::ptr_eq(e, &self.engine))
            {
                inner.engines.push(Rc::clone(&self.engine));
            }
        }
    }

    /// Marks the engine inactive and deregisters it. Idempotent; takes
    /// effect from the next tick.
    pub fn stop(&self) {
        self.engine.borrow_mut().active = false;
        if let Some(inner) = self.runtime.upgrade() {
            inner
                .borrow_mut()
                .engines
                .retain(|e| !Rc::ptr_eq(e, &self.engine));
        }
    }

    /// Stops the engine and restores captured target state: original
    /// transforms for bindings with transform ops, original display values
    /// for bindings subject to visibility gating. Counters are kept.
    pub fn reset(&self) {
        self.stop();
        self.engine.borrow_mut().restore_targets();
    }

    /// Sets the engine-wide visible range on the vertical scroll signal.
    pub fn set_visible(&self, range: [f64; 2]) {
        self.engine.borrow_mut().visible = Some(range);
    }

    /// Starts (or restarts) the named action: a timed progress ramp from 0
    /// to 1 observable by descriptors declaring [`crate::Arg::Actions`].
    /// The returned handle completes on the cycle where progress reaches 1.
    pub fn trigger(&self, name: impl Into<String>, duration_ms: f64) -> ActionHandle {
        let done = Rc::new(Cell::new(false));
        self.engine.borrow_mut().actions.insert(
            name.into(),
            ActionState {
                started_at: None,
                duration_ms,
                done: Rc::clone(&done),
            },
        );
        ActionHandle { done }
    }

    /// Selects which scroll container supplies this engine's `x`/`y`.
    pub fn set_scroll_source(&self, source: ScrollSource) {
        self.engine.borrow_mut().scroll_source = source;
    }

    pub fn scroll_source(&self) -> ScrollSource {
        self.engine.borrow().scroll_source.clone()
    }

    /// Registers a custom driving variable, computed once per tick and
    /// diffed like `x`/`y` for call skipping.
    pub fn set_variable(&self, name: impl Into<String>, f: impl Fn() -> f64 + 'static) {
        self.engine
            .borrow_mut()
            .variables
            .insert(name.into(), Box::new(f));
    }

    pub fn is_active(&self) -> bool {
        self.engine.borrow().active
    }

    /// Number of completed cycles.
    pub fn frame_index(&self) -> u64 {
        self.engine.borrow().i
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let engine = self.engine.borrow();
        f.debug_struct("Transformer")
            .field("i", &engine.i)
            .field("active", &engine.active)
            .field("visible", &engine.visible)
            .field("scroll_source", &engine.scroll_source)
            .finish()
    }
}

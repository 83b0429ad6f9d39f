use std::{
    cell::RefCell,
    collections::{BTreeMap, btree_map::Entry},
    rc::Rc,
};

use kurbo::Vec2;

use crate::{
    binding::Binding,
    target::{FrameScheduler, Host, ScrollSource},
    transformer::{Engine, Transformer},
};

/// Explicit registry and frame driver for a set of engines.
///
/// One runtime per host "page"; engines register themselves on creation
/// through [`Runtime::transformer`] and deregister via
/// [`Transformer::stop`]. Each [`tick`] runs every registered engine's
/// compute phase before any engine's apply phase, so descriptor functions
/// may read layout-dependent state without forcing a synchronous layout
/// pass between writes.
///
/// [`tick`]: Runtime::tick
#[derive(Clone, Default)]
pub struct Runtime {
    inner: Rc<RefCell<RuntimeInner>>,
}

#[derive(Default)]
pub(crate) struct RuntimeInner {
    pub(crate) engines: Vec<Rc<RefCell<Engine>>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from `bindings`, registers it, and starts it
    /// immediately.
    pub fn transformer(&self, bindings: Vec<Binding>) -> Transformer {
        let engine = Rc::new(RefCell::new(Engine::new(bindings)));
        let transformer = Transformer::from_parts(engine, Rc::downgrade(&self.inner));
        transformer.start();
        transformer
    }

    /// Number of currently registered engines.
    pub fn registered(&self) -> usize {
        self.inner.borrow().engines.len()
    }

    /// Runs one frame: resolves each distinct scroll source at most once,
    /// computes every active engine, then applies every engine that
    /// computed cleanly. A failing engine is logged and skipped for the
    /// tick; it does not affect the others.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn tick(&self, host: &mut dyn Host) {
        let engines: Vec<Rc<RefCell<Engine>>> = self.inner.borrow().engines.clone();
        let now = host.now_ms();

        // Offsets cached per source for the duration of the tick; a failed
        // resolution is cached too so the source is queried exactly once.
        let mut offsets: BTreeMap<ScrollSource, Option<Vec2>> = BTreeMap::new();
        let mut computed: Vec<bool> = Vec::with_capacity(engines.len());

        for engine in &engines {
            let mut engine = engine.borrow_mut();
            if !engine.active {
                computed.push(false);
                continue;
            }

            let offset = match offsets.entry(engine.scroll_source.clone()) {
                Entry::Occupied(cached) => *cached.get(),
                Entry::Vacant(slot) => {
                    let resolved = host.scroll_offset(slot.key());
                    if let Err(error) = &resolved {
                        tracing::error!(%error, source = ?slot.key(), "scroll source failed");
                    }
                    *slot.insert(resolved.ok())
                }
            };
            let Some(offset) = offset else {
                computed.push(false);
                continue;
            };

            let vars: BTreeMap<String, f64> = engine
                .variables
                .iter()
                .map(|(name, f)| (name.clone(), f()))
                .collect();

            match engine.compute(offset, vars, now) {
                Ok(()) => computed.push(true),
                Err(error) => {
                    tracing::error!(%error, "compute phase failed");
                    computed.push(false);
                }
            }
        }

        for (engine, ok) in engines.iter().zip(computed) {
            if ok {
                engine.borrow_mut().apply();
            }
        }
    }

    /// Drives [`tick`](Runtime::tick) for as long as the scheduler keeps
    /// granting frames.
    pub fn run(&self, host: &mut dyn Host, scheduler: &mut dyn FrameScheduler) {
        while scheduler.next_frame() {
            self.tick(host);
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("engines", &self.registered())
            .finish()
    }
}

use std::{cell::Cell, collections::BTreeMap, fmt};

use smallvec::SmallVec;

use crate::error::ScrollmorphResult;

/// Driving-signal arguments a descriptor function can declare.
///
/// The declared list replaces runtime parameter inspection: a descriptor is
/// re-invoked only when one of its declared signals changed (see
/// [`Descriptor`] for the exact rules).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Arg {
    /// Horizontal scroll offset.
    X,
    /// Vertical scroll offset.
    Y,
    /// Frame index. Declaring it opts a descriptor into running every cycle.
    I,
    LastX,
    LastY,
    /// The in-flight action progress map.
    Actions,
    /// A custom per-engine variable registered with
    /// [`crate::Transformer::set_variable`].
    Var(String),
}

impl Arg {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }
}

/// Read-only view over the current cycle's signal snapshot, handed to
/// descriptor functions on invocation.
#[derive(Clone, Copy, Debug)]
pub struct Args<'a> {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) i: u64,
    pub(crate) last_x: f64,
    pub(crate) last_y: f64,
    pub(crate) actions: &'a BTreeMap<String, f64>,
    pub(crate) vars: &'a BTreeMap<String, f64>,
}

impl Args<'_> {
    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn i(&self) -> u64 {
        self.i
    }

    pub fn last_x(&self) -> f64 {
        self.last_x
    }

    pub fn last_y(&self) -> f64 {
        self.last_y
    }

    /// Progress of the named in-flight action, 0 to 1.
    pub fn action(&self, name: &str) -> Option<f64> {
        self.actions.get(name).copied()
    }

    pub fn actions(&self) -> &BTreeMap<String, f64> {
        self.actions
    }

    pub fn var(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }
}

/// Raw result of a descriptor function, before rounding and unit suffixing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Num(f64),
    Text(String),
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Channel-diff result: either a value to apply this cycle, or the
/// distinguished marker that the channel needs no write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Computed {
    Changed(String),
    Unchanged,
}

/// A user-supplied channel compute function plus its declared arguments.
///
/// Invocation rules, evaluated each cycle:
/// - always invoked the first time (no cached value exists yet);
/// - always invoked if [`Arg::I`] is declared;
/// - invoked if [`Arg::Actions`] is declared and any action is in flight
///   (an action completing this cycle is still present at progress 1);
/// - otherwise invoked only if a declared `X`, `Y`, or `Var` changed since
///   the previous cycle.
///
/// Functions are assumed pure with respect to their declared arguments; a
/// function that must run every cycle declares `I`. This is a documented
/// contract, not enforced.
pub struct Descriptor {
    args: SmallVec<[Arg; 4]>,
    compute: Box<dyn Fn(&Args<'_>) -> ScrollmorphResult<Value>>,
    invoked: Cell<bool>,
}

impl Descriptor {
    /// Descriptor computing a numeric channel value.
    pub fn new(
        args: impl IntoIterator<Item = Arg>,
        f: impl Fn(&Args<'_>) -> f64 + 'static,
    ) -> Self {
        Self::fallible(args, move |a| Ok(Value::Num(f(a))))
    }

    /// Descriptor computing a textual channel value (no rounding applied).
    pub fn text(
        args: impl IntoIterator<Item = Arg>,
        f: impl Fn(&Args<'_>) -> String + 'static,
    ) -> Self {
        Self::fallible(args, move |a| Ok(Value::Text(f(a))))
    }

    pub fn fallible(
        args: impl IntoIterator<Item = Arg>,
        f: impl Fn(&Args<'_>) -> ScrollmorphResult<Value> + 'static,
    ) -> Self {
        Self {
            args: args.into_iter().collect(),
            compute: Box::new(f),
            invoked: Cell::new(false),
        }
    }

    fn declares(&self, arg: &Arg) -> bool {
        self.args.contains(arg)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("args", &self.args)
            .field("invoked", &self.invoked.get())
            .finish()
    }
}

/// Which channel category a value is computed for; selects the rounding
/// precision together with the channel name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Category {
    Transforms,
    Styles,
    Attrs,
}

/// Signal snapshot plus the previous cycle's values, as seen by the planner.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Signals<'a> {
    pub x: f64,
    pub y: f64,
    pub i: u64,
    pub last_x: f64,
    pub last_y: f64,
    pub actions: &'a BTreeMap<String, f64>,
    pub vars: &'a BTreeMap<String, f64>,
    pub last_vars: &'a BTreeMap<String, f64>,
}

/// Decides whether the descriptor must run this cycle and, if so, invokes
/// it and renders the result (rounding + unit suffix).
pub(crate) fn plan_call(
    category: Category,
    name: &str,
    unit: &str,
    descriptor: &Descriptor,
    signals: &Signals<'_>,
) -> ScrollmorphResult<Computed> {
    let mut should_call = !descriptor.invoked.get();

    if !should_call && descriptor.declares(&Arg::I) {
        should_call = true;
    }

    if !should_call && descriptor.declares(&Arg::Actions) && !signals.actions.is_empty() {
        should_call = true;
    }

    if !should_call {
        should_call = descriptor.args.iter().any(|arg| match arg {
            Arg::X => signals.x != signals.last_x,
            Arg::Y => signals.y != signals.last_y,
            Arg::Var(name) => {
                signals.vars.get(name).copied() != signals.last_vars.get(name).copied()
            }
            Arg::I | Arg::LastX | Arg::LastY | Arg::Actions => false,
        });
    }

    if !should_call {
        return Ok(Computed::Unchanged);
    }

    descriptor.invoked.set(true);
    let args = Args {
        x: signals.x,
        y: signals.y,
        i: signals.i,
        last_x: signals.last_x,
        last_y: signals.last_y,
        actions: signals.actions,
        vars: signals.vars,
    };
    let value = (descriptor.compute)(&args)?;
    Ok(Computed::Changed(render_value(category, name, unit, value)))
}

/// Decimal places used when rounding a numeric channel value.
fn decimal_places(category: Category, name: &str) -> i32 {
    match (category, name) {
        (Category::Transforms, "rotate") => 1,
        (Category::Transforms, "scale") => 3,
        (Category::Transforms, "translate") => 1,
        (Category::Styles, "opacity") => 2,
        _ => 3,
    }
}

fn render_value(category: Category, name: &str, unit: &str, value: Value) -> String {
    match value {
        Value::Num(n) => {
            let pow = 10f64.powi(decimal_places(category, name));
            let mut rounded = (n * pow).round() / pow;
            if rounded == 0.0 {
                rounded = 0.0; // avoid a "-0" rendering
            }
            format!("{rounded}{unit}")
        }
        Value::Text(s) => format!("{s}{unit}"),
    }
}

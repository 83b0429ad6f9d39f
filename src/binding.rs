use std::{collections::BTreeMap, fmt};

use smallvec::SmallVec;

use crate::{
    descriptor::{Computed, Descriptor},
    target::TargetRef,
};

/// Declarative association between one visual target (or a homogeneous
/// group) and the channels driven on it: transform ops, style properties,
/// and attributes, plus an optional private visible range on the vertical
/// scroll signal.
///
/// Built fluently:
///
/// ```ignore
/// Binding::new(target)
///     .transform("scale", "", Descriptor::new([Arg::Y], |a| 1.0 + a.y() / 1000.0))
///     .style("opacity", "", Descriptor::new([Arg::Y], |a| map_range([0.0, 400.0], [1.0, 0.0], a.y())))
///     .visible_between(0.0, 2000.0)
/// ```
pub struct Binding {
    pub(crate) targets: Vec<TargetRef>,
    pub(crate) transforms: Vec<TransformOp>,
    pub(crate) styles: Vec<ChannelOp>,
    pub(crate) attrs: Vec<ChannelOp>,
    pub(crate) visible: Option<[f64; 2]>,
    pub(crate) staged: StagedData,
    pub(crate) last: AppliedData,
}

impl Binding {
    pub fn new(target: TargetRef) -> Self {
        Self::group([target])
    }

    pub fn group(targets: impl IntoIterator<Item = TargetRef>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            transforms: Vec::new(),
            styles: Vec::new(),
            attrs: Vec::new(),
            visible: None,
            staged: StagedData::default(),
            last: AppliedData::default(),
        }
    }

    /// Adds a transform op; ops concatenate as `prop(value)` fragments in
    /// declaration order, appended to the target's original transform.
    pub fn transform(
        mut self,
        prop: impl Into<String>,
        unit: impl Into<String>,
        descriptor: Descriptor,
    ) -> Self {
        self.transforms.push(TransformOp {
            prop: prop.into(),
            unit: unit.into(),
            descriptor,
            last_piece: None,
        });
        self
    }

    pub fn style(
        self,
        name: impl Into<String>,
        unit: impl Into<String>,
        descriptor: Descriptor,
    ) -> Self {
        self.style_multi([name], unit, descriptor)
    }

    /// Style channel fanning out one computed value to several property
    /// names (e.g. vendor-prefixed variants). Diffing is keyed on the
    /// first name.
    pub fn style_multi<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
        unit: impl Into<String>,
        descriptor: Descriptor,
    ) -> Self {
        let names: SmallVec<[String; 2]> = names.into_iter().map(Into::into).collect();
        debug_assert!(!names.is_empty(), "style channel needs at least one name");
        self.styles.push(ChannelOp {
            names,
            unit: unit.into(),
            descriptor,
        });
        self
    }

    pub fn attr(
        self,
        name: impl Into<String>,
        unit: impl Into<String>,
        descriptor: Descriptor,
    ) -> Self {
        self.attr_multi([name], unit, descriptor)
    }

    pub fn attr_multi<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
        unit: impl Into<String>,
        descriptor: Descriptor,
    ) -> Self {
        let names: SmallVec<[String; 2]> = names.into_iter().map(Into::into).collect();
        debug_assert!(!names.is_empty(), "attr channel needs at least one name");
        self.attrs.push(ChannelOp {
            names,
            unit: unit.into(),
            descriptor,
        });
        self
    }

    /// Restricts this binding to vertical scroll positions in `[min, max]`;
    /// outside the range the targets are hidden and no descriptors run.
    pub fn visible_between(mut self, min: f64, max: f64) -> Self {
        self.visible = Some([min, max]);
        self
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("targets", &self.targets.len())
            .field("transforms", &self.transforms)
            .field("styles", &self.styles)
            .field("attrs", &self.attrs)
            .field("visible", &self.visible)
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct TransformOp {
    pub(crate) prop: String,
    pub(crate) unit: String,
    pub(crate) descriptor: Descriptor,
    /// Last rendered `prop(value)` fragment, reused when the planner skips
    /// this op so the joined string can still be rebuilt.
    pub(crate) last_piece: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ChannelOp {
    pub(crate) names: SmallVec<[String; 2]>,
    pub(crate) unit: String,
    pub(crate) descriptor: Descriptor,
}

impl ChannelOp {
    pub(crate) fn primary(&self) -> &str {
        &self.names[0]
    }
}

/// Values computed this cycle, not yet applied. `hidden` is `None` when no
/// visibility range applies to the binding at all.
#[derive(Debug, Default)]
pub(crate) struct StagedData {
    pub(crate) hidden: Option<bool>,
    pub(crate) transforms: Option<Computed>,
    pub(crate) styles: BTreeMap<String, Computed>,
    pub(crate) attrs: BTreeMap<String, Computed>,
}

/// Values as applied in previous cycles; the diffing baseline. Updated only
/// for channels whose staged value is `Changed`.
#[derive(Debug, Default)]
pub(crate) struct AppliedData {
    pub(crate) transforms: Option<String>,
    pub(crate) styles: BTreeMap<String, String>,
    pub(crate) attrs: BTreeMap<String, String>,
}

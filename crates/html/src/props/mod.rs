//! Bit-packed formatting properties.
//!
//! Leaf value types: [`PropertyValue`] packs one typed value into 32 bits,
//! [`FlagProperties`] holds on/off flags with a defined bit each, and
//! [`PropertyBitMask`] records which valued properties a [`PropertySet`]
//! carries. The normalizer keeps one set per open element to decide which
//! formatting must be reopened after a misnested end tag.

mod flags;
mod mask;
mod value;

pub use flags::{FlagProperties, PropertyFlag};
pub use mask::{PropertyBitMask, PropertyId};
pub use value::{PropertyType, PropertyValue};

/// Flags plus valued properties of one element, or the effective
/// properties at a point in the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertySet {
    pub flags: FlagProperties,
    mask: PropertyBitMask,
    values: [PropertyValue; PropertyId::COUNT],
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.mask.is_empty()
    }

    pub fn mask(&self) -> PropertyBitMask {
        self.mask
    }

    pub fn set(&mut self, id: PropertyId, value: PropertyValue) {
        self.mask.insert(id);
        self.values[id.index()] = value;
    }

    pub fn get(&self, id: PropertyId) -> Option<PropertyValue> {
        self.mask.contains(id).then(|| self.values[id.index()])
    }

    pub fn clear(&mut self, id: PropertyId) {
        self.mask.remove(id);
        self.values[id.index()] = PropertyValue::NULL;
    }

    /// Override composition: everything `over` defines replaces `self`.
    pub fn merge(&self, over: &PropertySet) -> PropertySet {
        let mut merged = *self;
        merged.flags = self.flags.merge(over.flags);
        for id in over.mask.iter() {
            merged.set(id, over.values[id.index()]);
        }
        merged
    }

    /// Whether everything `self` defines holds in `effective`.
    pub fn is_effective_in(&self, effective: &PropertySet) -> bool {
        self.flags.is_subset_of(effective.flags)
            && self
                .mask
                .iter()
                .all(|id| effective.get(id) == Some(self.values[id.index()]))
    }
}

//! Set membership for valued properties.

use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Valued (non-flag) properties tracked per element.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyId {
    FontColor = 0,
    FontSize,
    FontFace,
    BackgroundColor,
    TextAlignment,
    Direction,
    Width,
    Height,
    BorderWidth,
    CellPadding,
    CellSpacing,
}

impl PropertyId {
    pub const COUNT: usize = 11;

    pub const ALL: [PropertyId; Self::COUNT] = [
        PropertyId::FontColor,
        PropertyId::FontSize,
        PropertyId::FontFace,
        PropertyId::BackgroundColor,
        PropertyId::TextAlignment,
        PropertyId::Direction,
        PropertyId::Width,
        PropertyId::Height,
        PropertyId::BorderWidth,
        PropertyId::CellPadding,
        PropertyId::CellSpacing,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertyBitMask(u32);

const ALL_BITS: u32 = (1 << PropertyId::COUNT) - 1;

impl PropertyBitMask {
    pub const EMPTY: PropertyBitMask = PropertyBitMask(0);
    pub const ALL: PropertyBitMask = PropertyBitMask(ALL_BITS);

    pub fn of(ids: &[PropertyId]) -> Self {
        ids.iter().fold(Self::EMPTY, |mask, id| mask | Self::from(*id))
    }

    pub fn contains(self, id: PropertyId) -> bool {
        self.0 & (1 << id as u32) != 0
    }

    pub fn insert(&mut self, id: PropertyId) {
        self.0 |= 1 << id as u32;
    }

    pub fn remove(&mut self, id: PropertyId) {
        self.0 &= !(1 << id as u32);
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = PropertyId> {
        PropertyId::ALL
            .into_iter()
            .filter(move |id| self.contains(*id))
    }
}

impl From<PropertyId> for PropertyBitMask {
    fn from(id: PropertyId) -> Self {
        PropertyBitMask(1 << id as u32)
    }
}

impl BitOr for PropertyBitMask {
    type Output = PropertyBitMask;

    fn bitor(self, rhs: Self) -> Self {
        PropertyBitMask(self.0 | rhs.0)
    }
}

impl BitAnd for PropertyBitMask {
    type Output = PropertyBitMask;

    fn bitand(self, rhs: Self) -> Self {
        PropertyBitMask(self.0 & rhs.0)
    }
}

impl BitXor for PropertyBitMask {
    type Output = PropertyBitMask;

    fn bitxor(self, rhs: Self) -> Self {
        PropertyBitMask(self.0 ^ rhs.0)
    }
}

impl Not for PropertyBitMask {
    type Output = PropertyBitMask;

    fn not(self) -> Self {
        PropertyBitMask(!self.0 & ALL_BITS)
    }
}

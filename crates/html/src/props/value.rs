//! 32-bit packed property values.

use std::fmt;

/// Kind tag stored in the top 5 bits of a [`PropertyValue`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyType {
    Null = 0,
    Calculated,
    Bool,
    /// Handle into a string table (an atom id).
    String,
    MultiValue,
    Enum,
    /// `0xRRGGBB`.
    Color,
    Integer,
    /// Fixed point, 1/10000 units.
    Fractional,
    /// Fixed point, 1/10000 percent.
    Percentage,
    /// Twips.
    AbsLength,
    RelLength,
    Pixels,
    /// Fixed point, 1/100 em.
    Ems,
    /// Fixed point, 1/100 ex.
    Exs,
    /// HTML `<font size>` 1..=7.
    HtmlFontUnits,
    /// HTML `<font size="+n">` -7..=7.
    RelHtmlFontUnits,
    Multiple,
    Milliseconds,
    KHz,
    Degrees,
}

impl PropertyType {
    const ALL: [PropertyType; 21] = [
        PropertyType::Null,
        PropertyType::Calculated,
        PropertyType::Bool,
        PropertyType::String,
        PropertyType::MultiValue,
        PropertyType::Enum,
        PropertyType::Color,
        PropertyType::Integer,
        PropertyType::Fractional,
        PropertyType::Percentage,
        PropertyType::AbsLength,
        PropertyType::RelLength,
        PropertyType::Pixels,
        PropertyType::Ems,
        PropertyType::Exs,
        PropertyType::HtmlFontUnits,
        PropertyType::RelHtmlFontUnits,
        PropertyType::Multiple,
        PropertyType::Milliseconds,
        PropertyType::KHz,
        PropertyType::Degrees,
    ];

    fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Signed kinds sign-extend their 27-bit payload.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PropertyType::Integer
                | PropertyType::Fractional
                | PropertyType::Percentage
                | PropertyType::AbsLength
                | PropertyType::RelLength
                | PropertyType::Pixels
                | PropertyType::Ems
                | PropertyType::Exs
                | PropertyType::RelHtmlFontUnits
                | PropertyType::Degrees
        )
    }

    /// Inclusive payload range for this kind.
    pub fn payload_range(self) -> (i64, i64) {
        match self {
            PropertyType::Null | PropertyType::Calculated => (0, 0),
            PropertyType::Bool => (0, 1),
            PropertyType::Color => (0, 0x00FF_FFFF),
            PropertyType::HtmlFontUnits => (1, 7),
            PropertyType::RelHtmlFontUnits => (-7, 7),
            ty if ty.is_signed() => (MIN_SIGNED as i64, MAX_SIGNED as i64),
            _ => (0, PAYLOAD_MASK as i64),
        }
    }
}

pub const TYPE_SHIFT: u32 = 27;
pub const PAYLOAD_MASK: u32 = (1 << TYPE_SHIFT) - 1;
pub const MAX_SIGNED: i32 = (1 << (TYPE_SHIFT - 1)) - 1;
pub const MIN_SIGNED: i32 = -(1 << (TYPE_SHIFT - 1));

/// `{5-bit type, 27-bit payload}` packed into a `u32`.
///
/// Equality and ordering compare the raw packed word: values of different
/// kinds order by kind first, and negative signed payloads order above
/// positive ones of the same kind.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PropertyValue(u32);

impl PropertyValue {
    pub const NULL: PropertyValue = PropertyValue(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Pack a payload, which must be in [`PropertyType::payload_range`].
    pub fn new(ty: PropertyType, payload: i32) -> Self {
        let (min, max) = ty.payload_range();
        debug_assert!(
            (min..=max).contains(&(payload as i64)),
            "payload {payload} out of range for {ty:?}"
        );
        Self(((ty as u32) << TYPE_SHIFT) | (payload as u32 & PAYLOAD_MASK))
    }

    /// Pack a payload, or `None` when it is out of range for `ty`.
    pub fn checked(ty: PropertyType, payload: i64) -> Option<Self> {
        let (min, max) = ty.payload_range();
        (min..=max)
            .contains(&payload)
            .then(|| Self::new(ty, payload as i32))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(PropertyType::Bool, value as i32)
    }

    pub fn color(rgb: u32) -> Self {
        Self::new(PropertyType::Color, (rgb & 0x00FF_FFFF) as i32)
    }

    pub fn string_handle(handle: u32) -> Self {
        Self::new(PropertyType::String, (handle & PAYLOAD_MASK) as i32)
    }

    pub fn enumeration(value: u32) -> Self {
        Self::new(PropertyType::Enum, (value & PAYLOAD_MASK) as i32)
    }

    pub fn pixels(value: i32) -> Self {
        Self::new(PropertyType::Pixels, value.clamp(MIN_SIGNED, MAX_SIGNED))
    }

    pub fn percentage(percent: i32) -> Self {
        Self::new(
            PropertyType::Percentage,
            percent.saturating_mul(10_000).clamp(MIN_SIGNED, MAX_SIGNED),
        )
    }

    pub fn ty(self) -> PropertyType {
        PropertyType::from_tag(self.0 >> TYPE_SHIFT).unwrap_or(PropertyType::Null)
    }

    pub fn is_null(self) -> bool {
        self.ty() == PropertyType::Null
    }

    /// Payload, sign-extended for signed kinds.
    pub fn payload(self) -> i32 {
        let bits = self.0 & PAYLOAD_MASK;
        if self.ty().is_signed() {
            ((bits << (32 - TYPE_SHIFT)) as i32) >> (32 - TYPE_SHIFT)
        } else {
            bits as i32
        }
    }

    pub fn as_color(self) -> Option<u32> {
        (self.ty() == PropertyType::Color).then(|| self.payload() as u32)
    }

    pub fn as_bool(self) -> Option<bool> {
        (self.ty() == PropertyType::Bool).then(|| self.payload() != 0)
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty() {
            PropertyType::Null => f.write_str("Null"),
            PropertyType::Color => write!(f, "Color(#{:06x})", self.payload()),
            ty => write!(f, "{ty:?}({})", self.payload()),
        }
    }
}

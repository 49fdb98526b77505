//! On/off formatting flags with a separate "defined" state.

/// Flag properties. Each flag is either undefined (inherits) or defined as
/// on or off.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyFlag {
    Bold = 0,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
    /// Monospace (`tt`, `code`, `kbd`, `samp`).
    Fixed,
    Small,
    Big,
    NoWrap,
    Preformatted,
    Blink,
}

impl PropertyFlag {
    pub const COUNT: usize = 12;

    pub const ALL: [PropertyFlag; Self::COUNT] = [
        PropertyFlag::Bold,
        PropertyFlag::Italic,
        PropertyFlag::Underline,
        PropertyFlag::Strikethrough,
        PropertyFlag::Subscript,
        PropertyFlag::Superscript,
        PropertyFlag::Fixed,
        PropertyFlag::Small,
        PropertyFlag::Big,
        PropertyFlag::NoWrap,
        PropertyFlag::Preformatted,
        PropertyFlag::Blink,
    ];

    fn defined_bit(self) -> u32 {
        1 << (2 * self as u32)
    }

    fn value_bit(self) -> u32 {
        1 << (2 * self as u32 + 1)
    }
}

/// Two bits per flag: bit `2i` is "defined", bit `2i + 1` is the value.
///
/// Invariant: a value bit is only set when its defined bit is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlagProperties(u32);

const DEFINED_BITS: u32 = 0x5555_5555;

impl FlagProperties {
    pub const EMPTY: FlagProperties = FlagProperties(0);

    pub fn from_flags(on: &[PropertyFlag]) -> Self {
        let mut flags = Self::EMPTY;
        for flag in on {
            flags.set(*flag, true);
        }
        flags
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn set(&mut self, flag: PropertyFlag, on: bool) {
        self.0 |= flag.defined_bit();
        if on {
            self.0 |= flag.value_bit();
        } else {
            self.0 &= !flag.value_bit();
        }
    }

    pub fn undefine(&mut self, flag: PropertyFlag) {
        self.0 &= !(flag.defined_bit() | flag.value_bit());
    }

    pub fn get(self, flag: PropertyFlag) -> Option<bool> {
        (self.0 & flag.defined_bit() != 0).then_some(self.0 & flag.value_bit() != 0)
    }

    pub fn is_on(self, flag: PropertyFlag) -> bool {
        self.get(flag) == Some(true)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Both bits of every defined flag.
    fn defined_mask(self) -> u32 {
        let defined = self.0 & DEFINED_BITS;
        defined | (defined << 1)
    }

    /// Override composition: flags defined in `over` replace those of
    /// `self`; everything else survives from `self`.
    pub fn merge(self, over: FlagProperties) -> FlagProperties {
        let mask = over.defined_mask();
        FlagProperties((self.0 & !mask) | (over.0 & mask))
    }

    /// Flags of `self` that `other` also defines.
    pub fn intersect(self, other: FlagProperties) -> FlagProperties {
        FlagProperties(self.0 & other.defined_mask())
    }

    /// Flags of `self` that `other` does not define.
    pub fn subtract(self, other: FlagProperties) -> FlagProperties {
        FlagProperties(self.0 & !other.defined_mask())
    }

    /// Flags defined in either side whose state differs, with `self`'s
    /// state. A flag `self` leaves undefined shows up as undefined.
    pub fn xor(self, other: FlagProperties) -> FlagProperties {
        let mut diff = FlagProperties::EMPTY;
        for flag in PropertyFlag::ALL {
            let mine = self.get(flag);
            if mine != other.get(flag)
                && let Some(on) = mine
            {
                diff.set(flag, on);
            }
        }
        diff
    }

    /// Every defined flag inverted; undefined flags stay undefined.
    pub fn complement(self) -> FlagProperties {
        let defined = self.0 & DEFINED_BITS;
        FlagProperties(self.0 ^ (defined << 1))
    }

    /// Whether every flag defined in `self` has the same state in `effective`.
    pub fn is_subset_of(self, effective: FlagProperties) -> bool {
        effective.intersect(self) == self
    }

    pub fn iter_defined(self) -> impl Iterator<Item = (PropertyFlag, bool)> {
        PropertyFlag::ALL
            .into_iter()
            .filter_map(move |flag| self.get(flag).map(|on| (flag, on)))
    }
}

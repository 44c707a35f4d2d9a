//! Entity bitmap addressing.
//!
//! The low twelve bits name single entities: bits 0-7 are the diagonal
//! columns and bits 8-11 the side panels. The high bits are reserved for
//! future entities and are only ever set by the all-call address.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

use crate::error::Result;
use crate::field::u16_field;

/// A 16-bit mask selecting zero or more entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct EntityMask(u16);

impl EntityMask {
    /// Addresses nothing. Legal on the wire, but inert.
    pub const NONE: Self = Self(0x0000);
    /// All-call address.
    pub const ALL: Self = Self(0xFFFF);
    /// Every diagonal column.
    pub const DIAGS: Self = Self(0x00FF);
    /// Every side panel (the bottom edges).
    pub const SIDES: Self = Self(0x0F00);

    pub const DIAG_0: Self = Self(0x0001);
    pub const DIAG_1: Self = Self(0x0002);
    pub const DIAG_2: Self = Self(0x0004);
    pub const DIAG_3: Self = Self(0x0008);
    pub const DIAG_4: Self = Self(0x0010);
    pub const DIAG_5: Self = Self(0x0020);
    pub const DIAG_6: Self = Self(0x0040);
    pub const DIAG_7: Self = Self(0x0080);
    pub const LEFT: Self = Self(0x0100);
    pub const BACK: Self = Self(0x0200);
    pub const RIGHT: Self = Self(0x0400);
    pub const FRONT: Self = Self(0x0800);

    /// Script-visible names, groups first so `Display` prefers them.
    pub const NAMED: [(&'static str, Self); 15] = [
        ("ALL", Self::ALL),
        ("DIAGS", Self::DIAGS),
        ("SIDES", Self::SIDES),
        ("E_DIAG_0", Self::DIAG_0),
        ("E_DIAG_1", Self::DIAG_1),
        ("E_DIAG_2", Self::DIAG_2),
        ("E_DIAG_3", Self::DIAG_3),
        ("E_DIAG_4", Self::DIAG_4),
        ("E_DIAG_5", Self::DIAG_5),
        ("E_DIAG_6", Self::DIAG_6),
        ("E_DIAG_7", Self::DIAG_7),
        ("E_LEFT", Self::LEFT),
        ("E_BACK", Self::BACK),
        ("E_RIGHT", Self::RIGHT),
        ("E_FRONT", Self::FRONT),
    ];

    /// Wrap raw mask bits.
    pub const fn from_raw(bits: u16) -> Self {
        Self(bits)
    }

    /// Validate caller-supplied mask bits.
    pub fn from_bits(bits: i64) -> Result<Self> {
        u16_field("bitmap", bits).map(Self)
    }

    /// The diagonal column with the given index (0-7).
    pub fn diag(index: u8) -> Option<Self> {
        (index < 8).then(|| Self(1 << index))
    }

    /// Look up a named mask.
    pub fn by_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, mask)| *mask)
    }

    /// Raw mask bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True when no entity is addressed.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every entity in `other` is also in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn lo(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }
}

impl BitOr for EntityMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntityMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<u16> for EntityMask {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl fmt::Display for EntityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMED.iter().find(|(_, mask)| mask == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

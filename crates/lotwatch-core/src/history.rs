//! Packed vehicle history.
//!
//! Bit layout (low to high):
//!
//! | bits  | meaning                         |
//! |-------|---------------------------------|
//! | 0     | accident reported               |
//! | 1     | frame damage                    |
//! | 2     | salvage title                   |
//! | 3     | lemon history                   |
//! | 4     | theft recovery                  |
//! | 5     | fleet use                       |
//! | 6     | rental use                      |
//! | 7     | certified pre-owned             |
//! | 12-15 | previous owners, saturating at 15 |

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HistoryFlags(u16);

impl HistoryFlags {
  pub const ACCIDENT: Self = Self(1 << 0);
  pub const FRAME_DAMAGE: Self = Self(1 << 1);
  pub const SALVAGE: Self = Self(1 << 2);
  pub const LEMON: Self = Self(1 << 3);
  pub const THEFT: Self = Self(1 << 4);
  pub const FLEET: Self = Self(1 << 5);
  pub const RENTAL: Self = Self(1 << 6);
  pub const CERTIFIED: Self = Self(1 << 7);

  const OWNER_SHIFT: u16 = 12;
  const OWNER_MASK: u16 = 0xF << Self::OWNER_SHIFT;
  pub const MAX_OWNERS: u8 = 15;

  pub const fn empty() -> Self { Self(0) }

  pub const fn bits(self) -> u16 { self.0 }

  pub const fn from_bits(bits: u16) -> Self { Self(bits) }

  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }

  pub fn insert(&mut self, other: Self) { self.0 |= other.0; }

  pub fn set(&mut self, other: Self, on: bool) {
    if on {
      self.0 |= other.0;
    } else {
      self.0 &= !other.0;
    }
  }

  pub const fn owners(self) -> u8 {
    ((self.0 & Self::OWNER_MASK) >> Self::OWNER_SHIFT) as u8
  }

  /// Record the owner count, saturating at [`Self::MAX_OWNERS`].
  pub fn with_owners(mut self, owners: u32) -> Self {
    let owners = owners.min(Self::MAX_OWNERS as u32) as u16;
    self.0 = (self.0 & !Self::OWNER_MASK) | (owners << Self::OWNER_SHIFT);
    self
  }
}

impl BitOr for HistoryFlags {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

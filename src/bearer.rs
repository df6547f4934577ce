//! Bearer technologies and the bitmask sets that select them.
//!
//! A context is created with a [`BearerSet`] naming the technologies its
//! connection is allowed to ride on; the manager only attempts connectors
//! whose bearer is in the set.
//!
//! 承载技术及选择它们的位掩码集合。
//!
//! 上下文在创建时带有一个 [`BearerSet`]，指明其连接允许使用的技术；
//! 管理器只会尝试承载在该集合内的连接器。

use crate::error::{Error, Result};
use std::fmt;
use std::ops::BitOr;

/// A bearer technology a connection may ride on.
///
/// The discriminants are the stable bits used by [`BearerSet`].
///
/// 连接可以依托的承载技术。判别值是 [`BearerSet`] 使用的稳定位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Bearer {
    Ethernet = 1 << 1,
    Wifi = 1 << 2,
    Cellular = 1 << 3,
    Wimax = 1 << 4,
    Bluetooth = 1 << 5,
    Usb = 1 << 6,
}

impl Bearer {
    /// All bearers, in bit order.
    pub const ALL: [Bearer; 6] = [
        Bearer::Ethernet,
        Bearer::Wifi,
        Bearer::Cellular,
        Bearer::Wimax,
        Bearer::Bluetooth,
        Bearer::Usb,
    ];

    /// The bit this bearer occupies in a [`BearerSet`].
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// The canonical name of this bearer.
    /// 该承载的规范名称。
    pub const fn as_str(self) -> &'static str {
        match self {
            Bearer::Ethernet => "ethernet",
            Bearer::Wifi => "wifi",
            Bearer::Cellular => "cellular",
            Bearer::Wimax => "wimax",
            Bearer::Bluetooth => "bluetooth",
            Bearer::Usb => "usb",
        }
    }

    /// Looks a bearer up by its canonical name. Unknown names yield `None`.
    /// 按规范名称查找承载。未知名称返回 `None`。
    pub fn from_name(name: &str) -> Option<Bearer> {
        Bearer::ALL.into_iter().find(|b| b.as_str() == name)
    }
}

impl fmt::Display for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated set of permitted bearers.
///
/// Bit 0 is the wildcard permitting any bearer; bits 1 through 6 select the
/// concrete technologies. Sets are built from [`Bearer`] values with `|`,
/// from [`BearerSet::ANY`], or from a raw mask via [`BearerSet::from_bits`].
///
/// 经过验证的允许承载集合。
///
/// 第0位是允许任意承载的通配位；第1至6位选择具体技术。集合可通过对
/// [`Bearer`] 值使用 `|`、通过 [`BearerSet::ANY`] 或经
/// [`BearerSet::from_bits`] 从原始掩码构建。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BearerSet(u32);

impl BearerSet {
    const ANY_BIT: u32 = 1 << 0;
    const VALID_MASK: u32 = 0b111_1111;

    /// The set permitting every bearer.
    /// 允许所有承载的集合。
    pub const ANY: BearerSet = BearerSet(Self::ANY_BIT);

    /// Builds a set from a raw bitmask.
    ///
    /// Empty masks and masks with undefined bits are rejected with
    /// [`Error::InvalidBearerMask`].
    ///
    /// 从原始位掩码构建集合。空掩码或带有未定义位的掩码会以
    /// [`Error::InvalidBearerMask`] 被拒绝。
    pub fn from_bits(bits: u32) -> Result<BearerSet> {
        if bits == 0 || bits & !Self::VALID_MASK != 0 {
            return Err(Error::InvalidBearerMask);
        }
        Ok(BearerSet(bits))
    }

    /// The raw bitmask of this set.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the wildcard bit is set.
    pub const fn is_any(self) -> bool {
        self.0 & Self::ANY_BIT != 0
    }

    /// Whether `bearer` is permitted by this set.
    /// 该集合是否允许 `bearer`。
    pub fn contains(self, bearer: Bearer) -> bool {
        self.is_any() || self.0 & bearer.bit() != 0
    }

    /// Iterates over the concrete bearers named by this set.
    ///
    /// The wildcard set names no concrete bearer and yields nothing.
    ///
    /// 迭代该集合指名的具体承载。通配集合不指名具体承载，因此不产生任何项。
    pub fn iter(self) -> impl Iterator<Item = Bearer> {
        Bearer::ALL
            .into_iter()
            .filter(move |b| self.0 & b.bit() != 0)
    }
}

impl From<Bearer> for BearerSet {
    fn from(bearer: Bearer) -> Self {
        BearerSet(bearer.bit())
    }
}

impl BitOr for Bearer {
    type Output = BearerSet;

    fn bitor(self, rhs: Bearer) -> BearerSet {
        BearerSet(self.bit() | rhs.bit())
    }
}

impl BitOr<Bearer> for BearerSet {
    type Output = BearerSet;

    fn bitor(self, rhs: Bearer) -> BearerSet {
        BearerSet(self.0 | rhs.bit())
    }
}

impl BitOr for BearerSet {
    type Output = BearerSet;

    fn bitor(self, rhs: BearerSet) -> BearerSet {
        BearerSet(self.0 | rhs.0)
    }
}

impl fmt::Display for BearerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str("*");
        }
        let mut first = true;
        for bearer in self.iter() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(bearer.as_str())?;
            first = false;
        }
        Ok(())
    }
}

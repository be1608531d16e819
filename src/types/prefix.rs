use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use inetnum::addr::Prefix as InetPrefix;

use crate::error::ExplorerError;

//------------ Family ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    fn max_len(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    // IPv4 addresses are kept in the high 32 bits of the 128-bit field so
    // that bit indices always count from the top regardless of family.
    fn shift(self) -> u32 {
        match self {
            Family::V4 => 96,
            Family::V6 => 0,
        }
    }
}

//------------ PrefixId --------------------------------------------------------

/// The internal, radix-tree-friendly prefix representation: cut down to a
/// family tag plus a canonicalized bit pattern, as not to waste time
/// re-parsing text on every trie step. The public API (reports, JSON, HTTP
/// paths) uses `inetnum::addr::Prefix` instead; the two convert losslessly
/// into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefixId {
    family: Family,
    // Network bits, left-justified in a 128-bit field, host bits zeroed.
    bits: u128,
    len: u8,
}

impl PrefixId {
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, ExplorerError> {
        let family = match addr {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        };
        let max_len = family.max_len();
        if len > max_len {
            return Err(ExplorerError::BadInput(format!(
                "prefix length {len} exceeds {max_len} bits for {addr}"
            )));
        }
        let raw: u128 = match addr {
            IpAddr::V4(a) => u32::from(a) as u128,
            IpAddr::V6(a) => u128::from(a),
        };
        let bits = Self::mask(raw << family.shift(), family.shift() + len as u32);
        Ok(Self { family, bits, len })
    }

    /// Parse text of the form `addr` or `addr/len` (bare addresses default
    /// to a host prefix, mirroring `ipaddr.IPNetwork`'s behaviour in the
    /// original implementation).
    pub fn parse(s: &str) -> Result<Self, ExplorerError> {
        let trimmed = s.trim();
        let bad_input = || {
            ExplorerError::BadInput(format!(
                "could not parse input '{trimmed}' as prefix"
            ))
        };
        let (addr_s, len_s) = match trimmed.split_once('/') {
            Some((a, l)) => (a, Some(l)),
            None => (trimmed, None),
        };
        let addr: IpAddr = addr_s.parse().map_err(|_| bad_input())?;
        let max_len = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let len = match len_s {
            Some(l) => l.parse::<u8>().map_err(|_| bad_input())?,
            None => max_len,
        };
        PrefixId::new(addr, len).map_err(|_| bad_input())
    }

    fn mask(bits: u128, keep: u32) -> u128 {
        if keep == 0 {
            0
        } else {
            bits & (u128::MAX << (128 - keep))
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn addr(&self) -> IpAddr {
        match self.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::from((self.bits >> 96) as u32)),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(self.bits)),
        }
    }

    /// Bit `idx` (0-based, counting from the network's first bit).
    pub(crate) fn bit(&self, idx: u8) -> bool {
        let pos = self.family.shift() + idx as u32;
        (self.bits >> (127 - pos)) & 1 == 1
    }

    /// This prefix truncated to `new_len` bits (must be `<= self.len()`).
    pub(crate) fn truncated(&self, new_len: u8) -> Self {
        let bits = Self::mask(self.bits, self.family.shift() + new_len as u32);
        Self {
            family: self.family,
            bits,
            len: new_len,
        }
    }

    /// True iff `self` covers `other`: same family, `self` no more specific
    /// than `other`, and `other` falls within `self`'s address range.
    pub fn covers(&self, other: &PrefixId) -> bool {
        self.family == other.family
            && self.len <= other.len
            && other.truncated(self.len).bits == self.bits
    }
}

impl fmt::Display for PrefixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.len)
    }
}

impl From<InetPrefix> for PrefixId {
    fn from(value: InetPrefix) -> Self {
        // inetnum already validates addr/len combinations, so this can't
        // fail in practice.
        PrefixId::new(value.addr(), value.len())
            .expect("inetnum::addr::Prefix always carries a valid length")
    }
}

impl From<PrefixId> for InetPrefix {
    fn from(value: PrefixId) -> Self {
        InetPrefix::new(value.addr(), value.len())
            .expect("PrefixId always carries a valid length")
    }
}

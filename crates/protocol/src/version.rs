//! Protocol version identifiers and mutual version selection.
//!
//! [`ProtocolVersion`] is an opaque, totally ordered 32-bit identifier.
//! [`SupportedVersions`] keeps the local set ordered so that selection never
//! depends on hash iteration order, and [`select_best`] picks the numeric
//! maximum of the intersection with a peer's offer.

use core::fmt;
use std::collections::BTreeSet;

/// Identifier of a p2p wire protocol revision.
///
/// The three low bytes read as `major.minor.patch`; comparisons use the raw
/// numeric value.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProtocolVersion(u32);

impl ProtocolVersion {
    /// Sentinel meaning "no version". Never offered and never selected.
    pub const UNKNOWN: Self = Self(0x0000_0000);
    /// Protocol 0.3.0.
    pub const V030: Self = Self(0x0000_0300);
    /// Protocol 0.3.1.
    pub const V031: Self = Self(0x0000_0301);
    /// Protocol 0.3.2.
    pub const V032: Self = Self(0x0000_0302);
    /// Protocol 0.3.3.
    pub const V033: Self = Self(0x0000_0303);

    /// Wraps a raw wire value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the value written on the wire.
    #[must_use]
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Reports whether this is the [`ProtocolVersion::UNKNOWN`] sentinel.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }
}

impl From<u32> for ProtocolVersion {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<ProtocolVersion> for u32 {
    fn from(version: ProtocolVersion) -> Self {
        version.0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("unknown");
        }
        let major = self.0 >> 16;
        let minor = (self.0 >> 8) & 0xFF;
        let patch = self.0 & 0xFF;
        write!(f, "{major}.{minor}.{patch}")
    }
}

/// Ordered set of versions the local node can complete a handshake for.
///
/// The [`ProtocolVersion::UNKNOWN`] sentinel is silently dropped on insertion.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SupportedVersions {
    versions: BTreeSet<ProtocolVersion>,
}

impl SupportedVersions {
    /// Builds a set from any collection of versions.
    pub fn new<I>(versions: I) -> Self
    where
        I: IntoIterator<Item = ProtocolVersion>,
    {
        versions.into_iter().collect()
    }

    /// Adds a version, returning `false` if it was already present or is the
    /// unknown sentinel.
    pub fn insert(&mut self, version: ProtocolVersion) -> bool {
        !version.is_unknown() && self.versions.insert(version)
    }

    /// Reports whether `version` is supported.
    #[must_use]
    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.versions.contains(&version)
    }

    /// Returns the newest supported version, if any.
    #[must_use]
    pub fn newest(&self) -> Option<ProtocolVersion> {
        self.versions.last().copied()
    }

    /// Number of supported versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Reports whether no version is supported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterates from the newest version to the oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ProtocolVersion> + '_ {
        self.versions.iter().rev().copied()
    }

    /// Returns the versions newest first, the order used when advertising them.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ProtocolVersion> {
        self.iter().collect()
    }
}

impl Default for SupportedVersions {
    fn default() -> Self {
        Self::new([
            ProtocolVersion::V033,
            ProtocolVersion::V032,
            ProtocolVersion::V031,
            ProtocolVersion::V030,
        ])
    }
}

impl FromIterator<ProtocolVersion> for SupportedVersions {
    fn from_iter<I: IntoIterator<Item = ProtocolVersion>>(iter: I) -> Self {
        let versions = iter
            .into_iter()
            .filter(|version| !version.is_unknown())
            .collect();
        Self { versions }
    }
}

impl Extend<ProtocolVersion> for SupportedVersions {
    fn extend<I: IntoIterator<Item = ProtocolVersion>>(&mut self, iter: I) {
        for version in iter {
            self.insert(version);
        }
    }
}

/// Selects the highest version present both locally and in the peer's offer.
///
/// Returns [`ProtocolVersion::UNKNOWN`] when the intersection is empty,
/// including when `offered` is empty. The result depends only on the two
/// sets, never on the order of `offered`.
#[must_use = "the negotiation outcome must be checked"]
pub fn select_best(local: &SupportedVersions, offered: &[ProtocolVersion]) -> ProtocolVersion {
    let newest = local.newest();
    let mut best = ProtocolVersion::UNKNOWN;

    for &version in offered {
        if version <= best || !local.contains(version) {
            continue;
        }
        if Some(version) == newest {
            return version;
        }
        best = version;
    }

    best
}

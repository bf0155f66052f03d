//! Radio model database
//!
//! Each supported model names the wire protocol it speaks plus the few
//! per-model facts a codec needs: CI-V address, whether the radio echoes
//! its own commands, and whether it has data modes separate from voice.

use crate::icom;
use crate::Protocol;

/// Canonical frequency limits shared by the supported radios
const MIN_HZ: u64 = 100_000;
const MAX_HZ: u64 = 450_000_000;

/// Information about a specific radio model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RigModel {
    /// Model name, e.g. `FT-817`
    pub name: &'static str,
    /// Protocol used by this radio
    pub protocol: Protocol,
    /// Default CI-V address (Icom only)
    pub civ_address: Option<u8>,
    /// Radio echoes each command back before replying
    pub echo: bool,
    /// Radio has data modes distinct from the voice modes
    pub has_data_modes: bool,
    /// Minimum frequency in Hz
    pub min_frequency_hz: u64,
    /// Maximum frequency in Hz
    pub max_frequency_hz: u64,
}

impl RigModel {
    const fn yaesu(name: &'static str, protocol: Protocol, has_data_modes: bool) -> Self {
        Self {
            name,
            protocol,
            civ_address: None,
            echo: false,
            has_data_modes,
            min_frequency_hz: MIN_HZ,
            max_frequency_hz: MAX_HZ,
        }
    }

    const fn icom(name: &'static str, address: u8) -> Self {
        Self {
            name,
            protocol: Protocol::IcomCiv,
            civ_address: Some(address),
            echo: true,
            has_data_modes: false,
            min_frequency_hz: MIN_HZ,
            max_frequency_hz: MAX_HZ,
        }
    }

    /// Returns true if `hz` is inside this model's range
    pub fn covers(&self, hz: u64) -> bool {
        (self.min_frequency_hz..=self.max_frequency_hz).contains(&hz)
    }
}

static MODELS: &[RigModel] = &[
    RigModel::yaesu("FT-817", Protocol::YaesuBinary, false),
    RigModel::yaesu("FT-991", Protocol::YaesuAscii, true),
    RigModel::icom("IC-7000", 0x70),
];

/// Database of known radio models
pub struct RigDatabase;

impl RigDatabase {
    /// Models with a dedicated entry
    pub fn models() -> &'static [RigModel] {
        MODELS
    }

    /// Look up a model by name (case-insensitive)
    ///
    /// Any Icom radio in the CI-V address table resolves to the generic
    /// CI-V model at its default address.
    pub fn find(name: &str) -> Option<RigModel> {
        let name = name.trim();
        if let Some(model) = MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name)) {
            return Some(*model);
        }
        icom::ADDRESS_TABLE
            .iter()
            .find(|(model, _)| model.eq_ignore_ascii_case(name))
            .map(|(model, addr)| RigModel::icom(model, *addr))
    }

    /// Every name accepted by [`RigDatabase::find`]
    pub fn names() -> impl Iterator<Item = &'static str> {
        MODELS.iter().map(|m| m.name).chain(
            icom::ADDRESS_TABLE
                .iter()
                .map(|(name, _)| *name)
                .filter(|name| !MODELS.iter().any(|m| m.name == *name)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_dedicated_models() {
        let ft817 = RigDatabase::find("ft-817").unwrap();
        assert_eq!(ft817.protocol, Protocol::YaesuBinary);
        assert!(!ft817.echo);

        let ft991 = RigDatabase::find("FT-991").unwrap();
        assert_eq!(ft991.protocol, Protocol::YaesuAscii);
        assert!(ft991.has_data_modes);

        let ic7000 = RigDatabase::find("IC-7000").unwrap();
        assert_eq!(ic7000.civ_address, Some(0x70));
        assert!(ic7000.echo);
        assert!(!ic7000.has_data_modes);
    }

    #[test]
    fn test_find_generic_icom() {
        let ic7300 = RigDatabase::find("IC-7300").unwrap();
        assert_eq!(ic7300.protocol, Protocol::IcomCiv);
        assert_eq!(ic7300.civ_address, Some(0x94));
        assert!(RigDatabase::find("TS-590").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let names: Vec<_> = RigDatabase::names().collect();
        assert_eq!(names.iter().filter(|n| **n == "IC-7000").count(), 1);
        assert!(names.contains(&"FT-817"));
        assert!(names.contains(&"IC-703"));
    }

    #[test]
    fn test_covers() {
        let model = RigDatabase::find("FT-817").unwrap();
        assert!(model.covers(100_000));
        assert!(model.covers(450_000_000));
        assert!(!model.covers(99_999));
    }
}

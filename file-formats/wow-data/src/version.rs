use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Result, WowDataError};
use crate::types::DataVersion;

/// Environment variable consulted by [`configure_from_env`].
pub const CLIENT_VERSION_ENV: &str = "WOW_CLIENT_VERSION";

/// Client generation a file was written for.
///
/// The numeric value of each variant is the version number stored in the
/// header of M2 files of that generation. Cataclysm and Mists of Pandaria
/// share a layout and are both represented by [`ClientVersion::Cataclysm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClientVersion {
    Classic,
    TBC,
    WotLK,
    Cataclysm,
    WoD,
    Legion,
}

impl ClientVersion {
    pub const ALL: [Self; 6] = [
        Self::Classic,
        Self::TBC,
        Self::WotLK,
        Self::Cataclysm,
        Self::WoD,
        Self::Legion,
    ];

    /// Version number written into M2 headers by this client.
    pub const fn m2_version(self) -> u32 {
        match self {
            Self::Classic => 256,
            Self::TBC => 263,
            Self::WotLK => 264,
            Self::Cataclysm => 272,
            Self::WoD => 273,
            Self::Legion => 274,
        }
    }

    /// Map an M2 header version to the client generation that wrote it.
    pub const fn from_m2_version(version: u32) -> Option<Self> {
        match version {
            256..=257 => Some(Self::Classic),
            260..=263 => Some(Self::TBC),
            264 => Some(Self::WotLK),
            265..=272 => Some(Self::Cataclysm),
            273 => Some(Self::WoD),
            274 => Some(Self::Legion),
            _ => None,
        }
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::TBC => "tbc",
            Self::WotLK => "wotlk",
            Self::Cataclysm => "cata",
            Self::WoD => "wod",
            Self::Legion => "legion",
        }
    }

    pub const fn is_pre_wotlk(self) -> bool {
        matches!(self, Self::Classic | Self::TBC)
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classic => "Classic",
            Self::TBC => "The Burning Crusade",
            Self::WotLK => "Wrath of the Lich King",
            Self::Cataclysm => "Cataclysm/Mists of Pandaria",
            Self::WoD => "Warlords of Draenor",
            Self::Legion => "Legion",
        };
        write!(f, "{name} ({})", self.m2_version())
    }
}

impl FromStr for ClientVersion {
    type Err = WowDataError;

    /// Accepts expansion names (`wotlk`, `wrath`), patch strings (`3.3.5a`)
    /// and M2 header numbers (`264`).
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let by_name = match lowered.as_str() {
            "classic" | "vanilla" => Some(Self::Classic),
            "tbc" | "bc" | "burning-crusade" => Some(Self::TBC),
            "wotlk" | "wrath" | "wlk" => Some(Self::WotLK),
            "cata" | "cataclysm" | "mop" | "pandaria" => Some(Self::Cataclysm),
            "wod" | "warlords" => Some(Self::WoD),
            "legion" => Some(Self::Legion),
            _ => None,
        };
        if let Some(version) = by_name {
            return Ok(version);
        }

        if let Ok(number) = lowered.parse::<u32>() {
            if let Some(version) = Self::from_m2_version(number) {
                return Ok(version);
            }
        }

        let major = lowered
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok());
        match major {
            Some(1) => Ok(Self::Classic),
            Some(2) => Ok(Self::TBC),
            Some(3) => Ok(Self::WotLK),
            Some(4 | 5) => Ok(Self::Cataclysm),
            Some(6) => Ok(Self::WoD),
            Some(7) => Ok(Self::Legion),
            _ => Err(WowDataError::version_mismatch(
                "one of classic, tbc, wotlk, cata, wod, legion",
                s,
            )),
        }
    }
}

impl DataVersion for ClientVersion {}

static CONFIGURED: OnceLock<ClientVersion> = OnceLock::new();

/// Fix the process-wide client version.
///
/// The first call wins. Repeating the call with the same version is a
/// no-op; asking for a different version afterwards fails with
/// [`WowDataError::VersionMismatch`], as the version cannot change
/// mid-run.
pub fn configure(version: ClientVersion) -> Result<ClientVersion> {
    let current = *CONFIGURED.get_or_init(|| version);
    if current == version {
        log::debug!("client version configured as {current}");
        Ok(current)
    } else {
        Err(WowDataError::version_mismatch(current, version))
    }
}

/// The process-wide client version, if one was configured.
pub fn configured() -> Option<ClientVersion> {
    CONFIGURED.get().copied()
}

/// Configure the process-wide version from `WOW_CLIENT_VERSION` when set.
pub fn configure_from_env() -> Result<Option<ClientVersion>> {
    match std::env::var(CLIENT_VERSION_ENV) {
        Ok(value) => configure(value.parse()?).map(Some),
        Err(_) => Ok(configured()),
    }
}

/// Resolve the version for one decode/encode call: an explicit version
/// wins, otherwise the process-wide one is used.
pub fn resolve(explicit: Option<ClientVersion>) -> Result<ClientVersion> {
    explicit.or_else(configured).ok_or_else(|| {
        WowDataError::version_mismatch("a configured client version", "none")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("classic", ClientVersion::Classic)]
    #[test_case("TBC", ClientVersion::TBC)]
    #[test_case("3.3.5a", ClientVersion::WotLK)]
    #[test_case("264", ClientVersion::WotLK)]
    #[test_case("5.4.8", ClientVersion::Cataclysm)]
    #[test_case("mop", ClientVersion::Cataclysm)]
    #[test_case("273", ClientVersion::WoD)]
    #[test_case("7.3.5", ClientVersion::Legion)]
    fn parses(input: &str, expected: ClientVersion) {
        assert_eq!(input.parse::<ClientVersion>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown() {
        assert!(matches!(
            "shadowlands".parse::<ClientVersion>(),
            Err(WowDataError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn m2_numbers_round_trip() {
        for version in ClientVersion::ALL {
            assert_eq!(
                ClientVersion::from_m2_version(version.m2_version()),
                Some(version)
            );
        }
        assert_eq!(ClientVersion::from_m2_version(260), Some(ClientVersion::TBC));
        assert_eq!(ClientVersion::from_m2_version(258), None);
    }

    #[test]
    fn ordering_follows_release_order() {
        assert!(ClientVersion::Classic < ClientVersion::TBC);
        assert!(ClientVersion::TBC < ClientVersion::WotLK);
        assert!(ClientVersion::WoD < ClientVersion::Legion);
        assert!(ClientVersion::TBC.is_pre_wotlk());
        assert!(!ClientVersion::WotLK.is_pre_wotlk());
    }

    #[test]
    fn configuring_twice_with_another_version_fails() {
        let first = configure(ClientVersion::WotLK).unwrap();
        assert_eq!(configured(), Some(first));
        assert!(configure(first).is_ok());

        let other = if first == ClientVersion::WotLK {
            ClientVersion::TBC
        } else {
            ClientVersion::WotLK
        };
        assert!(matches!(
            configure(other),
            Err(WowDataError::VersionMismatch { .. })
        ));
        assert_eq!(resolve(Some(other)).unwrap(), other);
        assert_eq!(resolve(None).unwrap(), first);
    }
}

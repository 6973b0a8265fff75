// ── Hardware address ──
//
// Parsed once, carried as raw bytes. The display form is always
// lowercase colon-separated regardless of how it was written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A 6-byte Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    /// Accepts colon-separated, dash-separated, or bare hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect();

        if hex.len() != 12 || !hex.is_ascii() {
            return Err(Error::InvalidMac(s.to_owned()));
        }

        let mut bytes = [0u8; 6];
        for (slot, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| Error::InvalidMac(s.to_owned()))?;
            *slot = u8::from_str_radix(pair, 16).map_err(|_| Error::InvalidMac(s.to_owned()))?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_notations() {
        let expected = MacAddress::from_bytes([0xa4, 0x30, 0x7a, 0x01, 0xbc, 0xef]);
        for raw in ["A4:30:7A:01:BC:EF", "a4-30-7a-01-bc-ef", "a4307a01bcef", " a4:30:7a:01:bc:ef "] {
            assert_eq!(raw.parse::<MacAddress>().unwrap(), expected, "input {raw:?}");
        }
    }

    #[test]
    fn displays_lowercase_colon_separated() {
        let mac: MacAddress = "A4-30-7A-01-BC-EF".parse().unwrap();
        assert_eq!(mac.to_string(), "a4:30:7a:01:bc:ef");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "a4:30:7a:01:bc".parse::<MacAddress>(),
            Err(Error::InvalidMac(_))
        ));
        assert!("a4:30:7a:01:bc:ef:00".parse::<MacAddress>().is_err());
        assert!("".parse::<MacAddress>().is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!("zz:30:7a:01:bc:ef".parse::<MacAddress>().is_err());
        assert!("é4:30:7a:01:bc:e".parse::<MacAddress>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let mac: MacAddress = "a4:30:7a:01:bc:ef".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"a4:30:7a:01:bc:ef\"");
        let back: MacAddress = serde_json::from_str("\"A4307A01BCEF\"").unwrap();
        assert_eq!(back, mac);
    }
}

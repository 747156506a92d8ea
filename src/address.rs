//! IPv4 address representation.
//!
//! Addresses are handled as plain 32-bit integers so that ranges can be
//! bisected with ordinary arithmetic. The dotted-quad text form is only used
//! at the edges: input parsing, lookup URLs and persisted rows.

use std::fmt;
use std::str::FromStr;

use crate::error_handling::SegmentError;

/// A 32-bit IPv4 address (`a.b.c.d` == `a << 24 | b << 16 | c << 8 | d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    /// Lowest representable address (`0.0.0.0`).
    pub const MIN: Address = Address(0);
    /// Highest representable address (`255.255.255.255`).
    pub const MAX: Address = Address(u32::MAX);

    pub const fn new(value: u32) -> Self {
        Address(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the four octets, most significant first.
    pub fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Address(value)
    }
}

impl From<Address> for u32 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl From<Address> for i64 {
    fn from(address: Address) -> Self {
        i64::from(address.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

impl FromStr for Address {
    type Err = SegmentError;

    /// Parses a dotted-quad string.
    ///
    /// Exactly four numeric octets are required, each in `0..=255` and
    /// written without leading zeros, so that formatting gives back the same
    /// text. Anything else (missing octets, empty octets, signs, slashes) is
    /// rejected with [`SegmentError::InvalidAddress`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SegmentError::InvalidAddress(s.to_string());

        let mut value: u32 = 0;
        let mut count = 0usize;
        for part in s.split('.') {
            count += 1;
            if count > 4 || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(invalid());
            }
            let octet: u8 = part.parse().map_err(|_| invalid())?;
            value = (value << 8) | u32::from(octet);
        }
        if count != 4 {
            return Err(invalid());
        }

        Ok(Address(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_round_trip() {
        for text in [
            "0.0.0.0",
            "1.2.3.4",
            "10.0.0.255",
            "192.168.1.1",
            "255.255.255.255",
        ] {
            let address: Address = text.parse().expect("valid address");
            assert_eq!(address.to_string(), text);
        }
    }

    #[test]
    fn test_numeric_value() {
        let address: Address = "1.2.3.4".parse().unwrap();
        assert_eq!(address.value(), 0x0102_0304);
        assert_eq!(Address::new(0x0102_0304).to_string(), "1.2.3.4");
        assert_eq!(Address::MAX.to_string(), "255.255.255.255");
    }

    #[test]
    fn test_every_octet_value_round_trips() {
        for octet in 0..=255u32 {
            let text = format!("{octet}.{octet}.{octet}.{octet}");
            let address: Address = text.parse().unwrap();
            assert_eq!(address.to_string(), text);
        }
    }

    #[test]
    fn test_rejects_out_of_range_octet() {
        assert!(matches!(
            "1.2.3.256".parse::<Address>(),
            Err(SegmentError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_octet_count() {
        for text in ["1.2.3", "1.2.3.4.5", "", "1..2.3", "1.2.3.4."] {
            assert!(
                text.parse::<Address>().is_err(),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_rejects_leading_zeros() {
        for text in ["01.2.3.4", "1.2.3.004", "1.00.3.4"] {
            assert!(
                matches!(text.parse::<Address>(), Err(SegmentError::InvalidAddress(_))),
                "{text:?} should not parse"
            );
        }
        // a lone zero is still an octet
        assert_eq!("0.10.0.0".parse::<Address>().unwrap().to_string(), "0.10.0.0");
    }

    #[test]
    fn test_rejects_non_numeric() {
        for text in ["a.b.c.d", "1.2.3.-4", "1.2.3.+4", "1.2/3.4"] {
            assert!(text.parse::<Address>().is_err(), "{text:?} should not parse");
        }
    }
}

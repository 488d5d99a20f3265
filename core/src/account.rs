// Identity Registry
// Copyright (C) 2019 Monadic GmbH <radicle@monadic.xyz>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Externally owned accounts.

use core::convert::TryFrom;
use serde::{Deserialize, Serialize};

use crate::Address;

/// An externally owned account identified by its 20 byte address.
///
/// Accounts are parsed from `0x` followed by 40 hex digits in any letter case. Equality is
/// defined on the address bytes, so `0xABC...` and `0xabc...` denote the same account.
///
/// [Account] is displayed with an EIP-55 checksum.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(Address);

impl Account {
    fn from_string(input: &str) -> Result<Self, InvalidAccountError> {
        let input = input.trim();
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .ok_or(InvalidAccountError("must start with '0x'"))?;
        if digits.len() != 40 {
            return Err(InvalidAccountError("must have exactly 40 hex digits"));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| InvalidAccountError("must only include hex digits"))?;
        Ok(Account(Address::from(bytes)))
    }

    pub fn address(&self) -> Address {
        self.0
    }

    /// Abbreviated form `0x1234...abcd` for display.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl From<Address> for Account {
    fn from(address: Address) -> Self {
        Account(address)
    }
}

impl From<Account> for Address {
    fn from(account: Account) -> Self {
        account.0
    }
}

impl From<[u8; 20]> for Account {
    fn from(bytes: [u8; 20]) -> Self {
        Account(Address::from(bytes))
    }
}

impl TryFrom<&str> for Account {
    type Error = InvalidAccountError;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        Self::from_string(input)
    }
}

impl TryFrom<String> for Account {
    type Error = InvalidAccountError;

    fn try_from(input: String) -> Result<Self, Self::Error> {
        Self::from_string(&input)
    }
}

impl core::str::FromStr for Account {
    type Err = InvalidAccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl core::fmt::Display for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

/// Error returned when a string is not a syntactically valid account address.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid account address: {0}")]
pub struct InvalidAccountError(&'static str);

impl InvalidAccountError {
    /// Error description
    pub fn what(&self) -> &'static str {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::Account;

    const LOWER: &str = "0x886a5152eecadfb7e5de6a7cc2e0617abc298e1e";
    const CHECKSUMMED: &str = "0x886a5152EecAdfB7E5De6a7Cc2e0617aBc298e1E";

    #[test]
    fn parse_ignores_letter_case() {
        let lower: Account = LOWER.parse().unwrap();
        let upper: Account = LOWER.to_uppercase().replacen("0X", "0x", 1).parse().unwrap();
        let checksummed: Account = CHECKSUMMED.parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, checksummed);
    }

    #[test]
    fn display_is_checksummed() {
        let account: Account = LOWER.parse().unwrap();
        assert_eq!(account.to_string(), CHECKSUMMED);
    }

    #[test]
    fn short_form() {
        let account: Account = LOWER.parse().unwrap();
        assert_eq!(account.short(), "0x886a...8e1E");
    }

    #[test]
    fn missing_prefix() {
        let err = Account::from_string(&LOWER[2..]).unwrap_err();
        assert_eq!(err.what(), "must start with '0x'");
    }

    #[test]
    fn wrong_length() {
        assert!(Account::from_string("0x886a").is_err());
        assert!(Account::from_string(&format!("{}00", LOWER)).is_err());
    }

    #[test]
    fn invalid_characters() {
        let invalid = format!("0x{}", "zz".repeat(20));
        let err = Account::from_string(&invalid).unwrap_err();
        assert_eq!(err.what(), "must only include hex digits");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let account = Account::from_string(&format!("  {}\n", LOWER)).unwrap();
        assert_eq!(account, LOWER.parse().unwrap());
    }
}

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

//! Type definitions for the entities stored in the contract state.

use serde::Serialize;

use crate::{abi, U256};

/// Identity of an account as stored by the contract.
///
/// # Invariants
///
/// * `full_name` is never empty. An empty name denotes an account without identity, see
///   [IdentityLookup::Absent].
///
/// # Relevant messages
///
/// * [crate::message::RegisterIdentity]
/// * [crate::message::VerifyIdentity]
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IdentityRecord {
    pub full_name: String,
    pub id_number: U256,
    pub is_verified: bool,
    /// Unix timestamp in seconds of the verification. `0` if the identity was never verified.
    pub verification_timestamp: u64,
}

impl IdentityRecord {
    /// Time of the verification if the identity has been verified.
    pub fn verified_at(&self) -> Option<u64> {
        if self.verification_timestamp == 0 {
            None
        } else {
            Some(self.verification_timestamp)
        }
    }
}

/// Result of looking up the identity of an account.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum IdentityLookup {
    Registered(IdentityRecord),
    /// The account has not registered an identity.
    Absent,
}

impl IdentityLookup {
    /// Classify the positional tuple returned by `getIdentity`.
    ///
    /// The contract returns zero values for accounts that never registered. An empty
    /// `full_name` therefore yields [IdentityLookup::Absent] no matter what the other fields
    /// contain.
    pub fn from_raw(
        full_name: String,
        id_number: U256,
        is_verified: bool,
        verification_timestamp: U256,
    ) -> Self {
        if full_name.is_empty() {
            return IdentityLookup::Absent;
        }
        IdentityLookup::Registered(IdentityRecord {
            full_name,
            id_number,
            is_verified,
            verification_timestamp: saturating_u64(verification_timestamp),
        })
    }

    pub fn record(&self) -> Option<&IdentityRecord> {
        match self {
            IdentityLookup::Registered(record) => Some(record),
            IdentityLookup::Absent => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.record().is_some()
    }
}

impl From<abi::getIdentityReturn> for IdentityLookup {
    fn from(raw: abi::getIdentityReturn) -> Self {
        IdentityLookup::from_raw(
            raw.fullName,
            raw.idNumber,
            raw.isVerified,
            raw.verificationTimestamp,
        )
    }
}

fn saturating_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_limbs()[0]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_name_is_absent() {
        let garbage = [
            (U256::ZERO, false, U256::ZERO),
            (U256::from(42), false, U256::ZERO),
            (U256::from(42), true, U256::from(1_600_000_000u64)),
            (U256::MAX, true, U256::MAX),
        ];
        for (id_number, is_verified, timestamp) in garbage.iter().cloned() {
            let lookup = IdentityLookup::from_raw(String::new(), id_number, is_verified, timestamp);
            assert_eq!(lookup, IdentityLookup::Absent);
            assert!(lookup.record().is_none());
        }
    }

    #[test]
    fn registered_unverified() {
        let lookup =
            IdentityLookup::from_raw("Alice".to_string(), U256::from(42), false, U256::ZERO);
        let record = lookup.record().unwrap();
        assert_eq!(record.full_name, "Alice");
        assert_eq!(record.id_number, U256::from(42));
        assert!(!record.is_verified);
        assert_eq!(record.verified_at(), None);
    }

    #[test]
    fn registered_verified() {
        let lookup = IdentityLookup::from_raw(
            "Bob".to_string(),
            U256::from(7),
            true,
            U256::from(1_700_000_000u64),
        );
        assert_eq!(lookup.record().unwrap().verified_at(), Some(1_700_000_000));
    }

    #[test]
    fn timestamp_saturates() {
        let lookup = IdentityLookup::from_raw("Carol".to_string(), U256::from(1), true, U256::MAX);
        assert_eq!(lookup.record().unwrap().verification_timestamp, u64::MAX);
    }

    #[test]
    fn decode_contract_return_data() {
        use alloy_sol_types::SolCall;

        let data = abi::getIdentityCall::abi_encode_returns(&(
            "Alice".to_string(),
            U256::from(42),
            false,
            U256::ZERO,
        ));
        let raw = abi::getIdentityCall::abi_decode_returns(&data, true).unwrap();
        assert_eq!(
            IdentityLookup::from(raw),
            IdentityLookup::from_raw("Alice".to_string(), U256::from(42), false, U256::ZERO)
        );
    }

    #[test]
    fn serialize_absent() {
        let json = serde_json::to_value(&IdentityLookup::Absent).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "absent" }));
    }
}

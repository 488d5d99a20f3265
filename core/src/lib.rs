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

//! Basic types and contract bindings used by the Identity Registry client.
//!
//! The identity registry is a single contract that stores one [state::IdentityRecord] per
//! account. Accounts register themselves by paying the verification [Fee]. An administrator
//! account verifies identities, changes the fee and withdraws the collected fees.

pub use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

pub mod abi;
pub mod message;
pub mod state;

mod access;
pub use access::is_admin;

mod account;
pub use account::{Account, InvalidAccountError};

mod error;
pub use error::{ArgumentError, ContractError, Field};

/// Amount of native currency in the smallest unit (wei) that has to be attached to
/// [message::RegisterIdentity].
pub type Fee = U256;

/// The hash of a transaction. Uniquely identifies a transaction.
pub type TxHash = B256;

/// Format a [Fee] in ether units, e.g. `0.001000000000000000` for `10^15` wei.
pub fn format_fee(fee: Fee) -> String {
    alloy_primitives::utils::format_ether(fee)
}

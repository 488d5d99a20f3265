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

use derive_more::Display;
use serde::Serialize;

/// Command argument that failed validation.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    #[display(fmt = "full_name")]
    FullName,
    #[display(fmt = "id_number")]
    IdNumber,
    #[display(fmt = "amount")]
    Amount,
    #[display(fmt = "user")]
    User,
    #[display(fmt = "new_admin")]
    NewAdmin,
    #[display(fmt = "recipient")]
    Recipient,
}

/// A command argument is not acceptable for the contract call it is meant for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ArgumentError {
    pub field: Field,
    pub reason: &'static str,
}

impl ArgumentError {
    pub fn new(field: Field, reason: &'static str) -> Self {
        ArgumentError { field, reason }
    }
}

/// Reasons for which the identity verification contract reverts a transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContractError {
    OnlyAdmin = 0,
    DuplicateIdentity,
    IncorrectFee,
    InexistentIdentity,
    AlreadyVerified,
    ZeroAddress,
    NoFeesCollected,
}

impl From<ContractError> for &'static str {
    fn from(error: ContractError) -> &'static str {
        match error {
            ContractError::OnlyAdmin => "Only admin can perform this action",
            ContractError::DuplicateIdentity => "Identity already registered",
            ContractError::IncorrectFee => "Incorrect verification fee",
            ContractError::InexistentIdentity => "Identity not registered",
            ContractError::AlreadyVerified => "Identity already verified",
            ContractError::ZeroAddress => "Invalid address",
            ContractError::NoFeesCollected => "No fees to withdraw",
        }
    }
}

impl core::fmt::Display for ContractError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let reason: &'static str = (*self).into();
        write!(f, "{}", reason)
    }
}

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

//! Messages for the state-changing contract calls.
//!
//! Every message has a `parse` constructor that validates raw user input before anything is
//! sent to the network. [TransactionRequest] bundles the encoded call with the value that is
//! attached to it.

use alloy_sol_types::SolCall;
use derive_more::Display;
use serde::Serialize;

use crate::{abi, Account, ArgumentError, Bytes, Fee, Field, U256};

/// The state-changing operations of the contract.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[display(fmt = "register")]
    Register,
    #[display(fmt = "verify")]
    Verify,
    #[display(fmt = "change_admin")]
    ChangeAdmin,
    #[display(fmt = "set_fee")]
    SetFee,
    #[display(fmt = "withdraw")]
    Withdraw,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Register,
        Operation::Verify,
        Operation::ChangeAdmin,
        Operation::SetFee,
        Operation::Withdraw,
    ];

    /// Generic message shown to the user when the operation failed remotely.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Register => "Failed to register identity.",
            Operation::Verify => "Failed to verify identity.",
            Operation::ChangeAdmin => "Failed to change admin.",
            Operation::SetFee => "Failed to set verification fee.",
            Operation::Withdraw => "Failed to withdraw fees.",
        }
    }
}

/// Trait implemented for every contract message.
pub trait Message: Clone + Send + 'static {
    const OPERATION: Operation;

    /// Whether the verification fee is attached to the call.
    const PAYABLE: bool = false;

    /// ABI encoded call data.
    fn call_data(&self) -> Bytes;
}

/// Register the identity of the sending account. Requires the verification fee.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterIdentity {
    pub full_name: String,
    pub id_number: U256,
}

impl RegisterIdentity {
    pub fn parse(full_name: &str, id_number: &str) -> Result<Self, ArgumentError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ArgumentError::new(Field::FullName, "must not be empty"));
        }
        Ok(RegisterIdentity {
            full_name: full_name.to_string(),
            id_number: parse_amount(id_number, Field::IdNumber)?,
        })
    }
}

impl Message for RegisterIdentity {
    const OPERATION: Operation = Operation::Register;
    const PAYABLE: bool = true;

    fn call_data(&self) -> Bytes {
        abi::registerIdentityCall {
            fullName: self.full_name.clone(),
            idNumber: self.id_number,
        }
        .abi_encode()
        .into()
    }
}

/// Mark the identity of `user` as verified. Admin only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifyIdentity {
    pub user: Account,
}

impl VerifyIdentity {
    pub fn parse(user: &str) -> Result<Self, ArgumentError> {
        Ok(VerifyIdentity {
            user: parse_account(user, Field::User)?,
        })
    }
}

impl Message for VerifyIdentity {
    const OPERATION: Operation = Operation::Verify;

    fn call_data(&self) -> Bytes {
        abi::verifyIdentityCall {
            user: self.user.address(),
        }
        .abi_encode()
        .into()
    }
}

/// Hand the admin privilege to another account. Admin only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeAdmin {
    pub new_admin: Account,
}

impl ChangeAdmin {
    pub fn parse(new_admin: &str) -> Result<Self, ArgumentError> {
        Ok(ChangeAdmin {
            new_admin: parse_account(new_admin, Field::NewAdmin)?,
        })
    }
}

impl Message for ChangeAdmin {
    const OPERATION: Operation = Operation::ChangeAdmin;

    fn call_data(&self) -> Bytes {
        abi::changeAdminCall {
            newAdmin: self.new_admin.address(),
        }
        .abi_encode()
        .into()
    }
}

/// Set the fee required for [RegisterIdentity]. Admin only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetVerificationFee {
    pub fee: Fee,
}

impl SetVerificationFee {
    pub fn parse(amount: &str) -> Result<Self, ArgumentError> {
        Ok(SetVerificationFee {
            fee: parse_amount(amount, Field::Amount)?,
        })
    }
}

impl Message for SetVerificationFee {
    const OPERATION: Operation = Operation::SetFee;

    fn call_data(&self) -> Bytes {
        abi::setVerificationFeeCall { newFee: self.fee }
            .abi_encode()
            .into()
    }
}

/// Transfer all collected fees to `recipient`. Admin only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawFees {
    pub recipient: Account,
}

impl WithdrawFees {
    pub fn parse(recipient: &str) -> Result<Self, ArgumentError> {
        Ok(WithdrawFees {
            recipient: parse_account(recipient, Field::Recipient)?,
        })
    }
}

impl Message for WithdrawFees {
    const OPERATION: Operation = Operation::Withdraw;

    fn call_data(&self) -> Bytes {
        abi::withdrawFeesCall {
            recipient: self.recipient.address(),
        }
        .abi_encode()
        .into()
    }
}

/// An encoded state-changing call ready to be signed by the wallet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionRequest {
    pub operation: Operation,
    pub call_data: Bytes,
    /// Native currency attached to the call. Zero unless the message is
    /// [Message::PAYABLE].
    pub value: Fee,
}

impl TransactionRequest {
    /// Build the request for `message`. `value` is only attached to payable messages.
    pub fn new<Message_: Message>(message: &Message_, value: Fee) -> Self {
        TransactionRequest {
            operation: Message_::OPERATION,
            call_data: message.call_data(),
            value: if Message_::PAYABLE { value } else { U256::ZERO },
        }
    }
}

/// Parse a non-negative decimal integer.
fn parse_amount(input: &str, field: Field) -> Result<U256, ArgumentError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ArgumentError::new(field, "must not be empty"));
    }
    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ArgumentError::new(
            field,
            "must be a non-negative decimal integer",
        ));
    }
    U256::from_str_radix(input, 10)
        .map_err(|_| ArgumentError::new(field, "must not exceed 256 bits"))
}

fn parse_account(input: &str, field: Field) -> Result<Account, ArgumentError> {
    input
        .parse()
        .map_err(|err: crate::InvalidAccountError| ArgumentError::new(field, err.what()))
}

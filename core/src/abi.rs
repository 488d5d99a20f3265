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

//! Bindings for the identity verification contract.
//!
//! Call types are generated by [alloy_sol_types::sol]. Every function of the contract has a
//! `<name>Call` type that encodes the call data and decodes the return data.

alloy_sol_types::sol! {
    interface IIdentityVerification {
        function verificationFee() external view returns (uint256);
        function admin() external view returns (address);
        function getIdentity(address user)
            external
            view
            returns (string fullName, uint256 idNumber, bool isVerified, uint256 verificationTimestamp);

        function registerIdentity(string fullName, uint256 idNumber) external payable;
        function verifyIdentity(address user) external;
        function changeAdmin(address newAdmin) external;
        function setVerificationFee(uint256 newFee) external;
        function withdrawFees(address recipient) external;
    }
}

pub use alloy_sol_types::{SolCall, SolInterface};
pub use IIdentityVerification::*;

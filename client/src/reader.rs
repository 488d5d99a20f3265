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

//! Provides [StateReader] for the read-only contract functions.

use std::sync::Arc;

use identity_registry_core::abi::{self, SolCall};

use crate::backend::{Backend, CallRequest};
use crate::interface::*;

/// Performs the read-only contract calls.
///
/// Reads are idempotent and independent of each other. The reader does not cache anything,
/// see [crate::sync::Synchronizer] for that.
#[derive(Clone)]
pub struct StateReader {
    backend: Arc<dyn Backend>,
    contract: Address,
}

impl StateReader {
    pub fn new(backend: Arc<dyn Backend>, contract: Address) -> Self {
        StateReader { backend, contract }
    }

    /// Fee that has to be attached to [message::RegisterIdentity].
    pub async fn read_fee(&self) -> Result<Fee, Error> {
        let fee = self.call(abi::verificationFeeCall {}).await?;
        Ok(fee._0)
    }

    pub async fn read_admin(&self) -> Result<Account, Error> {
        let admin = self.call(abi::adminCall {}).await?;
        Ok(Account::from(admin._0))
    }

    /// Identity stored for `account`, classified into registered or absent.
    pub async fn read_identity(&self, account: &Account) -> Result<IdentityLookup, Error> {
        let raw = self
            .call(abi::getIdentityCall {
                user: account.address(),
            })
            .await?;
        Ok(IdentityLookup::from(raw))
    }

    async fn call<Call_: SolCall + Send>(&self, call: Call_) -> Result<Call_::Return, Error> {
        let request = CallRequest {
            to: self.contract,
            data: call.abi_encode().into(),
        };
        let data = self
            .backend
            .call(request)
            .await
            .map_err(|err| Error::from_transport(RequestKind::Read, err))?;
        Call_::abi_decode_returns(&data, true).map_err(|err| {
            Error::from_transport(RequestKind::Read, TransportError::Decode(err.to_string()))
        })
    }
}

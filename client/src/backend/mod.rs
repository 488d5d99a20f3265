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

//! Define trait for client backends and provide the emulator implementation.
use futures::future::BoxFuture;

use crate::interface::*;

mod emulator;

pub use emulator::{EmulatedWallet, Emulator, BLOCK_TIME, GENESIS_BALANCE, GENESIS_TIMESTAMP, INITIAL_FEE};

/// Return type for results that arrive after a request has been accepted.
pub type Response<T, Error> = BoxFuture<'static, Result<T, Error>>;

/// Read-only call of a contract function.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallRequest {
    pub to: Address,
    pub data: Bytes,
}

/// State-changing call signed by the wallet on behalf of `from`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    pub from: Account,
    pub to: Address,
    pub input: Bytes,
    pub value: Fee,
}

/// Indicator that a transaction has been included in a block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    /// The number of the block the transaction is included in.
    pub block_number: u64,
    /// `false` if the transaction was included but its execution failed.
    pub success: bool,
}

/// Backend for talking to the contract through the wallet's transport.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Execute a read-only call and return the raw return data.
    async fn call(&self, request: CallRequest) -> Result<Bytes, TransportError>;

    /// Have the wallet sign and broadcast a transaction.
    ///
    /// The outer result fails if the wallet or the node refuses the transaction. The returned
    /// [Response] resolves once the transaction is included in a block.
    async fn send_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Response<TransactionReceipt, TransportError>, TransportError>;
}

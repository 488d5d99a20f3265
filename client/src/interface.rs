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

//! Types shared across the client and the abstract wallet provider boundary.
//!
//! The [WalletProvider] trait is the capability a browser wallet injects: account discovery and
//! chain identity. Reading state and sending transactions goes through
//! [crate::backend::Backend].

pub use identity_registry_core::message::{Message, Operation, TransactionRequest};
pub use identity_registry_core::state::{IdentityLookup, IdentityRecord};
pub use identity_registry_core::*;

pub use crate::error::{Error, RequestKind, TransportError};
pub use crate::session::{Generation, SessionView};
pub use crate::sync::Snapshot;
pub use crate::transaction::{Submission, TransactionOutcome};

/// Injected wallet capability.
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
    /// Human readable name of the wallet, e.g. `injected`.
    fn name(&self) -> &str;

    /// Ask the wallet to authorize accounts for this application.
    ///
    /// The first account is the one the user selected in the wallet.
    async fn request_accounts(&self) -> Result<Vec<Account>, TransportError>;

    /// Chain ID of the network the wallet is connected to.
    async fn chain_id(&self) -> Result<u64, TransportError>;
}

/// Selects the wallet provider [crate::Client::connect] uses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProviderChoice {
    /// The first registered provider.
    First,
    /// The provider with the given [WalletProvider::name].
    Named(String),
}

impl Default for ProviderChoice {
    fn default() -> Self {
        ProviderChoice::First
    }
}

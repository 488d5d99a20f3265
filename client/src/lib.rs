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

//! Client for the identity verification contract.
//!
//! [Client] connects to a browser wallet, keeps the contract state of the connected account in
//! sync and submits the state-changing contract calls. The network is accessed through a
//! [backend::Backend]. [backend::Emulator] runs the contract in memory, which is useful for
//! developing and testing.
//!
//! ```no_run
//! # use identity_registry_client::*;
//! # use futures::prelude::*;
//! # async fn example(client: Client) -> Result<(), Error> {
//! let account = client.connect(ProviderChoice::First).await?;
//!
//! let snapshot = client.snapshot();
//! if snapshot.offers_registration() {
//!     let mut submission = client.register("Alice", "42")?;
//!     while let Some(outcome) = submission.next().await {
//!         println!("{:?}", outcome);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::sync::watch;

pub mod backend;
mod config;
mod error;
mod interface;
mod reader;
mod session;
mod sync;
mod transaction;

pub use crate::config::{
    ClientConfig, ConfigError, CHAIN_ID_VAR, CONTRACT_ADDRESS_VAR, SEPOLIA_CHAIN_ID,
    SEPOLIA_CONTRACT_ADDRESS,
};
pub use crate::interface::*;
pub use crate::reader::StateReader;
pub use crate::session::WalletSession;
pub use crate::sync::{Invalidation, Refetch, Synchronizer};
pub use crate::transaction::TransactionSubmitter;

use crate::backend::{Backend, EmulatedWallet, Emulator};

/// Client to interact with the identity verification contract.
///
/// Exposes the derived contract state as a [Snapshot] and one command per contract operation.
pub struct Client {
    config: ClientConfig,
    sync: Arc<Synchronizer>,
    submitter: TransactionSubmitter,
}

impl Client {
    /// Create a client that reads and writes through `backend` and authorizes accounts
    /// through one of `providers`.
    pub fn new(
        backend: Arc<dyn Backend>,
        providers: Vec<Arc<dyn WalletProvider>>,
        config: ClientConfig,
    ) -> Self {
        let contract = config.contract_address.address();
        let session = Arc::new(WalletSession::new(providers, config.chain_id));
        let reader = StateReader::new(backend.clone(), contract);
        let sync = Arc::new(Synchronizer::new(session, reader));
        let submitter = TransactionSubmitter::new(backend, contract, sync.clone());
        Client {
            config,
            sync,
            submitter,
        }
    }

    /// Create a client running against the in-memory [Emulator] with the given wallets.
    pub fn new_emulator(emulator: &Emulator, wallets: Vec<EmulatedWallet>) -> Self {
        let providers = wallets
            .into_iter()
            .map(|wallet| Arc::new(wallet) as Arc<dyn WalletProvider>)
            .collect();
        Client::new(Arc::new(emulator.clone()), providers, emulator.config())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sync.snapshot()
    }

    /// Receiver that is notified whenever the [Snapshot] changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sync.subscribe()
    }

    pub fn reader(&self) -> &StateReader {
        self.sync.reader()
    }

    /// Connect the wallet selected by `choice` and load the state for its account.
    ///
    /// Succeeds even if loading the state fails. The snapshot then lacks the values that could
    /// not be read and [Client::refresh] may be used to retry.
    pub async fn connect(&self, choice: ProviderChoice) -> Result<Account, Error> {
        let before = self.sync.session().current().generation;
        let account = self.sync.session().connect(&choice).await?;
        if self.sync.session().current().generation != before {
            self.account_changed().await;
        }
        Ok(account)
    }

    /// Forget the connected account and all state derived for it.
    ///
    /// Fee and admin are read again on the next [Client::connect] or [Client::refresh].
    pub fn disconnect(&self) {
        if self.sync.session().disconnect().is_some() {
            self.sync.invalidate();
        }
    }

    /// Apply an account switch reported by the wallet.
    ///
    /// An empty list is treated like [Client::disconnect].
    pub async fn accounts_changed(&self, accounts: Vec<Account>) {
        match self.sync.session().accounts_changed(&accounts) {
            Some(view) if view.is_connected() => self.account_changed().await,
            Some(_) => self.sync.invalidate(),
            None => (),
        }
    }

    /// Read fee, admin and the identity of the connected account again.
    pub async fn refresh(&self) -> Result<(), Error> {
        self.sync.handle(Invalidation::AccountChanged).await
    }

    /// Register an identity for the connected account, paying the verification fee.
    pub fn register(&self, full_name: &str, id_number: &str) -> Result<Submission, Error> {
        let message = message::RegisterIdentity::parse(full_name, id_number)?;
        self.submitter.submit(message)
    }

    /// Verify the identity of `account`. Admin only.
    pub fn verify(&self, account: &str) -> Result<Submission, Error> {
        let message = message::VerifyIdentity::parse(account)?;
        self.submitter.submit(message)
    }

    /// Make `account` the admin. Admin only.
    pub fn change_admin(&self, account: &str) -> Result<Submission, Error> {
        let message = message::ChangeAdmin::parse(account)?;
        self.submitter.submit(message)
    }

    /// Set the verification fee to `amount` wei. Admin only.
    pub fn set_fee(&self, amount: &str) -> Result<Submission, Error> {
        let message = message::SetVerificationFee::parse(amount)?;
        self.submitter.submit(message)
    }

    /// Transfer the collected fees to `account`. Admin only.
    pub fn withdraw(&self, account: &str) -> Result<Submission, Error> {
        let message = message::WithdrawFees::parse(account)?;
        self.submitter.submit(message)
    }

    /// Returns `true` while a transaction for `operation` has not resolved.
    pub fn is_submitting(&self, operation: Operation) -> bool {
        self.submitter.is_submitting(operation)
    }

    async fn account_changed(&self) {
        self.sync.invalidate();
        if let Err(error) = self.sync.handle(Invalidation::AccountChanged).await {
            log::warn!("Failed to load contract state for the new account: {}", error);
        }
    }
}

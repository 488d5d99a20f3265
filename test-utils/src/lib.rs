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


//! Miscellaneous helpers used throughout Identity Registry tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::distributions::Alphanumeric;
use rand::Rng;

use identity_registry_client::abi::{self, SolCall};
use identity_registry_client::backend::{
    Backend, CallRequest, EmulatedWallet, Emulator, Response, Transaction, TransactionReceipt,
};
use identity_registry_client::*;

/// Await the final outcome of a submission and return the transaction hash.
///
/// Panics if the submission is refused or does not confirm.
pub async fn submit_ok(submission: Result<Submission, Error>) -> TxHash {
    match submission.unwrap().outcome().await {
        TransactionOutcome::Confirmed { tx_hash } => tx_hash,
        outcome => panic!("Transaction did not confirm: {:?}", outcome),
    }
}

/// Await the final outcome of a submission and return the error it failed with.
///
/// Panics if the submission is refused or confirms.
pub async fn submit_failed(submission: Result<Submission, Error>) -> Error {
    match submission.unwrap().outcome().await {
        TransactionOutcome::Failed(error) => error,
        outcome => panic!("Transaction did not fail: {:?}", outcome),
    }
}

pub fn random_account() -> Account {
    Account::from(rand::thread_rng().gen::<[u8; 20]>())
}

pub fn random_alnum_string(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .collect::<String>()
}

pub fn random_full_name() -> String {
    let size = rand::thread_rng().gen_range(1, 33);
    random_alnum_string(size)
}

/// Random identity number in its decimal form.
pub fn random_id_number() -> String {
    rand::thread_rng().gen_range(1u64, 1_000_000_000).to_string()
}

/// Create a client for `emulator` with a single wallet exposing `accounts`.
pub fn new_client(emulator: &Emulator, accounts: Vec<Account>) -> (Client, EmulatedWallet) {
    let wallet = emulator.wallet("Injected", accounts);
    let client = Client::new_emulator(emulator, vec![wallet.clone()]);
    (client, wallet)
}

/// Create a client for `emulator` and connect it with `account`.
pub async fn connected_client(emulator: &Emulator, account: Account) -> (Client, EmulatedWallet) {
    let (client, wallet) = new_client(emulator, vec![account]);
    let connected = client.connect(ProviderChoice::First).await.unwrap();
    assert_eq!(connected, account);
    (client, wallet)
}

/// Register a random identity for `account` and return the registered record.
pub async fn register_random_identity(emulator: &Emulator, account: Account) -> IdentityRecord {
    let (client, _) = connected_client(emulator, account).await;
    let full_name = random_full_name();
    let id_number = random_id_number();
    submit_ok(client.register(&full_name, &id_number)).await;

    emulator
        .identity(&account)
        .record()
        .cloned()
        .expect("identity not registered")
}

/// [Backend] that forwards to an [Emulator] but can hold back identity reads.
///
/// `getIdentity` calls for a paused account wait until the account is released. This allows
/// tests to control the order in which reads complete.
#[derive(Clone)]
pub struct PausableBackend {
    emulator: Emulator,
    paused: Arc<Mutex<HashSet<Address>>>,
    held: Arc<Mutex<HashSet<Address>>>,
}

impl PausableBackend {
    pub fn new(emulator: Emulator) -> Self {
        PausableBackend {
            emulator,
            paused: Default::default(),
            held: Default::default(),
        }
    }

    /// Create a client that talks to the emulator through this backend.
    pub fn client(&self, wallet: EmulatedWallet) -> Client {
        Client::new(
            Arc::new(self.clone()),
            vec![Arc::new(wallet) as Arc<dyn WalletProvider>],
            self.emulator.config(),
        )
    }

    pub fn pause_identity(&self, account: &Account) {
        self.paused.lock().unwrap().insert(account.address());
    }

    pub fn release_identity(&self, account: &Account) {
        self.paused.lock().unwrap().remove(&account.address());
    }

    /// Wait until an identity read for `account` is being held back.
    pub async fn wait_until_held(&self, account: &Account) {
        while !self.held.lock().unwrap().contains(&account.address()) {
            async_std::task::yield_now().await;
        }
    }

    fn is_paused(&self, user: &Address) -> bool {
        self.paused.lock().unwrap().contains(user)
    }
}

#[async_trait::async_trait]
impl Backend for PausableBackend {
    async fn call(&self, request: CallRequest) -> Result<Bytes, TransportError> {
        if let Ok(call) = abi::getIdentityCall::abi_decode(&request.data, true) {
            if self.is_paused(&call.user) {
                self.held.lock().unwrap().insert(call.user);
                while self.is_paused(&call.user) {
                    async_std::task::yield_now().await;
                }
                self.held.lock().unwrap().remove(&call.user);
            }
        }
        self.emulator.call(request).await
    }

    async fn send_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Response<TransactionReceipt, TransportError>, TransportError> {
        self.emulator.send_transaction(transaction).await
    }
}

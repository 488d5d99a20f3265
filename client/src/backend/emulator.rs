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

//! Provides [Emulator] backend to run the identity verification contract in memory.

use futures::future;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use identity_registry_core::abi::{self, IIdentityVerificationCalls, SolCall, SolInterface};

use crate::backend::{self, CallRequest, Response, Transaction, TransactionReceipt};
use crate::config::ClientConfig;
use crate::interface::*;

/// Balance in wei every account starts with.
pub const GENESIS_BALANCE: u128 = 100_000_000_000_000_000_000;

/// Verification fee the contract is deployed with, 0.001 ether.
pub const INITIAL_FEE: u64 = 1_000_000_000_000_000;

/// Timestamp of the genesis block.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between two blocks.
pub const BLOCK_TIME: u64 = 12;

const USER_REJECTED: &str = "User rejected the request.";

/// [backend::Backend] implementation that executes the contract in memory.
///
/// # Differences with a real chain
///
/// * Every transaction is included in its own block immediately.
///
/// * Reverts are reported when the transaction is sent, like a wallet estimating gas does. A
///   receipt is therefore always successful.
///
/// * Gas is free. Only the attached value is checked against the balance.
///
/// * Every account starts with [GENESIS_BALANCE].
#[derive(Clone)]
pub struct Emulator {
    config: ClientConfig,
    state: Arc<Mutex<EmulatorState>>,
}

/// Mutable state of the emulator.
struct EmulatorState {
    contract: ContractState,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    block_number: u64,
    timestamp: u64,
    offline: bool,
    reject_signatures: bool,
    transaction_count: usize,
}

impl EmulatorState {
    fn balance(&self, account: &Address) -> U256 {
        self.balances
            .get(account)
            .copied()
            .unwrap_or_else(|| U256::from(GENESIS_BALANCE))
    }
}

impl Emulator {
    /// Deploy the contract with `admin` on a chain described by [ClientConfig::default].
    pub fn new(admin: Account) -> Self {
        Self::with_config(admin, ClientConfig::default())
    }

    pub fn with_config(admin: Account, config: ClientConfig) -> Self {
        let contract = ContractState {
            admin: admin.address(),
            fee: U256::from(INITIAL_FEE),
            collected: U256::ZERO,
            identities: HashMap::new(),
        };
        Emulator {
            config,
            state: Arc::new(Mutex::new(EmulatorState {
                contract,
                balances: HashMap::new(),
                nonces: HashMap::new(),
                block_number: 1,
                timestamp: GENESIS_TIMESTAMP,
                offline: false,
                reject_signatures: false,
                transaction_count: 0,
            })),
        }
    }

    /// Configuration a client needs to talk to the emulated contract.
    pub fn config(&self) -> ClientConfig {
        self.config.clone()
    }

    /// Create an injected wallet that exposes `accounts` on the emulated chain.
    pub fn wallet(&self, name: &str, accounts: Vec<Account>) -> EmulatedWallet {
        EmulatedWallet {
            name: name.to_string(),
            emulator: self.clone(),
            state: Arc::new(Mutex::new(WalletState {
                accounts,
                chain_id: self.config.chain_id,
                available: true,
            })),
        }
    }

    pub fn balance(&self, account: &Account) -> U256 {
        self.state.lock().unwrap().balance(&account.address())
    }

    pub fn set_balance(&self, account: &Account, balance: U256) {
        let mut state = self.state.lock().unwrap();
        state.balances.insert(account.address(), balance);
    }

    /// Fees collected by the contract that have not been withdrawn.
    pub fn collected_fees(&self) -> U256 {
        self.state.lock().unwrap().contract.collected
    }

    /// Identity stored for `account`, classified like the client does.
    pub fn identity(&self, account: &Account) -> IdentityLookup {
        let state = self.state.lock().unwrap();
        let stored = state
            .contract
            .identities
            .get(&account.address())
            .cloned()
            .unwrap_or_default();
        IdentityLookup::from_raw(
            stored.full_name,
            stored.id_number,
            stored.is_verified,
            stored.verification_timestamp,
        )
    }

    /// Overwrite the storage slot of `account` bypassing the contract logic.
    pub fn store_raw_identity(
        &self,
        account: &Account,
        full_name: &str,
        id_number: U256,
        is_verified: bool,
        verification_timestamp: U256,
    ) {
        let mut state = self.state.lock().unwrap();
        state.contract.identities.insert(
            account.address(),
            StoredIdentity {
                full_name: full_name.to_string(),
                id_number,
                is_verified,
                verification_timestamp,
            },
        );
    }

    /// Let all requests fail with a network error while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Let the wallet decline every signature and authorization request while `reject` is set.
    pub fn set_reject_signatures(&self, reject: bool) {
        self.state.lock().unwrap().reject_signatures = reject;
    }

    /// Number of transactions that have been included.
    pub fn transaction_count(&self) -> usize {
        self.state.lock().unwrap().transaction_count
    }
}

#[async_trait::async_trait]
impl backend::Backend for Emulator {
    async fn call(&self, request: CallRequest) -> Result<Bytes, TransportError> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(offline());
        }
        // Calling an address without code succeeds with empty return data.
        if request.to != self.config.contract_address.address() {
            return Ok(Bytes::new());
        }

        let call = decode_call(&request.data)?;
        let mut contract = state.contract.clone();
        let execution = contract
            .execute(Address::ZERO, U256::ZERO, state.timestamp, call)
            .map_err(revert)?;
        Ok(execution.output.into())
    }

    async fn send_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Response<TransactionReceipt, TransportError>, TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(offline());
        }
        if state.reject_signatures {
            return Err(TransportError::UserRejected(USER_REJECTED.to_string()));
        }

        let sender = transaction.from.address();
        let sender_balance = state.balance(&sender);
        if sender_balance < transaction.value {
            return Err(TransportError::InsufficientFunds(
                "insufficient funds for gas * price + value".to_string(),
            ));
        }
        if transaction.to != self.config.contract_address.address() {
            return Err(TransportError::Reverted(
                "no contract deployed at the target address".to_string(),
            ));
        }

        let call = decode_call(&transaction.input)?;
        let now = state.timestamp + BLOCK_TIME;
        let mut contract = state.contract.clone();
        let execution = contract
            .execute(sender, transaction.value, now, call)
            .map_err(revert)?;

        state.contract = contract;
        state
            .balances
            .insert(sender, sender_balance - transaction.value);
        if let Some(payout) = execution.payout {
            let recipient_balance = state.balance(&payout.recipient);
            state
                .balances
                .insert(payout.recipient, recipient_balance + payout.amount);
        }

        let nonce = state.nonces.entry(sender).or_insert(0);
        let tx_hash = transaction_hash(&sender, *nonce, &transaction.input);
        *nonce += 1;
        state.block_number += 1;
        state.timestamp = now;
        state.transaction_count += 1;

        log::debug!(
            "Emulator included transaction {} in block {}",
            tx_hash,
            state.block_number
        );
        let receipt = TransactionReceipt {
            tx_hash,
            block_number: state.block_number,
            success: true,
        };
        Ok(Box::pin(future::ready(Ok(receipt))))
    }
}

/// Storage of the identity verification contract.
#[derive(Clone)]
struct ContractState {
    admin: Address,
    fee: U256,
    collected: U256,
    identities: HashMap<Address, StoredIdentity>,
}

/// Identity slot as stored by the contract. Unregistered accounts read as all zero.
#[derive(Clone, Default)]
struct StoredIdentity {
    full_name: String,
    id_number: U256,
    is_verified: bool,
    verification_timestamp: U256,
}

/// Effects of a successful contract call.
struct Execution {
    output: Vec<u8>,
    payout: Option<Payout>,
}

/// Native currency sent from the contract to an account.
struct Payout {
    recipient: Address,
    amount: U256,
}

impl Execution {
    fn output(output: Vec<u8>) -> Self {
        Execution {
            output,
            payout: None,
        }
    }

    fn empty() -> Self {
        Self::output(Vec::new())
    }
}

impl ContractState {
    fn execute(
        &mut self,
        sender: Address,
        value: U256,
        now: u64,
        call: IIdentityVerificationCalls,
    ) -> Result<Execution, ContractError> {
        match call {
            IIdentityVerificationCalls::verificationFee(_) => Ok(Execution::output(
                abi::verificationFeeCall::abi_encode_returns(&(self.fee,)),
            )),
            IIdentityVerificationCalls::admin(_) => Ok(Execution::output(
                abi::adminCall::abi_encode_returns(&(self.admin,)),
            )),
            IIdentityVerificationCalls::getIdentity(call) => {
                let stored = self.identities.get(&call.user).cloned().unwrap_or_default();
                Ok(Execution::output(abi::getIdentityCall::abi_encode_returns(
                    &(
                        stored.full_name,
                        stored.id_number,
                        stored.is_verified,
                        stored.verification_timestamp,
                    ),
                )))
            }
            IIdentityVerificationCalls::registerIdentity(call) => {
                let registered = self
                    .identities
                    .get(&sender)
                    .map_or(false, |identity| !identity.full_name.is_empty());
                if registered {
                    return Err(ContractError::DuplicateIdentity);
                }
                if value != self.fee {
                    return Err(ContractError::IncorrectFee);
                }
                self.identities.insert(
                    sender,
                    StoredIdentity {
                        full_name: call.fullName,
                        id_number: call.idNumber,
                        is_verified: false,
                        verification_timestamp: U256::ZERO,
                    },
                );
                self.collected += value;
                Ok(Execution::empty())
            }
            IIdentityVerificationCalls::verifyIdentity(call) => {
                self.ensure_admin(sender)?;
                let identity = self
                    .identities
                    .get_mut(&call.user)
                    .filter(|identity| !identity.full_name.is_empty())
                    .ok_or(ContractError::InexistentIdentity)?;
                if identity.is_verified {
                    return Err(ContractError::AlreadyVerified);
                }
                identity.is_verified = true;
                identity.verification_timestamp = U256::from(now);
                Ok(Execution::empty())
            }
            IIdentityVerificationCalls::changeAdmin(call) => {
                self.ensure_admin(sender)?;
                if call.newAdmin == Address::ZERO {
                    return Err(ContractError::ZeroAddress);
                }
                self.admin = call.newAdmin;
                Ok(Execution::empty())
            }
            IIdentityVerificationCalls::setVerificationFee(call) => {
                self.ensure_admin(sender)?;
                self.fee = call.newFee;
                Ok(Execution::empty())
            }
            IIdentityVerificationCalls::withdrawFees(call) => {
                self.ensure_admin(sender)?;
                if call.recipient == Address::ZERO {
                    return Err(ContractError::ZeroAddress);
                }
                if self.collected == U256::ZERO {
                    return Err(ContractError::NoFeesCollected);
                }
                let amount = self.collected;
                self.collected = U256::ZERO;
                Ok(Execution {
                    output: Vec::new(),
                    payout: Some(Payout {
                        recipient: call.recipient,
                        amount,
                    }),
                })
            }
        }
    }

    fn ensure_admin(&self, sender: Address) -> Result<(), ContractError> {
        if sender == self.admin {
            Ok(())
        } else {
            Err(ContractError::OnlyAdmin)
        }
    }
}

/// Injected wallet exposing accounts of an [Emulator] chain.
#[derive(Clone)]
pub struct EmulatedWallet {
    name: String,
    emulator: Emulator,
    state: Arc<Mutex<WalletState>>,
}

struct WalletState {
    accounts: Vec<Account>,
    chain_id: u64,
    available: bool,
}

impl EmulatedWallet {
    pub fn set_accounts(&self, accounts: Vec<Account>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    /// An unavailable wallet answers every request with [TransportError::Unavailable].
    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }
}

#[async_trait::async_trait]
impl WalletProvider for EmulatedWallet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn request_accounts(&self) -> Result<Vec<Account>, TransportError> {
        let rejecting = self.emulator.state.lock().unwrap().reject_signatures;
        let state = self.state.lock().unwrap();
        if !state.available {
            return Err(TransportError::Unavailable);
        }
        if rejecting {
            return Err(TransportError::UserRejected(USER_REJECTED.to_string()));
        }
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, TransportError> {
        let state = self.state.lock().unwrap();
        if !state.available {
            return Err(TransportError::Unavailable);
        }
        Ok(state.chain_id)
    }
}

fn decode_call(data: &[u8]) -> Result<IIdentityVerificationCalls, TransportError> {
    IIdentityVerificationCalls::abi_decode(data, true)
        .map_err(|_| TransportError::Reverted("execution reverted".to_string()))
}

fn revert(error: ContractError) -> TransportError {
    TransportError::Reverted(format!("execution reverted: {}", error))
}

fn offline() -> TransportError {
    TransportError::Network("could not reach the network".to_string())
}

fn transaction_hash(sender: &Address, nonce: u64, input: &[u8]) -> TxHash {
    let mut preimage = Vec::with_capacity(20 + 8 + input.len());
    preimage.extend_from_slice(sender.as_slice());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    preimage.extend_from_slice(input);
    keccak256(preimage)
}

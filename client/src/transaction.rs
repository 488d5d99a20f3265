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

//! Provides [TransactionSubmitter] and the [Submission] lifecycle of a transaction.

use futures::channel::oneshot;
use futures::executor::ThreadPool;
use futures::prelude::*;
use futures::stream::BoxStream;
use futures::task::{Context, Poll, SpawnExt};
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::backend::{Backend, Transaction, TransactionReceipt};
use crate::interface::*;
use crate::sync::{Invalidation, Refetch, Synchronizer};

lazy_static! {
    /// Executor that drives transactions to inclusion independently of their [Submission].
    static ref DRIVERS: ThreadPool = ThreadPool::builder()
        .name_prefix("transaction-driver-")
        .create()
        .expect("failed to start transaction driver threads");
}

/// State of a submitted transaction as reported by [Submission].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactionOutcome {
    /// The transaction is being signed, sent or waits for inclusion.
    Pending,
    /// The transaction was included and executed successfully.
    Confirmed { tx_hash: TxHash },
    Failed(Error),
}

impl TransactionOutcome {
    pub fn is_final(&self) -> bool {
        *self != TransactionOutcome::Pending
    }
}

/// Stream of [TransactionOutcome]s for one submitted transaction.
///
/// Yields [TransactionOutcome::Pending] followed by exactly one final outcome. The transaction
/// is sent when the stream is polled past [TransactionOutcome::Pending]. From then on it is
/// driven to its final outcome even if the submission is dropped, and the operation stays
/// occupied until then. Dropping the submission before that frees the operation.
pub struct Submission {
    operation: Operation,
    outcomes: BoxStream<'static, TransactionOutcome>,
}

impl Submission {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Drive the submission to completion and return the final outcome.
    pub async fn outcome(mut self) -> TransactionOutcome {
        let mut last = TransactionOutcome::Pending;
        while let Some(outcome) = self.outcomes.next().await {
            last = outcome;
        }
        last
    }
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("operation", &self.operation)
            .finish()
    }
}

impl Stream for Submission {
    type Item = TransactionOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.outcomes.poll_next_unpin(cx)
    }
}

/// Operations with a transaction in flight.
#[derive(Default)]
struct Slots(Mutex<HashSet<Operation>>);

/// Marks an operation as in flight until dropped.
struct SlotGuard {
    slots: Arc<Slots>,
    operation: Operation,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slots.0.lock().unwrap().remove(&self.operation);
    }
}

impl Slots {
    fn claim(self: &Arc<Self>, operation: Operation) -> Result<SlotGuard, Error> {
        let mut in_flight = self.0.lock().unwrap();
        if !in_flight.insert(operation) {
            return Err(Error::AlreadyInProgress(operation));
        }
        Ok(SlotGuard {
            slots: self.clone(),
            operation,
        })
    }

    fn contains(&self, operation: Operation) -> bool {
        self.0.lock().unwrap().contains(&operation)
    }
}

/// Encodes and submits state-changing contract calls on behalf of the active account.
///
/// Transactions of different operations may be in flight at the same time. A second
/// transaction for an operation is rejected with [Error::AlreadyInProgress] while the first one
/// has not resolved.
pub struct TransactionSubmitter {
    backend: Arc<dyn Backend>,
    contract: Address,
    sync: Arc<Synchronizer>,
    slots: Arc<Slots>,
    executor: ThreadPool,
}

impl TransactionSubmitter {
    pub fn new(backend: Arc<dyn Backend>, contract: Address, sync: Arc<Synchronizer>) -> Self {
        TransactionSubmitter {
            backend,
            contract,
            sync,
            slots: Arc::new(Slots::default()),
            executor: DRIVERS.clone(),
        }
    }

    /// Submit `message` from the active account.
    ///
    /// Fails without contacting the network if no account is connected, if the message is
    /// payable and the fee has not been read, or if a transaction for the same operation is in
    /// flight.
    ///
    /// Once confirmed the state affected by the operation is read again, unless the active
    /// account changed in the meantime.
    pub fn submit<Message_: Message>(&self, message: Message_) -> Result<Submission, Error> {
        let operation = Message_::OPERATION;
        let view = self.sync.session().current();
        let from = view.account.ok_or(Error::NotConnected)?;
        let value = if Message_::PAYABLE {
            self.sync.fee().ok_or(Error::FeeNotLoaded)?
        } else {
            U256::ZERO
        };
        let slot = self.slots.claim(operation)?;

        let request = TransactionRequest::new(&message, value);
        let transaction = Transaction {
            from,
            to: self.contract,
            input: request.call_data,
            value: request.value,
        };
        log::info!("Submitting {} transaction from {}", operation, from);

        let backend = self.backend.clone();
        let sync = self.sync.clone();
        let driver = async move {
            let outcome = match send(backend.as_ref(), transaction).await {
                Ok(receipt) => {
                    log::info!(
                        "{} transaction {} confirmed in block {}",
                        operation,
                        receipt.tx_hash,
                        receipt.block_number
                    );
                    let refetch = Refetch::from(Invalidation::Confirmed(operation));
                    if let Err(error) = sync.refresh(view, refetch).await {
                        log::warn!("Refresh after {} failed: {}", operation, error);
                    }
                    TransactionOutcome::Confirmed {
                        tx_hash: receipt.tx_hash,
                    }
                }
                Err(error) => {
                    log::warn!("{} transaction failed: {}", operation, error);
                    TransactionOutcome::Failed(error)
                }
            };
            drop(slot);
            outcome
        };

        let executor = self.executor.clone();
        let resolution = async move {
            let (sender, receiver) = oneshot::channel();
            let spawned = executor.spawn(driver.map(move |outcome| {
                // The submission may have been dropped.
                let _ = sender.send(outcome);
            }));
            if let Err(error) = spawned {
                return TransactionOutcome::Failed(Error::NetworkError(error.to_string()));
            }
            receiver.await.unwrap_or_else(|_| {
                TransactionOutcome::Failed(Error::NetworkError(
                    "transaction driver stopped".to_string(),
                ))
            })
        };

        let outcomes = stream::once(future::ready(TransactionOutcome::Pending))
            .chain(stream::once(resolution))
            .boxed();
        Ok(Submission {
            operation,
            outcomes,
        })
    }

    /// Returns `true` while a transaction for `operation` has not resolved.
    pub fn is_submitting(&self, operation: Operation) -> bool {
        self.slots.contains(operation)
    }
}

/// Send the transaction and wait for its inclusion.
async fn send(backend: &dyn Backend, transaction: Transaction) -> Result<TransactionReceipt, Error> {
    let included = backend
        .send_transaction(transaction)
        .await
        .map_err(|err| Error::from_transport(RequestKind::Write, err))?;
    let receipt = included
        .await
        .map_err(|err| Error::from_transport(RequestKind::Write, err))?;
    if !receipt.success {
        return Err(Error::TransactionReverted(format!(
            "transaction {} failed in block {}",
            receipt.tx_hash, receipt.block_number
        )));
    }
    Ok(receipt)
}

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


//! Test the lifecycle of submitted transactions.

use futures::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use identity_registry_client::backend::{
    Backend, CallRequest, Emulator, Response, Transaction, TransactionReceipt,
};
use identity_registry_client::*;
use identity_registry_test_utils::*;

#[async_std::test]
async fn submit_without_account() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, _) = new_client(&emulator, vec![random_account()]);

    assert_eq!(
        client.register("Alice", "42").err(),
        Some(Error::NotConnected)
    );
    assert_eq!(
        client.withdraw(&random_account().to_string()).err(),
        Some(Error::NotConnected)
    );
    assert_eq!(emulator.transaction_count(), 0);
}

#[async_std::test]
async fn register_without_fee() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    emulator.set_offline(true);
    let (client, _) = connected_client(&emulator, random_account()).await;
    emulator.set_offline(false);

    let error = client.register("Alice", "42").unwrap_err();

    assert_eq!(error, Error::FeeNotLoaded);
    assert_eq!(
        error.user_message(Operation::Register),
        "Verification fee not loaded. Please try again."
    );
    assert!(!client.is_submitting(Operation::Register));
    assert_eq!(emulator.transaction_count(), 0);

    client.refresh().await.unwrap();
    submit_ok(client.register("Alice", "42")).await;
    assert_eq!(emulator.transaction_count(), 1);
}

#[async_std::test]
async fn second_submission_of_operation_is_refused() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    let (client, _) = connected_client(&emulator, user).await;

    let first = client.register("Alice", "42").unwrap();
    assert!(client.is_submitting(Operation::Register));

    let second = client.register("Bob", "43");
    assert_eq!(
        second.err(),
        Some(Error::AlreadyInProgress(Operation::Register))
    );

    match first.outcome().await {
        TransactionOutcome::Confirmed { .. } => (),
        outcome => panic!("unexpected outcome {:?}", outcome),
    }
    assert!(!client.is_submitting(Operation::Register));
    assert_eq!(emulator.transaction_count(), 1);
    assert_eq!(
        emulator.identity(&user).record().unwrap().full_name,
        "Alice"
    );
}

#[async_std::test]
async fn different_operations_run_concurrently() {
    let _ = env_logger::try_init();
    let admin = random_account();
    let emulator = Emulator::new(admin);
    let (client, _) = connected_client(&emulator, admin).await;

    let register = client.register("Admin", "1").unwrap();
    let set_fee = client.set_fee("1000000000000000").unwrap();
    assert!(client.is_submitting(Operation::Register));
    assert!(client.is_submitting(Operation::SetFee));

    let (registered, fee_set) = futures::join!(register.outcome(), set_fee.outcome());
    assert!(matches!(registered, TransactionOutcome::Confirmed { .. }));
    assert!(matches!(fee_set, TransactionOutcome::Confirmed { .. }));
    assert_eq!(emulator.transaction_count(), 2);
}

#[async_std::test]
async fn dropped_submission_releases_operation() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, _) = connected_client(&emulator, random_account()).await;

    let submission = client.register("Alice", "42").unwrap();
    assert_eq!(submission.operation(), Operation::Register);
    drop(submission);

    assert!(!client.is_submitting(Operation::Register));
    assert_eq!(emulator.transaction_count(), 0);
    submit_ok(client.register("Alice", "42")).await;
}

#[async_std::test]
async fn submission_yields_pending_first() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, _) = connected_client(&emulator, random_account()).await;

    let mut submission = client.register("Alice", "42").unwrap();

    assert_eq!(submission.next().await, Some(TransactionOutcome::Pending));
    assert!(client.is_submitting(Operation::Register));
    let outcome = submission.next().await.unwrap();
    assert!(outcome.is_final());
    assert!(!client.is_submitting(Operation::Register));
    assert_eq!(submission.next().await, None);
}

#[async_std::test]
async fn rejected_signature() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, _) = connected_client(&emulator, random_account()).await;
    emulator.set_reject_signatures(true);

    let error = submit_failed(client.register("Alice", "42")).await;

    assert_eq!(
        error,
        Error::TransactionRejected("User rejected the request.".to_string())
    );
    assert_eq!(
        error.user_message(Operation::Register),
        "Failed to register identity."
    );
    assert!(!client.is_submitting(Operation::Register));
    assert!(client.snapshot().offers_registration());
}

#[async_std::test]
async fn insufficient_funds() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    emulator.set_balance(&user, U256::ZERO);
    let (client, _) = connected_client(&emulator, user).await;

    let error = submit_failed(client.register("Alice", "42")).await;

    match error {
        Error::TransactionRejected(_) => (),
        error => panic!("unexpected error {:?}", error),
    }
    assert_eq!(emulator.transaction_count(), 0);
}

#[async_std::test]
async fn verify_by_non_admin_reverts() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    register_random_identity(&emulator, user).await;
    let (client, _) = connected_client(&emulator, user).await;
    assert!(!client.snapshot().is_admin);

    let error = submit_failed(client.verify(&user.to_string())).await;

    assert_eq!(
        error,
        Error::TransactionReverted(
            "execution reverted: Only admin can perform this action".to_string()
        )
    );
    assert!(!emulator.identity(&user).record().unwrap().is_verified);
}

#[async_std::test]
async fn duplicate_registration_reverts() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    register_random_identity(&emulator, user).await;
    let (client, _) = connected_client(&emulator, user).await;

    let error = submit_failed(client.register("Alice", "42")).await;

    assert_eq!(
        error,
        Error::TransactionReverted("execution reverted: Identity already registered".to_string())
    );
}

#[async_std::test]
async fn stale_fee_reverts() {
    let _ = env_logger::try_init();
    let admin = random_account();
    let emulator = Emulator::new(admin);
    let user = random_account();
    let (user_client, _) = connected_client(&emulator, user).await;
    let (admin_client, _) = connected_client(&emulator, admin).await;
    submit_ok(admin_client.set_fee("5")).await;

    let error = submit_failed(user_client.register("Alice", "42")).await;
    assert_eq!(
        error,
        Error::TransactionReverted("execution reverted: Incorrect verification fee".to_string())
    );

    user_client.refresh().await.unwrap();
    submit_ok(user_client.register("Alice", "42")).await;
    assert_eq!(emulator.collected_fees(), U256::from(5u64));
}

#[async_std::test]
async fn confirmation_after_account_switch_does_not_refresh() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let alice = random_account();
    let bob = random_account();
    let (client, _) = connected_client(&emulator, alice).await;

    let submission = client.register("Alice", "42").unwrap();
    client.accounts_changed(vec![bob]).await;
    submit_ok(Ok(submission)).await;

    assert!(emulator.identity(&alice).is_registered());
    let snapshot = client.snapshot();
    assert_eq!(snapshot.account, Some(bob));
    assert_eq!(snapshot.identity, Some(IdentityLookup::Absent));
}

/// Backend that reads from an [Emulator] and accepts transactions that are never included.
struct NeverIncluded {
    emulator: Emulator,
    sent: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Backend for NeverIncluded {
    async fn call(&self, request: CallRequest) -> Result<Bytes, TransportError> {
        self.emulator.call(request).await
    }

    async fn send_transaction(
        &self,
        _transaction: Transaction,
    ) -> Result<Response<TransactionReceipt, TransportError>, TransportError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(future::pending().boxed())
    }
}

#[async_std::test]
async fn dropped_submission_keeps_sent_transaction_in_flight() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    let sent = Arc::new(AtomicUsize::new(0));
    let backend = NeverIncluded {
        emulator: emulator.clone(),
        sent: sent.clone(),
    };
    let wallet = emulator.wallet("Injected", vec![user]);
    let client = Client::new(
        Arc::new(backend),
        vec![Arc::new(wallet) as Arc<dyn WalletProvider>],
        emulator.config(),
    );
    client.connect(ProviderChoice::First).await.unwrap();

    let mut submission = client.register("Alice", "42").unwrap();
    assert_eq!(submission.next().await, Some(TransactionOutcome::Pending));
    assert!(futures::poll!(submission.next()).is_pending());
    while sent.load(Ordering::SeqCst) == 0 {
        async_std::task::yield_now().await;
    }
    drop(submission);

    assert!(client.is_submitting(Operation::Register));
    assert_eq!(
        client.register("Alice", "42").err(),
        Some(Error::AlreadyInProgress(Operation::Register))
    );
    assert_eq!(sent.load(Ordering::SeqCst), 1);
}

#[async_std::test]
async fn dropped_submission_still_refreshes_on_confirmation() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    let (client, _) = connected_client(&emulator, user).await;

    let mut submission = client.register("Alice", "42").unwrap();
    assert_eq!(submission.next().await, Some(TransactionOutcome::Pending));
    let _ = futures::poll!(submission.next());
    drop(submission);

    while client.is_submitting(Operation::Register) {
        async_std::task::yield_now().await;
    }
    let record = client
        .snapshot()
        .identity
        .and_then(|identity| identity.record().cloned())
        .unwrap();
    assert_eq!(record.full_name, "Alice");
    assert_eq!(emulator.transaction_count(), 1);
}

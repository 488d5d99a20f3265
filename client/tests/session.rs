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


//! Test wallet connection and keeping the state scoped to the active account.

use std::sync::Arc;

use identity_registry_client::backend::Emulator;
use identity_registry_client::*;
use identity_registry_test_utils::*;

#[async_std::test]
async fn connect_without_provider() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let client = Client::new_emulator(&emulator, vec![]);

    let error = client.connect(ProviderChoice::First).await.unwrap_err();

    assert_eq!(error, Error::NoProviderAvailable);
    assert!(!client.snapshot().is_connected);
}

#[async_std::test]
async fn connect_named_provider() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let first = random_account();
    let second = random_account();
    let client = Client::new_emulator(
        &emulator,
        vec![
            emulator.wallet("Injected", vec![first]),
            emulator.wallet("Other", vec![second]),
        ],
    );

    let account = client
        .connect(ProviderChoice::Named("Other".to_string()))
        .await
        .unwrap();
    assert_eq!(account, second);

    let error = client
        .connect(ProviderChoice::Named("Missing".to_string()))
        .await
        .unwrap_err();
    assert_eq!(error, Error::NoProviderAvailable);
    assert_eq!(client.snapshot().account, Some(second));
}

#[async_std::test]
async fn connect_unavailable_wallet() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, wallet) = new_client(&emulator, vec![random_account()]);
    wallet.set_available(false);

    let error = client.connect(ProviderChoice::First).await.unwrap_err();

    assert_eq!(error, Error::NoProviderAvailable);
}

#[async_std::test]
async fn connect_rejected() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, wallet) = new_client(&emulator, vec![random_account()]);

    emulator.set_reject_signatures(true);
    let error = client.connect(ProviderChoice::First).await.unwrap_err();
    assert_eq!(
        error,
        Error::ConnectionRejected("User rejected the request.".to_string())
    );
    emulator.set_reject_signatures(false);

    wallet.set_accounts(vec![]);
    let error = client.connect(ProviderChoice::First).await.unwrap_err();
    assert_eq!(
        error,
        Error::ConnectionRejected("wallet returned no accounts".to_string())
    );

    wallet.set_accounts(vec![random_account()]);
    wallet.set_chain_id(1);
    let error = client.connect(ProviderChoice::First).await.unwrap_err();
    assert_eq!(
        error,
        Error::ConnectionRejected("wallet is connected to chain 1, expected chain 11155111".to_string())
    );

    assert_eq!(client.snapshot(), Snapshot::default());
}

#[async_std::test]
async fn connect_while_offline() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let user = random_account();
    emulator.set_offline(true);

    let (client, _) = connected_client(&emulator, user).await;

    let snapshot = client.snapshot();
    assert!(snapshot.is_connected);
    assert_eq!(snapshot.fee, None);
    assert_eq!(snapshot.admin, None);
    assert_eq!(snapshot.identity, None);

    let error = client.refresh().await.unwrap_err();
    assert_eq!(
        error,
        Error::ReadFailed("could not reach the network".to_string())
    );

    emulator.set_offline(false);
    client.refresh().await.unwrap();
    let snapshot = client.snapshot();
    assert!(snapshot.fee.is_some());
    assert!(snapshot.admin.is_some());
    assert_eq!(snapshot.identity, Some(IdentityLookup::Absent));
}

#[async_std::test]
async fn failed_read_keeps_cached_state() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let (client, _) = connected_client(&emulator, random_account()).await;
    let before = client.snapshot();

    emulator.set_offline(true);
    assert!(client.refresh().await.is_err());

    assert_eq!(client.snapshot(), before);
}

#[async_std::test]
async fn account_switch_replaces_identity() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let alice = random_account();
    let bob = random_account();
    let alice_record = register_random_identity(&emulator, alice).await;
    let (client, _) = connected_client(&emulator, alice).await;
    let mut snapshots = client.subscribe();
    assert_eq!(
        client.snapshot().identity,
        Some(IdentityLookup::Registered(alice_record))
    );

    client.accounts_changed(vec![bob]).await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.account, Some(bob));
    assert_eq!(snapshot.identity, Some(IdentityLookup::Absent));
    assert!(snapshot.fee.is_some());
    assert!(snapshot.offers_registration());
    assert_eq!(*snapshots.borrow_and_update(), snapshot);

    client.accounts_changed(vec![]).await;
    assert_eq!(client.snapshot(), Snapshot::default());
}

#[async_std::test]
async fn stale_identity_read_is_dropped() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let alice = random_account();
    let bob = random_account();
    register_random_identity(&emulator, alice).await;
    let bob_record = register_random_identity(&emulator, bob).await;

    let backend = PausableBackend::new(emulator.clone());
    let wallet = emulator.wallet("Injected", vec![alice]);
    let client = backend.client(wallet);
    client.connect(ProviderChoice::First).await.unwrap();

    backend.pause_identity(&alice);
    let (refreshed, ()) = futures::join!(client.refresh(), async {
        backend.wait_until_held(&alice).await;
        client.accounts_changed(vec![bob]).await;
        assert_eq!(
            client.snapshot().identity,
            Some(IdentityLookup::Registered(bob_record.clone()))
        );
        backend.release_identity(&alice);
    });
    refreshed.unwrap();

    let snapshot = client.snapshot();
    assert_eq!(snapshot.account, Some(bob));
    assert_eq!(
        snapshot.identity,
        Some(IdentityLookup::Registered(bob_record))
    );
}

#[async_std::test]
async fn identity_is_hidden_until_read_for_new_account() {
    let _ = env_logger::try_init();
    let emulator = Emulator::new(random_account());
    let alice = random_account();
    let bob = random_account();
    register_random_identity(&emulator, alice).await;

    let backend = PausableBackend::new(emulator.clone());
    let wallet = emulator.wallet("Injected", vec![alice]);
    let client = Arc::new(backend.client(wallet));
    client.connect(ProviderChoice::First).await.unwrap();

    backend.pause_identity(&bob);
    let switch = {
        let client = client.clone();
        async_std::task::spawn(async move { client.accounts_changed(vec![bob]).await })
    };
    backend.wait_until_held(&bob).await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.account, Some(bob));
    assert_eq!(snapshot.identity, None);
    assert!(snapshot.offers_registration());

    backend.release_identity(&bob);
    switch.await;
    assert_eq!(client.snapshot().identity, Some(IdentityLookup::Absent));
}

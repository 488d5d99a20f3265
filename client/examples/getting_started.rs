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


//! Getting started with the client by registering and verifying an identity.
//!
//! The example runs against the in-memory emulator. Alice deploys the contract and is its
//! admin. Bob registers his identity and Alice verifies it.

use futures::prelude::*;
use std::convert::TryFrom;

use identity_registry_client::backend::Emulator;
use identity_registry_client::*;

#[async_std::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let alice = Account::try_from("0x1111111111111111111111111111111111111111").unwrap();
    let bob = Account::try_from("0x2222222222222222222222222222222222222222").unwrap();
    let emulator = Emulator::new(alice);

    // Bob connects through his browser wallet.
    let wallet = emulator.wallet("Injected", vec![bob]);
    let client = Client::new_emulator(&emulator, vec![wallet]);
    let account = client.connect(ProviderChoice::First).await?;
    println!("Connected {}", account.short());

    let snapshot = client.snapshot();
    println!(
        "Verification fee: {} ETH",
        snapshot.formatted_fee().unwrap_or_default()
    );

    if snapshot.offers_registration() {
        // Submitting returns a stream that reports the progress of the transaction.
        let mut submission = client.register("Bob", "42")?;
        while let Some(outcome) = submission.next().await {
            match outcome {
                TransactionOutcome::Pending => println!("Registering identity..."),
                TransactionOutcome::Confirmed { tx_hash } => {
                    println!("Identity registered in transaction {}", tx_hash)
                }
                TransactionOutcome::Failed(error) => {
                    println!("{}", error.user_message(submission.operation()));
                    return Err(error);
                }
            }
        }
    }

    // The wallet switches to Alice who verifies Bob's identity.
    client.accounts_changed(vec![alice]).await;
    println!("Admin commands available: {}", client.snapshot().is_admin);
    match client.verify(&bob.to_string())?.outcome().await {
        TransactionOutcome::Failed(error) => return Err(error),
        _ => println!("Verified identity of {}", bob.short()),
    }

    client.accounts_changed(vec![bob]).await;
    if let Some(record) = client.snapshot().identity.as_ref().and_then(IdentityLookup::record) {
        println!(
            "{} (#{}) verified: {}, at {:?}",
            record.full_name,
            record.id_number,
            record.is_verified,
            record.verified_at()
        );
    }

    Ok(())
}

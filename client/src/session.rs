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

//! Provides [WalletSession] which owns the active account.

use std::sync::{Arc, Mutex};

use crate::interface::*;

/// Counter that is incremented every time the active account changes.
///
/// Asynchronous results are tagged with the generation they were requested under and are only
/// applied if that generation is still current.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// Consistent view of the session at one point in time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SessionView {
    pub account: Option<Account>,
    pub generation: Generation,
}

impl SessionView {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

/// Tracks the account that is authorized to act and the wallet it was obtained from.
///
/// The session is the only writer of the active account. Every change of the account produces a
/// new [Generation].
pub struct WalletSession {
    providers: Vec<Arc<dyn WalletProvider>>,
    chain_id: u64,
    view: Mutex<SessionView>,
}

impl WalletSession {
    pub fn new(providers: Vec<Arc<dyn WalletProvider>>, chain_id: u64) -> Self {
        WalletSession {
            providers,
            chain_id,
            view: Mutex::new(SessionView::default()),
        }
    }

    pub fn current(&self) -> SessionView {
        *self.view.lock().unwrap()
    }

    /// Returns `true` if the account has not changed since `generation` was current.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current().generation == generation
    }

    /// Request authorization from the chosen wallet and make its selected account active.
    ///
    /// Fails with [Error::NoProviderAvailable] if no provider matches `choice` and with
    /// [Error::ConnectionRejected] if the wallet declines, offers no account or is connected to a
    /// different chain.
    pub async fn connect(&self, choice: &ProviderChoice) -> Result<Account, Error> {
        let provider = self.provider(choice).ok_or(Error::NoProviderAvailable)?;

        let accounts = provider
            .request_accounts()
            .await
            .map_err(|err| Error::from_transport(RequestKind::Connect, err))?;
        let account = *accounts
            .first()
            .ok_or_else(|| Error::ConnectionRejected("wallet returned no accounts".to_string()))?;

        let chain_id = provider
            .chain_id()
            .await
            .map_err(|err| Error::from_transport(RequestKind::Connect, err))?;
        if chain_id != self.chain_id {
            return Err(Error::ConnectionRejected(format!(
                "wallet is connected to chain {}, expected chain {}",
                chain_id, self.chain_id
            )));
        }

        log::info!("Connected account {} through {}", account, provider.name());
        self.set_account(Some(account));
        Ok(account)
    }

    /// Clear the active account. Returns the new view if an account was connected.
    pub fn disconnect(&self) -> Option<SessionView> {
        let changed = self.set_account(None);
        if changed.is_some() {
            log::info!("Disconnected");
        }
        changed
    }

    /// Apply an account change reported by the wallet.
    ///
    /// The first account becomes active. An empty list means the wallet revoked access. Returns
    /// the new view if the active account changed.
    pub fn accounts_changed(&self, accounts: &[Account]) -> Option<SessionView> {
        let changed = self.set_account(accounts.first().copied());
        if let Some(view) = changed {
            log::info!("Wallet switched account to {:?}", view.account);
        }
        changed
    }

    fn set_account(&self, account: Option<Account>) -> Option<SessionView> {
        let mut view = self.view.lock().unwrap();
        if view.account == account {
            return None;
        }
        *view = SessionView {
            account,
            generation: view.generation.next(),
        };
        Some(*view)
    }

    fn provider(&self, choice: &ProviderChoice) -> Option<&Arc<dyn WalletProvider>> {
        match choice {
            ProviderChoice::First => self.providers.first(),
            ProviderChoice::Named(name) => self
                .providers
                .iter()
                .find(|provider| provider.name() == name.as_str()),
        }
    }
}

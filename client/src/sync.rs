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

//! Keeps the contract state derived for the active account consistent.
//!
//! Derived state (fee, admin and the identity of the active account) is cached together with the
//! [Generation] of the session it was read under. Results of reads that were issued under an
//! older generation are dropped when they arrive. What has to be read again is decided
//! explicitly through [Invalidation] events.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::interface::*;
use crate::reader::StateReader;
use crate::session::WalletSession;

/// Event that makes cached contract state outdated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Invalidation {
    /// The active account changed. Everything is read again.
    AccountChanged,
    /// A transaction for the operation has been confirmed.
    Confirmed(Operation),
}

/// Set of reads to perform.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Refetch {
    pub fee: bool,
    pub admin: bool,
    pub identity: bool,
}

impl Refetch {
    pub const ALL: Refetch = Refetch {
        fee: true,
        admin: true,
        identity: true,
    };

    pub const NONE: Refetch = Refetch {
        fee: false,
        admin: false,
        identity: false,
    };
}

/// Reads required after an invalidation.
///
/// The identity read after a confirmed [Operation::Register] or [Operation::Verify] is the one
/// of the active account. Verifying another account's identity does not change what the
/// admin's snapshot shows until that account is connected.
impl From<Invalidation> for Refetch {
    fn from(invalidation: Invalidation) -> Self {
        match invalidation {
            Invalidation::AccountChanged => Refetch::ALL,
            Invalidation::Confirmed(operation) => match operation {
                Operation::Register | Operation::Verify => Refetch {
                    identity: true,
                    ..Refetch::NONE
                },
                Operation::ChangeAdmin => Refetch {
                    admin: true,
                    ..Refetch::NONE
                },
                Operation::SetFee => Refetch {
                    fee: true,
                    ..Refetch::NONE
                },
                Operation::Withdraw => Refetch::NONE,
            },
        }
    }
}

/// State exposed to the presentation layer.
///
/// `None` means the value has not been read successfully for the current account yet.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    pub account: Option<Account>,
    pub is_connected: bool,
    pub fee: Option<Fee>,
    pub admin: Option<Account>,
    pub identity: Option<IdentityLookup>,
    pub is_admin: bool,
}

impl Snapshot {
    /// Registration is offered to connected accounts without a registered identity.
    pub fn offers_registration(&self) -> bool {
        self.is_connected
            && !self
                .identity
                .as_ref()
                .map_or(false, IdentityLookup::is_registered)
    }

    /// The fee formatted in ether.
    pub fn formatted_fee(&self) -> Option<String> {
        self.fee.map(format_fee)
    }
}

/// Cached reads of one session generation.
#[derive(Default)]
struct CachedState {
    generation: Generation,
    fee: Option<Fee>,
    admin: Option<Account>,
    /// The identity together with the account it was read for.
    identity: Option<(Account, IdentityLookup)>,
}

impl CachedState {
    fn new(generation: Generation) -> Self {
        CachedState {
            generation,
            ..CachedState::default()
        }
    }
}

/// Applies contract reads to the cache and publishes [Snapshot]s.
pub struct Synchronizer {
    session: Arc<WalletSession>,
    reader: StateReader,
    cache: Mutex<CachedState>,
    snapshots: watch::Sender<Snapshot>,
}

impl Synchronizer {
    pub fn new(session: Arc<WalletSession>, reader: StateReader) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Synchronizer {
            session,
            reader,
            cache: Mutex::new(CachedState::default()),
            snapshots,
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn reader(&self) -> &StateReader {
        &self.reader
    }

    pub fn snapshot(&self) -> Snapshot {
        let cache = self.cache.lock().unwrap();
        build_snapshot(self.session.current(), &cache)
    }

    /// Receiver that is notified whenever the [Snapshot] changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// The last fee read under the current generation.
    pub fn fee(&self) -> Option<Fee> {
        self.snapshot().fee
    }

    /// Drop all cached state. Called after the active account changed.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap();
        let view = self.session.current();
        *cache = CachedState::new(view.generation);
        self.publish(view, &cache);
    }

    /// Perform the reads required by `invalidation` for the current session.
    pub async fn handle(&self, invalidation: Invalidation) -> Result<(), Error> {
        self.refresh(self.session.current(), Refetch::from(invalidation))
            .await
    }

    /// Perform the reads in `refetch` concurrently on behalf of `view`.
    ///
    /// Nothing is read if the session has moved on from `view`. Results are applied as they
    /// arrive unless the session has changed in the meantime. Failed reads leave the cached
    /// value untouched. Returns the first error.
    pub async fn refresh(&self, view: SessionView, refetch: Refetch) -> Result<(), Error> {
        if !self.session.is_current(view.generation) {
            log::debug!(
                "Skipping refresh for outdated session generation {:?}",
                view.generation
            );
            return Ok(());
        }

        let (fee, admin, identity) = futures::join!(
            self.refresh_fee(view, refetch.fee),
            self.refresh_admin(view, refetch.admin),
            self.refresh_identity(view, refetch.identity),
        );
        fee.and(admin).and(identity)
    }

    async fn refresh_fee(&self, view: SessionView, enabled: bool) -> Result<(), Error> {
        if !enabled {
            return Ok(());
        }
        let fee = self.reader.read_fee().await.map_err(read_failed("fee"))?;
        self.apply(view, "fee", |cache| cache.fee = Some(fee));
        Ok(())
    }

    async fn refresh_admin(&self, view: SessionView, enabled: bool) -> Result<(), Error> {
        if !enabled {
            return Ok(());
        }
        let admin = self
            .reader
            .read_admin()
            .await
            .map_err(read_failed("admin"))?;
        self.apply(view, "admin", |cache| cache.admin = Some(admin));
        Ok(())
    }

    async fn refresh_identity(&self, view: SessionView, enabled: bool) -> Result<(), Error> {
        let account = match view.account {
            Some(account) if enabled => account,
            _ => return Ok(()),
        };
        let identity = self
            .reader
            .read_identity(&account)
            .await
            .map_err(read_failed("identity"))?;
        self.apply(view, "identity", |cache| {
            cache.identity = Some((account, identity))
        });
        Ok(())
    }

    /// Apply a read result issued under `view` if the session has not changed since.
    fn apply(&self, view: SessionView, what: &str, update: impl FnOnce(&mut CachedState)) -> bool {
        let mut cache = self.cache.lock().unwrap();
        let current = self.session.current();
        if current.generation != view.generation {
            log::debug!(
                "Dropping {} read for generation {:?}, session is at {:?}",
                what,
                view.generation,
                current.generation
            );
            return false;
        }
        if cache.generation != current.generation {
            *cache = CachedState::new(current.generation);
        }
        update(&mut cache);
        log::debug!("Applied {} read for generation {:?}", what, view.generation);
        self.publish(current, &cache);
        true
    }

    /// Publish the snapshot while the cache lock is held so that snapshots are sent in order.
    fn publish(&self, view: SessionView, cache: &CachedState) {
        self.snapshots.send_replace(build_snapshot(view, cache));
    }
}

fn read_failed(what: &'static str) -> impl Fn(Error) -> Error {
    move |error| {
        log::warn!("Failed to read {}: {}", what, error);
        error
    }
}

/// Combine session and cache. Cached values of another generation or account are not shown.
fn build_snapshot(view: SessionView, cache: &CachedState) -> Snapshot {
    let mut snapshot = Snapshot {
        account: view.account,
        is_connected: view.is_connected(),
        ..Snapshot::default()
    };
    if cache.generation == view.generation {
        snapshot.fee = cache.fee;
        snapshot.admin = cache.admin;
        snapshot.identity = match (&cache.identity, view.account) {
            (Some((owner, identity)), Some(account)) if *owner == account => {
                Some(identity.clone())
            }
            _ => None,
        };
    }
    snapshot.is_admin = is_admin(snapshot.account.as_ref(), snapshot.admin.as_ref());
    snapshot
}

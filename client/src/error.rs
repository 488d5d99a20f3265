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

use crate::interface::{Field, Operation};

/// Failure reported by a [crate::backend::Backend] or a [crate::WalletProvider].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// No wallet is injected or the wallet refuses to talk to us.
    #[error("wallet provider unavailable")]
    Unavailable,
    /// The user declined the request in the wallet.
    #[error("{0}")]
    UserRejected(String),
    /// The sending account cannot pay for value and gas.
    #[error("{0}")]
    InsufficientFunds(String),
    /// The contract reverted the call.
    #[error("{0}")]
    Reverted(String),
    /// Error from the underlying RPC connection
    #[error("{0}")]
    Network(String),
    /// Decoding the received data failed
    #[error("{0}")]
    Decode(String),
}

/// The kind of request a [TransportError] was returned for.
///
/// The same transport failure means different things depending on whether we were connecting,
/// reading state or sending a transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestKind {
    Connect,
    Read,
    Write,
}

/// Error that may be returned by any of the [crate::Client] methods.
///
/// [Error::InvalidArgument], [Error::FeeNotLoaded], [Error::NotConnected] and
/// [Error::AlreadyInProgress] are returned before anything is sent to the network. All other
/// variants carry the message of the underlying failure.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("No compatible wallet provider available")]
    NoProviderAvailable,

    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("No account connected")]
    NotConnected,

    #[error("Reading contract state failed: {0}")]
    ReadFailed(String),

    /// [crate::message::RegisterIdentity] requires a verification fee that has been read.
    #[error("Verification fee not loaded")]
    FeeNotLoaded,

    #[error("Invalid argument {0}")]
    InvalidArgument(Field),

    /// Only one transaction per operation may be in flight.
    #[error("A {0} transaction is already in progress")]
    AlreadyInProgress(Operation),

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl Error {
    /// Map a transport failure into the error taxonomy.
    pub fn from_transport(kind: RequestKind, error: TransportError) -> Self {
        match kind {
            RequestKind::Connect => match error {
                TransportError::Unavailable => Error::NoProviderAvailable,
                other => Error::ConnectionRejected(other.to_string()),
            },
            RequestKind::Read => Error::ReadFailed(error.to_string()),
            RequestKind::Write => match error {
                TransportError::UserRejected(cause) | TransportError::InsufficientFunds(cause) => {
                    Error::TransactionRejected(cause)
                }
                TransportError::Reverted(cause) => Error::TransactionReverted(cause),
                TransportError::Network(cause) | TransportError::Decode(cause) => {
                    Error::NetworkError(cause)
                }
                TransportError::Unavailable => {
                    Error::NetworkError(TransportError::Unavailable.to_string())
                }
            },
        }
    }

    /// Returns `true` if the error was raised before any request was sent.
    pub fn is_local(&self) -> bool {
        match self {
            Error::InvalidArgument(_)
            | Error::FeeNotLoaded
            | Error::NotConnected
            | Error::AlreadyInProgress(_) => true,
            _ => false,
        }
    }

    /// Message to show to the user when `operation` failed with this error.
    ///
    /// Local errors explain what to correct. Remote errors are reported with the generic
    /// failure message of the operation.
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            Error::InvalidArgument(field) => format!("Please provide a valid {}.", field),
            Error::FeeNotLoaded => "Verification fee not loaded. Please try again.".to_string(),
            Error::NotConnected => "Please connect your wallet.".to_string(),
            Error::AlreadyInProgress(_) => {
                "Please wait for the pending transaction to complete.".to_string()
            }
            _ => operation.failure_message().to_string(),
        }
    }
}

impl From<identity_registry_core::ArgumentError> for Error {
    fn from(error: identity_registry_core::ArgumentError) -> Self {
        log::debug!("Rejected argument: {}", error);
        Error::InvalidArgument(error.field)
    }
}

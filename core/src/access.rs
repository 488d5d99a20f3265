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

use crate::Account;

/// Returns `true` iff both accounts are known and denote the same address.
///
/// Only decides whether privileged commands are offered. The contract enforces the admin
/// privilege on its own.
pub fn is_admin(active: Option<&Account>, admin: Option<&Account>) -> bool {
    match (active, admin) {
        (Some(active), Some(admin)) => active == admin,
        _ => false,
    }
}

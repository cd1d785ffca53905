// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Sync Utility: a paged copy/upsert tool between two
//! SCIM 2.0 APIs, with optional orphan deletion.

mod sync;

pub use sync::SyncClient;
pub use sync::SyncReport;
pub use sync::SyncResourceType;
pub use sync::run_sync;

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use iddqd::IdOrdItem;
use iddqd::IdOrdMap;

/// Skip serializing if optional list is None or empty
pub fn skip_serializing_list<T>(members: &Option<Vec<T>>) -> bool {
    match members {
        None => true,
        Some(v) => v.is_empty(),
    }
}

/// Skip serializing if optional list is None or empty for IdOrdMap
pub fn skip_serializing_list_map<T>(members: &Option<IdOrdMap<T>>) -> bool
where
    T: IdOrdItem,
{
    match members {
        None => true,
        Some(v) => v.is_empty(),
    }
}

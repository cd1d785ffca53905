// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use iddqd::{IdOrdItem, IdOrdMap, id_upcast};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use unicase::UniCase;

use crate::utils::skip_serializing_list_map;
use crate::{Resource, ResourceType};

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub display_name: String,

    /// An identifier for the resource as defined by the provisioning client
    #[serde(default)]
    pub external_id: Option<String>,

    #[serde(default)]
    pub members: Option<IdOrdMap<GroupMember>>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,

    pub display_name: String,

    /// An identifier for the resource as defined by the provisioning client
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "skip_serializing_list_map::<GroupMember>")]
    #[serde(default)]
    pub members: Option<IdOrdMap<GroupMember>>,
}

impl Resource for Group {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn schema() -> String {
        String::from(crate::urn::GROUP_URN)
    }

    fn resource_type() -> ResourceType {
        ResourceType::Group
    }
}

impl crate::service::ValidateCreate for CreateGroupRequest {}

impl From<CreateGroupRequest> for Group {
    fn from(req: CreateGroupRequest) -> Group {
        Group {
            id: String::new(),
            display_name: req.display_name,
            external_id: req.external_id,
            members: req.members,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    /// User or Group
    #[serde(rename = "type")]
    pub resource_type: Option<String>,

    /// identifier of the member of this group
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

impl IdOrdItem for GroupMember {
    // Nested groups are not supported, so the key is just the member's
    // value, compared case-insensitively.
    type Key<'a> = Option<UniCase<&'a str>>;

    fn key(&self) -> Self::Key<'_> {
        self.value.as_deref().map(UniCase::new)
    }

    id_upcast!();
}

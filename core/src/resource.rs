// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub enum ResourceType {
    User,
    Group,
}

impl ResourceType {
    pub fn urn(&self) -> &'static str {
        match self {
            ResourceType::User => "urn:ietf:params:scim:schemas:core:2.0:User",
            ResourceType::Group => {
                "urn:ietf:params:scim:schemas:core:2.0:Group"
            }
        }
    }
}

// RFC 7644: resourceType has mutability "readOnly" and "caseExact" as true.
impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(r: &str) -> Result<Self, Self::Err> {
        match r {
            "User" => Ok(ResourceType::User),
            "Group" => Ok(ResourceType::Group),
            _ => Err(format!("{r} not a valid resource type")),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ResourceType::User => write!(f, "User"),
            ResourceType::Group => write!(f, "Group"),
        }
    }
}

pub trait Resource: std::fmt::Debug + Serialize {
    fn id(&self) -> String;
    fn schema() -> String;
    fn resource_type() -> ResourceType;
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::Error;
use crate::filter::{self, AttrPath, Filter};

use schemars::JsonSchema;
use serde::Deserialize;

/// The RFC 7644 §3.4.2 query parameters common to both `GET /Users` and
/// `GET /Groups`.
#[derive(Deserialize, JsonSchema, Clone, Default)]
pub struct QueryParams {
    pub filter: Option<String>,

    pub attributes: Option<String>,

    #[serde(rename = "excludedAttributes")]
    pub excluded_attributes: Option<String>,

    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,

    #[serde(rename = "startIndex")]
    pub start_index: Option<usize>,

    pub count: Option<usize>,
}

impl QueryParams {
    /// Rejects a `sortOrder` that is neither `ascending` nor `descending`
    /// (case-insensitive) and a `startIndex` of zero (RFC 7644 §3.4.2:
    /// `startIndex` is 1-based).
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(sort_order) = &self.sort_order {
            if !sort_order.eq_ignore_ascii_case("ascending")
                && !sort_order.eq_ignore_ascii_case("descending")
            {
                return Err(Error::invalid_value(format!(
                    "sortOrder must be 'ascending' or 'descending', got {sort_order:?}"
                )));
            }
        }

        if self.start_index == Some(0) {
            return Err(Error::invalid_value(
                "startIndex must be a positive integer".to_string(),
            ));
        }

        Ok(())
    }

    pub fn filter(&self) -> Result<Option<Filter>, Error> {
        match &self.filter {
            Some(raw) => filter::parse_filter(raw)
                .map(Some)
                .map_err(|e| Error::invalid_filter(e.message)),
            None => Ok(None),
        }
    }

    pub fn attributes_list(&self) -> Vec<String> {
        split_attr_list(self.attributes.as_deref())
    }

    pub fn excluded_attributes_list(&self) -> Vec<String> {
        split_attr_list(self.excluded_attributes.as_deref())
    }

    pub fn sort_by_path(&self) -> Option<AttrPath> {
        let raw = self.sort_by.as_deref()?;
        let (uri, rest) = match raw.rfind(':') {
            Some(idx) => (Some(raw[..idx].to_string()), &raw[idx + 1..]),
            None => (None, raw),
        };
        let mut parts = rest.splitn(2, '.');
        let attr = parts.next()?.to_string();
        let sub_attr = parts.next().map(String::from);
        Some(AttrPath { uri, attr, sub_attr })
    }

    pub fn ascending(&self) -> bool {
        !matches!(self.sort_order.as_deref(), Some("descending"))
    }
}

fn split_attr_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_filter() {
        let params = QueryParams {
            filter: Some(r#"userName eq "bjensen""#.to_string()),
            ..Default::default()
        };
        assert!(params.filter().unwrap().is_some());
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let params = QueryParams {
            filter: Some("userName >< \"x\"".to_string()),
            ..Default::default()
        };
        assert!(params.filter().is_err());
    }

    #[test]
    fn splits_attribute_lists() {
        let params = QueryParams {
            attributes: Some(" userName, name.familyName ,title".to_string()),
            ..Default::default()
        };
        assert_eq!(
            params.attributes_list(),
            vec!["userName", "name.familyName", "title"]
        );
    }

    #[test]
    fn rejects_unrecognized_sort_order() {
        let params = QueryParams {
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_zero_start_index() {
        let params = QueryParams { start_index: Some(0), ..Default::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn default_sort_order_is_ascending() {
        let params = QueryParams::default();
        assert!(params.ascending());

        let params = QueryParams {
            sort_order: Some("descending".to_string()),
            ..Default::default()
        };
        assert!(!params.ascending());
    }
}

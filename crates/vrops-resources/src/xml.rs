//! Streaming reader for XML resource listings.
//!
//! The XML form of `/suite-api/api/resources` nests `ops:resource` elements under the
//! `ops:resources` root. Scalar keys are child elements; identifiers, paging and a few
//! resource fields are attributes. Namespace prefixes are ignored.

use crate::models::{
    Badge, IdentifierType, PageInfo, Resource, ResourceIdentifier, ResourceStatusState,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;
use std::str::FromStr;
use vrops_core::{Error, Result};

/// Resources and paging extracted from an XML listing.
pub(crate) struct XmlListing {
    pub(crate) resources: Vec<Resource>,
    pub(crate) page_info: Option<PageInfo>,
}

fn xml_error(err: impl Display) -> Error {
    Error::ParseError(format!("Invalid XML resource listing: {err}"))
}

fn local_name(start: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(start.local_name().as_ref())
        .map(str::to_string)
        .map_err(xml_error)
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_value<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| xml_error(format!("bad value `{value}`: {err}")))
}

fn parsed_attribute<T>(start: &BytesStart<'_>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    attribute(start, name)?
        .map(|value| parse_value(&value))
        .transpose()
}

/// Parse an XML resource listing.
///
/// # Errors
///
/// Returns [`Error::ParseError`] for malformed XML or unparsable numeric and boolean
/// fields.
pub(crate) fn parse_listing(document: &str) -> Result<XmlListing> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut state = ListingState::default();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => {
                let name = local_name(&start)?;
                state.open(&name, &start)?;
                state.path.push(name);
            }
            Event::Empty(start) => {
                let name = local_name(&start)?;
                state.open(&name, &start)?;
                state.close(&name);
            }
            Event::End(_) => {
                if let Some(name) = state.path.pop() {
                    state.close(&name);
                }
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(xml_error)?;
                state.text(&value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(XmlListing {
        resources: state.resources,
        page_info: state.page_info,
    })
}

#[derive(Default)]
struct ListingState {
    path: Vec<String>,
    resources: Vec<Resource>,
    page_info: Option<PageInfo>,
    current: Option<Resource>,
}

impl ListingState {
    fn open(&mut self, name: &str, start: &BytesStart<'_>) -> Result<()> {
        if self.path.len() == 1 {
            match name {
                "pageInfo" => {
                    self.page_info = Some(PageInfo {
                        total_count: parsed_attribute(start, "totalCount")?,
                        page: parsed_attribute(start, "page")?,
                        page_size: parsed_attribute(start, "pageSize")?,
                    });
                }
                "resource" => {
                    self.current = Some(Resource {
                        identifier: attribute(start, "identifier")?.unwrap_or_default(),
                        creation_time: parsed_attribute(start, "creationTime")?,
                        ..Resource::default()
                    });
                }
                _ => {}
            }
            return Ok(());
        }

        // element names below the current ops:resource
        let inner: Vec<&str> = self.path.iter().skip(2).map(String::as_str).collect();
        let Some(resource) = self.current.as_mut() else {
            return Ok(());
        };

        match (inner.as_slice(), name) {
            (["resourceKey", ..], "resourceIdentifier") => {
                resource
                    .resource_key
                    .resource_identifiers
                    .push(ResourceIdentifier::default());
            }
            ([.., "resourceIdentifier"], "identifierType") => {
                if let Some(identifier) = resource.resource_key.resource_identifiers.last_mut() {
                    identifier.identifier_type = IdentifierType {
                        name: attribute(start, "name")?.unwrap_or_default(),
                        data_type: attribute(start, "dataType")?,
                        is_part_of_uniqueness: parsed_attribute(start, "isPartOfUniqueness")?,
                    };
                }
            }
            (["resourceStatusStates"], _) => {
                resource.resource_status_states.push(ResourceStatusState {
                    adapter_instance_id: attribute(start, "adapterInstanceId")?,
                    ..ResourceStatusState::default()
                });
            }
            (["badges"], _) => {
                resource.badges.push(Badge {
                    badge_type: attribute(start, "type")?.unwrap_or_default(),
                    color: attribute(start, "color")?,
                    score: parsed_attribute(start, "score")?,
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &str) {
        if self.path.len() == 1 && name == "resource" {
            self.resources.extend(self.current.take());
        }
    }

    fn text(&mut self, value: &str) -> Result<()> {
        // element names below the current ops:resource
        let inner: Vec<&str> = self.path.iter().skip(2).map(String::as_str).collect();
        let Some(resource) = self.current.as_mut() else {
            return Ok(());
        };

        match inner.as_slice() {
            ["resourceKey", "name"] => resource.resource_key.name = value.to_string(),
            ["resourceKey", "adapterKindKey"] => {
                resource.resource_key.adapter_kind_key = value.to_string();
            }
            ["resourceKey", "resourceKindKey"] => {
                resource.resource_key.resource_kind_key = value.to_string();
            }
            ["resourceKey", .., "resourceIdentifier", "value"] => {
                if let Some(identifier) = resource.resource_key.resource_identifiers.last_mut() {
                    identifier.value = Some(value.to_string());
                }
            }
            ["resourceHealth"] => resource.resource_health = Some(value.to_string()),
            ["resourceHealthValue"] => resource.resource_health_value = Some(parse_value(value)?),
            ["dtEnabled"] => resource.dt_enabled = Some(parse_value(value)?),
            ["monitoringInterval"] => resource.monitoring_interval = Some(parse_value(value)?),
            ["relatedResources", ..] => resource.related_resources.push(value.to_string()),
            ["resourceStatusStates", _, field] => {
                if let Some(state) = resource.resource_status_states.last_mut() {
                    let value = Some(value.to_string());
                    match *field {
                        "adapterInstanceId" => state.adapter_instance_id = value,
                        "resourceStatus" => state.resource_status = value,
                        "resourceState" => state.resource_state = value,
                        "statusMessage" => state.status_message = value,
                        _ => {}
                    }
                }
            }
            ["badges", _, field] => {
                if let Some(badge) = resource.badges.last_mut() {
                    match *field {
                        "type" => badge.badge_type = value.to_string(),
                        "color" => badge.color = Some(value.to_string()),
                        "score" => badge.score = Some(parse_value(value)?),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

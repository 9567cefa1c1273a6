use btleplug::api::bleuuid::{uuid_from_u16, uuid_from_u32};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{Error, Result};

/// Criteria used to pick the device to connect to.
///
/// Can be built with the builder methods or parsed from a JSON object of the form
/// `{ "name"?, "namePrefix"?, "services"?, "optionalServices"? }`. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RequestOptions {
    /// Exact local name of the device.
    pub name: Option<String>,
    /// Prefix of the local name of the device.
    pub name_prefix: Option<String>,
    /// Services the device must advertise.
    #[serde(default, deserialize_with = "uuid_list")]
    pub services: Option<Vec<Uuid>>,
    /// Services that may be accessed without being required for the match.
    #[serde(default, deserialize_with = "uuid_list")]
    pub optional_services: Option<Vec<Uuid>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON value. `null` means no options.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_object() {
            return Err(Error::InvalidOptions(format!(
                "expected an object, found {}",
                value
            )));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Parse options from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Match devices with exactly this name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Match devices whose name starts with the prefix
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Match devices advertising all of the services
    pub fn services(mut self, services: impl IntoIterator<Item = Uuid>) -> Self {
        self.services = Some(services.into_iter().collect());
        self
    }

    /// Services to grant access to without requiring them
    pub fn optional_services(mut self, services: impl IntoIterator<Item = Uuid>) -> Self {
        self.optional_services = Some(services.into_iter().collect());
        self
    }

    /// Applies the name policy, making sure `name` and `name_prefix` are not both set.
    pub(crate) fn resolve(mut self, policy: NamePolicy) -> Result<Self> {
        if self.name.is_some() && self.name_prefix.is_some() {
            match policy {
                NamePolicy::Reject => {
                    return Err(Error::InvalidOptions(
                        "`name` and `namePrefix` are mutually exclusive".to_string(),
                    ))
                }
                NamePolicy::PreferName => self.name_prefix = None,
                NamePolicy::PreferPrefix => self.name = None,
            }
        }

        Ok(self)
    }

    /// Builds the request handed to the host device chooser.
    ///
    /// Any of a non-empty name, a non-empty prefix or a service list selects a filtered
    /// chooser; otherwise every device is accepted.
    pub(crate) fn into_request(self) -> DeviceRequest {
        let has_name = self.name.as_deref().map_or(false, |n| !n.is_empty());
        let has_prefix = self.name_prefix.as_deref().map_or(false, |p| !p.is_empty());

        if has_name || has_prefix || self.services.is_some() {
            DeviceRequest::Filtered {
                filters: vec![DeviceFilter {
                    services: self.services,
                    name: self.name,
                    name_prefix: self.name_prefix,
                }],
                optional_services: self.optional_services,
            }
        } else {
            DeviceRequest::AcceptAll {
                optional_services: self.optional_services,
            }
        }
    }
}

/// What to do when both `name` and `name_prefix` are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamePolicy {
    /// Fail the request with [`Error::InvalidOptions`].
    #[default]
    Reject,
    /// Keep `name` and ignore `name_prefix`.
    PreferName,
    /// Keep `name_prefix` and ignore `name`.
    PreferPrefix,
}

/// Request passed to [`Host::request_device`](crate::host::Host::request_device).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRequest {
    /// Only devices matching at least one of the filters may be chosen.
    Filtered {
        filters: Vec<DeviceFilter>,
        optional_services: Option<Vec<Uuid>>,
    },
    /// Any device may be chosen.
    AcceptAll { optional_services: Option<Vec<Uuid>> },
}

impl DeviceRequest {
    pub fn optional_services(&self) -> Option<&[Uuid]> {
        match self {
            DeviceRequest::Filtered {
                optional_services, ..
            }
            | DeviceRequest::AcceptAll { optional_services } => optional_services.as_deref(),
        }
    }

    /// Union of the services named by all filters.
    pub fn filter_services(&self) -> Vec<Uuid> {
        let mut services = Vec::new();

        if let DeviceRequest::Filtered { filters, .. } = self {
            for uuid in filters.iter().flat_map(|f| f.services.iter().flatten()) {
                if !services.contains(uuid) {
                    services.push(*uuid);
                }
            }
        }

        services
    }
}

/// A single device filter. Every criterion that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub services: Option<Vec<Uuid>>,
    pub name: Option<String>,
    pub name_prefix: Option<String>,
}

impl DeviceFilter {
    /// Checks an advertisement against the filter.
    ///
    /// Returns `None` if the filter needs the device name and it is not known yet.
    pub fn matches(&self, name: Option<&str>, advertised: &[Uuid]) -> Option<bool> {
        if let Some(services) = &self.services {
            if !services.iter().all(|uuid| advertised.contains(uuid)) {
                return Some(false);
            }
        }

        if self.name.is_none() && self.name_prefix.is_none() {
            return Some(true);
        }

        let name = name?;

        let name_matches = self.name.as_deref().map_or(true, |n| n == name);
        let prefix_matches = self
            .name_prefix
            .as_deref()
            .map_or(true, |p| name.starts_with(p));

        Some(name_matches && prefix_matches)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UuidRepr {
    Alias(u32),
    Full(Uuid),
}

impl From<UuidRepr> for Uuid {
    fn from(repr: UuidRepr) -> Self {
        match repr {
            UuidRepr::Alias(alias) => match u16::try_from(alias) {
                Ok(short) => uuid_from_u16(short),
                Err(_) => uuid_from_u32(alias),
            },
            UuidRepr::Full(uuid) => uuid,
        }
    }
}

fn uuid_list<'de, D>(deserializer: D) -> Result<Option<Vec<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = Option::<Vec<UuidRepr>>::deserialize(deserializer)?;
    Ok(list.map(|list| list.into_iter().map(Uuid::from).collect()))
}

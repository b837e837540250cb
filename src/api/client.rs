//! Purpose: Map Affinity API resources onto the transport primitive.
//! Exports: `Affinity`, `FieldsQuery`, `FieldValuesQuery`, `PersonsQuery`,
//! `PersonOptions`, `RawOrganizations`, `API_KEY_ENV`.
//! Role: One method per resource; builds query parameters, calls the
//! transport, decodes JSON into entities, and surfaces continuation tokens.
//! Invariants: Unset parameters are omitted from requests entirely.
//! Invariants: Transport errors propagate unchanged; no retries, no logging.

use crate::api::models::{Field, FieldValue, List, ListEntry, ListWithFields, Organization, Person};
use crate::api::page::{Page, Pager};
use crate::api::transport::{Transport, UreqTransport};
use crate::api::ApiResult;
use crate::core::error::{Error, ErrorKind};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Environment variable holding the API key for `Affinity::from_env`.
pub const API_KEY_ENV: &str = "AFFINITY_API_KEY";

/// Optional filters for the fields collection. Boolean flags are sent only
/// when true; false is the server default and sending it would override
/// server-side behavior.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldsQuery {
    pub list_id: Option<u64>,
    pub value_type: Option<i64>,
    pub entity_type: Option<i64>,
    pub with_modified_names: bool,
    pub exclude_dropdown_options: bool,
}

/// Identifies whose field values to fetch. Exactly one identifier must be
/// set; this is validated before any network call. Presence is tracked by
/// `Option`, so an id of 0 counts as provided.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldValuesQuery {
    pub person_id: Option<u64>,
    pub organization_id: Option<u64>,
    pub opportunity_id: Option<u64>,
    pub list_entry_id: Option<u64>,
}

impl FieldValuesQuery {
    pub fn person(id: u64) -> Self {
        Self {
            person_id: Some(id),
            ..Self::default()
        }
    }

    pub fn organization(id: u64) -> Self {
        Self {
            organization_id: Some(id),
            ..Self::default()
        }
    }

    pub fn opportunity(id: u64) -> Self {
        Self {
            opportunity_id: Some(id),
            ..Self::default()
        }
    }

    pub fn list_entry(id: u64) -> Self {
        Self {
            list_entry_id: Some(id),
            ..Self::default()
        }
    }

    fn to_param(&self) -> ApiResult<(&'static str, String)> {
        let mut present = Vec::new();
        if let Some(id) = self.person_id {
            present.push(("person_id", id));
        }
        if let Some(id) = self.organization_id {
            present.push(("organization_id", id));
        }
        if let Some(id) = self.opportunity_id {
            present.push(("opportunity_id", id));
        }
        if let Some(id) = self.list_entry_id {
            present.push(("list_entry_id", id));
        }
        match present.as_slice() {
            [(name, id)] => Ok((*name, id.to_string())),
            [] => Err(Error::new(ErrorKind::InvalidArgument).with_message(
                "exactly one of person_id, organization_id, opportunity_id, list_entry_id must be set",
            )),
            _ => Err(Error::new(ErrorKind::InvalidArgument).with_message(
                "only one of person_id, organization_id, opportunity_id, list_entry_id may be set",
            )),
        }
    }
}

/// Search parameters for the persons collection. `extra` pairs are merged
/// into the query verbatim, for filters the API supports but this client
/// does not name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersonsQuery {
    pub term: Option<String>,
    pub with_interaction_dates: bool,
    pub with_interaction_persons: bool,
    pub with_opportunities: bool,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub extra: Vec<(String, String)>,
}

/// Flags for the single-person resource. This endpoint expects all three
/// flags on every request, unlike the collection filters which omit false.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PersonOptions {
    pub with_interaction_dates: bool,
    pub with_interaction_persons: bool,
    pub with_opportunities: bool,
}

/// The organizations endpoint returns its body un-decoded; this newtype
/// keeps callers from mistaking it for a mapped entity sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct RawOrganizations(pub Value);

impl RawOrganizations {
    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Opt-in typed decoding. Accepts both the bare-array shape and the
    /// `{organizations, next_page_token}` envelope.
    pub fn decode(&self) -> ApiResult<Page<Organization>> {
        match &self.0 {
            Value::Array(_) => Ok(Page::new(
                decode(self.0.clone(), "organizations")?,
                None,
            )),
            Value::Object(_) => {
                let envelope: OrganizationsEnvelope = decode(self.0.clone(), "organizations")?;
                Ok(Page::new(envelope.organizations, envelope.next_page_token))
            }
            _ => Err(Error::new(ErrorKind::Decode)
                .with_message("organizations response must be an array or envelope")),
        }
    }
}

#[derive(Deserialize)]
struct ListEntriesEnvelope {
    list_entries: Vec<ListEntry>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct PersonsEnvelope {
    persons: Vec<Person>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct OrganizationsEnvelope {
    organizations: Vec<Organization>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The client. Generic over the transport so tests can substitute a mock;
/// `Affinity::new` wires in the real blocking HTTP transport.
pub struct Affinity<T: Transport = UreqTransport> {
    transport: T,
}

impl Affinity<UreqTransport> {
    pub fn new(api_key: &str) -> ApiResult<Self> {
        Ok(Self {
            transport: UreqTransport::new(api_key)?,
        })
    }

    pub fn from_env() -> ApiResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("{API_KEY_ENV} is not set"))
        })?;
        Self::new(&api_key)
    }
}

impl<T: Transport> Affinity<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All lists. The API returns the full set; no pagination here.
    pub fn lists(&self) -> ApiResult<Vec<List>> {
        decode(self.transport.get(&["lists"], &[])?, "lists")
    }

    /// First list whose name matches exactly (case-sensitive), or `None`.
    /// A linear scan over `lists()`; this is not a hot path.
    pub fn list_by_name(&self, name: &str) -> ApiResult<Option<List>> {
        Ok(self.lists()?.into_iter().find(|list| list.name == name))
    }

    pub fn list_by_id(&self, list_id: u64) -> ApiResult<ListWithFields> {
        let list_id = list_id.to_string();
        decode(self.transport.get(&["lists", &list_id], &[])?, "list")
    }

    /// One page of entries for a list. The body is either a bare array
    /// (legacy shape, no more pages) or a `{list_entries, next_page_token}`
    /// envelope; both normalize to a `Page`.
    pub fn list_entries(
        &self,
        list_id: u64,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> ApiResult<Page<ListEntry>> {
        let mut query = Vec::new();
        // A page_size of 0 and an empty token are treated as unset and
        // omitted, matching the upstream handling of falsy parameters.
        if let Some(size) = page_size.filter(|size| *size != 0) {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = page_token.filter(|token| !token.is_empty()) {
            query.push(("page_token", token.to_string()));
        }
        let list_id = list_id.to_string();
        let body = self
            .transport
            .get(&["lists", &list_id, "list-entries"], &query)?;
        match body {
            Value::Array(_) => Ok(Page::new(decode(body, "list entries")?, None)),
            Value::Object(_) => {
                let envelope: ListEntriesEnvelope = decode(body, "list entries")?;
                Ok(Page::new(envelope.list_entries, envelope.next_page_token))
            }
            _ => Err(Error::new(ErrorKind::Decode)
                .with_message("list entries response must be an array or envelope")),
        }
    }

    pub fn list_entry_by_id(&self, list_id: u64, entry_id: u64) -> ApiResult<ListEntry> {
        let list_id = list_id.to_string();
        let entry_id = entry_id.to_string();
        decode(
            self.transport
                .get(&["lists", &list_id, "list-entries", &entry_id], &[])?,
            "list entry",
        )
    }

    pub fn fields(&self, query: &FieldsQuery) -> ApiResult<Vec<Field>> {
        let mut params = Vec::new();
        if let Some(list_id) = query.list_id {
            params.push(("list_id", list_id.to_string()));
        }
        if let Some(value_type) = query.value_type {
            params.push(("value_type", value_type.to_string()));
        }
        if let Some(entity_type) = query.entity_type {
            params.push(("entity_type", entity_type.to_string()));
        }
        if query.with_modified_names {
            params.push(("with_modified_names", "true".to_string()));
        }
        if query.exclude_dropdown_options {
            params.push(("exclude_dropdown_options", "true".to_string()));
        }
        decode(self.transport.get(&["fields"], &params)?, "fields")
    }

    /// Field values for exactly one owning entity. Fails with
    /// `InvalidArgument` before any network call otherwise.
    pub fn field_values(&self, query: &FieldValuesQuery) -> ApiResult<Vec<FieldValue>> {
        let (name, value) = query.to_param()?;
        decode(
            self.transport.get(&["field-values"], &[(name, value)])?,
            "field values",
        )
    }

    /// One page of persons. The response must be an envelope carrying both
    /// `persons` and `next_page_token`; there is no bare-array legacy shape
    /// for this endpoint.
    pub fn persons(&self, query: &PersonsQuery) -> ApiResult<Page<Person>> {
        let mut params = Vec::new();
        if let Some(term) = &query.term {
            params.push(("term", term.clone()));
        }
        if query.with_interaction_dates {
            params.push(("with_interaction_dates", "true".to_string()));
        }
        if query.with_interaction_persons {
            params.push(("with_interaction_persons", "true".to_string()));
        }
        if query.with_opportunities {
            params.push(("with_opportunities", "true".to_string()));
        }
        if let Some(size) = query.page_size {
            params.push(("page_size", size.to_string()));
        }
        if let Some(token) = &query.page_token {
            params.push(("page_token", token.clone()));
        }
        for (name, value) in &query.extra {
            params.push((name.as_str(), value.clone()));
        }

        let body = self.transport.get(&["persons"], &params)?;
        match body.as_object() {
            Some(object)
                if object.contains_key("persons") && object.contains_key("next_page_token") => {}
            Some(_) => {
                return Err(Error::new(ErrorKind::Decode)
                    .with_message("persons response is missing persons or next_page_token"));
            }
            None => {
                return Err(
                    Error::new(ErrorKind::Decode).with_message("persons response must be an object")
                );
            }
        }
        let envelope: PersonsEnvelope = decode(body, "persons")?;
        Ok(Page::new(envelope.persons, envelope.next_page_token))
    }

    pub fn person_by_id(&self, person_id: u64, options: PersonOptions) -> ApiResult<Person> {
        // All three flags are sent on every request, true or false; this
        // endpoint treats them differently from the collection filters.
        let params = [
            (
                "with_interaction_dates",
                options.with_interaction_dates.to_string(),
            ),
            (
                "with_interaction_persons",
                options.with_interaction_persons.to_string(),
            ),
            (
                "with_opportunities",
                options.with_opportunities.to_string(),
            ),
        ];
        let person_id = person_id.to_string();
        decode(
            self.transport.get(&["persons", &person_id], &params)?,
            "person",
        )
    }

    /// The raw decoded body of the organizations collection. Deliberately
    /// un-mapped; see `RawOrganizations::decode` for opt-in typing.
    pub fn organizations(&self) -> ApiResult<RawOrganizations> {
        Ok(RawOrganizations(
            self.transport.get(&["organizations"], &[])?,
        ))
    }

    /// Cursor over every page of a list's entries.
    pub fn list_entry_pages(
        &self,
        list_id: u64,
        page_size: Option<u32>,
    ) -> Pager<ListEntry, impl FnMut(Option<&str>) -> ApiResult<Page<ListEntry>> + '_> {
        Pager::new(move |token| self.list_entries(list_id, page_size, token))
    }

    /// Cursor over every page of a persons query. The query's own
    /// `page_token` is replaced by the cursor's token on each fetch.
    pub fn person_pages(
        &self,
        query: PersonsQuery,
    ) -> Pager<Person, impl FnMut(Option<&str>) -> ApiResult<Page<Person>> + '_> {
        Pager::new(move |token| {
            let mut query = query.clone();
            query.page_token = token.map(str::to_string);
            self.persons(&query)
        })
    }
}

fn decode<R: DeserializeOwned>(body: Value, what: &str) -> ApiResult<R> {
    serde_json::from_value(body).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("unexpected {what} response shape"))
            .with_source(err)
    })
}

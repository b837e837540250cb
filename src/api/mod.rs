//! Purpose: Define the public API surface of the client crate.
//! Exports: The client, its query types, domain entities, pagination, and
//! the transport seam.
//! Role: The only public path to the resource mapper and transport.
//! Invariants: Additive-only surface; internal helpers stay private.

mod client;
mod models;
mod page;
mod transport;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use client::{
    API_KEY_ENV, Affinity, FieldValuesQuery, FieldsQuery, PersonOptions, PersonsQuery,
    RawOrganizations,
};
pub use models::{
    DropdownOption, Field, FieldValue, List, ListEntry, ListWithFields, Organization, Person,
};
pub use page::{Page, PageState, Pager};
pub use transport::{DEFAULT_BASE_URL, Transport, UreqTransport};

pub type ApiResult<T> = Result<T, Error>;

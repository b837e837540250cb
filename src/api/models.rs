//! Purpose: Define the domain entities decoded from Affinity API responses.
//! Exports: `List`, `ListWithFields`, `Field`, `DropdownOption`, `ListEntry`,
//! `FieldValue`, `Person`, `Organization`.
//! Role: Immutable snapshot values; created once at decode time, never mutated.
//! Invariants: Wire names are preserved on encode and decode, including the
//! reserved identifiers `type` and `global`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named collection in the CRM.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct List {
    pub id: u64,
    #[serde(rename = "type")]
    pub list_type: i64,
    pub name: String,
    pub public: bool,
    pub owner_id: u64,
    pub list_size: u64,
}

/// The single-list resource: list attributes plus its schema fields.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ListWithFields {
    #[serde(flatten)]
    pub list: List,
    pub fields: Vec<Field>,
}

/// A schema-defined attribute belonging to a list.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Field {
    pub id: u64,
    pub name: String,
    pub list_id: u64,
    pub allows_multiple: bool,
    /// Present only for dropdown-like value types.
    #[serde(default)]
    pub dropdown_options: Option<Vec<DropdownOption>>,
    pub value_type: i64,
    pub track_changes: bool,
    #[serde(default)]
    pub enrichment_source: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DropdownOption {
    pub id: u64,
    pub color: i64,
    /// Display order; ranks are not unique.
    pub rank: i64,
    pub text: String,
}

/// A member record of a list. The embedded `entity` payload is loosely
/// typed; its shape depends on `entity_type`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ListEntry {
    pub id: u64,
    pub list_id: u64,
    pub creator_id: u64,
    pub entity_type: i64,
    pub entity_id: u64,
    pub entity: Value,
    pub created_at: String,
}

/// A field's value on a specific entity. `value` is polymorphic on the
/// wire: string, number, date, or array.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FieldValue {
    pub id: u64,
    pub field_id: u64,
    pub entity_id: u64,
    pub entity_type: i64,
    #[serde(default)]
    pub list_entry_id: Option<u64>,
    pub value: Value,
    pub value_type: i64,
}

/// Interaction and opportunity fields are populated only when the query
/// asked for them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Person {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub interaction_dates: Option<Value>,
    #[serde(default)]
    pub interactions: Option<Value>,
    #[serde(default)]
    pub opportunity_ids: Option<Vec<u64>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Organization {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub crunchbase_uuid: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    /// Wire name `global` is a reserved identifier; mapped here and
    /// restored on encode.
    #[serde(rename = "global")]
    pub is_global: bool,
    #[serde(default)]
    pub person_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub opportunity_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub list_entries: Option<Vec<ListEntry>>,
    #[serde(default)]
    pub interaction_dates: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::{Field, List, ListEntry, ListWithFields, Organization, Person};
    use serde_json::json;

    #[test]
    fn list_decodes_reserved_type_field() {
        let list: List = serde_json::from_value(json!({
            "id": 450, "type": 0, "name": "Deals", "public": true,
            "owner_id": 38706, "list_size": 12
        }))
        .expect("list");
        assert_eq!(list.list_type, 0);
        assert_eq!(list.name, "Deals");

        let encoded = serde_json::to_value(&list).expect("encode");
        assert_eq!(encoded["type"], json!(0));
        assert!(encoded.get("list_type").is_none());
    }

    #[test]
    fn list_with_fields_flattens_list_attributes() {
        let list: ListWithFields = serde_json::from_value(json!({
            "id": 450, "type": 1, "name": "Portfolio", "public": false,
            "owner_id": 1, "list_size": 3,
            "fields": [{
                "id": 7, "name": "Stage", "list_id": 450,
                "allows_multiple": false,
                "dropdown_options": [
                    {"id": 1, "color": 0, "rank": 1, "text": "New"},
                    {"id": 2, "color": 3, "rank": 0, "text": "Won"}
                ],
                "value_type": 7, "track_changes": true,
                "enrichment_source": "none"
            }]
        }))
        .expect("list with fields");
        assert_eq!(list.list.id, 450);
        assert_eq!(list.fields.len(), 1);
        let options = list.fields[0].dropdown_options.as_ref().expect("options");
        assert_eq!(options[1].text, "Won");
    }

    #[test]
    fn field_without_dropdown_options_decodes() {
        let field: Field = serde_json::from_value(json!({
            "id": 8, "name": "Amount", "list_id": 450,
            "allows_multiple": false, "value_type": 3, "track_changes": false
        }))
        .expect("field");
        assert!(field.dropdown_options.is_none());
        assert!(field.enrichment_source.is_none());
    }

    #[test]
    fn list_entry_keeps_loose_entity_payload() {
        let entry: ListEntry = serde_json::from_value(json!({
            "id": 101, "list_id": 450, "creator_id": 38706,
            "entity_type": 0, "entity_id": 900,
            "entity": {"id": 900, "first_name": "Ada", "last_name": "Lovelace"},
            "created_at": "2023-01-01T00:00:00.000Z"
        }))
        .expect("entry");
        assert_eq!(entry.entity["first_name"], json!("Ada"));
        assert_eq!(entry.created_at, "2023-01-01T00:00:00.000Z");
    }

    #[test]
    fn person_tolerates_absent_optional_sections() {
        let person: Person = serde_json::from_value(json!({
            "id": 900, "first_name": "Ada", "last_name": "Lovelace",
            "emails": ["ada@example.com"]
        }))
        .expect("person");
        assert!(person.interaction_dates.is_none());
        assert!(person.opportunity_ids.is_none());
    }

    #[test]
    fn organization_maps_global_wire_name() {
        let org: Organization = serde_json::from_value(json!({
            "id": 64, "name": "Acme", "domain": "acme.test",
            "crunchbase_uuid": null, "domains": ["acme.test"],
            "global": true
        }))
        .expect("organization");
        assert!(org.is_global);

        let encoded = serde_json::to_value(&org).expect("encode");
        assert_eq!(encoded["global"], json!(true));
        assert!(encoded.get("is_global").is_none());
    }
}

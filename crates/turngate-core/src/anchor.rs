use serde::{Deserialize, Serialize};

/// The persisted record a tool selected as the subject of a sensitive query
/// (§3, Glossary). Never built from untrusted input — always constructed by
/// `turngate-identity::verification::create_anchor` from a record a tool
/// located in a source table.
///
/// References its owning customer only by id (§9 "Cyclic references") —
/// never embeds the mutable customer record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The identifier value the user supplied (order number, ticket number…).
    pub value: String,
    pub anchor_type: String,
    pub source_table: String,
}

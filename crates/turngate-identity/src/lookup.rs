//! External collaborator seam for customer/order lookups (§1: out of scope —
//! persistence schema choices and business-tool handlers are named
//! collaborators behind small interfaces, never hard-wired here).

use async_trait::async_trait;

/// A customer row match, scoped to the fields identity derivation needs.
#[derive(Debug, Clone)]
pub struct CustomerMatch {
    pub customer_id: String,
}

/// An order row match, used only when the customer table itself is empty
/// (§4.5 WHATSAPP fallback path).
#[derive(Debug, Clone)]
pub struct OrderMatch {
    pub order_id: String,
    pub customer_id: String,
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Search the customer table by any of the supplied phone variants.
    async fn customers_by_phone(&self, variants: &[String]) -> Result<Vec<CustomerMatch>, String>;

    /// Search the order table by any of the supplied phone variants — used
    /// only when `customers_by_phone` finds nothing and the customer table
    /// for this business is empty.
    async fn orders_by_phone(&self, variants: &[String]) -> Result<Vec<OrderMatch>, String>;

    /// Case-insensitive customer lookup by email.
    async fn customers_by_email(&self, email: &str) -> Result<Vec<CustomerMatch>, String>;

    /// Whether the customer table has any rows at all for this business —
    /// gates the order-table fallback in the WHATSAPP path.
    async fn customer_table_is_empty(&self) -> Result<bool, String>;
}

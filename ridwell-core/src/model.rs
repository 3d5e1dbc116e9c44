//! Domain data structures for accounts, pickup events, and pricing.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of the authenticated user, as embedded in the session token.
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a subscriber account.
pub struct AccountId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for an account's subscription.
pub struct SubscriptionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a single pickup event (a "subscription pickup" to the vendor).
pub struct EventId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a pickup offer.
pub struct OfferId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a pickup product.
pub struct ProductId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Serviced street address of an account.
pub struct Address {
    /// First street line.
    pub street1: String,
    /// City name.
    pub city: String,
    /// State or subdivision code.
    pub state: String,
    /// Postal code.
    pub postal_code: String,
}

/// Category names the vendor bills as part of the base subscription.
const STANDARD_NAMES: [&str; 5] = [
    "Batteries",
    "Light Bulbs",
    "Multi-Layer Plastic",
    "Plastic Film",
    "Threads",
];

/// Category names the vendor always bills separately.
const ADD_ON_NAMES: [&str; 5] = [
    "Beyond the Bin",
    "Fluorescent Light Tubes",
    "Latex Paint",
    "Paint",
    "Styrofoam",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Billing category of a pickup.
pub enum PickupCategory {
    /// Separately billed extra item.
    AddOn,
    /// Featured item that rotates from event to event; always billed.
    Rotating,
    /// Regular item covered by the subscription's free allotment.
    Standard,
}

impl PickupCategory {
    /// Derive the category from the vendor's category name.
    ///
    /// Names that are neither known standard nor known add-on categories are
    /// assumed to be rotating. Rotating pickups are always billable, so the
    /// assumption can only overstate an estimate, never hide a charge.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        let matches = |known: &&str| known.eq_ignore_ascii_case(name);
        if STANDARD_NAMES.iter().any(matches) {
            Self::Standard
        } else if ADD_ON_NAMES.iter().any(matches) {
            Self::AddOn
        } else {
            Self::Rotating
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Confirmation state of a pickup event.
pub enum EventState {
    /// Created by the vendor but not confirmed for pickup.
    Initialized,
    /// Confirmed for pickup.
    Scheduled,
}

impl EventState {
    /// Wire representation of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Scheduled => "scheduled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One line item (product/offer selection) within a pickup event.
pub struct Pickup {
    /// Human-readable category name, e.g. "Threads".
    pub name: String,
    /// Billing category derived from the name.
    pub category: PickupCategory,
    /// Offer the selection belongs to.
    pub offer_id: OfferId,
    /// Concrete product being picked up.
    pub product_id: ProductId,
    /// Ordering value; lower values are served first.
    pub priority: u32,
    /// Number of units selected.
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Unit price for one product/offer pair.
pub struct CatalogPrice {
    /// Product the price applies to.
    pub product_id: ProductId,
    /// Offer the price applies to.
    pub offer_id: OfferId,
    /// Price per unit in cents.
    pub unit_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Vendor pricing configuration for one pickup event.
pub struct PickupCatalog {
    /// Number of standard-category units included at no charge.
    pub included_standard_units: u32,
    /// Unit prices keyed by product and offer.
    pub prices: Vec<CatalogPrice>,
}

impl PickupCatalog {
    /// Look up the unit price for a product/offer pair.
    #[must_use]
    pub fn unit_cents_for(&self, product_id: &ProductId, offer_id: &OfferId) -> Option<i64> {
        self.prices
            .iter()
            .find(|price| price.product_id == *product_id && price.offer_id == *offer_id)
            .map(|price| price.unit_cents)
    }
}

//! Traits describing the vendor backend, plus the shared error type.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};

use crate::model::{
    AccountId, Address, EventId, EventState, Pickup, PickupCatalog, SubscriptionId,
};

#[derive(thiserror::Error, Debug)]
/// Errors surfaced by any Ridwell operation.
pub enum RidwellError {
    /// The vendor rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Transport-level failure: connect, TLS, timeout, or a non-2xx status.
    #[error("network error: {0}")]
    Network(#[source] ReqwestError),
    /// The vendor rejected the operation or returned a malformed payload.
    #[error("request failed: {0}")]
    Request(String),
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ReqwestError> for RidwellError {
    fn from(error: ReqwestError) -> Self {
        // A body that fails to decode is a malformed response, not a transport fault.
        if error.is_decode() {
            Self::Request(error.to_string())
        } else {
            Self::Network(error)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Account data as returned by the backend, before a port handle is attached.
pub struct AccountRecord {
    /// Unique account identifier.
    pub account_id: AccountId,
    /// Serviced address.
    pub address: Address,
    /// Owner email.
    pub email: String,
    /// Owner full name.
    pub full_name: String,
    /// Owner phone number.
    pub phone: String,
    /// Primary subscription identifier.
    pub subscription_id: SubscriptionId,
    /// Whether the subscription is currently active.
    pub subscription_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Pickup event data as returned by the backend; no ordering is guaranteed.
pub struct PickupEventRecord {
    /// Unique event identifier.
    pub event_id: EventId,
    /// Date the pickup takes place.
    pub pickup_date: NaiveDate,
    /// Selected line items.
    pub pickups: Vec<Pickup>,
    /// Current confirmation state.
    pub state: EventState,
}

#[async_trait]
/// Backend interface for listing the authenticated user's accounts.
pub trait AccountPort: Send + Sync {
    /// Fetch all accounts belonging to the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the backend call fails.
    async fn accounts(&self) -> Result<Vec<AccountRecord>, RidwellError>;
}

#[async_trait]
/// Backend interface for subscription pickups: listing, state changes, pricing.
pub trait PickupPort: Send + Sync {
    /// Fetch all upcoming pickup events for a subscription.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the backend call fails.
    async fn pickup_events(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<PickupEventRecord>, RidwellError>;

    /// Request the given confirmation state for an event and return the state
    /// the vendor confirmed.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the vendor rejects the mutation.
    async fn set_event_state(
        &self,
        event_id: &EventId,
        state: EventState,
    ) -> Result<EventState, RidwellError>;

    /// Fetch the current pricing catalog applicable to an event.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the backend call fails.
    async fn pickup_pricing(&self, event_id: &EventId) -> Result<PickupCatalog, RidwellError>;
}

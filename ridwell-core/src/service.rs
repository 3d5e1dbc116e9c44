//! Client facade and the account/event objects it hands out.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::model::{
    AccountId, Address, EventId, EventState, Pickup, PickupCatalog, PickupCategory, SubscriptionId,
    UserId,
};
use crate::ports::{AccountPort, AccountRecord, PickupEventRecord, PickupPort, RidwellError};

/// Public entry point for the Ridwell API, bound to one authenticated user.
pub struct RidwellClient {
    user_id: UserId,
    account_port: Arc<dyn AccountPort>,
    pickup_port: Arc<dyn PickupPort>,
}

impl RidwellClient {
    /// Create a new client bound to the provided ports.
    #[must_use]
    pub fn new(
        user_id: UserId,
        account_port: Arc<dyn AccountPort>,
        pickup_port: Arc<dyn PickupPort>,
    ) -> Self {
        Self {
            user_id,
            account_port,
            pickup_port,
        }
    }

    /// Identifier of the authenticated user.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Web dashboard URL for the authenticated user. No network call.
    #[must_use]
    pub fn dashboard_url(&self) -> String {
        format!("https://www.ridwell.com/users/{}/dashboard", self.user_id)
    }

    /// Fetch all accounts belonging to the authenticated user, keyed by
    /// account id.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the backend call fails.
    pub async fn accounts(&self) -> Result<HashMap<AccountId, Account>, RidwellError> {
        let records = self.account_port.accounts().await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let account_id = record.account_id.clone();
                (
                    account_id,
                    Account::new(record, Arc::clone(&self.pickup_port)),
                )
            })
            .collect())
    }
}

impl fmt::Debug for RidwellClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RidwellClient")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// One subscriber account; a fresh snapshot is fetched on every listing call.
#[derive(Clone)]
pub struct Account {
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

    pickup_port: Arc<dyn PickupPort>,
}

impl Account {
    /// Build an account from a backend record and the port handle used for
    /// further scoped calls.
    #[must_use]
    pub fn new(record: AccountRecord, pickup_port: Arc<dyn PickupPort>) -> Self {
        Self {
            account_id: record.account_id,
            address: record.address,
            email: record.email,
            full_name: record.full_name,
            phone: record.phone,
            subscription_id: record.subscription_id,
            subscription_active: record.subscription_active,
            pickup_port,
        }
    }

    /// Fetch all pickup events for this account's subscription, sorted by
    /// ascending pickup date.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the backend call fails.
    pub async fn pickup_events(&self) -> Result<Vec<PickupEvent>, RidwellError> {
        let mut records = self.pickup_port.pickup_events(&self.subscription_id).await?;
        records.sort_by_key(|record| record.pickup_date);
        Ok(records
            .into_iter()
            .map(|record| PickupEvent::new(record, Arc::clone(&self.pickup_port)))
            .collect())
    }

    /// Fetch the earliest pickup event on or after today.
    ///
    /// # Errors
    ///
    /// Returns [`RidwellError::NotFound`] when every event lies in the past,
    /// or another [`RidwellError`] when the backend call fails.
    pub async fn next_pickup_event(&self) -> Result<PickupEvent, RidwellError> {
        self.next_pickup_event_on_or_after(Local::now().date_naive())
            .await
    }

    /// Fetch the earliest pickup event whose date is on or after `date`.
    ///
    /// # Errors
    ///
    /// Returns [`RidwellError::NotFound`] when no such event exists, or
    /// another [`RidwellError`] when the backend call fails.
    pub async fn next_pickup_event_on_or_after(
        &self,
        date: NaiveDate,
    ) -> Result<PickupEvent, RidwellError> {
        self.pickup_events()
            .await?
            .into_iter()
            .find(|event| event.pickup_date >= date)
            .ok_or_else(|| RidwellError::NotFound(format!("no pickup event on or after {date}")))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Account")
            .field("account_id", &self.account_id)
            .field("address", &self.address)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .field("subscription_id", &self.subscription_id)
            .field("subscription_active", &self.subscription_active)
            .finish_non_exhaustive()
    }
}

/// One scheduled or pending collection occurrence.
#[derive(Clone)]
pub struct PickupEvent {
    /// Unique event identifier.
    pub event_id: EventId,
    /// Date the pickup takes place.
    pub pickup_date: NaiveDate,
    /// Selected line items.
    pub pickups: Vec<Pickup>,
    /// Current confirmation state; updated after a successful opt-in/opt-out.
    pub state: EventState,

    pickup_port: Arc<dyn PickupPort>,
}

impl PickupEvent {
    /// Build an event from a backend record and the port handle used for
    /// further scoped calls.
    #[must_use]
    pub fn new(record: PickupEventRecord, pickup_port: Arc<dyn PickupPort>) -> Self {
        Self {
            event_id: record.event_id,
            pickup_date: record.pickup_date,
            pickups: record.pickups,
            state: record.state,
            pickup_port,
        }
    }

    /// Confirm participation in this pickup event.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the vendor rejects the mutation; the
    /// local state is left untouched in that case.
    pub async fn opt_in(&mut self) -> Result<(), RidwellError> {
        self.set_state(EventState::Scheduled).await
    }

    /// Decline participation in this pickup event.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the vendor rejects the mutation; the
    /// local state is left untouched in that case.
    pub async fn opt_out(&mut self) -> Result<(), RidwellError> {
        self.set_state(EventState::Initialized).await
    }

    async fn set_state(&mut self, state: EventState) -> Result<(), RidwellError> {
        let confirmed = self.pickup_port.set_event_state(&self.event_id, state).await?;
        self.state = confirmed;
        Ok(())
    }

    /// Estimate the cost of this pickup event in dollars, based on the
    /// vendor's current catalog pricing.
    ///
    /// The catalog is fetched once per invocation and shared across all line
    /// items; nothing is cached between invocations.
    ///
    /// # Errors
    ///
    /// Returns a [`RidwellError`] when the pricing call fails or a billable
    /// line item has no catalog price.
    pub async fn estimated_cost(&self) -> Result<Decimal, RidwellError> {
        if self.pickups.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let catalog = self.pickup_port.pickup_pricing(&self.event_id).await?;
        estimate_cost(&catalog, &self.pickups)
    }
}

impl fmt::Debug for PickupEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PickupEvent")
            .field("event_id", &self.event_id)
            .field("pickup_date", &self.pickup_date)
            .field("pickups", &self.pickups)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Sum catalog prices over the pickups. Standard-category pickups consume the
/// free allotment in ascending priority order; every other unit is billed at
/// its catalog rate.
fn estimate_cost(catalog: &PickupCatalog, pickups: &[Pickup]) -> Result<Decimal, RidwellError> {
    let mut ordered: Vec<&Pickup> = pickups.iter().collect();
    ordered.sort_by_key(|pickup| pickup.priority);

    let mut remaining_allotment = catalog.included_standard_units;
    let mut total_cents: i64 = 0;

    for pickup in ordered {
        let mut billable_units = pickup.quantity;
        if pickup.category == PickupCategory::Standard {
            let free = remaining_allotment.min(pickup.quantity);
            remaining_allotment -= free;
            billable_units -= free;
        }
        if billable_units == 0 {
            continue;
        }

        let unit_cents = catalog
            .unit_cents_for(&pickup.product_id, &pickup.offer_id)
            .ok_or_else(|| {
                RidwellError::Request(format!(
                    "no catalog price for product {} / offer {}",
                    pickup.product_id.0, pickup.offer_id.0
                ))
            })?;
        total_cents += unit_cents * i64::from(billable_units);
    }

    Ok(Decimal::new(total_cents, 2))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::model::{CatalogPrice, OfferId, ProductId};

    struct FakeBackend {
        accounts: Vec<AccountRecord>,
        events: Vec<PickupEventRecord>,
        catalog: Option<PickupCatalog>,
    }

    impl FakeBackend {
        fn with_events(events: Vec<PickupEventRecord>) -> Self {
            Self {
                accounts: vec![account_record("account1")],
                events,
                catalog: None,
            }
        }
    }

    #[async_trait]
    impl AccountPort for FakeBackend {
        async fn accounts(&self) -> Result<Vec<AccountRecord>, RidwellError> {
            Ok(self.accounts.clone())
        }
    }

    #[async_trait]
    impl PickupPort for FakeBackend {
        async fn pickup_events(
            &self,
            _subscription_id: &SubscriptionId,
        ) -> Result<Vec<PickupEventRecord>, RidwellError> {
            Ok(self.events.clone())
        }

        async fn set_event_state(
            &self,
            _event_id: &EventId,
            state: EventState,
        ) -> Result<EventState, RidwellError> {
            Ok(state)
        }

        async fn pickup_pricing(
            &self,
            _event_id: &EventId,
        ) -> Result<PickupCatalog, RidwellError> {
            self.catalog
                .clone()
                .ok_or_else(|| RidwellError::Request("no catalog configured".to_owned()))
        }
    }

    fn account_record(id: &str) -> AccountRecord {
        AccountRecord {
            account_id: AccountId(id.to_owned()),
            address: Address {
                street1: "123 Main Street".to_owned(),
                city: "Seattle".to_owned(),
                state: "WA".to_owned(),
                postal_code: "98101".to_owned(),
            },
            email: "user@email.com".to_owned(),
            full_name: "Jane Doe".to_owned(),
            phone: "1234567890".to_owned(),
            subscription_id: SubscriptionId("subscription1".to_owned()),
            subscription_active: true,
        }
    }

    fn event_record(id: &str, date: NaiveDate, state: EventState) -> PickupEventRecord {
        PickupEventRecord {
            event_id: EventId(id.to_owned()),
            pickup_date: date,
            pickups: Vec::new(),
            state,
        }
    }

    fn pickup(name: &str, priority: u32, quantity: u32) -> Pickup {
        Pickup {
            name: name.to_owned(),
            category: PickupCategory::for_name(name),
            offer_id: OfferId(format!("offer-{name}")),
            product_id: ProductId(format!("product-{name}")),
            priority,
            quantity,
        }
    }

    fn price_for(pickup: &Pickup, unit_cents: i64) -> CatalogPrice {
        CatalogPrice {
            product_id: pickup.product_id.clone(),
            offer_id: pickup.offer_id.clone(),
            unit_cents,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn client_with(backend: FakeBackend) -> RidwellClient {
        let backend = Arc::new(backend);
        RidwellClient::new(
            UserId("user1".to_owned()),
            Arc::clone(&backend) as Arc<dyn AccountPort>,
            backend,
        )
    }

    #[tokio::test]
    async fn accounts_are_keyed_by_account_id() {
        let client = client_with(FakeBackend::with_events(Vec::new()));

        let accounts = client.accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);

        let account = &accounts[&AccountId("account1".to_owned())];
        assert_eq!(account.account_id, AccountId("account1".to_owned()));
        assert_eq!(account.full_name, "Jane Doe");
        assert!(account.subscription_active);
    }

    #[tokio::test]
    async fn pickup_events_come_back_sorted_by_date() {
        let client = client_with(FakeBackend::with_events(vec![
            event_record("event2", date(2021, 10, 27), EventState::Initialized),
            event_record("event1", date(2021, 10, 13), EventState::Scheduled),
        ]));
        let accounts = client.accounts().await.unwrap();
        let account = &accounts[&AccountId("account1".to_owned())];

        let events = account.pickup_events().await.unwrap();
        let dates: Vec<NaiveDate> = events.iter().map(|event| event.pickup_date).collect();
        assert_eq!(dates, vec![date(2021, 10, 13), date(2021, 10, 27)]);
    }

    #[tokio::test]
    async fn next_pickup_event_picks_earliest_on_or_after_date() {
        let client = client_with(FakeBackend::with_events(vec![
            event_record("event1", date(2021, 10, 13), EventState::Scheduled),
            event_record("event2", date(2021, 10, 27), EventState::Initialized),
        ]));
        let accounts = client.accounts().await.unwrap();
        let account = &accounts[&AccountId("account1".to_owned())];

        let event = account
            .next_pickup_event_on_or_after(date(2021, 10, 14))
            .await
            .unwrap();
        assert_eq!(event.event_id, EventId("event2".to_owned()));
    }

    #[tokio::test]
    async fn next_pickup_event_fails_when_all_events_are_past() {
        let client = client_with(FakeBackend::with_events(vec![event_record(
            "event1",
            date(2021, 10, 13),
            EventState::Scheduled,
        )]));
        let accounts = client.accounts().await.unwrap();
        let account = &accounts[&AccountId("account1".to_owned())];

        let err = account
            .next_pickup_event_on_or_after(date(2021, 10, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, RidwellError::NotFound(_)));
    }

    #[tokio::test]
    async fn opt_in_then_opt_out_leaves_last_applied_state() {
        let client = client_with(FakeBackend::with_events(vec![event_record(
            "event1",
            date(2021, 10, 13),
            EventState::Initialized,
        )]));
        let accounts = client.accounts().await.unwrap();
        let account = &accounts[&AccountId("account1".to_owned())];
        let mut event = account.pickup_events().await.unwrap().remove(0);

        event.opt_in().await.unwrap();
        assert_eq!(event.state, EventState::Scheduled);

        event.opt_out().await.unwrap();
        assert_eq!(event.state, EventState::Initialized);
    }

    #[tokio::test]
    async fn estimated_cost_is_zero_without_pickups_and_makes_no_pricing_call() {
        // The fake has no catalog configured, so a pricing call would fail.
        let client = client_with(FakeBackend::with_events(vec![event_record(
            "event1",
            date(2021, 10, 13),
            EventState::Initialized,
        )]));
        let accounts = client.accounts().await.unwrap();
        let account = &accounts[&AccountId("account1".to_owned())];
        let event = account.pickup_events().await.unwrap().remove(0);

        assert_eq!(event.estimated_cost().await.unwrap(), Decimal::ZERO);
    }

    #[test]
    fn standard_pickups_within_the_allotment_are_free() {
        let threads = pickup("Threads", 1, 1);
        let bulbs = pickup("Light Bulbs", 2, 2);
        let catalog = PickupCatalog {
            included_standard_units: 3,
            prices: Vec::new(),
        };

        let cost = estimate_cost(&catalog, &[threads, bulbs]).unwrap();
        assert_eq!(cost, Decimal::ZERO);
    }

    #[test]
    fn add_on_pickups_are_charged_price_times_quantity() {
        let threads = pickup("Threads", 1, 1);
        let styrofoam = pickup("Styrofoam", 1, 2);
        let catalog = PickupCatalog {
            included_standard_units: 3,
            prices: vec![price_for(&styrofoam, 750)],
        };

        let cost = estimate_cost(&catalog, &[threads, styrofoam]).unwrap();
        assert_eq!(cost, Decimal::new(1500, 2));
    }

    #[test]
    fn standard_units_beyond_the_allotment_are_charged() {
        let threads = pickup("Threads", 1, 3);
        let catalog = PickupCatalog {
            included_standard_units: 1,
            prices: vec![price_for(&threads, 200)],
        };

        let cost = estimate_cost(&catalog, &[threads]).unwrap();
        assert_eq!(cost, Decimal::new(400, 2));
    }

    #[test]
    fn allotment_is_consumed_in_priority_order() {
        let second = pickup("Threads", 2, 1);
        let first = pickup("Light Bulbs", 1, 1);
        let catalog = PickupCatalog {
            included_standard_units: 1,
            prices: vec![price_for(&second, 200)],
        };

        // The priority-1 pickup takes the free unit; the priority-2 one is billed.
        let cost = estimate_cost(&catalog, &[second, first]).unwrap();
        assert_eq!(cost, Decimal::new(200, 2));
    }

    #[test]
    fn missing_catalog_price_fails_instead_of_defaulting() {
        let chocolate = pickup("Chocolate", 1, 1);
        let catalog = PickupCatalog {
            included_standard_units: 0,
            prices: Vec::new(),
        };

        let err = estimate_cost(&catalog, &[chocolate]).unwrap_err();
        assert!(matches!(err, RidwellError::Request(_)));
    }

    #[test]
    fn dashboard_url_is_derived_from_the_user_id() {
        let client = client_with(FakeBackend::with_events(Vec::new()));
        assert_eq!(
            client.dashboard_url(),
            "https://www.ridwell.com/users/user1/dashboard"
        );
    }
}

//! Provider implementation for the Ridwell GraphQL API.
//!
//! [`RidwellApi`] is the authenticated transport implementing the port
//! traits from `ridwell-core`; [`get_client`] wires everything into the
//! caller-facing [`RidwellClient`].

mod queries;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub use ridwell_core::{
    model::{
        AccountId, Address, CatalogPrice, EventId, EventState, OfferId, Pickup, PickupCatalog,
        PickupCategory, ProductId, SubscriptionId, UserId,
    },
    ports::{AccountPort, AccountRecord, PickupEventRecord, PickupPort, RidwellError},
    service::{Account, PickupEvent, RidwellClient},
};

/// Production endpoint of the Ridwell API.
pub const API_BASE_URL: &str = "https://api.ridwell.com";

const DATE_FORMAT: &str = "%Y-%m-%d";

// Vendor data-error messages that mean the session is unusable.
const INVALID_CREDENTIALS_MESSAGE: &str =
    "The password you entered is incorrect. Please try again.";
const LOGIN_REQUIRED_MESSAGE: &str = "login required";

/// Authenticate against the production endpoint and return a ready client.
///
/// A caller-supplied `session` is reused for connection pooling; otherwise a
/// private [`reqwest::Client`] is created and owned for the client's lifetime.
///
/// # Errors
///
/// Returns a [`RidwellError`] when the credentials are rejected or the
/// exchange cannot complete.
pub async fn get_client(
    email: &str,
    password: &str,
    session: Option<Client>,
) -> Result<RidwellClient, RidwellError> {
    get_client_with_endpoint(API_BASE_URL, email, password, session).await
}

/// Authenticate against a specific endpoint and return a ready client.
///
/// # Errors
///
/// Returns a [`RidwellError`] when the credentials are rejected or the
/// exchange cannot complete.
pub async fn get_client_with_endpoint(
    endpoint: &str,
    email: &str,
    password: &str,
    session: Option<Client>,
) -> Result<RidwellClient, RidwellError> {
    let api = Arc::new(RidwellApi::authenticate(endpoint, email, password, session).await?);
    let user_id = api.user_id().clone();
    Ok(RidwellClient::new(
        user_id,
        Arc::clone(&api) as Arc<dyn AccountPort>,
        api,
    ))
}

/// Authenticated transport for the Ridwell GraphQL API.
///
/// Holds the session token obtained at construction; no other mutable state
/// is shared across calls.
pub struct RidwellApi {
    http: Client,
    endpoint: String,
    token: String,
    user_id: UserId,
}

impl RidwellApi {
    /// Exchange credentials for a session token and return the transport.
    ///
    /// # Errors
    ///
    /// Returns [`RidwellError::Authentication`] when the vendor rejects the
    /// credentials, [`RidwellError::Network`] when the exchange cannot
    /// complete, and [`RidwellError::Request`] when the response or the
    /// returned token is malformed.
    pub async fn authenticate(
        endpoint: &str,
        email: &str,
        password: &str,
        session: Option<Client>,
    ) -> Result<Self, RidwellError> {
        let http = session.unwrap_or_default();
        let endpoint = endpoint.trim_end_matches('/').to_owned();

        let data: CreateAuthenticationData = execute(
            &http,
            &endpoint,
            None,
            "createAuthentication",
            queries::CREATE_AUTHENTICATION,
            json!({ "input": { "emailOrPhone": email, "password": password } }),
        )
        .await?;

        let token = data.create_authentication.authentication_token;
        let user_id = user_id_from_token(&token)?;

        Ok(Self {
            http,
            endpoint,
            token,
            user_id,
        })
    }

    /// Identifier decoded from the session token.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn request<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, RidwellError> {
        execute(
            &self.http,
            &self.endpoint,
            Some(&self.token),
            operation_name,
            query,
            variables,
        )
        .await
    }
}

impl fmt::Debug for RidwellApi {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The token stays out of debug output.
        formatter
            .debug_struct("RidwellApi")
            .field("endpoint", &self.endpoint)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccountPort for RidwellApi {
    async fn accounts(&self) -> Result<Vec<AccountRecord>, RidwellError> {
        let data: UserData = self
            .request(
                "user",
                queries::USER_ACCOUNTS,
                json!({ "id": self.user_id.0 }),
            )
            .await?;

        let user = data.user;
        Ok(user
            .accounts
            .into_iter()
            .map(|account| AccountRecord {
                account_id: AccountId(account.id),
                address: Address {
                    street1: account.address.street1,
                    city: account.address.city,
                    state: account.address.subdivision,
                    postal_code: account.address.postal_code,
                },
                email: user.email.clone(),
                full_name: user.full_name.clone(),
                phone: user.phone.clone(),
                subscription_id: SubscriptionId(account.active_subscription.id),
                subscription_active: account.active_subscription.state == "active",
            })
            .collect())
    }
}

#[async_trait]
impl PickupPort for RidwellApi {
    async fn pickup_events(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<PickupEventRecord>, RidwellError> {
        let data: UpcomingPickupsData = self
            .request(
                "upcomingSubscriptionPickups",
                queries::UPCOMING_SUBSCRIPTION_PICKUPS,
                json!({ "subscriptionId": subscription_id.0 }),
            )
            .await?;

        let mut events = Vec::with_capacity(data.upcoming_subscription_pickups.len());
        for node in data.upcoming_subscription_pickups {
            events.push(PickupEventRecord {
                event_id: EventId(node.id),
                pickup_date: parse_pickup_date(&node.pickup_on)?,
                pickups: node
                    .pickup_product_selections
                    .into_iter()
                    .map(pickup_from_selection)
                    .collect(),
                state: parse_event_state(&node.state)?,
            });
        }
        Ok(events)
    }

    async fn set_event_state(
        &self,
        event_id: &EventId,
        state: EventState,
    ) -> Result<EventState, RidwellError> {
        let data: UpdatePickupData = self
            .request(
                "updateSubscriptionPickup",
                queries::UPDATE_SUBSCRIPTION_PICKUP,
                json!({
                    "input": {
                        "subscriptionPickupId": event_id.0,
                        "state": state.as_str(),
                    }
                }),
            )
            .await?;

        parse_event_state(&data.update_subscription_pickup.subscription_pickup.state)
    }

    async fn pickup_pricing(&self, event_id: &EventId) -> Result<PickupCatalog, RidwellError> {
        let data: PickupPricingData = self
            .request(
                "subscriptionPickupPricing",
                queries::SUBSCRIPTION_PICKUP_PRICING,
                json!({ "subscriptionPickupId": event_id.0 }),
            )
            .await?;

        let pricing = data.subscription_pickup_pricing;
        Ok(PickupCatalog {
            included_standard_units: pricing.included_standard_units,
            prices: pricing
                .prices
                .into_iter()
                .map(|price| CatalogPrice {
                    product_id: ProductId(price.pickup_product_id),
                    offer_id: OfferId(price.pickup_offer_id),
                    unit_cents: price.unit_cents,
                })
                .collect(),
        })
    }
}

/// Serialized body of every API call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a> {
    operation_name: &'a str,
    variables: Value,
    query: &'a str,
}

// Execute one named query/mutation and decode the data payload.
async fn execute<T: DeserializeOwned>(
    http: &Client,
    endpoint: &str,
    token: Option<&str>,
    operation_name: &str,
    query: &str,
    variables: Value,
) -> Result<T, RidwellError> {
    let mut request = http.post(endpoint).json(&GraphqlRequest {
        operation_name,
        variables,
        query,
    });
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?.error_for_status()?;
    let mut envelope: Value = response.json().await?;

    // The API can return HTTP 200 responses that are still errors.
    if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
        let message = errors
            .first()
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("vendor error without a message");
        return Err(classify_vendor_error(message));
    }

    let Some(data) = envelope.get_mut("data").map(Value::take) else {
        return Err(RidwellError::Request(
            "response has no data field".to_owned(),
        ));
    };
    serde_json::from_value(data)
        .map_err(|error| RidwellError::Request(format!("malformed response payload: {error}")))
}

fn classify_vendor_error(message: &str) -> RidwellError {
    match message {
        INVALID_CREDENTIALS_MESSAGE | LOGIN_REQUIRED_MESSAGE => {
            RidwellError::Authentication(message.to_owned())
        }
        _ => RidwellError::Request(message.to_owned()),
    }
}

/// Claims we need from the session token.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(rename = "ridwell/userId")]
    user_id: String,
}

// The token is opaque to us and verified by the vendor on every call; we only
// extract the embedded user id, so the signature is not checked here.
fn user_id_from_token(token: &str) -> Result<UserId, RidwellError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|error| {
                RidwellError::Request(format!("malformed authentication token: {error}"))
            })?;
    Ok(UserId(data.claims.user_id))
}

fn parse_pickup_date(raw: &str) -> Result<NaiveDate, RidwellError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|error| RidwellError::Request(format!("invalid pickup date {raw}: {error}")))
}

fn parse_event_state(raw: &str) -> Result<EventState, RidwellError> {
    match raw {
        "initialized" => Ok(EventState::Initialized),
        "scheduled" => Ok(EventState::Scheduled),
        other => Err(RidwellError::Request(format!(
            "unknown pickup event state: {other}"
        ))),
    }
}

fn pickup_from_selection(selection: SelectionNode) -> Pickup {
    let offer = selection.pickup_offer_pickup_product.pickup_offer;
    let product = selection.pickup_offer_pickup_product.pickup_product;
    Pickup {
        category: PickupCategory::for_name(&offer.category.name),
        name: offer.category.name,
        offer_id: OfferId(offer.id),
        product_id: ProductId(product.id),
        priority: offer.priority,
        quantity: selection.quantity,
    }
}

/// Payload of the createAuthentication mutation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthenticationData {
    create_authentication: AuthenticationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationPayload {
    authentication_token: String,
}

/// Payload of the user query.
#[derive(Debug, Deserialize)]
struct UserData {
    user: UserNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    full_name: String,
    email: String,
    phone: String,
    accounts: Vec<AccountNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountNode {
    id: String,
    address: AddressNode,
    active_subscription: SubscriptionNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressNode {
    street1: String,
    city: String,
    subdivision: String,
    postal_code: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionNode {
    id: String,
    state: String,
}

/// Payload of the upcomingSubscriptionPickups query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpcomingPickupsData {
    upcoming_subscription_pickups: Vec<PickupEventNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupEventNode {
    id: String,
    state: String,
    pickup_on: String,
    pickup_product_selections: Vec<SelectionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionNode {
    pickup_offer_pickup_product: OfferProductNode,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferProductNode {
    pickup_offer: OfferNode,
    pickup_product: ProductNode,
}

#[derive(Debug, Deserialize)]
struct OfferNode {
    id: String,
    priority: u32,
    category: CategoryNode,
}

#[derive(Debug, Deserialize)]
struct CategoryNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProductNode {
    id: String,
}

/// Payload of the updateSubscriptionPickup mutation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePickupData {
    update_subscription_pickup: UpdatePickupPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePickupPayload {
    subscription_pickup: PickupStateNode,
}

#[derive(Debug, Deserialize)]
struct PickupStateNode {
    state: String,
}

/// Payload of the subscriptionPickupPricing query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupPricingData {
    subscription_pickup_pricing: PricingNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingNode {
    included_standard_units: u32,
    prices: Vec<PriceNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceNode {
    pickup_product_id: String,
    pickup_offer_id: String,
    unit_cents: i64,
}

//! Shared helpers for the wiremock-based integration tests.

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Deterministic session token carrying `ridwell/userId = userId1`.
pub fn session_token() -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &json!({
            "ridwell/userId": "userId1",
            "ridwell/authType": "login",
            "iat": 1_600_000_000,
            "exp": 4_102_444_800_u64,
        }),
        &jsonwebtoken::EncodingKey::from_secret(b"secret"),
    )
    .unwrap()
}

/// Mount a canned 200 response for one GraphQL operation name.
pub async fn mount_operation(server: &MockServer, operation: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a successful createAuthentication exchange.
pub async fn mount_auth(server: &MockServer) {
    mount_operation(
        server,
        "createAuthentication",
        json!({
            "data": {
                "createAuthentication": { "authenticationToken": session_token() }
            }
        }),
    )
    .await;
}

/// Accounts listing payload modeled on the vendor's user query response.
pub fn user_response() -> Value {
    json!({
        "data": {
            "user": {
                "fullName": "Jane Doe",
                "email": "user@email.com",
                "phone": "1234567890",
                "accounts": [
                    {
                        "id": "accountId1",
                        "address": {
                            "street1": "123 Main Street",
                            "city": "Seattle",
                            "subdivision": "WA",
                            "postalCode": "98101"
                        },
                        "activeSubscription": {
                            "id": "subscriptionId1",
                            "state": "active"
                        }
                    }
                ]
            }
        }
    })
}

/// Two upcoming events, deliberately listed out of date order: an empty
/// initialized event on the 27th and a scheduled three-item event on the 13th.
pub fn upcoming_pickups_response() -> Value {
    json!({
        "data": {
            "upcomingSubscriptionPickups": [
                {
                    "id": "event2",
                    "state": "initialized",
                    "pickupOn": "2021-10-27",
                    "pickupProductSelections": []
                },
                {
                    "id": "event1",
                    "state": "scheduled",
                    "pickupOn": "2021-10-13",
                    "pickupProductSelections": [
                        selection("Threads", "pickupOffer1", "pickupProduct1", 1, 1),
                        selection("Beyond the Bin", "pickupOffer2", "pickupProduct2", 1, 2),
                        selection("Chocolate", "pickupOffer3", "pickupProduct3", 2, 1)
                    ]
                }
            ]
        }
    })
}

/// One product selection node for [`upcoming_pickups_response`].
pub fn selection(name: &str, offer: &str, product: &str, priority: u32, quantity: u32) -> Value {
    json!({
        "pickupOfferPickupProduct": {
            "pickupOffer": {
                "id": offer,
                "priority": priority,
                "category": { "name": name }
            },
            "pickupProduct": { "id": product }
        },
        "quantity": quantity
    })
}

/// Pricing catalog for event1: one free standard unit, priced add-on and
/// rotating entries.
pub fn pricing_response() -> Value {
    json!({
        "data": {
            "subscriptionPickupPricing": {
                "includedStandardUnits": 1,
                "prices": [
                    {
                        "pickupProductId": "pickupProduct2",
                        "pickupOfferId": "pickupOffer2",
                        "unitCents": 750
                    },
                    {
                        "pickupProductId": "pickupProduct3",
                        "pickupOfferId": "pickupOffer3",
                        "unitCents": 700
                    }
                ]
            }
        }
    })
}

//! Fixed GraphQL documents sent to the Ridwell API.
//!
//! The documents are kept as constants with variable substitution so the
//! external contract stays auditable; nothing builds query strings at
//! runtime.

/// Exchange email/password for a session token.
pub(crate) const CREATE_AUTHENTICATION: &str = "
mutation createAuthentication($input: CreateAuthenticationInput!) {
  createAuthentication(input: $input) {
    authenticationToken
  }
}
";

/// List the authenticated user's accounts and their active subscriptions.
pub(crate) const USER_ACCOUNTS: &str = "
query user($id: ID!) {
  user(id: $id) {
    fullName
    email
    phone
    accounts {
      id
      address {
        street1
        city
        subdivision
        postalCode
      }
      activeSubscription {
        id
        state
      }
    }
  }
}
";

/// List all upcoming pickup events for a subscription.
pub(crate) const UPCOMING_SUBSCRIPTION_PICKUPS: &str = "
query upcomingSubscriptionPickups($subscriptionId: ID!) {
  upcomingSubscriptionPickups(subscriptionId: $subscriptionId) {
    id
    state
    pickupOn
    pickupProductSelections {
      pickupOfferPickupProduct {
        pickupOffer {
          id
          priority
          category {
            name
          }
        }
        pickupProduct {
          id
        }
      }
      quantity
    }
  }
}
";

/// Opt a pickup event in or out by requesting a confirmation state.
pub(crate) const UPDATE_SUBSCRIPTION_PICKUP: &str = "
mutation updateSubscriptionPickup($input: UpdateSubscriptionPickupInput!) {
  updateSubscriptionPickup(input: $input) {
    subscriptionPickup {
      id
      state
    }
  }
}
";

/// Fetch the pricing catalog applicable to a pickup event.
pub(crate) const SUBSCRIPTION_PICKUP_PRICING: &str = "
query subscriptionPickupPricing($subscriptionPickupId: ID!) {
  subscriptionPickupPricing(subscriptionPickupId: $subscriptionPickupId) {
    includedStandardUnits
    prices {
      pickupProductId
      pickupOfferId
      unitCents
    }
  }
}
";

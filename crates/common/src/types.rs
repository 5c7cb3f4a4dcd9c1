use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Buyer reference stored on guest orders.
pub const GUEST_BUYER_ID: Uuid = Uuid::nil();

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a persisted order.
    OrderId
);

uuid_id!(
    /// Identifier of an authenticated buyer, issued by the auth platform.
    BuyerId
);

uuid_id!(
    /// Identifier of a shopping cart.
    CartId
);

uuid_id!(
    /// Identifier of an in-flight checkout session.
    SessionId
);

/// Who placed an order.
///
/// Guest orders are persisted with the nil UUID as their buyer reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BuyerRef {
    Guest,
    Account(BuyerId),
}

impl BuyerRef {
    /// Maps a stored UUID back to a buyer reference.
    pub fn from_uuid(uuid: Uuid) -> Self {
        if uuid == GUEST_BUYER_ID {
            BuyerRef::Guest
        } else {
            BuyerRef::Account(BuyerId::from_uuid(uuid))
        }
    }

    /// Returns the UUID persisted for this buyer.
    pub fn as_uuid(&self) -> Uuid {
        match self {
            BuyerRef::Guest => GUEST_BUYER_ID,
            BuyerRef::Account(id) => id.as_uuid(),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, BuyerRef::Guest)
    }

    /// Returns the account id, if the buyer is signed in.
    pub fn account(&self) -> Option<BuyerId> {
        match self {
            BuyerRef::Guest => None,
            BuyerRef::Account(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for BuyerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuyerRef::Guest => write!(f, "guest"),
            BuyerRef::Account(id) => write!(f, "{id}"),
        }
    }
}

/// Catalog reference of a product (the stock record id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRef(String);

impl ProductRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

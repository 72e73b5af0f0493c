use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;

/// Contact snapshot captured for orders placed without an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GuestCustomer {
    #[validate(length(min = 1, message = "guest name is required"))]
    pub name: String,
    #[validate(email(message = "guest email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "guest phone is required"))]
    pub phone: String,
}

/// Who placed an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomerIdentity {
    Registered { user_id: Uuid },
    Guest(GuestCustomer),
}

impl CustomerIdentity {
    /// Builds the identity from the two legacy payload fields, which are mutually exclusive.
    pub fn from_parts(
        user_id: Option<Uuid>,
        guest: Option<GuestCustomer>,
    ) -> Result<Self, ServiceError> {
        match (user_id, guest) {
            (Some(user_id), None) => Ok(CustomerIdentity::Registered { user_id }),
            (None, Some(guest)) => {
                guest.validate()?;
                Ok(CustomerIdentity::Guest(guest))
            }
            (Some(_), Some(_)) => Err(ServiceError::InvalidInput(
                "userId and guestCustomer are mutually exclusive".to_string(),
            )),
            (None, None) => Err(ServiceError::InvalidInput(
                "either userId or guestCustomer is required".to_string(),
            )),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            CustomerIdentity::Registered { user_id } => Some(*user_id),
            CustomerIdentity::Guest(_) => None,
        }
    }

    pub fn guest(&self) -> Option<&GuestCustomer> {
        match self {
            CustomerIdentity::Registered { .. } => None,
            CustomerIdentity::Guest(guest) => Some(guest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn guest() -> GuestCustomer {
        GuestCustomer {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "555-0100".into(),
        }
    }

    #[test]
    fn exactly_one_identity_path() {
        let id = Uuid::new_v4();
        assert_eq!(
            CustomerIdentity::from_parts(Some(id), None).unwrap(),
            CustomerIdentity::Registered { user_id: id }
        );
        assert_matches!(
            CustomerIdentity::from_parts(None, Some(guest())),
            Ok(CustomerIdentity::Guest(_))
        );
        assert_matches!(
            CustomerIdentity::from_parts(Some(id), Some(guest())),
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            CustomerIdentity::from_parts(None, None),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn guest_snapshot_is_validated() {
        let mut incomplete = guest();
        incomplete.email = "not-an-email".into();
        assert_matches!(
            CustomerIdentity::from_parts(None, Some(incomplete)),
            Err(ServiceError::ValidationError(_))
        );
    }
}

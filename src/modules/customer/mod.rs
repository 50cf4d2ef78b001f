// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use crate::modules::database::manager::DB_MANAGER;
use crate::modules::database::{
    filter_by_secondary_key_impl, secondary_find_impl, update_or_insert_impl,
};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::{id, raise_error, utc_now};

/// How a customer first entered the system.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum CustomerSource {
    /// The customer wrote in first
    #[default]
    InboundEmail,
    /// The business wrote out first
    OutboundEmail,
}

/// A person the business corresponds with, unique per (business, address).
/// Created and refreshed by the resolver on both inbound and outbound
/// traffic; never deleted by the sync engine.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[native_model(id = 2, version = 1)]
#[native_db(primary_key(pk -> String))]
pub struct Customer {
    /// Unique customer identifier
    #[secondary_key(unique)]
    pub id: u64,
    #[secondary_key]
    pub business_id: u64,
    /// Case-normalized email address
    pub email: String,
    /// Upsert key: "{business_id}:{email}"
    #[secondary_key(unique)]
    pub lookup_key: String,
    pub name: String,
    pub source: CustomerSource,
    /// Timestamp of the most recent message in either direction
    pub last_contact_at: i64,
    /// Creation timestamp (UNIX epoch milliseconds)
    pub created_at: i64,
}

impl Customer {
    fn pk(&self) -> String {
        format!("{}_{}", self.created_at, self.id)
    }

    pub fn lookup_key(business_id: u64, email: &str) -> String {
        format!("{}:{}", business_id, email.trim().to_lowercase())
    }

    /// Upsert keyed by (business_id, email), executed in one transaction.
    /// A hit refreshes `last_contact_at`; a miss creates the customer with a
    /// name taken from the display-name hint or synthesized from the address.
    pub async fn upsert(
        business_id: u64,
        email: &str,
        display_name_hint: Option<String>,
        source: CustomerSource,
    ) -> MaildeskResult<Customer> {
        let email = email.trim().to_lowercase();
        let lookup_key = Self::lookup_key(business_id, &email);
        let find_key = lookup_key.clone();
        update_or_insert_impl(
            DB_MANAGER.mail_db(),
            move |rw| {
                rw.get()
                    .secondary::<Customer>(CustomerKey::lookup_key, find_key)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
            },
            |current| {
                let mut updated = current.clone();
                updated.last_contact_at = utc_now!();
                Ok(updated)
            },
            move || {
                let name = display_name_hint
                    .filter(|hint| !hint.trim().is_empty())
                    .unwrap_or_else(|| name_from_address(&email));
                Ok(Customer {
                    id: id!(64),
                    business_id,
                    email,
                    lookup_key,
                    name,
                    source,
                    last_contact_at: utc_now!(),
                    created_at: utc_now!(),
                })
            },
        )
        .await
    }

    pub async fn find(customer_id: u64) -> MaildeskResult<Option<Customer>> {
        secondary_find_impl::<Customer>(DB_MANAGER.mail_db(), CustomerKey::id, customer_id).await
    }

    pub async fn find_by_email(business_id: u64, email: &str) -> MaildeskResult<Option<Customer>> {
        secondary_find_impl::<Customer>(
            DB_MANAGER.mail_db(),
            CustomerKey::lookup_key,
            Self::lookup_key(business_id, email),
        )
        .await
    }

    pub async fn list_by_business(business_id: u64) -> MaildeskResult<Vec<Customer>> {
        filter_by_secondary_key_impl(DB_MANAGER.mail_db(), CustomerKey::business_id, business_id)
            .await
    }
}

/// Synthesize a display name from the local part of an address:
/// "jane.doe" becomes "Jane Doe".
pub fn name_from_address(email: &str) -> String {
    let local_part = email.split('@').next().unwrap_or(email);
    local_part
        .split(['.', '_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesizes_names_from_local_parts() {
        assert_eq!(name_from_address("jane.doe@acme.com"), "Jane Doe");
        assert_eq!(name_from_address("mark_twain@books.org"), "Mark Twain");
        assert_eq!(name_from_address("ann-lee@x.io"), "Ann Lee");
        assert_eq!(name_from_address("bob@x.io"), "Bob");
    }

    #[tokio::test]
    async fn upsert_reuses_the_existing_customer() {
        let business_id = id!(64);
        let first = Customer::upsert(
            business_id,
            "Jane.Doe@Acme.com",
            None,
            CustomerSource::InboundEmail,
        )
        .await
        .unwrap();
        assert_eq!(first.email, "jane.doe@acme.com");
        assert_eq!(first.name, "Jane Doe");

        let second = Customer::upsert(
            business_id,
            "jane.doe@acme.com",
            Some("Jane D.".into()),
            CustomerSource::OutboundEmail,
        )
        .await
        .unwrap();
        assert_eq!(second.id, first.id);
        // the hit path only refreshes last contact
        assert_eq!(second.name, "Jane Doe");
        assert!(second.last_contact_at >= first.last_contact_at);
    }

    #[tokio::test]
    async fn upsert_prefers_the_display_name_hint() {
        let business_id = id!(64);
        let customer = Customer::upsert(
            business_id,
            "c.wren@example.org",
            Some("Christopher Wren".into()),
            CustomerSource::InboundEmail,
        )
        .await
        .unwrap();
        assert_eq!(customer.name, "Christopher Wren");
    }
}

//! In-memory customer store

use super::{CustomerRecord, CustomerStore, NewCustomer, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use customer_identity_shared::Role;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    by_email: HashMap<String, CustomerRecord>,
    next_id: i64,
}

/// Customer store held in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryCustomerStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored customers
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRecord>, StoreError> {
        Ok(self.inner.read().await.by_email.get(email).cloned())
    }

    async fn save(&self, customer: NewCustomer) -> Result<CustomerRecord, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.by_email.contains_key(&customer.email) {
            return Err(StoreError::Duplicate(format!(
                "Customer with email {} already exists",
                customer.email
            )));
        }
        if let Some(phone) = &customer.phone {
            if inner
                .by_email
                .values()
                .any(|existing| existing.phone.as_ref() == Some(phone))
            {
                return Err(StoreError::Duplicate(
                    "Customer with this phone number already exists".to_string(),
                ));
            }
        }

        inner.next_id += 1;
        let record = CustomerRecord {
            id: inner.next_id,
            name: customer.name,
            email: customer.email,
            password_hash: customer.password_hash,
            phone: customer.phone,
            role: customer.role,
            created_at: Utc::now(),
        };
        inner.by_email.insert(record.email.clone(), record.clone());

        Ok(record)
    }

    async fn update_role(&self, email: &str, role: Role) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.by_email.get_mut(email) {
            Some(record) => {
                record.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_all(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        let mut records: Vec<CustomerRecord> =
            self.inner.read().await.by_email.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_customer(email: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: "Test Customer".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            phone: Some(phone.to_string()),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryCustomerStore::new();

        let saved = store
            .save(new_customer("a@x.com", "9876543210"))
            .await
            .unwrap();
        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();

        assert_eq!(saved, found);
        assert_eq!(saved.id, 1);
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryCustomerStore::new();
        store.save(new_customer("a@x.com", "1111111111")).await.unwrap();

        let result = store.save(new_customer("a@x.com", "2222222222")).await;

        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let store = InMemoryCustomerStore::new();
        store.save(new_customer("a@x.com", "1111111111")).await.unwrap();

        let result = store.save(new_customer("b@x.com", "1111111111")).await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_update_role() {
        let store = InMemoryCustomerStore::new();
        store.save(new_customer("a@x.com", "1111111111")).await.unwrap();

        assert!(store.update_role("a@x.com", Role::Admin).await.unwrap());
        assert!(!store.update_role("ghost@x.com", Role::Admin).await.unwrap());

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_find_all_ordered_by_id() {
        let store = InMemoryCustomerStore::new();
        store.save(new_customer("z@x.com", "1111111111")).await.unwrap();
        store.save(new_customer("a@x.com", "2222222222")).await.unwrap();

        let all = store.find_all().await.unwrap();
        let emails: Vec<&str> = all.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails, vec!["z@x.com", "a@x.com"]);
    }
}

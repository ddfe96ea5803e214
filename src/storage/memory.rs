//! In-memory store implementations.

use crate::error::{PawgateError, Result};
use crate::payments::{PaymentRecord, PaymentStatus};
use crate::storage::{PaymentStore, User, UserStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory user store.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user (account creation itself is handled elsewhere in the
    /// platform).
    pub fn insert(&self, user: User) {
        let mut users = self.users.write().unwrap();
        users.insert(user.id.clone(), user);
    }

    fn update<F>(&self, user_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(user_id).ok_or(PawgateError::UserNotFound)?;
        f(user);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let needle = email.trim().to_lowercase();
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned())
    }

    async fn store_two_factor_secret(
        &self,
        user_id: &str,
        secret: &str,
        backup_codes: &[String],
    ) -> Result<()> {
        self.update(user_id, |user| {
            user.two_factor_secret = Some(secret.to_string());
            user.two_factor_backup_codes = backup_codes.to_vec();
            user.two_factor_enabled = false;
            user.two_factor_verified = false;
        })
    }

    async fn enable_two_factor(&self, user_id: &str) -> Result<()> {
        self.update(user_id, |user| {
            user.two_factor_enabled = true;
            user.two_factor_verified = true;
        })
    }

    async fn clear_two_factor(&self, user_id: &str) -> Result<()> {
        self.update(user_id, |user| {
            user.two_factor_secret = None;
            user.two_factor_backup_codes.clear();
            user.two_factor_enabled = false;
            user.two_factor_verified = false;
        })
    }

    async fn remove_backup_code(&self, user_id: &str, index: usize) -> Result<()> {
        self.update(user_id, |user| {
            if index < user.two_factor_backup_codes.len() {
                user.two_factor_backup_codes.remove(index);
            }
        })
    }
}

/// In-memory payment store.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<String, PaymentRecord>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, record: PaymentRecord) -> Result<PaymentRecord> {
        let mut payments = self.payments.write().unwrap();
        payments.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().unwrap();
        Ok(payments.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().unwrap();
        let mut records: Vec<_> = payments.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn set_status(&self, id: &str, status: PaymentStatus) -> Result<()> {
        let mut payments = self.payments.write().unwrap();
        let record = payments.get_mut(id).ok_or(PawgateError::PaymentNotFound)?;
        record.status = status;
        Ok(())
    }
}

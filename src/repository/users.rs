//! Member directory
//!
//! Minimal in-process registry, enough to resolve roles for loan policies
//! and names for history projections.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, User},
};

#[derive(Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, req: CreateUser) -> AppResult<User> {
        let mut users = self.users.write().expect("user directory lock poisoned");
        if users.values().any(|u| u.card_number == req.card_number) {
            return Err(AppError::Validation(format!(
                "Card number {} is already registered",
                req.card_number
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: req.name,
            card_number: req.card_number,
            role: req.role.unwrap_or(Role::Member),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn get(&self, id: Uuid) -> AppResult<User> {
        let users = self.users.read().expect("user directory lock poisoned");
        users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub fn find_by_card(&self, card_number: &str) -> Option<User> {
        let users = self.users.read().expect("user directory lock poisoned");
        users.values().find(|u| u.card_number == card_number).cloned()
    }

    pub fn name_of(&self, id: Uuid) -> Option<String> {
        let users = self.users.read().expect("user directory lock poisoned");
        users.get(&id).map(|u| u.name.clone())
    }

    pub fn list(&self) -> Vec<User> {
        let users = self.users.read().expect("user directory lock poisoned");
        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_card_numbers_are_rejected() {
        let directory = UserDirectory::new();
        directory
            .insert(CreateUser {
                name: "Ada".to_string(),
                card_number: "CARD-0001".to_string(),
                role: None,
            })
            .unwrap();

        let err = directory.insert(CreateUser {
            name: "Grace".to_string(),
            card_number: "CARD-0001".to_string(),
            role: Some(Role::Staff),
        });
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn lookup_by_card_resolves_role() {
        let directory = UserDirectory::new();
        directory
            .insert(CreateUser {
                name: "Ada".to_string(),
                card_number: "CARD-0002".to_string(),
                role: Some(Role::Staff),
            })
            .unwrap();

        let found = directory.find_by_card("CARD-0002").unwrap();
        assert_eq!(found.role, Role::Staff);
        assert_eq!(directory.name_of(found.id).as_deref(), Some("Ada"));
    }
}

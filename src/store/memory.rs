use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ProductStore, UserStore};
use crate::{
    error::{AppError, Result},
    models::{NewProduct, Product, User},
};

#[derive(Default)]
struct Tables {
    produtos: BTreeMap<i64, Product>,
    users: BTreeMap<i64, User>,
    last_produto_id: i64,
    last_user_id: i64,
}

/// In-process store. Ids come from monotonic counters and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.tables.read().produtos.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.tables.read().produtos.values().cloned().collect())
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.tables.write();
        tables.last_produto_id += 1;
        let product = product.into_product(tables.last_produto_id);
        tables.produtos.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: i64, product: NewProduct) -> Result<Option<Product>> {
        let mut tables = self.tables.write();
        Ok(tables.produtos.get_mut(&id).map(|stored| {
            *stored = product.into_product(id);
            stored.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().produtos.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|user| user.username == username) {
            return Err(AppError::BadRequest(format!(
                "A user with username {} already exists",
                username
            )));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: username.to_string(),
            password: password_hash.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ProductStore, UserStore};
use crate::{
    database,
    error::Result,
    models::{NewProduct, Product, User},
    queries::{product_queries, user_queries},
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn get(&self, id: i64) -> Result<Option<Product>> {
        product_queries::find_by_id(&self.pool, id).await
    }

    async fn list(&self) -> Result<Vec<Product>> {
        product_queries::find_all(&self.pool).await
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        product_queries::create_product(&self.pool, &product).await
    }

    async fn update(&self, id: i64, product: NewProduct) -> Result<Option<Product>> {
        product_queries::update_product(&self.pool, id, &product).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let rows = product_queries::delete_product(&self.pool, id).await?;
        Ok(rows > 0)
    }

    async fn ping(&self) -> Result<()> {
        database::check_health(&self.pool).await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        user_queries::find_by_username(&self.pool, username).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        user_queries::find_by_id(&self.pool, id).await
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        user_queries::create_user(&self.pool, username, password_hash).await
    }
}

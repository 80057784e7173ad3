//! Storage seam for the HTTP layer.
//!
//! Handlers only see these traits; `PgStore` backs them with PostgreSQL and
//! `MemoryStore` keeps everything in process for tests and database-less runs.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{NewProduct, Product, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Product>>;

    /// All records ordered by id.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Persists a new record under a freshly assigned id.
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// Replaces every field of an existing record. `None` when `id` is unknown.
    async fn update(&self, id: i64, product: NewProduct) -> Result<Option<Product>>;

    /// `false` when `id` is unknown.
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Stores a user whose password is already hashed.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
}

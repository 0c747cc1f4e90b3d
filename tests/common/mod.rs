// tests/common/mod.rs
#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use subscription_mailing_service::app::Repositories;
use subscription_mailing_service::config::Config;
use subscription_mailing_service::error::{StorageError, StorageResult};
use subscription_mailing_service::models::{Mail, Message, Subscriber, User};
use subscription_mailing_service::repository::{Entity, Repository, SubscriberRepository};

/// Table stand-in with store-assigned ids, for driving handlers without Postgres.
pub struct MemoryRepository<E> {
    rows: Mutex<(i32, Vec<E>)>,
}

impl<E> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self {
            rows: Mutex::new((0, Vec::new())),
        }
    }
}

#[async_trait]
impl<E: Entity + Clone> Repository<E> for MemoryRepository<E> {
    async fn get(&self, id: i32) -> StorageResult<Option<E>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.1.iter().find(|e| e.id() == id).cloned())
    }

    async fn get_all(&self) -> StorageResult<Vec<E>> {
        Ok(self.rows.lock().unwrap().1.clone())
    }

    async fn create(&self, mut entity: E) -> StorageResult<E> {
        entity.stamp();
        let mut rows = self.rows.lock().unwrap();
        rows.0 += 1;
        entity.set_id(rows.0);
        rows.1.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: i32, mut entity: E) -> StorageResult<E> {
        entity.stamp();
        entity.set_id(id);
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .1
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or(StorageError::NotFound {
                entity: E::TABLE,
                id,
            })?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: i32) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.1.len();
        rows.1.retain(|e| e.id() != id);
        if rows.1.len() == before {
            return Err(StorageError::NotFound {
                entity: E::TABLE,
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriberRepository for MemoryRepository<Subscriber> {
    async fn get_by_level(&self, level: &str) -> StorageResult<Vec<Subscriber>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .1
            .iter()
            .filter(|s| s.subscription_level == level)
            .cloned()
            .collect())
    }

    async fn update_level(&self, id: i32, level: &str) -> StorageResult<Subscriber> {
        let mut rows = self.rows.lock().unwrap();
        let subscriber = rows
            .1
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StorageError::NotFound {
                entity: Subscriber::TABLE,
                id,
            })?;
        subscriber.subscription_level = level.to_string();
        Ok(subscriber.clone())
    }
}

/// Every call fails the way a dropped connection would.
#[derive(Default)]
pub struct BrokenRepository;

fn broken<T>() -> StorageResult<T> {
    Err(StorageError::Query {
        entity: "broken",
        source: sqlx::Error::PoolClosed,
    })
}

#[async_trait]
impl<E: Entity> Repository<E> for BrokenRepository {
    async fn get(&self, _id: i32) -> StorageResult<Option<E>> {
        broken()
    }

    async fn get_all(&self) -> StorageResult<Vec<E>> {
        broken()
    }

    async fn create(&self, _entity: E) -> StorageResult<E> {
        broken()
    }

    async fn update(&self, _id: i32, _entity: E) -> StorageResult<E> {
        broken()
    }

    async fn delete(&self, _id: i32) -> StorageResult<()> {
        broken()
    }
}

#[async_trait]
impl SubscriberRepository for BrokenRepository {
    async fn get_by_level(&self, _level: &str) -> StorageResult<Vec<Subscriber>> {
        broken()
    }

    async fn update_level(&self, _id: i32, _level: &str) -> StorageResult<Subscriber> {
        broken()
    }
}

pub fn memory_repositories() -> Repositories {
    memory_repositories_with_users(Arc::default())
}

/// Like [`memory_repositories`], keeping a handle on the user table so tests can
/// inspect fields that never reach a response body.
pub fn memory_repositories_with_users(users: Arc<MemoryRepository<User>>) -> Repositories {
    Repositories::new(
        users,
        Arc::new(MemoryRepository::<Subscriber>::default()),
        Arc::new(MemoryRepository::<Message>::default()),
        Arc::new(MemoryRepository::<Mail>::default()),
    )
}

pub fn broken_repositories() -> Repositories {
    Repositories::new(
        Arc::new(BrokenRepository),
        Arc::new(BrokenRepository),
        Arc::new(BrokenRepository),
        Arc::new(BrokenRepository),
    )
}

/// Config with the cheapest bcrypt cost so tests stay fast.
pub fn test_config() -> web::Data<Config> {
    web::Data::new(Config {
        bcrypt_cost: 4,
        ..Config::default()
    })
}

//! A user service whose reads are cached and whose writes evict.
//!
//! Uses an in-process Moka store by default; set `REDIS_URL` and pass
//! `--redis` to run against Redis instead.
//!
//! ```text
//! RUST_LOG=debug cargo run --example user_service
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use cache_aside::{
    Args, CacheAside, CacheAsideBuilder, CacheAsideConfig, CacheEvict, Cacheable, MokaStore,
    MokaStoreConfig, OperationId, RedisStore, RedisStoreConfig, Store,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

struct UserService {
    db: RwLock<HashMap<u64, User>>,
    cache: CacheAside,
}

impl UserService {
    const GET_USER: OperationId = OperationId::new("UserService", "get_user");
    const RENAME: OperationId = OperationId::new("UserService", "rename");

    async fn get_user(&self, id: u64) -> Result<User, String> {
        self.cache
            .invoke(&Self::GET_USER, &Args::new().arg("id", id), || async {
                println!("  (loading user {} from the database)", id);
                self.db
                    .read()
                    .await
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| format!("user {} not found", id))
            })
            .await
    }

    async fn rename(&self, id: u64, name: &str) -> Result<(), String> {
        let args = Args::new().arg("id", id).arg("name", name);
        self.cache
            .invoke(&Self::RENAME, &args, || async {
                let mut db = self.db.write().await;
                let user = db.get_mut(&id).ok_or_else(|| format!("user {} not found", id))?;
                user.name = name.to_string();
                Ok::<(), String>(())
            })
            .await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store: Arc<dyn Store> = if std::env::args().any(|a| a == "--redis") {
        Arc::new(RedisStore::new(RedisStoreConfig::default()).await?)
    } else {
        Arc::new(MokaStore::new(MokaStoreConfig::default()))
    };

    let cache = CacheAsideBuilder::new(CacheAsideConfig::from_env())
        .store(store)
        .cacheable(UserService::GET_USER, Cacheable::new("user").ttl_secs(120))
        .evict(UserService::RENAME, CacheEvict::new("user").key("#id"))
        .build()?;

    let mut users = HashMap::new();
    users.insert(
        42,
        User {
            id: 42,
            name: "Charlie".to_string(),
        },
    );
    let service = UserService {
        db: RwLock::new(users),
        cache,
    };

    println!("first read:  {:?}", service.get_user(42).await?);
    println!("second read: {:?}", service.get_user(42).await?);

    service.rename(42, "Charles").await?;
    println!("after rename: {:?}", service.get_user(42).await?);

    match service.get_user(7).await {
        Ok(user) => println!("unexpected user: {:?}", user),
        Err(e) => println!("missing user: {}", e),
    }

    Ok(())
}

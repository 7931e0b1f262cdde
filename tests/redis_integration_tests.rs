// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Redis snapshot cache using Docker containers.

mod common;

#[cfg(feature = "redis")]
mod redis_tests {
    use etcdcfg::adapters::{InMemoryBackend, RedisSnapshotCache};
    use etcdcfg::domain::{ConfigReader, ConfigValue};
    use etcdcfg::ports::SnapshotCache;
    use etcdcfg::service::ConfigStore;
    use std::sync::Arc;
    use std::time::Duration;
    use testcontainers::{core::WaitFor, runners::AsyncRunner, GenericImage, ImageExt};

    use crate::common as docker_helpers;

    /// Helper to set up a Redis container and a connected cache.
    async fn setup_redis_test(
    ) -> Option<(testcontainers::ContainerAsync<GenericImage>, RedisSnapshotCache)> {
        if !docker_helpers::is_docker_available() {
            docker_helpers::print_docker_unavailable_warning("Redis integration test");
            return None;
        }

        let redis_image = GenericImage::new("redis", "7-alpine")
            .with_exposed_port(6379.into())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));

        let container = redis_image.start().await.ok()?;
        let port = container.get_host_port_ipv4(6379).await.ok()?;

        // Give Redis a moment to start up
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

        let cache = RedisSnapshotCache::new(&format!("redis://127.0.0.1:{}", port)).ok()?;
        Some((container, cache))
    }

    #[tokio::test]
    async fn test_redis_get_and_set() {
        let Some((_container, cache)) = setup_redis_test().await else {
            return;
        };

        assert_eq!(cache.get("etcd_config_missing").unwrap(), None);
        cache.set("etcd_config_app", r#"{"a":"1"}"#, None).unwrap();
        assert_eq!(
            cache.get("etcd_config_app").unwrap().as_deref(),
            Some(r#"{"a":"1"}"#)
        );
    }

    #[tokio::test]
    async fn test_redis_ttl_expires() {
        let Some((_container, cache)) = setup_redis_test().await else {
            return;
        };

        cache
            .set("etcd_config_short", "{}", Some(Duration::from_secs(1)))
            .unwrap();
        assert!(cache.get("etcd_config_short").unwrap().is_some());
        tokio::time::sleep(tokio::time::Duration::from_millis(2100)).await;
        assert_eq!(cache.get("etcd_config_short").unwrap(), None);
    }

    #[tokio::test]
    async fn test_redis_serves_second_store() {
        let Some((_container, cache)) = setup_redis_test().await else {
            return;
        };

        let cache = Arc::new(cache);
        let backend = Arc::new(InMemoryBackend::new().with_value("/svc/name", "first"));
        ConfigStore::builder()
            .root("svc")
            .backend(backend.clone())
            .cache(cache.clone())
            .build()
            .unwrap();

        // A store against an empty backend still loads, from the snapshot.
        let store = ConfigStore::builder()
            .root("svc")
            .backend(Arc::new(InMemoryBackend::new()))
            .cache(cache)
            .build()
            .unwrap();
        assert_eq!(store.require("name").unwrap(), ConfigValue::from("first"));
    }
}

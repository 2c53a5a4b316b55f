//! Property-based tests for the resource pool bound.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use conductor::services::ResourcePool;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Under any mix of concurrent holders, active slots never exceed the
    /// configured capacity, and every acquire is balanced by a release.
    #[test]
    fn active_never_exceeds_capacity(capacity in 1usize..5, tasks in 1usize..16) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let pool = Arc::new(ResourcePool::new(capacity));
            let max_active = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::with_capacity(tasks);
            for i in 0..tasks {
                let pool = Arc::clone(&pool);
                let max_active = Arc::clone(&max_active);
                handles.push(tokio::spawn(async move {
                    let _slot = pool.acquire(&format!("task-{i}")).await;
                    max_active.fetch_max(pool.active_count(), Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            assert!(
                max_active.load(Ordering::SeqCst) <= capacity,
                "observed {} active with capacity {capacity}",
                max_active.load(Ordering::SeqCst)
            );
            assert_eq!(pool.active_count(), 0, "slots leaked after all tasks finished");
        });
    }
}

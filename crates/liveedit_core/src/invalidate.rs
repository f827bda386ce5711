//! Route invalidation signals for the rendering layer.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Staleness marker for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteGeneration {
    pub route: String,
    /// Bumped on every invalidation; renderers recompute when it changes.
    pub generation: u64,
}

/// Tracks per-route generations bumped after each successful save.
#[derive(Default)]
pub struct ViewInvalidator {
    inner: Mutex<BTreeMap<String, u64>>,
}

impl ViewInvalidator {
    /// Mark `route` stale.
    ///
    /// Fire-and-forget: a poisoned lock is logged and the signal dropped.
    pub fn invalidate(&self, route: &str) {
        match self.inner.lock() {
            Ok(mut generations) => {
                let generation = generations.entry(route.to_string()).or_insert(0);
                *generation = generation.saturating_add(1);
                tracing::info!("Invalidated route {} (generation {})", route, generation);
            }
            Err(_) => {
                tracing::error!(
                    "Failed to invalidate route {}: invalidator state poisoned",
                    route
                );
            }
        }
    }

    /// Current generation of `route`; `0` when it was never invalidated.
    pub fn generation(&self, route: &str) -> u64 {
        self.inner
            .lock()
            .map(|generations| generations.get(route).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// All invalidated routes, sorted by route.
    pub fn snapshot(&self) -> Vec<RouteGeneration> {
        self.inner
            .lock()
            .map(|generations| {
                generations
                    .iter()
                    .map(|(route, generation)| RouteGeneration {
                        route: route.clone(),
                        generation: *generation,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{RouteGeneration, ViewInvalidator};
    use std::sync::Arc;

    #[test]
    fn invalidate_bumps_per_route_generation() {
        let views = ViewInvalidator::default();
        assert_eq!(views.generation("/"), 0);
        views.invalidate("/");
        views.invalidate("/");
        views.invalidate("/shop");
        assert_eq!(views.generation("/"), 2);
        assert_eq!(
            views.snapshot(),
            vec![
                RouteGeneration {
                    route: "/".to_string(),
                    generation: 2
                },
                RouteGeneration {
                    route: "/shop".to_string(),
                    generation: 1
                },
            ]
        );
    }

    #[test]
    fn poisoned_state_does_not_panic_callers() {
        let views = Arc::new(ViewInvalidator::default());
        let poisoner = Arc::clone(&views);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().expect("lock");
            panic!("poison the invalidator");
        })
        .join();

        views.invalidate("/");
        assert_eq!(views.generation("/"), 0);
        assert!(views.snapshot().is_empty());
    }
}

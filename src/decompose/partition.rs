//! Step 1: Partition
//!
//! Walks the source manifest's top-level resources and buckets each one by
//! the caller-supplied grouping key. Nested resources are not inspected here;
//! they travel with their parent, because a nested resource is naturally
//! owned by it and must deploy in the same unit.
//!
//! Bucket order is the order in which each bucket's first member was first
//! encountered, which makes the whole run deterministic for a given input.

use log::debug;
use serde_json::Value;

use super::Bucket;
use crate::manifest;

/// Execute the partition step.
///
/// Non-object entries in the `resources` array carry no grouping fields and
/// are skipped with a debug log; they are a caller error, not a failure.
pub(crate) fn execute<F>(source: &Value, group_key: &F) -> Vec<Bucket>
where
    F: Fn(&Value) -> String,
{
    let mut buckets: Vec<Bucket> = Vec::new();

    let Some(resources) = manifest::resources(source) else {
        return buckets;
    };

    for resource in resources {
        if !resource.is_object() {
            debug!("skipping non-object entry in top-level resources array");
            continue;
        }
        let key = group_key(resource);
        match buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.resources.push(resource.clone()),
            None => buckets.push(Bucket {
                key,
                resources: vec![resource.clone()],
            }),
        }
    }

    buckets
}

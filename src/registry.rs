//! Process-wide group registry.
//!
//! Groups are created once, shared everywhere: any thread can resolve a
//! group by name and serve reads for it. The registry is the integration
//! point for a server front end, which maps an incoming `(group, key)` pair
//! onto [`serve`].

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::info;

use crate::byteview::ByteView;
use crate::error::{CacheError, Result};
use crate::group::Group;
use crate::policy::PolicyKind;
use crate::traits::Getter;

static GROUPS: Lazy<RwLock<HashMap<String, Arc<Group>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Creates and registers a group, returning the shared handle.
///
/// Creating a group under a name already in use replaces the old group; the
/// old handle stays valid for holders but is no longer resolvable by name.
pub fn new_group(
    name: impl Into<String>,
    capacity: usize,
    kind: PolicyKind,
    getter: Box<dyn Getter>,
) -> Arc<Group> {
    let name = name.into();
    let group = Arc::new(Group::new(name.clone(), capacity, kind, getter));
    let previous = GROUPS.write().insert(name.clone(), Arc::clone(&group));
    if previous.is_some() {
        info!(group = %name, "group replaced");
    } else {
        info!(group = %name, policy = %kind, capacity, "group created");
    }
    group
}

/// Resolves a registered group by name.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GROUPS.read().get(name).cloned()
}

/// Unregisters `name`, shutting down its peer resources first. A miss is a
/// no-op.
pub fn destroy_group(name: &str) {
    let removed = GROUPS.write().remove(name);
    if let Some(group) = removed {
        group.shutdown();
        info!(group = name, "group destroyed");
    }
}

/// Serves one read: resolves the group and delegates to [`Group::get`].
///
/// This is the entry point a transport front end calls for each request.
pub fn serve(group: &str, key: &str) -> Result<ByteView> {
    let group = get_group(group).ok_or_else(|| CacheError::GroupNotFound(group.to_owned()))?;
    group.get(key)
}

pub mod catalog;

use locallib_db::SharedStore;
use locallib_kernel::ModuleRegistry;

/// Register every application module with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: &SharedStore) {
    registry.register(catalog::create_module(store.clone()));
}

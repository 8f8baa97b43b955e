pub mod auth;
pub mod books;

use bookworm_kernel::ModuleRegistry;

use crate::services::Services;

/// Register all feature modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, services: &Services) {
    registry.register(auth::create_module(services));
    registry.register(books::create_module(services));
}

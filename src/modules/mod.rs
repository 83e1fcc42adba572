pub mod books;
pub mod loans;
pub mod notifier;

use std::sync::Arc;

use lending_kernel::ModuleRegistry;

use crate::app::Library;
use notifier::OverdueNotifier;

/// Register all service modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    library: &Library,
    overdue: Arc<OverdueNotifier>,
) {
    registry.register(books::create_module(library.clone()));
    registry.register(loans::create_module(library.clone()));
    registry.register(notifier::create_module(overdue));
}

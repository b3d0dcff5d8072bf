use tracebox_store::TraceStore;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: TraceStore,
}

impl AppState {
    pub fn new(store: TraceStore) -> Self {
        Self { store }
    }
}

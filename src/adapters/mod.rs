// Adapters layer: concrete implementations for external systems (http catalog, local storage).

pub mod pricing_api;

//! Macros for reducing boilerplate in the API layer.

/// Implement `FromRef<AppState>` for one field, so handlers can extract it
/// with `State<T>` directly.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Arc<BackfillJob>, backfill);
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

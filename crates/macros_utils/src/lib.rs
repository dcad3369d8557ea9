//! Small declarative helpers shared by the HTTP binaries.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web::web::ServiceConfig;

/// Generate a `pub fn routes(cfg: &mut ServiceConfig)` for a module.
///
/// Leaf modules list their handlers with `route`, parent modules list their
/// children with `mod` (which also declares them):
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
/// }
///
/// macros_utils::routes! {
///     mod api,
///     mod health,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),+ $(,)?) => {
        pub fn routes(cfg: &mut $crate::ServiceConfig) {
            $( cfg.service($handler); )+
        }
    };
    ($(mod $module:ident),+ $(,)?) => {
        $( mod $module; )+

        pub fn routes(cfg: &mut $crate::ServiceConfig) {
            $( $module::routes(cfg); )+
        }
    };
}

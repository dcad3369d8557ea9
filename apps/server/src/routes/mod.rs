macros_utils::routes! {
    mod api,
    mod health,
}

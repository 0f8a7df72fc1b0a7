//! tests/mod.rs
//! Pruebas unitarias y de integración (fakes en `support`).

mod composer_tests;
mod store_tests;
mod support;

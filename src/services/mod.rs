//! services/mod.rs
//! Módulo que agrupa las capas de negocio: store, cuota, historial, secuenciador, etc.

pub mod campaign_service;
pub mod composer_service;
pub mod enhancer_service;
pub mod log_service;
pub mod quota_service;
pub mod sequencer_service;
pub mod settings_service;
pub mod state_store;
pub mod template_service;
pub mod timing;

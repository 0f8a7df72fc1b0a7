//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod log_model;
pub mod message_model;
pub mod sequencer_model;
pub mod settings_model;
pub mod stats_model;

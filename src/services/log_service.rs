//! services/log_service.rs
//! Historial de envíos y estadísticas: registrar, consultar, limpiar y exportar.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::MailerResult,
    models::{
        log_model::{LogEntry, SendStatus},
        message_model::MessageRequest,
        stats_model::Stats,
    },
    services::{
        state_store::{self, StateStore, LOGS_KEY, STATS_KEY},
        timing::Clock,
    },
};

/// Máximo de entradas guardadas; las más viejas se descartan.
pub const MAX_LOG_ENTRIES: usize = 100;
pub const DEFAULT_LOG_LIMIT: usize = 50;

const CSV_HEADERS: [&str; 6] = ["Timestamp", "Email", "Company", "Role", "Subject", "Status"];

#[derive(Clone)]
pub struct LogService {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl LogService {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Agrega la entrada (la más reciente primero) y, si fue enviado,
    /// incrementa los contadores. Logs y stats se escriben en un solo `set`.
    pub async fn record(
        &self,
        msg: &MessageRequest,
        status: SendStatus,
        error_message: Option<String>,
    ) -> MailerResult<LogEntry> {
        let today = self.clock.today();
        let entry = LogEntry::from_message(msg, self.clock.now(), status, error_message);

        let mut logs = state_store::load_logs(self.store.as_ref()).await?;
        logs.insert(0, entry.clone());
        logs.truncate(MAX_LOG_ENTRIES);

        let mut updates = HashMap::from([state_store::entry(LOGS_KEY, &logs)?]);

        if status == SendStatus::Sent {
            let mut stats = state_store::load_stats(self.store.as_ref(), today).await?;
            stats.roll_over(today);
            stats.record_sent();
            let (key, value) = state_store::entry(STATS_KEY, &stats)?;
            updates.insert(key, value);
        }

        self.store.set(updates).await?;
        Ok(entry)
    }

    pub async fn get_stats(&self) -> MailerResult<Stats> {
        state_store::load_stats(self.store.as_ref(), self.clock.today()).await
    }

    /// `None` devuelve todo el historial.
    pub async fn get_logs(&self, limit: Option<usize>) -> MailerResult<Vec<LogEntry>> {
        let mut logs = state_store::load_logs(self.store.as_ref()).await?;
        if let Some(limit) = limit {
            logs.truncate(limit);
        }
        Ok(logs)
    }

    pub async fn clear_logs(&self) -> MailerResult<()> {
        self.store
            .set(HashMap::from([state_store::entry(
                LOGS_KEY,
                &Vec::<LogEntry>::new(),
            )?]))
            .await?;
        log::info!("Historial de envíos borrado");
        Ok(())
    }

    /// Header sin comillas y cada campo entre comillas dobles.
    /// Las comillas internas NO se escapan (ver DESIGN.md).
    pub async fn export_to_csv(&self) -> MailerResult<String> {
        let logs = self.get_logs(None).await?;
        Ok(logs_to_csv(&logs))
    }
}

pub fn logs_to_csv(logs: &[LogEntry]) -> String {
    let mut lines = Vec::with_capacity(logs.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for log in logs {
        let timestamp = log.iso_timestamp();
        let row = [
            timestamp.as_str(),
            log.to.as_str(),
            log.company.as_str(),
            log.role.as_str(),
            log.subject.as_str(),
            log.status.as_str(),
        ];
        lines.push(
            row.iter()
                .map(|field| format!("\"{}\"", field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

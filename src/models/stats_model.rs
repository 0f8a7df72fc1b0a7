//! models/stats_model.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::log_model::LogEntry;

/// Contadores de envío. `today_sent <= total_sent` siempre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_sent: u64,
    pub today_sent: u32,
    pub last_reset_date: NaiveDate,
}

impl Stats {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            total_sent: 0,
            today_sent: 0,
            last_reset_date: today,
        }
    }

    /// Pone en cero el contador diario si cambió el día. Devuelve true si hubo reset.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == today {
            return false;
        }
        self.today_sent = 0;
        self.last_reset_date = today;
        true
    }

    pub fn record_sent(&mut self) {
        self.total_sent += 1;
        self.today_sent += 1;
    }
}

/// Respuesta de GET /api/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub stats: Stats,
    pub logs: Vec<LogEntry>,
}

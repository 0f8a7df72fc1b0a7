//! tests/store_tests.rs
//! Store clave/valor (SQLite y memoria), semilla inicial y settings.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use actix_rt::test;
    use anyhow::Result;
    use serde_json::json;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

    use crate::error::MailerError;
    use crate::models::settings_model::{Settings, UpdateSettingsRequest, API_KEY_MASK};
    use crate::services::state_store::{
        self, MemoryStateStore, SqliteStateStore, StateStore, LOGS_KEY, SETTINGS_KEY, STATS_KEY,
    };
    use crate::tests::support::day;

    async fn exercise_store(store: &dyn StateStore) -> Result<()> {
        assert!(store.get(&["a", "b"]).await?.is_empty());

        store
            .set(HashMap::from([
                ("a".to_string(), json!({ "n": 1 })),
                ("b".to_string(), json!([1, 2, 3])),
            ]))
            .await?;

        let got = store.get(&["a", "b", "missing"]).await?;
        assert_eq!(got.len(), 2);
        assert_eq!(got["a"], json!({ "n": 1 }));
        assert_eq!(got["b"], json!([1, 2, 3]));

        // Sobrescribe sólo lo incluido
        store
            .set(HashMap::from([("a".to_string(), json!("replaced"))]))
            .await?;
        let got = store.get(&["a", "b"]).await?;
        assert_eq!(got["a"], json!("replaced"));
        assert_eq!(got["b"], json!([1, 2, 3]));
        Ok(())
    }

    #[test]
    async fn test_memory_store_get_set() -> Result<()> {
        exercise_store(&MemoryStateStore::new()).await
    }

    #[test]
    async fn test_sqlite_store_get_set() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SqliteStateStore::open(&dir.path().join("data").join("state.db")).await?;
        exercise_store(&store).await
    }

    #[test]
    async fn test_sqlite_failed_set_applies_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.db");
        let store = SqliteStateStore::open(&path).await?;
        store
            .set(HashMap::from([("a".to_string(), json!("old"))]))
            .await?;

        // Un trigger hace fallar la escritura de una sola clave
        let admin = SqlitePool::connect_with(SqliteConnectOptions::new().filename(&path)).await?;
        sqlx::query(
            r#"
            CREATE TRIGGER reject_poison BEFORE INSERT ON kv_store
            WHEN NEW.key = 'poison'
            BEGIN
                SELECT RAISE(ABORT, 'rejected');
            END
            "#,
        )
        .execute(&admin)
        .await?;

        let mut batch = HashMap::from([
            ("a".to_string(), json!("new")),
            ("poison".to_string(), json!(true)),
        ]);
        for i in 0..5 {
            batch.insert(format!("k{}", i), json!(i));
        }
        let res = store.set(batch).await;
        assert!(matches!(res, Err(MailerError::StoreUnavailable(_))));

        let got = store
            .get(&["a", "poison", "k0", "k1", "k2", "k3", "k4"])
            .await?;
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], json!("old"));
        Ok(())
    }

    #[test]
    async fn test_sqlite_store_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.db");

        {
            let store = SqliteStateStore::open(&path).await?;
            state_store::seed_defaults(&store, day(2026, 10, 16)).await?;
        }

        let store = SqliteStateStore::open(&path).await?;
        let settings = state_store::load_settings(&store).await?;
        assert_eq!(settings, Settings::default());
        let stats = state_store::load_stats(&store, day(2030, 1, 1)).await?;
        assert_eq!(stats.last_reset_date, day(2026, 10, 16));
        Ok(())
    }

    #[test]
    async fn test_seed_defaults_only_on_first_run() -> Result<()> {
        let store = MemoryStateStore::new();
        assert!(state_store::seed_defaults(&store, day(2026, 10, 16)).await?);

        let values = store.get(&[SETTINGS_KEY, LOGS_KEY, STATS_KEY]).await?;
        assert_eq!(values.len(), 3);
        assert_eq!(values[LOGS_KEY], json!([]));

        let custom = Settings {
            daily_limit: 5,
            ..Settings::default()
        };
        state_store::save_settings(&store, &custom).await?;
        assert!(!state_store::seed_defaults(&store, day(2026, 10, 17)).await?);
        assert_eq!(state_store::load_settings(&store).await?.daily_limit, 5);
        Ok(())
    }

    #[test]
    async fn test_corrupt_value_is_reported() {
        let store = MemoryStateStore::new();
        store
            .set(HashMap::from([(SETTINGS_KEY.to_string(), json!("not settings"))]))
            .await
            .unwrap();
        let res = state_store::load_settings(&store).await;
        assert!(matches!(res, Err(MailerError::Serialization(_))));
    }

    const BACKOFF: Duration = Duration::from_secs(5);

    #[test]
    async fn test_settings_validation() {
        assert!(Settings::default().validate(BACKOFF).is_ok());

        let inverted = Settings {
            min_delay_seconds: 90,
            max_delay_seconds: 60,
            ..Settings::default()
        };
        assert!(matches!(
            inverted.validate(BACKOFF),
            Err(MailerError::InvalidSettings(_))
        ));

        let zero = Settings {
            daily_limit: 0,
            ..Settings::default()
        };
        assert!(zero.validate(BACKOFF).is_err());

        for min in [0, 5] {
            let fast = Settings {
                min_delay_seconds: min,
                ..Settings::default()
            };
            assert!(matches!(
                fast.validate(BACKOFF),
                Err(MailerError::InvalidSettings(_))
            ));
        }
        let just_above = Settings {
            min_delay_seconds: 6,
            ..Settings::default()
        };
        assert!(just_above.validate(BACKOFF).is_ok());
    }

    #[test]
    async fn test_settings_partial_update_and_masking() {
        let current = Settings {
            api_key: "sk-123".to_string(),
            ..Settings::default()
        };
        let next = current.apply(UpdateSettingsRequest {
            daily_limit: Some(40),
            require_manual_review: Some(false),
            ..UpdateSettingsRequest::default()
        });

        assert_eq!(next.daily_limit, 40);
        assert!(!next.require_manual_review);
        assert_eq!(next.min_delay_seconds, 30);
        assert_eq!(next.api_key, "sk-123");

        assert_eq!(next.masked().api_key, API_KEY_MASK);

        // La máscara de vuelta no reemplaza el secreto
        let echoed = next.apply(UpdateSettingsRequest {
            api_key: Some(API_KEY_MASK.to_string()),
            ..UpdateSettingsRequest::default()
        });
        assert_eq!(echoed.api_key, "sk-123");
        let cleared = next.apply(UpdateSettingsRequest {
            api_key: Some(String::new()),
            ..UpdateSettingsRequest::default()
        });
        assert_eq!(cleared.api_key, "");
        assert!(!format!("{:?}", next).contains("sk-123"));
        assert_eq!(Settings::default().masked().api_key, "");
    }

    #[test]
    async fn test_settings_tolerate_missing_fields() {
        let settings: Settings = serde_json::from_value(json!({ "daily_limit": 7 })).unwrap();
        assert_eq!(settings.daily_limit, 7);
        assert_eq!(settings.max_delay_seconds, 60);
        assert!(settings.require_manual_review);
    }
}

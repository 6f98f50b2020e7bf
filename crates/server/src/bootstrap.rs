//! Startup model provisioning: train from CSV or load the saved artifact

use crate::api::AppState;
use crate::config::ServerConfig;
use hiring_lib::{
    health::components, training, ModelArtifact, Trainer, TrainingConfig,
};
use std::path::PathBuf;
use tracing::info;

/// Make a model available before serving. Failures are logged and leave the
/// server running without a model; readiness stays false until `/reload`
/// succeeds.
pub async fn prepare_model(config: &ServerConfig, state: &AppState) {
    let loaded = match (&config.training_data, config.train_on_startup) {
        (Some(data), true) => train_on_startup(config, state, data.clone()).await,
        _ => load_saved(config, state).await,
    };

    if loaded {
        state.health_registry.set_healthy(components::TRAINER).await;
    }
    state.model_changed().await;
}

async fn train_on_startup(
    config: &ServerConfig,
    state: &AppState,
    data: PathBuf,
) -> bool {
    let mut training_config = TrainingConfig::for_schema(config.schema);
    if let Some(n_trees) = config.n_trees {
        training_config.params = training_config.params.with_trees(n_trees);
    }
    let output = config.artifact_path.clone();
    info!(data = %data.display(), schema = %config.schema, "Training model on startup");

    let data_display = data.display().to_string();
    let result = tokio::task::spawn_blocking(move || {
        let rows = training::load_csv(&data, &training_config.schema)?;
        Trainer::new(training_config).train_to(&rows, &output)
    })
    .await;

    match result {
        Ok(Ok(model)) => {
            let report = model.artifact.report.as_ref();
            state.metrics.record_training(report);
            state
                .logger
                .log_model_trained(&model.version, config.schema.as_str(), report);
            state.handle().install(model);
            true
        }
        Ok(Err(e)) => {
            state
                .health_registry
                .set_unhealthy(components::TRAINER, e.to_string())
                .await;
            state.logger.log_model_load_failed(&data_display, &e.to_string());
            false
        }
        Err(e) => {
            state
                .health_registry
                .set_unhealthy(components::TRAINER, format!("training task failed: {}", e))
                .await;
            false
        }
    }
}

async fn load_saved(config: &ServerConfig, state: &AppState) -> bool {
    let path = config.artifact_path.clone();
    let path_display = path.display().to_string();
    let result = tokio::task::spawn_blocking(move || ModelArtifact::load(path)).await;

    match result {
        Ok(Ok(model)) => {
            state.logger.log_model_loaded(&model.version, &path_display);
            state.handle().install(model);
            true
        }
        Ok(Err(e)) => {
            state.logger.log_model_load_failed(&path_display, &e.to_string());
            false
        }
        Err(e) => {
            state
                .logger
                .log_model_load_failed(&path_display, &format!("load task failed: {}", e));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiring_lib::{HealthRegistry, HiringMetrics, ModelHandle, StructuredLogger};
    use tempfile::TempDir;

    fn state(config: &ServerConfig) -> AppState {
        AppState::new(
            ModelHandle::with_source(&config.artifact_path),
            HealthRegistry::new(),
            HiringMetrics::new(),
            StructuredLogger::new("bootstrap-test"),
        )
    }

    #[tokio::test]
    async fn test_missing_artifact_leaves_server_unready() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            artifact_path: dir.path().join("absent.bin"),
            ..ServerConfig::default()
        };
        let state = state(&config);
        prepare_model(&config, &state).await;
        assert!(!state.handle().is_loaded());
        assert!(!state.health_registry.readiness(false).await.ready);
    }

    #[tokio::test]
    async fn test_train_on_startup_persists_artifact() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("training.csv");
        let rows = training::generate_sample_rows(80, 42);
        training::write_csv(&data, &rows, &hiring_lib::FeatureSchema::smart_hiring()).unwrap();

        let config = ServerConfig {
            artifact_path: dir.path().join("models").join("rf.bin"),
            training_data: Some(data),
            train_on_startup: true,
            n_trees: Some(10),
            ..ServerConfig::default()
        };
        let state = state(&config);
        prepare_model(&config, &state).await;

        assert!(state.handle().is_loaded());
        assert!(config.artifact_path.exists());
        let reloaded = state.handle().reload().unwrap();
        assert_eq!(Some(reloaded.version.clone()), state.handle().version());
    }
}

use std::sync::Arc;

use crate::adapters::{AppConfig, FFmpegAdapter, FFprobeAdapter, StaticEncoderCatalog, ToolLocator};
use crate::app::{
    batch_interactor::BatchInteractor,
    clip_interactor::{ClipInteractor, PipelineSettings},
    inspect_interactor::InspectInteractor,
};
use crate::domain::model::FailurePolicy;
use crate::ports::{CommandPort, EncoderCatalogPort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn command_runner(&self) -> Arc<dyn CommandPort>;
    fn clip_interactor(&self) -> Arc<ClipInteractor>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    runner: Arc<dyn CommandPort>,
    clip_interactor: Arc<ClipInteractor>,
    batch_interactor: Arc<BatchInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    /// Wire the process-backed adapters from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let locator = ToolLocator::new(config.tools.ffmpeg.clone(), config.tools.ffprobe.clone());
        let runner: Arc<dyn CommandPort> = Arc::new(FFmpegAdapter::new(locator));
        let probe: Arc<dyn ProbePort> = Arc::new(FFprobeAdapter::new(Arc::clone(&runner)));
        let catalog: Arc<dyn EncoderCatalogPort> = Arc::new(StaticEncoderCatalog::from_config(
            config.encoding.available_encoders.clone(),
        ));
        let settings = PipelineSettings {
            hw_acceleration: config.encoding.hw_acceleration,
            concat_timeout: Some(config.encoding.concat_timeout()),
            scratch_root: config.encoding.scratch_dir.clone(),
        };

        Self::with_ports(runner, probe, catalog, settings, config.batch.on_failure)
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        runner: Arc<dyn CommandPort>,
        probe: Arc<dyn ProbePort>,
        catalog: Arc<dyn EncoderCatalogPort>,
        settings: PipelineSettings,
        policy: FailurePolicy,
    ) -> Self {
        let clip_interactor = Arc::new(ClipInteractor::new(
            Arc::clone(&runner),
            catalog,
            settings,
        ));
        let batch_interactor = Arc::new(BatchInteractor::new(
            Arc::clone(&probe),
            Arc::clone(&clip_interactor),
            policy,
        ));
        let inspect_interactor = Arc::new(InspectInteractor::new(probe));

        Self {
            runner,
            clip_interactor,
            batch_interactor,
            inspect_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn command_runner(&self) -> Arc<dyn CommandPort> {
        Arc::clone(&self.runner)
    }

    fn clip_interactor(&self) -> Arc<ClipInteractor> {
        Arc::clone(&self.clip_interactor)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}

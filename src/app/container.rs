use std::sync::Arc;

use crate::adapters::{FFmpegAdapter, FFprobeAdapter, TokioProcessAdapter, TracingLogAdapter};
use crate::app::{
    batch_interactor::BatchInteractor, collect_interactor::CollectInteractor,
    encode_interactor::EncodeInteractor, merge_interactor::MergeInteractor,
    reorder_interactor::ReorderInteractor,
};
use crate::config_initialization::Settings;
use crate::ports::{ConcatPort, EncodePort, LogSinkFactory, ProbePort, ProcessRunner};

pub trait AppContainer: Send + Sync {
    fn encode_interactor(&self) -> Arc<EncodeInteractor>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
    fn merge_interactor(&self) -> Arc<MergeInteractor>;
}

pub struct DefaultAppContainer {
    encode_interactor: Arc<EncodeInteractor>,
    batch_interactor: Arc<BatchInteractor>,
    merge_interactor: Arc<MergeInteractor>,
}

impl DefaultAppContainer {
    /// Wire the real ffmpeg / ffprobe adapters
    pub fn new(settings: &Settings) -> Self {
        let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessAdapter::new());
        let probe_port = Arc::new(FFprobeAdapter::new(Arc::clone(&runner), settings.ffprobe.clone()));
        let ffmpeg = Arc::new(FFmpegAdapter::new(
            Arc::clone(&runner),
            settings.ffmpeg.clone(),
            settings.quiet,
        ));
        let log_factory = Arc::new(TracingLogAdapter::new());

        Self::with_ports(
            probe_port,
            Arc::clone(&ffmpeg) as Arc<dyn EncodePort>,
            ffmpeg as Arc<dyn ConcatPort>,
            log_factory,
        )
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        probe_port: Arc<dyn ProbePort>,
        encode_port: Arc<dyn EncodePort>,
        concat_port: Arc<dyn ConcatPort>,
        log_factory: Arc<dyn LogSinkFactory>,
    ) -> Self {
        let encode_interactor = Arc::new(EncodeInteractor::new(
            Arc::clone(&probe_port),
            encode_port,
            log_factory,
        ));

        let batch_interactor = Arc::new(BatchInteractor::new(
            CollectInteractor::new(),
            Arc::clone(&encode_interactor),
        ));

        let merge_interactor = Arc::new(MergeInteractor::new(
            CollectInteractor::new(),
            ReorderInteractor::new(),
            Arc::clone(&encode_interactor),
            probe_port,
            concat_port,
        ));

        Self {
            encode_interactor,
            batch_interactor,
            merge_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn encode_interactor(&self) -> Arc<EncodeInteractor> {
        Arc::clone(&self.encode_interactor)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }

    fn merge_interactor(&self) -> Arc<MergeInteractor> {
        Arc::clone(&self.merge_interactor)
    }
}

use crate::config::{SourceConfig, SourceKind};
use crate::error::PipelineError;
use crate::pipeline::MetricsPipeline;
use chrono::Utc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Single-writer ingestion loop: reads raw lines from the configured source
/// and feeds them to the pipeline in strict arrival order.
///
/// Returns only on source exhaustion (stdin closed) or a hard pipeline
/// failure (resource exhaustion); per-line problems never stop the stream.
pub struct LogIngestor {
    pipeline: MetricsPipeline,
    source: SourceConfig,
}

impl LogIngestor {
    pub fn new(pipeline: MetricsPipeline, source: SourceConfig) -> Self {
        Self { pipeline, source }
    }

    pub async fn run(self) -> Result<(), PipelineError> {
        match self.source.kind {
            SourceKind::Stdin => self.run_stdin().await,
            SourceKind::File => self.run_file().await,
        }
    }

    async fn run_stdin(self) -> Result<(), PipelineError> {
        info!("📥 Ingesting log lines from stdin");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            self.feed(&line)?;
        }
        info!("stdin closed, ingestion finished");
        Ok(())
    }

    /// Follows an appended log file: read to EOF, then poll for new lines.
    async fn run_file(self) -> Result<(), PipelineError> {
        let path = self
            .source
            .path
            .as_deref()
            .ok_or_else(|| PipelineError::Config("source.path is required".to_string()))?;
        info!(path, "📥 Following log file");

        let file = File::open(path).await?;
        let mut reader = BufReader::new(file);
        let interval = Duration::from_millis(self.source.follow_interval_ms);
        let mut buf = String::new();

        loop {
            buf.clear();
            let n = reader.read_line(&mut buf).await?;
            if n == 0 {
                debug!("at EOF, waiting for new lines");
                sleep(interval).await;
                continue;
            }
            self.feed(buf.trim_end_matches(['\r', '\n']))?;
        }
    }

    fn feed(&self, line: &str) -> Result<(), PipelineError> {
        if line.trim().is_empty() {
            return Ok(());
        }
        // Arrival time is the fallback for lines without their own timestamp.
        self.pipeline.ingest_line(line, Some(Utc::now()))
    }
}

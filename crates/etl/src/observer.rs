//! 进度观察者
//!
//! 管道本身不写全局日志，进度通过注入的观察者上报。

use crate::pipeline::PipelineReport;

/// 管道事件
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started { raw_records: usize },
    MalformedField { id: String, field: &'static str, value: String },
    Normalized { records: usize },
    DuplicatesRemoved { removed: usize, remaining: usize },
    LocationFiltered { kept: usize, dropped: usize },
    Enriched { records: usize },
    Finished(PipelineReport),
}

pub trait ProgressObserver {
    fn notify(&self, event: &PipelineEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&PipelineEvent),
{
    fn notify(&self, event: &PipelineEvent) {
        self(event)
    }
}

/// 忽略所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn notify(&self, _event: &PipelineEvent) {}
}

/// 转发到 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn notify(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Started { raw_records } => {
                tracing::info!("Processing {} raw job records", raw_records)
            }
            PipelineEvent::MalformedField { id, field, value } => {
                tracing::debug!("Dropped malformed {} on job {}: {}", field, id, value)
            }
            PipelineEvent::Normalized { records } => {
                tracing::debug!("Normalized {} records", records)
            }
            PipelineEvent::DuplicatesRemoved { removed, remaining } => {
                tracing::info!("Duplicates removed: {} ({} remaining)", removed, remaining)
            }
            PipelineEvent::LocationFiltered { kept, dropped } => {
                tracing::info!("Location filter kept {} records, dropped {}", kept, dropped)
            }
            PipelineEvent::Enriched { records } => {
                tracing::info!("Enriched {} records", records)
            }
            PipelineEvent::Finished(report) => {
                tracing::info!(
                    "Pipeline finished: {} raw -> {} enriched ({} malformed fields)",
                    report.raw_records,
                    report.enriched_records,
                    report.malformed_fields
                )
            }
        }
    }
}

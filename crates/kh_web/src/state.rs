use std::sync::Arc;

use kh_core::{Settings, Storage};
use kh_notify::Notifier;
use kh_summary::SummaryPipeline;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<SummaryPipeline>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: Settings,
}

use std::sync::Arc;

use engagement_client::EngagementApi;

pub mod config;
pub mod render;
pub mod shell;
pub mod views;

pub use shell::build_router;

use views::FileResetPolicy;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn EngagementApi>,
    pub upload_reset_policy: FileResetPolicy,
}

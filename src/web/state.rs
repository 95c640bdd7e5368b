use std::sync::Arc;

use crate::config::Config;
use crate::link::LinkHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub link: LinkHandle,
}

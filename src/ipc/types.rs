use std::path::PathBuf;

use crate::store::Store;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Store>,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            workspace: None,
            store: None,
        }
    }
}

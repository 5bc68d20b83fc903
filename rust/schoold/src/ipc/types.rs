use std::path::PathBuf;

use serde::Deserialize;

use crate::backend::Backend;
use crate::config::Config;
use crate::forms::FormController;
use crate::linker::LinkSelection;
use crate::model::Page;
use crate::notify::NoticeQueue;
use crate::seed::Seeder;
use crate::session::{FixedCredentials, Session};
use crate::store::EntityStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub backend: Option<Box<dyn Backend>>,
    pub store: EntityStore,
    pub seeder: Seeder,
    pub session: Session,
    pub forms: FormController,
    pub links: LinkSelection,
    pub page: Page,
    pub notices: NoticeQueue,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let notices = NoticeQueue::default();
        AppState {
            workspace: None,
            backend: None,
            store: EntityStore::new(notices.clone()),
            seeder: Seeder::new(!config.no_seed),
            session: Session::new(Box::new(FixedCredentials::default())),
            forms: FormController::default(),
            links: LinkSelection::default(),
            page: Page::default(),
            notices,
        }
    }
}

use crate::auth::Sessions;
use crate::configuration::Settings;
use crate::db::Database;
use crate::errors::Error;
use crate::notifier::{self, Notifier};
use crate::parser::{ProductSource, Scraper};
use crate::tracker::RefreshLocks;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub source: Arc<dyn ProductSource>,
    pub notifier: Arc<dyn Notifier>,
    pub sessions: Arc<Sessions>,
    pub refresh_locks: Arc<RefreshLocks>,
}

impl AppState {
    pub fn new(
        db: Database,
        source: Arc<dyn ProductSource>,
        notifier: Arc<dyn Notifier>,
        sessions: Sessions,
    ) -> Self {
        Self {
            db: Arc::new(db),
            source,
            notifier,
            sessions: Arc::new(sessions),
            refresh_locks: Arc::new(RefreshLocks::default()),
        }
    }

    /// Wires the scraper, notifier and store described by `settings`.
    pub async fn init(settings: &Settings) -> Result<Self, Error> {
        let db = Database::try_from(&settings.database).await?;
        let scraper = Scraper::new(&settings.scraper, &settings.language_model)?;
        Ok(Self::new(
            db,
            Arc::new(scraper),
            notifier::from_settings(&settings.notifier)?,
            Sessions::new(settings.session_ttl_hours),
        ))
    }
}

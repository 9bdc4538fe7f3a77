use std::sync::Arc;

use feed::MemoryFeed;
use results_core::ResultsLoader;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::store::SeaOrmStore;
use crate::watchers::WatchRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Writers publish committed row changes here.
    pub feed: MemoryFeed,
    pub loader: ResultsLoader,
    pub watches: Arc<WatchRegistry>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let store = Arc::new(SeaOrmStore::new(db.clone()));
        let feed = MemoryFeed::new();
        let strategy = results_core::strategy_for(&config.results.ranking);
        let loader = ResultsLoader::new(store.clone(), strategy);
        let watches = Arc::new(WatchRegistry::new(
            store,
            Arc::new(feed.clone()),
            config.feed.clone(),
        ));

        Self {
            db,
            config,
            feed,
            loader,
            watches,
        }
    }
}

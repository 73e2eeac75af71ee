use std::sync::Arc;

use common::Storage;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::imaging::{ImagePipeline, ResponsiveImages};
use crate::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub storage: Storage,
    pub pipeline: ImagePipeline,
    pub images: ResponsiveImages,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        storage: Storage,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let pipeline = ImagePipeline::new(storage.clone(), &config.images);
        let images = ResponsiveImages::new(storage.clone(), &config.images.renditions);
        Self {
            db,
            config: Arc::new(config),
            storage,
            pipeline,
            images,
            mailer,
        }
    }
}

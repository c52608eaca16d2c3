use std::sync::Arc;

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_sdk_s3::config::Region;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserStore, UserStore},
    },
    config::AppConfig,
    llm::{CoverLetterWriter, OpenAiClient},
    mail::{Mailer, SesMailer},
    resumes::repo::{PgResumeStore, ResumeStore},
    storage::{Storage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtKeys>,
    pub users: Arc<dyn UserStore>,
    pub resumes: Arc<dyn ResumeStore>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn Mailer>,
    pub llm: Arc<dyn CoverLetterWriter>,
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl AppState {
    /// Production wiring: Postgres stores, S3 blobs, SES mail, OpenAI.
    pub async fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let jwt = Arc::new(JwtKeys::from_config(&config.jwt));

        let storage = Arc::new(
            Storage::new(&config.storage)
                .await
                .context("init blob storage")?,
        ) as Arc<dyn StorageClient>;

        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(config.storage.region.clone()))
            .load()
            .await;
        let mailer = Arc::new(SesMailer::new(&shared, config.mail.sender.clone())) as Arc<dyn Mailer>;

        let llm = Arc::new(OpenAiClient::new(&config.llm)?) as Arc<dyn CoverLetterWriter>;

        Ok(Self {
            jwt,
            users: Arc::new(PgUserStore::new(db.clone())),
            resumes: Arc::new(PgResumeStore::new(db)),
            storage,
            mailer,
            llm,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::TestHarness::new().state
    }
}

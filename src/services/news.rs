//! News service implementation
//!
//! Members read the latest articles; administrators write them.

use tracing::{debug, info};
use crate::database::repositories::NewsRepository;
use crate::models::news::{News, CreateNewsRequest, UpdateNewsRequest};
use crate::services::auth::AuthService;
use crate::utils::errors::{RunRaceError, Result};
use crate::utils::helpers::{optional_url, required_text};
use crate::utils::logging::log_admin_action;

/// Longest article body accepted; a card must fit one Telegram message
pub const MAX_CONTENT_LENGTH: usize = 3500;

#[derive(Clone)]
pub struct NewsService {
    news: NewsRepository,
    auth: AuthService,
}

impl NewsService {
    pub fn new(news: NewsRepository, auth: AuthService) -> Self {
        Self { news, auth }
    }

    /// Most recent articles first
    pub async fn latest(&self, limit: i64) -> Result<Vec<News>> {
        debug!(limit = limit, "Listing news");
        self.news.list_recent(limit).await
    }

    pub async fn get_news(&self, news_id: i64) -> Result<News> {
        self.news
            .find_by_id(news_id)
            .await?
            .ok_or(RunRaceError::NewsNotFound { news_id })
    }

    pub async fn create_news(&self, actor: i64, mut request: CreateNewsRequest) -> Result<News> {
        self.auth.require_admin(actor)?;

        request.title = required_text("News title", &request.title)?;
        request.content = content(&request.content)?;
        request.image_url = optional_url(request.image_url)?;
        request.created_by = Some(actor);

        let news = self.news.create(request).await?;
        info!(news_id = news.id, "News published");
        log_admin_action(actor, "create_news", Some(&news.id.to_string()), Some(&news.title));

        Ok(news)
    }

    pub async fn update_news(&self, actor: i64, news_id: i64, mut request: UpdateNewsRequest) -> Result<News> {
        self.auth.require_admin(actor)?;

        if let Some(title) = &request.title {
            request.title = Some(required_text("News title", title)?);
        }
        if let Some(body) = &request.content {
            request.content = Some(content(body)?);
        }
        request.image_url = if request.clear_image { None } else { optional_url(request.image_url)? };

        let news = self.news.update(news_id, request).await?;
        log_admin_action(actor, "update_news", Some(&news_id.to_string()), None);

        Ok(news)
    }

    pub async fn delete_news(&self, actor: i64, news_id: i64) -> Result<()> {
        self.auth.require_admin(actor)?;

        if !self.news.delete(news_id).await? {
            return Err(RunRaceError::NewsNotFound { news_id });
        }

        log_admin_action(actor, "delete_news", Some(&news_id.to_string()), None);
        Ok(())
    }
}

fn content(value: &str) -> Result<String> {
    let value = required_text("News content", value)?;
    if value.chars().count() > MAX_CONTENT_LENGTH {
        return Err(RunRaceError::InvalidInput(
            format!("News content is limited to {} characters", MAX_CONTENT_LENGTH)
        ));
    }
    Ok(value)
}

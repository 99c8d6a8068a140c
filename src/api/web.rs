//! HTTP transport: drives the News updater endpoints with basic-auth GET
//! requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use url::Url;

use super::{parse_feed_list, ApiLevel, FeedJob, FeedSource, FeedUpdater};
use crate::errors::{ApiError, ApiResult};

/// Timeout for hook and feed-list requests. Single feed updates use the
/// configured per-item timeout instead.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The updater endpoints of one News installation and API level.
#[derive(Debug, Clone)]
pub struct WebApi {
    level: ApiLevel,
    before_update_url: Url,
    all_feeds_url: Url,
    update_url: Url,
    after_update_url: Url,
}

impl WebApi {
    pub fn new(base_url: &str, level: ApiLevel) -> ApiResult<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        // the News 15 format change only affected the console API; over
        // HTTP it uses the v1-2 endpoints
        let (root, before, all, update, after) = match level {
            ApiLevel::V2 => (
                format!("{base}index.php/apps/news/api/v2"),
                "updater/before-update",
                "updater/all-feeds",
                "updater/update-feed",
                "updater/after-update",
            ),
            ApiLevel::V12 | ApiLevel::V15 => (
                format!("{base}index.php/apps/news/api/v1-2"),
                "cleanup/before-update",
                "feeds/all",
                "feeds/update",
                "cleanup/after-update",
            ),
        };
        let endpoint = |suffix: &str| -> ApiResult<Url> {
            let url = format!("{root}/{suffix}");
            Url::parse(&url).map_err(|source| ApiError::InvalidUrl { url, source })
        };
        Ok(Self {
            level,
            before_update_url: endpoint(before)?,
            all_feeds_url: endpoint(all)?,
            update_url: endpoint(update)?,
            after_update_url: endpoint(after)?,
        })
    }

    pub fn before_update_url(&self) -> &Url {
        &self.before_update_url
    }

    pub fn all_feeds_url(&self) -> &Url {
        &self.all_feeds_url
    }

    pub fn after_update_url(&self) -> &Url {
        &self.after_update_url
    }

    /// Update URL for one feed. The query-pair order is fixed.
    pub fn update_feed_url(&self, job: &FeedJob) -> Url {
        let mut url = self.update_url.clone();
        url.query_pairs_mut()
            .append_pair("userId", &job.user_id)
            .append_pair("feedId", &job.feed_id.to_string());
        url
    }
}

/// Feed source and updater backed by the News HTTP API.
pub struct WebUpdater {
    api: WebApi,
    client: Client,
    user: String,
    password: String,
    update_timeout: Option<Duration>,
}

impl WebUpdater {
    pub fn new(
        base_url: &str,
        user: &str,
        password: &str,
        level: ApiLevel,
        timeout_seconds: u64,
    ) -> ApiResult<Self> {
        Ok(Self {
            api: WebApi::new(base_url, level)?,
            client: Client::builder().build()?,
            user: user.to_string(),
            password: password.to_string(),
            update_timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        })
    }

    async fn get(&self, url: Url, timeout: Option<Duration>) -> ApiResult<String> {
        let mut request = self
            .client
            .get(url.clone())
            .basic_auth(&self.user, Some(&self.password));
        if let Some(limit) = timeout {
            request = request.timeout(limit);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedSource for WebUpdater {
    async fn before_update(&self) -> ApiResult<()> {
        info!("Calling before update url: {}", self.api.before_update_url);
        self.get(
            self.api.before_update_url.clone(),
            Some(DEFAULT_REQUEST_TIMEOUT),
        )
        .await
        .map(drop)
    }

    async fn all_feeds(&self) -> ApiResult<Vec<FeedJob>> {
        info!("Calling all feeds url: {}", self.api.all_feeds_url);
        let payload = self
            .get(self.api.all_feeds_url.clone(), Some(DEFAULT_REQUEST_TIMEOUT))
            .await?;
        info!("Received these feeds to update: {}", payload.trim());
        parse_feed_list(self.api.level, &payload)
    }

    async fn after_update(&self) -> ApiResult<()> {
        info!("Calling after update url: {}", self.api.after_update_url);
        self.get(
            self.api.after_update_url.clone(),
            Some(DEFAULT_REQUEST_TIMEOUT),
        )
        .await
        .map(drop)
    }
}

#[async_trait]
impl FeedUpdater for WebUpdater {
    async fn update_feed(&self, job: &FeedJob) -> ApiResult<()> {
        let url = self.api.update_feed_url(job);
        info!("Calling update url: {url}");
        self.get(url, self.update_timeout).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_v12_endpoints() {
        let api = WebApi::new("http://google.de", ApiLevel::V12).unwrap();
        assert_eq!(
            api.before_update_url().as_str(),
            "http://google.de/index.php/apps/news/api/v1-2/cleanup/before-update"
        );
        assert_eq!(
            api.all_feeds_url().as_str(),
            "http://google.de/index.php/apps/news/api/v1-2/feeds/all"
        );
        assert_eq!(
            api.after_update_url().as_str(),
            "http://google.de/index.php/apps/news/api/v1-2/cleanup/after-update"
        );
    }

    #[test]
    fn builds_v2_endpoints() {
        let api = WebApi::new("http://google.de", ApiLevel::V2).unwrap();
        assert_eq!(
            api.before_update_url().as_str(),
            "http://google.de/index.php/apps/news/api/v2/updater/before-update"
        );
        assert_eq!(
            api.all_feeds_url().as_str(),
            "http://google.de/index.php/apps/news/api/v2/updater/all-feeds"
        );
        assert_eq!(
            api.after_update_url().as_str(),
            "http://google.de/index.php/apps/news/api/v2/updater/after-update"
        );
    }

    #[test]
    fn v15_uses_v12_endpoints() {
        let api = WebApi::new("http://google.de", ApiLevel::V15).unwrap();
        assert_eq!(
            api.all_feeds_url().as_str(),
            "http://google.de/index.php/apps/news/api/v1-2/feeds/all"
        );
    }

    #[test]
    fn update_url_has_fixed_query_order() {
        let api = WebApi::new("http://google.de", ApiLevel::V12).unwrap();
        let url = api.update_feed_url(&FeedJob::new(2, "deb"));
        assert_eq!(
            url.as_str(),
            "http://google.de/index.php/apps/news/api/v1-2/feeds/update?userId=deb&feedId=2"
        );
    }

    #[test]
    fn keeps_existing_trailing_slash() {
        let with_slash = WebApi::new("http://google.de/", ApiLevel::V12).unwrap();
        let without_slash = WebApi::new("http://google.de", ApiLevel::V12).unwrap();
        assert_eq!(
            with_slash.all_feeds_url().as_str(),
            without_slash.all_feeds_url().as_str()
        );
    }

    #[test]
    fn subdirectory_installs_keep_their_path() {
        let api = WebApi::new("https://example.com/cloud", ApiLevel::V12).unwrap();
        assert_eq!(
            api.all_feeds_url().as_str(),
            "https://example.com/cloud/index.php/apps/news/api/v1-2/feeds/all"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            WebApi::new("not a url", ApiLevel::V12),
            Err(ApiError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let api = WebApi::new("http://google.de", ApiLevel::V2).unwrap();
        let url = api.update_feed_url(&FeedJob::new(9, "user name"));
        assert_eq!(
            url.as_str(),
            "http://google.de/index.php/apps/news/api/v2/updater/update-feed?userId=user+name&feedId=9"
        );
    }
}

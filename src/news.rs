//! Regional breaking-news headlines from the Liberty Times.

use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::models::{City, CityRegistry};
use crate::render::{escape_html, BOOTSTRAP_CSS};

const NEWS_LIST_BASE: &str = "https://news.ltn.com.tw/list/breakingnews/";

/// Paragraphs containing these markers are ads or page chrome
const SKIPPED_MARKERS: [&str; 2] = ["爆", "為達最佳瀏覽效果"];

#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub content: String,
}

pub struct NewsClient {
    client: Client,
    base: Url,
    headline_limit: usize,
}

impl NewsClient {
    pub fn new(config: &NewsConfig) -> anyhow::Result<Self> {
        Self::with_base_url(config, NEWS_LIST_BASE)
    }

    /// Client reading list pages under `base` instead of the public site
    pub fn with_base_url(config: &NewsConfig, base: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: Url::parse(base)?,
            headline_limit: config.headline_limit,
        })
    }

    /// Latest headlines for `city`, each with its article text
    pub async fn headlines(&self, city: &City) -> Result<Vec<Headline>, NewsError> {
        let list_url = self.base.join(city.news_slug)?;
        info!("Fetching news list {}", list_url);
        let page = self.fetch(list_url.as_str()).await?;
        let links = parse_headlines(&page, self.headline_limit)?;

        let mut headlines = Vec::with_capacity(links.len());
        for (title, href) in links {
            let url = list_url.join(&href)?;
            let content = match self.fetch(url.as_str()).await {
                Ok(article) => parse_article(&article)?,
                Err(e) => {
                    warn!("Failed to fetch article {}: {}", url, e);
                    String::new()
                }
            };
            headlines.push(Headline {
                title,
                url: url.to_string(),
                content,
            });
        }
        debug!("Collected {} headlines for {}", headlines.len(), city.name);
        Ok(headlines)
    }

    /// Headline table for a city name, or the failure message
    pub async fn query(&self, registry: &CityRegistry, city: &str) -> String {
        let result = match registry.lookup(city) {
            Some(city) => self.headlines(city).await,
            None => Err(NewsError::CityNotSupported(city.to_string())),
        };
        match result {
            Ok(headlines) => render_news(&headlines),
            Err(e) => {
                warn!("News query for {} failed: {}", city, e);
                escape_html(&e.to_string())
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, NewsError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

fn selector(css: &str) -> Result<Selector, NewsError> {
    Selector::parse(css).map_err(|e| NewsError::Parse(e.to_string()))
}

/// (title, href) of the first `limit` headline anchors
fn parse_headlines(html: &str, limit: usize) -> Result<Vec<(String, String)>, NewsError> {
    let document = Html::parse_document(html);
    let anchors = selector("a.tit")?;
    Ok(document
        .select(&anchors)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let title: String = a.text().map(str::trim).collect();
            Some((title, href.to_string()))
        })
        .take(limit)
        .collect())
}

/// Article paragraphs joined by spaces, minus ads and page chrome
fn parse_article(html: &str) -> Result<String, NewsError> {
    let document = Html::parse_document(html);
    let paragraphs = selector("p")?;
    let texts: Vec<String> = document
        .select(&paragraphs)
        .map(|p| p.text().collect::<String>())
        .filter(|text| !SKIPPED_MARKERS.iter().any(|m| text.contains(m)))
        .map(|text| text.trim().to_string())
        .collect();
    Ok(texts.join(" "))
}

pub fn render_news(headlines: &[Headline]) -> String {
    let mut html = String::new();
    html.push_str(&format!("<link href=\"{}\" rel=\"stylesheet\">", BOOTSTRAP_CSS));
    html.push_str("<table class=\"table table-striped\">\n");
    html.push_str("  <thead>\n    <tr><th>標題</th><th>內容</th></tr>\n  </thead>\n  <tbody>\n");
    for headline in headlines {
        html.push_str(&format!(
            "    <tr><td><a href=\"{}\" target=\"_blank\">{}</a></td><td>{}</td></tr>\n",
            escape_html(&headline.url),
            escape_html(&headline.title),
            escape_html(&headline.content)
        ));
    }
    html.push_str("  </tbody>\n</table>");
    html
}

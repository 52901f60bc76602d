//! Movie metadata lookup
//!
//! [`MetadataLookup`] is the seam between the router and the movie catalog.
//! [`TmdbClient`] implements it over the TMDB v3 HTTP API. Lookups never
//! fail the interaction: transport and API errors are logged and reported
//! as "not found".

use async_trait::async_trait;
use clapper_common::config::BotConfig;
use clapper_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("clapper/", env!("CARGO_PKG_VERSION"));

/// Shown when no genre id maps to a name
pub const GENRES_NOT_AVAILABLE: &str = "Not available";

/// TMDB movie genre ids
const GENRES: &[(i64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Catalog entry as returned by a lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub summary: String,
    /// Catalog vote average (0-10)
    pub score: f64,
    /// `YYYY-MM-DD`, empty when unknown
    pub release_date: String,
    pub poster_ref: Option<String>,
    pub genre_ids: Vec<i64>,
}

impl CatalogItem {
    /// Year part of the release date, `Unknown` when missing
    pub fn release_year(&self) -> String {
        match self.release_date.split('-').next() {
            Some(year) if !year.is_empty() => year.to_string(),
            _ => "Unknown".to_string(),
        }
    }
}

#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Best match for a free-text title
    async fn search_by_title(&self, text: &str) -> Option<CatalogItem>;

    /// Catalog entry by id
    async fn get_by_id(&self, id: i64) -> Option<CatalogItem>;

    /// Absolute image URL for a poster reference
    fn poster_url(&self, poster_ref: &str) -> Option<String>;
}

/// Comma-separated genre names, at most five, in catalog order
pub fn genre_summary(ids: &[i64]) -> String {
    let names: Vec<&str> = ids
        .iter()
        .filter_map(|id| GENRES.iter().find(|(known, _)| known == id).map(|(_, name)| *name))
        .take(5)
        .collect();

    if names.is_empty() {
        GENRES_NOT_AVAILABLE.to_string()
    } else {
        names.join(", ")
    }
}

/// Catalog id from a pasted `themoviedb.org/movie/<id>` link
///
/// # Examples
/// ```
/// use clapper_bot::metadata::parse_catalog_link;
///
/// assert_eq!(parse_catalog_link("https://www.themoviedb.org/movie/603-the-matrix"), Some(603));
/// assert_eq!(parse_catalog_link("The Matrix"), None);
/// ```
pub fn parse_catalog_link(text: &str) -> Option<i64> {
    const MARKER: &str = "themoviedb.org/movie/";

    let start = text.find(MARKER)? + MARKER.len();
    let digits: String = text[start..].chars().take_while(|c| c.is_ascii_digit()).collect();

    match digits.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

/// TMDB client errors; logged and folded into "not found"
#[derive(Debug, ThisError)]
enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}")]
    Api(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
}

/// Search results carry `genre_ids`; the details endpoint carries `genres`
#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    #[serde(default)]
    title: String,
    overview: Option<String>,
    vote_average: Option<f64>,
    release_date: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    genre_ids: Vec<i64>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
}

impl From<TmdbMovie> for CatalogItem {
    fn from(movie: TmdbMovie) -> Self {
        let genre_ids = if movie.genre_ids.is_empty() {
            movie.genres.iter().map(|g| g.id).collect()
        } else {
            movie.genre_ids
        };

        CatalogItem {
            id: movie.id,
            title: movie.title,
            summary: movie.overview.unwrap_or_default(),
            score: movie.vote_average.unwrap_or(0.0),
            release_date: movie.release_date.unwrap_or_default(),
            poster_ref: movie.poster_path.filter(|p| !p.is_empty()),
            genre_ids,
        }
    }
}

/// TMDB v3 API client
pub struct TmdbClient {
    http_client: reqwest::Client,
    api_key: String,
    api_base: String,
    image_base: String,
}

impl TmdbClient {
    pub fn new(api_key: &str, api_base: &str, image_base: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            image_base: image_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(
            &config.tmdb_api_key,
            &config.tmdb_api_base,
            &config.tmdb_image_base,
            config.http_timeout,
        )
    }

    /// `Ok(None)` on 404
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<Option<T>, LookupError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(url = %url, "Querying TMDB API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(query)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Api(status.as_u16()));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl MetadataLookup for TmdbClient {
    async fn search_by_title(&self, text: &str) -> Option<CatalogItem> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        match self
            .get_json::<SearchResponse>("/search/movie", &[("query", text)])
            .await
        {
            Ok(response) => response
                .and_then(|r| r.results.into_iter().next())
                .map(CatalogItem::from),
            Err(e) => {
                warn!(query = %text, error = %e, "Movie search failed");
                None
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Option<CatalogItem> {
        match self.get_json::<TmdbMovie>(&format!("/movie/{}", id), &[]).await {
            Ok(movie) => movie.map(CatalogItem::from),
            Err(e) => {
                warn!(movie_id = id, error = %e, "Movie lookup failed");
                None
            }
        }
    }

    fn poster_url(&self, poster_ref: &str) -> Option<String> {
        if poster_ref.is_empty() {
            return None;
        }
        let separator = if poster_ref.starts_with('/') { "" } else { "/" };
        Some(format!("{}{}{}", self.image_base, separator, poster_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_summary_limits_to_five() {
        assert_eq!(genre_summary(&[28, 18]), "Action, Drama");
        assert_eq!(
            genre_summary(&[28, 12, 16, 35, 80, 99, 18]),
            "Action, Adventure, Animation, Comedy, Crime"
        );
    }

    #[test]
    fn test_genre_summary_unknown_ids() {
        assert_eq!(genre_summary(&[]), GENRES_NOT_AVAILABLE);
        assert_eq!(genre_summary(&[1, 2, 3]), GENRES_NOT_AVAILABLE);
        assert_eq!(genre_summary(&[1, 878]), "Science Fiction");
    }

    #[test]
    fn test_parse_catalog_link() {
        assert_eq!(parse_catalog_link("themoviedb.org/movie/550"), Some(550));
        assert_eq!(
            parse_catalog_link("see https://www.themoviedb.org/movie/13?language=pt-BR"),
            Some(13)
        );
        assert_eq!(parse_catalog_link("https://www.themoviedb.org/tv/1399"), None);
        assert_eq!(parse_catalog_link("themoviedb.org/movie/abc"), None);
        assert_eq!(parse_catalog_link("themoviedb.org/movie/0"), None);
    }

    #[test]
    fn test_release_year() {
        let mut item = CatalogItem {
            id: 1,
            title: "Fight Club".to_string(),
            summary: String::new(),
            score: 8.4,
            release_date: "1999-10-15".to_string(),
            poster_ref: None,
            genre_ids: vec![18],
        };
        assert_eq!(item.release_year(), "1999");

        item.release_date.clear();
        assert_eq!(item.release_year(), "Unknown");
    }

    #[test]
    fn test_details_genres_fill_genre_ids() {
        let movie: TmdbMovie = serde_json::from_str(
            r#"{"id":603,"title":"The Matrix","overview":null,"vote_average":8.2,
                "release_date":"1999-03-30","poster_path":"/p.jpg",
                "genres":[{"id":28,"name":"Action"},{"id":878,"name":"Science Fiction"}]}"#,
        )
        .unwrap();

        let item = CatalogItem::from(movie);
        assert_eq!(item.genre_ids, vec![28, 878]);
        assert_eq!(item.summary, "");
        assert_eq!(item.poster_ref.as_deref(), Some("/p.jpg"));
    }

    #[test]
    fn test_null_or_missing_score_reads_as_zero() {
        let movie: TmdbMovie = serde_json::from_str(
            r#"{"id":1,"title":"Obscure","vote_average":null,"release_date":null}"#,
        )
        .unwrap();
        assert_eq!(CatalogItem::from(movie).score, 0.0);

        let movie: TmdbMovie = serde_json::from_str(r#"{"id":2,"title":"Bare"}"#).unwrap();
        let item = CatalogItem::from(movie);
        assert_eq!(item.score, 0.0);
        assert_eq!(item.release_year(), "Unknown");
    }

    #[test]
    fn test_poster_url() {
        let client = TmdbClient::new(
            "key",
            "http://localhost/3",
            "https://image.example/t/p/w500/",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            client.poster_url("/abc.jpg").as_deref(),
            Some("https://image.example/t/p/w500/abc.jpg")
        );
        assert_eq!(client.poster_url(""), None);
    }
}

// src/repositories/pocketbase_record_store.rs
//
// PocketBase-backed record store.
//
// COLLECTIONS:
// - bookmarks: one row per (user, animeId), `watchHistory` relation
// - watched:   one row per (bookmark, episode)
//
// Maps HTTP/JSON to domain types only; every policy decision (when to
// write, what to do on failure) belongs to the progress synchronizer.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::ControllerConfig;
use crate::domain::{
    BookmarkHistory, BookmarkId, BookmarkRequest, RecordId, WatchProgress, WatchProgressRecord,
};
use crate::error::{AppError, AppResult};
use crate::repositories::RecordStore;

const BOOKMARKS: &str = "bookmarks";
const WATCHED: &str = "watched";

/// Credentials of the signed-in viewer
#[derive(Debug, Clone)]
pub struct PocketBaseAuth {
    pub user_id: String,
    pub token: String,
}

/// Paginated list response
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    items: Vec<T>,
}

/// Bare record (only the id is needed)
#[derive(Debug, Deserialize)]
struct RecordRef {
    id: String,
}

/// Bookmark row with `?expand=watchHistory`
#[derive(Debug, Deserialize)]
struct ExpandedBookmark {
    #[serde(default)]
    expand: Option<BookmarkExpand>,
}

#[derive(Debug, Deserialize)]
struct BookmarkExpand {
    #[serde(rename = "watchHistory", default)]
    watch_history: Vec<WatchProgressRecord>,
}

impl From<ExpandedBookmark> for BookmarkHistory {
    fn from(bookmark: ExpandedBookmark) -> Self {
        BookmarkHistory {
            watch_history: bookmark
                .expand
                .map(|expand| expand.watch_history)
                .unwrap_or_default(),
        }
    }
}

pub struct PocketBaseRecordStore {
    base_url: String,
    http_client: Client,
    auth: PocketBaseAuth,
}

impl PocketBaseRecordStore {
    /// Store at the configured record store URL
    pub fn from_config(config: &ControllerConfig, auth: PocketBaseAuth) -> AppResult<Self> {
        Self::new(config.record_store_url.as_str(), auth)
    }

    pub fn new(base_url: impl Into<String>, auth: PocketBaseAuth) -> AppResult<Self> {
        if auth.token.trim().is_empty() || auth.user_id.trim().is_empty() {
            return Err(AppError::Unauthenticated);
        }

        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            auth,
        })
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, self.auth.token.as_str())
    }

    /// Send, check the status, decode the body
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self.authorized(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteStore {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    async fn find_bookmark(&self, anime_id: &str) -> AppResult<Option<String>> {
        let filter = bookmark_filter(&self.auth.user_id, anime_id);
        let list: ListResponse<RecordRef> = self
            .send_json(
                self.http_client
                    .get(self.records_url(BOOKMARKS))
                    .query(&[("filter", filter.as_str()), ("perPage", "1")]),
            )
            .await?;
        Ok(list.items.into_iter().next().map(|record| record.id))
    }
}

#[async_trait]
impl RecordStore for PocketBaseRecordStore {
    async fn create_or_update_bookmark(
        &self,
        request: &BookmarkRequest,
    ) -> AppResult<Option<BookmarkId>> {
        let body = bookmark_body(&self.auth.user_id, request);

        let record: RecordRef = match self.find_bookmark(&request.anime_id).await? {
            Some(id) => {
                debug!("updating bookmark {} for anime {}", id, request.anime_id);
                self.send_json(
                    self.http_client
                        .patch(self.record_url(BOOKMARKS, &id))
                        .json(&body),
                )
                .await?
            }
            None => {
                debug!("creating bookmark for anime {}", request.anime_id);
                self.send_json(self.http_client.post(self.records_url(BOOKMARKS)).json(&body))
                    .await?
            }
        };

        Ok(Some(BookmarkId::new(record.id)).filter(|id| !id.as_str().is_empty()))
    }

    async fn get_bookmark_with_history(&self, bookmark: &BookmarkId) -> AppResult<BookmarkHistory> {
        let expanded: ExpandedBookmark = self
            .send_json(
                self.http_client
                    .get(self.record_url(BOOKMARKS, bookmark.as_str()))
                    .query(&[("expand", "watchHistory")]),
            )
            .await?;
        Ok(expanded.into())
    }

    async fn upsert_watch_progress(
        &self,
        bookmark: &BookmarkId,
        record: Option<RecordId>,
        progress: &WatchProgress,
    ) -> AppResult<RecordId> {
        if let Some(record) = record {
            let updated: RecordRef = self
                .send_json(
                    self.http_client
                        .patch(self.record_url(WATCHED, record.as_str()))
                        .json(progress),
                )
                .await?;
            return Ok(RecordId::new(updated.id));
        }

        let created: RecordRef = self
            .send_json(self.http_client.post(self.records_url(WATCHED)).json(progress))
            .await?;

        // The row exists from here on; a failed link must not lose its id
        let linked: AppResult<RecordRef> = self
            .send_json(
                self.http_client
                    .patch(self.record_url(BOOKMARKS, bookmark.as_str()))
                    .json(&json!({ "watchHistory+": created.id })),
            )
            .await;
        if let Err(e) = linked {
            warn!(
                "watch history {} created but not linked to bookmark {}: {}",
                created.id, bookmark, e
            );
        }

        Ok(RecordId::new(created.id))
    }
}

/// PocketBase filter selecting the viewer's bookmark for one anime
fn bookmark_filter(user_id: &str, anime_id: &str) -> String {
    format!(
        "(user='{}' && animeId='{}')",
        escape_filter_value(user_id),
        escape_filter_value(anime_id)
    )
}

fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn bookmark_body(user_id: &str, request: &BookmarkRequest) -> serde_json::Value {
    json!({
        "user": user_id,
        "animeId": request.anime_id,
        "animeTitle": request.title,
        "thumbnail": request.image,
        "status": request.status.as_str(),
        "completed": request.completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookmarkStatus;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn store() -> PocketBaseRecordStore {
        PocketBaseRecordStore::new(
            "http://127.0.0.1:8090/",
            PocketBaseAuth {
                user_id: "u1".to_string(),
                token: "t".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_urls_drop_trailing_slash() {
        let store = store();
        assert_eq!(
            store.records_url(BOOKMARKS),
            "http://127.0.0.1:8090/api/collections/bookmarks/records"
        );
        assert_eq!(
            store.record_url(WATCHED, "w1"),
            "http://127.0.0.1:8090/api/collections/watched/records/w1"
        );
    }

    #[test]
    fn test_from_config_uses_record_store_url() {
        let config = ControllerConfig {
            record_store_url: "https://records.example/".to_string(),
            ..ControllerConfig::default()
        };
        let store = PocketBaseRecordStore::from_config(
            &config,
            PocketBaseAuth {
                user_id: "u1".to_string(),
                token: "t".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            store.records_url(WATCHED),
            "https://records.example/api/collections/watched/records"
        );
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let result = PocketBaseRecordStore::new(
            "http://127.0.0.1:8090",
            PocketBaseAuth {
                user_id: "u1".to_string(),
                token: "  ".to_string(),
            },
        );
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[test]
    fn test_filter_escapes_quotes() {
        assert_eq!(
            bookmark_filter("u1", "one-piece"),
            "(user='u1' && animeId='one-piece')"
        );
        assert_eq!(
            bookmark_filter("u1", "a'b"),
            "(user='u1' && animeId='a\\'b')"
        );
    }

    #[test]
    fn test_bookmark_body_fields() {
        let body = bookmark_body(
            "u1",
            &BookmarkRequest {
                anime_id: "one-piece".to_string(),
                title: "One Piece".to_string(),
                image: "cover.jpg".to_string(),
                status: BookmarkStatus::Watching,
                completed: false,
            },
        );
        assert_eq!(body["user"], "u1");
        assert_eq!(body["animeId"], "one-piece");
        assert_eq!(body["status"], "watching");
        assert_eq!(body["completed"], false);
    }

    #[test]
    fn test_expanded_bookmark_maps_to_history() {
        let json = r#"{
            "id": "b1",
            "expand": {"watchHistory": [
                {"id": "w1", "episodeId": "ep-1", "episodeNumber": 1, "current": 300, "duration": 1430}
            ]}
        }"#;
        let expanded: ExpandedBookmark = serde_json::from_str(json).unwrap();
        let history: BookmarkHistory = expanded.into();
        assert_eq!(history.watch_history.len(), 1);
        assert_eq!(history.find_episode("ep-1").unwrap().current, Some(300.0));
    }

    #[test]
    fn test_bookmark_without_expand_has_empty_history() {
        let expanded: ExpandedBookmark = serde_json::from_str(r#"{"id": "b1"}"#).unwrap();
        let history: BookmarkHistory = expanded.into();
        assert!(history.watch_history.is_empty());
    }

    #[test]
    fn test_progress_payload_uses_remote_field_names() {
        let payload = serde_json::to_value(WatchProgress {
            episode_id: "ep-1".to_string(),
            episode_number: Some(1),
            current: 12.5,
            duration: 1430.0,
        })
        .unwrap();
        assert_eq!(payload["episodeId"], "ep-1");
        assert_eq!(payload["episodeNumber"], 1);
        assert_eq!(payload["current"], 12.5);
    }

    /// Minimal PocketBase stand-in: creates `watched` rows, accepts
    /// `watched` updates and rejects every bookmark update.
    struct FakePocketBase {
        base_url: String,
        requests: Arc<parking_lot::Mutex<Vec<String>>>,
    }

    impl FakePocketBase {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(parking_lot::Mutex::new(Vec::new()));

            let log = Arc::clone(&requests);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let log = Arc::clone(&log);
                    tokio::spawn(async move {
                        let _ = serve_one(stream, log).await;
                    });
                }
            });

            Self { base_url, requests }
        }

        fn store(&self) -> PocketBaseRecordStore {
            PocketBaseRecordStore::new(
                self.base_url.as_str(),
                PocketBaseAuth {
                    user_id: "u1".to_string(),
                    token: "t".to_string(),
                },
            )
            .unwrap()
        }

        fn count(&self, request_line: &str) -> usize {
            self.requests
                .lock()
                .iter()
                .filter(|line| line.starts_with(request_line))
                .count()
        }
    }

    async fn serve_one(
        mut stream: TcpStream,
        log: Arc<parking_lot::Mutex<Vec<String>>>,
    ) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let request_line = head.lines().next().unwrap_or_default().to_string();
        let (status, body) = {
            let mut requests = log.lock();
            requests.push(request_line.clone());
            let created = requests
                .iter()
                .filter(|line| line.starts_with("POST /api/collections/watched/records"))
                .count();

            if request_line.starts_with("POST /api/collections/watched/records") {
                ("200 OK", format!(r#"{{"id":"w{}"}}"#, created))
            } else if request_line.starts_with("PATCH /api/collections/watched/records/") {
                let id = request_line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|path| path.rsplit('/').next())
                    .unwrap_or_default();
                ("200 OK", format!(r#"{{"id":"{}"}}"#, id))
            } else {
                ("500 Internal Server Error", "{}".to_string())
            }
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }

    fn progress(current: f64) -> WatchProgress {
        WatchProgress {
            episode_id: "ep-1".to_string(),
            episode_number: Some(1),
            current,
            duration: 1430.0,
        }
    }

    #[tokio::test]
    async fn test_created_row_is_returned_when_linking_fails() {
        let server = FakePocketBase::start().await;
        let store = server.store();
        let bookmark = BookmarkId::new("b1");

        let created = store
            .upsert_watch_progress(&bookmark, None, &progress(12.0))
            .await
            .unwrap();
        assert_eq!(created, RecordId::new("w1"));
        assert_eq!(
            server.count("PATCH /api/collections/bookmarks/records/b1"),
            1
        );

        // The next write updates that row instead of creating another
        let updated = store
            .upsert_watch_progress(&bookmark, Some(created), &progress(24.0))
            .await
            .unwrap();
        assert_eq!(updated, RecordId::new("w1"));
        assert_eq!(server.count("POST /api/collections/watched/records"), 1);
        assert_eq!(
            server.count("PATCH /api/collections/watched/records/w1"),
            1
        );
    }

    #[tokio::test]
    async fn test_rejected_request_maps_to_remote_store_error() {
        let server = FakePocketBase::start().await;
        let store = server.store();

        let result = store
            .get_bookmark_with_history(&BookmarkId::new("b1"))
            .await;
        assert!(matches!(
            result,
            Err(AppError::RemoteStore { status: 500, .. })
        ));
    }
}

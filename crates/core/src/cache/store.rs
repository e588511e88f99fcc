//! Operations on a single named cache store.
//!
//! Entries are keyed by [`Request::cache_key`]; writing a request that is
//! already present replaces its response.

use super::connection::CacheDb;
use crate::message::{Request, Response, ResponseType};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Columns selected whenever an entry is read back as a response.
pub(crate) const RESPONSE_COLUMNS: &str = "response_url, status, status_text, response_type, headers_json, body";

/// A response row as stored, before decoding.
pub(crate) struct StoredResponse {
    url: String,
    status: u16,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
}

impl StoredResponse {
    /// Read the [`RESPONSE_COLUMNS`] starting at column 0.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            status: row.get(1)?,
            status_text: row.get(2)?,
            response_type: row.get(3)?,
            headers_json: row.get(4)?,
            body: row.get(5)?,
        })
    }

    pub(crate) fn into_response(self) -> Result<Response, Error> {
        let url = Url::parse(&self.url).map_err(|e| Error::CorruptEntry(format!("{}: {e}", self.url)))?;
        let response_type = ResponseType::parse(&self.response_type)
            .ok_or_else(|| Error::CorruptEntry(format!("unknown response type {}", self.response_type)))?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;

        Ok(Response {
            url,
            status: self.status,
            status_text: self.status_text,
            headers,
            body: self.body,
            response_type,
        })
    }
}

/// Handle to one named store inside a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

impl CacheStore {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response under its request, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for non-GET requests.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_all(vec![(request.clone(), response.clone())]).await
    }

    /// Store several entries in one transaction; either all are written or none.
    pub async fn put_all(&self, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        let mut rows = Vec::with_capacity(entries.len());
        for (request, response) in &entries {
            if !request.is_get() {
                return Err(Error::InvalidInput(format!("only GET requests can be cached, got {request}")));
            }
            rows.push((
                request.cache_key(self.db.vary_headers()),
                request.method.clone(),
                request.url.to_string(),
                serde_json::to_string(&request.headers)?,
                serde_json::to_string(&response.headers)?,
            ));
        }

        let store = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![store, stored_at],
                )?;
                for ((key, method, url, request_headers, response_headers), (_, response)) in rows.iter().zip(&entries)
                {
                    tx.execute(
                        "INSERT INTO cache_entries (
                        store, key_hash, method, url, request_headers_json,
                        response_url, status, status_text, response_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ON CONFLICT(store, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        request_headers_json = excluded.request_headers_json,
                        response_url = excluded.response_url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        response_type = excluded.response_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                        params![
                            &store,
                            key,
                            method,
                            url,
                            request_headers,
                            response.url.as_str(),
                            response.status,
                            &response.status_text,
                            response.response_type.as_str(),
                            response_headers,
                            &response.body,
                            &stored_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for a request.
    ///
    /// Returns None on a miss; non-GET requests always miss.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.cache_key(self.db.vary_headers());
        let store = self.name.clone();
        let stored = self
            .db
            .conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RESPONSE_COLUMNS} FROM cache_entries WHERE store = ?1 AND key_hash = ?2"
                ))?;

                let result = stmt.query_row(params![store, key], StoredResponse::from_row);

                match result {
                    Ok(s) => Ok(Some(s)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        stored.map(StoredResponse::into_response).transpose()
    }

    /// Remove the entry for a request. Returns whether one existed.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let key = request.cache_key(self.db.vary_headers());
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                    params![store, key],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Requests currently stored, oldest first.
    pub async fn keys(&self) -> Result<Vec<Request>, Error> {
        let store = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, request_headers_json FROM cache_entries
                     WHERE store = ?1 ORDER BY rowid",
                )?;
                let rows = stmt
                    .query_map(params![store], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url, headers_json)| -> Result<Request, Error> {
                let url = Url::parse(&url).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                let headers = serde_json::from_str(&headers_json)?;
                Ok(Request { method, url, headers })
            })
            .collect()
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<usize, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("http://127.0.0.1:5000").unwrap().join(path).unwrap())
    }

    fn page(path: &str, body: &str) -> Response {
        let url = Url::parse("http://127.0.0.1:5000").unwrap().join(path).unwrap();
        Response::new(url, 200)
            .with_status_text("OK")
            .with_header("content-type", "text/html")
            .with_body(body)
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let response = page("/", "<h1>home</h1>");

        store.put(&request("/"), &response).await.unwrap();

        let hit = store.match_request(&request("/")).await.unwrap().unwrap();
        assert_eq!(hit, response);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        assert!(store.match_request(&request("/nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();

        store.put(&request("/"), &page("/", "old")).await.unwrap();
        store.put(&request("/"), &page("/", "new")).await.unwrap();

        let hit = store.match_request(&request("/")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "new");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let post = Request::new("POST", request("/add").url);

        let result = store.put(&post, &page("/add", "ok")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let entries = vec![
            (request("/"), page("/", "home")),
            (Request::new("POST", request("/login").url), page("/login", "login")),
        ];

        assert!(store.put_all(entries).await.is_err());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        store
            .put_all(vec![
                (request("/"), page("/", "home")),
                (request("/offline.html"), page("/offline.html", "offline")),
            ])
            .await
            .unwrap();

        let keys = store.keys().await.unwrap();
        let paths: Vec<&str> = keys.iter().map(|r| r.url.path()).collect();
        assert_eq!(paths, ["/", "/offline.html"]);

        assert!(store.delete(&request("/")).await.unwrap());
        assert!(!store.delete(&request("/")).await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_vary_headers_partition_entries() {
        let db = CacheDb::open_in_memory()
            .await
            .unwrap()
            .with_vary_headers(vec!["accept".into()]);
        let store = db.open_store("v1").await.unwrap();
        let html = request("/").with_header("accept", "text/html");
        let json = request("/").with_header("accept", "application/json");

        store.put(&html, &page("/", "html")).await.unwrap();

        assert!(store.match_request(&html).await.unwrap().is_some());
        assert!(store.match_request(&json).await.unwrap().is_none());
    }
}

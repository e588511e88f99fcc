//! cache_list tool implementation.
//!
//! Lists every cache store with the requests stored in it.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::{CacheDb, Error};

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Only list this store.
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreListing {
    /// Store name (version tag).
    pub name: String,
    /// Stored request URLs, oldest first.
    pub urls: Vec<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub stores: Vec<StoreListing>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let names = match params.store {
        Some(name) if !cache.has_store(&name).await? => {
            return Err(Error::InvalidInput(format!("no cache store named {name}")).into());
        }
        Some(name) => vec![name],
        None => cache.store_names().await?,
    };

    let mut stores = Vec::with_capacity(names.len());
    for name in names {
        let store = cache.open_store(&name).await?;
        let urls = store.keys().await?.into_iter().map(|r| r.url.to_string()).collect();
        stores.push(StoreListing { name, urls });
    }

    let output = CacheListOutput { stores };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_core::{Request, Response};
    use url::Url;

    fn text(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_list_impl_empty() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let result = list_impl(&cache, CacheListParams::default()).await.unwrap();
        let output: CacheListOutput = serde_json::from_str(&text(&result)).unwrap();
        assert!(output.stores.is_empty());
    }

    #[tokio::test]
    async fn test_list_impl_stores_and_urls() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let url = Url::parse("http://127.0.0.1:5000/offline.html").unwrap();
        let store = cache.open_store("site-v2").await.unwrap();
        store
            .put(&Request::get(url.clone()), &Response::new(url, 200).with_body("offline"))
            .await
            .unwrap();
        cache.open_store("site-v1").await.unwrap();

        let result = list_impl(&cache, CacheListParams::default()).await.unwrap();
        let output: CacheListOutput = serde_json::from_str(&text(&result)).unwrap();

        assert_eq!(output.stores.len(), 2);
        assert_eq!(output.stores[0].name, "site-v2");
        assert_eq!(output.stores[0].urls, ["http://127.0.0.1:5000/offline.html"]);
        assert!(output.stores[1].urls.is_empty());
    }

    #[tokio::test]
    async fn test_list_impl_unknown_store() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CacheListParams { store: Some("site-v9".into()) };
        assert!(list_impl(&cache, params).await.is_err());
    }
}

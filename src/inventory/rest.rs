// SPDX-License-Identifier: GPL-3.0-only

//! Managed backend over HTTP
//!
//! Talks to a Supabase-compatible project: PostgREST under `/rest/v1` for
//! the `boxes` and `items` tables, the storage API under `/storage/v1` for
//! photos. Every request carries the anon key both as `apikey` and as the
//! bearer token.

use super::models::{BoxUpdate, Item, ItemRow, NewBox, StorageBox};
use super::{InventoryBackend, PhotoStore, StoreResult};
use crate::config::BackendSettings;
use crate::constants;
use crate::errors::StoreError;
use crate::pipelines::photo::CompressedImage;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// HTTP client for the managed backend
#[derive(Clone)]
pub struct RestBackend {
    http: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

#[derive(Deserialize)]
struct PhotoPathRow {
    photo_path: Option<String>,
}

impl RestBackend {
    /// Build a client from settings; fails if URL or key is missing
    pub fn new(settings: &BackendSettings) -> StoreResult<Self> {
        let (Some(url), Some(key)) = (settings.url.as_deref(), settings.anon_key.as_deref()) else {
            return Err(StoreError::Http(
                "backend URL and anon key must both be set".to_string(),
            ));
        };
        if !settings.is_configured() {
            return Err(StoreError::Http(
                "backend URL and anon key must not be blank".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(constants::backend::REQUEST_TIMEOUT)
            .connect_timeout(constants::backend::CONNECT_TIMEOUT)
            .build()?;

        info!(url, bucket = %settings.photo_bucket, "Using managed backend");

        Ok(Self {
            http,
            base_url: url.trim().trim_end_matches('/').to_string(),
            anon_key: key.trim().to_string(),
            bucket: settings.photo_bucket.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Turn error statuses into `StoreError`, keeping the response body as message
    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::CONFLICT => StoreError::Conflict(message),
            _ => StoreError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = self.authorized(request).send().await?;
        Self::check(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    /// Insert one row and return it
    async fn insert_returning<B, T>(&self, table: &str, body: &B) -> StoreResult<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self
            .send_json(
                self.http
                    .post(self.table_url(table))
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse(format!("insert into {} returned no row", table)))
    }
}

impl InventoryBackend for RestBackend {
    async fn fetch_boxes(&self) -> StoreResult<Vec<StorageBox>> {
        let boxes: Vec<StorageBox> = self
            .send_json(
                self.http
                    .get(self.table_url(constants::backend::BOXES_TABLE))
                    .query(&[("select", "*,items(*)"), ("order", "created_at.desc")]),
            )
            .await?;
        debug!(count = boxes.len(), "Fetched boxes");
        Ok(boxes)
    }

    async fn insert_box(&self, new_box: &NewBox) -> StoreResult<StorageBox> {
        self.insert_returning(constants::backend::BOXES_TABLE, new_box)
            .await
    }

    async fn update_box(&self, box_id: &str, update: &BoxUpdate) -> StoreResult<()> {
        self.send(
            self.http
                .patch(self.table_url(constants::backend::BOXES_TABLE))
                .query(&[("id", format!("eq.{}", box_id))])
                .json(update),
        )
        .await?;
        Ok(())
    }

    async fn delete_box(&self, box_id: &str) -> StoreResult<()> {
        self.send(
            self.http
                .delete(self.table_url(constants::backend::BOXES_TABLE))
                .query(&[("id", format!("eq.{}", box_id))]),
        )
        .await?;
        Ok(())
    }

    async fn item_photo_paths(&self, box_id: &str) -> StoreResult<Vec<String>> {
        let rows: Vec<PhotoPathRow> = self
            .send_json(
                self.http
                    .get(self.table_url(constants::backend::ITEMS_TABLE))
                    .query(&[
                        ("select", "photo_path".to_string()),
                        ("box_id", format!("eq.{}", box_id)),
                    ]),
            )
            .await?;
        Ok(rows.into_iter().filter_map(|r| r.photo_path).collect())
    }

    async fn delete_items_in_box(&self, box_id: &str) -> StoreResult<()> {
        self.send(
            self.http
                .delete(self.table_url(constants::backend::ITEMS_TABLE))
                .query(&[("box_id", format!("eq.{}", box_id))]),
        )
        .await?;
        Ok(())
    }

    async fn insert_item(&self, row: &ItemRow) -> StoreResult<Item> {
        self.insert_returning(constants::backend::ITEMS_TABLE, row)
            .await
    }

    async fn item_photo_path(&self, item_id: &str) -> StoreResult<Option<String>> {
        let rows: Vec<PhotoPathRow> = self
            .send_json(
                self.http
                    .get(self.table_url(constants::backend::ITEMS_TABLE))
                    .query(&[
                        ("select", "photo_path".to_string()),
                        ("id", format!("eq.{}", item_id)),
                    ]),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.photo_path),
            None => Err(StoreError::NotFound(format!("item {}", item_id))),
        }
    }

    async fn delete_item(&self, item_id: &str) -> StoreResult<()> {
        self.send(
            self.http
                .delete(self.table_url(constants::backend::ITEMS_TABLE))
                .query(&[("id", format!("eq.{}", item_id))]),
        )
        .await?;
        Ok(())
    }
}

impl PhotoStore for RestBackend {
    async fn upload(&self, path: &str, image: &CompressedImage) -> StoreResult<String> {
        self.send(
            self.http
                .post(self.object_url(path))
                .header(CONTENT_TYPE, image.mime_type.as_str())
                .header("x-upsert", "false")
                .body(image.data.clone()),
        )
        .await?;
        debug!(path, size = image.data.len(), "Uploaded photo");
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    async fn remove(&self, paths: &[String]) -> StoreResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.send(
            self.http
                .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
                .json(&serde_json::json!({ "prefixes": paths })),
        )
        .await?;
        debug!(count = paths.len(), "Removed photos");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BackendSettings {
        BackendSettings {
            url: Some("https://xyz.supabase.co/".to_string()),
            anon_key: Some("anon".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_urls() {
        let backend = RestBackend::new(&settings()).unwrap();
        assert_eq!(backend.table_url("boxes"), "https://xyz.supabase.co/rest/v1/boxes");
        assert_eq!(
            backend.object_url("b1/1.jpg"),
            "https://xyz.supabase.co/storage/v1/object/item-photos/b1/1.jpg"
        );
        assert_eq!(
            backend.public_url("b1/1.jpg"),
            "https://xyz.supabase.co/storage/v1/object/public/item-photos/b1/1.jpg"
        );
    }

    #[test]
    fn test_requires_url_and_key() {
        let mut missing = settings();
        missing.anon_key = None;
        assert!(RestBackend::new(&missing).is_err());

        let mut blank = settings();
        blank.url = Some(" ".to_string());
        assert!(RestBackend::new(&blank).is_err());
    }
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary upload
//! directory, and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;

use ba_core::config::Config;
use ba_db::pool::{init_memory_pool, DbPool};
use ba_server::context::AppContext;
use ba_server::router::build_router;
use tempfile::TempDir;

/// API key configured on every harness unless a test overrides it.
pub const API_KEY: &str = "test-api-key";

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a throwaway upload directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    upload_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with auth enabled under [`API_KEY`].
    pub fn new() -> Self {
        Self::with_config(Self::default_config())
    }

    /// Default harness configuration.
    pub fn default_config() -> Config {
        let mut config = Config::default();
        config.auth.enabled = true;
        config.auth.api_key = Some(API_KEY.to_string());
        config
    }

    /// Create a harness from `config`. The upload directory is always
    /// replaced with a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let upload_dir = tempfile::tempdir().expect("failed to create upload dir");
        config.uploads.dir = upload_dir.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());

        Self {
            ctx,
            db,
            upload_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Self::default_config()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> ba_db::pool::PooledConnection {
        ba_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        self.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .expect("count query failed")
    }

    /// Directory uploads are written to.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.path().to_path_buf()
    }

    /// Sorted names of the files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .expect("failed to read upload dir")
            .map(|entry| {
                entry
                    .expect("bad dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

/// A client that sends the harness API key on every request.
pub fn client() -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {API_KEY}").parse().unwrap(),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap()
}

/// Create a banner over HTTP and return its id.
pub async fn create_banner(addr: SocketAddr) -> i64 {
    let resp = client()
        .post(format!("http://{addr}/banners"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"].as_i64().expect("banner id")
}

/// POST `bytes` as the `SelectedFile` field with the given MIME type.
pub async fn upload(
    addr: SocketAddr,
    banner_id: i64,
    bytes: Vec<u8>,
    mime: &str,
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name("upload")
        .mime_str(mime)
        .unwrap();
    let form = reqwest::multipart::Form::new().part("SelectedFile", part);
    client()
        .post(format!("http://{addr}/banners/{banner_id}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

/// Fetch the banner listing as JSON.
pub async fn list(addr: SocketAddr) -> Vec<serde_json::Value> {
    let resp = client()
        .get(format!("http://{addr}/banners"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

/// Encode an RGB test image of the given size.
pub fn image_bytes(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("failed to encode test image");
    buf.into_inner()
}

/// A PNG that compresses poorly, for size-limit tests.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [a, b, c, _] = state.to_le_bytes();
        image::Rgb([a, b, c])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("failed to encode test image");
    buf.into_inner()
}

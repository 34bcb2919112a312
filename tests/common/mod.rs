#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imagely_api::{
    config::{Config, DatabaseConfig, JwtConfig, MediaConfig, ServerConfig},
    entities::{users, RoleEnum},
    services::{
        database::{ensure_schema, DatabaseConnection},
        gallery::NewGallery,
        thumbnail::TeaserStorage,
    },
    AppState,
};
use sea_orm::{ActiveModelTrait, Database, Set};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret";

pub struct TestEnv {
    pub dir: TempDir,
    pub db: DatabaseConnection,
    pub storage: TeaserStorage,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("imagely.db").display());
        let db = Database::connect(url).await.unwrap();
        ensure_schema(&db).await.unwrap();

        let storage = TeaserStorage::new(dir.path().join("htdocs"));
        Self {
            dir,
            db: Arc::new(db),
            storage,
        }
    }

    pub fn media_root(&self) -> PathBuf {
        self.dir.path().join("htdocs")
    }

    pub fn user_media_dir(&self, user_id: i32) -> PathBuf {
        self.media_root()
            .join("data/media/gallery")
            .join(user_id.to_string())
    }

    pub fn config(&self) -> Config {
        Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                min_connections: 1,
                max_connections: 1,
                connect_timeout: 1,
                acquire_timeout: 1,
                idle_timeout: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
                expiration: 3600,
            },
            media: MediaConfig {
                root: self.media_root(),
                ..MediaConfig::default()
            },
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::with_connection(self.db.clone(), self.config())
    }

    pub async fn add_user(&self, id: i32, role: RoleEnum) {
        users::ActiveModel {
            id: Set(id),
            username: Set(format!("user{id}")),
            role: Set(role),
            is_active: Set(true),
        }
        .insert(self.db.as_ref())
        .await
        .unwrap();
    }
}

pub fn encode_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 200])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn new_gallery(author: i32, name: &str, creation_date: i64, image: Vec<u8>) -> NewGallery {
    NewGallery {
        author,
        status: true,
        name: name.to_string(),
        description: format!("{name} description"),
        creation_date,
        modified_date: creation_date,
        image,
    }
}

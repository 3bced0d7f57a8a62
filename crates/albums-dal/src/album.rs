use crate::{Backend, Error, error::Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// New album, as received from client
#[derive(Clone, Validate)]
pub struct CreateAlbum {
    #[garde(length(chars, min = 1, max = 255))]
    pub artist: String,
    #[garde(length(chars, min = 1, max = 255))]
    pub title: String,
    #[garde(range(min = 1))]
    pub year: i32,
    #[garde(length(min = 1))]
    pub image: Vec<u8>,
}

impl std::fmt::Debug for CreateAlbum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAlbum")
            .field("artist", &self.artist)
            .field("title", &self.title)
            .field("year", &self.year)
            .field("image_size", &self.image.len())
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Album {
    pub id: i64,
    pub artist: String,
    pub title: String,
    pub year: i32,
    /// Image data, base64 encoded in JSON
    #[serde(with = "base64_bytes")]
    pub image: Vec<u8>,
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

const INSERT: &str = "INSERT INTO Albums (artist, title, year, image) VALUES (?, ?, ?, ?)";
const INSERT_RETURNING_ID: &str =
    "INSERT INTO Albums (artist, title, year, image) VALUES (?, ?, ?, ?) RETURNING id";

pub type AlbumRepository = AlbumRepositoryImpl<crate::Pool>;

pub struct AlbumRepositoryImpl<E> {
    executor: E,
    backend: Backend,
}

impl<'c, E> AlbumRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E, backend: Backend) -> Self {
        Self { executor, backend }
    }

    /// Inserts album and returns id assigned by database
    pub async fn create(&self, payload: CreateAlbum) -> Result<i64> {
        let id = match self.backend {
            // Any driver does not report last insert id for SQLite
            Backend::Sqlite => {
                sqlx::query_scalar::<_, i64>(INSERT_RETURNING_ID)
                    .bind(payload.artist)
                    .bind(payload.title)
                    .bind(payload.year)
                    .bind(payload.image)
                    .fetch_one(&self.executor)
                    .await?
            }
            Backend::MySql => {
                let result = sqlx::query(INSERT)
                    .bind(payload.artist)
                    .bind(payload.title)
                    .bind(payload.year)
                    .bind(payload.image)
                    .execute(&self.executor)
                    .await?;
                result.last_insert_id().ok_or(Error::MissingInsertId)?
            }
        };

        debug!("Created album {id}");
        Ok(id)
    }

    /// Returns `None` if there is no album with given id
    pub async fn get(&self, id: i64) -> Result<Option<Album>> {
        let record = sqlx::query_as::<_, Album>(
            "SELECT id, artist, title, year, image FROM Albums WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Albums")
            .fetch_one(&self.executor)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(artist: &str, title: &str, year: i32, image: &[u8]) -> CreateAlbum {
        CreateAlbum {
            artist: artist.to_string(),
            title: title.to_string(),
            year,
            image: image.to_vec(),
        }
    }

    #[test]
    fn test_valid_album() {
        let new_album = album("Radiohead", "OK Computer", 1997, b"image");
        assert!(new_album.validate().is_ok());
    }

    #[test]
    fn test_invalid_album() {
        assert!(album("", "OK Computer", 1997, b"image").validate().is_err());
        assert!(album("Radiohead", "", 1997, b"image").validate().is_err());
        assert!(album("Radiohead", "OK Computer", 0, b"image").validate().is_err());
        assert!(album("Radiohead", "OK Computer", -1, b"image").validate().is_err());
        assert!(album("Radiohead", "OK Computer", 1997, b"").validate().is_err());

        let long_name = "x".repeat(256);
        assert!(album(&long_name, "OK Computer", 1997, b"image").validate().is_err());
        // limit is in characters, not bytes
        let accented = "ž".repeat(255);
        assert!(album(&accented, "OK Computer", 1997, b"image").validate().is_ok());
    }

    #[test]
    fn test_album_json() {
        let album = Album {
            id: 1,
            artist: "Radiohead".into(),
            title: "OK Computer".into(),
            year: 1997,
            image: vec![0, 1, 2, 255],
        };
        let json = serde_json::to_value(&album).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "artist": "Radiohead",
                "title": "OK Computer",
                "year": 1997,
                "image": "AAEC/w=="
            })
        );
        let decoded: Album = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, album);
    }
}

use crate::{
    error::{ApiError, ApiResult},
    repository_from_request,
    state::AppState,
};
use albums_dal::album::{AlbumRepository, CreateAlbum};
use axum::{
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Multipart, Path, Request},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use garde::Validate as _;
use http::{request::Parts, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

repository_from_request!(AlbumRepository);

/// Album id from URL path
#[derive(Debug, Clone, Copy)]
pub struct AlbumId(pub i64);

impl<S> FromRequestParts<S> for AlbumId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!("Invalid album id in path: {e}");
                ApiError::InvalidRequest("Invalid album ID".into())
            })?;
        Ok(AlbumId(id))
    }
}

#[derive(Default)]
struct AlbumForm {
    artist: Option<String>,
    title: Option<String>,
    year: Option<String>,
    image: Option<Vec<u8>>,
}

impl AlbumForm {
    /// First occurrence of a field is used, others are skipped
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = AlbumForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "artist" if form.artist.is_none() => form.artist = Some(field.text().await?),
                "title" if form.title.is_none() => form.title = Some(field.text().await?),
                "year" if form.year.is_none() => form.year = Some(field.text().await?),
                "image" if form.image.is_none() && field.file_name().is_some() => {
                    let data = field.bytes().await?;
                    debug!("Received image of {} bytes", data.len());
                    form.image = Some(data.to_vec());
                }
                _ => debug!("Skipping form field {name:?}"),
            }
        }
        Ok(form)
    }

    fn into_album(self) -> ApiResult<CreateAlbum> {
        let artist = required(self.artist, "Artist")?;
        let title = required(self.title, "Title")?;
        let year = required(self.year, "Year")?
            .parse::<i32>()
            .ok()
            .filter(|year| *year > 0)
            .ok_or_else(|| ApiError::InvalidRequest("Year must be a positive integer".into()))?;
        let image = self
            .image
            .ok_or_else(|| ApiError::InvalidRequest("Image is required".into()))?;
        if image.is_empty() {
            return Err(ApiError::InvalidRequest("Image must not be empty".into()));
        }
        Ok(CreateAlbum {
            artist,
            title,
            year,
            image,
        })
    }
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("{name} is required")))
}

/// Validated album from multipart form with fields `artist`, `title`, `year` and file `image`
pub struct AlbumUpload(pub CreateAlbum);

impl<S> FromRequest<S> for AlbumUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        let album = AlbumForm::read(multipart).await?.into_album()?;
        album.validate()?;
        Ok(AlbumUpload(album))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedAlbum {
    #[serde(rename = "AlbumID")]
    pub album_id: i64,
}

pub async fn create(
    repository: AlbumRepository,
    AlbumUpload(payload): AlbumUpload,
) -> ApiResult<impl IntoResponse> {
    debug!("Creating album {payload:?}");
    let album_id = repository.create(payload).await.map_err(|e| {
        error!("Failed to insert album: {e}");
        ApiError::InternalError("Failed to insert album".into())
    })?;

    Ok((StatusCode::CREATED, Json(CreatedAlbum { album_id })))
}

pub async fn get_album(
    AlbumId(id): AlbumId,
    repository: AlbumRepository,
) -> ApiResult<impl IntoResponse> {
    match repository.get(id).await? {
        Some(album) => Ok((StatusCode::OK, Json(album))),
        None => {
            debug!("Album {id} not found");
            Err(ApiError::NotFound("Album not found".into()))
        }
    }
}

pub fn router(limit_mb: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", get(get_album))
        .layer(DefaultBodyLimit::max(1024 * 1024 * limit_mb))
}

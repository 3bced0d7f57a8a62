use albums_app::rest_api::album::CreatedAlbum;
use albums_dal::album::Album;
use anyhow::Result;
use reqwest::{
    Response, Url,
    multipart::{Form, Part},
};
use tracing::info;

pub fn album_form(artist: &str, title: &str, year: &str, image: Vec<u8>) -> Form {
    Form::new()
        .text("artist", artist.to_string())
        .text("title", title.to_string())
        .text("year", year.to_string())
        .part("image", Part::bytes(image).file_name("cover.jpg"))
}

pub async fn post_album(client: &reqwest::Client, base_url: &Url, form: Form) -> Result<Response> {
    let api_url = base_url.join("albums")?;
    let response = client.post(api_url).multipart(form).send().await?;
    info!("Response: {:#?}", response);
    Ok(response)
}

pub async fn create_album(
    client: &reqwest::Client,
    base_url: &Url,
    artist: &str,
    title: &str,
    year: i32,
    image: Vec<u8>,
) -> Result<i64> {
    let form = album_form(artist, title, &year.to_string(), image);
    let response = post_album(client, base_url, form).await?;
    assert_eq!(response.status().as_u16(), 201);

    let created: CreatedAlbum = response.json().await?;
    Ok(created.album_id)
}

pub async fn get_album(client: &reqwest::Client, base_url: &Url, id: i64) -> Result<Album> {
    let api_url = base_url.join(&format!("albums/{id}"))?;
    let response = client.get(api_url).send().await?;
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 200);

    let album: Album = response.json().await?;
    Ok(album)
}

pub async fn error_message(response: Response) -> Result<String> {
    let body: serde_json::Value = response.json().await?;
    let message = body
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or_default()
        .to_string();
    Ok(message)
}

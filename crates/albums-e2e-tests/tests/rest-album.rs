use albums_dal::album::AlbumRepository;
use albums_e2e_tests::{
    base_url, prepare_env,
    rest::{album_form, create_album, error_message, get_album, post_album},
    spawn_server,
};
use reqwest::multipart::{Form, Part};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_create_and_get_album() {
    let (args, _config_guard) = prepare_env("test_create_and_get_album")
        .await
        .unwrap();
    let base_url = base_url(&args);
    let server = spawn_server(args).await.unwrap();
    let repository = AlbumRepository::new(
        server.state().pool().clone(),
        server.state().backend(),
    );
    let client = reqwest::Client::new();

    let image: Vec<u8> = b"not really a jpeg".to_vec();
    assert_eq!(image.len(), 17);

    let form = album_form("Radiohead", "OK Computer", "1997", image.clone());
    let response = post_album(&client, &base_url, form).await.unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"AlbumID": 1}));

    let album = get_album(&client, &base_url, 1).await.unwrap();
    info!("Album: {} - {} ({})", album.artist, album.title, album.year);
    assert_eq!(album.id, 1);
    assert_eq!(album.artist, "Radiohead");
    assert_eq!(album.title, "OK Computer");
    assert_eq!(album.year, 1997);
    assert_eq!(album.image, image);

    // binary image survives unchanged
    let image: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
    let id = create_album(&client, &base_url, "Björk", "Homogenic", 1997, image.clone())
        .await
        .unwrap();
    assert_eq!(id, 2);
    let album = get_album(&client, &base_url, id).await.unwrap();
    assert_eq!(album.artist, "Björk");
    assert_eq!(album.image, image);

    // each 201 response stands for exactly one stored album
    assert_eq!(repository.count().await.unwrap(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_album_is_not_stored() {
    let (args, _config_guard) = prepare_env("test_invalid_album").await.unwrap();
    let base_url = base_url(&args);
    let server = spawn_server(args).await.unwrap();
    let repository = AlbumRepository::new(
        server.state().pool().clone(),
        server.state().backend(),
    );
    let client = reqwest::Client::new();

    let cases = vec![
        (album_form("", "OK Computer", "1997", b"cover".to_vec()), "Artist is required"),
        (album_form("Radiohead", "", "1997", b"cover".to_vec()), "Title is required"),
        (album_form("Radiohead", "OK Computer", "", b"cover".to_vec()), "Year is required"),
        (
            album_form("Radiohead", "OK Computer", "0", b"cover".to_vec()),
            "Year must be a positive integer",
        ),
        (
            album_form("Radiohead", "OK Computer", "-5", b"cover".to_vec()),
            "Year must be a positive integer",
        ),
        (
            album_form("Radiohead", "OK Computer", "nineteen", b"cover".to_vec()),
            "Year must be a positive integer",
        ),
        (
            Form::new()
                .text("artist", "Radiohead")
                .text("title", "OK Computer")
                .text("year", "1997"),
            "Image is required",
        ),
    ];

    for (form, message) in cases {
        let response = post_album(&client, &base_url, form).await.unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(error_message(response).await.unwrap(), message);
    }

    assert_eq!(repository.count().await.unwrap(), 0);

    // no id was consumed by rejected requests
    let id = create_album(&client, &base_url, "Radiohead", "Kid A", 2000, b"cover".to_vec())
        .await
        .unwrap();
    assert_eq!(id, 1);
}

#[tokio::test]
#[traced_test]
async fn test_upload_limit() {
    let (args, _config_guard) = prepare_env("test_upload_limit").await.unwrap();
    let base_url = base_url(&args);
    let server = spawn_server(args).await.unwrap();
    let repository = AlbumRepository::new(
        server.state().pool().clone(),
        server.state().backend(),
    );
    let client = reqwest::Client::new();

    let image = vec![0u8; 11 * 1024 * 1024];
    let form = Form::new()
        .text("artist", "Radiohead")
        .text("title", "OK Computer")
        .text("year", "1997")
        .part("image", Part::bytes(image).file_name("huge.jpg"));
    let response = post_album(&client, &base_url, form).await;
    // server may close connection before whole body is sent
    if let Ok(response) = response {
        assert_eq!(response.status().as_u16(), 400);
    }
    assert_eq!(repository.count().await.unwrap(), 0);
}

#[tokio::test]
#[traced_test]
async fn test_get_album_errors() {
    let (args, _config_guard) = prepare_env("test_get_album_errors").await.unwrap();
    let base_url = base_url(&args);
    let _server = spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .get(base_url.join("albums/42").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(error_message(response).await.unwrap(), "Album not found");

    let response = client
        .get(base_url.join("albums/abc").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(error_message(response).await.unwrap(), "Invalid album ID");
}

#[tokio::test]
#[traced_test]
async fn test_concurrent_creates() {
    let (args, _config_guard) = prepare_env("test_concurrent_creates").await.unwrap();
    let base_url = base_url(&args);
    let _server = spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let creates = (1..=8).map(|n| {
        let client = client.clone();
        let base_url = base_url.clone();
        async move {
            let title = format!("Album {n}");
            let id = create_album(&client, &base_url, "Radiohead", &title, 1990 + n, vec![n as u8; 64])
                .await
                .unwrap();
            (id, title)
        }
    });
    let created = futures::future::join_all(creates).await;

    let mut ids: Vec<i64> = created.iter().map(|(id, _)| *id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);

    for (id, title) in created {
        let album = get_album(&client, &base_url, id).await.unwrap();
        assert_eq!(album.title, title);
    }
}

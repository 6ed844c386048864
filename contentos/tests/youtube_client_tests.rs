//! YouTube client against a mock server

use contentos::services::{YouTubeClient, YouTubeError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::with_base_urls("tok".to_string(), &server.uri(), &server.uri()).unwrap()
}

fn playlist_page(ids: &[&str], next: Option<&str>) -> serde_json::Value {
    let items: Vec<_> = ids
        .iter()
        .map(|id| json!({"snippet": {"resourceId": {"videoId": id}}}))
        .collect();
    match next {
        Some(token) => json!({"items": items, "nextPageToken": token}),
        None => json!({"items": items}),
    }
}

fn video(id: &str, title: &str, views: &str) -> serde_json::Value {
    json!({
        "id": id,
        "snippet": {"title": title, "publishedAt": "2025-02-01T15:00:00Z"},
        "statistics": {"viewCount": views, "likeCount": "7"}
    })
}

#[tokio::test]
async fn test_uploads_playlist_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("mine", "true"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UU123"}}}]
        })))
        .mount(&server)
        .await;

    let playlist = client(&server).uploads_playlist_id().await.unwrap();
    assert_eq!(playlist.as_deref(), Some("UU123"));
}

#[tokio::test]
async fn test_recent_videos_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_page(&["a3"], None)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "UU123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(playlist_page(&["a1", "a2"], Some("p2"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "a1,a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [video("a1", "Melting Clock", "1500"), video("a2", "Ice Cube", "20")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "a3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [video("a3", "Glass Cube", "not a number")]
        })))
        .mount(&server)
        .await;

    let videos = client(&server).recent_videos("UU123", 3).await.unwrap();
    let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "a3"]);
    assert_eq!(videos[0].views, 1500);
    assert_eq!(videos[0].likes, 7);
    assert_eq!(videos[2].views, 0);
    assert_eq!(videos[0].published_date(), "2025-02-01");
}

#[tokio::test]
async fn test_video_analytics_reads_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports"))
        .and(query_param("filters", "video==a1"))
        .and(query_param("dimensions", "video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [["a1", 1200, 600.0, 30.5, 65.2, 3, 40, 5]]
        })))
        .mount(&server)
        .await;

    let analytics = client(&server)
        .video_analytics("a1", "2025-02-01", "2025-03-01")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(analytics.views, 1200);
    assert_eq!(analytics.watch_minutes, 600.0);
    assert_eq!(analytics.avg_view_duration, 30.5);
    assert_eq!(analytics.avg_view_percentage, 65.2);
    assert_eq!(analytics.subscribers_gained, 3);
    assert_eq!(analytics.likes, 40);
    assert_eq!(analytics.comments, 5);
}

#[tokio::test]
async fn test_video_analytics_without_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "report"})))
        .mount(&server)
        .await;

    let analytics = client(&server)
        .video_analytics("a1", "2025-02-01", "2025-03-01")
        .await
        .unwrap();
    assert!(analytics.is_none());
}

#[tokio::test]
async fn test_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).uploads_playlist_id().await.unwrap_err();
    assert!(matches!(err, YouTubeError::Unauthorized));
}

#[tokio::test]
async fn test_api_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
        .mount(&server)
        .await;

    let err = client(&server).uploads_playlist_id().await.unwrap_err();
    match err {
        YouTubeError::ApiError(status, body) => {
            assert_eq!(status, 403);
            assert_eq!(body, "quotaExceeded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

//! Tests for the Tandem server client library.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real backend.

use tandem_core::{CatalogStreams, LocalStreams, RemoteKind};
use tandem_server_client::{
    SearchType, ServerClientError, ServerConfig, StreamUrls, TandemServerClient,
    DEFAULT_SERVER_URL,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> TandemServerClient {
    TandemServerClient::new(ServerConfig::new(server.uri())).unwrap()
}

fn song_json(id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "videoId": id,
        "title": title,
        "artist": "Artist",
        "thumbnail": null,
        "duration": "3:00",
        "durationSeconds": 180,
        "type": "song"
    })
}

// =============================================================================
// Server Config Tests
// =============================================================================

mod server_config {
    use super::*;

    #[test]
    fn test_default_points_at_localhost() {
        let config = ServerConfig::default();
        assert_eq!(config.url, DEFAULT_SERVER_URL);
        assert!(config.base_url().is_ok());
    }

    #[test]
    fn test_trailing_slash_removed() {
        let client = TandemServerClient::new(ServerConfig::new("http://localhost:8000/")).unwrap();
        assert_eq!(client.url(), "http://localhost:8000");
    }
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_valid_https_url() {
        let client = TandemServerClient::new(ServerConfig::new("https://example.com"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        let result = TandemServerClient::new(ServerConfig::new(""));

        match result.unwrap_err() {
            ServerClientError::InvalidUrl(msg) => assert!(msg.contains("empty")),
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }

    #[test]
    fn test_missing_scheme_rejected() {
        let result = TandemServerClient::new(ServerConfig::new("localhost:8000"));

        match result.unwrap_err() {
            ServerClientError::InvalidUrl(msg) => assert!(msg.contains("http")),
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }

    #[test]
    fn test_ftp_rejected() {
        let result = TandemServerClient::new(ServerConfig::new("ftp://example.com"));
        assert!(matches!(result, Err(ServerClientError::InvalidUrl(_))));
    }
}

// =============================================================================
// Connection Tests
// =============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn test_successful_connection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        assert!(client.test_connection().await);
        assert!(client.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_connection_to_unreachable_server() {
        let client = TandemServerClient::new(ServerConfig::new("http://127.0.0.1:9")).unwrap();

        assert!(!client.test_connection().await);
        match client.ping().await.unwrap_err() {
            ServerClientError::ServerUnreachable(_) | ServerClientError::Request(_) => {}
            e => panic!("Expected ServerUnreachable or Request error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_connection_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        assert!(!client.test_connection().await);

        match client.ping().await.unwrap_err() {
            ServerClientError::ServerError { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("Internal Server Error"));
            }
            e => panic!("Expected ServerError, got: {:?}", e),
        }
    }
}

// =============================================================================
// Catalog Tests
// =============================================================================

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_search_sends_query_and_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("q", "daft punk"))
            .and(query_param("type", "songs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [song_json("a1", "One More Time"), song_json("a2", "Aerodynamic")],
                "query": "daft punk",
                "type": "songs"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let tracks = client
            .catalog()
            .search("daft punk", SearchType::Songs)
            .await
            .unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "a1");
        assert_eq!(tracks[0].title, "One More Time");
        assert_eq!(tracks[0].duration_hint, Some(180.0));
    }

    #[tokio::test]
    async fn test_search_episodes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("type", "episodes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "videoId": "ep1",
                    "podcastId": "pod1",
                    "title": "Episode",
                    "artist": "Host",
                    "durationSeconds": 3600,
                    "type": "episode"
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let tracks = client
            .catalog()
            .search("history", SearchType::Episodes)
            .await
            .unwrap();

        assert_eq!(tracks[0].kind, RemoteKind::Episode);
        assert_eq!(tracks[0].podcast_id.as_deref(), Some("pod1"));
    }

    #[tokio::test]
    async fn test_home_feed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/home"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [song_json("h1", "Hit")]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let tracks = client.catalog().home().await.unwrap();
        assert_eq!(tracks.len(), 1);
    }

    #[tokio::test]
    async fn test_genre() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/search/genre/jazz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [song_json("j1", "So What")],
                "genre": "jazz"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let tracks = client.catalog().search_genre("jazz").await.unwrap();
        assert_eq!(tracks[0].title, "So What");
    }

    #[tokio::test]
    async fn test_podcast_details() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/podcast/pod1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "podcastId": "pod1",
                "title": "The Show",
                "author": "Host",
                "description": "Weekly",
                "thumbnail": null,
                "episodes": [song_json("e1", "Pilot")],
                "type": "podcast"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let podcast = client.catalog().podcast("pod1").await.unwrap();
        assert_eq!(podcast.title, "The Show");
        assert_eq!(podcast.episodes.len(), 1);
    }

    #[tokio::test]
    async fn test_stream_info() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/stream-info/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://cdn.example.com/a1",
                "contentType": "audio/webm",
                "duration": 212.5,
                "title": "One More Time"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let info = client.catalog().stream_info("a1").await.unwrap();
        assert_eq!(info.content_type, "audio/webm");
        assert_eq!(info.duration, 212.5);
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/home"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.catalog().home().await.unwrap_err() {
            ServerClientError::ParseError(_) => {}
            e => panic!("Expected ParseError, got: {:?}", e),
        }
    }
}

// =============================================================================
// Library Tests
// =============================================================================

mod library {
    use super::*;

    #[tokio::test]
    async fn test_playlists() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/library/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "playlists": [
                    {"playlistId": "PL1", "title": "Gym", "thumbnail": null, "trackCount": 12}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let playlists = client.library().playlists().await.unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].track_count, 12);
    }

    #[tokio::test]
    async fn test_liked_songs_sends_limit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/library/liked-songs"))
            .and(query_param("limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Liked Music",
                "trackCount": 1,
                "tracks": [song_json("l1", "Loved")]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let liked = client.library().liked_songs(25).await.unwrap();
        assert_eq!(liked.tracks.len(), 1);
    }

    #[tokio::test]
    async fn test_playlist_detail() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/library/playlist/PL1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "playlistId": "PL1",
                "title": "Gym",
                "description": "",
                "trackCount": 2,
                "thumbnail": null,
                "tracks": [song_json("g1", "Lift"), song_json("g2", "Run")]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let detail = client.library().playlist("PL1").await.unwrap();
        assert_eq!(detail.tracks.len(), 2);
    }

    #[tokio::test]
    async fn test_unauthenticated_library_is_auth_required() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/library/playlists"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Not authenticated"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let result = client.library().playlists().await;
        assert!(matches!(result, Err(ServerClientError::AuthRequired)));
    }
}

// =============================================================================
// Podcast Tests
// =============================================================================

mod podcasts {
    use super::*;

    #[tokio::test]
    async fn test_library_podcasts_and_channels() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/podcasts/library"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "podcasts": [
                    {"podcastId": "p1", "title": "Show", "author": "Host", "thumbnail": null, "type": "podcast"}
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/podcasts/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "channels": [
                    {"channelId": "c1", "title": "Channel", "thumbnail": null, "type": "channel"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let podcasts = client.podcasts().library_podcasts(100).await.unwrap();
        let channels = client.podcasts().library_channels(100).await.unwrap();

        assert_eq!(podcasts[0].podcast_id, "p1");
        assert_eq!(channels[0].channel_id, "c1");
    }

    #[tokio::test]
    async fn test_channel_episodes_paging() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/podcasts/channel/c1/episodes"))
            .and(query_param("continuation", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "episodes": [song_json("e9", "Later")],
                "continuation": null,
                "hasMore": false
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/podcasts/channel/c1/episodes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "episodes": [song_json("e1", "First")],
                "continuation": "page2",
                "hasMore": true
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let first = client
            .podcasts()
            .channel_episodes("c1", None)
            .await
            .unwrap();
        assert!(first.has_more);
        assert_eq!(first.continuation.as_deref(), Some("page2"));

        let second = client
            .podcasts()
            .channel_episodes("c1", first.continuation.as_deref())
            .await
            .unwrap();
        assert!(!second.has_more);
        assert_eq!(second.episodes[0].video_id, "e9");
    }

    #[tokio::test]
    async fn test_channel_info() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/podcasts/channel/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "channelId": "c1",
                "title": "Channel",
                "description": "About",
                "thumbnail": null,
                "episodeCount": 40
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let info = client.podcasts().channel("c1").await.unwrap();
        assert_eq!(info.episode_count, 40);
    }
}

// =============================================================================
// Local File Tests
// =============================================================================

mod local_files {
    use super::*;

    #[tokio::test]
    async fn test_collections() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/local/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "playlists": [{
                    "name": "Road_Trip",
                    "folder": "/music/Road_Trip",
                    "trackCount": 2,
                    "totalSize": 2048,
                    "totalSizeFormatted": "2 KB"
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let collections = client.local().collections().await.unwrap();
        assert_eq!(collections[0].name, "Road_Trip");
        assert_eq!(collections[0].track_count, 2);
    }

    #[tokio::test]
    async fn test_collection_tracks_are_stamped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/local/playlist/Road_Trip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Road_Trip",
                "folder": "/music/Road_Trip",
                "tracks": [
                    {"filename": "01.mp3", "title": "Intro", "size": 1024, "sizeFormatted": "1 KB",
                     "path": "/music/Road_Trip/01.mp3", "extension": ".mp3"},
                    {"filename": "02.flac", "title": "Drive", "size": 1024, "sizeFormatted": "1 KB",
                     "path": "/music/Road_Trip/02.flac", "extension": ".flac"}
                ],
                "trackCount": 2,
                "totalSize": 2048,
                "totalSizeFormatted": "2 KB"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let tracks = client
            .local()
            .collection("Road_Trip")
            .await
            .unwrap()
            .into_tracks();

        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.is_in("Road_Trip")));
        assert_eq!(tracks[1].extension.as_deref(), Some("flac"));
    }

    #[tokio::test]
    async fn test_missing_collection_is_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/local/playlist/Nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Playlist not found"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.local().collection("Nope").await.unwrap_err() {
            ServerClientError::ServerError { status, .. } => assert_eq!(status, 404),
            e => panic!("Expected ServerError, got: {:?}", e),
        }
    }
}

// =============================================================================
// Auth Tests
// =============================================================================

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_auth_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "authenticated": false,
                "message": "No session"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let status = client.auth().status().await.unwrap();
        assert!(!status.authenticated);
        assert_eq!(status.message, "No session");
    }
}

// =============================================================================
// Stream URL Tests
// =============================================================================

mod stream_urls {
    use super::*;

    #[tokio::test]
    async fn test_client_stream_urls_match_server() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        let urls = client.stream_urls();

        assert_eq!(
            CatalogStreams::stream_url(&urls, "a1").unwrap(),
            format!("{}/api/stream/a1", mock_server.uri())
        );
        assert_eq!(
            LocalStreams::stream_url(&urls, "Road Trip", "01.mp3").unwrap(),
            format!("{}/api/local/stream/Road%20Trip/01.mp3", mock_server.uri())
        );
    }

    #[test]
    fn test_stream_urls_reject_invalid_config() {
        assert!(StreamUrls::new(&ServerConfig::new("not a url")).is_err());
    }
}

// =============================================================================
// Error Tests
// =============================================================================

mod errors {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServerClientError::AuthRequired;
        assert_eq!(format!("{}", error), "Authentication required");

        let error = ServerClientError::ServerError {
            status: 500,
            message: "Internal error".to_string(),
        };
        assert!(format!("{}", error).contains("500"));
        assert!(format!("{}", error).contains("Internal error"));

        let error = ServerClientError::InvalidUrl("bad url".to_string());
        assert!(format!("{}", error).contains("bad url"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerClientError>();
    }
}

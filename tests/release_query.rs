mod common;

#[cfg(test)]
mod tests {
    use super::common::{app_context, config_for, RELEASES_PATH};
    use bunnypad_updater::libs::{error::UpdateError, release::ReleaseQuery, version::VersionPolicy};
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn single_stable_release() -> serde_json::Value {
        json!([{
            "tag_name": "v2.0",
            "prerelease": false,
            "assets": [{ "browser_download_url": "http://x/a.bin", "name": "a.bin" }]
        }])
    }

    async fn serve(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn query(server: &MockServer, version: &str) -> ReleaseQuery {
        let config = config_for(&server.uri());
        ReleaseQuery::new(&config, &app_context(version, PathBuf::from("update.log"))).unwrap()
    }

    #[tokio::test]
    async fn test_older_build_gets_the_update() {
        let server = serve(single_stable_release()).await;

        let release = query(&server, "v1.0").check_for_update(false).await.unwrap().unwrap();

        assert_eq!(release.version_tag, "v2.0");
        assert_eq!(release.download_url, "http://x/a.bin");
        assert_eq!(release.asset_name, "a.bin");
        assert!(!release.prerelease);
    }

    #[tokio::test]
    async fn test_same_tag_is_not_an_update() {
        let server = serve(single_stable_release()).await;
        assert_eq!(query(&server, "v2.0").check_for_update(false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prerelease_request_ignores_stable_releases() {
        let server = serve(single_stable_release()).await;
        assert_eq!(query(&server, "v1.0").check_for_update(true).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_channels_pick_their_newest_release() {
        let server = serve(json!([
            { "tag_name": "v11.1", "prerelease": false, "published_at": "2024-01-10T00:00:00Z",
              "html_url": "https://example.com/v11.1",
              "assets": [{ "browser_download_url": "http://x/stable-old.bin", "name": "stable-old.bin" }] },
            { "tag_name": "cp-2", "prerelease": true, "published_at": "2024-03-01T00:00:00Z",
              "assets": [{ "browser_download_url": "http://x/cp2.bin", "name": "cp2.bin" }] },
            { "tag_name": "v11.2", "prerelease": false, "published_at": "2024-02-10T00:00:00Z",
              "html_url": "https://example.com/v11.2",
              "assets": [{ "browser_download_url": "http://x/stable-new.bin", "name": "stable-new.bin", "size": 42 }] },
            { "tag_name": "cp-1", "prerelease": true, "published_at": "2024-01-01T00:00:00Z",
              "assets": [{ "browser_download_url": "http://x/cp1.bin", "name": "cp1.bin" }] }
        ]))
        .await;
        let query = query(&server, "v11.0.27000.0809");

        let stable = query.latest(false).await.unwrap().unwrap();
        assert_eq!(stable.version_tag, "v11.2");
        assert_eq!(stable.page_url, "https://example.com/v11.2");
        assert_eq!(stable.size, Some(42));

        let carrotpatch = query.latest(true).await.unwrap().unwrap();
        assert_eq!(carrotpatch.version_tag, "cp-2");
        assert!(carrotpatch.prerelease);
    }

    #[tokio::test]
    async fn test_newer_only_policy_skips_downgrades() {
        let server = serve(single_stable_release()).await;
        let mut config = config_for(&server.uri());
        config.version_policy = VersionPolicy::NewerOnly;

        let query = ReleaseQuery::new(&config, &app_context("v3.0", PathBuf::from("update.log"))).unwrap();
        assert_eq!(query.check_for_update(false).await.unwrap(), None);

        let query = ReleaseQuery::new(&config, &app_context("v1.0", PathBuf::from("update.log"))).unwrap();
        assert!(query.check_for_update(false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_error_status_is_a_query_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = query(&server, "v1.0").check_for_update(false).await.unwrap_err();
        assert!(matches!(err, UpdateError::QueryStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_query_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"message\": \"not an array\"}"))
            .mount(&server)
            .await;

        let err = query(&server, "v1.0").fetch_releases().await.unwrap_err();
        assert!(matches!(err, UpdateError::Query(_)));
    }

    #[tokio::test]
    async fn test_releases_without_assets_are_not_offered() {
        let server = serve(json!([{ "tag_name": "v2.0", "prerelease": false, "assets": [] }])).await;
        assert_eq!(query(&server, "v1.0").check_for_update(false).await.unwrap(), None);
    }
}

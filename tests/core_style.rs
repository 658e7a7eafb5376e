mod common;

#[cfg(test)]
mod tests {
    use crate::common::*;
    use mockito::Matcher;
    use mybb_bridge::{list_themes, AppError, CacheRefreshClient, StyleStore, StylesheetSaveAction};

    const OK_BODY: &str = r#"{"success": true, "message": "Successfully cached stylesheet"}"#;

    #[tokio::test]
    async fn test_save_new_stylesheet_refreshes_once() {
        let db = create_test_db().await;
        insert_theme(&db, 7, "Hoshin Budo v2").await;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cachecss.php")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("theme_name".into(), "Hoshin Budo v2".into()),
                Matcher::UrlEncoded("stylesheet".into(), "custom.css".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .expect(1)
            .create_async()
            .await;

        let refresher = CacheRefreshClient::new(Some(&server.url()), None).unwrap();
        let store = StyleStore::new(&db, "Hoshin Budo v2");
        let action = store
            .save_stylesheet("custom.css", "body { color: red; }", &refresher)
            .await
            .unwrap();

        assert_eq!(action, StylesheetSaveAction::Created);
        mock.assert_async().await;

        let stylesheets = store.fetch_stylesheets().await.unwrap();
        assert_eq!(stylesheets.len(), 1);
        assert_eq!(stylesheets[0].tid, 7);
        assert_eq!(stylesheets[0].stylesheet, "body { color: red; }");
        assert_eq!(stylesheets[0].cachefile, "custom.css");
        assert!(stylesheets[0].lastmodified > 0);
    }

    #[tokio::test]
    async fn test_save_existing_stylesheet_updates_in_place() {
        let db = create_test_db().await;
        insert_theme(&db, 1, "Default").await;
        insert_theme(&db, 2, "Dark").await;
        insert_stylesheet(&db, 1, "global.css", "old").await;
        insert_stylesheet(&db, 2, "global.css", "dark").await;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cachecss.php")
            .with_status(200)
            .with_body(OK_BODY)
            .expect(1)
            .create_async()
            .await;

        let refresher = CacheRefreshClient::new(Some(&server.url()), None).unwrap();
        let store = StyleStore::new(&db, "Default");
        let action = store
            .save_stylesheet("global.css", "new", &refresher)
            .await
            .unwrap();

        assert_eq!(action, StylesheetSaveAction::Updated);
        mock.assert_async().await;
        assert_eq!(count_stylesheets(&db).await, 2);

        let default = store.fetch_stylesheets().await.unwrap();
        assert_eq!(default[0].stylesheet, "new");
        let dark = StyleStore::new(&db, "Dark").fetch_stylesheets().await.unwrap();
        assert_eq!(dark[0].stylesheet, "dark");
    }

    #[tokio::test]
    async fn test_missing_theme_writes_nothing_and_skips_refresh() {
        let db = create_test_db().await;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cachecss.php")
            .with_status(200)
            .with_body(OK_BODY)
            .expect(0)
            .create_async()
            .await;

        let refresher = CacheRefreshClient::new(Some(&server.url()), None).unwrap();
        let store = StyleStore::new(&db, "Ghost");
        let result = store.save_stylesheet("global.css", "x", &refresher).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(count_stylesheets(&db).await, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_is_reported_after_write() {
        let db = create_test_db().await;
        insert_theme(&db, 1, "Default").await;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/cachecss.php")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "Stylesheet not found: extra.css"}"#)
            .create_async()
            .await;

        let refresher = CacheRefreshClient::new(Some(&server.url()), None).unwrap();
        let store = StyleStore::new(&db, "Default");
        let result = store.save_stylesheet("extra.css", "a {}", &refresher).await;

        match result {
            Err(AppError::RefreshError(message)) => {
                assert_eq!(message, "Stylesheet not found: extra.css")
            }
            other => panic!("expected a refresh error, got {:?}", other),
        }
        assert_eq!(count_stylesheets(&db).await, 1);
    }

    #[tokio::test]
    async fn test_fetch_missing_theme_is_not_found() {
        let db = create_test_db().await;
        let result = StyleStore::new(&db, "Ghost").fetch_stylesheets().await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_themes() {
        let db = create_test_db().await;
        insert_theme(&db, 2, "Dark").await;
        insert_theme(&db, 1, "Default").await;

        let names: Vec<String> = list_themes(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Dark".to_string(), "Default".to_string()]);
    }
}

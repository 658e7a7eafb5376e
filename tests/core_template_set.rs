mod common;

#[cfg(test)]
mod tests {
    use crate::common::*;
    use mybb_bridge::{
        list_template_sets, AppError, GroupTable, TemplateSaveAction, TemplateSetStore, MASTER_SID,
    };

    #[tokio::test]
    async fn test_fetch_templates_includes_masters_and_set() {
        let db = create_test_db().await;
        insert_template_set(&db, 1, "Default Templates").await;
        insert_template_set(&db, 2, "Other Templates").await;
        insert_master(&db, "index", "<html>index</html>").await;
        insert_master(&db, "global_header", "<div>header</div>").await;
        insert_template(&db, "header_welcome", "<p>welcome</p>", 1).await;
        insert_template(&db, "foreign", "<p>other set</p>", 2).await;

        let store = TemplateSetStore::new(&db, "Default Templates");
        let templates = store.fetch_templates(&GroupTable::default()).await.unwrap();

        let titles: Vec<&str> = templates
            .iter()
            .map(|t| t.template.title.as_str())
            .collect();
        assert_eq!(titles, vec!["global_header", "header_welcome", "index"]);

        assert_eq!(templates[0].group_name, "Global Templates");
        assert_eq!(templates[1].group_name, "Header Templates");
        assert_eq!(templates[2].group_name, "Index Templates");
    }

    #[tokio::test]
    async fn test_fetch_unknown_set_is_not_found() {
        let db = create_test_db().await;
        insert_master(&db, "index", "<html></html>").await;

        let store = TemplateSetStore::new(&db, "Missing");
        let result = store.fetch_templates(&GroupTable::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_over_master_creates_custom_row_then_updates_it() {
        let db = create_test_db().await;
        insert_template_set(&db, 1, "Default Templates").await;
        insert_master(&db, "header", "master body").await;
        let store = TemplateSetStore::new(&db, "Default Templates");

        let action = store.save_template("header", "first edit", "1860").await.unwrap();
        assert_eq!(action, TemplateSaveAction::CreatedCustomVersion);
        assert_eq!(count_templates(&db, "header", 1).await, 1);
        assert_eq!(count_templates(&db, "header", MASTER_SID).await, 1);
        assert_eq!(template_body(&db, "header", MASTER_SID).await, "master body");

        let action = store.save_template("header", "second edit", "1860").await.unwrap();
        assert_eq!(action, TemplateSaveAction::UpdatedModified);
        assert_eq!(count_templates(&db, "header", 1).await, 1);
        assert_eq!(template_body(&db, "header", 1).await, "second edit");
        assert_eq!(template_body(&db, "header", MASTER_SID).await, "master body");
    }

    #[tokio::test]
    async fn test_save_without_master() {
        let db = create_test_db().await;
        insert_template_set(&db, 3, "Custom Set").await;
        let store = TemplateSetStore::new(&db, "Custom Set");

        let action = store.save_template("my_widget", "v1", "1860").await.unwrap();
        assert_eq!(action, TemplateSaveAction::CreatedNew);

        let action = store.save_template("my_widget", "v2", "1861").await.unwrap();
        assert_eq!(action, TemplateSaveAction::UpdatedCustom);

        assert_eq!(count_templates(&db, "my_widget", 3).await, 1);
        assert_eq!(count_templates(&db, "my_widget", MASTER_SID).await, 0);

        let version = sqlx::query_scalar::<_, String>(
            "SELECT version FROM mybb_templates WHERE title = 'my_widget'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(version, "1861");
    }

    #[tokio::test]
    async fn test_save_then_fetch_round_trip() {
        let db = create_test_db().await;
        insert_template_set(&db, 1, "Default Templates").await;
        insert_master(&db, "index", "old").await;
        let store = TemplateSetStore::new(&db, "Default Templates");

        let body = "<html>\n  {$header}\n  <p>\"quoted\" & ünïcode</p>\n</html>\n";
        store.save_template("index", body, "1860").await.unwrap();

        let templates = store.fetch_templates(&GroupTable::default()).await.unwrap();
        let custom = templates
            .iter()
            .find(|t| t.template.title == "index" && t.template.sid == 1)
            .expect("custom row");
        assert_eq!(custom.template.template, body);
        assert!(custom.template.dateline > 0);
    }

    #[tokio::test]
    async fn test_save_into_missing_set_is_not_found() {
        let db = create_test_db().await;
        insert_master(&db, "index", "old").await;
        let store = TemplateSetStore::new(&db, "Nope");

        let result = store.save_template("index", "new", "1860").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(count_templates(&db, "index", MASTER_SID).await, 1);
        assert_eq!(template_body(&db, "index", MASTER_SID).await, "old");
    }

    #[tokio::test]
    async fn test_list_template_sets() {
        let db = create_test_db().await;
        insert_template_set(&db, 2, "Zeta").await;
        insert_template_set(&db, 1, "Alpha").await;

        let sets = list_template_sets(&db).await.unwrap();
        let titles: Vec<String> = sets.into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Alpha".to_string(), "Zeta".to_string()]);
    }

    #[tokio::test]
    async fn test_group_table_loads_from_database() {
        let db = create_test_db().await;
        insert_group(&db, 1, "header", "Navigation").await;
        insert_group(&db, 2, "calendar", "<lang:group_calendar>").await;

        let groups = GroupTable::load(&db).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get("calendar").unwrap().title, "<lang:group_calendar>");
    }
}

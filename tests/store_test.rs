use serde_json::json;
use tint_sync::host::HostEditor;
use tint_sync::presets;
use tint_sync::store::{ConfigStore, FileStore, MemoryStore, SHARED_NAMESPACE, StoreError};
use tint_sync::theme;
use tint_sync::types::{PageTheme, ThemeBundle};

#[tokio::test]
async fn read_of_missing_document_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    assert!(store.read().await.unwrap().is_none());
}

#[tokio::test]
async fn document_lives_under_the_shared_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let mut bundle = ThemeBundle::default();
    bundle.global_theme.enabled = true;
    store.write(&bundle).await.unwrap();

    let expected = dir
        .path()
        .join(SHARED_NAMESPACE)
        .join("themeData.json");
    assert_eq!(store.path(), expected);
    assert!(expected.is_file());
    assert_eq!(store.read().await.unwrap(), Some(bundle));
}

#[tokio::test]
async fn custom_namespace_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::with_namespace(dir.path(), "group.app.tint.test");
    store.write(&ThemeBundle::default()).await.unwrap();
    assert!(
        dir.path()
            .join("group.app.tint.test/themeData.json")
            .is_file()
    );
}

#[tokio::test]
async fn corrupt_document_is_an_error_not_a_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    tokio::fs::create_dir_all(store.path().parent().unwrap())
        .await
        .unwrap();
    tokio::fs::write(store.path(), b"{definitely not json")
        .await
        .unwrap();

    let err = store.read().await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[tokio::test]
async fn malformed_fields_fall_back_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    tokio::fs::create_dir_all(store.path().parent().unwrap())
        .await
        .unwrap();
    let doc = json!({
        "globalTheme": {"enabled": true, "background": "chartreuse", "text": "#101010"},
        "someFutureSection": {"ignored": true}
    });
    tokio::fs::write(store.path(), serde_json::to_vec(&doc).unwrap())
        .await
        .unwrap();

    let bundle = store.read().await.unwrap().unwrap();
    assert!(bundle.global_theme.enabled);
    assert_eq!(bundle.global_theme.background, theme::default_background());
    assert_eq!(bundle.global_theme.text.to_string(), "#101010");
}

#[tokio::test]
async fn later_write_replaces_the_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let mut first = ThemeBundle::default();
    first.set_site_theme("example.com", PageTheme::default());
    store.write(&first).await.unwrap();

    // The second writer never saw the site override; it is gone afterwards.
    let mut second = ThemeBundle::default();
    second.global_theme.enabled = true;
    store.write(&second).await.unwrap();

    let read = store.read().await.unwrap().unwrap();
    assert_eq!(read, second);
    assert!(read.site_themes.is_empty());
}

#[tokio::test]
async fn concurrent_writers_race_to_one_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let mut a = ThemeBundle::default();
    a.global_theme.enabled = true;
    let mut b = ThemeBundle::default();
    b.set_site_theme("example.com", PageTheme::default());

    let (ra, rb) = tokio::join!(store.write(&a), store.write(&b));
    ra.unwrap();
    rb.unwrap();

    // Whichever rename landed last, the document is one of the two inputs
    // in full, never a field-level mix.
    let read = store.read().await.unwrap().unwrap();
    assert!(read == a || read == b, "got a merged document: {read:?}");
}

#[tokio::test]
async fn editor_preserves_sibling_sections() {
    let dir = tempfile::tempdir().unwrap();
    let editor = HostEditor::new(FileStore::new(dir.path()));

    editor
        .update(|bundle| {
            bundle.favorite_themes.push(json!({"id": "dusk"}));
            bundle.custom_themes.push(json!({"id": "mine", "colors": ["#111111"]}));
        })
        .await
        .unwrap();

    let preset = presets::get("forest").unwrap();
    editor.apply_preset(&preset).await.unwrap();
    editor
        .set_site_override("https://Example.com/a", preset.page.clone())
        .await
        .unwrap();

    let bundle = editor.current().await.unwrap();
    assert_eq!(bundle.favorite_themes.len(), 1);
    assert_eq!(bundle.custom_themes.len(), 1);
    assert_eq!(bundle.global_theme.preset_id.as_deref(), Some("forest"));
    assert!(bundle.site_themes.contains_key("example.com"));
}

#[tokio::test]
async fn memory_store_failure_injection() {
    let store = MemoryStore::seeded(ThemeBundle::default());
    assert!(store.read().await.unwrap().is_some());

    store.set_fail_reads(true).await;
    assert!(matches!(
        store.read().await.unwrap_err(),
        StoreError::Unavailable(_)
    ));
    // Writes keep working; the snapshot bypasses the switch.
    store.write(&ThemeBundle::default()).await.unwrap();
    assert!(store.snapshot().await.is_some());

    store.set_fail_reads(false).await;
    assert!(store.read().await.unwrap().is_some());
}

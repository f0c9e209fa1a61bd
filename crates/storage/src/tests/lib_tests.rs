use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = CaptureStore::new("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn stores_and_loads_an_image_slot() {
    let store = CaptureStore::new("sqlite::memory:").await.expect("db");
    store
        .put_image(UPLOADED_IMAGE_SLOT, "data:image/png;base64,AAAA")
        .await
        .expect("put");

    let stored = store
        .load_image(UPLOADED_IMAGE_SLOT)
        .await
        .expect("load")
        .expect("slot populated");
    assert_eq!(stored.slot, UPLOADED_IMAGE_SLOT);
    assert_eq!(stored.data_url, "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn missing_slot_loads_as_none() {
    let store = CaptureStore::new("sqlite::memory:").await.expect("db");
    assert!(store
        .load_image(CAPTURED_PHOTO_SLOT)
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn slots_are_independent_of_each_other() {
    let store = CaptureStore::new("sqlite::memory:").await.expect("db");
    store
        .put_image(UPLOADED_IMAGE_SLOT, "data:image/jpeg;base64,dXA=")
        .await
        .expect("put upload");
    store
        .put_image(CAPTURED_PHOTO_SLOT, "data:image/png;base64,Y2Ft")
        .await
        .expect("put capture");

    let uploaded = store
        .load_image(UPLOADED_IMAGE_SLOT)
        .await
        .expect("load")
        .expect("uploaded");
    let captured = store
        .load_image(CAPTURED_PHOTO_SLOT)
        .await
        .expect("load")
        .expect("captured");
    assert_eq!(uploaded.data_url, "data:image/jpeg;base64,dXA=");
    assert_eq!(captured.data_url, "data:image/png;base64,Y2Ft");
}

#[tokio::test]
async fn a_new_write_overwrites_the_previous_slot_value() {
    let store = CaptureStore::new("sqlite::memory:").await.expect("db");
    store
        .put_image(UPLOADED_IMAGE_SLOT, "data:image/png;base64,Zmlyc3Q=")
        .await
        .expect("first put");
    store
        .put_image(UPLOADED_IMAGE_SLOT, "data:image/png;base64,c2Vjb25k")
        .await
        .expect("second put");

    let stored = store
        .load_image(UPLOADED_IMAGE_SLOT)
        .await
        .expect("load")
        .expect("slot populated");
    assert_eq!(stored.data_url, "data:image/png;base64,c2Vjb25k");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("pulsecheck_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("capture.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = CaptureStore::new(&database_url).await.expect("db");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

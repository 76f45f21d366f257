use storybook_error::ErrorClass;
use storybook_storage::{FileSystemStorage, MediaStorage, MediaType};
use tempfile::TempDir;

fn storage() -> (TempDir, FileSystemStorage) {
    let dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(dir.path(), "https://cdn.example.com/media/").unwrap();
    (dir, storage)
}

#[tokio::test]
async fn put_then_get_returns_same_bytes() {
    let (_dir, storage) = storage();
    let data = b"fake png bytes".to_vec();

    let object = storage.put("sb-1/3", &data, MediaType::Png).await.unwrap();

    assert_eq!(object.path, "sb-1/3.png");
    assert_eq!(object.url, "https://cdn.example.com/media/sb-1/3.png");
    assert_eq!(object.size_bytes, data.len() as u64);
    assert_eq!(object.mime_type, "image/png");
    assert_eq!(storage.get(&object.path).await.unwrap(), data);
}

#[tokio::test]
async fn put_replaces_existing_object() {
    let (_dir, storage) = storage();
    storage.put("sb-1/1", b"first", MediaType::Png).await.unwrap();
    let second = storage.put("sb-1/1", b"second", MediaType::Png).await.unwrap();

    assert_eq!(storage.get(&second.path).await.unwrap(), b"second");
}

#[tokio::test]
async fn identical_content_hashes_identically() {
    let (_dir, storage) = storage();
    let a = storage.put("sb-1/1", b"same", MediaType::Png).await.unwrap();
    let b = storage.put("sb-2/1", b"same", MediaType::Png).await.unwrap();

    assert_eq!(a.content_hash, b.content_hash);
    assert_ne!(a.path, b.path);
}

#[tokio::test]
async fn delete_removes_object() {
    let (_dir, storage) = storage();
    let object = storage.put("sb-1/2", b"bytes", MediaType::Jpeg).await.unwrap();
    assert!(storage.exists(&object.path).await.unwrap());

    storage.delete(&object.path).await.unwrap();
    assert!(!storage.exists(&object.path).await.unwrap());
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let (_dir, storage) = storage();
    let err = storage.get("sb-1/99.png").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn paths_cannot_escape_root() {
    let (_dir, storage) = storage();
    assert!(storage.put("../outside", b"x", MediaType::Png).await.is_err());
    assert!(storage.get("/etc/passwd").await.is_err());
}

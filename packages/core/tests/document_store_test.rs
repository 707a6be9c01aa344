//! Integration tests for the libsql document repository on disk
//!
//! Tests cover:
//! - Persistence across reopening the database file
//! - Soft delete, restore and purge visibility in listings
//! - Backend selection through `StorageConfig`
//! - Outlines nested far deeper than serde_json's default limit

use anyhow::Result;
use chrono::Utc;
use outline_core::config::StorageConfig;
use outline_core::db::{DatabaseService, DocumentStore, TursoStore};
use outline_core::models::{Document, DocumentMetadata, ImageAttachment, NestedNode};
use outline_core::services::EditorSession;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn open_store(path: &Path) -> Result<TursoStore> {
    let db = DatabaseService::new(path.to_path_buf()).await?;
    Ok(TursoStore::new(Arc::new(db)))
}

fn sample_document(id: &str, title: &str) -> Document {
    let mut photo = NestedNode::new("Receipt");
    photo.images = vec![ImageAttachment::new("https://img.example/r.png").with_name("receipt")];
    let mut errand = NestedNode::new("Buy **milk** #errand");
    errand.tags = vec!["errand".to_string()];
    errand.collapsed = true;

    Document {
        id: id.to_string(),
        title: title.to_string(),
        root: NestedNode::new(title)
            .with_children(vec![errand.with_children(vec![photo]), NestedNode::new("Call mom")]),
        metadata: DocumentMetadata::new(Utc::now()),
    }
}

#[tokio::test]
async fn test_documents_survive_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("nested").join("outline.db");

    let saved = {
        let store = open_store(&db_path).await?;
        let saved = store.save(sample_document("doc-1", "Weekend")).await?;
        store.close().await?;
        saved
    };
    assert!(db_path.exists(), "database file and parent directories are created");

    let store = open_store(&db_path).await?;
    let loaded = store.load("doc-1").await?.expect("document persisted");
    assert_eq!(loaded, saved);
    assert_eq!(loaded.root.children[0].images[0].name.as_deref(), Some("receipt"));
    assert!(loaded.root.children[0].collapsed);
    Ok(())
}

#[tokio::test]
async fn test_versions_increase_across_saves() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir.path().join("outline.db")).await?;

    let first = store.save(sample_document("doc-1", "Weekend")).await?;
    let mut edited = first.clone();
    edited.title = "Long weekend".to_string();
    edited.metadata.updated_at = Utc::now();
    let second = store.save(edited).await?;

    assert_eq!(first.metadata.version, 1);
    assert_eq!(second.metadata.version, 2);
    assert_eq!(second.metadata.created_at, first.metadata.created_at);
    assert_eq!(store.list().await?[0].title, "Long weekend");
    Ok(())
}

#[tokio::test]
async fn test_soft_delete_lifecycle() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir.path().join("outline.db")).await?;
    store.save(sample_document("keep", "Keep")).await?;
    store.save(sample_document("trash", "Trash")).await?;

    assert!(store.delete("trash").await?.existed);
    let listed = store.list().await?;
    assert_eq!(listed.len(), 2, "soft-deleted documents are still listed");
    let trashed = listed.iter().find(|d| d.id == "trash").expect("listed");
    assert!(trashed.deleted_at.is_some());
    assert!(store.load("trash").await?.expect("still loadable").metadata.is_deleted());

    assert!(store.restore("trash").await?);
    assert!(store.list().await?.iter().all(|d| d.deleted_at.is_none()));

    assert!(store.purge("trash").await?.existed);
    assert!(!store.purge("trash").await?.existed);
    assert!(store.load("trash").await?.is_none());
    assert_eq!(store.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_storage_config_selects_backend() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("configured.db");
    let path_str = path.to_string_lossy().to_string();

    let config = StorageConfig::from_lookup(|key| match key {
        "OUTLINE_DB_PATH" => Some(path_str.clone()),
        _ => None,
    })?;
    let db = DatabaseService::from_config(&config).await?;
    assert_eq!(db.db_path.as_deref(), Some(path.as_path()));

    let memory = StorageConfig::from_lookup(|key| match key {
        "OUTLINE_DB_PATH" => Some(":memory:".to_string()),
        _ => None,
    })?;
    assert_eq!(memory, StorageConfig::Memory);
    let store = TursoStore::new(Arc::new(DatabaseService::from_config(&memory).await?));
    store.save(sample_document("doc-1", "Scratch")).await?;
    assert_eq!(store.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_deep_outline_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("outline.db");
    let repo: Arc<dyn DocumentStore> = Arc::new(open_store(&db_path).await?);

    let mut session = EditorSession::new("Deep", repo.clone());
    let mut parent = session.root_id().to_string();
    for level in 0..120 {
        parent = session.add_child(&parent)?;
        session.update_content(&parent, format!("level {}", level))?;
    }
    assert_eq!(session.store().get(&parent).unwrap().level, 120);
    session.save().await?;
    let id = session.document_id().to_string();
    drop(session);
    repo.close().await?;

    let repo: Arc<dyn DocumentStore> = Arc::new(open_store(&db_path).await?);
    let reopened = EditorSession::open(&id, repo).await?;
    assert_eq!(reopened.store().len(), 121);
    let deepest = reopened.store().get(&parent).expect("deepest node reloaded");
    assert_eq!(deepest.content, "level 119");
    assert_eq!(deepest.level, 120);
    Ok(())
}

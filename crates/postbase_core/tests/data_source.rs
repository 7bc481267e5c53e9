use postbase_core::db::migrations::latest_version;
use postbase_core::{
    ConfigError, DataSource, DbError, EntityKind, NewPost, NewUser, PageRequest, PostPatch,
    PostRepository, RepoError, SqlitePostRepository, SqliteUserRepository, StoreConfig, UserPatch,
    UserRepository,
};
use rusqlite::Connection;

#[test]
fn repository_calls_before_initialize_fail_with_uninitialized() {
    let source = DataSource::new(StoreConfig::in_memory()).unwrap();
    let users = SqliteUserRepository::new(&source);
    let posts = SqlitePostRepository::new(&source);

    assert!(!source.is_initialized());
    assert!(matches!(
        users.find_all(false).unwrap_err(),
        RepoError::Uninitialized
    ));
    assert!(matches!(
        users
            .create(&NewUser::new("Thomas", "thomas@example.com"))
            .unwrap_err(),
        RepoError::Uninitialized
    ));
    assert!(matches!(
        users
            .find_with_pagination(PageRequest::default(), false)
            .unwrap_err(),
        RepoError::Uninitialized
    ));
    assert!(matches!(
        posts.find_by_user_id(1, false).unwrap_err(),
        RepoError::Uninitialized
    ));
}

#[test]
fn invalid_input_before_initialize_still_reports_uninitialized() {
    let source = DataSource::new(StoreConfig::in_memory()).unwrap();
    let users = SqliteUserRepository::new(&source);
    let posts = SqlitePostRepository::new(&source);

    assert!(matches!(
        users.create(&NewUser::new("", " ")).unwrap_err(),
        RepoError::Uninitialized
    ));
    let blank_name = UserPatch {
        name: Some(String::new()),
        email: None,
    };
    assert!(matches!(
        users.update(1, &blank_name).unwrap_err(),
        RepoError::Uninitialized
    ));
    assert!(matches!(
        posts.create(&NewPost::new("  ", "body", 1)).unwrap_err(),
        RepoError::Uninitialized
    ));
    let blank_title = PostPatch {
        title: Some(String::new()),
        ..PostPatch::default()
    };
    assert!(matches!(
        posts.update(1, &blank_title).unwrap_err(),
        RepoError::Uninitialized
    ));
}

#[test]
fn initialize_twice_is_rejected_until_destroy() {
    let mut source = DataSource::new(StoreConfig::in_memory()).unwrap();
    source.initialize().unwrap();
    assert!(source.is_initialized());
    assert_eq!(source.schema_version(), Some(latest_version()));

    let err = source.initialize().unwrap_err();
    assert!(matches!(err, DbError::AlreadyInitialized));

    source.destroy();
    assert!(!source.is_initialized());
    assert!(source.connection().is_none());
    source.initialize().unwrap();
    assert!(source.is_initialized());
}

#[test]
fn unreachable_store_fails_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("store.sqlite");
    let source = DataSource::new(StoreConfig::file(&path)).unwrap();

    let err = source.initialize().unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
    assert!(!source.is_initialized());
}

#[test]
fn newer_store_schema_fails_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let source = DataSource::new(StoreConfig::file(&path)).unwrap();
    let err = source.initialize().unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 999,
            ..
        }
    ));
}

#[test]
fn file_store_persists_across_data_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite");

    {
        let source = DataSource::new(StoreConfig::file(&path)).unwrap();
        source.initialize().unwrap();
        let users = SqliteUserRepository::new(&source);
        users
            .create(&NewUser::new("Thomas", "thomas@example.com"))
            .unwrap();
    }

    let source = DataSource::new(StoreConfig::file(&path)).unwrap();
    source.initialize().unwrap();
    let users = SqliteUserRepository::new(&source);
    assert!(users.exists_by_email("thomas@example.com").unwrap());
}

#[test]
fn disabled_sync_leaves_fresh_store_unmigrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unsynced.sqlite");
    let config = StoreConfig::file(&path).with_schema_auto_sync(false);
    let source = DataSource::new(config).unwrap();

    source.initialize().unwrap();
    assert_eq!(source.schema_version(), Some(0));

    let users = SqliteUserRepository::new(&source);
    let err = users.find_all(false).unwrap_err();
    assert!(matches!(
        err,
        RepoError::SchemaNotReady {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn disabled_sync_accepts_an_already_migrated_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("migrated.sqlite");
    drop(postbase_core::db::open_db(&path).unwrap());

    let config = StoreConfig::file(&path).with_schema_auto_sync(false);
    let source = DataSource::new(config).unwrap();
    source.initialize().unwrap();

    let users = SqliteUserRepository::new(&source);
    assert!(users.find_all(false).unwrap().is_empty());
}

#[test]
fn unmanaged_entities_are_rejected_by_repositories() {
    let config = StoreConfig::in_memory().with_entities(&[EntityKind::User]);
    let source = DataSource::new(config).unwrap();
    source.initialize().unwrap();

    let users = SqliteUserRepository::new(&source);
    let posts = SqlitePostRepository::new(&source);
    let user = users
        .create(&NewUser::new("Thomas", "thomas@example.com"))
        .unwrap();

    assert!(matches!(
        posts
            .create(&NewPost::new("title", "content", user.id))
            .unwrap_err(),
        RepoError::EntityNotManaged(EntityKind::Post)
    ));
    assert!(matches!(
        users.find_by_id(user.id, true).unwrap_err(),
        RepoError::EntityNotManaged(EntityKind::Post)
    ));
    assert!(users.find_by_id(user.id, false).unwrap().is_some());
}

#[test]
fn inconsistent_entity_set_is_rejected_at_construction() {
    let config = StoreConfig::in_memory().with_entities(&[EntityKind::Post]);
    let err = DataSource::new(config).err().expect("post without user must fail");
    assert_eq!(
        err,
        ConfigError::MissingRelationTarget {
            entity: EntityKind::Post,
            target: EntityKind::User,
        }
    );
}

use inquiry_core::{
    Context, Handler, Inquiry, InquiryError, InstanceInfo, DEFAULT_DATABASE_NAME,
    DEFAULT_DATABASE_VERSION,
};
use rusqlite::Connection;
use tempfile::TempDir;
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn context(dir: &TempDir, prefix: &str) -> Context {
    Context::new(unique(prefix), dir.path()).unwrap()
}

#[test]
fn builder_applies_defaults_and_persists_under_context_name() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir, "screen");

    let instance = Inquiry::new_instance(ctx.clone(), Some("   ")).build().unwrap();

    assert_eq!(instance.instance_name(), Some(ctx.instance_name()));
    assert_eq!(instance.database_name().as_deref(), Some(DEFAULT_DATABASE_NAME));
    assert_eq!(instance.database_version(), DEFAULT_DATABASE_VERSION);
    assert!(instance.handler().is_some());

    let fetched = Inquiry::get_for_context(&ctx).unwrap();
    assert_eq!(fetched.id(), instance.id());
    assert!(Inquiry::instance_names().contains(&ctx.instance_name()));

    Inquiry::destroy_context(&ctx);
}

#[test]
fn explicit_name_version_and_handler_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("explicit");
    let handler = Handler::new().unwrap();

    let instance = Inquiry::new_instance(context(&dir, "ctx"), Some("notes"))
        .instance_name(Some(name.clone()))
        .database_version(3)
        .handler(Some(handler.clone()))
        .build()
        .unwrap();

    assert_eq!(instance.instance_name().as_deref(), Some(name.as_str()));
    assert_eq!(instance.database_name().as_deref(), Some("notes"));
    assert_eq!(instance.database_version(), 3);
    assert!(Handler::same(&instance.handler().unwrap(), &handler));
    assert_eq!(
        instance.database_path().unwrap(),
        dir.path().join("notes")
    );

    Inquiry::destroy(&name);
}

#[test]
fn zero_database_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("zero");
    let err = Inquiry::new_instance(context(&dir, "ctx"), None)
        .instance_name(Some(name.clone()))
        .database_version(0)
        .build()
        .unwrap_err();

    assert!(matches!(err, InquiryError::InvalidDatabaseVersion(0)));
    assert!(matches!(
        Inquiry::get(&name),
        Err(InquiryError::InstanceNotFound(_))
    ));
}

#[test]
fn non_persisted_instance_is_not_registered() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("transient");
    let instance = Inquiry::new_instance(context(&dir, "ctx"), Some("db"))
        .instance_name(Some(name.clone()))
        .build_with(false)
        .unwrap();

    assert!(!instance.is_destroyed());
    let err = Inquiry::get(&name).unwrap_err();
    assert!(matches!(err, InquiryError::InstanceNotFound(missing) if missing == name));
}

#[test]
fn persisting_same_name_destroys_previous_instance() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("replace");

    let first = Inquiry::new_instance(context(&dir, "ctx"), Some("one"))
        .instance_name(Some(name.clone()))
        .build()
        .unwrap();
    let second = Inquiry::new_instance(context(&dir, "ctx"), Some("two"))
        .instance_name(Some(name.clone()))
        .build()
        .unwrap();

    assert!(first.is_destroyed());
    assert_eq!(first.database_version(), 0);
    assert_eq!(first.database_name(), None);
    assert!(first.context().is_none());
    assert!(first.handler().is_none());

    let current = Inquiry::get(&name).unwrap();
    assert_eq!(current.id(), second.id());
    assert_eq!(current.database_name().as_deref(), Some("two"));

    Inquiry::destroy(&name);
}

#[test]
fn copy_shares_settings_and_honors_persist_flag() {
    let dir = tempfile::tempdir().unwrap();
    let source_name = unique("source");
    let copy_name = unique("copy");
    let transient_name = unique("copy-transient");

    let source = Inquiry::new_instance(context(&dir, "ctx"), Some("shared"))
        .instance_name(Some(source_name.clone()))
        .database_version(2)
        .build()
        .unwrap();

    let copy = Inquiry::copy(&source, &copy_name, true).unwrap();
    assert_eq!(copy.instance_name().as_deref(), Some(copy_name.as_str()));
    assert_eq!(copy.database_name().as_deref(), Some("shared"));
    assert_eq!(copy.database_version(), 2);
    assert!(Handler::same(
        &copy.handler().unwrap(),
        &source.handler().unwrap()
    ));
    assert_eq!(Inquiry::get(&copy_name).unwrap().id(), copy.id());
    assert_ne!(copy.id(), source.id());

    let transient = Inquiry::copy(&source, &transient_name, false).unwrap();
    assert!(!transient.is_destroyed());
    assert!(Inquiry::get(&transient_name).is_err());

    Inquiry::destroy(&source_name);
    Inquiry::destroy(&copy_name);
}

#[test]
fn copy_for_context_uses_new_context_name_and_directory() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let source_name = unique("source");
    let target_ctx = context(&target_dir, "target");

    let source = Inquiry::new_instance(context(&source_dir, "ctx"), Some("shared"))
        .instance_name(Some(source_name.clone()))
        .build()
        .unwrap();

    let copy = Inquiry::copy_for_context(&source, &target_ctx, true).unwrap();
    assert_eq!(copy.instance_name(), Some(target_ctx.instance_name()));
    assert_eq!(
        copy.database_path().unwrap(),
        target_dir.path().join("shared")
    );
    assert_eq!(Inquiry::get_for_context(&target_ctx).unwrap().id(), copy.id());

    Inquiry::destroy(&source_name);
    Inquiry::destroy_context(&target_ctx);
}

#[test]
fn copy_of_destroyed_instance_fails() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("gone");
    let instance = Inquiry::new_instance(context(&dir, "ctx"), None)
        .instance_name(Some(name.clone()))
        .build()
        .unwrap();
    instance.destroy_instance();

    let err = Inquiry::copy(&instance, &unique("copy"), true).unwrap_err();
    assert!(matches!(err, InquiryError::InstanceDestroyed));
}

#[test]
fn destroy_by_name_clears_state_and_ignores_unknown_names() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("destroy");
    let instance = Inquiry::new_instance(context(&dir, "ctx"), None)
        .instance_name(Some(name.clone()))
        .build()
        .unwrap();

    Inquiry::destroy(&name);
    assert!(instance.is_destroyed());
    assert!(instance.instance_name().is_none());
    assert!(Inquiry::get(&name).is_err());

    // Unknown names are a logged no-op.
    Inquiry::destroy(&name);
}

#[test]
fn destroy_instance_is_idempotent_and_keeps_newer_registration() {
    let dir = tempfile::tempdir().unwrap();
    let name = unique("stale");

    let stale = Inquiry::new_instance(context(&dir, "ctx"), None)
        .instance_name(Some(name.clone()))
        .build_with(false)
        .unwrap();
    let registered = Inquiry::new_instance(context(&dir, "ctx"), None)
        .instance_name(Some(name.clone()))
        .build()
        .unwrap();

    stale.destroy_instance();
    stale.destroy_instance();
    assert!(stale.is_destroyed());
    assert_eq!(Inquiry::get(&name).unwrap().id(), registered.id());

    registered.destroy_instance();
    assert!(Inquiry::get(&name).is_err());
}

#[test]
fn factories_fail_after_destroy() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Inquiry::new_instance(context(&dir, "ctx"), None)
        .build_with(false)
        .unwrap();
    instance.destroy_instance();

    assert!(matches!(
        instance.drop_table("people"),
        Err(InquiryError::InstanceDestroyed)
    ));
    assert!(matches!(
        instance.database_path(),
        Err(InquiryError::InstanceDestroyed)
    ));
    assert!(instance.info().is_none());
}

#[test]
fn drop_table_removes_table_and_validates_name() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Inquiry::new_instance(context(&dir, "ctx"), Some("drops"))
        .build_with(false)
        .unwrap();
    let path = instance.database_path().unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE scratch (value TEXT);").unwrap();
    drop(conn);

    instance.drop_table("scratch").unwrap();
    instance.drop_table("scratch").unwrap();

    let conn = Connection::open(&path).unwrap();
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'scratch');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 0);

    let err = instance.drop_table("scratch; DROP TABLE x").unwrap_err();
    assert!(matches!(
        err,
        InquiryError::Db(inquiry_core::DbError::InvalidIdentifier(_))
    ));
}

#[test]
fn info_snapshot_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Inquiry::new_instance(context(&dir, "ctx"), Some("snap"))
        .database_version(5)
        .build_with(false)
        .unwrap();

    let info = instance.info().unwrap();
    assert_eq!(info.database_version, 5);
    assert_eq!(info.database_path, dir.path().join("snap"));

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["database_name"], "snap");
    let decoded: InstanceInfo = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, info);
}

use inquiry_core::{
    Column, ContentProvider, ContentResolver, ContentUri, ContentValues, Context, Inquiry,
    InquiryError, ProviderError, ProviderResult, Record, RecordResult, Selection, TableProvider,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
struct Contact {
    id: i64,
    display_name: String,
    starred: bool,
}

impl Contact {
    fn new(display_name: &str, starred: bool) -> Self {
        Self {
            id: 0,
            display_name: display_name.to_string(),
            starred,
        }
    }
}

impl Record for Contact {
    fn columns() -> Vec<Column> {
        vec![
            Column::integer("_id").primary_key().auto_increment(),
            Column::text("display_name").not_null(),
            Column::integer("starred").not_null(),
        ]
    }

    fn to_values(&self) -> ContentValues {
        ContentValues::new()
            .with("_id", self.id)
            .with("display_name", self.display_name.clone())
            .with("starred", self.starred)
    }

    fn from_values(values: &ContentValues) -> RecordResult<Self> {
        Ok(Self {
            id: values.get_i64("_id")?,
            display_name: values.get_text("display_name")?,
            starred: values.get_bool("starred")?,
        })
    }
}

/// Provider owner: an instance whose `contacts` table is exposed by authority.
fn exporting_instance(dir: &tempfile::TempDir, resolver: &Arc<ContentResolver>) -> Inquiry {
    let owner_ctx = Context::new(format!("owner-{}", Uuid::new_v4()), dir.path().join("owner"))
        .unwrap()
        .with_resolver(Arc::clone(resolver));
    let owner = Inquiry::new_instance(owner_ctx, Some("contacts_db"))
        .build_with(false)
        .unwrap();

    owner
        .insert_into::<Contact>("contacts")
        .unwrap()
        .values(vec![
            Contact::new("Ada", true),
            Contact::new("Grace", false),
            Contact::new("Linus", true),
        ])
        .run()
        .unwrap();

    resolver
        .register(Arc::new(TableProvider::new(
            "com.example.contacts",
            owner.database_path().unwrap(),
            owner.database_version(),
        )))
        .unwrap();
    owner
}

fn consumer(dir: &tempfile::TempDir, resolver: &Arc<ContentResolver>) -> Inquiry {
    let ctx = Context::new(format!("consumer-{}", Uuid::new_v4()), dir.path().join("consumer"))
        .unwrap()
        .with_resolver(Arc::clone(resolver));
    Inquiry::new_instance(ctx, None).build_with(false).unwrap()
}

fn contacts_uri() -> ContentUri {
    ContentUri::parse("content://com.example.contacts/contacts").unwrap()
}

#[test]
fn select_through_provider_applies_selection_sort_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = Arc::new(ContentResolver::new());
    let _owner = exporting_instance(&dir, &resolver);
    let consumer = consumer(&dir, &resolver);

    let starred = consumer
        .select_from_uri::<Contact>(&contacts_uri())
        .unwrap()
        .where_eq("starred", true)
        .sort("display_name DESC")
        .all()
        .unwrap();
    assert_eq!(
        starred
            .iter()
            .map(|contact| contact.display_name.as_str())
            .collect::<Vec<_>>(),
        vec!["Linus", "Ada"]
    );

    let first = consumer
        .select_from_uri::<Contact>(&contacts_uri())
        .unwrap()
        .sort("display_name ASC")
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(first.display_name, "Ada");

    let count = consumer
        .select_from_uri::<Contact>(&contacts_uri())
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn insert_update_delete_through_provider() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = Arc::new(ContentResolver::new());
    let owner = exporting_instance(&dir, &resolver);
    let consumer = consumer(&dir, &resolver);

    let ids = consumer
        .insert_into_uri::<Contact>(&contacts_uri())
        .unwrap()
        .value(Contact::new("Margaret", false))
        .run()
        .unwrap();
    assert_eq!(ids, vec![4]);

    let row_uri = contacts_uri().with_appended_id(ids[0]);
    let changed = consumer
        .update_uri::<Contact>(&row_uri)
        .unwrap()
        .value(Contact::new("Margaret H.", true))
        .run()
        .unwrap();
    assert_eq!(changed, 1);

    let margaret = owner
        .select_from::<Contact>("contacts")
        .unwrap()
        .where_eq("_id", 4_i64)
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(margaret.display_name, "Margaret H.");
    assert!(margaret.starred);

    let removed = consumer
        .delete_from_uri::<Contact>(&contacts_uri())
        .unwrap()
        .where_clause("starred = ?", [0_i64])
        .run()
        .unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn unknown_authority_reports_provider_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let consumer = consumer(&dir, &Arc::new(ContentResolver::new()));
    let uri = ContentUri::parse("content://com.example.missing/items").unwrap();

    let err = consumer
        .select_from_uri::<Contact>(&uri)
        .unwrap()
        .all()
        .unwrap_err();
    assert!(matches!(
        err,
        InquiryError::Provider(ProviderError::ProviderNotFound(authority))
            if authority == "com.example.missing"
    ));
}

/// Records what it was asked, to check pass-through of query parameters.
#[derive(Default)]
struct RecordingProvider {
    seen: Mutex<Vec<String>>,
}

impl ContentProvider for RecordingProvider {
    fn authority(&self) -> &str {
        "recording"
    }

    fn query(
        &self,
        uri: &ContentUri,
        projection: Option<&[String]>,
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> ProviderResult<Vec<ContentValues>> {
        self.seen.lock().unwrap().push(format!(
            "query {uri} {projection:?} {:?} {:?} {sort_order:?}",
            selection.clause(),
            selection.args().len()
        ));
        Ok((1..=5)
            .map(|id| {
                ContentValues::new()
                    .with("_id", id as i64)
                    .with("display_name", format!("row {id}"))
                    .with("starred", false)
            })
            .collect())
    }

    fn insert(&self, uri: &ContentUri, values: &ContentValues) -> ProviderResult<ContentUri> {
        self.seen
            .lock()
            .unwrap()
            .push(format!("insert {uri} {}", values.len()));
        Ok(uri.clone())
    }

    fn update(
        &self,
        _uri: &ContentUri,
        _values: &ContentValues,
        _selection: &Selection,
    ) -> ProviderResult<usize> {
        Err(ProviderError::Rejected("read-only".to_string()))
    }

    fn delete(&self, _uri: &ContentUri, _selection: &Selection) -> ProviderResult<usize> {
        Err(ProviderError::Rejected("read-only".to_string()))
    }
}

#[test]
fn provider_receives_parameters_and_limit_truncates_results() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = Arc::new(ContentResolver::new());
    let provider = Arc::new(RecordingProvider::default());
    resolver.register(provider.clone()).unwrap();
    let consumer = consumer(&dir, &resolver);
    let uri = ContentUri::parse("content://recording/items").unwrap();

    let rows = consumer
        .select_from_uri::<Contact>(&uri)
        .unwrap()
        .where_clause("display_name LIKE ?", ["row%".to_string()])
        .sort("_id")
        .limit(2)
        .all()
        .unwrap();
    assert_eq!(rows.len(), 2);

    // Insert URI without a numeric id yields -1.
    let ids = consumer
        .insert_into_uri::<Contact>(&uri)
        .unwrap()
        .value(Contact::new("new", false))
        .run()
        .unwrap();
    assert_eq!(ids, vec![-1]);

    let err = consumer
        .delete_from_uri::<Contact>(&uri)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        InquiryError::Provider(ProviderError::Rejected(_))
    ));

    let seen = provider.seen.lock().unwrap();
    assert_eq!(
        seen[0],
        "query content://recording/items None Some(\"display_name LIKE ?\") 1 Some(\"_id\")"
    );
    // The unset generated key is not sent to the provider.
    assert_eq!(seen[1], "insert content://recording/items 2");
}

use async_trait::async_trait;
use pgcensus_core::{
    Error, KeyKind, Report, Result, TableCounts, TableIdentity, TableReport, validate_report,
};
use pgcensus_introspect::{
    Catalog, CatalogColumn, CatalogTable, ConstraintColumn, NoopObserver, RelationId,
    ScanObserver, ScanOptions, build_report,
};

const IN_FAILED_TRANSACTION: &str = "25P02";

#[derive(Debug, Clone, Copy)]
enum Failure {
    State(&'static str),
    Untyped,
    ConnectionLost,
}

#[derive(Debug, Clone)]
struct FakeTable {
    table: CatalogTable,
    relation: Option<RelationId>,
    visible: bool,
    rows: u64,
    columns: Vec<CatalogColumn>,
    constraints: Vec<ConstraintColumn>,
    exists_failure: Option<Failure>,
    constraints_failure: Option<Failure>,
    count_failure: Option<Failure>,
    columns_failure: Option<Failure>,
}

impl FakeTable {
    fn new(schema: &str, name: &str, relation: u32) -> Self {
        Self {
            table: CatalogTable {
                identity: TableIdentity::new(schema, name),
                schema_description: None,
                class_description: None,
                geom_fieldname: None,
                geom_type: None,
            },
            relation: Some(RelationId(relation)),
            visible: true,
            rows: 0,
            columns: Vec::new(),
            constraints: Vec::new(),
            exists_failure: None,
            constraints_failure: None,
            count_failure: None,
            columns_failure: None,
        }
    }

    fn column(mut self, name: &str, data_type: &str, is_nullable: bool) -> Self {
        self.columns.push(CatalogColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable,
            comment: None,
        });
        self
    }

    fn key(mut self, kind: KeyKind, column: &str) -> Self {
        self.constraints.push(ConstraintColumn {
            kind,
            column: column.to_string(),
        });
        self
    }

    fn geometry(mut self, field: &str, geom_type: Option<&str>) -> Self {
        self.table.geom_fieldname = Some(field.to_string());
        self.table.geom_type = geom_type.map(str::to_string);
        self
    }

    fn rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    fn dropped(mut self) -> Self {
        self.relation = None;
        self.visible = false;
        self
    }

    fn failing_count(mut self, failure: Failure) -> Self {
        self.count_failure = Some(failure);
        self
    }

    fn failing_exists(mut self, failure: Failure) -> Self {
        self.exists_failure = Some(failure);
        self
    }

    fn failing_constraints(mut self, failure: Failure) -> Self {
        self.constraints_failure = Some(failure);
        self
    }

    fn failing_columns(mut self, failure: Failure) -> Self {
        self.columns_failure = Some(failure);
        self
    }
}

/// In-memory catalog that mimics PostgreSQL's aborted-transaction rule: once
/// a statement fails, every later statement fails until a rollback.
#[derive(Debug, Default)]
struct FakeCatalog {
    tables: Vec<FakeTable>,
    aborted: bool,
    rollbacks: usize,
    rollback_fails: bool,
}

impl FakeCatalog {
    fn new(tables: Vec<FakeTable>) -> Self {
        Self {
            tables,
            ..Self::default()
        }
    }

    fn find(&self, table: &TableIdentity) -> Option<&FakeTable> {
        self.tables.iter().find(|item| &item.table.identity == table)
    }

    fn guard(&self) -> Result<()> {
        if self.aborted {
            return Err(Error::db_with_state(
                IN_FAILED_TRANSACTION,
                "current transaction is aborted, commands ignored until end of transaction block",
            ));
        }
        Ok(())
    }

    fn fail(&mut self, failure: Failure) -> Error {
        self.aborted = true;
        match failure {
            Failure::State(code) => Error::db_with_state(code, "scripted failure"),
            Failure::Untyped => Error::db("scripted failure"),
            Failure::ConnectionLost => Error::Connection("server closed the connection".into()),
        }
    }

    /// Fail with the failure scripted by `pick` for `table`, if any.
    fn scripted(
        &mut self,
        table: &TableIdentity,
        pick: fn(&FakeTable) -> Option<Failure>,
    ) -> Result<()> {
        self.guard()?;
        match self.find(table).and_then(pick) {
            Some(failure) => Err(self.fail(failure)),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl Catalog for FakeCatalog {
    fn engine(&self) -> &'static str {
        "fake"
    }

    async fn database_name(&mut self) -> Result<String> {
        self.guard()?;
        Ok("gis".to_string())
    }

    async fn list_tables(&mut self, opts: &ScanOptions) -> Result<Vec<CatalogTable>> {
        self.guard()?;
        Ok(self
            .tables
            .iter()
            .filter(|item| opts.schemas.contains(&item.table.identity.schema_name))
            .map(|item| item.table.clone())
            .collect())
    }

    async fn resolve_relation(&mut self, table: &TableIdentity) -> Result<Option<RelationId>> {
        self.guard()?;
        Ok(self.find(table).and_then(|item| item.relation))
    }

    async fn list_constraint_columns(
        &mut self,
        relation: RelationId,
    ) -> Result<Vec<ConstraintColumn>> {
        self.guard()?;
        let (failure, constraints) = match self
            .tables
            .iter()
            .find(|item| item.relation == Some(relation))
        {
            Some(item) => (item.constraints_failure, item.constraints.clone()),
            None => (None, Vec::new()),
        };
        match failure {
            Some(failure) => Err(self.fail(failure)),
            None => Ok(constraints),
        }
    }

    async fn table_exists(&mut self, table: &TableIdentity) -> Result<bool> {
        self.scripted(table, |item| item.exists_failure)?;
        Ok(self.find(table).is_some_and(|item| item.visible))
    }

    async fn count_rows(&mut self, table: &TableIdentity) -> Result<u64> {
        self.guard()?;
        let (failure, rows) = match self.find(table) {
            Some(item) => (item.count_failure, item.rows),
            None => (Some(Failure::State("42P01")), 0),
        };
        match failure {
            Some(failure) => Err(self.fail(failure)),
            None => Ok(rows),
        }
    }

    async fn count_columns(&mut self, table: &TableIdentity) -> Result<u64> {
        self.guard()?;
        Ok(self
            .find(table)
            .map(|item| item.columns.len() as u64)
            .unwrap_or(0))
    }

    async fn list_columns(
        &mut self,
        table: &TableIdentity,
        _relation: RelationId,
    ) -> Result<Vec<CatalogColumn>> {
        self.scripted(table, |item| item.columns_failure)?;
        Ok(self
            .find(table)
            .map(|item| item.columns.clone())
            .unwrap_or_default())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.rollbacks += 1;
        if self.rollback_fails {
            return Err(Error::Connection("rollback failed: connection reset".into()));
        }
        self.aborted = false;
        Ok(())
    }
}

fn options(schemas: &[&str]) -> ScanOptions {
    ScanOptions::new(schemas.iter().map(|schema| schema.to_string()).collect())
}

async fn scan(catalog: &mut FakeCatalog, schemas: &[&str]) -> Report {
    let report = build_report(catalog, &options(schemas), &mut NoopObserver)
        .await
        .expect("build report");
    validate_report(&report).expect("report invariants");
    report
}

fn table<'a>(report: &'a Report, schema: &str, name: &str) -> &'a TableReport {
    report
        .tables
        .iter()
        .find(|table| table.descriptor.identity == TableIdentity::new(schema, name))
        .unwrap_or_else(|| panic!("missing table {schema}.{name}"))
}

#[tokio::test]
async fn counts_keys_and_geometry_of_a_healthy_table() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "t1", 100)
            .column("id", "integer", false)
            .column("geom", "USER-DEFINED", true)
            .key(KeyKind::Primary, "id")
            .geometry("geom", Some("geometry(Point,4326)"))
            .rows(5),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    assert_eq!(report.database, "gis");

    let t1 = table(&report, "s1", "t1");
    let descriptor = &t1.descriptor;
    assert_eq!(descriptor.geometry.field_label(), "geom");
    assert!(descriptor.geometry.type_label().starts_with("geometry("));
    assert_eq!(descriptor.keys.primary_key.display(), "id");
    assert_eq!(descriptor.keys.unique_key.display(), "none");
    assert_eq!(descriptor.keys.foreign_key.display(), "none");
    assert_eq!(
        descriptor.counts,
        TableCounts::Counted {
            records: 5,
            columns: 2
        }
    );

    let names: Vec<&str> = t1.columns.iter().map(|col| col.name.as_str()).collect();
    assert_eq!(names, vec!["id", "geom"]);
    assert_eq!(t1.columns[0].key_flag(KeyKind::Primary), "id");
    assert!(!t1.columns[0].nullable);
    assert_eq!(t1.columns[1].key_flag(KeyKind::Primary), "none");
    assert!(t1.columns[1].nullable);
    assert_eq!(catalog.rollbacks, 0);
}

#[tokio::test]
async fn table_dropped_after_enumeration_is_reported_not_found() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "t2", 200)
            .column("id", "integer", false)
            .key(KeyKind::Primary, "id")
            .dropped(),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let t2 = table(&report, "s1", "t2");
    assert_eq!(t2.descriptor.counts, TableCounts::NotFound);
    assert_eq!(t2.descriptor.counts.records_label(), "Table Not Found");
    assert_eq!(t2.descriptor.counts.columns_label(), "not applicable");
    assert!(t2.descriptor.keys.primary_key.is_empty());
    assert!(t2.columns.is_empty());
    assert_eq!(catalog.rollbacks, 0);
}

#[tokio::test]
async fn access_denied_keeps_the_session_usable() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "restricted", 300)
            .column("id", "integer", false)
            .failing_count(Failure::State("42501")),
        FakeTable::new("s1", "t3", 301)
            .column("id", "integer", false)
            .rows(12),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let restricted = table(&report, "s1", "restricted");
    assert_eq!(restricted.descriptor.counts, TableCounts::AccessDenied);
    assert_eq!(
        restricted.descriptor.counts.records_label(),
        "Access Denied/Not a Table"
    );
    assert_eq!(restricted.columns.len(), 1);

    let t3 = table(&report, "s1", "t3");
    assert_eq!(
        t3.descriptor.counts,
        TableCounts::Counted {
            records: 12,
            columns: 1
        }
    );
    assert_eq!(catalog.rollbacks, 1);
}

#[tokio::test]
async fn wrong_object_and_missing_relation_are_access_failures() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "a_wrong_kind", 310).failing_count(Failure::State("42809")),
        FakeTable::new("s1", "b_vanished", 311).failing_count(Failure::State("42P01")),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    for name in ["a_wrong_kind", "b_vanished"] {
        assert_eq!(
            table(&report, "s1", name).descriptor.counts,
            TableCounts::AccessDenied
        );
    }
    assert_eq!(catalog.rollbacks, 2);
}

#[tokio::test]
async fn unclassified_failure_rolls_back_and_continues() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "t4", 400)
            .column("id", "integer", false)
            .failing_count(Failure::Untyped),
        FakeTable::new("s1", "t5", 500)
            .column("id", "integer", false)
            .column("name", "text", true)
            .rows(3),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let t4 = table(&report, "s1", "t4");
    assert_eq!(t4.descriptor.counts, TableCounts::TransactionError);
    assert_eq!(t4.descriptor.counts.records_label(), "Transaction Error");
    assert_eq!(t4.descriptor.counts.columns_label(), "not applicable");

    let t5 = table(&report, "s1", "t5");
    assert_eq!(
        t5.descriptor.counts,
        TableCounts::Counted {
            records: 3,
            columns: 2
        }
    );
    assert_eq!(catalog.rollbacks, 1);
}

#[tokio::test]
async fn statement_timeout_is_a_transaction_error() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "huge", 410).failing_count(Failure::State("57014")),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    assert_eq!(
        table(&report, "s1", "huge").descriptor.counts,
        TableCounts::TransactionError
    );
}

#[tokio::test]
async fn unique_constraints_are_flattened_into_one_set() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "t6", 600)
            .column("a", "text", true)
            .column("b", "text", true)
            .key(KeyKind::Unique, "b")
            .key(KeyKind::Unique, "a")
            .key(KeyKind::Unique, "a")
            .rows(1),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let t6 = table(&report, "s1", "t6");
    let mut unique: Vec<&str> = t6.descriptor.keys.unique_key.iter().collect();
    unique.sort();
    assert_eq!(unique, vec!["a", "b"]);
    assert!(t6.descriptor.keys.primary_key.is_empty());
    assert!(
        t6.columns
            .iter()
            .all(|column| column.key_flag(KeyKind::Unique) == column.name)
    );
}

#[tokio::test]
async fn key_flags_do_not_match_substrings() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "parcels", 700)
            .column("id", "integer", true)
            .column("valid_id", "integer", false)
            .key(KeyKind::Primary, "valid_id")
            .rows(2),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let parcels = table(&report, "s1", "parcels");
    assert_eq!(parcels.columns[0].key_flag(KeyKind::Primary), "none");
    assert_eq!(parcels.columns[1].key_flag(KeyKind::Primary), "valid_id");
}

#[tokio::test]
async fn name_match_without_geometry_type_keeps_field() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "legacy", 800)
            .column("geom", "bytea", true)
            .geometry("geom", None),
        FakeTable::new("s1", "plain", 801).column("id", "integer", false),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let legacy = &table(&report, "s1", "legacy").descriptor.geometry;
    assert_eq!(legacy.field_label(), "geom");
    assert_eq!(legacy.type_label(), "no geometry type");

    let plain = &table(&report, "s1", "plain").descriptor.geometry;
    assert_eq!(plain.field_label(), "no geometry");
    assert_eq!(plain.type_label(), "no geometry type");
}

#[tokio::test]
async fn report_is_sorted_and_limited_to_requested_schemas() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("zeta", "b", 900),
        FakeTable::new("alpha", "z", 901),
        FakeTable::new("hidden", "a", 902),
        FakeTable::new("alpha", "a", 903),
    ]);

    let report = scan(&mut catalog, &["zeta", "alpha"]).await;
    let order: Vec<String> = report
        .tables
        .iter()
        .map(|table| table.descriptor.identity.to_string())
        .collect();
    assert_eq!(order, vec!["alpha.a", "alpha.z", "zeta.b"]);
}

#[derive(Default)]
struct RecordingObserver {
    started: Vec<(usize, usize)>,
    finished: Vec<TableCounts>,
    columns: Vec<String>,
}

impl ScanObserver for RecordingObserver {
    fn table_started(&mut self, position: usize, total: usize, _table: &TableIdentity) {
        self.started.push((position, total));
    }

    fn table_finished(&mut self, _table: &TableIdentity, counts: &TableCounts) {
        self.finished.push(*counts);
    }

    fn columns_started(&mut self, _position: usize, _total: usize, table: &TableIdentity) {
        self.columns.push(table.to_string());
    }
}

#[tokio::test]
async fn observer_sees_probe_then_sorted_detail_pass() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "b", 1000).rows(1),
        FakeTable::new("s1", "a", 1001).dropped(),
    ]);
    let mut observer = RecordingObserver::default();

    build_report(&mut catalog, &options(&["s1"]), &mut observer)
        .await
        .expect("build report");

    assert_eq!(observer.started, vec![(1, 2), (2, 2)]);
    assert_eq!(
        observer.finished,
        vec![
            TableCounts::Counted {
                records: 1,
                columns: 0
            },
            TableCounts::NotFound
        ]
    );
    assert_eq!(observer.columns, vec!["s1.a", "s1.b"]);
}

#[tokio::test]
async fn catalog_failure_is_fatal() {
    let mut catalog = FakeCatalog::new(vec![FakeTable::new("s1", "t1", 1)]);
    catalog.aborted = true;

    let err = build_report(&mut catalog, &options(&["s1"]), &mut NoopObserver)
        .await
        .unwrap_err();
    assert_eq!(err.sqlstate(), Some(IN_FAILED_TRANSACTION));
}

#[tokio::test]
async fn failed_existence_check_is_a_transaction_error() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "e", 1100)
            .column("id", "integer", false)
            .failing_exists(Failure::Untyped),
        FakeTable::new("s1", "z", 1101)
            .column("id", "integer", false)
            .rows(4),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    assert_eq!(
        table(&report, "s1", "e").descriptor.counts,
        TableCounts::TransactionError
    );
    assert_eq!(
        table(&report, "s1", "z").descriptor.counts,
        TableCounts::Counted {
            records: 4,
            columns: 1
        }
    );
    assert_eq!(catalog.rollbacks, 1);
}

#[tokio::test]
async fn failed_constraint_query_falls_back_to_no_keys() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "k", 1200)
            .column("id", "integer", false)
            .key(KeyKind::Primary, "id")
            .failing_constraints(Failure::State("57014"))
            .rows(4),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let k = table(&report, "s1", "k");
    assert_eq!(k.descriptor.keys.primary_key.display(), "none");
    assert_eq!(
        k.descriptor.counts,
        TableCounts::Counted {
            records: 4,
            columns: 1
        }
    );
    assert_eq!(k.columns[0].key_flag(KeyKind::Primary), "none");
    assert_eq!(catalog.rollbacks, 1);
}

#[tokio::test]
async fn failed_column_query_leaves_the_table_without_details() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "a", 1300)
            .column("id", "integer", false)
            .failing_columns(Failure::Untyped)
            .rows(2),
        FakeTable::new("s1", "b", 1301)
            .column("id", "integer", false)
            .rows(1),
    ]);

    let report = scan(&mut catalog, &["s1"]).await;
    let a = table(&report, "s1", "a");
    assert!(a.columns.is_empty());
    assert_eq!(
        a.descriptor.counts,
        TableCounts::Counted {
            records: 2,
            columns: 1
        }
    );
    assert_eq!(table(&report, "s1", "b").columns.len(), 1);
    assert_eq!(catalog.rollbacks, 1);
}

#[tokio::test]
async fn failed_rollback_is_fatal() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "t4", 1400).failing_count(Failure::Untyped),
        FakeTable::new("s1", "t5", 1401).rows(1),
    ]);
    catalog.rollback_fails = true;

    let err = build_report(&mut catalog, &options(&["s1"]), &mut NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(catalog.rollbacks, 1);
}

#[tokio::test]
async fn lost_connection_stops_the_scan() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "a", 1500)
            .column("id", "integer", false)
            .rows(1),
        FakeTable::new("s1", "b", 1501).failing_count(Failure::ConnectionLost),
        FakeTable::new("s1", "c", 1502).rows(1),
    ]);
    let mut observer = RecordingObserver::default();

    let err = build_report(&mut catalog, &options(&["s1"]), &mut observer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(catalog.rollbacks, 0);
    assert_eq!(observer.started, vec![(1, 3), (2, 3)]);
}

#[tokio::test]
async fn lost_connection_during_key_lookup_stops_the_scan() {
    let mut catalog = FakeCatalog::new(vec![
        FakeTable::new("s1", "a", 1600).failing_constraints(Failure::ConnectionLost),
        FakeTable::new("s1", "b", 1601).rows(1),
    ]);

    let err = build_report(&mut catalog, &options(&["s1"]), &mut NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(catalog.rollbacks, 0);
}

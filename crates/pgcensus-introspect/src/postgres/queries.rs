use sqlx::postgres::types::Oid;
use sqlx::{FromRow, PgConnection};

use pgcensus_core::{Result, TableIdentity};

use super::mapper::{db_error, quote_identifier};

pub async fn fetch_database_name(conn: &mut PgConnection) -> Result<String> {
    sqlx::query_scalar::<_, String>("select current_database()::text")
        .fetch_one(conn)
        .await
        .map_err(db_error)
}

#[derive(Debug, FromRow)]
pub struct RawTable {
    pub schema_name: String,
    pub class_name: String,
    pub schema_description: Option<String>,
    pub class_description: Option<String>,
    pub geom_fieldname: Option<String>,
    pub geom_type: Option<String>,
}

pub async fn list_tables(
    conn: &mut PgConnection,
    schemas: &[String],
    geometry_columns: &[String],
) -> Result<Vec<RawTable>> {
    sqlx::query_as::<_, RawTable>(
        r#"
        select
          n.nspname::text as schema_name,
          c.relname::text as class_name,
          pg_catalog.obj_description(n.oid, 'pg_namespace') as schema_description,
          pg_catalog.obj_description(c.oid, 'pg_class') as class_description,
          g.attname::text as geom_fieldname,
          case
            when g.typname = 'geometry' then pg_catalog.format_type(g.atttypid, g.atttypmod)
            else null
          end as geom_type
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        left join lateral (
          select a.attname, a.atttypid, a.atttypmod, t.typname
          from pg_attribute a
          join pg_type t on t.oid = a.atttypid
          where a.attrelid = c.oid
            and a.attnum > 0
            and not a.attisdropped
            and a.attname::text = any($1::text[])
          order by a.attnum
          limit 1
        ) g on true
        where n.nspname::text = any($2::text[])
          and c.relkind in ('r', 'p')
        order by n.nspname, c.relname
        "#,
    )
    .bind(geometry_columns)
    .bind(schemas)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}

pub async fn resolve_oid(conn: &mut PgConnection, table: &TableIdentity) -> Result<Option<Oid>> {
    sqlx::query_scalar::<_, Oid>(
        r#"
        select c.oid
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where c.relname = $1
          and n.nspname = $2
        "#,
    )
    .bind(&table.class_name)
    .bind(&table.schema_name)
    .fetch_optional(conn)
    .await
    .map_err(db_error)
}

#[derive(Debug, FromRow)]
pub struct RawConstraintColumn {
    pub contype: i8,
    pub column_name: String,
}

pub async fn list_constraint_columns(
    conn: &mut PgConnection,
    oid: Oid,
) -> Result<Vec<RawConstraintColumn>> {
    sqlx::query_as::<_, RawConstraintColumn>(
        r#"
        select
          con.contype as contype,
          att.attname::text as column_name
        from pg_constraint con
        join unnest(con.conkey) with ordinality as ord(attnum, ordinality) on true
        join pg_attribute att on att.attrelid = con.conrelid and att.attnum = ord.attnum
        where con.conrelid = $1
          and con.contype in ('p', 'u', 'f')
        order by con.contype, con.conname, ord.ordinality
        "#,
    )
    .bind(oid)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}

pub async fn table_exists(conn: &mut PgConnection, table: &TableIdentity) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        select exists (
          select 1
          from information_schema.tables
          where table_schema = $1
            and table_name = $2
        )
        "#,
    )
    .bind(&table.schema_name)
    .bind(&table.class_name)
    .fetch_one(conn)
    .await
    .map_err(db_error)
}

pub async fn count_rows(conn: &mut PgConnection, table: &TableIdentity) -> Result<i64> {
    let sql = format!(
        "select count(*) from {}.{}",
        quote_identifier(&table.schema_name),
        quote_identifier(&table.class_name)
    );
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(conn)
        .await
        .map_err(db_error)
}

pub async fn count_columns(conn: &mut PgConnection, table: &TableIdentity) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        select count(*)
        from information_schema.columns
        where table_schema = $1
          and table_name = $2
        "#,
    )
    .bind(&table.schema_name)
    .bind(&table.class_name)
    .fetch_one(conn)
    .await
    .map_err(db_error)
}

#[derive(Debug, FromRow)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub comment: Option<String>,
}

pub async fn list_columns(
    conn: &mut PgConnection,
    table: &TableIdentity,
    oid: Oid,
) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          ic.column_name::text as name,
          ic.data_type::text as data_type,
          (ic.is_nullable = 'YES') as is_nullable,
          pg_catalog.col_description($1, a.attnum) as comment
        from information_schema.columns ic
        left join pg_attribute a
          on a.attrelid = $1 and a.attname = ic.column_name::name and not a.attisdropped
        where ic.table_schema = $2
          and ic.table_name = $3
        order by ic.ordinal_position
        "#,
    )
    .bind(oid)
    .bind(&table.schema_name)
    .bind(&table.class_name)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}

pub async fn begin_read_only(conn: &mut PgConnection) -> Result<()> {
    sqlx::raw_sql("begin transaction read only")
        .execute(conn)
        .await
        .map_err(db_error)?;
    Ok(())
}

pub async fn rollback(conn: &mut PgConnection) -> Result<()> {
    sqlx::raw_sql("rollback")
        .execute(conn)
        .await
        .map_err(db_error)?;
    Ok(())
}

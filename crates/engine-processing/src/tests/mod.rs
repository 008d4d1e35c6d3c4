
mod helpers {
    use engine_core::sink::LoadTarget;
    use model::{
        core::{
            column::{Column, ColumnType},
            identifiers::TableRef,
        },
        events::DataEvent,
        execution::write_mode::WriteMode,
    };

    pub const COPY_T: &str = r#"COPY "public"."t" ("id", "name") FROM STDIN WITH (FORMAT csv, HEADER FALSE, ENCODING 'UTF8')"#;
    pub const CREATE_T: &str = r#"CREATE TABLE "public"."t" ("id" BIGINT, "name" TEXT)"#;
    pub const CREATE_T_IF_MISSING: &str =
        r#"CREATE TABLE IF NOT EXISTS "public"."t" ("id" BIGINT, "name" TEXT)"#;
    pub const DROP_T: &str = r#"DROP TABLE IF EXISTS "public"."t""#;
    pub const INDEX_T: &str = r#"CREATE INDEX IF NOT EXISTS "t_id_idx" ON "public"."t" ("id")"#;

    pub fn target(mode: WriteMode) -> LoadTarget {
        LoadTarget::new(
            TableRef::new("public", "t"),
            vec![
                Column::new("id", ColumnType::BigInt),
                Column::new("name", ColumnType::Text),
            ],
            "id",
        )
        .with_write_mode(mode)
    }

    pub fn create<O>(rows: &'static str) -> DataEvent<O> {
        DataEvent::create(rows)
    }

    /// The quoted staging table a staged session created.
    pub fn staging_table(statements: &[String]) -> String {
        statements
            .iter()
            .find_map(|sql| sql.strip_prefix("CREATE TEMP TABLE "))
            .and_then(|rest| rest.split(" (").next())
            .map(str::to_string)
            .unwrap_or_default()
    }
}

use super::*;

fn parse_one(sql: &str) -> Statement {
    SqlParser::mysql().parse_single(sql).unwrap().statement
}

fn alter_specs(sql: &str) -> Vec<AlterSpec> {
    match parse_one(sql) {
        Statement::AlterTable(alter) => alter.specs,
        other => panic!("expected ALTER TABLE, got {:?}", other),
    }
}

#[test]
fn test_parse_multiple_statements() {
    let parser = SqlParser::mysql();
    let stmts = parser.parse("SELECT 1; SELECT 2;").unwrap();
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0].text, "SELECT 1");
    assert_eq!(stmts[1].text, "SELECT 2");
}

#[test]
fn test_parse_empty() {
    let parser = SqlParser::mysql();
    assert!(matches!(parser.parse(""), Err(SqlError::EmptySql)));
    assert!(matches!(parser.parse("  \n\t"), Err(SqlError::EmptySql)));
}

#[test]
fn test_comment_only_script_has_no_statements() {
    let parser = SqlParser::mysql();
    let stmts = parser
        .parse("-- MIGRATION_BASE\n# nothing here\n/* still nothing */\n")
        .unwrap();
    assert!(stmts.is_empty());
}

#[test]
fn test_statement_lines_and_text() {
    let sql = "-- header\n\nCREATE TABLE t (\n  id BIGINT PRIMARY KEY\n);\n\n/* c; */ ALTER TABLE t ADD COLUMN name VARCHAR(50);\nINSERT INTO t (id) VALUES (';');\n";
    let stmts = SqlParser::mysql().parse(sql).unwrap();
    assert_eq!(stmts.len(), 3);
    assert_eq!(stmts[0].line, 3);
    assert!(stmts[0].text.starts_with("CREATE TABLE t ("));
    assert!(stmts[0].text.ends_with(')'));
    assert_eq!(stmts[1].line, 7);
    assert_eq!(stmts[1].text, "ALTER TABLE t ADD COLUMN name VARCHAR(50)");
    assert_eq!(stmts[2].line, 8);
    assert_eq!(stmts[2].text, "INSERT INTO t (id) VALUES (';')");
}

#[test]
fn test_trailing_statement_without_semicolon() {
    let stmts = SqlParser::mysql()
        .parse("SELECT 1;\nSELECT 2")
        .unwrap();
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[1].line, 2);
}

#[test]
fn test_parse_create_table() {
    let sql = "CREATE TABLE IF NOT EXISTS `users` (
        `id` BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT,
        `email` VARCHAR(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL COMMENT 'login',
        `status` ENUM('active','disabled') DEFAULT 'active',
        `score` DECIMAL(10,2) DEFAULT -1.5,
        `created_at` DATETIME(3) NOT NULL DEFAULT CURRENT_TIMESTAMP(3),
        `updated_at` TIMESTAMP NULL DEFAULT NULL ON UPDATE CURRENT_TIMESTAMP,
        PRIMARY KEY (`id`),
        UNIQUE KEY `uk_email` (`email`(100)),
        KEY (`status`, `score`),
        CONSTRAINT `fk_org` FOREIGN KEY (`org_id`) REFERENCES `orgs` (`id`) ON DELETE CASCADE
    ) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4 COMMENT='people'";
    let table = match parse_one(sql) {
        Statement::CreateTable(t) => t,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(table.name, "users");
    assert!(table.if_not_exists);
    assert_eq!(table.columns.len(), 6);

    let id = table.column("ID").unwrap();
    assert_eq!(id.data_type.name, "BIGINT");
    assert_eq!(id.data_type.args, vec!["20"]);
    assert!(id.data_type.unsigned);
    assert!(id.auto_increment);
    assert_eq!(id.nullable, Some(false));

    let email = table.column("email").unwrap();
    assert_eq!(email.charset.as_deref(), Some("utf8mb4"));
    assert_eq!(email.collate.as_deref(), Some("utf8mb4_bin"));
    assert_eq!(email.comment.as_deref(), Some("login"));

    let status = table.column("status").unwrap();
    assert_eq!(status.data_type.args, vec!["'active'", "'disabled'"]);
    assert_eq!(status.default, Some(Expr::String("active".to_string())));

    assert_eq!(
        table.column("score").unwrap().default,
        Some(Expr::Number("-1.5".to_string()))
    );
    assert_eq!(
        table.column("created_at").unwrap().default,
        Some(Expr::CurrentTimestamp(Some(3)))
    );
    let updated = table.column("updated_at").unwrap();
    assert_eq!(updated.default, Some(Expr::Null));
    assert_eq!(updated.on_update, Some(Expr::CurrentTimestamp(None)));

    assert_eq!(table.constraints.len(), 4);
    assert_eq!(table.constraints[0].kind, ConstraintKind::PrimaryKey);
    assert_eq!(table.constraints[1].name.as_deref(), Some("uk_email"));
    assert_eq!(table.constraints[1].columns[0].length, Some(100));
    assert_eq!(table.constraints[2].name, None);
    assert_eq!(table.constraints[2].column_names(), vec!["status", "score"]);
    match &table.constraints[3].kind {
        ConstraintKind::ForeignKey(fk) => {
            assert_eq!(fk.table, "orgs");
            assert_eq!(fk.on_delete.as_deref(), Some("CASCADE"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(table.constraints[3].name.as_deref(), Some("fk_org"));

    assert_eq!(table.option("ENGINE").unwrap().value.text(), "InnoDB");
    assert_eq!(table.option("AUTO_INCREMENT").unwrap().value.text(), "42");
    assert_eq!(table.charset(), Some("utf8mb4"));
    assert_eq!(
        table.option("COMMENT").unwrap().value,
        Expr::String("people".to_string())
    );
}

#[test]
fn test_parse_create_table_like() {
    match parse_one("CREATE TABLE a LIKE b") {
        Statement::CreateTable(t) => assert_eq!(t.like.as_deref(), Some("b")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_create_table_select_unsupported() {
    let result = SqlParser::mysql().parse("CREATE TABLE a (id INT) SELECT * FROM b");
    assert!(matches!(result, Err(SqlError::UnsupportedStatement(_))));
}

#[test]
fn test_parse_qualified_name_drops_database() {
    match parse_one("CREATE TABLE app.t (id INT)") {
        Statement::CreateTable(t) => assert_eq!(t.name, "t"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_alter_add_columns() {
    let specs = alter_specs("ALTER TABLE t ADD COLUMN name VARCHAR(50) NOT NULL AFTER id");
    assert_eq!(specs.len(), 1);
    match &specs[0] {
        AlterSpec::AddColumns { columns, position } => {
            assert_eq!(columns[0].name, "name");
            assert_eq!(position, &Some(ColumnPosition::After("id".to_string())));
        }
        other => panic!("unexpected {:?}", other),
    }

    let specs = alter_specs("ALTER TABLE t ADD (a INT, b INT), ADD c INT FIRST");
    assert_eq!(specs.len(), 2);
    assert!(matches!(&specs[0], AlterSpec::AddColumns { columns, .. } if columns.len() == 2));
    assert!(matches!(
        &specs[1],
        AlterSpec::AddColumns { position: Some(ColumnPosition::First), .. }
    ));
}

#[test]
fn test_parse_alter_constraints_and_drops() {
    let specs = alter_specs(
        "ALTER TABLE t ADD UNIQUE INDEX uk_a (a), ADD INDEX (b), ADD PRIMARY KEY (id), \
         DROP INDEX idx_c, DROP KEY idx_d, DROP PRIMARY KEY, DROP FOREIGN KEY fk_x, \
         DROP COLUMN e, DROP f, DROP CHECK chk",
    );
    let kinds: Vec<AlterSpecKind> = specs.iter().map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            AlterSpecKind::AddConstraint,
            AlterSpecKind::AddConstraint,
            AlterSpecKind::AddConstraint,
            AlterSpecKind::DropIndex,
            AlterSpecKind::DropIndex,
            AlterSpecKind::DropPrimaryKey,
            AlterSpecKind::DropForeignKey,
            AlterSpecKind::DropColumn,
            AlterSpecKind::DropColumn,
            AlterSpecKind::DropCheck,
        ]
    );
    assert_eq!(specs[8], AlterSpec::DropColumn("f".to_string()));
}

#[test]
fn test_parse_alter_column_changes() {
    let specs = alter_specs(
        "ALTER TABLE t MODIFY COLUMN a BIGINT NOT NULL, CHANGE b c INT, \
         ALTER COLUMN d SET DEFAULT 0, ALTER e DROP DEFAULT, RENAME COLUMN f TO g, \
         RENAME INDEX i1 TO i2, RENAME TO t2",
    );
    assert!(matches!(&specs[0], AlterSpec::ModifyColumn { column, .. } if column.name == "a"));
    assert!(matches!(
        &specs[1],
        AlterSpec::ChangeColumn { old_name, column, .. } if old_name == "b" && column.name == "c"
    ));
    assert_eq!(
        specs[2],
        AlterSpec::AlterColumn {
            name: "d".to_string(),
            action: AlterColumnAction::SetDefault(Expr::Number("0".to_string())),
        }
    );
    assert_eq!(
        specs[3],
        AlterSpec::AlterColumn {
            name: "e".to_string(),
            action: AlterColumnAction::DropDefault,
        }
    );
    assert_eq!(specs[4].kind(), AlterSpecKind::RenameColumn);
    assert_eq!(specs[5].kind(), AlterSpecKind::RenameIndex);
    assert_eq!(specs[6], AlterSpec::RenameTable("t2".to_string()));
}

#[test]
fn test_parse_alter_options_and_misc() {
    let specs = alter_specs(
        "ALTER TABLE t ENGINE=InnoDB ROW_FORMAT=DYNAMIC, COMMENT 'x', ALGORITHM=INPLACE, LOCK=NONE, FORCE",
    );
    match &specs[0] {
        AlterSpec::Options(options) => {
            // options separated by a comma fold into one specification
            assert_eq!(options.len(), 3);
            assert_eq!(options[1].name, "ROW_FORMAT");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(specs[1], AlterSpec::Algorithm("INPLACE".to_string()));
    assert_eq!(specs[2], AlterSpec::Lock("NONE".to_string()));
    assert_eq!(specs[3], AlterSpec::Force);

    let specs = alter_specs("ALTER TABLE t DISABLE KEYS");
    assert_eq!(specs[0], AlterSpec::Keys { enable: false });

    let specs = alter_specs("ALTER TABLE t DISCARD TABLESPACE");
    assert_eq!(specs[0].kind(), AlterSpecKind::Tablespace);

    let specs = alter_specs("ALTER TABLE t TRUNCATE PARTITION p0, p1");
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].kind(), AlterSpecKind::Partition);

    let specs = alter_specs("ALTER TABLE t CONVERT TO CHARACTER SET utf8mb4 COLLATE utf8mb4_bin");
    assert_eq!(
        specs[0],
        AlterSpec::ConvertCharset {
            charset: "utf8mb4".to_string(),
            collate: Some("utf8mb4_bin".to_string()),
        }
    );

    let specs = alter_specs("ALTER TABLE t ALTER INDEX idx INVISIBLE, WITHOUT VALIDATION");
    assert_eq!(
        specs[0],
        AlterSpec::IndexVisibility {
            name: "idx".to_string(),
            visible: false,
        }
    );
    assert_eq!(specs[1], AlterSpec::Validation(false));

    let specs = alter_specs("ALTER TABLE t ORDER BY a, b");
    assert_eq!(
        specs[0],
        AlterSpec::OrderBy(vec!["a".to_string(), "b".to_string()])
    );
}

#[test]
fn test_parse_alter_unsupported_spec() {
    let result = SqlParser::mysql().parse("ALTER TABLE t FROBNICATE");
    assert!(matches!(result, Err(SqlError::ParseError { .. })));
}

#[test]
fn test_parse_index_statements() {
    match parse_one("CREATE UNIQUE INDEX uk ON t (a, b(10))") {
        Statement::CreateIndex(idx) => {
            assert_eq!(idx.name, "uk");
            assert_eq!(idx.table, "t");
            assert_eq!(idx.kind, ConstraintKind::Unique);
            assert_eq!(idx.columns[1].length, Some(10));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        parse_one("DROP INDEX `PRIMARY` ON t"),
        Statement::DropIndex(DropIndex {
            name: "PRIMARY".to_string(),
            table: "t".to_string(),
        })
    );
}

#[test]
fn test_parse_drop_rename_truncate() {
    assert_eq!(
        parse_one("DROP TABLE IF EXISTS a, b"),
        Statement::DropTable(DropTable {
            names: vec!["a".to_string(), "b".to_string()],
            if_exists: true,
            temporary: false,
        })
    );
    assert_eq!(
        parse_one("RENAME TABLE a TO b, b TO c"),
        Statement::RenameTable(RenameTable {
            pairs: vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string())
            ],
        })
    );
    assert_eq!(
        parse_one("TRUNCATE TABLE t"),
        Statement::Truncate(Truncate {
            table: "t".to_string()
        })
    );
    assert!(matches!(
        parse_one("DROP DATABASE IF EXISTS app"),
        Statement::DropDatabase { if_exists: true, .. }
    ));
}

#[test]
fn test_parse_insert() {
    match parse_one(
        "INSERT IGNORE INTO t (id, name) VALUES (1, 'a'), (2, 'b') ON DUPLICATE KEY UPDATE name = VALUES(name), updated_at = NOW()",
    ) {
        Statement::Insert(insert) => {
            assert_eq!(insert.table, "t");
            assert!(!insert.replace);
            assert_eq!(insert.columns, vec!["id", "name"]);
            assert_eq!(insert.on_duplicate, vec!["name", "updated_at"]);
        }
        other => panic!("unexpected {:?}", other),
    }

    match parse_one("REPLACE INTO t SET id = 1, created_at = NOW()") {
        Statement::Insert(insert) => {
            assert!(insert.replace);
            assert!(insert.set_form);
            assert_eq!(insert.columns, vec!["id", "created_at"]);
        }
        other => panic!("unexpected {:?}", other),
    }

    match parse_one("INSERT INTO t VALUES (1, 2)") {
        Statement::Insert(insert) => assert!(insert.columns.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_update() {
    match parse_one("UPDATE t SET t.a = 1, b = (SELECT 2) WHERE id = 3") {
        Statement::Update(update) => {
            assert_eq!(update.table, "t");
            assert_eq!(update.assignments, vec!["a", "b"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_statement_kinds() {
    let sql = "SELECT 1; SHOW TABLES; SET NAMES utf8mb4; BEGIN; COMMIT; \
               START TRANSACTION; DELETE FROM t WHERE id = 1; USE app; \
               CREATE VIEW v AS SELECT 1; SET SESSION TRANSACTION ISOLATION LEVEL READ COMMITTED";
    let kinds: Vec<StatementKind> = SqlParser::mysql()
        .parse(sql)
        .unwrap()
        .iter()
        .map(|s| s.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            StatementKind::Select,
            StatementKind::Show,
            StatementKind::Set,
            StatementKind::Transaction,
            StatementKind::Transaction,
            StatementKind::Transaction,
            StatementKind::Delete,
            StatementKind::Other,
            StatementKind::CreateView,
            StatementKind::Transaction,
        ]
    );
}

#[test]
fn test_parse_error_reports_statement_line() {
    let result = SqlParser::mysql().parse("SELECT 1;\n\nCREATE TABLE (id INT);");
    match result {
        Err(SqlError::ParseError { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_rendered_create_table_parses_back() {
    let parser = SqlParser::mysql();
    let sql = "CREATE TABLE t (id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT, \
               note VARCHAR(20) DEFAULT 'it''s' COMMENT 'x', PRIMARY KEY (id), KEY idx_note (note(5))) \
               ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";
    let table = parser.parse_create_table(sql).unwrap();
    let again = parser.parse_create_table(&table.to_string()).unwrap();
    assert_eq!(table, again);
}

#[test]
fn test_parenthesized_literal_default() {
    let table = SqlParser::mysql()
        .parse_create_table(
            "CREATE TABLE items(label VARCHAR DEFAULT('x'), n INTEGER DEFAULT ((0)), u CHAR(36) DEFAULT (uuid()))",
        )
        .unwrap();
    assert_eq!(table.column("label").unwrap().default, Some(Expr::String("x".into())));
    assert_eq!(table.column("n").unwrap().default, Some(Expr::Number("0".into())));
    assert!(matches!(table.column("u").unwrap().default, Some(Expr::Raw(_))));
}

#[test]
fn test_parse_create_table_rejects_other_statements() {
    let result = SqlParser::mysql().parse_create_table("SELECT 1");
    assert!(matches!(result, Err(SqlError::UnsupportedStatement(_))));
}

//! SQL parser: splits a script into statements and parses each one into the
//! statement model.
//!
//! Tokenizing is done by sqlparser's MySQL tokenizer; the grammar on top is a
//! small recursive-descent parser for the DDL/DML subset migrations use.
//! sqlparser's own ALTER TABLE grammar has no MySQL table options, index
//! renames, `DROP CHECK` or visibility and enforcement toggles.

use crate::ast::*;
use crate::dialect::{quote_string, MySqlDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sqlparser::tokenizer::Token;

/// SQL parser that wraps the sqlparser tokenizer with a dialect
pub struct SqlParser {
    dialect: Box<dyn SqlDialect>,
}

impl SqlParser {
    /// Create a new parser with MySQL dialect
    pub fn mysql() -> Self {
        Self {
            dialect: Box::new(MySqlDialect::new()),
        }
    }

    /// Parse a script into statements.
    ///
    /// Empty input is an error; input holding only comments yields no statements.
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<StatementNode>> {
        if sql.trim().is_empty() {
            return Err(SqlError::EmptySql);
        }

        split_statements(sql)
            .into_iter()
            .map(|raw| self.parse_raw(raw))
            .collect()
    }

    /// Parse SQL and return the first statement
    pub fn parse_single(&self, sql: &str) -> SqlResult<StatementNode> {
        let stmts = self.parse(sql)?;
        stmts.into_iter().next().ok_or(SqlError::EmptySql)
    }

    /// Parse a single CREATE TABLE statement (a table snapshot)
    pub fn parse_create_table(&self, sql: &str) -> SqlResult<CreateTable> {
        let node = self.parse_single(sql)?;
        match node.statement {
            Statement::CreateTable(table) => Ok(table),
            other => Err(SqlError::UnsupportedStatement(format!(
                "expected CREATE TABLE, found {}",
                other.kind()
            ))),
        }
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    /// Quote an identifier for the current dialect
    pub fn quote_ident(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    fn parse_raw(&self, raw: RawStatement) -> SqlResult<StatementNode> {
        let tokens = self.dialect.tokenize(&raw.text).map_err(|e| match e {
            SqlError::Tokenize { message, line } => SqlError::Tokenize {
                message,
                line: raw.line + line.saturating_sub(1),
            },
            other => other,
        })?;
        let tokens = tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();
        let statement = Parser::new(tokens, raw.line).parse_statement()?;
        Ok(StatementNode {
            statement,
            text: raw.text,
            line: raw.line,
        })
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::mysql()
    }
}

/// Statement text and the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawStatement {
    text: String,
    line: usize,
}

/// Split a script at top-level semicolons, skipping comment-only fragments.
fn split_statements(sql: &str) -> Vec<RawStatement> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut out = Vec::new();
    let mut state = State::Normal;
    let mut line = 1;
    let mut start: Option<(usize, usize)> = None;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match state {
            State::Normal => match c {
                ';' => {
                    if let Some((s, l)) = start.take() {
                        out.push(RawStatement {
                            text: sql[s..i].trim_end().to_string(),
                            line: l,
                        });
                    }
                }
                '#' => state = State::LineComment,
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    state = State::BlockComment;
                }
                c if c.is_whitespace() => {}
                c => {
                    if start.is_none() {
                        start = Some((i, line));
                    }
                    if c == '\'' || c == '"' || c == '`' {
                        state = State::Quoted(c);
                    }
                }
            },
            State::Quoted(q) => {
                if c == '\\' && q != '`' {
                    if let Some((_, escaped)) = chars.next() {
                        if escaped == '\n' {
                            line += 1;
                        }
                    }
                } else if c == q {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = State::Normal;
                }
            }
        }
        if c == '\n' {
            line += 1;
        }
    }

    if let Some((s, l)) = start {
        let text = sql[s..].trim_end();
        if !text.is_empty() {
            out.push(RawStatement {
                text: text.to_string(),
                line: l,
            });
        }
    }
    out
}

static EOF_TOKEN: Token = Token::EOF;

const CONSTRAINT_START: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "UNIQUE",
    "KEY",
    "INDEX",
    "FULLTEXT",
    "SPATIAL",
    "FOREIGN",
    "CHECK",
];

const TABLE_OPTIONS: &[&str] = &[
    "ENGINE",
    "AUTO_INCREMENT",
    "AUTOEXTEND_SIZE",
    "AVG_ROW_LENGTH",
    "CHARSET",
    "CHECKSUM",
    "COLLATE",
    "COMMENT",
    "COMPRESSION",
    "CONNECTION",
    "DELAY_KEY_WRITE",
    "ENCRYPTION",
    "ENGINE_ATTRIBUTE",
    "INSERT_METHOD",
    "KEY_BLOCK_SIZE",
    "MAX_ROWS",
    "MIN_ROWS",
    "PACK_KEYS",
    "PASSWORD",
    "ROW_FORMAT",
    "SECONDARY_ENGINE",
    "STATS_AUTO_RECALC",
    "STATS_PERSISTENT",
    "STATS_SAMPLE_PAGES",
    "TABLESPACE",
    "UNION",
];

const PARTITION_OPS: &[&str] = &[
    "TRUNCATE",
    "COALESCE",
    "REORGANIZE",
    "EXCHANGE",
    "ANALYZE",
    "CHECK",
    "OPTIMIZE",
    "REBUILD",
    "REPAIR",
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    // ----- token helpers -----

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&EOF_TOKEN)
    }

    fn next_token(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn is_keyword(token: &Token, keyword: &str) -> bool {
        matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        Self::is_keyword(self.peek(), keyword)
    }

    fn peek_nth_keyword(&self, n: usize, keyword: &str) -> bool {
        Self::is_keyword(self.peek_nth(n), keyword)
    }

    fn peek_any_keyword(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.peek_keyword(k))
    }

    fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the whole keyword sequence or nothing.
    fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        if keywords
            .iter()
            .enumerate()
            .all(|(i, k)| self.peek_nth_keyword(i, k))
        {
            self.pos += keywords.len();
            true
        } else {
            false
        }
    }

    fn parse_one_of(&mut self, keywords: &[&'static str]) -> Option<&'static str> {
        let found = keywords.iter().copied().find(|k| self.peek_keyword(k))?;
        self.pos += 1;
        Some(found)
    }

    fn expect_keyword(&mut self, keyword: &str) -> SqlResult<()> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", keyword)))
        }
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> SqlResult<()> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", token)))
        }
    }

    fn expect_end(&self) -> SqlResult<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    fn error(&self, message: &str) -> SqlError {
        let found = if self.at_end() {
            "end of statement".to_string()
        } else {
            format!("'{}'", self.peek())
        };
        SqlError::ParseError {
            message: format!("{}, found {}", message, found),
            line: self.line,
            column: 0,
        }
    }

    fn parse_identifier(&mut self) -> SqlResult<String> {
        match self.peek().clone() {
            Token::Word(w) => {
                self.pos += 1;
                Ok(w.value)
            }
            Token::DoubleQuotedString(s) => {
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    /// `[db.]name`; the database qualifier is dropped.
    fn parse_table_name(&mut self) -> SqlResult<String> {
        let mut name = self.parse_identifier()?;
        while self.consume(&Token::Period) {
            name = self.parse_identifier()?;
        }
        Ok(name)
    }

    fn parse_identifier_list(&mut self) -> SqlResult<Vec<String>> {
        self.expect(&Token::LParen)?;
        let mut names = Vec::new();
        loop {
            names.push(self.parse_table_name()?);
            if self.consume(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(names);
        }
    }

    fn parse_string(&mut self) -> SqlResult<String> {
        match self.peek().clone() {
            Token::SingleQuotedString(s)
            | Token::DoubleQuotedString(s)
            | Token::NationalStringLiteral(s) => {
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.error("expected string literal")),
        }
    }

    fn parse_u32(&mut self) -> SqlResult<u32> {
        match self.peek().clone() {
            Token::Number(n, _) => {
                let value = n
                    .parse()
                    .map_err(|_| self.error(&format!("invalid number '{}'", n)))?;
                self.pos += 1;
                Ok(value)
            }
            _ => Err(self.error("expected number")),
        }
    }

    /// Bare word (keyword or identifier) in upper case.
    fn parse_word_upper(&mut self) -> SqlResult<String> {
        match self.peek().clone() {
            Token::Word(w) => {
                self.pos += 1;
                Ok(w.value.to_ascii_uppercase())
            }
            _ => Err(self.error("expected keyword")),
        }
    }

    /// Charset or collation name, lower-cased.
    fn parse_charset_name(&mut self) -> SqlResult<String> {
        match self.peek().clone() {
            Token::SingleQuotedString(s) => {
                self.pos += 1;
                Ok(s.to_ascii_lowercase())
            }
            _ => Ok(self.parse_identifier()?.to_ascii_lowercase()),
        }
    }

    fn skip_optional_eq(&mut self) {
        self.consume(&Token::Eq);
    }

    /// Advance over tokens until, at paren depth 0, a stop keyword, a closing
    /// paren, or (optionally) a comma is reached.
    fn skip_expression(&mut self, stops: &[&str], stop_at_comma: bool) -> (usize, usize) {
        let start = self.pos;
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Comma if depth == 0 && stop_at_comma => break,
                Token::Word(_) if depth == 0 && self.peek_any_keyword(stops) => break,
                _ => {}
            }
            self.pos += 1;
        }
        (start, self.pos)
    }

    /// `( ... )` rendered without the outer parentheses.
    fn parse_parenthesized_raw(&mut self) -> SqlResult<String> {
        self.expect(&Token::LParen)?;
        let (start, end) = self.skip_expression(&[], false);
        self.expect(&Token::RParen)?;
        Ok(render_tokens(&self.tokens[start..end]))
    }

    /// Everything up to the next top-level comma, rendered.
    fn rest_of_spec(&mut self, start: usize) -> String {
        self.skip_expression(&[], true);
        render_tokens(&self.tokens[start..self.pos])
    }

    /// Everything to the end of the statement, rendered.
    fn rest_of_statement(&mut self, start: usize) -> String {
        self.consume_rest();
        render_tokens(&self.tokens[start..])
    }

    fn consume_rest(&mut self) {
        self.pos = self.tokens.len();
    }

    // ----- statements -----

    fn parse_statement(&mut self) -> SqlResult<Statement> {
        if self.consume(&Token::LParen) {
            self.consume_rest();
            return Ok(Statement::Select);
        }
        let first = self.parse_word_upper()?;
        let statement = match first.as_str() {
            "CREATE" => self.parse_create()?,
            "ALTER" => self.parse_alter()?,
            "DROP" => self.parse_drop()?,
            "RENAME" => self.parse_rename()?,
            "TRUNCATE" => {
                self.parse_keyword("TABLE");
                let table = self.parse_table_name()?;
                self.expect_end()?;
                Statement::Truncate(Truncate { table })
            }
            "INSERT" => Statement::Insert(self.parse_insert(false)?),
            "REPLACE" => Statement::Insert(self.parse_insert(true)?),
            "UPDATE" => Statement::Update(self.parse_update()?),
            "DELETE" => self.parse_delete()?,
            "SELECT" | "WITH" | "VALUES" | "TABLE" => {
                self.consume_rest();
                Statement::Select
            }
            "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" => {
                self.consume_rest();
                Statement::Show
            }
            "SET" => {
                let is_tx = self.parse_keywords(&["TRANSACTION"])
                    || self.parse_keywords(&["SESSION", "TRANSACTION"])
                    || self.parse_keywords(&["GLOBAL", "TRANSACTION"]);
                self.consume_rest();
                if is_tx {
                    Statement::Transaction(TransactionKind::SetTransaction)
                } else {
                    Statement::Set
                }
            }
            "BEGIN" | "START" => {
                self.consume_rest();
                Statement::Transaction(TransactionKind::Begin)
            }
            "COMMIT" => {
                self.consume_rest();
                Statement::Transaction(TransactionKind::Commit)
            }
            "ROLLBACK" => {
                // ROLLBACK TO SAVEPOINT is still transaction control
                self.consume_rest();
                Statement::Transaction(TransactionKind::Rollback)
            }
            "SAVEPOINT" => {
                self.consume_rest();
                Statement::Transaction(TransactionKind::Savepoint)
            }
            "RELEASE" => {
                self.consume_rest();
                Statement::Transaction(TransactionKind::Release)
            }
            _ => {
                self.consume_rest();
                Statement::Other { keyword: first }
            }
        };
        Ok(statement)
    }

    fn parse_create(&mut self) -> SqlResult<Statement> {
        let or_replace = self.parse_keywords(&["OR", "REPLACE"]);
        let temporary = self.parse_keyword("TEMPORARY");

        if self.parse_keyword("TABLE") {
            return Ok(Statement::CreateTable(self.parse_create_table(temporary)?));
        }

        let kind = match self.parse_one_of(&["UNIQUE", "FULLTEXT", "SPATIAL"]) {
            Some("UNIQUE") => Some(ConstraintKind::Unique),
            Some("FULLTEXT") => Some(ConstraintKind::Fulltext),
            Some(_) => Some(ConstraintKind::Spatial),
            None => None,
        };
        if kind.is_some() || self.peek_keyword("INDEX") {
            self.expect_keyword("INDEX")?;
            return Ok(Statement::CreateIndex(
                self.parse_create_index(kind.unwrap_or(ConstraintKind::Index))?,
            ));
        }

        if self.parse_one_of(&["DATABASE", "SCHEMA"]).is_some() {
            let if_not_exists = self.parse_keywords(&["IF", "NOT", "EXISTS"]);
            let name = self.parse_identifier()?;
            self.consume_rest();
            return Ok(Statement::CreateDatabase {
                name,
                if_not_exists,
            });
        }

        // ALGORITHM/DEFINER/SQL SECURITY may precede VIEW
        let view_at = (self.pos..self.tokens.len())
            .take_while(|&i| !Self::is_keyword(&self.tokens[i], "AS"))
            .find(|&i| Self::is_keyword(&self.tokens[i], "VIEW"));
        if let Some(at) = view_at {
            self.pos = at + 1;
            let name = self.parse_table_name()?;
            self.consume_rest();
            return Ok(Statement::CreateView { name, or_replace });
        }

        let keyword = match self.peek() {
            Token::Word(w) => format!("CREATE {}", w.value.to_ascii_uppercase()),
            _ => "CREATE".to_string(),
        };
        self.consume_rest();
        Ok(Statement::Other { keyword })
    }

    fn parse_create_table(&mut self, temporary: bool) -> SqlResult<CreateTable> {
        let if_not_exists = self.parse_keywords(&["IF", "NOT", "EXISTS"]);
        let name = self.parse_table_name()?;
        let mut table = CreateTable {
            name,
            temporary,
            if_not_exists,
            ..Default::default()
        };

        if self.parse_keyword("LIKE") {
            table.like = Some(self.parse_table_name()?);
            self.expect_end()?;
            return Ok(table);
        }
        if self.peek() == &Token::LParen && self.peek_nth_keyword(1, "LIKE") {
            self.pos += 2;
            table.like = Some(self.parse_table_name()?);
            self.expect(&Token::RParen)?;
            self.expect_end()?;
            return Ok(table);
        }

        if !self.consume(&Token::LParen) {
            return Err(self.error("expected column definitions"));
        }
        loop {
            if self.peek_any_keyword(CONSTRAINT_START) {
                table.constraints.push(self.parse_constraint()?);
            } else {
                table.columns.push(self.parse_column_def()?);
            }
            if self.consume(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            break;
        }

        table.options = self.parse_table_options()?;

        if self.peek_keyword("PARTITION") {
            self.consume_rest();
        }
        if self.peek_any_keyword(&["AS", "SELECT", "IGNORE", "REPLACE"]) {
            return Err(SqlError::UnsupportedStatement(
                "CREATE TABLE ... SELECT".to_string(),
            ));
        }
        self.expect_end()?;
        Ok(table)
    }

    fn parse_column_def(&mut self) -> SqlResult<ColumnDef> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut column = ColumnDef {
            name,
            data_type,
            ..Default::default()
        };

        loop {
            if self.parse_keywords(&["NOT", "NULL"]) {
                column.nullable = Some(false);
            } else if self.parse_keyword("NULL") {
                column.nullable = Some(true);
            } else if self.parse_keyword("DEFAULT") {
                column.default = Some(self.parse_value_expr()?);
            } else if self.parse_keywords(&["ON", "UPDATE"]) {
                column.on_update = Some(self.parse_value_expr()?);
            } else if self.parse_keyword("AUTO_INCREMENT") {
                column.auto_increment = true;
            } else if self.parse_keywords(&["PRIMARY", "KEY"]) || self.parse_keyword("KEY") {
                column.primary_key = true;
            } else if self.parse_keyword("UNIQUE") {
                self.parse_keyword("KEY");
                column.unique = true;
            } else if self.parse_keyword("COMMENT") {
                column.comment = Some(self.parse_string()?);
            } else if self.parse_keywords(&["CHARACTER", "SET"]) || self.parse_keyword("CHARSET")
            {
                column.charset = Some(self.parse_charset_name()?);
            } else if self.parse_keyword("COLLATE") {
                column.collate = Some(self.parse_charset_name()?);
            } else if self.parse_one_of(&["VISIBLE", "INVISIBLE"]).is_some() {
            } else if self.parse_one_of(&["COLUMN_FORMAT", "STORAGE"]).is_some() {
                self.parse_word_upper()?;
            } else if self.parse_keyword("SRID") {
                self.parse_u32()?;
            } else if self.parse_keywords(&["GENERATED", "ALWAYS", "AS"])
                || self.parse_keyword("AS")
            {
                self.parse_parenthesized_raw()?;
                self.parse_one_of(&["VIRTUAL", "STORED"]);
            } else if self.parse_keyword("CHECK") {
                self.parse_parenthesized_raw()?;
                self.parse_keywords(&["NOT", "ENFORCED"]);
                self.parse_keyword("ENFORCED");
            } else if self.parse_keyword("REFERENCES") {
                // Inline REFERENCES is accepted and ignored by MySQL
                self.parse_table_name()?;
                if self.peek() == &Token::LParen {
                    self.parse_identifier_list()?;
                }
                self.parse_reference_actions()?;
            } else {
                break;
            }
        }
        Ok(column)
    }

    fn parse_data_type(&mut self) -> SqlResult<DataType> {
        let mut name = self.parse_word_upper()?;
        if name == "NATIONAL" {
            name = self.parse_word_upper()?;
        }
        if name == "DOUBLE" && self.parse_keyword("PRECISION") {
            name = "DOUBLE".to_string();
        } else if name == "CHARACTER" && self.parse_keyword("VARYING") {
            name = "VARCHAR".to_string();
        } else if (name == "CHAR" || name == "CHARACTER") && self.parse_keyword("VARYING") {
            name = "VARCHAR".to_string();
        }

        let mut data_type = DataType::new(name);
        if self.consume(&Token::LParen) {
            loop {
                let arg = match self.next_token() {
                    Token::Number(n, _) => n,
                    Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => {
                        quote_string(&s)
                    }
                    _ => return Err(self.error("expected type argument")),
                };
                data_type.args.push(arg);
                if self.consume(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen)?;
                break;
            }
        }
        loop {
            if self.parse_keyword("UNSIGNED") {
                data_type.unsigned = true;
            } else if self.parse_keyword("ZEROFILL") {
                data_type.zerofill = true;
            } else if self.parse_one_of(&["SIGNED", "BINARY"]).is_some() {
            } else {
                break;
            }
        }
        Ok(data_type)
    }

    /// Default, ON UPDATE and similar single values.
    fn parse_value_expr(&mut self) -> SqlResult<Expr> {
        let token = self.next_token();
        let expr = match token {
            Token::Word(w) if w.quote_style.is_none() => {
                let word = w.value.to_ascii_uppercase();
                match word.as_str() {
                    "NULL" => Expr::Null,
                    "TRUE" => Expr::Bool(true),
                    "FALSE" => Expr::Bool(false),
                    "CURRENT_TIMESTAMP" | "NOW" | "LOCALTIME" | "LOCALTIMESTAMP" => {
                        let mut precision = None;
                        if self.consume(&Token::LParen) {
                            if !self.consume(&Token::RParen) {
                                precision = Some(self.parse_u32()?);
                                self.expect(&Token::RParen)?;
                            }
                        }
                        Expr::CurrentTimestamp(precision.filter(|p| *p > 0))
                    }
                    _ if self.peek() == &Token::LParen => {
                        let args = self.parse_parenthesized_raw()?;
                        Expr::Raw(format!("{}({})", word, args))
                    }
                    _ => Expr::Raw(word),
                }
            }
            Token::Number(n, _) => Expr::Number(n),
            Token::Minus => match self.next_token() {
                Token::Number(n, _) => Expr::Number(format!("-{}", n)),
                _ => return Err(self.error("expected number after '-'")),
            },
            Token::Plus => match self.next_token() {
                Token::Number(n, _) => Expr::Number(n),
                _ => return Err(self.error("expected number after '+'")),
            },
            Token::SingleQuotedString(s)
            | Token::DoubleQuotedString(s)
            | Token::NationalStringLiteral(s) => Expr::String(s),
            Token::HexStringLiteral(s) => Expr::Raw(format!("X'{}'", s)),
            Token::LParen => {
                let open = self.pos - 1;
                // A parenthesized literal is the literal itself: DuckDB writes `DEFAULT('x')`
                if let Ok(inner) = self.parse_value_expr() {
                    if !matches!(inner, Expr::Raw(_)) && self.consume(&Token::RParen) {
                        return Ok(inner);
                    }
                }
                self.pos = open;
                let inner = self.parse_parenthesized_raw()?;
                Expr::Raw(format!("({})", inner))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected value"));
            }
        };
        Ok(expr)
    }

    fn parse_constraint(&mut self) -> SqlResult<Constraint> {
        let mut symbol = None;
        if self.parse_keyword("CONSTRAINT")
            && !self.peek_any_keyword(&["PRIMARY", "UNIQUE", "FOREIGN", "CHECK"])
        {
            symbol = Some(self.parse_identifier()?);
        }

        if self.parse_keywords(&["PRIMARY", "KEY"]) {
            let mut constraint = Constraint::new(None, ConstraintKind::PrimaryKey, vec![]);
            self.parse_index_body(&mut constraint)?;
            return Ok(constraint);
        }

        if self.parse_keywords(&["FOREIGN", "KEY"]) {
            if self.peek() != &Token::LParen {
                // index_name; the constraint symbol names the foreign key
                self.parse_identifier()?;
            }
            let columns = self.parse_key_parts()?;
            self.expect_keyword("REFERENCES")?;
            let table = self.parse_table_name()?;
            let ref_columns = self.parse_identifier_list()?;
            let (on_delete, on_update) = self.parse_reference_actions()?;
            return Ok(Constraint::new(
                symbol,
                ConstraintKind::ForeignKey(ForeignKeyRef {
                    table,
                    columns: ref_columns,
                    on_delete,
                    on_update,
                }),
                columns,
            ));
        }

        if self.parse_keyword("CHECK") {
            let expr = self.parse_parenthesized_raw()?;
            self.parse_keywords(&["NOT", "ENFORCED"]);
            self.parse_keyword("ENFORCED");
            return Ok(Constraint::new(symbol, ConstraintKind::Check(expr), vec![]));
        }

        let kind = match self.parse_one_of(&["UNIQUE", "FULLTEXT", "SPATIAL", "KEY", "INDEX"]) {
            Some("UNIQUE") => ConstraintKind::Unique,
            Some("FULLTEXT") => ConstraintKind::Fulltext,
            Some("SPATIAL") => ConstraintKind::Spatial,
            Some(_) => ConstraintKind::Index,
            None => return Err(self.error("expected constraint")),
        };
        if kind != ConstraintKind::Index {
            self.parse_one_of(&["KEY", "INDEX"]);
        }
        let mut name = None;
        if self.peek() != &Token::LParen && !self.peek_keyword("USING") {
            name = Some(self.parse_identifier()?);
        }
        let mut constraint = Constraint::new(name.or(symbol), kind, vec![]);
        self.parse_index_body(&mut constraint)?;
        Ok(constraint)
    }

    /// `[USING type] (key_parts) [index_option ...]`
    fn parse_index_body(&mut self, constraint: &mut Constraint) -> SqlResult<()> {
        if self.parse_keyword("USING") {
            constraint.using = Some(self.parse_word_upper()?);
        }
        constraint.columns = self.parse_key_parts()?;
        self.parse_index_options(constraint)
    }

    fn parse_index_options(&mut self, constraint: &mut Constraint) -> SqlResult<()> {
        loop {
            if self.parse_keyword("USING") {
                constraint.using = Some(self.parse_word_upper()?);
            } else if self.parse_keyword("COMMENT") {
                constraint.comment = Some(self.parse_string()?);
            } else if self.parse_keyword("KEY_BLOCK_SIZE") {
                self.skip_optional_eq();
                self.parse_u32()?;
            } else if self.parse_keywords(&["WITH", "PARSER"]) {
                self.parse_identifier()?;
            } else if self.parse_one_of(&["VISIBLE", "INVISIBLE"]).is_some() {
            } else {
                return Ok(());
            }
        }
    }

    fn parse_key_parts(&mut self) -> SqlResult<Vec<KeyPart>> {
        self.expect(&Token::LParen)?;
        let mut parts = Vec::new();
        loop {
            if self.peek() == &Token::LParen {
                return Err(SqlError::UnsupportedStatement(
                    "functional key parts".to_string(),
                ));
            }
            let column = self.parse_identifier()?;
            let mut length = None;
            if self.consume(&Token::LParen) {
                length = Some(self.parse_u32()?);
                self.expect(&Token::RParen)?;
            }
            self.parse_one_of(&["ASC", "DESC"]);
            parts.push(KeyPart { column, length });
            if self.consume(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(parts);
        }
    }

    fn parse_reference_actions(&mut self) -> SqlResult<(Option<String>, Option<String>)> {
        let mut on_delete = None;
        let mut on_update = None;
        loop {
            if self.parse_keyword("MATCH") {
                self.parse_word_upper()?;
            } else if self.parse_keywords(&["ON", "DELETE"]) {
                on_delete = Some(self.parse_reference_action()?);
            } else if self.parse_keywords(&["ON", "UPDATE"]) {
                on_update = Some(self.parse_reference_action()?);
            } else {
                return Ok((on_delete, on_update));
            }
        }
    }

    fn parse_reference_action(&mut self) -> SqlResult<String> {
        if self.parse_keyword("RESTRICT") {
            Ok("RESTRICT".to_string())
        } else if self.parse_keyword("CASCADE") {
            Ok("CASCADE".to_string())
        } else if self.parse_keywords(&["SET", "NULL"]) {
            Ok("SET NULL".to_string())
        } else if self.parse_keywords(&["SET", "DEFAULT"]) {
            Ok("SET DEFAULT".to_string())
        } else if self.parse_keywords(&["NO", "ACTION"]) {
            Ok("NO ACTION".to_string())
        } else {
            Err(self.error("expected referential action"))
        }
    }

    fn parse_table_options(&mut self) -> SqlResult<Vec<TableOption>> {
        let mut options = Vec::new();
        loop {
            let save = self.pos;
            if !options.is_empty() {
                self.consume(&Token::Comma);
            }
            match self.parse_table_option()? {
                Some(option) => options.push(option),
                None => {
                    self.pos = save;
                    return Ok(options);
                }
            }
        }
    }

    fn parse_table_option(&mut self) -> SqlResult<Option<TableOption>> {
        let save = self.pos;
        self.parse_keyword("DEFAULT");
        let name = if self.parse_keywords(&["CHARACTER", "SET"]) || self.parse_keyword("CHARSET")
        {
            "CHARSET".to_string()
        } else if self.parse_keywords(&["DATA", "DIRECTORY"]) {
            "DATA DIRECTORY".to_string()
        } else if self.parse_keywords(&["INDEX", "DIRECTORY"]) {
            "INDEX DIRECTORY".to_string()
        } else if let Some(name) = self.parse_one_of(TABLE_OPTIONS) {
            name.to_string()
        } else {
            self.pos = save;
            return Ok(None);
        };
        self.skip_optional_eq();

        let value = match name.as_str() {
            "CHARSET" | "COLLATE" => Expr::Raw(self.parse_charset_name()?),
            "UNION" => Expr::Raw(format!("({})", self.parse_parenthesized_raw()?)),
            _ => match self.next_token() {
                Token::Number(n, _) => Expr::Number(n),
                Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => Expr::String(s),
                Token::Word(w) => Expr::Raw(w.value),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error(&format!("expected value for {}", name)));
                }
            },
        };
        Ok(Some(TableOption::new(name, value)))
    }

    fn parse_create_index(&mut self, kind: ConstraintKind) -> SqlResult<CreateIndex> {
        let name = self.parse_identifier()?;
        let mut constraint = Constraint::new(Some(name.clone()), kind, vec![]);
        if self.parse_keyword("USING") {
            constraint.using = Some(self.parse_word_upper()?);
        }
        self.expect_keyword("ON")?;
        let table = self.parse_table_name()?;
        constraint.columns = self.parse_key_parts()?;
        self.parse_index_options(&mut constraint)?;
        self.parse_lock_algorithm()?;
        self.expect_end()?;
        Ok(CreateIndex {
            name,
            table,
            kind: constraint.kind,
            columns: constraint.columns,
        })
    }

    /// Trailing `ALGORITHM [=] x` / `LOCK [=] x` of CREATE/DROP INDEX.
    fn parse_lock_algorithm(&mut self) -> SqlResult<()> {
        while self.parse_one_of(&["ALGORITHM", "LOCK"]).is_some() {
            self.skip_optional_eq();
            self.parse_word_upper()?;
        }
        Ok(())
    }

    fn parse_alter(&mut self) -> SqlResult<Statement> {
        self.parse_one_of(&["ONLINE", "OFFLINE"]);
        self.parse_keyword("IGNORE");
        if self.parse_keyword("TABLE") {
            return Ok(Statement::AlterTable(self.parse_alter_table()?));
        }
        if self.parse_one_of(&["DATABASE", "SCHEMA"]).is_some() {
            let name = match self.peek() {
                Token::Word(w)
                    if !Self::is_keyword(self.peek(), "DEFAULT")
                        && !Self::is_keyword(self.peek(), "CHARACTER")
                        && !Self::is_keyword(self.peek(), "CHARSET")
                        && !Self::is_keyword(self.peek(), "COLLATE") =>
                {
                    w.value.clone()
                }
                _ => String::new(),
            };
            self.consume_rest();
            return Ok(Statement::AlterDatabase { name });
        }
        let keyword = match self.peek() {
            Token::Word(w) => format!("ALTER {}", w.value.to_ascii_uppercase()),
            _ => "ALTER".to_string(),
        };
        self.consume_rest();
        Ok(Statement::Other { keyword })
    }

    fn parse_alter_table(&mut self) -> SqlResult<AlterTable> {
        let name = self.parse_table_name()?;
        let mut specs = Vec::new();
        while !self.at_end() {
            if self.peek_keyword("PARTITION") || self.peek_keyword("REMOVE") {
                let start = self.pos;
                specs.push(AlterSpec::Partition(self.rest_of_statement(start)));
                break;
            }
            specs.push(self.parse_alter_spec()?);
            if self.consume(&Token::Comma) {
                continue;
            }
            if !self.at_end() && !self.peek_keyword("PARTITION") && !self.peek_keyword("REMOVE") {
                return Err(self.error("expected ',' between ALTER TABLE specifications"));
            }
        }
        Ok(AlterTable { name, specs })
    }

    fn parse_alter_spec(&mut self) -> SqlResult<AlterSpec> {
        let options = self.parse_table_options()?;
        if !options.is_empty() {
            return Ok(AlterSpec::Options(options));
        }

        let start = self.pos;
        let keyword = self.parse_word_upper()?;
        let spec = match keyword.as_str() {
            "ADD" => {
                if self.peek_keyword("PARTITION") {
                    AlterSpec::Partition(self.rest_of_statement(start))
                } else if self.parse_keyword("COLUMN") || !self.peek_any_keyword(CONSTRAINT_START)
                {
                    if self.consume(&Token::LParen) {
                        let mut columns = Vec::new();
                        loop {
                            columns.push(self.parse_column_def()?);
                            if self.consume(&Token::Comma) {
                                continue;
                            }
                            self.expect(&Token::RParen)?;
                            break;
                        }
                        AlterSpec::AddColumns {
                            columns,
                            position: None,
                        }
                    } else {
                        let column = self.parse_column_def()?;
                        let position = self.parse_column_position()?;
                        AlterSpec::AddColumns {
                            columns: vec![column],
                            position,
                        }
                    }
                } else {
                    AlterSpec::AddConstraint(self.parse_constraint()?)
                }
            }
            "ALGORITHM" => {
                self.skip_optional_eq();
                AlterSpec::Algorithm(self.parse_word_upper()?)
            }
            "LOCK" => {
                self.skip_optional_eq();
                AlterSpec::Lock(self.parse_word_upper()?)
            }
            "ALTER" => {
                if self.parse_keyword("INDEX") {
                    let name = self.parse_identifier()?;
                    let visible = match self.parse_one_of(&["VISIBLE", "INVISIBLE"]) {
                        Some("VISIBLE") => true,
                        Some(_) => false,
                        None => return Err(self.error("expected VISIBLE or INVISIBLE")),
                    };
                    AlterSpec::IndexVisibility { name, visible }
                } else if self.parse_one_of(&["CHECK", "CONSTRAINT"]).is_some() {
                    let name = self.parse_identifier()?;
                    let enforced = !self.parse_keyword("NOT");
                    self.expect_keyword("ENFORCED")?;
                    AlterSpec::CheckEnforcement { name, enforced }
                } else {
                    self.parse_keyword("COLUMN");
                    let name = self.parse_identifier()?;
                    let action = if self.parse_keywords(&["SET", "DEFAULT"]) {
                        AlterColumnAction::SetDefault(self.parse_value_expr()?)
                    } else if self.parse_keywords(&["DROP", "DEFAULT"]) {
                        AlterColumnAction::DropDefault
                    } else if self.parse_keywords(&["SET", "VISIBLE"]) {
                        AlterColumnAction::SetVisible(true)
                    } else if self.parse_keywords(&["SET", "INVISIBLE"]) {
                        AlterColumnAction::SetVisible(false)
                    } else {
                        return Err(self.error("expected SET DEFAULT or DROP DEFAULT"));
                    };
                    AlterSpec::AlterColumn { name, action }
                }
            }
            "CHANGE" => {
                self.parse_keyword("COLUMN");
                let old_name = self.parse_identifier()?;
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                AlterSpec::ChangeColumn {
                    old_name,
                    column,
                    position,
                }
            }
            "MODIFY" => {
                self.parse_keyword("COLUMN");
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                AlterSpec::ModifyColumn { column, position }
            }
            "CONVERT" => {
                self.expect_keyword("TO")?;
                if !(self.parse_keywords(&["CHARACTER", "SET"]) || self.parse_keyword("CHARSET")) {
                    return Err(self.error("expected CHARACTER SET"));
                }
                let charset = self.parse_charset_name()?;
                let collate = if self.parse_keyword("COLLATE") {
                    Some(self.parse_charset_name()?)
                } else {
                    None
                };
                AlterSpec::ConvertCharset { charset, collate }
            }
            "DISABLE" | "ENABLE" => {
                self.expect_keyword("KEYS")?;
                AlterSpec::Keys {
                    enable: keyword == "ENABLE",
                }
            }
            "DISCARD" | "IMPORT" => {
                if self.peek_keyword("TABLESPACE") {
                    AlterSpec::Tablespace(self.rest_of_spec(start))
                } else {
                    AlterSpec::Partition(self.rest_of_statement(start))
                }
            }
            "DROP" => {
                if self.parse_keywords(&["PRIMARY", "KEY"]) {
                    AlterSpec::DropPrimaryKey
                } else if self.parse_one_of(&["INDEX", "KEY"]).is_some() {
                    AlterSpec::DropIndex(self.parse_identifier()?)
                } else if self.parse_keywords(&["FOREIGN", "KEY"]) {
                    AlterSpec::DropForeignKey(self.parse_identifier()?)
                } else if self.parse_one_of(&["CHECK", "CONSTRAINT"]).is_some() {
                    AlterSpec::DropCheck(self.parse_identifier()?)
                } else if self.peek_keyword("PARTITION") {
                    AlterSpec::Partition(self.rest_of_statement(start))
                } else {
                    self.parse_keyword("COLUMN");
                    let name = self.parse_identifier()?;
                    self.parse_one_of(&["RESTRICT", "CASCADE"]);
                    AlterSpec::DropColumn(name)
                }
            }
            "FORCE" => AlterSpec::Force,
            "ORDER" => {
                self.expect_keyword("BY")?;
                let mut columns = Vec::new();
                loop {
                    columns.push(self.parse_identifier()?);
                    self.parse_one_of(&["ASC", "DESC"]);
                    // A comma may also start the next specification
                    if self.peek() == &Token::Comma
                        && matches!(self.peek_nth(1), Token::Word(_))
                        && !self.peek_nth_is_spec_start(1)
                    {
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
                AlterSpec::OrderBy(columns)
            }
            "RENAME" => {
                if self.parse_keyword("COLUMN") {
                    let old_name = self.parse_identifier()?;
                    self.expect_keyword("TO")?;
                    let new_name = self.parse_identifier()?;
                    AlterSpec::RenameColumn { old_name, new_name }
                } else if self.parse_one_of(&["INDEX", "KEY"]).is_some() {
                    let old_name = self.parse_identifier()?;
                    self.expect_keyword("TO")?;
                    let new_name = self.parse_identifier()?;
                    AlterSpec::RenameIndex { old_name, new_name }
                } else {
                    self.parse_one_of(&["TO", "AS"]);
                    AlterSpec::RenameTable(self.parse_table_name()?)
                }
            }
            "WITH" | "WITHOUT" => {
                self.expect_keyword("VALIDATION")?;
                AlterSpec::Validation(keyword == "WITH")
            }
            "SECONDARY_LOAD" => AlterSpec::SecondaryLoad,
            "SECONDARY_UNLOAD" => AlterSpec::SecondaryUnload,
            op if PARTITION_OPS.contains(&op) && self.peek_keyword("PARTITION") => {
                AlterSpec::Partition(self.rest_of_statement(start))
            }
            _ => {
                self.pos = start;
                return Err(self.error("unsupported ALTER TABLE specification"));
            }
        };
        Ok(spec)
    }

    fn peek_nth_is_spec_start(&self, n: usize) -> bool {
        const SPEC_START: &[&str] = &[
            "ADD", "ALGORITHM", "LOCK", "ALTER", "CHANGE", "MODIFY", "CONVERT", "DISABLE",
            "ENABLE", "DISCARD", "IMPORT", "DROP", "FORCE", "ORDER", "RENAME", "WITH",
            "WITHOUT", "ENGINE", "DEFAULT", "COMMENT",
        ];
        SPEC_START.iter().any(|k| self.peek_nth_keyword(n, k))
    }

    fn parse_column_position(&mut self) -> SqlResult<Option<ColumnPosition>> {
        if self.parse_keyword("FIRST") {
            Ok(Some(ColumnPosition::First))
        } else if self.parse_keyword("AFTER") {
            Ok(Some(ColumnPosition::After(self.parse_identifier()?)))
        } else {
            Ok(None)
        }
    }

    fn parse_drop(&mut self) -> SqlResult<Statement> {
        let temporary = self.parse_keyword("TEMPORARY");
        if self.parse_keyword("TABLE") {
            let if_exists = self.parse_keywords(&["IF", "EXISTS"]);
            let mut names = vec![self.parse_table_name()?];
            while self.consume(&Token::Comma) {
                names.push(self.parse_table_name()?);
            }
            self.parse_one_of(&["RESTRICT", "CASCADE"]);
            self.expect_end()?;
            return Ok(Statement::DropTable(DropTable {
                names,
                if_exists,
                temporary,
            }));
        }
        if self.parse_keyword("INDEX") {
            let name = self.parse_identifier()?;
            self.expect_keyword("ON")?;
            let table = self.parse_table_name()?;
            self.parse_lock_algorithm()?;
            self.expect_end()?;
            return Ok(Statement::DropIndex(DropIndex { name, table }));
        }
        if self.parse_one_of(&["DATABASE", "SCHEMA"]).is_some() {
            let if_exists = self.parse_keywords(&["IF", "EXISTS"]);
            let name = self.parse_identifier()?;
            self.expect_end()?;
            return Ok(Statement::DropDatabase { name, if_exists });
        }
        if self.parse_keyword("VIEW") {
            let if_exists = self.parse_keywords(&["IF", "EXISTS"]);
            let mut names = vec![self.parse_table_name()?];
            while self.consume(&Token::Comma) {
                names.push(self.parse_table_name()?);
            }
            self.consume_rest();
            return Ok(Statement::DropView { names, if_exists });
        }
        let keyword = match self.peek() {
            Token::Word(w) => format!("DROP {}", w.value.to_ascii_uppercase()),
            _ => "DROP".to_string(),
        };
        self.consume_rest();
        Ok(Statement::Other { keyword })
    }

    fn parse_rename(&mut self) -> SqlResult<Statement> {
        if !self.parse_keyword("TABLE") {
            self.consume_rest();
            return Ok(Statement::Other {
                keyword: "RENAME".to_string(),
            });
        }
        let mut pairs = Vec::new();
        loop {
            let from = self.parse_table_name()?;
            self.expect_keyword("TO")?;
            let to = self.parse_table_name()?;
            pairs.push((from, to));
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect_end()?;
        Ok(Statement::RenameTable(RenameTable { pairs }))
    }

    fn parse_insert(&mut self, replace: bool) -> SqlResult<Insert> {
        while self
            .parse_one_of(&["LOW_PRIORITY", "DELAYED", "HIGH_PRIORITY", "IGNORE"])
            .is_some()
        {}
        self.parse_keyword("INTO");
        let mut insert = Insert {
            table: self.parse_table_name()?,
            replace,
            ..Default::default()
        };
        if self.parse_keyword("PARTITION") {
            self.parse_parenthesized_raw()?;
        }
        if self.peek() == &Token::LParen
            && !self.peek_nth_keyword(1, "SELECT")
            && !self.peek_nth_keyword(1, "WITH")
        {
            insert.columns = self.parse_identifier_list()?;
        }
        if self.parse_keyword("SET") {
            insert.set_form = true;
            insert.columns = self.parse_assignment_columns(&["ON"])?;
        } else {
            self.skip_expression(&["ON"], false);
        }
        if self.parse_keywords(&["ON", "DUPLICATE", "KEY", "UPDATE"]) {
            insert.on_duplicate = self.parse_assignment_columns(&[])?;
        }
        self.consume_rest();
        Ok(insert)
    }

    fn parse_update(&mut self) -> SqlResult<Update> {
        while self.parse_one_of(&["LOW_PRIORITY", "IGNORE"]).is_some() {}
        let table = self.parse_table_name()?;
        self.skip_expression(&["SET"], false);
        self.expect_keyword("SET")?;
        let assignments = self.parse_assignment_columns(&["WHERE", "ORDER", "LIMIT"])?;
        self.consume_rest();
        Ok(Update { table, assignments })
    }

    fn parse_delete(&mut self) -> SqlResult<Statement> {
        while self
            .parse_one_of(&["LOW_PRIORITY", "QUICK", "IGNORE"])
            .is_some()
        {}
        self.parse_keyword("FROM");
        let table = self.parse_table_name()?;
        self.consume_rest();
        Ok(Statement::Delete { table })
    }

    /// `col = expr, ...` returning the assigned column names.
    fn parse_assignment_columns(&mut self, stops: &[&str]) -> SqlResult<Vec<String>> {
        let mut columns = Vec::new();
        loop {
            let column = self.parse_table_name()?;
            if !(self.consume(&Token::Eq) || self.consume(&Token::Assignment)) {
                return Err(self.error("expected '='"));
            }
            self.skip_expression(stops, true);
            columns.push(column);
            if !self.consume(&Token::Comma) {
                return Ok(columns);
            }
        }
    }
}

fn render_token(token: &Token) -> String {
    match token {
        Token::SingleQuotedString(s) => quote_string(s),
        other => other.to_string(),
    }
}

/// Render tokens back to SQL text with conventional spacing.
fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        let glue = matches!(token, Token::RParen | Token::Comma | Token::Period)
            || matches!(prev, Some(Token::LParen | Token::Period) | None)
            || (matches!(token, Token::LParen) && matches!(prev, Some(Token::Word(_))));
        if !glue {
            out.push(' ');
        }
        out.push_str(&render_token(token));
        prev = Some(token);
    }
    out
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;

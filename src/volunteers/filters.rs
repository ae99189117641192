//! Query-string filters for the hierarchy listings, compiled to SQL.
//!
//! Name filters are case-insensitive exact matches; `search` is a
//! case-insensitive substring match over the listed columns.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use time::Date;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WingFilter {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelFilter {
    pub wing: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignationFilter {
    pub wing: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolunteerFilter {
    pub wing: Option<String>,
    pub level: Option<String>,
    pub designation: Option<String>,
    pub joined_date_after: Option<Date>,
    pub joined_date_before: Option<Date>,
    pub search: Option<String>,
}

/// `%term%` with LIKE metacharacters escaped.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn name_eq(qb: &mut QueryBuilder<'static, Postgres>, column: &str, value: Option<String>) {
    if let Some(v) = present(value) {
        qb.push(format!(" AND LOWER({column}) = LOWER("))
            .push_bind(v)
            .push(")");
    }
}

fn search_any(qb: &mut QueryBuilder<'static, Postgres>, columns: &[&str], term: Option<String>) {
    let Some(term) = present(term) else {
        return;
    };
    let pattern = like_pattern(&term);
    qb.push(" AND (");
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("{col} ILIKE ")).push_bind(pattern.clone());
    }
    qb.push(")");
}

fn page(qb: &mut QueryBuilder<'static, Postgres>, order_by: &str, limit: i64, offset: i64) {
    qb.push(format!(" ORDER BY {order_by} LIMIT "))
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
}

pub fn wings_query(f: WingFilter, limit: i64, offset: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT w.id, w.name, w.description FROM wings w WHERE TRUE");
    search_any(&mut qb, &["w.name", "w.description"], f.search);
    page(&mut qb, "w.id", limit, offset);
    qb
}

pub fn levels_query(f: LevelFilter, limit: i64, offset: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT l.id, l.wing_id, l.name, l.description \
         FROM levels l JOIN wings w ON w.id = l.wing_id WHERE TRUE",
    );
    name_eq(&mut qb, "w.name", f.wing);
    search_any(&mut qb, &["l.name"], f.search);
    page(&mut qb, "l.id", limit, offset);
    qb
}

/// Wing filter goes through the designation's level.
pub fn designations_query(
    f: DesignationFilter,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT d.id, d.level_id, d.title, d.description \
         FROM designations d \
         JOIN levels l ON l.id = d.level_id \
         JOIN wings w ON w.id = l.wing_id WHERE TRUE",
    );
    name_eq(&mut qb, "w.name", f.wing);
    name_eq(&mut qb, "l.name", f.level);
    search_any(&mut qb, &["d.title"], f.search);
    page(&mut qb, "d.id", limit, offset);
    qb
}

pub fn volunteers_query(
    f: VolunteerFilter,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT v.id, v.account_id, v.wing_id, v.level_id, v.designation_id, \
                v.phone_number, v.joined_date, v.is_active \
         FROM volunteers v \
         JOIN wings w ON w.id = v.wing_id \
         JOIN levels l ON l.id = v.level_id \
         JOIN designations d ON d.id = v.designation_id \
         JOIN users u ON u.id = v.account_id WHERE TRUE",
    );
    name_eq(&mut qb, "w.name", f.wing);
    name_eq(&mut qb, "l.name", f.level);
    name_eq(&mut qb, "d.title", f.designation);
    if let Some(after) = f.joined_date_after {
        qb.push(" AND v.joined_date >= ").push_bind(after);
    }
    if let Some(before) = f.joined_date_before {
        qb.push(" AND v.joined_date <= ").push_bind(before);
    }
    search_any(&mut qb, &["u.name", "v.phone_number"], f.search);
    page(&mut qb, "v.joined_date DESC, v.id", limit, offset);
    qb
}

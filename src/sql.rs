use chrono::{NaiveDate, NaiveDateTime};
use sqlparser::ast::{
    self, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value,
    ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::model::*;

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertClient {
        name: String,
        email: String,
        phone: String,
        company: String,
        returning_id: bool,
    },
    UpdateClient {
        id: i32,
        patch: ClientPatch,
    },
    DeleteClient {
        id: i32,
    },
    InsertVenue {
        name: String,
        address: String,
        capacity: u32,
        price_per_hour: f64,
        amenities: Vec<String>,
        returning_id: bool,
    },
    UpdateVenue {
        id: i32,
        patch: VenuePatch,
    },
    DeleteVenue {
        id: i32,
    },
    InsertVendor {
        name: String,
        category: String,
        email: String,
        phone: String,
        returning_id: bool,
    },
    UpdateVendor {
        id: i32,
        patch: VendorPatch,
    },
    DeleteVendor {
        id: i32,
    },
    InsertBooking {
        draft: BookingDraft,
        returning_id: bool,
    },
    UpdateBooking {
        id: i32,
        patch: BookingPatch,
    },
    DeleteBooking {
        id: i32,
    },
    SelectClients {
        id: Option<i32>,
    },
    SelectVenues {
        id: Option<i32>,
    },
    SelectVendors {
        id: Option<i32>,
    },
    SelectBookings {
        id: Option<i32>,
        venue_id: Option<i32>,
    },
    /// Read of the virtual `conflicts` table: an advisory probe of a
    /// proposed window against a venue's existing bookings.
    SelectConflicts {
        venue_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_booking_id: Option<i32>,
    },
    /// Read of the virtual `availability` table: free slots for a venue
    /// on a date.
    SelectAvailability {
        venue_id: i32,
        date: NaiveDate,
    },
    Listen {
        channel: String,
    },
    /// `UNLISTEN *` carries no channel.
    Unlisten {
        channel: Option<String>,
    },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    // LISTEN/UNLISTEN are dispatched before the parser; their channel
    // names are not SQL identifiers.
    let trimmed = sql.trim();
    let upper = trimmed.to_uppercase();
    if upper.starts_with("LISTEN ") {
        let channel = trimmed[7..].trim().trim_matches(';').to_string();
        return Ok(Command::Listen { channel });
    }
    if upper == "UNLISTEN" || upper == "UNLISTEN;" || upper.starts_with("UNLISTEN ") {
        let rest = trimmed[8..].trim().trim_matches(';').trim();
        let channel = match rest {
            "" | "*" => None,
            name => Some(name.to_string()),
        };
        return Ok(Command::Unlisten { channel });
    }

    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

// ── INSERT ────────────────────────────────────────────────────

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let columns: Vec<String> = insert
        .columns
        .iter()
        .map(|c| c.value.to_lowercase())
        .collect();
    if columns.is_empty() {
        return Err(SqlError::MissingColumns(table));
    }
    let values = extract_insert_values(insert)?;
    if values.len() != columns.len() {
        return Err(SqlError::WrongArity(table, columns.len(), values.len()));
    }
    let returning_id = parse_returning(&insert.returning)?;
    let fields: Vec<(&str, &Expr)> = columns
        .iter()
        .map(String::as_str)
        .zip(values.iter())
        .collect();

    match table.as_str() {
        "clients" => {
            let mut name = None;
            let (mut email, mut phone, mut company) =
                (String::new(), String::new(), String::new());
            for (col, expr) in fields {
                match col {
                    "name" => name = Some(parse_string(expr)?),
                    "email" => email = parse_string(expr)?,
                    "phone" => phone = parse_string(expr)?,
                    "company" => company = parse_string(expr)?,
                    _ => return Err(SqlError::UnknownColumn(col.to_string())),
                }
            }
            Ok(Command::InsertClient {
                name: name.ok_or(SqlError::MissingColumn("name"))?,
                email,
                phone,
                company,
                returning_id,
            })
        }
        "venues" => {
            let mut name = None;
            let mut address = String::new();
            let mut capacity = 0u32;
            let mut price_per_hour = 0.0f64;
            let mut amenities = Vec::new();
            for (col, expr) in fields {
                match col {
                    "name" => name = Some(parse_string(expr)?),
                    "address" => address = parse_string(expr)?,
                    "capacity" => capacity = parse_u32(expr)?,
                    "price_per_hour" => price_per_hour = parse_f64(expr)?,
                    "amenities" => amenities = split_amenities(&parse_string(expr)?),
                    _ => return Err(SqlError::UnknownColumn(col.to_string())),
                }
            }
            Ok(Command::InsertVenue {
                name: name.ok_or(SqlError::MissingColumn("name"))?,
                address,
                capacity,
                price_per_hour,
                amenities,
                returning_id,
            })
        }
        "vendors" => {
            let mut name = None;
            let (mut category, mut email, mut phone) =
                (String::new(), String::new(), String::new());
            for (col, expr) in fields {
                match col {
                    "name" => name = Some(parse_string(expr)?),
                    "category" => category = parse_string(expr)?,
                    "email" => email = parse_string(expr)?,
                    "phone" => phone = parse_string(expr)?,
                    _ => return Err(SqlError::UnknownColumn(col.to_string())),
                }
            }
            Ok(Command::InsertVendor {
                name: name.ok_or(SqlError::MissingColumn("name"))?,
                category,
                email,
                phone,
                returning_id,
            })
        }
        "bookings" => {
            let (mut client_id, mut venue_id, mut start, mut end) = (None, None, None, None);
            let mut vendor_id = None;
            let mut event_type = String::new();
            let mut guest_count = 0u32;
            let mut catering_required = false;
            let mut budget = 0.0f64;
            let mut notes = String::new();
            let mut status = BookingStatus::default();
            for (col, expr) in fields {
                match col {
                    "client_id" => client_id = Some(parse_i32(expr)?),
                    "venue_id" => venue_id = Some(parse_i32(expr)?),
                    "vendor_id" => vendor_id = parse_i32_or_null(expr)?,
                    "event_type" => event_type = parse_string(expr)?,
                    "start_datetime" => start = Some(parse_datetime(expr)?),
                    "end_datetime" => end = Some(parse_datetime(expr)?),
                    "guest_count" => guest_count = parse_u32(expr)?,
                    "catering_required" => catering_required = parse_bool(expr)?,
                    "budget" => budget = parse_f64(expr)?,
                    "notes" => notes = parse_string(expr)?,
                    "status" => status = BookingStatus::parse(&parse_string(expr)?),
                    _ => return Err(SqlError::UnknownColumn(col.to_string())),
                }
            }
            let draft = BookingDraft {
                client_id: client_id.ok_or(SqlError::MissingColumn("client_id"))?,
                venue_id: venue_id.ok_or(SqlError::MissingColumn("venue_id"))?,
                vendor_id,
                event_type,
                start_datetime: start.ok_or(SqlError::MissingColumn("start_datetime"))?,
                end_datetime: end.ok_or(SqlError::MissingColumn("end_datetime"))?,
                guest_count,
                catering_required,
                budget,
                notes,
                status,
            };
            Ok(Command::InsertBooking {
                draft,
                returning_id,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_returning(returning: &Option<Vec<ast::SelectItem>>) -> Result<bool, SqlError> {
    let Some(items) = returning else {
        return Ok(false);
    };
    if items.len() == 1 {
        match &items[0] {
            ast::SelectItem::UnnamedExpr(Expr::Identifier(ident))
                if ident.value.eq_ignore_ascii_case("id") =>
            {
                return Ok(true);
            }
            ast::SelectItem::Wildcard(_) => return Ok(true),
            _ => {}
        }
    }
    Err(SqlError::Unsupported("RETURNING supports only id".into()))
}

// ── UPDATE ────────────────────────────────────────────────────

fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(&table.relation)?;
    let id = extract_where_id(selection)?;

    match table.as_str() {
        "clients" => {
            let mut patch = ClientPatch::default();
            for a in assignments {
                let col = assignment_column(a)?;
                match col.as_str() {
                    "name" => patch.name = Some(parse_string(&a.value)?),
                    "email" => patch.email = Some(parse_string(&a.value)?),
                    "phone" => patch.phone = Some(parse_string(&a.value)?),
                    "company" => patch.company = Some(parse_string(&a.value)?),
                    _ => return Err(SqlError::UnknownColumn(col)),
                }
            }
            Ok(Command::UpdateClient { id, patch })
        }
        "venues" => {
            let mut patch = VenuePatch::default();
            for a in assignments {
                let col = assignment_column(a)?;
                match col.as_str() {
                    "name" => patch.name = Some(parse_string(&a.value)?),
                    "address" => patch.address = Some(parse_string(&a.value)?),
                    "capacity" => patch.capacity = Some(parse_u32(&a.value)?),
                    "price_per_hour" => patch.price_per_hour = Some(parse_f64(&a.value)?),
                    "amenities" => {
                        patch.amenities = Some(split_amenities(&parse_string(&a.value)?))
                    }
                    _ => return Err(SqlError::UnknownColumn(col)),
                }
            }
            Ok(Command::UpdateVenue { id, patch })
        }
        "vendors" => {
            let mut patch = VendorPatch::default();
            for a in assignments {
                let col = assignment_column(a)?;
                match col.as_str() {
                    "name" => patch.name = Some(parse_string(&a.value)?),
                    "category" => patch.category = Some(parse_string(&a.value)?),
                    "email" => patch.email = Some(parse_string(&a.value)?),
                    "phone" => patch.phone = Some(parse_string(&a.value)?),
                    _ => return Err(SqlError::UnknownColumn(col)),
                }
            }
            Ok(Command::UpdateVendor { id, patch })
        }
        "bookings" => {
            let mut patch = BookingPatch::default();
            for a in assignments {
                let col = assignment_column(a)?;
                match col.as_str() {
                    "client_id" => patch.client_id = Some(parse_i32(&a.value)?),
                    "venue_id" => patch.venue_id = Some(parse_i32(&a.value)?),
                    // SET vendor_id = NULL clears the vendor.
                    "vendor_id" => patch.vendor_id = Some(parse_i32_or_null(&a.value)?),
                    "event_type" => patch.event_type = Some(parse_string(&a.value)?),
                    "start_datetime" => patch.start_datetime = Some(parse_datetime(&a.value)?),
                    "end_datetime" => patch.end_datetime = Some(parse_datetime(&a.value)?),
                    "guest_count" => patch.guest_count = Some(parse_u32(&a.value)?),
                    "catering_required" => {
                        patch.catering_required = Some(parse_bool(&a.value)?)
                    }
                    "budget" => patch.budget = Some(parse_f64(&a.value)?),
                    "notes" => patch.notes = Some(parse_string(&a.value)?),
                    "status" => {
                        patch.status = Some(BookingStatus::parse(&parse_string(&a.value)?))
                    }
                    _ => return Err(SqlError::UnknownColumn(col)),
                }
            }
            Ok(Command::UpdateBooking { id, patch })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn assignment_column(a: &ast::Assignment) -> Result<String, SqlError> {
    match &a.target {
        ast::AssignmentTarget::ColumnName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))
        }
        _ => Err(SqlError::Parse("unsupported assignment target".into())),
    }
}

// ── DELETE ────────────────────────────────────────────────────

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    let id = extract_where_id(&delete.selection)?;

    match table.as_str() {
        "clients" => Ok(Command::DeleteClient { id }),
        "venues" => Ok(Command::DeleteVenue { id }),
        "vendors" => Ok(Command::DeleteVendor { id }),
        "bookings" => Ok(Command::DeleteBooking { id }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── SELECT ────────────────────────────────────────────────────

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    match table.as_str() {
        "clients" => Ok(Command::SelectClients {
            id: selection_id(select.selection.as_ref())?,
        }),
        "venues" => Ok(Command::SelectVenues {
            id: selection_id(select.selection.as_ref())?,
        }),
        "vendors" => Ok(Command::SelectVendors {
            id: selection_id(select.selection.as_ref())?,
        }),
        "bookings" => {
            let (mut id, mut venue_id) = (None, None);
            if let Some(selection) = &select.selection {
                extract_booking_filters(selection, &mut id, &mut venue_id)?;
            }
            Ok(Command::SelectBookings { id, venue_id })
        }
        "conflicts" => {
            let (mut venue_id, mut start, mut end, mut exclude) = (None, None, None, None);
            if let Some(selection) = &select.selection {
                extract_conflict_filters(selection, &mut venue_id, &mut start, &mut end, &mut exclude)?;
            }
            Ok(Command::SelectConflicts {
                venue_id: venue_id.ok_or(SqlError::MissingFilter("venue_id"))?,
                start: start.ok_or(SqlError::MissingFilter("start"))?,
                end: end.ok_or(SqlError::MissingFilter("end"))?,
                exclude_booking_id: exclude,
            })
        }
        "availability" => {
            let (mut venue_id, mut date) = (None, None);
            if let Some(selection) = &select.selection {
                extract_availability_filters(selection, &mut venue_id, &mut date)?;
            }
            Ok(Command::SelectAvailability {
                venue_id: venue_id.ok_or(SqlError::MissingFilter("venue_id"))?,
                date: date.ok_or(SqlError::MissingFilter("date"))?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn selection_id(selection: Option<&Expr>) -> Result<Option<i32>, SqlError> {
    let mut id = None;
    if let Some(expr) = selection {
        extract_id_filter(expr, &mut id)?;
    }
    Ok(id)
}

fn extract_id_filter(expr: &Expr, id: &mut Option<i32>) -> Result<(), SqlError> {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                extract_id_filter(left, id)?;
                extract_id_filter(right, id)?;
            }
            ast::BinaryOperator::Eq => {
                if expr_column_name(left).as_deref() == Some("id") {
                    *id = Some(parse_i32(right)?);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn extract_booking_filters(
    expr: &Expr,
    id: &mut Option<i32>,
    venue_id: &mut Option<i32>,
) -> Result<(), SqlError> {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                extract_booking_filters(left, id, venue_id)?;
                extract_booking_filters(right, id, venue_id)?;
            }
            ast::BinaryOperator::Eq => match expr_column_name(left).as_deref() {
                Some("id") => *id = Some(parse_i32(right)?),
                Some("venue_id") => *venue_id = Some(parse_i32(right)?),
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

/// The window bounds accept both `start = ts` and `start >= ts` (and the
/// mirrored forms for `end`); the probe is over the literal window either
/// way.
fn extract_conflict_filters(
    expr: &Expr,
    venue_id: &mut Option<i32>,
    start: &mut Option<NaiveDateTime>,
    end: &mut Option<NaiveDateTime>,
    exclude: &mut Option<i32>,
) -> Result<(), SqlError> {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                extract_conflict_filters(left, venue_id, start, end, exclude)?;
                extract_conflict_filters(right, venue_id, start, end, exclude)?;
            }
            ast::BinaryOperator::Eq => match expr_column_name(left).as_deref() {
                Some("venue_id") => *venue_id = Some(parse_i32(right)?),
                Some("start" | "start_datetime") => *start = Some(parse_datetime(right)?),
                Some("end" | "end_datetime") => *end = Some(parse_datetime(right)?),
                Some("exclude_booking_id") => *exclude = Some(parse_i32(right)?),
                _ => {}
            },
            ast::BinaryOperator::GtEq => {
                if matches!(
                    expr_column_name(left).as_deref(),
                    Some("start" | "start_datetime")
                ) {
                    *start = Some(parse_datetime(right)?);
                }
            }
            ast::BinaryOperator::LtEq => {
                if matches!(
                    expr_column_name(left).as_deref(),
                    Some("end" | "end_datetime")
                ) {
                    *end = Some(parse_datetime(right)?);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn extract_availability_filters(
    expr: &Expr,
    venue_id: &mut Option<i32>,
    date: &mut Option<NaiveDate>,
) -> Result<(), SqlError> {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                extract_availability_filters(left, venue_id, date)?;
                extract_availability_filters(right, venue_id, date)?;
            }
            ast::BinaryOperator::Eq => match expr_column_name(left).as_deref() {
                Some("venue_id") => *venue_id = Some(parse_i32(right)?),
                Some("date") => *date = Some(parse_date(right)?),
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.len() {
            0 => Err(SqlError::Parse("empty VALUES".into())),
            1 => Ok(values.rows[0].clone()),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn extract_where_id(selection: &Option<Expr>) -> Result<i32, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter("id"))?;
    match sel {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } => {
            if expr_column_name(left).as_deref() == Some("id") {
                parse_i32(right)
            } else {
                Err(SqlError::MissingFilter("id"))
            }
        }
        _ => Err(SqlError::MissingFilter("id")),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::SingleQuotedString(s) => Ok(s.clone()),
            _ => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_i64_expr(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad integer: {e}"))),
            Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad integer: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64_expr(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_i32(expr: &Expr) -> Result<i32, SqlError> {
    let v = parse_i64_expr(expr)?;
    i32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of id range")))
}

fn parse_i32_or_null(expr: &Expr) -> Result<Option<i32>, SqlError> {
    if let Some(Value::Null) = extract_value(expr) {
        return Ok(None);
    }
    Ok(Some(parse_i32(expr)?))
}

fn parse_u32(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64_expr(expr)?;
    u32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of u32 range")))
}

fn parse_f64(expr: &Expr) -> Result<f64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad number: {e}"))),
            Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad number: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_f64(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::SingleQuotedString(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
            },
            Value::Number(n, _) => Ok(n != "0"),
            _ => Err(SqlError::Parse(format!("expected bool, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_datetime(expr: &Expr) -> Result<NaiveDateTime, SqlError> {
    let s = parse_string(expr)?;
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Ok(dt);
        }
    }
    Err(SqlError::Parse(format!(
        "bad timestamp: {s} (expected YYYY-MM-DD HH:MM[:SS])"
    )))
}

fn parse_date(expr: &Expr) -> Result<NaiveDate, SqlError> {
    let s = parse_string(expr)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|_| SqlError::Parse(format!("bad date: {s} (expected YYYY-MM-DD)")))
}

fn split_amenities(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    UnknownColumn(String),
    MissingColumns(String),
    MissingColumn(&'static str),
    WrongArity(String, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::UnknownColumn(c) => write!(f, "unknown column: {c}"),
            SqlError::MissingColumns(t) => {
                write!(f, "{t}: INSERT requires an explicit column list")
            }
            SqlError::MissingColumn(c) => write!(f, "missing required column: {c}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: {expected} columns but {got} values")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}

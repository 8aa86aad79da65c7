use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream;
use futures::{Sink, SinkExt};
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::data::DataRow;
use pgwire::messages::response::NotificationResponse;
use pgwire::messages::PgWireBackendMessage;
use pgwire::tokio::TlsAcceptor;
use tokio::net::TcpStream;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::auth::VenueBookAuthSource;
use crate::engine::Engine;
use crate::model::*;
use crate::notify;
use crate::observability;
use crate::sql::{self, Command};
use crate::tenant::TenantManager;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Run one client connection to completion. Every connection gets its own
/// handler, so LISTEN registrations die with the session.
pub async fn process_connection(
    socket: TcpStream,
    tenant_manager: Arc<TenantManager>,
    password: String,
    tls_acceptor: Option<TlsAcceptor>,
) -> io::Result<()> {
    let factory = VenueBookFactory::new(tenant_manager, password);
    pgwire::tokio::process_socket(socket, tls_acceptor, factory).await
}

/// A LISTEN registration held by one session.
struct Subscription {
    channel: String,
    rx: broadcast::Receiver<Event>,
}

pub struct VenueBookHandler {
    tenant_manager: Arc<TenantManager>,
    query_parser: Arc<VenueBookQueryParser>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl VenueBookHandler {
    pub fn new(tenant_manager: Arc<TenantManager>) -> Self {
        Self {
            tenant_manager,
            query_parser: Arc::new(VenueBookQueryParser),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    fn resolve_engine<C: ClientInfo>(&self, client: &C) -> PgWireResult<Arc<Engine>> {
        let db = client
            .metadata()
            .get("database")
            .cloned()
            .unwrap_or_else(|| "default".to_string());
        self.tenant_manager.get_or_create(&db).map_err(|e| {
            PgWireError::UserError(Box::new(ErrorInfo::new(
                "ERROR".into(),
                "08006".into(),
                format!("tenant error: {e}"),
            )))
        })
    }

    /// Collect whatever has queued up on this session's LISTEN channels.
    /// Payloads go out in front of the next query's results, which is when
    /// a simple-protocol client actually reads the socket.
    async fn pending_notifications(&self) -> Vec<(String, String)> {
        let mut pending = Vec::new();
        let mut subs = self.subscriptions.lock().await;
        for sub in subs.iter_mut() {
            loop {
                match sub.rx.try_recv() {
                    Ok(event) => {
                        if let Some(payload) = notify::payload(&event) {
                            pending.push((sub.channel.clone(), payload));
                        }
                    }
                    Err(TryRecvError::Lagged(missed)) => {
                        warn!("listener lagged on {}: {missed} notifications lost", sub.channel);
                    }
                    Err(_) => break,
                }
            }
        }
        pending
    }

    async fn deliver_notifications<C>(&self, client: &mut C) -> PgWireResult<()>
    where
        C: Sink<PgWireBackendMessage> + Unpin + Send,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        for (channel, payload) in self.pending_notifications().await {
            client
                .feed(PgWireBackendMessage::NotificationResponse(
                    NotificationResponse::new(0, channel, payload),
                ))
                .await?;
        }
        Ok(())
    }

    async fn run_command(&self, engine: &Engine, cmd: Command) -> PgWireResult<Vec<Response>> {
        let label = observability::command_label(&cmd);
        let started = Instant::now();
        let result = self.execute_command(engine, cmd).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status)
            .increment(1);
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn execute_command(
        &self,
        engine: &Engine,
        cmd: Command,
    ) -> PgWireResult<Vec<Response>> {
        match cmd {
            Command::InsertClient {
                name,
                email,
                phone,
                company,
                returning_id,
            } => {
                let id = engine
                    .add_client(name, email, phone, company)
                    .await
                    .map_err(engine_err)?;
                inserted(id, returning_id)
            }
            Command::UpdateClient { id, patch } => {
                engine.update_client(id, patch).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::DeleteClient { id } => {
                engine.delete_client(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::InsertVenue {
                name,
                address,
                capacity,
                price_per_hour,
                amenities,
                returning_id,
            } => {
                let id = engine
                    .add_venue(name, address, capacity, price_per_hour, amenities)
                    .await
                    .map_err(engine_err)?;
                inserted(id, returning_id)
            }
            Command::UpdateVenue { id, patch } => {
                engine.update_venue(id, patch).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::DeleteVenue { id } => {
                engine.delete_venue(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::InsertVendor {
                name,
                category,
                email,
                phone,
                returning_id,
            } => {
                let id = engine
                    .add_vendor(name, category, email, phone)
                    .await
                    .map_err(engine_err)?;
                inserted(id, returning_id)
            }
            Command::UpdateVendor { id, patch } => {
                engine.update_vendor(id, patch).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::DeleteVendor { id } => {
                engine.delete_vendor(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::InsertBooking {
                draft,
                returning_id,
            } => {
                let id = engine.add_booking(draft).await.map_err(engine_err)?;
                inserted(id, returning_id)
            }
            Command::UpdateBooking { id, patch } => {
                engine.update_booking(id, patch).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::DeleteBooking { id } => {
                engine.delete_booking(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::SelectClients { id } => {
                let schema = Arc::new(clients_schema());
                let clients = match id {
                    Some(id) => engine.get_client(id).into_iter().collect(),
                    None => engine.list_clients(),
                };
                let rows: Vec<PgWireResult<DataRow>> = clients
                    .into_iter()
                    .map(|c| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&c.id)?;
                        encoder.encode_field(&c.name)?;
                        encoder.encode_field(&c.email)?;
                        encoder.encode_field(&c.phone)?;
                        encoder.encode_field(&c.company)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectVenues { id } => {
                let schema = Arc::new(venues_schema());
                let venues = match id {
                    Some(id) => engine.get_venue(id).into_iter().collect(),
                    None => engine.list_venues(),
                };
                let rows: Vec<PgWireResult<DataRow>> = venues
                    .into_iter()
                    .map(|v| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&v.id)?;
                        encoder.encode_field(&v.name)?;
                        encoder.encode_field(&v.address)?;
                        encoder.encode_field(&(v.capacity as i32))?;
                        encoder.encode_field(&v.price_per_hour)?;
                        encoder.encode_field(&v.amenities.join(", "))?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectVendors { id } => {
                let schema = Arc::new(vendors_schema());
                let vendors = match id {
                    Some(id) => engine.get_vendor(id).into_iter().collect(),
                    None => engine.list_vendors(),
                };
                let rows: Vec<PgWireResult<DataRow>> = vendors
                    .into_iter()
                    .map(|v| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&v.id)?;
                        encoder.encode_field(&v.name)?;
                        encoder.encode_field(&v.category)?;
                        encoder.encode_field(&v.email)?;
                        encoder.encode_field(&v.phone)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectBookings { id, venue_id } => {
                let schema = Arc::new(bookings_schema());
                let bookings = match id {
                    Some(id) => engine.get_booking(id).into_iter().collect(),
                    None => engine.list_bookings(venue_id),
                };
                let rows: Vec<PgWireResult<DataRow>> = bookings
                    .into_iter()
                    .map(|b| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&b.id)?;
                        encoder.encode_field(&b.client_id)?;
                        encoder.encode_field(&b.venue_id)?;
                        encoder.encode_field(&b.vendor_id)?;
                        encoder.encode_field(&b.event_type)?;
                        encoder.encode_field(&b.start_datetime.format(TIMESTAMP_FORMAT).to_string())?;
                        encoder.encode_field(&b.end_datetime.format(TIMESTAMP_FORMAT).to_string())?;
                        encoder.encode_field(&(b.guest_count as i32))?;
                        encoder.encode_field(&b.catering_required)?;
                        encoder.encode_field(&b.budget)?;
                        encoder.encode_field(&b.notes)?;
                        encoder.encode_field(&b.status.as_str())?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectConflicts {
                venue_id,
                start,
                end,
                exclude_booking_id,
            } => {
                metrics::counter!(observability::CONFLICT_CHECKS_TOTAL).increment(1);
                let check = engine
                    .check_booking_conflict(venue_id, start, end, exclude_booking_id)
                    .map_err(engine_err)?;
                if check.has_conflicts() {
                    metrics::counter!(observability::CONFLICTS_FOUND_TOTAL)
                        .increment(check.conflicts.len() as u64);
                }

                let schema = Arc::new(conflicts_schema());
                let rows: Vec<PgWireResult<DataRow>> = check
                    .conflicts
                    .into_iter()
                    .zip(check.reasons)
                    .map(|(b, reason)| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&b.id)?;
                        encoder.encode_field(&b.client_id)?;
                        encoder.encode_field(&b.venue_id)?;
                        encoder.encode_field(&b.event_type)?;
                        encoder.encode_field(&b.start_datetime.format(TIMESTAMP_FORMAT).to_string())?;
                        encoder.encode_field(&b.end_datetime.format(TIMESTAMP_FORMAT).to_string())?;
                        encoder.encode_field(&b.status.as_str())?;
                        encoder.encode_field(&reason)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectAvailability { venue_id, date } => {
                let slots = engine
                    .available_time_slots(venue_id, date)
                    .map_err(engine_err)?;

                let schema = Arc::new(availability_schema());
                let rows: Vec<PgWireResult<DataRow>> = slots
                    .into_iter()
                    .map(|slot| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&venue_id)?;
                        encoder.encode_field(&slot.start.format(TIMESTAMP_FORMAT).to_string())?;
                        encoder.encode_field(&slot.end.format(TIMESTAMP_FORMAT).to_string())?;
                        encoder.encode_field(&slot.time_range_label())?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::Listen { channel } => {
                let venue_id = notify::parse_channel(&channel).ok_or_else(|| {
                    PgWireError::UserError(Box::new(ErrorInfo::new(
                        "ERROR".into(),
                        "42000".into(),
                        format!("invalid channel: {channel} (expected venue_<id>)"),
                    )))
                })?;
                let mut subs = self.subscriptions.lock().await;
                if !subs.iter().any(|s| s.channel == channel) {
                    let rx = engine.notify.subscribe(venue_id);
                    subs.push(Subscription { channel, rx });
                }
                Ok(vec![Response::Execution(Tag::new("LISTEN"))])
            }
            Command::Unlisten { channel } => {
                let mut subs = self.subscriptions.lock().await;
                match channel {
                    Some(name) => subs.retain(|s| s.channel != name),
                    None => subs.clear(),
                }
                Ok(vec![Response::Execution(Tag::new("UNLISTEN"))])
            }
        }
    }
}

fn inserted(id: i32, returning_id: bool) -> PgWireResult<Vec<Response>> {
    if !returning_id {
        return Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))]);
    }
    let schema = Arc::new(id_schema());
    let mut encoder = DataRowEncoder::new(schema.clone());
    encoder.encode_field(&id)?;
    let rows = vec![Ok(encoder.take_row())];
    Ok(vec![Response::Query(QueryResponse::new(
        schema,
        stream::iter(rows),
    ))])
}

fn text_field(name: &str) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, Type::VARCHAR, FieldFormat::Text)
}

fn int_field(name: &str) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, Type::INT4, FieldFormat::Text)
}

fn id_schema() -> Vec<FieldInfo> {
    vec![int_field("id")]
}

fn clients_schema() -> Vec<FieldInfo> {
    vec![
        int_field("id"),
        text_field("name"),
        text_field("email"),
        text_field("phone"),
        text_field("company"),
    ]
}

fn venues_schema() -> Vec<FieldInfo> {
    vec![
        int_field("id"),
        text_field("name"),
        text_field("address"),
        int_field("capacity"),
        FieldInfo::new(
            "price_per_hour".into(),
            None,
            None,
            Type::FLOAT8,
            FieldFormat::Text,
        ),
        text_field("amenities"),
    ]
}

fn vendors_schema() -> Vec<FieldInfo> {
    vec![
        int_field("id"),
        text_field("name"),
        text_field("category"),
        text_field("email"),
        text_field("phone"),
    ]
}

fn bookings_schema() -> Vec<FieldInfo> {
    vec![
        int_field("id"),
        int_field("client_id"),
        int_field("venue_id"),
        int_field("vendor_id"),
        text_field("event_type"),
        text_field("start_datetime"),
        text_field("end_datetime"),
        int_field("guest_count"),
        FieldInfo::new(
            "catering_required".into(),
            None,
            None,
            Type::BOOL,
            FieldFormat::Text,
        ),
        FieldInfo::new("budget".into(), None, None, Type::FLOAT8, FieldFormat::Text),
        text_field("notes"),
        text_field("status"),
    ]
}

fn conflicts_schema() -> Vec<FieldInfo> {
    vec![
        int_field("booking_id"),
        int_field("client_id"),
        int_field("venue_id"),
        text_field("event_type"),
        text_field("start_datetime"),
        text_field("end_datetime"),
        text_field("status"),
        text_field("reason"),
    ]
}

fn availability_schema() -> Vec<FieldInfo> {
    vec![
        int_field("venue_id"),
        text_field("slot_start"),
        text_field("slot_end"),
        text_field("label"),
    ]
}

/// Best-effort result schema for DESCRIBE, sniffed from the SQL text. The
/// real answer comes from executing, but clients want a row description
/// before that.
fn result_schema_for(sql: &str) -> Vec<FieldInfo> {
    let upper = sql.to_uppercase();
    if upper.contains("RETURNING") {
        id_schema()
    } else if !upper.contains("SELECT") {
        vec![]
    } else if upper.contains("CONFLICTS") {
        conflicts_schema()
    } else if upper.contains("AVAILABILITY") {
        availability_schema()
    } else if upper.contains("BOOKINGS") {
        bookings_schema()
    } else if upper.contains("CLIENTS") {
        clients_schema()
    } else if upper.contains("VENUES") {
        venues_schema()
    } else if upper.contains("VENDORS") {
        vendors_schema()
    } else {
        vec![]
    }
}

#[async_trait]
impl SimpleQueryHandler for VenueBookHandler {
    async fn do_query<C>(&self, client: &mut C, query: &str) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        self.deliver_notifications(client).await?;
        let engine = self.resolve_engine(client)?;
        let cmd = sql::parse_sql(query).map_err(sql_err)?;
        self.run_command(&engine, cmd).await
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct VenueBookQueryParser;

#[async_trait]
impl QueryParser for VenueBookQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(result_schema_for(stmt))
    }
}

#[async_trait]
impl ExtendedQueryHandler for VenueBookHandler {
    type Statement = String;
    type QueryParser = VenueBookQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        self.deliver_notifications(client).await?;
        let engine = self.resolve_engine(client)?;
        let sql = substitute_params(portal);
        let cmd = sql::parse_sql(&sql).map_err(sql_err)?;
        let mut responses = self.run_command(&engine, cmd).await?;
        Ok(responses.remove(0))
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        Ok(DescribeStatementResponse::new(
            param_types,
            result_schema_for(&target.statement),
        ))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(result_schema_for(
            &target.statement.statement,
        )))
    }
}

/// Count the highest $N parameter placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    let mut max = 0usize;
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i > start {
                if let Ok(n) = sql[start..i].parse::<usize>() {
                    if n > max {
                        max = n;
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    max
}

/// Substitute $1, $2, ... placeholders with bound parameter values (text format).
fn substitute_params(portal: &Portal<String>) -> String {
    let sql = portal.statement.statement.to_string();
    let params = &portal.parameters;
    let mut result = sql;

    for (i, param) in params.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let value = match param {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                format!("'{}'", text.replace('\'', "''"))
            }
            None => "NULL".to_string(),
        };
        result = result.replace(&placeholder, &value);
    }

    result
}

// ── Factory ──────────────────────────────────────────────────────

pub struct VenueBookFactory {
    handler: Arc<VenueBookHandler>,
    auth_handler: Arc<
        CleartextPasswordAuthStartupHandler<VenueBookAuthSource, DefaultServerParameterProvider>,
    >,
    noop: Arc<NoopHandler>,
}

impl VenueBookFactory {
    pub fn new(tenant_manager: Arc<TenantManager>, password: String) -> Self {
        let auth_source = VenueBookAuthSource::new(password);
        let param_provider = DefaultServerParameterProvider::default();
        Self {
            handler: Arc::new(VenueBookHandler::new(tenant_manager)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                auth_source,
                param_provider,
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for VenueBookFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

fn engine_err(e: crate::engine::EngineError) -> PgWireError {
    debug!("query failed: {e}");
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "P0001".into(),
        e.to_string(),
    )))
}

fn sql_err(e: crate::sql::SqlError) -> PgWireError {
    debug!("rejected statement: {e}");
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "42601".into(),
        e.to_string(),
    )))
}

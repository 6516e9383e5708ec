use std::convert::Infallible;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use crate::calendar::month_grid;
use crate::export;
use crate::models::booking::BookingKey;
use crate::store::{BookingStore, FlushMode, StoreError};

pub type SharedStore = Arc<Mutex<BookingStore>>;

#[derive(Serialize)]
struct SlotView {
    desk: String,
    position: u32,
    occupant: String,
}

#[derive(Serialize)]
struct DayView {
    date: NaiveDate,
    bookings: Vec<SlotView>,
}

#[derive(Serialize)]
struct MonthView {
    month: u32,
    weeks: Vec<Vec<Option<DayView>>>,
}

#[derive(Serialize)]
struct GridView {
    year: i32,
    months: Vec<MonthView>,
}

#[derive(Deserialize)]
struct BookingRequest {
    date: NaiveDate,
    desk: u32,
    member: String,
}

#[derive(Deserialize)]
struct FlushQuery {
    mode: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct OkBody {
    status: &'static str,
    pending: usize,
}

pub async fn run_api(store: SharedStore, port: u16) {
    let grid = warp::path!("grid")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(grid_handler);
    let book = warp::path!("bookings")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(book_handler);
    let flush = warp::path!("flush")
        .and(warp::post())
        .and(warp::query::<FlushQuery>())
        .and(with_store(store.clone()))
        .and_then(flush_handler);
    let reload = warp::path!("reload")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and_then(reload_handler);
    let export = warp::path!("export.csv")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(export_handler);

    let routes = grid.or(book).or(flush).or(reload).or(export);
    println!("Serving booking calendar on port {}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

fn with_store(
    store: SharedStore,
) -> impl Filter<Extract = (SharedStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn error_reply(err: &StoreError) -> Response {
    let status = match err {
        StoreError::InvalidOccupant(_) | StoreError::UnknownKey(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StoreError::BackendUnavailable(_) | StoreError::FlushFailed(_) => StatusCode::BAD_GATEWAY,
    };
    warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            error: err.to_string(),
        }),
        status,
    )
    .into_response()
}

async fn grid_handler(store: SharedStore) -> Result<Response, Infallible> {
    let store = store.lock().await;
    let span = *store.span();
    let months = span
        .months()
        .map(|month| MonthView {
            month,
            weeks: month_grid(span.year, month)
                .into_iter()
                .map(|week| {
                    week.into_iter()
                        .map(|day| {
                            day.map(|date| DayView {
                                date,
                                bookings: store
                                    .catalog()
                                    .iter()
                                    .map(|desk| SlotView {
                                        desk: desk.label.clone(),
                                        position: desk.position,
                                        occupant: store
                                            .occupant(&BookingKey::new(date, desk.position))
                                            .unwrap_or("")
                                            .to_string(),
                                    })
                                    .collect(),
                            })
                        })
                        .collect()
                })
                .collect(),
        })
        .collect();
    let grid = GridView {
        year: span.year,
        months,
    };
    Ok(warp::reply::json(&grid).into_response())
}

async fn book_handler(request: BookingRequest, store: SharedStore) -> Result<Response, Infallible> {
    let mut store = store.lock().await;
    let key = BookingKey::new(request.date, request.desk);
    match store.set_occupant(key, &request.member) {
        Ok(()) => Ok(warp::reply::json(&OkBody {
            status: "ok",
            pending: store.dirty_count(),
        })
        .into_response()),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn flush_handler(query: FlushQuery, store: SharedStore) -> Result<Response, Infallible> {
    let mode = match query.mode.as_deref() {
        None | Some("incremental") => FlushMode::Incremental,
        Some("full") => FlushMode::Full,
        Some(other) => {
            return Ok(warp::reply::with_status(
                warp::reply::json(&ErrorBody {
                    error: format!("mode must be incremental or full, got '{}'", other),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .into_response());
        }
    };
    let mut store = store.lock().await;
    match store.flush(mode) {
        Ok(written) => Ok(warp::reply::json(&serde_json::json!({
            "status": "ok",
            "written": written,
        }))
        .into_response()),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn reload_handler(store: SharedStore) -> Result<Response, Infallible> {
    let mut store = store.lock().await;
    match store.load() {
        Ok(summary) => Ok(warp::reply::json(&serde_json::json!({
            "applied": summary.applied,
            "skipped": summary.skipped,
            "kept_local": summary.kept_local,
        }))
        .into_response()),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn export_handler(store: SharedStore) -> Result<Response, Infallible> {
    let store = store.lock().await;
    match export::to_csv(&store.export_snapshot()) {
        Ok(csv) => Ok(warp::reply::with_header(csv, "content-type", "text/csv").into_response()),
        Err(err) => Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody { error: err }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response()),
    }
}

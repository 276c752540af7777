use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{asset, booking, contact, health, invoice, pricing, webhook};
use crate::api::rate_limit::{enforce, RouteLimiter};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span, error, info, warn};
use uuid::Uuid;

fn limited(routes: Router<Arc<AppState>>, limiter: &Arc<RouteLimiter>) -> Router<Arc<AppState>> {
    routes.route_layer(middleware::from_fn_with_state(limiter.clone(), enforce))
}

fn cors(frontend_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    match frontend_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(AllowOrigin::exact(origin)),
        Some(Err(_)) => {
            warn!("FRONTEND_ORIGIN is not a valid header value; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let limiters = state.rate_limiters.clone();

    let booking_routes = limited(
        Router::new().route("/api/v1/bookings", post(booking::create_booking)),
        &limiters.booking,
    );

    let contact_routes = limited(
        Router::new().route("/api/v1/contact", post(contact::submit_contact)),
        &limiters.contact,
    );

    let invoice_routes = limited(
        Router::new()
            .route("/api/v1/invoices", post(invoice::create_invoice))
            .route("/api/v1/invoices/{id}", get(invoice::get_invoice))
            .route("/api/v1/invoices/{id}/send", post(invoice::send_invoice)),
        &limiters.invoice,
    );

    Router::new()
        .route("/health", get(health::health_check))

        // Pricing
        .route("/api/v1/pricing/quote", post(pricing::quote))
        .route("/api/v1/pricing/services", get(pricing::catalogue))

        // Admin Booking Management
        .route("/api/v1/bookings", get(booking::list_bookings))
        .route("/api/v1/bookings/{id}", get(booking::get_booking))
        .route("/api/v1/bookings/{id}/status", patch(booking::update_booking_status))

        // Payment provider callbacks
        .route("/api/v1/webhooks/stripe", post(webhook::stripe_webhook))

        // Assets
        .route(
            "/api/v1/assets",
            get(asset::list_assets)
                .post(asset::upload_asset)
                .layer(DefaultBodyLimit::max(asset::MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/api/v1/assets/{*public_id}", get(asset::get_asset).delete(asset::delete_asset))

        .merge(booking_routes)
        .merge(contact_routes)
        .merge(invoice_routes)

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(cors(state.config.frontend_origin.as_deref()))
        .with_state(state)
}

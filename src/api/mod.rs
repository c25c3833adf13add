//! HTTP surface of the library service.
//!
//! Every library route sits behind [`auth::require_token`]; only `/health`
//! answers without a token.

mod books;
mod copies;
mod readers;
mod reports;
mod rooms;
mod transactions;
mod visits;

use axum::{
	middleware,
	routing::{get, patch},
	Json, Router,
};
use serde_json::{json, Value};
use tower_cookies::CookieManagerLayer;
use tower_http::{
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{auth, SharedState};

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

pub fn router(state: SharedState) -> Router {
	let library = Router::new()
		// reading rooms
		.route("/reading_rooms/", get(rooms::list).post(rooms::create))
		.route("/rooms/", get(rooms::list))
		.route(
			"/reading_rooms/{id}/",
			get(rooms::get_by_id).patch(rooms::update).delete(rooms::delete),
		)
		.route("/reading_rooms/{id}/readers/", get(rooms::readers))
		// books and their copies
		.route("/books/", get(books::list).post(books::create))
		.route("/books/late/", get(books::late))
		.route("/books/low_stock/", get(books::low_stock))
		.route(
			"/books/{id}/",
			get(books::get_by_id).patch(books::update).delete(books::delete),
		)
		.route("/books/{id}/discard/", patch(books::update))
		.route(
			"/books/{id}/manage_copies/",
			get(copies::list_for_book).post(copies::add).delete(copies::remove),
		)
		.route("/books/{id}/transfer/", get(copies::placements).patch(copies::transfer))
		.route("/books/{id}/update_code/", get(books::code).patch(books::change_code))
		.route("/book_copies/", get(copies::list))
		.route(
			"/book_copies/{id}/",
			get(copies::get_by_id).patch(copies::update).delete(copies::delete),
		)
		// readers
		.route("/readers/", get(readers::list).post(readers::create))
		.route("/readers/remove_old/", get(readers::removable).delete(readers::remove_old))
		.route(
			"/readers/{id}/",
			get(readers::get_by_id).patch(readers::update).delete(readers::delete),
		)
		.route("/readers/{id}/assign_room/", patch(readers::assign_room))
		.route("/readers/{id}/transfer/", get(readers::current_room).post(readers::transfer))
		.route("/readers/{id}/update_ticket/", get(readers::ticket).patch(readers::change_ticket))
		.route("/readers/{id}/books/", get(readers::books))
		// lending ledger
		.route("/book_transactions/", get(transactions::list).post(transactions::create))
		.route(
			"/book_transactions/{id}/",
			get(transactions::get_by_id)
				.patch(transactions::mark_returned)
				.delete(transactions::delete),
		)
		.route("/book_transactions/{id}/return/", patch(transactions::mark_returned))
		// visits
		.route("/visits/", get(visits::list).post(visits::create))
		.route("/visits/{id}/", get(visits::get_by_id).delete(visits::delete))
		// reports
		.route("/reports/", get(reports::report))
		.route("/reports/complex/", get(reports::complex))
		.route_layer(middleware::from_fn_with_state(state.clone(), auth::require_token));

	Router::new()
		.route("/health", get(health))
		.merge(library)
		.layer(CookieManagerLayer::new())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(TraceLayer::new_for_http())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

//! JSON REST API for Witness.
//!
//! Exposes an axum [`Router`] backed by any
//! [`witness_core::store::IncidentStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", witness_api::api_router(store.clone()))
//! ```

pub mod attachments;
pub mod duplicates;
pub mod error;
pub mod guests;
pub mod incidents;
pub mod legal;
pub mod quotes;
pub mod review;
pub mod reviewers;
pub mod scenes;
pub mod timeline;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use witness_core::{
  evidence::{Media, Quote, Source, TimelineEntry},
  store::IncidentStore,
  tags::{Agency, Violation},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IncidentStore + 'static,
{
  Router::new()
    // Incidents
    .route("/incidents", get(incidents::list::<S>).post(incidents::create::<S>))
    .route("/incidents/{id}", get(incidents::get_one::<S>).put(incidents::update::<S>))
    .route("/incidents/{id}/verify-field", get(incidents::verify_field::<S>))
    // Attachments
    .route("/incidents/{id}/agencies", attachments::routes::<S, Agency>())
    .route("/incidents/{id}/violations", attachments::routes::<S, Violation>())
    .route("/incidents/{id}/sources", attachments::routes::<S, Source>())
    .route("/incidents/{id}/media", attachments::routes::<S, Media>())
    .route("/incidents/{id}/timeline", attachments::routes::<S, TimelineEntry>())
    .route(
      "/incidents/{id}/quotes",
      attachments::routes::<S, Quote>().patch(quotes::set_verified::<S>),
    )
    // Quote linking
    .route("/incidents/{id}/quotes/link", post(quotes::link::<S>))
    .route("/incidents/{id}/quotes/unlink", post(quotes::unlink::<S>))
    .route("/incidents/{id}/quotes/suggest", get(quotes::suggest::<S>))
    // Timeline
    .route("/incidents/{id}/timeline/reorder", put(timeline::reorder::<S>))
    // Review
    .route("/incidents/{id}/review", post(review::submit::<S>))
    .route("/incidents/{id}/reject", post(review::reject::<S>))
    // Guest submissions
    .route(
      "/guest-submissions",
      get(guests::list::<S>)
        .post(guests::create::<S>)
        .patch(guests::update::<S>),
    )
    .route("/guest-submissions/by-name", get(guests::by_name::<S>))
    .route("/guest-submissions/{id}/promote", post(guests::promote::<S>))
    .route("/check-duplicates", post(duplicates::check::<S>))
    // Reviewers
    .route("/reviewers", get(reviewers::list::<S>).post(reviewers::create::<S>))
    .route("/reviewers/{id}", get(reviewers::get_one::<S>))
    // Presentation
    .route("/scenes/resolve", post(scenes::resolve::<S>))
    .route("/legal", get(legal::list))
    .route("/legal/{violation_type}", get(legal::get_one))
    .with_state(store)
}

//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use witness_core::{
  duplicate::{DuplicateQuery, DuplicateReport, MAX_PENDING_GUEST_SUBMISSIONS, check_duplicates},
  evidence::{Quote, Source, TimelineEntry},
  field::FieldKey,
  guest::{GuestQuote, GuestReport, GuestStatus, GuestSubmissionPatch},
  incident::{IncidentField, IncidentFields, VerificationStatus},
  linking::link_quote,
  record::AttachmentKind,
  review::{ReviewChecklist, Role, submit_review},
  store::{GuestQuery, IncidentQuery, IncidentStore, StoreError as _, StoreLookup},
  tags::{Agency, AgencyKind},
  timeline,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn jane_doe() -> IncidentFields {
  IncidentFields {
    victim_name: Some("Jane Doe".into()),
    incident_date: NaiveDate::from_ymd_opt(2026, 1, 1),
    facility: Some("Stewart Detention Center".into()),
    ..Default::default()
  }
}

fn entry(description: &str) -> TimelineEntry {
  TimelineEntry {
    event_date:     None,
    description:    description.into(),
    sequence_order: 0,
    quote_id:       None,
  }
}

// ─── Incidents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_incident() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  assert_eq!(incident.verification_status, VerificationStatus::Pending);

  let fetched = s.get_incident(incident.id).await.unwrap().unwrap();
  assert_eq!(fetched.incident_id, incident.incident_id);
  assert_eq!(fetched.fields, jane_doe());
}

#[tokio::test]
async fn get_incident_missing_returns_none() {
  let s = store().await;
  assert!(s.get_incident(404).await.unwrap().is_none());
  assert!(s.dossier(404).await.unwrap().is_none());
}

#[tokio::test]
async fn update_missing_incident_is_not_found() {
  let s = store().await;
  let err = s.update_incident(9, jane_doe()).await.unwrap_err();
  assert!(err.as_core().is_some_and(witness_core::Error::is_not_found));
}

#[tokio::test]
async fn list_incidents_filters_by_status() {
  let s = store().await;
  let a = s.create_incident(jane_doe()).await.unwrap();
  s.create_incident(IncidentFields::default()).await.unwrap();

  let mut promoted = a.clone();
  promoted.verification_status = VerificationStatus::FirstReview;
  promoted.first_verified_by = Some(3);
  promoted.first_verified_at = Some(Utc::now());
  s.save_review_state(promoted).await.unwrap();

  let query = IncidentQuery { status: Some(VerificationStatus::Pending), ..Default::default() };
  assert_eq!(s.list_incidents(&query).await.unwrap().len(), 1);

  let all = s.list_incidents(&IncidentQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].first_verified_by, Some(3));
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_agency_kind_is_rejected() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  s.add_attachment(incident.id, Agency::new(AgencyKind::Ice)).await.unwrap();

  let err = s
    .add_attachment(incident.id, Agency::new(AgencyKind::Ice))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(witness_core::Error::DuplicateAttachment { kind: AttachmentKind::Agency, .. })
  ));

  let cbp = s.add_attachment(incident.id, Agency::new(AgencyKind::Cbp)).await.unwrap();
  // Changing CBP into ICE would collide as well.
  assert!(
    s.update_attachment(incident.id, cbp.id, Agency::new(AgencyKind::Ice))
      .await
      .is_err()
  );
}

#[tokio::test]
async fn attachment_on_missing_incident_fails() {
  let s = store().await;
  let err = s.add_attachment(77, Quote::new("text")).await.unwrap_err();
  assert!(matches!(err, Error::Core(witness_core::Error::IncidentNotFound(77))));
}

#[tokio::test]
async fn attachments_are_scoped_to_kind_and_incident() {
  let s = store().await;
  let a = s.create_incident(jane_doe()).await.unwrap();
  let b = s.create_incident(jane_doe()).await.unwrap();
  let quote = s.add_attachment(a.id, Quote::new("quoted")).await.unwrap();
  s.add_attachment(a.id, Source::from_url("https://news.example/a")).await.unwrap();

  assert!(s.get_attachment::<Quote>(b.id, quote.id).await.unwrap().is_none());
  assert!(s.get_attachment::<Source>(a.id, quote.id).await.unwrap().is_none());
  assert_eq!(s.list_attachments::<Quote>(a.id).await.unwrap().len(), 1);

  let err = s
    .remove_attachment(a.id, AttachmentKind::Source, quote.id)
    .await
    .unwrap_err();
  assert!(err.as_core().is_some_and(witness_core::Error::is_not_found));
}

#[tokio::test]
async fn quote_must_cite_a_source_of_its_incident() {
  let s = store().await;
  let a = s.create_incident(jane_doe()).await.unwrap();
  let b = s.create_incident(jane_doe()).await.unwrap();
  let own = s.add_attachment(a.id, Source::from_url("https://news.example/a")).await.unwrap();
  let foreign = s.add_attachment(b.id, Source::from_url("https://news.example/b")).await.unwrap();

  let mut quote = Quote::new("quoted");
  quote.source_id = Some(foreign.id);
  let err = s.add_attachment(a.id, quote.clone()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(witness_core::Error::UnknownSource { source_id, .. }) if source_id == foreign.id
  ));

  quote.source_id = Some(own.id);
  let saved = s.add_attachment(a.id, quote.clone()).await.unwrap();

  quote.source_id = Some(999);
  assert!(s.update_attachment(a.id, saved.id, quote).await.is_err());
  let unchanged = s.get_attachment::<Quote>(a.id, saved.id).await.unwrap().unwrap();
  assert_eq!(unchanged.value.source_id, Some(own.id));
}

#[tokio::test]
async fn cited_source_cannot_be_removed() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  let source = s.add_attachment(incident.id, Source::from_url("https://news.example/a")).await.unwrap();
  let mut quote = Quote::new("quoted");
  quote.source_id = Some(source.id);
  let quote = s.add_attachment(incident.id, quote).await.unwrap();

  let err = s
    .remove_attachment(incident.id, AttachmentKind::Source, source.id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(witness_core::Error::SourceInUse { quotes: 1, .. })));
  assert_eq!(s.list_attachments::<Source>(incident.id).await.unwrap().len(), 1);

  s.remove_attachment(incident.id, AttachmentKind::Quote, quote.id).await.unwrap();
  s.remove_attachment(incident.id, AttachmentKind::Source, source.id).await.unwrap();
  assert!(s.list_attachments::<Source>(incident.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn linked_quotes_persist_in_one_batch() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  let first = s.add_attachment(incident.id, Quote::new("first")).await.unwrap();
  let second = s.add_attachment(incident.id, Quote::new("second")).await.unwrap();
  let name = FieldKey::Field(IncidentField::VictimName);

  let mut quotes = s.list_attachments::<Quote>(incident.id).await.unwrap();
  link_quote(&mut quotes, name, first.id).unwrap();
  link_quote(&mut quotes, name, second.id).unwrap();
  s.update_attachments(quotes).await.unwrap();

  let dossier = s.dossier(incident.id).await.unwrap().unwrap();
  assert_eq!(dossier.field_quote_map().get(name), Some(second.id));
  assert!(dossier.quote(first.id).unwrap().value.linked_fields.is_empty());
}

// ─── Timeline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn timeline_appends_and_renumbers_on_removal() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  let mut ids = Vec::new();
  for d in ["arrest", "transfer", "death"] {
    ids.push(s.add_attachment(incident.id, entry(d)).await.unwrap().id);
  }

  let entries = s.list_attachments::<TimelineEntry>(incident.id).await.unwrap();
  let orders: Vec<u32> = entries.iter().map(|e| e.value.sequence_order).collect();
  assert_eq!(orders, vec![1, 2, 3]);

  s.remove_attachment(incident.id, AttachmentKind::Timeline, ids[0]).await.unwrap();
  let entries = s.list_attachments::<TimelineEntry>(incident.id).await.unwrap();
  let orders: Vec<u32> = entries.iter().map(|e| e.value.sequence_order).collect();
  assert_eq!(orders, vec![1, 2]);
  assert_eq!(entries[0].id, ids[1]);
}

#[tokio::test]
async fn reorder_is_dense_and_atomic() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  for d in ["a", "b", "c", "d"] {
    s.add_attachment(incident.id, entry(d)).await.unwrap();
  }

  let mut entries = s.list_attachments::<TimelineEntry>(incident.id).await.unwrap();
  timeline::reorder(&mut entries, 3, 0).unwrap();
  let order = timeline::order_of(&entries);
  let saved = s.reorder_timeline(incident.id, order.clone()).await.unwrap();
  assert_eq!(saved.iter().map(|e| e.id).collect::<Vec<_>>(), order);

  let reloaded = s.list_attachments::<TimelineEntry>(incident.id).await.unwrap();
  assert_eq!(timeline::order_of(&reloaded), order);
  let orders: Vec<u32> = reloaded.iter().map(|e| e.value.sequence_order).collect();
  assert_eq!(orders, vec![1, 2, 3, 4]);

  // An incomplete order changes nothing.
  assert!(s.reorder_timeline(incident.id, order[..2].to_vec()).await.is_err());
  let unchanged = s.list_attachments::<TimelineEntry>(incident.id).await.unwrap();
  assert_eq!(timeline::order_of(&unchanged), order);
}

#[tokio::test]
async fn editing_an_entry_keeps_its_position() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  s.add_attachment(incident.id, entry("a")).await.unwrap();
  let b = s.add_attachment(incident.id, entry("b")).await.unwrap();

  let mut edited = entry("b, corrected");
  edited.sequence_order = 99;
  let saved = s.update_attachment(incident.id, b.id, edited).await.unwrap();
  assert_eq!(saved.value.sequence_order, 2);
}

// ─── Guest submissions ───────────────────────────────────────────────────────

fn guest_report() -> GuestReport {
  GuestReport {
    victim_name: Some("Jane Doe".into()),
    date_of_death: NaiveDate::from_ymd_opt(2026, 1, 1),
    agencies: BTreeMap::from([
      ("ice".to_owned(), true),
      ("cbp".to_owned(), false),
      ("local_police".to_owned(), true),
    ]),
    source_urls: vec!["https://news.example/jane".into()],
    media_urls: vec!["https://cdn.example/photo.jpg".into()],
    quotes: vec![GuestQuote {
      text:         "Jane Doe died in ICE custody on New Year's Day.".into(),
      source_url:   Some("https://news.example/jane/".into()),
      linked_field: Some(IncidentField::VictimName.into()),
    }],
    ..Default::default()
  }
}

#[tokio::test]
async fn promotion_creates_incident_and_marks_submission() {
  let s = store().await;
  let submission = s.create_guest_submission(guest_report()).await.unwrap();

  let dossier = s.promote_guest_submission(submission.id).await.unwrap();
  assert_eq!(dossier.incident.fields.victim_name.as_deref(), Some("Jane Doe"));
  assert_eq!(dossier.agencies.len(), 2);
  assert_eq!(dossier.sources.len(), 1);
  assert_eq!(dossier.media.len(), 1);
  assert_eq!(dossier.quotes.len(), 1);
  assert_eq!(dossier.quotes[0].value.source_id, Some(dossier.sources[0].id));
  assert_eq!(
    dossier.field_quote_map().get(FieldKey::Field(IncidentField::VictimName)),
    Some(dossier.quotes[0].id)
  );

  let stored = s.get_guest_submission(submission.id).await.unwrap().unwrap();
  assert_eq!(stored.status, GuestStatus::Promoted);
  assert_eq!(stored.incident_id, Some(dossier.incident.id));

  // A second promotion is refused and creates nothing.
  assert!(s.promote_guest_submission(submission.id).await.is_err());
  assert_eq!(s.list_incidents(&IncidentQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn soft_delete_needs_reason_and_hides_row() {
  let s = store().await;
  let submission = s.create_guest_submission(guest_report()).await.unwrap();

  let no_reason = GuestSubmissionPatch {
    id: submission.id,
    deleted_at: Some(Utc::now()),
    ..Default::default()
  };
  assert!(matches!(
    s.update_guest_submission(no_reason).await,
    Err(Error::Core(witness_core::Error::MissingDeletionReason))
  ));

  let patch = GuestSubmissionPatch {
    id: submission.id,
    deleted_at: Some(Utc::now()),
    deletion_reason: Some("duplicate of #4".into()),
    ..Default::default()
  };
  s.update_guest_submission(patch).await.unwrap();

  assert!(s.list_guest_submissions(&GuestQuery::default()).await.unwrap().is_empty());
  let with_deleted = GuestQuery { include_deleted: true, ..Default::default() };
  assert_eq!(s.list_guest_submissions(&with_deleted).await.unwrap().len(), 1);
}

#[tokio::test]
async fn related_reports_exclude_those_promoted_into_the_incident() {
  let s = store().await;
  let first = s.create_guest_submission(guest_report()).await.unwrap();
  let mut other_name = guest_report();
  other_name.victim_name = Some("John Roe".into());
  s.create_guest_submission(other_name).await.unwrap();
  s.create_guest_submission(guest_report()).await.unwrap();
  let dossier = s.promote_guest_submission(first.id).await.unwrap();

  let query = GuestQuery {
    name: Some("  jane DOE ".into()),
    exclude_incident_id: Some(dossier.incident.id),
    ..Default::default()
  };
  let related = s.list_guest_submissions(&query).await.unwrap();
  assert_eq!(related.len(), 1);
  assert_ne!(related[0].id, first.id);
}

// ─── Duplicates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicates_match_name_date_facility_and_url() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  s.add_attachment(incident.id, Source::from_url("https://News.example/story/"))
    .await
    .unwrap();

  let by_name = DuplicateQuery { victim_name: Some("JANE DOE".into()), ..Default::default() };
  assert_eq!(s.find_duplicates(&by_name).await.unwrap().cases.len(), 1);

  let by_place = DuplicateQuery {
    date_of_death: NaiveDate::from_ymd_opt(2026, 1, 1),
    facility: Some("stewart detention center".into()),
    ..Default::default()
  };
  assert_eq!(s.find_duplicates(&by_place).await.unwrap().cases.len(), 1);

  let date_only = DuplicateQuery {
    date_of_death: NaiveDate::from_ymd_opt(2026, 1, 1),
    ..Default::default()
  };
  assert!(s.find_duplicates(&date_only).await.unwrap().cases.is_empty());

  let by_url = DuplicateQuery {
    source_urls: vec!["https://news.example/story".into()],
    ..Default::default()
  };
  let matches = s.find_duplicates(&by_url).await.unwrap();
  assert_eq!(matches.sources.len(), 1);
  assert_eq!(matches.sources[0].incident_id, incident.id);
}

#[tokio::test]
async fn url_matching_keeps_query_and_ignores_default_port() {
  let s = store().await;
  let incident = s.create_incident(jane_doe()).await.unwrap();
  let source = s
    .add_attachment(incident.id, Source::from_url("https://news.example/story/?id=5"))
    .await
    .unwrap();

  let query = |url: &str| DuplicateQuery { source_urls: vec![url.into()], ..Default::default() };
  let hits = s.find_duplicates(&query("https://NEWS.example:443/story?id=5")).await.unwrap();
  assert_eq!(hits.sources.iter().map(|m| m.id).collect::<Vec<_>>(), vec![source.id]);
  assert!(s.find_duplicates(&query("https://news.example/story?id=6")).await.unwrap().sources.is_empty());

  // An edited URL is matched under its new key.
  let moved = Source::from_url("https://news.example/other");
  s.update_attachment(incident.id, source.id, moved).await.unwrap();
  assert!(s.find_duplicates(&query("https://news.example/story?id=5")).await.unwrap().sources.is_empty());
  assert_eq!(s.find_duplicates(&query("https://news.example/other/")).await.unwrap().sources.len(), 1);
}

#[tokio::test]
async fn pending_guest_flood_blocks_submission() {
  let s = store().await;
  for _ in 0..MAX_PENDING_GUEST_SUBMISSIONS {
    s.create_guest_submission(guest_report()).await.unwrap();
  }
  let query = guest_report().duplicate_query();
  let report = check_duplicates(&StoreLookup(&s), &query).await;
  assert_eq!(report.guest_submission_count, MAX_PENDING_GUEST_SUBMISSIONS);
  assert!(!report.allow_submission);

  let matches = s.find_duplicates(&query).await.unwrap();
  assert_eq!(DuplicateReport::assess(matches), report);
}

// ─── Reviewers & review flow ─────────────────────────────────────────────────

#[tokio::test]
async fn reviewers_roundtrip() {
  let s = store().await;
  let r = s.add_reviewer("Ana".into(), Role::Editor).await.unwrap();
  assert_eq!(s.get_reviewer(r.id).await.unwrap(), Some(r.clone()));
  assert_eq!(s.list_reviewers().await.unwrap(), vec![r]);
  assert!(s.get_reviewer(999).await.unwrap().is_none());
}

#[tokio::test]
async fn review_state_survives_reload() {
  let s = store().await;
  let reviewer = s.add_reviewer("Ana".into(), Role::Analyst).await.unwrap();
  let incident = s.create_incident(jane_doe()).await.unwrap();
  let source = s.add_attachment(incident.id, Source::from_url("https://news.example/j")).await.unwrap();
  let mut quote = Quote::new("Jane Doe, 34, died on January 1 at Stewart.");
  quote.source_id = Some(source.id);
  quote.verified = true;
  quote.linked_fields = [
    FieldKey::Field(IncidentField::VictimName),
    FieldKey::Field(IncidentField::IncidentDate),
    FieldKey::Field(IncidentField::Facility),
  ]
  .into();
  s.add_attachment(incident.id, quote).await.unwrap();

  let dossier = s.dossier(incident.id).await.unwrap().unwrap();
  let checklist = ReviewChecklist::all_checked(&dossier);
  let transition = submit_review(&dossier, &checklist, &reviewer, Utc::now()).unwrap();
  let mut updated = dossier.incident.clone();
  transition.apply(&mut updated);
  s.save_review_state(updated).await.unwrap();

  let reloaded = s.get_incident(incident.id).await.unwrap().unwrap();
  assert_eq!(reloaded.verification_status, VerificationStatus::FirstReview);
  assert_eq!(reloaded.first_verified_by, Some(reviewer.id));
  assert!(reloaded.first_verified_at.is_some());
}

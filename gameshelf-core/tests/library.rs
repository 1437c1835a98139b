use chrono::{Duration, TimeZone, Utc};
use gameshelf_core::*;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn fresh() -> LibraryEntry {
    initial_entry(1, 42, None, t0())
}

#[test]
fn new_entry_defaults_to_plan_to_play() {
    let entry = fresh();
    assert_eq!(entry.status, PlayStatus::PlanToPlay);
    assert_eq!(entry.personal_rating, None);
    assert_eq!(entry.started_at, None);
    assert_eq!(entry.completed_at, None);
    assert_eq!(entry.play_count, 0);
    assert!(entry.tags.is_empty());
}

#[test]
fn initial_status_runs_transition_rules() {
    let entry = initial_entry(1, 42, Some(PlayStatus::Completed), t0());
    assert_eq!(entry.status, PlayStatus::Completed);
    assert_eq!(entry.started_at, Some(t0()));
    assert_eq!(entry.completed_at, Some(t0()));

    let playing = initial_entry(1, 42, Some(PlayStatus::Playing), t0());
    assert_eq!(playing.started_at, Some(t0()));
    assert_eq!(playing.completed_at, None);
}

#[test]
fn leaving_plan_to_play_sets_started_at() {
    let now = t0() + Duration::hours(3);
    let next = apply_patch(&fresh(), &LibraryEntryPatch::status(PlayStatus::Playing), now).unwrap();
    assert_eq!(next.status, PlayStatus::Playing);
    assert_eq!(next.started_at, Some(now));
    assert_eq!(next.completed_at, None);
}

#[test]
fn existing_started_at_is_kept() {
    let mut entry = fresh();
    let earlier = t0() - Duration::days(10);
    entry.started_at = Some(earlier);

    let next = apply_patch(&entry, &LibraryEntryPatch::status(PlayStatus::Playing), t0()).unwrap();
    assert_eq!(next.started_at, Some(earlier));
}

#[test]
fn completing_sets_completed_at_once() {
    let mut entry = fresh();
    apply_status_transition(&mut entry, PlayStatus::Playing, t0());

    let done_at = t0() + Duration::days(5);
    apply_status_transition(&mut entry, PlayStatus::Completed, done_at);
    assert_eq!(entry.completed_at, Some(done_at));

    // Replaying later leaves the first completion date alone.
    apply_status_transition(&mut entry, PlayStatus::Playing, done_at + Duration::days(1));
    apply_status_transition(&mut entry, PlayStatus::Completed, done_at + Duration::days(9));
    assert_eq!(entry.completed_at, Some(done_at));
}

#[test]
fn other_transitions_leave_completed_at_untouched() {
    for to in [
        PlayStatus::Playing,
        PlayStatus::OnHold,
        PlayStatus::Dropped,
        PlayStatus::Abandoned,
    ] {
        let mut entry = fresh();
        apply_status_transition(&mut entry, to, t0());
        assert_eq!(entry.completed_at, None, "transition to {to}");
        assert_eq!(entry.started_at, Some(t0()), "transition to {to}");
    }
}

#[test]
fn same_status_is_a_no_op() {
    let mut entry = fresh();
    apply_status_transition(&mut entry, PlayStatus::PlanToPlay, t0());
    assert_eq!(entry.started_at, None);
}

#[test]
fn example_scenario_completed_with_rating() {
    let patch = LibraryEntryPatch {
        status: Some(PlayStatus::Completed),
        personal_rating: Some(Some(9.0)),
        ..Default::default()
    };
    let now = t0() + Duration::minutes(1);
    let next = apply_patch(&fresh(), &patch, now).unwrap();
    assert_eq!(next.status, PlayStatus::Completed);
    assert_eq!(next.personal_rating, Some(9.0));
    assert_eq!(next.started_at, Some(now));
    assert_eq!(next.completed_at, Some(now));
    assert_eq!(next.updated_at, now);
}

#[test]
fn omitted_fields_are_untouched() {
    let mut entry = fresh();
    entry.review = Some("great".to_string());
    entry.personal_rating = Some(7.5);
    entry.tags = vec!["co-op".to_string()];

    let patch = LibraryEntryPatch {
        is_favorite: Some(true),
        ..Default::default()
    };
    let next = apply_patch(&entry, &patch, t0()).unwrap();
    assert!(next.is_favorite);
    assert_eq!(next.review.as_deref(), Some("great"));
    assert_eq!(next.personal_rating, Some(7.5));
    assert_eq!(next.tags, vec!["co-op".to_string()]);
}

#[test]
fn explicit_null_clears_nullable_fields() {
    let mut entry = fresh();
    entry.personal_rating = Some(4.0);
    entry.review = Some("meh".to_string());

    let patch = LibraryEntryPatch {
        personal_rating: Some(None),
        review: Some(None),
        ..Default::default()
    };
    let next = apply_patch(&entry, &patch, t0()).unwrap();
    assert_eq!(next.personal_rating, None);
    assert_eq!(next.review, None);
}

#[test]
fn every_rating_in_range_is_stored_exactly() {
    let mut r = 0.0;
    while r <= 10.0 {
        let next = apply_patch(&fresh(), &LibraryEntryPatch::rating(Some(r)), t0()).unwrap();
        assert_eq!(next.personal_rating, Some(r));
        r += 0.5;
    }
    let odd = apply_patch(&fresh(), &LibraryEntryPatch::rating(Some(7.3)), t0()).unwrap();
    assert_eq!(odd.personal_rating, Some(7.3));
}

#[test]
fn out_of_range_rating_is_rejected() {
    for r in [-0.5, 10.5, 11.0, -100.0, f64::NAN, f64::INFINITY] {
        let err = apply_patch(&fresh(), &LibraryEntryPatch::rating(Some(r)), t0()).unwrap_err();
        assert!(err.has_field("personalRating"), "rating {r}");
    }
}

#[test]
fn bounds_are_checked_for_every_field() {
    let patch = LibraryEntryPatch {
        review: Some(Some("x".repeat(2001))),
        hours_played: Some(Some(-1.0)),
        completion_percentage: Some(Some(100.5)),
        difficulty: Some(Some(6)),
        tags: Some(vec!["  ".to_string()]),
        ..Default::default()
    };
    let err = patch.validate().unwrap_err();
    for field in ["review", "hoursPlayed", "completionPercentage", "difficulty", "tags"] {
        assert!(err.has_field(field), "missing issue for {field}");
    }
    assert_eq!(err.issues.len(), 5);
}

#[test]
fn review_limit_counts_characters() {
    let review = "é".repeat(2000);
    let patch = LibraryEntryPatch {
        review: Some(Some(review)),
        ..Default::default()
    };
    assert!(patch.validate().is_ok());
}

#[test]
fn difficulty_bounds_are_inclusive() {
    for d in 1..=5u8 {
        let patch = LibraryEntryPatch {
            difficulty: Some(Some(d)),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }
    let zero = LibraryEntryPatch {
        difficulty: Some(Some(0)),
        ..Default::default()
    };
    assert!(zero.validate().is_err());
}

#[test]
fn completed_before_started_is_rejected() {
    let patch = LibraryEntryPatch {
        started_at: Some(Some(t0())),
        completed_at: Some(Some(t0() - Duration::days(1))),
        ..Default::default()
    };
    let err = apply_patch(&fresh(), &patch, t0()).unwrap_err();
    assert!(err.has_field("completedAt"));
}

#[test]
fn derived_started_at_never_follows_completed_at() {
    let finished = t0() - Duration::days(30);
    let patch = LibraryEntryPatch {
        completed_at: Some(Some(finished)),
        ..Default::default()
    };
    let entry = apply_patch(&fresh(), &patch, t0()).unwrap();
    assert_eq!(entry.status, PlayStatus::PlanToPlay);
    assert_eq!(entry.started_at, None);

    let later = t0() + Duration::hours(1);
    let next = apply_patch(&entry, &LibraryEntryPatch::status(PlayStatus::Playing), later).unwrap();
    assert_eq!(next.status, PlayStatus::Playing);
    assert_eq!(next.started_at, Some(finished));
    assert_eq!(next.completed_at, Some(finished));
    assert_eq!(next.play_duration_days(), Some(0));
}

#[test]
fn derived_completed_at_never_precedes_started_at() {
    let mut entry = fresh();
    let planned_start = t0() + Duration::days(2);
    entry.status = PlayStatus::Playing;
    entry.started_at = Some(planned_start);

    let next =
        apply_patch(&entry, &LibraryEntryPatch::status(PlayStatus::Completed), t0()).unwrap();
    assert_eq!(next.completed_at, Some(planned_start));
}

#[test]
fn explicit_started_at_wins_over_transition() {
    let chosen = t0() - Duration::days(30);
    let patch = LibraryEntryPatch {
        status: Some(PlayStatus::Completed),
        started_at: Some(Some(chosen)),
        ..Default::default()
    };
    let next = apply_patch(&fresh(), &patch, t0()).unwrap();
    assert_eq!(next.started_at, Some(chosen));
    assert_eq!(next.completed_at, Some(t0()));
    assert_eq!(next.play_duration_days(), Some(30));
}

#[test]
fn play_duration_rounds_up() {
    let start = t0();
    assert_eq!(play_duration_days(Some(start), Some(start)), Some(0));
    assert_eq!(
        play_duration_days(Some(start), Some(start + Duration::seconds(1))),
        Some(1)
    );
    assert_eq!(
        play_duration_days(Some(start), Some(start + Duration::days(2))),
        Some(2)
    );
    assert_eq!(
        play_duration_days(Some(start), Some(start + Duration::days(2) + Duration::hours(1))),
        Some(3)
    );
    assert_eq!(play_duration_days(None, Some(start)), None);
    assert_eq!(play_duration_days(Some(start), None), None);
}

#[test]
fn patch_deserializes_from_camel_case_json() {
    let patch: LibraryEntryPatch = serde_json::from_str(
        r#"{"playStatus": "on-hold", "personalRating": null, "isFavorite": true, "tags": ["rpg"]}"#,
    )
    .unwrap();
    assert_eq!(patch.status, Some(PlayStatus::OnHold));
    assert_eq!(patch.personal_rating, Some(None));
    assert_eq!(patch.review, None);
    assert_eq!(patch.is_favorite, Some(true));
    assert_eq!(patch.tags, Some(vec!["rpg".to_string()]));
}

#[test]
fn unknown_status_fails_to_deserialize() {
    let result: Result<LibraryEntryPatch, _> = serde_json::from_str(r#"{"status": "beaten"}"#);
    assert!(result.is_err());
    assert!("beaten".parse::<PlayStatus>().is_err());
}

#[test]
fn status_round_trips_through_its_string_form() {
    for status in PlayStatus::ALL {
        assert_eq!(status.as_str().parse::<PlayStatus>().unwrap(), status);
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            format!("\"{}\"", status.as_str())
        );
    }
}

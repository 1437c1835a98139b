use chrono::{DateTime, Duration, TimeZone, Utc};
use gameshelf_core::LibraryEntryPatch;
use gameshelf_core::types::*;
use gameshelf_db::*;

fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn game(id: GameId, name: &str) -> CatalogGame {
    CatalogGame {
        id,
        name: name.to_string(),
        slug: None,
        genres: vec![],
        platforms: vec![],
        release_date: None,
        rating: None,
        background_image: None,
        description: None,
        developers: Vec::new(),
        website: None,
    }
}

fn user(conn: &rusqlite::Connection, username: &str) -> User {
    create_user(
        conn,
        &NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password_hash: "hash".to_string(),
        },
        t(0),
    )
    .unwrap()
}

fn set(
    conn: &rusqlite::Connection,
    user_id: UserId,
    game_id: GameId,
    patch: LibraryEntryPatch,
    at: DateTime<Utc>,
) {
    update_entry(conn, user_id, game_id, &patch, at).unwrap();
}

/// alice: Hades completed (9), Celeste playing (7), Outer Wilds planned.
fn setup_db() -> (rusqlite::Connection, User) {
    let conn = open_memory().unwrap();
    let alice = user(&conn, "alice");
    add_to_library(&conn, alice.id, &game(1, "Hades"), None, t(1)).unwrap();
    add_to_library(&conn, alice.id, &game(2, "Celeste"), None, t(2)).unwrap();
    add_to_library(&conn, alice.id, &game(3, "Outer Wilds"), None, t(3)).unwrap();

    set(
        &conn,
        alice.id,
        1,
        LibraryEntryPatch {
            status: Some(PlayStatus::Completed),
            personal_rating: Some(Some(9.0)),
            review: Some(Some("Every run feels fresh.".to_string())),
            ..Default::default()
        },
        t(10),
    );
    set(
        &conn,
        alice.id,
        2,
        LibraryEntryPatch {
            status: Some(PlayStatus::Playing),
            personal_rating: Some(Some(7.0)),
            ..Default::default()
        },
        t(5),
    );
    (conn, alice)
}

#[test]
fn list_library_orders_by_last_update() {
    let (conn, alice) = setup_db();
    let items = list_library(&conn, alice.id, None).unwrap();
    let names: Vec<_> = items.iter().map(|i| i.game.name.as_str()).collect();
    assert_eq!(names, vec!["Hades", "Celeste", "Outer Wilds"]);
    assert_eq!(items[0].play_duration_days, Some(0));
    assert_eq!(items[2].play_duration_days, None);
}

#[test]
fn list_library_filters_by_status() {
    let (conn, alice) = setup_db();
    let playing = list_library(&conn, alice.id, Some(PlayStatus::Playing)).unwrap();
    assert_eq!(playing.len(), 1);
    assert_eq!(playing[0].game.id, 2);

    let dropped = list_library(&conn, alice.id, Some(PlayStatus::Dropped)).unwrap();
    assert!(dropped.is_empty());
}

#[test]
fn empty_library_lists_nothing() {
    let conn = open_memory().unwrap();
    let bob = user(&conn, "bob");
    assert!(list_library(&conn, bob.id, None).unwrap().is_empty());
    let stats = library_stats(&conn, bob.id).unwrap();
    assert_eq!(stats.total_games, 0);
    assert_eq!(stats.average_rating, None);
}

#[test]
fn stats_reflect_current_entries() {
    let (conn, alice) = setup_db();
    let stats = library_stats(&conn, alice.id).unwrap();
    assert_eq!(stats.total_games, 3);
    assert_eq!(stats.completed_count, 1);
    assert_eq!(stats.playing_count, 1);
    assert_eq!(stats.average_rating, Some(8.0));

    remove_entry(&conn, alice.id, 1).unwrap();
    let stats = library_stats(&conn, alice.id).unwrap();
    assert_eq!(stats.total_games, 2);
    assert_eq!(stats.completed_count, 0);
    assert_eq!(stats.average_rating, Some(7.0));
}

#[test]
fn profile_combines_user_stats_and_follows() {
    let (conn, alice) = setup_db();
    let bob = user(&conn, "bob");
    let carol = user(&conn, "carol");
    follow(&conn, bob.id, alice.id, t(20)).unwrap();
    follow(&conn, carol.id, alice.id, t(21)).unwrap();
    follow(&conn, alice.id, bob.id, t(22)).unwrap();

    assert_eq!(follow_counts(&conn, alice.id).unwrap(), (2, 1));

    let profile = user_profile(&conn, alice.id).unwrap().unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.stats.total_games, 3);
    assert_eq!(profile.followers, 2);
    assert_eq!(profile.following, 1);
    assert!(user_profile(&conn, 999).unwrap().is_none());
}

#[test]
fn follow_lists_are_newest_first() {
    let conn = open_memory().unwrap();
    let alice = user(&conn, "alice");
    let bob = user(&conn, "bob");
    let carol = user(&conn, "carol");
    follow(&conn, bob.id, alice.id, t(1)).unwrap();
    follow(&conn, carol.id, alice.id, t(2)).unwrap();

    let names: Vec<_> = followers(&conn, alice.id)
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["carol", "bob"]);

    let bobs: Vec<_> = following(&conn, bob.id)
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(bobs, vec![alice.id]);
    assert!(following(&conn, alice.id).unwrap().is_empty());
}

#[test]
fn search_users_is_case_insensitive_and_skips_inactive() {
    let conn = open_memory().unwrap();
    user(&conn, "GameFan");
    user(&conn, "gamer_girl");
    let gone = user(&conn, "gamesleeper");
    user(&conn, "someone");
    set_user_active(&conn, gone.id, false, t(1)).unwrap();

    let names: Vec<_> = search_users(&conn, "game", 10)
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["GameFan", "gamer_girl"]);

    assert_eq!(search_users(&conn, "game", 1).unwrap().len(), 1);
}

#[test]
fn search_treats_wildcards_literally() {
    let conn = open_memory().unwrap();
    user(&conn, "under_score");
    user(&conn, "underscore");

    let hits = search_users(&conn, "r_s", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username, "under_score");
    assert!(search_users(&conn, "%", 10).unwrap().is_empty());
}

#[test]
fn reviews_and_community_rating() {
    let (conn, alice) = setup_db();
    let bob = user(&conn, "bob");
    add_to_library(&conn, bob.id, &game(1, "Hades"), None, t(30)).unwrap();
    set(
        &conn,
        bob.id,
        1,
        LibraryEntryPatch {
            personal_rating: Some(Some(6.0)),
            ..Default::default()
        },
        t(31),
    );

    let reviews = reviews_for_game(&conn, 1).unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].user_id, alice.id);
    assert_eq!(reviews[0].username, "alice");
    assert_eq!(reviews[0].rating, Some(9.0));

    assert_eq!(community_rating(&conn, 1).unwrap(), Some(7.5));
    assert_eq!(community_rating(&conn, 3).unwrap(), None);
    assert!(reviews_for_game(&conn, 42).unwrap().is_empty());
}

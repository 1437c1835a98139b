use super::*;

const DETAIL_JSON: &str = r#"{
    "id": 3498,
    "slug": "grand-theft-auto-v",
    "name": "Grand Theft Auto V",
    "released": "2013-09-17",
    "background_image": "https://media.rawg.io/media/games/gta.jpg",
    "rating": 4.47,
    "ratings_count": 6900,
    "description_raw": "Rockstar Games went bigger.",
    "platforms": [
        {"platform": {"id": 4, "name": "PC", "slug": "pc"}, "released_at": "2013-09-17"},
        {"platform": {"id": 187, "name": "PlayStation 5", "slug": "playstation5"}}
    ],
    "genres": [{"id": 4, "name": "Action", "slug": "action"}],
    "developers": [{"id": 3524, "name": "Rockstar North", "slug": "rockstar-north"}],
    "website": "http://www.rockstargames.com/V/",
    "metacritic": 92
}"#;

#[test]
fn detail_record_converts_to_catalog_game() {
    let raw: RawgGame = serde_json::from_str(DETAIL_JSON).unwrap();
    let game = CatalogGame::from(raw);
    assert_eq!(game.id, 3498);
    assert_eq!(game.name, "Grand Theft Auto V");
    assert_eq!(game.slug.as_deref(), Some("grand-theft-auto-v"));
    assert_eq!(game.platforms, vec!["PC", "PlayStation 5"]);
    assert_eq!(game.genres, vec!["Action"]);
    assert_eq!(game.release_date, NaiveDate::from_ymd_opt(2013, 9, 17));
    assert_eq!(game.rating, Some(4.47));
    assert_eq!(game.description.as_deref(), Some("Rockstar Games went bigger."));
    assert_eq!(game.developers, vec!["Rockstar North"]);
    assert_eq!(game.website.as_deref(), Some("http://www.rockstargames.com/V/"));
}

#[test]
fn genre_names_become_slugs() {
    assert_eq!(genre_slug("Action"), "action");
    assert_eq!(genre_slug("Massively Multiplayer"), "massively-multiplayer");
    assert_eq!(genre_slug("  Board  Games "), "board-games");
}

#[test]
fn null_collections_become_empty() {
    let raw: RawgGame = serde_json::from_str(
        r#"{"id": 1, "name": "Obscure", "platforms": null, "genres": null, "released": null}"#,
    )
    .unwrap();
    let game = CatalogGame::from(raw);
    assert!(game.platforms.is_empty());
    assert!(game.genres.is_empty());
    assert!(game.developers.is_empty());
    assert_eq!(game.website, None);
    assert_eq!(game.release_date, None);
}

#[test]
fn bad_release_date_is_dropped() {
    assert_eq!(parse_release_date(Some("2019")), None);
    assert_eq!(parse_release_date(Some("")), None);
    assert_eq!(
        parse_release_date(Some(" 2020-02-29 ")),
        NaiveDate::from_ymd_opt(2020, 2, 29)
    );
}

#[test]
fn blank_description_is_dropped() {
    let raw: RawgGame =
        serde_json::from_str(r#"{"id": 2, "name": "Quiet", "description_raw": "  "}"#).unwrap();
    assert_eq!(CatalogGame::from(raw).description, None);
}

#[test]
fn search_response_becomes_page() {
    let response: RawgSearchResponse = serde_json::from_str(
        r#"{
            "count": 57,
            "next": "https://api.rawg.io/api/games?page=2",
            "previous": null,
            "results": [
                {"id": 10, "name": "Hollow Knight", "genres": [{"name": "Indie"}]},
                {"id": 11, "name": "Hollow Knight: Silksong"}
            ]
        }"#,
    )
    .unwrap();
    let page = CatalogPage::from(response);
    assert_eq!(page.total, 57);
    assert_eq!(page.games.len(), 2);
    assert_eq!(page.games[0].genres, vec!["Indie"]);
    assert_eq!(page.games[1].description, None);
}

use commute_map::aggregate::CountPolicy;
use commute_map::color::Colorizer;
use commute_map::fetch::BasicClient;
use commute_map::loader::load_atlas;
use commute_map::modes::TravelMode;
use commute_map::output::summarize;
use commute_map::render::{Layout, render};
use commute_map::selection::{AppState, Message, ZoomTransform};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

async fn load(table: &str, policy: CountPolicy) -> anyhow::Result<commute_map::atlas::Atlas> {
    let client = BasicClient::new()?;
    load_atlas(&client, &fixture("communities.geojson"), &fixture(table), policy).await
}

#[tokio::test]
async fn test_full_pipeline() {
    let atlas = load("modes_of_travel.csv", CountPolicy::Strict)
        .await
        .expect("Failed to load fixtures");

    assert_eq!(atlas.boundaries().len(), 4);
    assert_eq!(atlas.report().missing_rows, ["02K"]);
    assert_eq!(atlas.report().orphan_rows, ["XYZ"]);

    let totals = atlas.dataset().totals();
    assert_eq!(totals.get(TravelMode::Bicycle), 1050 + 4 + 30);
    for mode in TravelMode::ALL {
        let sum: u64 = atlas.dataset().records().iter().map(|r| r.count(mode)).sum();
        assert_eq!(totals.get(mode), sum);
    }

    let sectors = atlas.dataset().sectors();
    assert_eq!(sectors.len(), 3);
    assert!(sectors.get("WEST").is_none());
    for mode in TravelMode::ALL {
        let across: u64 = sectors.iter().map(|(_, t)| t.get(mode)).sum();
        assert_eq!(across, totals.get(mode));
    }

    let bel = atlas.record("BEL").unwrap();
    assert_eq!(bel.count(TravelMode::Drovealone), 4210);
    assert_eq!(bel.sum, 1050 + 120 + 95 + 4210 + 12 + 1300 + 3900 + 5400 + 610);
}

#[tokio::test]
async fn test_render_svg_with_selection() {
    let atlas = load("modes_of_travel.csv", CountPolicy::Strict).await.unwrap();
    let colorizer = Colorizer::default();
    let layout = Layout::default();

    let mut state = AppState::new(TravelMode::Bicycle);
    state.update(Message::Click("ABB".into()), &colorizer).unwrap();

    let scene = render(&atlas, &state, &colorizer, &layout);
    assert_eq!(scene.shape("ABB").unwrap().fill.as_str(), "#f58231");
    assert_eq!(scene.shape("BEL").unwrap().fill.as_str(), "#084594");
    assert_eq!(scene.shape("ACA").unwrap().fill.as_str(), "#4292c6");
    assert_eq!(scene.shape("02K").unwrap().fill.as_str(), "#f7fbff");

    let svg = scene.to_svg();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"id="MAPIDABB""#));
    assert!(svg.contains(r#"id="BARIDABB""#));
    assert!(svg.contains("02K INDUSTRIAL &amp; RAIL"));
    assert!(svg.contains("non-residential community"));
    assert!(svg.contains("CYCLING TO WORK"));
    assert!(svg.contains("1050 people who live in the CENTRE sector bicycle to work"));
    assert!(svg.contains(r#"<g class="communities" transform="translate(0,0) scale(1)">"#));
    assert!(!svg.contains(r#"id="BARID02K""#));

    state
        .update(Message::Zoom(ZoomTransform::new(10.0, -30.0, 12.5)), &colorizer)
        .unwrap();
    let svg = render(&atlas, &state, &colorizer, &layout).to_svg();
    assert!(svg.contains(r#"<g class="communities" transform="translate(-30,12.5) scale(8)">"#));

    // Deselect and switch mode: the re-render drops the highlight.
    state.update(Message::Click("ABB".into()), &colorizer).unwrap();
    state
        .update(Message::ChangeMode(TravelMode::Transit), &colorizer)
        .unwrap();
    let scene = render(&atlas, &state, &colorizer, &layout);
    assert!(scene.shapes.iter().all(|s| !s.highlighted));
    assert!(scene.to_svg().contains("TAKING TRANSIT TO WORK"));
}

#[tokio::test]
async fn test_malformed_count_is_reported() {
    let err = load("modes_bad_count.csv", CountPolicy::Strict)
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("'walk'"), "{message}");
    assert!(message.contains("row 1"), "{message}");

    let atlas = load("modes_bad_count.csv", CountPolicy::Zero).await.unwrap();
    assert_eq!(atlas.record("BEL").unwrap().count(TravelMode::Walk), 0);
    assert_eq!(atlas.dataset().totals().get(TravelMode::Walk), 25);
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
    let client = BasicClient::new().unwrap();
    let result = load_atlas(
        &client,
        &fixture("communities.geojson"),
        &fixture("does_not_exist.csv"),
        CountPolicy::Strict,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_summary_matches_scene_colours() {
    let atlas = load("modes_of_travel.csv", CountPolicy::Strict).await.unwrap();
    let colorizer = Colorizer::default();
    let scene = render(&atlas, &AppState::new(TravelMode::Walk), &colorizer, &Layout::default());

    for row in summarize(&atlas, TravelMode::Walk, &colorizer) {
        assert_eq!(scene.shape(&row.comm_code).unwrap().fill, row.color);
    }
}

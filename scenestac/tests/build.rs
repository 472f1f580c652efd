use std::collections::HashMap;
use std::fs;
use std::path::Path;

use insta::assert_json_snapshot;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use scenestac::config::{Config, read_config};
use scenestac::{ScenestacError, build_catalog, inspect_catalog};
use scenestac_core::publish::CatalogSummary;
use scenestac_core::{CatalogError, RecordError};
use scenestac_geo_utils::Bbox;
use serde_json::json;
use tempfile::TempDir;

const S4_SCENE: &str = "S4_07603_4652_20060115_m20_lcc00";
const S5_SCENE: &str = "S5_07604_4652_20070310_m20_lcc00";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }

    /// Writes a footprint index with one 0.5° square per scene, side by side.
    fn write_index(&self, names: &[&str]) -> String {
        let features: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                #[allow(clippy::cast_precision_loss)]
                let x = -75.0 + i as f64;
                json!({
                    "type": "Feature",
                    "properties": {"NAME": name},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[x, 45.0], [x + 0.5, 45.0], [x + 0.5, 45.5], [x, 45.5], [x, 45.0]]]
                    }
                })
            })
            .collect();
        let path = self.path("footprints.geojson");
        let collection = json!({"type": "FeatureCollection", "features": features});
        fs::write(&path, collection.to_string()).unwrap();
        path
    }

    /// The built-in Geobase config, reading `names` and publishing into the workspace.
    fn config(&self, names: &[&str]) -> Config {
        let vars: HashMap<String, String> = [
            ("SCENESTAC_INPUT", self.write_index(names)),
            ("SCENESTAC_DESTINATION", self.path("stac")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let mut config = read_config(None, &vars).unwrap();
        config.resolver.manifest = None;
        config.resolver.thumbnail_template =
            Some("https://geobase-spot.example.com/thumbnails/{id}.jpg".to_string());
        config.finalize().unwrap();
        config
    }
}

#[fixture]
fn workspace() -> Workspace {
    Workspace {
        dir: tempfile::tempdir().unwrap(),
    }
}

fn ignore_progress(_: usize, _: usize) {}

#[rstest]
#[tokio::test]
async fn builds_and_inspects_the_geobase_layout(workspace: Workspace) {
    let config = workspace.config(&[S4_SCENE, S5_SCENE]);
    let outcome = build_catalog(&config, false, &mut ignore_progress)
        .await
        .unwrap();
    assert_eq!(outcome.report.documents, 8);
    assert!(Path::new(&workspace.path("stac/catalog.json")).is_file());

    let summary = inspect_catalog(&workspace.path("stac")).await.unwrap();
    assert_eq!(summary, CatalogSummary::of_tree(&outcome.tree));
    assert_json_snapshot!(summary.catalogs, @r#"
    [
      "Geobase",
      "canada_spot_orthoimages",
      "S4_2006",
      "S5_2007"
    ]
    "#);

    let spot4 = &summary.collections[0];
    assert_eq!(spot4.id, "canada_spot4_orthoimages");
    assert_eq!(spot4.bbox, vec![Bbox::new(-75.0, 45.0, -74.5, 45.5)]);
    assert_eq!(
        spot4.interval,
        vec![[
            Some("2005-05-01T00:00:00Z".to_string()),
            Some("2010-10-31T00:00:00Z".to_string())
        ]]
    );
    assert_eq!(summary.items[1].id, S5_SCENE);
    assert_eq!(
        summary.items[1].assets["thumbnail"],
        format!("https://geobase-spot.example.com/thumbnails/{S5_SCENE}.jpg")
    );

    let collection: serde_json::Value = serde_json::from_slice(
        &fs::read(workspace.path(
            "stac/canada_spot_orthoimages/canada_spot5_orthoimages/collection.json",
        ))
        .unwrap(),
    )
    .unwrap();
    assert_eq!(collection["license"], "proprietary");
    assert_eq!(collection["summaries"]["platform"], json!(["SPOT 5"]));
    assert_eq!(collection["providers"][2]["name"], "Sparkgeo");
}

#[rstest]
#[tokio::test]
async fn dry_run_writes_nothing(workspace: Workspace) {
    let config = workspace.config(&[S4_SCENE, S5_SCENE]);
    let outcome = build_catalog(&config, true, &mut ignore_progress)
        .await
        .unwrap();
    assert_eq!(outcome.report.documents, 8);
    assert!(outcome.base_url.starts_with("file://"));
    assert!(!Path::new(&workspace.path("stac")).exists());
}

#[rstest]
#[tokio::test]
async fn unknown_sensor_fails_before_publishing(workspace: Workspace) {
    let config = workspace.config(&[S4_SCENE, "S9_07603_4652_20060115_m20_lcc00", S5_SCENE]);
    let err = build_catalog(&config, false, &mut ignore_progress)
        .await
        .unwrap_err();
    let ScenestacError::CatalogError(CatalogError::Record { index, id, source }) = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(*index, 1);
    assert_eq!(id, "S9_07603_4652_20060115_m20_lcc00");
    assert!(matches!(source, RecordError::Parse(_)));
    assert!(!Path::new(&workspace.path("stac")).exists());
}

#[rstest]
#[tokio::test]
async fn missing_index(workspace: Workspace) {
    let mut config = workspace.config(&[S4_SCENE]);
    config.input = Some(workspace.dir.path().join("nope.geojson"));
    let err = build_catalog(&config, false, &mut ignore_progress)
        .await
        .unwrap_err();
    assert!(matches!(err, ScenestacError::IndexError(_)), "{err}");
}

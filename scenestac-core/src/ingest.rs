use scenestac_geo_utils::{Bbox, Reprojector};
use tracing::{debug, info, warn};

use crate::builder::TreeBuilder;
use crate::index::SceneIndex;
use crate::model::CatalogTree;
use crate::parser::{parse, record_name};
use crate::resolver::{AssetResolver, SceneAssets};
use crate::{BuildError, CatalogError, CatalogResult, RecordError, TransportError};

/// Progress callback: the number of records processed so far and the total.
pub trait IngestObserver {
    fn on_record(&mut self, done: usize, total: usize);
}

impl<F: FnMut(usize, usize)> IngestObserver for F {
    fn on_record(&mut self, done: usize, total: usize) {
        self(done, total);
    }
}

/// Reads every record of `index` in order and builds the finalized catalog tree.
///
/// The first record that fails to parse, reproject or resolve aborts the run.
/// Duplicate scenes are logged and skipped here, and reported together by
/// [`TreeBuilder::finalize`].
pub async fn ingest(
    index: &SceneIndex,
    reprojector: &Reprojector,
    resolver: &dyn AssetResolver,
    mut builder: TreeBuilder,
    observer: &mut dyn IngestObserver,
) -> CatalogResult<CatalogTree> {
    let total = index.len();
    let bounds = reprojector.reproject_bbox(index.bounds())?;
    info!(
        "Ingesting {total} scenes from {} ({} to {}), extent {bounds}",
        index.path().display(),
        reprojector.source_crs(),
        reprojector.target_crs(),
    );

    for record in index.records() {
        let record_id = record_name(&record).unwrap_or("<unnamed>");
        let fail = |e: RecordError| CatalogError::record(record.index, record_id, e);

        let scene = parse(&record, builder.sensors()).map_err(|e| fail(e.into()))?;
        let geometry = reprojector
            .reproject_geometry(&scene.geometry)
            .map_err(|e| fail(e.into()))?;
        if Bbox::of_geometry(&geometry.value).is_degenerate() {
            warn!(
                "Scene {} (record #{}) has an empty or zero-area geometry",
                scene.id, scene.index
            );
        }

        let resolved = if builder.contains_item(&scene.id) {
            SceneAssets::default()
        } else {
            resolver
                .resolve(&scene.id)
                .await
                .map_err(|e| fail(TransportError::from(e).into()))?
        };

        match builder.add_item(&scene, geometry, &resolved) {
            Ok(()) => debug!("Record #{} added as {}", scene.index, scene.id),
            Err(BuildError::DuplicateItem(duplicate)) => warn!("Skipping duplicate {duplicate}"),
            Err(e) => return Err(fail(e.into())),
        }
        observer.on_record(record.index + 1, total);
    }

    let tree = builder.finalize()?;
    info!(
        "Built catalog {} with {} collections and {} items",
        tree.root().id,
        tree.collections().count(),
        tree.items().count()
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use geojson::GeoJson;
    use scenestac_geo_utils::Crs;
    use tracing_test::traced_test;

    use super::*;
    use crate::{ParseError, ResolverError, ResolverResult};
    use crate::resolver::ManifestResolver;
    use crate::test_utils::layout;

    fn square(i: usize) -> String {
        format!(
            r#"{{"type": "Polygon", "coordinates":
                [[[{i}.0, 45.0], [{i}.5, 45.0], [{i}.5, 45.5], [{i}.0, 45.0]]]}}"#
        )
    }

    fn point(i: usize) -> String {
        format!(r#"{{"type": "Point", "coordinates": [{i}.5, 45.0]}}"#)
    }

    fn index_with(names: &[&str], geometry: fn(usize) -> String) -> SceneIndex {
        let features: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                format!(
                    r#"{{"type": "Feature", "properties": {{"NAME": "{name}"}}, "geometry": {}}}"#,
                    geometry(i)
                )
            })
            .collect();
        let text = format!(
            r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
            features.join(",")
        );
        let geojson: GeoJson = text.parse().unwrap();
        SceneIndex::from_geojson(geojson, "index.geojson".into(), None).unwrap()
    }

    fn resolver() -> ManifestResolver {
        ManifestResolver::from_template("https://example.com/t/{id}.jpg".to_string())
    }

    async fn run_index(index: &SceneIndex, resolver: &dyn AssetResolver) -> CatalogResult<CatalogTree> {
        let reprojector = Reprojector::to_wgs84(&Crs::WGS84).unwrap();
        let mut calls = Vec::new();
        let mut observer = |done: usize, total: usize| calls.push((done, total));
        let result = ingest(
            index,
            &reprojector,
            resolver,
            TreeBuilder::new(layout()),
            &mut observer,
        )
        .await;
        if result.is_ok() {
            assert_eq!(calls.last().copied(), Some((index.len(), index.len())));
        }
        result
    }

    async fn run(names: &[&str], resolver: &dyn AssetResolver) -> CatalogResult<CatalogTree> {
        run_index(&index_with(names, square), resolver).await
    }

    #[tokio::test]
    async fn builds_in_input_order() {
        let tree = run(
            &[
                "S5_07603_4652_20070310_m20_lcc00",
                "S4_07603_4652_20060115_m20_lcc00",
                "S4_07603_4652_20060116_m20_lcc00",
            ],
            &resolver(),
        )
        .await
        .unwrap();
        let ids: Vec<_> = tree.collections().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["spot5", "spot4"]);
        let items: Vec<_> = tree.items().map(|i| i.id.as_str()).collect();
        assert_eq!(
            items,
            vec![
                "S5_07603_4652_20070310_m20_lcc00",
                "S4_07603_4652_20060115_m20_lcc00",
                "S4_07603_4652_20060116_m20_lcc00",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_sensor_aborts() {
        let err = run(
            &["S4_07603_4652_20060115_m20_lcc00", "X1_07603_4652_20060115_m20_lcc00"],
            &resolver(),
        )
        .await
        .unwrap_err();
        let CatalogError::Record { index, id, source } = &err else {
            panic!("unexpected {err}");
        };
        assert_eq!(*index, 1);
        assert_eq!(id, "X1_07603_4652_20060115_m20_lcc00");
        assert!(matches!(source, RecordError::Parse(ParseError::UnknownSensor(c)) if c == "X1"));
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    #[traced_test]
    async fn duplicates_fail_after_the_whole_pass() {
        let err = run(
            &[
                "S4_07603_4652_20060115_m20_lcc00",
                "S4_07603_4652_20060115_m20_lcc00",
                "S5_07603_4652_20070310_m20_lcc00",
                "S4_07603_4652_20060115_m20_lcc00",
            ],
            &resolver(),
        )
        .await
        .unwrap_err();
        let CatalogError::Build(BuildError::DuplicateItems(duplicates)) = &err else {
            panic!("unexpected {err}");
        };
        let indices: Vec<_> = duplicates.iter().map(|d| (d.first_index, d.index)).collect();
        assert_eq!(indices, vec![(0, 1), (0, 3)]);
        assert!(logs_contain("Skipping duplicate S4_07603_4652_20060115_m20_lcc00"));
    }

    #[tokio::test]
    #[traced_test]
    async fn point_footprints_fail_validation() {
        let index = index_with(&["S4_07603_4652_20060115_m20_lcc00"], point);
        let err = run_index(&index, &resolver()).await.unwrap_err();
        let CatalogError::Build(BuildError::Inconsistent(problems)) = &err else {
            panic!("unexpected {err}");
        };
        assert_eq!(
            problems,
            &vec!["collection spot4 has 1 item(s) but a degenerate spatial extent [0.5, 45, 0.5, 45]".to_string()]
        );
        assert!(logs_contain("has an empty or zero-area geometry"));
    }

    #[tokio::test]
    async fn scenes_are_parsed_with_the_builder_sensors() {
        let mut layout = layout();
        layout.sensors = layout
            .sensors
            .codes()
            .filter(|code| *code == "S4")
            .filter_map(|code| Some((code.to_string(), layout.sensors.get(code)?.clone())))
            .collect();
        let index = index_with(
            &["S4_07603_4652_20060115_m20_lcc00", "S5_07603_4652_20070310_m20_lcc00"],
            square,
        );
        let reprojector = Reprojector::to_wgs84(&Crs::WGS84).unwrap();
        let mut ignore = |_: usize, _: usize| {};
        let err = ingest(
            &index,
            &reprojector,
            &resolver(),
            TreeBuilder::new(layout),
            &mut ignore,
        )
        .await
        .unwrap_err();
        let CatalogError::Record { index, source, .. } = &err else {
            panic!("unexpected {err}");
        };
        assert_eq!(*index, 1);
        assert!(matches!(source, RecordError::Parse(ParseError::UnknownSensor(c)) if c == "S5"));
    }

    #[derive(Debug)]
    struct Offline;

    #[async_trait]
    impl AssetResolver for Offline {
        async fn list_assets(&self, scene_id: &str) -> ResolverResult<Vec<String>> {
            Err(ResolverError::NotFound(scene_id.to_string()))
        }

        async fn thumbnail(&self, scene_id: &str) -> ResolverResult<String> {
            Err(ResolverError::NotFound(scene_id.to_string()))
        }
    }

    #[tokio::test]
    async fn resolver_failure_aborts() {
        let err = run(&["S4_07603_4652_20060115_m20_lcc00"], &Offline)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().starts_with("Record #0 (S4_07603_4652_20060115_m20_lcc00) failed"));
    }
}

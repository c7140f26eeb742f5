#![cfg(feature = "rayon")]

use featmatch::{
    FeatureConfig, FeatureEngine, MatchStrategy, Raster, TemplateConfig, TemplateMatcher,
    TemplateMethod,
};

fn make_image(width: usize, height: usize) -> Raster {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    Raster::gray(data, width, height).unwrap()
}

fn extract_patch(src: &Raster, x0: usize, y0: usize, width: usize, height: usize) -> Raster {
    let mut data = Vec::with_capacity(width * height);
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            data.push(src.pixel(x, y).unwrap()[0]);
        }
    }
    Raster::gray(data, width, height).unwrap()
}

#[test]
fn parallel_keypoints_match_sequential() {
    let image = make_image(160, 120);
    let sequential = FeatureEngine::new();
    let parallel = FeatureEngine::new().with_config(FeatureConfig {
        parallel: true,
        ..FeatureConfig::default()
    });
    let a = sequential.extract(&image);
    let b = parallel.extract(&image);
    assert!(!a.is_empty());
    assert_eq!(a, b);

    let capped = FeatureConfig {
        max_keypoints: 7,
        ..FeatureConfig::default()
    };
    let a = FeatureEngine::new().with_config(capped).extract(&image);
    let b = FeatureEngine::new()
        .with_config(FeatureConfig {
            parallel: true,
            ..capped
        })
        .extract(&image);
    assert_eq!(a, b);
}

#[test]
fn parallel_descriptor_matching_is_ordered() {
    let engine = FeatureEngine::new();
    let a = engine.extract(&make_image(128, 96));
    let b = engine.extract(&make_image(96, 128));
    for strategy in [MatchStrategy::ssd(), MatchStrategy::ncc(), MatchStrategy::ratio()] {
        let matches = engine.match_descriptors(&a, &b, strategy);
        for pair in matches.windows(2) {
            assert!(pair[0].query_idx < pair[1].query_idx);
        }
    }
}

#[test]
fn parallel_engine_matches_like_sequential() {
    let sequential = FeatureEngine::new();
    let parallel = FeatureEngine::new().with_config(FeatureConfig {
        parallel: true,
        ..FeatureConfig::default()
    });
    let a = sequential.extract(&make_image(128, 96));
    let b = sequential.extract(&make_image(96, 128));
    assert!(!a.is_empty() && !b.is_empty());
    for strategy in [MatchStrategy::ssd(), MatchStrategy::ncc(), MatchStrategy::ratio()] {
        assert_eq!(
            sequential.match_descriptors(&a, &b, strategy),
            parallel.match_descriptors(&a, &b, strategy)
        );
    }
}

#[test]
fn parallel_template_scan_matches_sequential() {
    let image = make_image(150, 110);
    let template = extract_patch(&image, 40, 25, 32, 24);
    let sequential = TemplateMatcher::new();
    let parallel = TemplateMatcher::new().with_config(TemplateConfig { parallel: true });

    for method in [TemplateMethod::Ssd, TemplateMethod::Ncc] {
        let a = sequential.locate(&image, &template, method).unwrap();
        let b = parallel.locate(&image, &template, method).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.map(|m| (m.x, m.y)), Some((40, 25)));

        let map_a = sequential.score_map(&image, &template, method).unwrap();
        let map_b = parallel.score_map(&image, &template, method).unwrap();
        assert_eq!(map_a, map_b);
    }
}

#[test]
fn parallel_scan_keeps_first_of_tied_windows() {
    let image = Raster::filled(40, 30, featmatch::Channels::Gray, 90);
    let template = Raster::filled(8, 6, featmatch::Channels::Gray, 90);
    let parallel = TemplateMatcher::new().with_config(TemplateConfig { parallel: true });
    let found = parallel
        .locate(&image, &template, TemplateMethod::Ssd)
        .unwrap()
        .unwrap();
    assert_eq!((found.x, found.y, found.score), (0, 0, 0.0));
}

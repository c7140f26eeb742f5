use featmatch::{
    Channels, FeatMatchError, Raster, Rgb, TemplateConfig, TemplateMatcher, TemplateMethod,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn noise_image(width: usize, height: usize, seed: u64) -> Raster {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height).map(|_| rng.random_range(0..=255)).collect();
    Raster::gray(data, width, height).unwrap()
}

fn crop(src: &Raster, x0: usize, y0: usize, width: usize, height: usize) -> Raster {
    let channels = src.channels().count();
    let mut data = Vec::with_capacity(width * height * channels);
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            data.extend_from_slice(src.pixel(x, y).unwrap());
        }
    }
    Raster::new(data, width, height, src.channels()).unwrap()
}

#[test]
fn ssd_finds_exact_crop_with_zero_score() {
    let image = noise_image(64, 48, 21);
    let template = crop(&image, 5, 7, 16, 12);
    let found = TemplateMatcher::new()
        .locate(&image, &template, TemplateMethod::Ssd)
        .unwrap()
        .unwrap();
    assert_eq!((found.x, found.y), (5, 7));
    assert_eq!(found.score, 0.0);
}

#[test]
fn ncc_finds_exact_crop_with_unit_score() {
    let image = noise_image(64, 48, 22);
    let template = crop(&image, 30, 20, 16, 12);
    let found = TemplateMatcher::new()
        .locate(&image, &template, TemplateMethod::Ncc)
        .unwrap()
        .unwrap();
    assert_eq!((found.x, found.y), (30, 20));
    assert!((found.score - 1.0).abs() < 1e-4, "score {}", found.score);
    assert!(found.score <= 1.0);
}

#[test]
fn ncc_ignores_brightness_and_contrast() {
    let image = noise_image(48, 40, 23);
    let template = crop(&image, 11, 9, 12, 10);
    let data = template.data().iter().map(|&v| v / 2 + 40).collect();
    let adjusted = Raster::gray(data, 12, 10).unwrap();
    let found = TemplateMatcher::new()
        .locate(&image, &adjusted, TemplateMethod::Ncc)
        .unwrap()
        .unwrap();
    assert_eq!((found.x, found.y), (11, 9));
    assert!(found.score > 0.99);
}

#[test]
fn annotated_output_has_one_rectangle() {
    let image = noise_image(64, 48, 24);
    let template = crop(&image, 5, 7, 16, 12);
    let matcher = TemplateMatcher::new();

    for method in [TemplateMethod::Ssd, TemplateMethod::Ncc] {
        let out = matcher
            .match_and_annotate(&image, &template, method)
            .unwrap()
            .unwrap();
        assert_eq!((out.width(), out.height()), (64, 48));
        assert_eq!(out.channels(), Channels::Rgb);

        let color = method.color().to_array();
        assert_eq!(out.pixel(5, 7), Some(&color[..]));
        assert_eq!(out.pixel(20, 18), Some(&color[..]));

        let original = image.to_rgb();
        for (x, y) in [(0, 0), (12, 12), (63, 47), (40, 30)] {
            assert_eq!(out.pixel(x, y), original.pixel(x, y), "pixel ({x}, {y})");
        }
    }
    assert_eq!(TemplateMethod::Ssd.color(), Rgb::RED);
    assert_eq!(TemplateMethod::Ncc.color(), Rgb::GREEN);
}

#[test]
fn rgb_inputs_are_matched_in_gray() {
    let gray = noise_image(40, 30, 25);
    let image = gray.to_rgb();
    let template = crop(&gray, 9, 4, 8, 8);
    let found = TemplateMatcher::new()
        .locate(&image, &template, TemplateMethod::Ssd)
        .unwrap()
        .unwrap();
    assert_eq!((found.x, found.y), (9, 4));
}

#[test]
fn score_map_covers_every_placement() {
    let image = noise_image(20, 15, 26);
    let template = crop(&image, 3, 2, 6, 4);
    let matcher = TemplateMatcher::new();

    let map = matcher
        .score_map(&image, &template, TemplateMethod::Ssd)
        .unwrap();
    assert_eq!((map.width(), map.height()), (15, 12));
    assert_eq!(map.get(3, 2), Some(0.0));
    assert!(map.data().iter().all(|&v| v >= 0.0));

    let map = matcher
        .score_map(&image, &template, TemplateMethod::Ncc)
        .unwrap();
    assert!(map.data().iter().all(|&v| (-1.0..=1.0).contains(&v)));

    let empty = matcher
        .score_map(&Raster::empty(), &template, TemplateMethod::Ncc)
        .unwrap();
    assert_eq!((empty.width(), empty.height()), (0, 0));
}

#[test]
fn template_equal_to_image_has_single_placement() {
    let image = noise_image(10, 6, 27);
    let found = TemplateMatcher::new()
        .locate(&image, &image, TemplateMethod::Ncc)
        .unwrap()
        .unwrap();
    assert_eq!((found.x, found.y), (0, 0));
}

#[test]
fn oversized_template_is_an_error() {
    let image = noise_image(10, 6, 28);
    let template = noise_image(11, 2, 29);
    let matcher = TemplateMatcher::new().with_config(TemplateConfig { parallel: true });
    assert_eq!(
        matcher
            .match_and_annotate(&image, &template, TemplateMethod::Ssd)
            .unwrap_err(),
        FeatMatchError::TemplateTooLarge {
            tpl_width: 11,
            tpl_height: 2,
            img_width: 10,
            img_height: 6,
        }
    );
}

//! End-to-end element rewriting.

use anyhow::Result;
use respimg::config::PassConfig;
use respimg::test_utils::{RecordingGenerator, fixtures, init_test_logging};
use respimg::transform::ImageTransform;
use respimg::tree::{ElementPath, Node};

fn at(tree: &Node, indices: &[usize]) -> respimg::tree::Element {
    tree.element(&ElementPath::from(indices.to_vec())).cloned().expect("element exists")
}

#[tokio::test]
async fn test_updates_img_elements() -> Result<()> {
    init_test_logging(None);
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("src", "images/test-layer-1.jpg"), ("alt", "Test layer 1")]),
        fixtures::image(&[("src", "images/test-layer-2.jpg"), ("alt", "Test layer 2")]),
    ]);

    let report = transform.transform(&mut tree).await?;
    assert_eq!(report.processed, 2);
    assert_eq!(generator.calls(), 2);

    for (index, name) in [(0, "test-layer-1"), (1, "test-layer-2")] {
        let element = at(&tree, &[index]);
        let src = format!("images/{name}.jpg");
        assert_eq!(element.tag_name, "s-image");
        assert_eq!(element.property("src"), Some(src.as_str()));
        assert_eq!(element.property("alt"), Some(format!("Test layer {}", index + 1).as_str()));
        assert_eq!(element.property("srcset"), Some(format!("{src} 1200w").as_str()));
        assert_eq!(element.property("srcsetwebp"), Some(format!("{src}.webp 1200w").as_str()));
        assert_eq!(element.property("srcsetavif"), Some(format!("{src}.avif 1200w").as_str()));
        assert_eq!(element.property("placeholder"), Some("<svg />"));
    }

    for request in generator.requests() {
        assert!(request.skip_generation);
        assert_eq!(request.widths, None);
        assert_eq!(request.quality, None);
    }
    Ok(())
}

#[tokio::test]
async fn test_elements_without_src_are_untouched() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g").with_width(600), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("alt", "no source")]),
        fixtures::image(&[("src", ""), ("width", "300")]),
    ]);
    let original = tree.clone();

    let report = transform.transform(&mut tree).await?;

    assert_eq!(tree, original);
    assert_eq!(report.unresolved, 2);
    assert_eq!(generator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_explicit_widths() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("src", "a.jpg"), ("width", "500")]),
        fixtures::image(&[("src", "b.jpg"), ("width", "100%")]),
    ]);

    transform.transform(&mut tree).await?;

    let requests = generator.requests();
    let widths_for = |path: &str| {
        requests.iter().find(|r| r.resource_path == path).map(|r| r.widths.clone())
    };
    assert_eq!(widths_for("a.jpg"), Some(Some(vec![500])));
    assert_eq!(widths_for("b.jpg"), Some(None));

    assert_eq!(at(&tree, &[0]).property("width"), Some("500"));
    assert_eq!(at(&tree, &[1]).property("width"), Some("100%"));
    Ok(())
}

#[tokio::test]
async fn test_default_width_precedence_and_stamping() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform = ImageTransform::new(
        PassConfig::new("static", "static/g").with_width(600),
        generator.clone(),
    )?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("src", "explicit.jpg"), ("width", "500")]),
        fixtures::image(&[("src", "implicit.jpg")]),
        fixtures::image(&[("src", "malformed.jpg"), ("width", "100%")]),
    ]);

    transform.transform(&mut tree).await?;

    let requests = generator.requests();
    let widths_for = |path: &str| {
        requests.iter().find(|r| r.resource_path == path).and_then(|r| r.widths.clone())
    };
    assert_eq!(widths_for("explicit.jpg"), Some(vec![500]));
    assert_eq!(widths_for("implicit.jpg"), Some(vec![600]));
    assert_eq!(widths_for("malformed.jpg"), Some(vec![600]));

    assert_eq!(at(&tree, &[0]).property("width"), Some("500"));
    assert_eq!(at(&tree, &[1]).property("width"), Some("600"));
    assert_eq!(at(&tree, &[2]).property("width"), Some("100%"));
    Ok(())
}

#[tokio::test]
async fn test_quality_and_blur_defaults() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform = ImageTransform::new(
        PassConfig::new("static", "static/g").with_quality(75).with_blur(40),
        generator.clone(),
    )?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("src", "a.jpg"), ("quality", "90"), ("blur", "10")]),
        fixtures::image(&[("src", "b.jpg")]),
    ]);

    transform.transform(&mut tree).await?;

    let requests = generator.requests();
    let quality_for =
        |path: &str| requests.iter().find(|r| r.resource_path == path).and_then(|r| r.quality);
    assert_eq!(quality_for("a.jpg"), Some(90));
    assert_eq!(quality_for("b.jpg"), Some(75));

    let explicit = at(&tree, &[0]);
    let defaulted = at(&tree, &[1]);
    assert_eq!(explicit.property("quality"), Some("90"));
    assert_eq!(explicit.property("blur"), Some("10"));
    assert_eq!(defaulted.property("quality"), Some("75"));
    assert_eq!(defaulted.property("blur"), Some("40"));
    Ok(())
}

#[tokio::test]
async fn test_src_prefix_with_and_without_separator() -> Result<()> {
    for prefix in ["a/b", "a/b/"] {
        let generator = RecordingGenerator::new();
        let transform = ImageTransform::new(
            PassConfig::new("static", "static/g").with_src_prefix(prefix),
            generator.clone(),
        )?;
        let mut tree = fixtures::tree(vec![fixtures::img("x.jpg")]);

        transform.transform(&mut tree).await?;

        assert_eq!(generator.requests()[0].resource_path, "a/b/x.jpg", "prefix {prefix:?}");
        assert_eq!(at(&tree, &[0]).property("src"), Some("a/b/x.jpg"));
    }
    Ok(())
}

#[tokio::test]
async fn test_format_and_generation_flags_reach_generator() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform = ImageTransform::new(
        PassConfig::new("static", "static/g")
            .with_webp(false)
            .with_avif(false)
            .with_generate_images(true),
        generator.clone(),
    )?;
    let mut tree = fixtures::tree(vec![fixtures::img("a.jpg")]);

    transform.transform(&mut tree).await?;

    let request = &generator.requests()[0];
    assert_eq!(request.include_webp, Some(false));
    assert_eq!(request.include_avif, Some(false));
    assert!(!request.skip_generation);
    assert_eq!(request.input_dir, std::path::PathBuf::from("static"));
    assert_eq!(request.output_dir, std::path::PathBuf::from("static/g"));

    let element = at(&tree, &[0]);
    assert_eq!(element.property("srcsetwebp"), None);
    assert_eq!(element.property("srcsetavif"), None);
    Ok(())
}

#[tokio::test]
async fn test_skip_predicate_leaves_element_untouched() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform = ImageTransform::new(
        PassConfig::new("static", "static/g")
            .with_width(600)
            .skip_if(|request| request.resource_path == "b.jpg"),
        generator.clone(),
    )?;
    let skipped = fixtures::image(&[("src", "b.jpg"), ("alt", "B")]);
    let mut tree = fixtures::tree(vec![
        fixtures::img("a.jpg"),
        skipped.clone(),
        fixtures::img("c.jpg"),
    ]);

    let report = transform.transform(&mut tree).await?;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed, 2);
    assert_eq!(tree.children()[1], skipped);
    assert_eq!(generator.calls_for("b.jpg"), 0);
    assert_eq!(at(&tree, &[0]).tag_name, "s-image");
    assert_eq!(at(&tree, &[2]).tag_name, "s-image");
    Ok(())
}

#[tokio::test]
async fn test_skip_predicate_sees_prefixed_path() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform = ImageTransform::new(
        PassConfig::new("static", "static/g")
            .with_src_prefix("images")
            .skip_if(|request| request.resource_path == "images/b.jpg"),
        generator.clone(),
    )?;
    let mut tree = fixtures::tree(vec![fixtures::img("a.jpg"), fixtures::img("b.jpg")]);

    transform.transform(&mut tree).await?;

    assert_eq!(at(&tree, &[1]).property("src"), Some("b.jpg"));
    assert_eq!(at(&tree, &[1]).tag_name, "img");
    assert_eq!(generator.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_nested_images_and_json_round_trip() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let json = r#"{
        "type": "root",
        "children": [
            { "type": "element", "tagName": "p", "properties": {}, "children": [
                { "type": "text", "value": "See " },
                { "type": "element", "tagName": "img", "properties": { "src": "a.jpg", "alt": "A" }, "children": [] }
            ]}
        ]
    }"#;
    let mut tree: Node = serde_json::from_str(json)?;

    transform.transform(&mut tree).await?;

    let value = serde_json::to_value(&tree)?;
    let image = &value["children"][0]["children"][1];
    assert_eq!(image["tagName"], "s-image");
    assert_eq!(image["properties"]["alt"], "A");
    assert_eq!(image["properties"]["srcset"], "a.jpg 1200w");
    assert_eq!(value["children"][0]["children"][0]["value"], "See ");
    Ok(())
}

#[tokio::test]
async fn test_full_hast_document() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let json = r#"{
        "type": "root",
        "children": [
            { "type": "doctype" },
            { "type": "element", "tagName": "body", "properties": {}, "children": [
                { "type": "element", "tagName": "img", "properties": {
                    "src": "hero.jpg", "className": ["hero"], "width": 480
                }, "children": [] }
            ]}
        ]
    }"#;
    let mut tree: Node = serde_json::from_str(json)?;

    let report = transform.transform(&mut tree).await?;

    assert_eq!(report.processed, 1);
    assert_eq!(generator.requests()[0].widths, Some(vec![480]));

    let value = serde_json::to_value(&tree)?;
    assert_eq!(value["children"][0]["type"], "doctype");
    let image = &value["children"][1]["children"][0];
    assert_eq!(image["tagName"], "s-image");
    assert_eq!(image["properties"]["className"], "hero");
    assert_eq!(image["properties"]["width"], "480");
    Ok(())
}

//! Request sharing across the elements of a pass.

use std::time::Duration;

use anyhow::Result;
use respimg::config::PassConfig;
use respimg::core::PassError;
use respimg::test_utils::{RecordingGenerator, fixtures, init_test_logging};
use respimg::transform::ImageTransform;
use respimg::tree::{ElementPath, Node};

fn element_at<'a>(tree: &'a Node, indices: &[usize]) -> &'a respimg::tree::Element {
    tree.element(&ElementPath::from(indices.to_vec())).expect("element exists")
}

#[tokio::test]
async fn test_same_image_generated_once() -> Result<()> {
    init_test_logging(None);
    let generator = RecordingGenerator::new().with_delay(Duration::from_millis(20));
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::img("x.jpg"),
        fixtures::image(&[("src", "x.jpg"), ("immediate", "")]),
    ]);

    let report = transform.transform(&mut tree).await?;

    assert_eq!(generator.calls(), 1);
    assert_eq!(report.generated, 1);
    assert_eq!(report.processed, 2);

    let lazy = element_at(&tree, &[0]);
    let eager = element_at(&tree, &[1]);
    assert_eq!(lazy.property("placeholder"), Some("<svg />"));
    assert_eq!(eager.property("placeholder"), None);
    assert_eq!(lazy.property("srcset"), eager.property("srcset"));
    assert_eq!(eager.property("immediate"), Some(""));
    Ok(())
}

#[tokio::test]
async fn test_immediate_true_skips_placeholder() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("src", "a.jpg"), ("immediate", "true")]),
        fixtures::image(&[("src", "b.jpg"), ("immediate", "false")]),
    ]);

    transform.transform(&mut tree).await?;

    assert_eq!(element_at(&tree, &[0]).property("placeholder"), None);
    assert_eq!(element_at(&tree, &[1]).property("placeholder"), Some("<svg />"));
    assert!(generator.requests().iter().all(|r| !r.skip_placeholder));
    Ok(())
}

#[tokio::test]
async fn test_many_duplicates_across_nesting() -> Result<()> {
    let generator = RecordingGenerator::new().with_delay(Duration::from_millis(5));
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;

    let paragraphs: Vec<Node> = (0..20)
        .map(|i| {
            fixtures::paragraph(vec![
                fixtures::img("shared.jpg"),
                fixtures::img(&format!("own-{i}.jpg")),
            ])
        })
        .collect();
    let mut tree = fixtures::tree(paragraphs);

    let report = transform.transform(&mut tree).await?;

    assert_eq!(report.candidates, 40);
    assert_eq!(report.processed, 40);
    assert_eq!(generator.calls_for("shared.jpg"), 1);
    assert_eq!(generator.calls(), 21);
    Ok(())
}

#[tokio::test]
async fn test_different_widths_are_different_requests() -> Result<()> {
    let generator = RecordingGenerator::new();
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::image(&[("src", "a.jpg"), ("width", "400")]),
        fixtures::image(&[("src", "a.jpg"), ("width", "800")]),
        fixtures::image(&[("src", "a.jpg"), ("width", "400"), ("blur", "5")]),
    ]);

    transform.transform(&mut tree).await?;

    // blur is presentation only and does not split requests
    assert_eq!(generator.calls(), 2);
    assert_eq!(element_at(&tree, &[0]).property("srcset"), Some("a.jpg 400w"));
    assert_eq!(element_at(&tree, &[1]).property("srcset"), Some("a.jpg 800w"));
    assert_eq!(element_at(&tree, &[2]).property("srcset"), Some("a.jpg 400w"));
    Ok(())
}

#[tokio::test]
async fn test_failure_shared_by_duplicates() -> Result<()> {
    let generator = RecordingGenerator::new()
        .with_delay(Duration::from_millis(10))
        .failing_once("broken.jpg");
    let transform =
        ImageTransform::new(PassConfig::new("static", "static/g"), generator.clone())?;
    let mut tree = fixtures::tree(vec![
        fixtures::img("broken.jpg"),
        fixtures::img("fine.jpg"),
        fixtures::img("broken.jpg"),
    ]);

    let Err(PassError::Generation { report }) = transform.transform(&mut tree).await else {
        panic!("expected a generation failure");
    };

    assert_eq!(generator.calls_for("broken.jpg"), 1);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.processed, 1);
    let paths: Vec<String> = report.failures.iter().map(|f| f.path.to_string()).collect();
    assert_eq!(paths, vec!["/0", "/2"]);
    assert!(report.failures[0].error.to_string().contains("broken.jpg"));

    assert_eq!(element_at(&tree, &[0]).tag_name, "img");
    assert_eq!(element_at(&tree, &[1]).tag_name, "s-image");
    assert_eq!(element_at(&tree, &[2]).tag_name, "img");

    // The failure is not remembered; the next pass succeeds.
    let mut retry = fixtures::tree(vec![fixtures::img("broken.jpg")]);
    let report = transform.transform(&mut retry).await?;
    assert_eq!(report.processed, 1);
    assert_eq!(generator.calls_for("broken.jpg"), 2);
    Ok(())
}

#[tokio::test]
async fn test_bounded_queue_still_completes() -> Result<()> {
    let generator = RecordingGenerator::new().with_delay(Duration::from_millis(2));
    let transform = ImageTransform::new(
        PassConfig::new("static", "static/g").with_max_parallel(1),
        generator.clone(),
    )?;
    let images: Vec<Node> = (0..8).map(|i| fixtures::img(&format!("{i}.jpg"))).collect();
    let mut tree = fixtures::tree(images);

    let report = transform.transform(&mut tree).await?;

    assert_eq!(report.processed, 8);
    let queues: Vec<_> = generator.requests().into_iter().map(|r| r.queue).collect();
    assert!(queues.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(queues[0].max_parallel(), 1);
    Ok(())
}

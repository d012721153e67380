use frameclass_classifiers::{
    ActiveClassifier, BackendKind, ClassifierFactory, ModelStore, TOP_K,
};
use frameclass_torch_plugin::TorchScriptLoader;
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;

/// Real libtorch runs need a traced module and its sidecar on disk
fn torch_tests_enabled() -> Option<(PathBuf, String)> {
    let enabled = std::env::var("FRAMECLASS_RUN_TORCH_TESTS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if !enabled {
        return None;
    }
    let dir = std::env::var("FRAMECLASS_TORCH_MODELS_DIR").ok()?;
    let model = std::env::var("FRAMECLASS_TORCH_MODEL").ok()?;
    Some((PathBuf::from(dir), model))
}

#[test]
fn test_factory_without_plugin_reports_unavailable() {
    let dir = std::env::temp_dir();
    let factory = ClassifierFactory::new(ModelStore::new(dir));
    assert!(!factory.create_for_model("absent.pt").is_ready());
}

#[test]
fn test_traced_module_classifies_with_libtorch() {
    let Some((dir, model)) = torch_tests_enabled() else {
        eprintln!("Skipping libtorch test; set FRAMECLASS_RUN_TORCH_TESTS=1");
        return;
    };

    let factory = ClassifierFactory::new(ModelStore::new(dir))
        .with_traced_loader(Arc::new(TorchScriptLoader::new()));
    let active = ActiveClassifier::empty();
    active.switch_to(&factory, &model);
    assert!(active.is_available(), "{} failed to load", model);

    let frame = RgbImage::from_pixel(320, 240, Rgb([120, 90, 60]));
    let classified = active.classify(&frame).unwrap();
    assert_eq!(classified.backend, BackendKind::TracedModule);
    assert!(!classified.predictions.is_empty());
    assert!(classified.predictions.len() <= TOP_K);
    for pair in classified.predictions.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

use std::path::{Path, PathBuf};

use registry::{builtin_models, ModelDescriptor, ModelRegistry, RegistryError};

fn descriptor(name: &str, folder: &str) -> ModelDescriptor {
    ModelDescriptor::new(name, format!("remote/{}", name), folder)
}

#[test]
fn test_builtin_registry() {
    let registry = ModelRegistry::builtin();
    assert_eq!(registry.len(), 6);
    assert!(!registry.is_empty());

    let names: Vec<&str> = registry.iter().map(|m| m.source_file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "fulfillmentInbound_2024-03-20.json",
            "fbaInventory.json",
            "catalogItems_2022-04-01.json",
            "listingsItems_2021-08-01.json",
            "definitionsProductTypes_2020-09-01.json",
            "feeds_2021-06-30.json",
        ]
    );

    // Built-in table must pass the same validation as user-supplied registries
    let rebuilt = ModelRegistry::new(builtin_models()).expect("builtin models are valid");
    assert_eq!(rebuilt, registry);
}

#[test]
fn test_builtin_package_names() {
    let registry = ModelRegistry::builtin();
    let packages: Vec<&str> =
        registry.iter().map(|m| m.package_name().expect("valid package name")).collect();
    assert_eq!(
        packages,
        vec![
            "fba_inbound",
            "fba_inventory",
            "catalog",
            "listings",
            "product_type_definitions",
            "feeds"
        ]
    );
    for package in packages {
        assert!(!package.is_empty());
        assert!(!package.contains('/'));
        assert!(!package.contains('\\'));
    }
}

#[test]
fn test_new_rejects_invalid_descriptors() {
    let err = ModelRegistry::new(vec![descriptor("", "out/x")]).expect_err("empty name");
    assert!(matches!(err, RegistryError::EmptyField { field: "source_file_name", .. }));

    let err = ModelRegistry::new(vec![descriptor("x.json", "out/")]).expect_err("empty package");
    assert!(matches!(err, RegistryError::InvalidPackageName { .. }));

    let err = ModelRegistry::new(vec![descriptor("x.json", "out/x"), descriptor("x.json", "out/y")])
        .expect_err("duplicate");
    assert_eq!(err, RegistryError::Duplicate("x.json".to_string()));
}

#[test]
fn test_select_keeps_registry_order() {
    let registry = ModelRegistry::builtin();
    let selected = registry
        .select(&["feeds_2021-06-30.json", "fbaInventory.json"])
        .expect("known models");
    let names: Vec<&str> = selected.iter().map(|m| m.source_file_name.as_str()).collect();
    assert_eq!(names, vec!["fbaInventory.json", "feeds_2021-06-30.json"]);

    let everything = registry.select::<&str>(&[]).expect("empty selection");
    assert_eq!(everything.len(), registry.len());

    let err = registry.select(&["nope.json"]).expect_err("unknown model");
    assert_eq!(err, RegistryError::UnknownModel("nope.json".to_string()));
}

#[test]
fn test_directories() {
    let registry =
        ModelRegistry::new(vec![descriptor("a.json", "out/a"), descriptor("b.json", "out/b")])
            .expect("valid registry");
    assert_eq!(
        registry.directories(Path::new("models")),
        vec![PathBuf::from("out/a"), PathBuf::from("out/b"), PathBuf::from("models")]
    );
}

#[test]
fn test_descriptor_deserializes_from_toml() {
    #[derive(serde::Deserialize)]
    struct Doc {
        models: Vec<ModelDescriptor>,
    }

    let doc: Doc = toml::from_str(
        r#"
            [[models]]
            source_file_name = "x.json"
            remote_path = "p/x.json"
            output_folder = "out/x"
        "#,
    )
    .expect("valid toml");
    assert_eq!(doc.models, vec![ModelDescriptor::new("x.json", "p/x.json", "out/x")]);
}

//! Integration tests for rendering through a configured adapter.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tempfile::TempDir;
use thematic::{AdapterConfig, RenderAdapter, RenderError, Template};

fn create_file(dir: &Path, relative_path: &str, content: &str) -> PathBuf {
    let full_path = dir.join(relative_path);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&full_path, content).unwrap();
    full_path
}

fn set_modified(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Writes a site with a themed layout and returns an adapter over it.
fn site(temp_dir: &TempDir, cache: bool) -> RenderAdapter {
    let root = temp_dir.path();
    let templates = root.join("templates");

    create_file(&templates, "layout.jinja", "<main>{% block body %}{% endblock %}</main>");
    create_file(&templates, "default/layout.jinja", "<div>{% block body %}{% endblock %}</div>");
    create_file(&templates, "dark/partials/nav.jinja", "dark nav");
    create_file(&templates, "partials/nav.jinja", "nav");
    create_file(
        &templates,
        "page/home.jinja",
        "{% extends 'layout' %}{% block body %}{% include 'partials/nav' %}|{{ title }}{% endblock %}",
    );
    create_file(&templates, "page/home.fr.jinja", "Accueil {{ title }}");

    let mut yaml = format!(
        "base_path: {}\nthemes:\n  dark:\n    parent: default\n  default: {{}}\n",
        templates.display()
    );
    if cache {
        yaml.push_str(&format!("cache_dir: {}\n", root.join("cache").display()));
    }

    let config_path = create_file(root, "thematic.yaml", &yaml);
    let config = AdapterConfig::from_file(config_path).unwrap();
    RenderAdapter::from_config(&config).unwrap()
}

#[test]
fn test_render_unthemed_page() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, false);

    let output = adapter
        .render(&Template::new("page/home").with_var("title", "Home"))
        .unwrap();
    assert_eq!(output, "<main>nav|Home</main>");
}

#[test]
fn test_includes_and_layouts_follow_theme_hierarchy() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, false);

    let output = adapter
        .render(
            &Template::new("page/home")
                .with_var("title", "Home")
                .themed("dark", None),
        )
        .unwrap();
    assert_eq!(output, "<div>dark nav|Home</div>");

    let output = adapter
        .render(
            &Template::new("page/home")
                .with_var("title", "Home")
                .themed("default", None),
        )
        .unwrap();
    assert_eq!(output, "<div>nav|Home</div>");
}

#[test]
fn test_template_id_selects_variant() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, false);

    let output = adapter
        .render(
            &Template::new("page/home")
                .with_var("title", "Maison")
                .themed("dark", Some("fr")),
        )
        .unwrap();
    assert_eq!(output, "Accueil Maison");
}

#[test]
fn test_render_with_serialized_data() {
    #[derive(Serialize)]
    struct Page {
        title: &'static str,
    }

    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, false);

    let template = Template::new("page/home")
        .with_data(&Page { title: "Data" })
        .unwrap();
    assert_eq!(adapter.render(&template).unwrap(), "<main>nav|Data</main>");
}

#[test]
fn test_get_file_and_list_files() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, false);
    let templates = temp_dir.path().join("templates");

    assert_eq!(
        adapter
            .get_file(&Template::new("partials/nav").themed("dark", None))
            .unwrap(),
        templates.join("dark/partials/nav.jinja")
    );

    let listed = adapter.list_files("partials", Some("dark")).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed["partials/nav"], "nav");

    let listed = adapter.list_files("page", None).unwrap();
    let keys: Vec<&str> = listed.keys().map(String::as_str).collect();
    assert_eq!(keys, ["page/home", "page/home.fr"]);
}

#[test]
fn test_failed_render_leaves_no_state() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, false);

    let result = adapter.render(&Template::new("page/missing").themed("dark", Some("fr")));
    assert!(matches!(result, Err(RenderError::ResourceNotFound { .. })));

    // The next un-themed render must not pick up "dark" or "fr".
    let output = adapter
        .render(&Template::new("page/home").with_var("title", "Again"))
        .unwrap();
    assert_eq!(output, "<main>nav|Again</main>");
    assert_eq!(adapter.active_scopes(), 0);
}

#[test]
fn test_disk_cache_picks_up_edits() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = site(&temp_dir, true);
    let nav = temp_dir.path().join("templates/partials/nav.jinja");
    let page = Template::new("page/home").with_var("title", "Home");

    set_modified(&nav, SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
    assert_eq!(adapter.render(&page).unwrap(), "<main>nav|Home</main>");

    let cache_dir = temp_dir.path().join("cache");
    let entries = std::fs::read_dir(&cache_dir).unwrap().count();
    assert_eq!(entries, 3);

    std::fs::write(&nav, "edited nav").unwrap();
    set_modified(&nav, SystemTime::now() + Duration::from_secs(3_600));
    assert_eq!(adapter.render(&page).unwrap(), "<main>edited nav|Home</main>");
}

#[test]
fn test_invalid_config_rejected() {
    let result = AdapterConfig::from_yaml("themes: { dark: { parent: dark } }");
    assert!(matches!(result, Err(RenderError::ThemeCycle(_))));
}

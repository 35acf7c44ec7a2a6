use std::fs;

use svg_name_annotator::label::LabelStyle;
use svg_name_annotator::placement::Baseline;
use svg_name_annotator::{AnnotateOptions, Annotator, Config, NameSource, RasterizerKind};
use tempfile::tempdir;

const TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="120"><rect id="frame" width="100" height="120"/></svg>"#;

#[test]
fn annotated_document_snapshot() {
    let dir = tempdir().unwrap();
    let options = AnnotateOptions {
        style: LabelStyle {
            font_family: "serif".to_string(),
            font_size: 10.0,
            ..LabelStyle::default()
        },
        font_scale: 1.0,
        baseline: Baseline::Fixed(80.0),
    };
    let annotator = Annotator::new(TEMPLATE.to_string(), options, dir.path(), None).unwrap();
    let (document, _) = annotator.render("Hello", "Hello.svg").unwrap();
    insta::assert_snapshot!(document.serialize().unwrap(), @r###"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="120" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" sodipodi:docname="Hello.svg"><rect id="frame" width="100" height="120"/><text id="text1" xml:space="preserve" style="font-style:normal;font-weight:normal;font-size:10px;line-height:1.25;font-family:serif;letter-spacing:0px;word-spacing:4px;fill:#000000;fill-opacity:1;stroke:none;stroke-width:0.75094575" y="80" x="25">Hello</text></svg>"###);
}

#[test]
fn run_writes_one_svg_per_name() {
    let dir = tempdir().unwrap();
    let template_path = dir.path().join("template.svg");
    fs::write(&template_path, TEMPLATE).unwrap();
    let names_path = dir.path().join("names.txt");
    fs::write(&names_path, "# class of 2026\nMisaka Mikoto\r\n\r\nA & B & C\n").unwrap();
    let out_dir = dir.path().join("out").join("nested");

    let summary = svg_name_annotator::run(Config {
        names: NameSource::resolve(names_path.to_str().unwrap()).unwrap(),
        template: template_path.clone(),
        settings_path: None,
        font_style: Some("serif".to_string()),
        font_size: Some(10.0),
        font_scale: Some(1.0),
        baseline: Some(90.0),
        out_dir: Some(out_dir.clone()),
        rasterizer: Some(RasterizerKind::None),
        rasterize_timeout_secs: None,
        debug: false,
    })
    .unwrap();

    assert!(summary.failures.is_empty());
    assert_eq!(summary.skipped, 3);
    let files: Vec<_> = summary
        .artifacts
        .iter()
        .map(|artifact| artifact.svg_path.clone())
        .collect();
    assert_eq!(
        files,
        [out_dir.join("MisakaMikoto.svg"), out_dir.join("AB&C.svg")]
    );
    assert_eq!(fs::read_to_string(&template_path).unwrap(), TEMPLATE);

    let misaka = fs::read_to_string(out_dir.join("MisakaMikoto.svg")).unwrap();
    assert!(misaka.contains(r#"y="90" x="-15""#));
    assert!(misaka.contains("font-family:serif;"));
    let ab = fs::read_to_string(out_dir.join("AB&C.svg")).unwrap();
    assert!(ab.contains(">A &amp; B &amp; C</text>"));
    assert!(ab.contains(r#"sodipodi:docname="AB&amp;C.svg""#));
}

#[test]
fn missing_template_is_fatal() {
    let dir = tempdir().unwrap();
    let result = svg_name_annotator::run(Config {
        names: NameSource::literal("Li"),
        template: dir.path().join("missing.svg"),
        settings_path: None,
        font_style: None,
        font_size: None,
        font_scale: None,
        baseline: None,
        out_dir: Some(dir.path().join("out")),
        rasterizer: Some(RasterizerKind::None),
        rasterize_timeout_secs: None,
        debug: false,
    });
    assert!(result.is_err());
}

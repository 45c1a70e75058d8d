//! Tests for the show command: document in, YAML manifest stream out.

use indoc::indoc;
use kfx::commands::show::{run, ShowArgs};

fn write_document(content: &str) -> tempfile::NamedTempFile {
	use std::io::Write as _;
	let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
	file.write_all(content.as_bytes()).expect("failed to write document");
	file
}

#[test]
fn renders_ordered_manifest_stream() {
	let file = write_document(indoc! {r#"
		context:
		  namespace: tenant
		components:
		  - name: api
		    application: demo
		    git:
		      url: https://github.com/example/api.git
		applications:
		  - name: demo
		    displayName: Demo
	"#});

	let args = ShowArgs {
		path: file.path().to_path_buf(),
		namespace: None,
		log_level: "info".to_string(),
	};

	let mut output = Vec::new();
	run(args, &mut output).expect("show should succeed");
	let rendered = String::from_utf8(output).expect("output should be UTF-8");

	// The application renders before the component that references it.
	let application_at = rendered.find("kind: Application").expect("application manifest");
	let component_at = rendered.find("kind: Component").expect("component manifest");
	assert!(application_at < component_at);

	assert!(rendered.contains("displayName: Demo"));
	assert!(rendered.contains("url: \"https://github.com/example/api.git\"")
		|| rendered.contains("url: https://github.com/example/api.git"));
}

#[test]
fn namespace_override_applies_to_every_manifest() {
	let file = write_document(indoc! {r#"
		applications:
		  - name: demo
	"#});

	let args = ShowArgs {
		path: file.path().to_path_buf(),
		namespace: Some("override".to_string()),
		log_level: "info".to_string(),
	};

	let mut output = Vec::new();
	run(args, &mut output).expect("show should succeed");
	let rendered = String::from_utf8(output).expect("output should be UTF-8");
	assert!(rendered.contains("namespace: override"));
}

use rustlabels_core::{expand_document, Label, LabelError, LabelObject};
use rustlabels_template::TemplateDb;
use std::fs;
use tempfile::tempdir;

const TEMPLATES: &str = r#"<Glabels-templates>
  <Template brand="Test" part="2up" size="US-Letter">
    <Label-rectangle id="0" width="3in" height="1in">
      <Layout nx="2" ny="1" x0="0.5in" y0="0.5in" dx="3.5in" dy="0"/>
    </Label-rectangle>
  </Template>
</Glabels-templates>"#;

const LABEL: &str = r#"{
  "template": "Test 2up",
  "merge": {"backend": "Text/Comma/Line1Keys", "source": "people.csv"},
  "objects": [
    {"type": "text", "x": 6, "y": 6, "text": "${name}\n${street2}\n${city}"}
  ]
}"#;

#[test]
fn label_opens_merge_source_next_to_the_label_file() {
    let temp = tempdir().expect("tempdir");
    fs::write(
        temp.path().join("people.csv"),
        "name,street2,city\nAda,,London\nGrace,Suite 9,Arlington\n",
    )
    .expect("write csv");
    let label_path = temp.path().join("address.json");
    fs::write(&label_path, LABEL).expect("write label");

    let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
    let label = Label::load(&label_path, &db).expect("load");

    assert_eq!(label.records().len(), 2);
    let merge = label.merge().expect("merge source");
    assert!(merge.last_error().is_none());
    assert_eq!(merge.primary_key().as_deref(), Some("name"));

    let LabelObject::Text(text) = &label.objects()[0] else {
        panic!("expected a text object");
    };
    assert_eq!(
        expand_document(&text.text, Some(&label.records()[0])),
        "Ada\nLondon"
    );
    assert_eq!(
        expand_document(&text.text, Some(&label.records()[1])),
        "Grace\nSuite 9\nArlington"
    );
    assert_eq!(
        expand_document(&text.text, None),
        "${name}\n${street2}\n${city}"
    );
}

#[test]
fn missing_merge_file_gives_an_empty_record_list() {
    let temp = tempdir().expect("tempdir");
    let label_path = temp.path().join("address.json");
    fs::write(&label_path, LABEL).expect("write label");

    let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
    let label = Label::load(&label_path, &db).expect("load");

    assert!(label.records().is_empty());
    assert!(label.merge().and_then(|merge| merge.last_error()).is_some());
}

#[test]
fn malformed_label_reports_its_path() {
    let temp = tempdir().expect("tempdir");
    let label_path = temp.path().join("broken.json");
    fs::write(&label_path, "{ not json").expect("write");

    let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
    match Label::load(&label_path, &db) {
        Err(LabelError::Json { path, .. }) => assert_eq!(path, label_path),
        other => panic!("unexpected result: {:?}", other.map(|label| label.objects().len())),
    }
}

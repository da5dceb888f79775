use super::*;
use crate::test_support::system_font;

fn lib_with(families: &[&str]) -> FontLibrary {
    let mut lib = FontLibrary::new();
    for f in families {
        lib.faces.push(FontFace {
            family: f.to_string(),
            data: Arc::new(Vec::new()),
        });
    }
    lib
}

#[test]
fn normalize_keeps_lowercase_alphanumerics() {
    assert_eq!(normalize("Open Sans-Bold"), "opensansbold");
    assert_eq!(normalize("ArialMT"), "arialmt");
    assert_eq!(normalize(" - "), "");
}

#[test]
fn resolves_by_normalized_family() {
    let lib = lib_with(&["Open Sans", "Roboto"]);
    assert_eq!(lib.resolve("open-sans").map(FontFace::family), Some("Open Sans"));
}

#[test]
fn resolves_postscript_names_by_longest_family_prefix() {
    let lib = lib_with(&["Arial", "Arial Black", "Roboto"]);
    assert_eq!(lib.resolve("ArialMT").map(FontFace::family), Some("Arial"));
    assert_eq!(lib.resolve("ArialBlack-Regular").map(FontFace::family), Some("Arial Black"));
}

#[test]
fn falls_back_to_default_family_then_first_face() {
    let lib = lib_with(&["Roboto", "Arial"]);
    assert_eq!(lib.resolve("Helvetica").map(FontFace::family), Some("Arial"));

    let lib = lib_with(&["Roboto", "Inter"]);
    assert_eq!(lib.resolve("Helvetica").map(FontFace::family), Some("Roboto"));

    let lib = lib_with(&["Roboto", "Inter"]).with_default_family("Inter");
    assert_eq!(lib.resolve("Helvetica").map(FontFace::family), Some("Inter"));
}

#[test]
fn empty_library_resolves_nothing() {
    let lib = FontLibrary::new();
    assert!(lib.is_empty());
    assert!(lib.resolve("Arial").is_none());
}

#[test]
fn garbage_bytes_are_rejected() {
    let mut lib = FontLibrary::new();
    let err = lib.register(vec![1, 2, 3, 4]).unwrap_err();
    assert!(matches!(err, TemplateError::Validation(_)));
    assert!(lib.is_empty());
}

#[test]
fn alias_wins_over_family_matching() {
    let Some(bytes) = system_font() else {
        return;
    };
    let mut lib = lib_with(&["Arial"]);
    let family = lib.register_alias("ArialMT", bytes).unwrap();
    assert_eq!(family, "DejaVu Sans");
    assert_eq!(lib.len(), 2);
    assert_eq!(lib.resolve("ArialMT").map(FontFace::family), Some("DejaVu Sans"));
    assert_eq!(lib.resolve("Arial-BoldMT").map(FontFace::family), Some("Arial"));
}

#[test]
fn from_dir_loads_font_files_only() {
    let Some(bytes) = system_font() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.TTF"), &bytes).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a font").unwrap();
    std::fs::write(dir.path().join("broken.otf"), b"nope").unwrap();

    let lib = FontLibrary::from_dir(dir.path()).unwrap();
    assert_eq!(lib.len(), 1);
    assert!(lib.resolve("DejaVuSans").is_some());
}

#[test]
fn from_dir_missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = FontLibrary::from_dir(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, TemplateError::NotFound(_)));
}

#[test]
fn blob_shares_face_bytes() {
    let face = FontFace {
        family: "Test".to_string(),
        data: Arc::new(vec![1, 2, 3, 4]),
    };
    let a = face.blob();
    let b = face.blob();
    assert_eq!(a.data().as_ptr(), face.data().as_ptr());
    assert_eq!(b.data().as_ptr(), face.data().as_ptr());
    assert_eq!(Arc::strong_count(&face.data), 3);
}

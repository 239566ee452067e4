use lumilio_fs::NormalizedPath;
use rstest::rstest;

#[rstest]
#[case("a/../b", "b")]
#[case("../a", "a")]
#[case("../../a/b", "a/b")]
#[case("/a/b/../../c", "/c")]
#[case("a\\..\\b", "b")]
#[case("a/./b//c", "a/b/c")]
#[case("/srv/photos/", "/srv/photos")]
#[case("//nas/share/photos", "//nas/share/photos")]
fn test_normalization(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_join_resolves_dots() {
    let base = NormalizedPath::new("/a/b");

    assert_eq!(base.join("c").as_str(), "/a/b/c");
    assert_eq!(base.join("./c").as_str(), "/a/b/c");
    assert_eq!(base.join("../c").as_str(), "/a/c");
    assert_eq!(base.join("../../c").as_str(), "/c");
}

#[test]
fn test_join_escape_fails_boundary_check() {
    let root = NormalizedPath::new("/repo");
    let escaped = root.join("../secrets.txt");

    assert_eq!(escaped.as_str(), "/secrets.txt");
    assert!(!escaped.starts_with(&root));
    assert!(root.join("inbox/a.jpg").starts_with(&root));
}

#[test]
fn test_file_name_and_extension() {
    let path = NormalizedPath::new("/repo/inbox/2024/06/IMG_0001.HEIC");
    assert_eq!(path.file_name(), Some("IMG_0001.HEIC"));
    assert_eq!(path.extension(), Some("HEIC"));

    let hidden = NormalizedPath::new("/repo/.lumiliorepo");
    assert_eq!(hidden.file_name(), Some(".lumiliorepo"));
    assert_eq!(hidden.extension(), None);
}

#[test]
fn test_parent() {
    let path = NormalizedPath::new("/repo/inbox/a.jpg");
    assert_eq!(path.parent().unwrap().as_str(), "/repo/inbox");
    assert!(NormalizedPath::new("a.jpg").parent().is_none());
}

#[test]
fn test_display_matches_as_str() {
    let path = NormalizedPath::new("C:\\photos\\inbox");
    assert_eq!(path.to_string(), "C:/photos/inbox");
}

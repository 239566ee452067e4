use lumilio_fs::NormalizedPath;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_normalization_invariants(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        prop_assert!(!as_str.contains('\\'));

        // Only a leading network prefix may contain a double slash
        let body = as_str.strip_prefix("//").unwrap_or(as_str);
        prop_assert!(!body.contains("//"));

        // Normalization is idempotent
        let roundtripped = NormalizedPath::new(path.to_native());
        prop_assert_eq!(&path, &roundtripped);
    }

    #[test]
    fn test_join_never_escapes_without_dotdot(
        a in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        b in "[a-z]{1,8}(/[a-z.]{1,8}){0,3}",
    ) {
        let root = NormalizedPath::new(format!("/{a}"));
        let joined = root.join(&b.replace("..", "x"));
        prop_assert!(joined.starts_with(&root));
    }
}

use tessera::path::{Key, PathInfo, PathVariables};

#[test]
fn test_extract_named_and_positional_variables() {
    let vars = PathInfo::extract_variables("users/$uid/posts/$postid", "users/ewout/posts/post1");

    assert_eq!(vars.positional(), &[Key::from("ewout"), Key::from("post1")]);
    let named: Vec<(&str, &Key)> = vars
        .named()
        .iter()
        .map(|(name, key)| (name.as_str(), key))
        .collect();
    assert_eq!(
        named,
        vec![
            ("$postid", &Key::from("post1")),
            ("$uid", &Key::from("ewout")),
            ("postid", &Key::from("post1")),
            ("uid", &Key::from("ewout")),
        ]
    );
}

#[test]
fn test_extract_requires_match() {
    assert!(PathInfo::extract_variables("users/$uid/posts", "users/ewout/likes").is_empty());
    assert!(PathInfo::extract_variables("users/ewout", "users/ewout").is_empty());
    assert!(PathInfo::extract_variables("users/$uid/posts", "users/ewout").is_empty());
}

#[test]
fn test_extract_wildcards_and_indices() {
    let vars = PathInfo::extract_variables("chats/*/messages[*]", "chats/general/messages[4]/text");
    assert_eq!(vars.get(0), Some(&Key::from("general")));
    assert_eq!(vars.get(1), Some(&Key::Index(4)));
    assert!(vars.named().is_empty());
}

#[test]
fn test_fill_variables() {
    let filled = PathInfo::fill_variables("users/$uid", "users/ewout/posts/p1").unwrap();
    assert_eq!(filled.path(), "users/ewout");
    let filled = PathInfo::fill_variables("users/*/posts/*/title", "users/ewout/posts").unwrap();
    assert_eq!(filled.path(), "users/ewout/posts/*/title");

    let err = PathInfo::fill_variables("users/$uid/posts", "accounts/ewout/posts").unwrap_err();
    assert!(err.is_variable_error());
}

#[test]
fn test_fill_variables_with_captures() {
    let vars = PathInfo::extract_variables("users/$uid/posts/$postid", "users/ewout/posts/post1");
    let filled = PathInfo::fill_variables_with("comments/$uid/*", &vars).unwrap();
    assert_eq!(filled.path(), "comments/ewout/post1");

    let mut partial = PathVariables::new();
    partial.push(Key::from("ewout"));
    let err = PathInfo::fill_variables_with("a/$x/b/$y", &partial).unwrap_err();
    assert!(err.is_variable_error());
}

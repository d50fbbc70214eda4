use tessera::path::{Key, PathInfo};

#[test]
fn test_parse_normalizes_brackets_and_slashes() {
    let path = PathInfo::get("/chats/general/messages[12]/text/");
    assert_eq!(path.path(), "chats/general/messages[12]/text");
    assert_eq!(
        path.keys(),
        &[
            Key::from("chats"),
            Key::from("general"),
            Key::from("messages"),
            Key::Index(12),
            Key::from("text"),
        ]
    );
    assert_eq!(PathInfo::get("a/b/[0]").path(), "a/b[0]");
    assert!(PathInfo::get("").is_root());
}

#[test]
fn test_child_and_parent() {
    let chat = PathInfo::get("chats/general");
    let message = chat.child("messages").unwrap().child(3usize).unwrap();
    assert_eq!(message.path(), "chats/general/messages[3]");
    assert_eq!(message.parent().unwrap().path(), "chats/general/messages");
    assert_eq!(message.key(), Some(&Key::Index(3)));
    assert!(PathInfo::root().parent().is_none());
}

#[test]
fn test_child_rejects_invalid_keys() {
    let base = PathInfo::get("users");
    assert!(base.child("").unwrap_err().is_invalid_key());
    assert!(base.child("bell\u{7}key").unwrap_err().is_invalid_key());
    assert!(base.child("back\\slash").unwrap_err().is_invalid_key());
    assert!(base.child("k".repeat(129)).unwrap_err().is_invalid_key());
    assert!(base.child("k".repeat(128)).is_ok());
}

#[test]
fn test_relations_are_wildcard_aware() {
    let pattern = PathInfo::get("users/*/posts");
    let concrete = PathInfo::get("users/ewout/posts");
    let title = PathInfo::get("users/ewout/posts/p1/title");

    assert!(pattern.equals(&concrete));
    assert!(concrete.equals(&pattern));
    assert!(pattern.is_ancestor_of(&title));
    assert!(title.is_descendant_of(&pattern));
    assert!(!concrete.is_ancestor_of(&concrete));

    let named = PathInfo::get("users/$uid");
    assert!(named.is_parent_of(&concrete));
    assert!(!named.is_parent_of(&title));
    assert!(concrete.is_child_of(&named));
}

#[test]
fn test_on_trail() {
    let deep = PathInfo::get("a/b/c/d");
    assert!(PathInfo::get("a/b").is_on_trail_of(&deep));
    assert!(deep.is_on_trail_of(&PathInfo::get("a/*")));
    assert!(PathInfo::root().is_on_trail_of(&deep));
    assert!(!PathInfo::get("a/x").is_on_trail_of(&deep));
}

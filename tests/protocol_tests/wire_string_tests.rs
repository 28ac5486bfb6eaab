//! Tests for WireString

use linewire::protocol::WireString;

#[test]
fn test_new_is_empty() {
    let s = WireString::new();

    assert!(s.is_empty());
    assert_eq!(s.len(), 0);
    assert!(s.capacity() >= 32);
}

#[test]
fn test_push_grows_capacity() {
    let mut s = WireString::with_capacity(4);
    let initial = s.capacity();

    for byte in b"hello, world" {
        s.push(*byte);
    }

    assert_eq!(s, "hello, world");
    assert!(s.capacity() >= 12);
    assert!(s.capacity() > initial);
}

#[test]
fn test_push_doubles_when_full() {
    let mut s = WireString::with_capacity(8);
    while s.len() < s.capacity() {
        s.push(b'x');
    }
    let full = s.capacity();

    s.push(b'y');

    assert!(s.capacity() >= full * 2);
    assert_eq!(s.len(), full + 1);
}

#[test]
fn test_from_str_and_display() {
    let s = WireString::from("example.com");

    assert_eq!(s.as_str(), Some("example.com"));
    assert_eq!(s.to_string(), "example.com");
    assert_eq!(format!("{:?}", s), "WireString(\"example.com\")");
}

#[test]
fn test_extend_and_deref() {
    let mut s = WireString::new();
    s.extend_from_slice(b"/docs");
    s.extend_from_slice(b"/index");

    assert_eq!(&s[..5], b"/docs");
    assert!(s.starts_with(b"/"));
    assert_eq!(s.as_bytes(), b"/docs/index");
}

#[test]
fn test_freeze_keeps_contents() {
    let s = WireString::from("content");
    let bytes = s.freeze();

    assert_eq!(&bytes[..], b"content");
}

//! Filename Tests
//!
//! Validation rules shared by client and server.

use cix::protocol::{Command, Filename, FilenameError, Header, FILENAME_SIZE};

#[test]
fn test_plain_names_are_accepted() {
    for name in ["notes.txt", "a", "with space", "ümlaut", ".hidden", "..."] {
        assert_eq!(Filename::parse(name).unwrap().as_str(), name);
    }
}

#[test]
fn test_empty_name_is_rejected() {
    assert_eq!(Filename::parse(""), Err(FilenameError::Empty));
}

#[test]
fn test_longest_name_fits_with_terminator() {
    let name = "x".repeat(FILENAME_SIZE - 1);
    let parsed = Filename::parse(&name).unwrap();

    let header = Header::request(Command::Fetch, &parsed);
    assert_eq!(header.filename_field()[FILENAME_SIZE - 1], 0);
    assert_eq!(header.filename().unwrap(), parsed);
}

#[test]
fn test_name_at_capacity_is_rejected() {
    let name = "x".repeat(FILENAME_SIZE);
    assert_eq!(
        Filename::parse(&name),
        Err(FilenameError::TooLong { len: FILENAME_SIZE })
    );
}

#[test]
fn test_name_over_capacity_is_rejected() {
    let name = "x".repeat(FILENAME_SIZE + 20);
    assert!(matches!(
        Filename::parse(&name),
        Err(FilenameError::TooLong { .. })
    ));
}

#[test]
fn test_multibyte_length_counts_bytes() {
    // 30 two-byte characters = 60 bytes
    let name = "é".repeat(30);
    assert!(matches!(
        Filename::parse(&name),
        Err(FilenameError::TooLong { len: 60 })
    ));
}

#[test]
fn test_separator_is_rejected() {
    assert_eq!(Filename::parse("dir/file"), Err(FilenameError::Separator));
    assert_eq!(Filename::parse("/etc/passwd"), Err(FilenameError::Separator));
    assert_eq!(Filename::parse("trailing/"), Err(FilenameError::Separator));
}

#[test]
fn test_reserved_names_are_rejected() {
    assert_eq!(Filename::parse("."), Err(FilenameError::Reserved));
    assert_eq!(Filename::parse(".."), Err(FilenameError::Reserved));
}

#[test]
fn test_nul_is_rejected() {
    assert_eq!(Filename::parse("a\0b"), Err(FilenameError::Nul));
}

#[test]
fn test_field_with_invalid_utf8_is_rejected() {
    let mut field = [0u8; FILENAME_SIZE];
    field[..3].copy_from_slice(&[b'a', 0xFF, b'b']);
    assert_eq!(Filename::from_field(&field), Err(FilenameError::NotUtf8));
}

#[test]
fn test_field_stops_at_first_nul() {
    let mut field = [0u8; FILENAME_SIZE];
    field[..3].copy_from_slice(b"abc");
    field[4..7].copy_from_slice(b"xyz");
    assert_eq!(Filename::from_field(&field).unwrap().as_str(), "abc");
}

#[test]
fn test_empty_field_is_rejected() {
    let field = [0u8; FILENAME_SIZE];
    assert_eq!(Filename::from_field(&field), Err(FilenameError::Empty));
}

use super::*;
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = FileId::new();
    assert!(!id.to_string().is_empty());
    assert_eq!(id.into_inner().get_version_num(), 4);
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = FileId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = FileId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = FileId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(FileId::from_str("invalid").is_err());
    assert!(FileId::from_str("").is_err());
}

#[test]
fn test_typed_ids_do_not_collide() {
    let ids: HashSet<FileId> = (0..10_000).map(|_| FileId::new()).collect();
    assert_eq!(ids.len(), 10_000);
}


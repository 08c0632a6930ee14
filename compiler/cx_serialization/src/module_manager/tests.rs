#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::bitstream::{Abbrev, AbbrevOp, BitstreamWriter};
use crate::codes::{self, ast, control};
use crate::module_file::ModuleKind;

struct Import<'a> {
    name: &'a str,
    decl_base: u32,
}

/// A module owning `decls` declarations numbered from `decl_base`, written
/// against `imports`.
fn module_bytes(
    name: &str,
    decl_base: u32,
    decls: u32,
    imports: &[Import<'_>],
    replacements: &[(u32, u64)],
) -> Arc<[u8]> {
    let mut w = BitstreamWriter::new();
    for b in codes::SIGNATURE {
        w.emit(u32::from(b), 8);
    }
    w.enter_subblock(codes::CONTROL_BLOCK_ID, 3);
    w.emit_record(
        control::METADATA,
        &[u64::from(codes::VERSION_MAJOR), 0, u64::from(ModuleKind::Module.raw())],
    );
    let text: Vec<u64> = name.bytes().map(u64::from).collect();
    w.emit_record(control::MODULE_NAME, &text);
    let import_abbrev = w.emit_abbrev(Abbrev::new(&[
        AbbrevOp::Literal(u64::from(control::IMPORT)),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Blob,
    ]));
    for import in imports {
        let mut vals = vec![1, u64::from(import.decl_base)];
        vals.extend(std::iter::repeat(1).take(IdSpaceKind::COUNT - 1));
        vals.push(0);
        w.emit_record_with_blob(import_abbrev, control::IMPORT, &vals, import.name.as_bytes());
    }
    w.exit_block();

    w.enter_subblock(codes::AST_BLOCK_ID, 4);
    let mut spaces = [0u64; IdSpaceKind::COUNT * 2];
    spaces[0] = u64::from(decl_base);
    spaces[1] = u64::from(decls);
    w.emit_record(ast::ID_SPACES, &spaces);
    let offsets: Vec<u64> = (0..decls).map(|i| u64::from(i) * 100).collect();
    w.emit_record(ast::DECL_OFFSET, &offsets);
    let repl: Vec<u64> = replacements.iter().flat_map(|&(d, o)| [u64::from(d), o]).collect();
    if !repl.is_empty() {
        w.emit_record(ast::DECL_REPLACEMENTS, &repl);
    }
    w.exit_block();
    Arc::from(w.finish())
}

fn parse(bytes: Arc<[u8]>) -> ModuleFile {
    ModuleFile::parse(bytes).unwrap()
}

#[test]
fn bases_follow_load_order() {
    let mut mgr = ModuleManager::new();
    assert_eq!(mgr.next_global(IdSpaceKind::Decl), 2);

    let a = mgr.add(parse(module_bytes("a", 2, 3, &[], &[]))).unwrap();
    // `b` was written in a translation that had `a` at decl base 2 too,
    // and numbered its own decls from 5.
    let b = mgr
        .add(parse(module_bytes("b", 5, 2, &[Import { name: "a", decl_base: 2 }], &[])))
        .unwrap();

    assert_eq!(mgr.get(a).space(IdSpaceKind::Decl).base, 2);
    assert_eq!(mgr.get(b).space(IdSpaceKind::Decl).base, 5);
    assert_eq!(mgr.next_global(IdSpaceKind::Decl), 7);
    assert_eq!(mgr.get(b).import_indices(), &[a]);
    assert_eq!(mgr.get(a).imported_by(), &[b]);

    assert_eq!(mgr.owner_of(IdSpaceKind::Decl, 4), Some((a, 2)));
    assert_eq!(mgr.owner_of(IdSpaceKind::Decl, 6), Some((b, 1)));
    assert_eq!(mgr.owner_of(IdSpaceKind::Decl, 7), None);
    assert_eq!(mgr.owner_of(IdSpaceKind::Decl, 1), None);
}

#[test]
fn file_ids_remap_through_import_entries() {
    let mut mgr = ModuleManager::new();
    mgr.add(parse(module_bytes("x", 2, 1, &[], &[]))).unwrap();
    let a = mgr.add(parse(module_bytes("a", 2, 3, &[], &[]))).unwrap();
    // Written in a translation where `a` was the only module.
    let b = mgr
        .add(parse(module_bytes("b", 5, 1, &[Import { name: "a", decl_base: 2 }], &[])))
        .unwrap();

    let bm = mgr.get(b);
    assert_eq!(mgr.get(a).space(IdSpaceKind::Decl).base, 3);
    // b's own decl 5 lands after a's range.
    assert_eq!(bm.resolve(IdSpaceKind::Decl, 5).unwrap(), 6);
    // b's references to a's decls 2..5 shift by one.
    assert_eq!(bm.resolve(IdSpaceKind::Decl, 2).unwrap(), 3);
    assert_eq!(bm.resolve(IdSpaceKind::Decl, 4).unwrap(), 5);
    // The translation unit is predefined everywhere.
    assert_eq!(bm.resolve(IdSpaceKind::Decl, 1).unwrap(), 1);
}

#[test]
fn missing_import_and_duplicate_load_are_errors() {
    let mut mgr = ModuleManager::new();
    let err = mgr
        .add(parse(module_bytes("b", 2, 1, &[Import { name: "a", decl_base: 2 }], &[])))
        .unwrap_err();
    assert!(matches!(err, SerializationError::MissingImport { ref import, .. } if import == "a"));

    mgr.add(parse(module_bytes("a", 2, 1, &[], &[]))).unwrap();
    let err = mgr.add(parse(module_bytes("a", 2, 1, &[], &[]))).unwrap_err();
    assert!(matches!(err, SerializationError::DuplicateLoad { ref name } if name == "a"));
    assert_eq!(mgr.len(), 1);
}

#[test]
fn replacements_take_over_decl_records() {
    let mut mgr = ModuleManager::new();
    let a = mgr.add(parse(module_bytes("a", 2, 2, &[], &[]))).unwrap();
    assert_eq!(mgr.decl_record(3).unwrap(), (a, 100));

    let b = mgr
        .add(parse(module_bytes(
            "b",
            4,
            0,
            &[Import { name: "a", decl_base: 2 }],
            &[(3, 4242)],
        )))
        .unwrap();
    assert!(mgr.is_replaced(3));
    assert_eq!(mgr.decl_record(3).unwrap(), (b, 4242));
    assert_eq!(mgr.decl_record(2).unwrap(), (a, 0));
    assert!(matches!(
        mgr.decl_record(40),
        Err(SerializationError::UnknownGlobalId { id: 40, .. })
    ));
}

#[test]
fn dependency_order_lists_imports_first() {
    let mut mgr = ModuleManager::new();
    let a = mgr.add(parse(module_bytes("a", 2, 1, &[], &[]))).unwrap();
    let b = mgr
        .add(parse(module_bytes("b", 3, 1, &[Import { name: "a", decl_base: 2 }], &[])))
        .unwrap();
    let c = mgr
        .add(parse(module_bytes(
            "c",
            4,
            1,
            &[Import { name: "a", decl_base: 2 }, Import { name: "b", decl_base: 3 }],
            &[],
        )))
        .unwrap();
    assert_eq!(mgr.dependency_order(c), vec![a, b, c]);
    assert_eq!(mgr.dependency_order(a), vec![a]);
}

#[test]
fn cache_prefers_memory_then_directories() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = module_bytes("disk", 2, 0, &[], &[]);
    std::fs::write(dir.path().join(format!("disk.{MODULE_FILE_EXTENSION}")), &bytes[..]).unwrap();

    let mut cache = ModuleCache::new().with_directory(dir.path());
    assert!(cache.contains("disk"));
    assert_eq!(&cache.get("disk").unwrap()[..], &bytes[..]);
    assert!(matches!(
        cache.get("absent"),
        Err(SerializationError::ModuleNotFound { ref name }) if name == "absent"
    ));

    let memory = module_bytes("mem", 2, 0, &[], &[]);
    cache.insert("mem", Arc::clone(&memory));
    assert!(cache.contains("mem"));
    assert_eq!(&cache.get("mem").unwrap()[..], &memory[..]);
}

#[test]
fn insert_file_uses_the_recorded_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("whatever.bin");
    std::fs::write(&path, &module_bytes("real_name", 2, 0, &[], &[])[..]).unwrap();

    let mut cache = ModuleCache::new();
    assert_eq!(cache.insert_file(&path).unwrap(), "real_name");
    assert!(cache.contains("real_name"));
    assert!(matches!(
        cache.insert_file(&dir.path().join("missing")),
        Err(SerializationError::Io { .. })
    ));
}

#[test]
fn imported_entities_keep_the_first_id() {
    let mut imported = ImportedEntities::default();
    imported.record_type(TypeId::new(40), 25);
    imported.record_type(TypeId::new(40), 31);
    assert_eq!(imported.types.get(&TypeId::new(40)), Some(&25));
}

#[test]
fn failed_add_registers_nothing() {
    let mut mgr = ModuleManager::new();
    let before: Vec<u32> = IdSpaceKind::ALL.iter().map(|&k| mgr.next_global(k)).collect();

    // Decl IDs fit; the last space overflows.
    let mut huge = parse(module_bytes("huge", 2, 3, &[], &[]));
    let last = IdSpaceKind::ALL[IdSpaceKind::COUNT - 1];
    huge.spaces[last.index()].count = u32::MAX;
    assert!(mgr.add(huge).is_err());

    let after: Vec<u32> = IdSpaceKind::ALL.iter().map(|&k| mgr.next_global(k)).collect();
    assert_eq!(after, before);
    assert!(mgr.is_empty());
    assert!(mgr.lookup("huge").is_none());
    assert!(mgr.owner_of(IdSpaceKind::Decl, 2).is_none());

    let a = mgr.add(parse(module_bytes("huge", 2, 3, &[], &[]))).unwrap();
    assert_eq!(mgr.get(a).space(IdSpaceKind::Decl).base, 2);
}
